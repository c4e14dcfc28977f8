use clap::Parser;

use nestegg::api::cli::{Cli, Command, run_command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => nestegg::api::run_http_server(args.port).await?,
        command => println!("{}", run_command(command)?),
    }
    Ok(())
}
