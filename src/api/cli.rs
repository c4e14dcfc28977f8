use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use super::{
    build_deplete_request, build_fixed_growth_request, build_optimize_request,
    build_variable_growth_request, deplete_response, fixed_growth_response, optimize_response,
    variable_growth_response,
};
use crate::core::SAFETY_CAP_YEARS;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement fund growth, depletion and sustainable-withdrawal calculator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compound a principal at one constant rate
    Fixed(FixedArgs),
    /// Compound a principal through a per-year rate schedule
    Variable(VariableArgs),
    /// Simulate withdraw-then-grow until the balance runs out
    Deplete(DepleteArgs),
    /// Find the largest annual withdrawal that lasts the target number of years
    Optimize(OptimizeArgs),
    /// Serve the JSON API over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FixedArgs {
    #[arg(long, help = "Initial investment")]
    pub principal: f64,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual growth rate; values >= 1 are read as percent, e.g. 5 or 0.05"
    )]
    pub rate: f64,
    #[arg(long, help = "Number of years to compound")]
    pub years: u32,
}

#[derive(Args, Debug, Clone)]
pub struct VariableArgs {
    #[arg(long, help = "Initial investment")]
    pub principal: f64,
    #[arg(
        long,
        required = true,
        value_delimiter = ',',
        allow_hyphen_values = true,
        help = "Comma-separated rate per year, first year first; values >= 1 are read as percent"
    )]
    pub rates: Vec<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct DepleteArgs {
    #[arg(long, help = "Balance at retirement")]
    pub balance: f64,
    #[arg(long, help = "Constant annual expense, withdrawn at the start of each year")]
    pub expense: f64,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual growth rate; values >= 1 are read as percent"
    )]
    pub rate: f64,
    #[arg(
        long,
        default_value_t = SAFETY_CAP_YEARS,
        help = "Stop simulating after this many years"
    )]
    pub cap_years: u32,
}

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[arg(long, help = "Balance at retirement")]
    pub balance: f64,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual growth rate; values >= 1 are read as percent"
    )]
    pub rate: f64,
    #[arg(long, help = "Number of years the balance should last")]
    pub target_years: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

/// Runs a one-shot calculation and renders the result as pretty JSON.
pub fn run_command(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Fixed(args) => {
            let request = build_fixed_growth_request(args).map_err(|e| anyhow!(e))?;
            render(&fixed_growth_response(&request).map_err(|e| anyhow!(e))?)
        }
        Command::Variable(args) => {
            let request = build_variable_growth_request(args).map_err(|e| anyhow!(e))?;
            render(&variable_growth_response(&request).map_err(|e| anyhow!(e))?)
        }
        Command::Deplete(args) => {
            let request = build_deplete_request(args).map_err(|e| anyhow!(e))?;
            render(&deplete_response(&request).map_err(|e| anyhow!(e))?)
        }
        Command::Optimize(args) => {
            let request = build_optimize_request(args).map_err(|e| anyhow!(e))?;
            render(&optimize_response(&request).map_err(|e| anyhow!(e))?)
        }
        Command::Serve(_) => Err(anyhow!("serve is handled by the async entry point")),
    }
}

fn render<T: Serialize>(body: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(body)?)
}
