use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    DepletionOutcome, Rate, RateSchedule, WithdrawalSolveConfig, deplete, fixed_growth,
    fixed_growth_trajectory, solve_withdrawal, variable_growth, variable_growth_trajectory,
};

pub mod cli;

use cli::{DepleteArgs, FixedArgs, OptimizeArgs, VariableArgs};

const MAX_RATE_INPUT: f64 = 1000.0;
const MAX_YEARS_INPUT: u32 = 1000;
const NEVER_DEPLETES_NOTE: &str = "Retirement funds will never deplete in lifetime";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RatesField {
    List(Vec<f64>),
    Csv(String),
}

impl RatesField {
    fn into_values(self) -> Result<Vec<f64>, String> {
        match self {
            RatesField::List(values) => Ok(values),
            RatesField::Csv(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .enumerate()
                .map(|(i, part)| {
                    part.parse::<f64>()
                        .map_err(|_| format!("--rates entry {} ('{part}') is not numeric", i + 1))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FixedGrowthPayload {
    principal: Option<f64>,
    rate: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VariableGrowthPayload {
    principal: Option<f64>,
    rates: Option<RatesField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DepletePayload {
    balance: Option<f64>,
    expense: Option<f64>,
    rate: Option<f64>,
    cap_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptimizePayload {
    balance: Option<f64>,
    rate: Option<f64>,
    target_years: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedGrowthRequest {
    pub principal: f64,
    pub rate: Rate,
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableGrowthRequest {
    pub principal: f64,
    pub schedule: RateSchedule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepleteRequest {
    pub balance: f64,
    pub expense: f64,
    pub rate: Rate,
    pub cap_years: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeRequest {
    pub balance: f64,
    pub rate: Rate,
    pub target_years: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedGrowthResponse {
    principal: f64,
    rate: Rate,
    years: u32,
    final_balance: f64,
    trajectory: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGrowthResponse {
    principal: f64,
    rates: RateSchedule,
    final_balance: f64,
    trajectory: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepleteResponse {
    balance: f64,
    expense: f64,
    rate: Rate,
    cap_years: u32,
    years_lasted: u32,
    never_depletes: bool,
    outcome: DepletionOutcome,
    message: String,
    trajectory: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    balance: f64,
    rate: Rate,
    target_years: u32,
    withdrawal: f64,
    formatted_withdrawal: String,
    years_lasted: u32,
    never_depletes: bool,
    outcome: DepletionOutcome,
    converged: bool,
    iterations: usize,
    message: String,
    trajectory: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn build_fixed_growth_request(args: FixedArgs) -> Result<FixedGrowthRequest, String> {
    let principal = positive_amount("--principal", args.principal)?;
    let rate = positive_rate("--rate", args.rate)?;
    let years = years_in_range("--years", args.years)?;
    Ok(FixedGrowthRequest {
        principal,
        rate,
        years,
    })
}

pub fn build_variable_growth_request(args: VariableArgs) -> Result<VariableGrowthRequest, String> {
    if !args.principal.is_finite() || args.principal < 0.0 {
        return Err("--principal must be >= 0".to_string());
    }
    if args.rates.is_empty() {
        return Err("--rates must contain at least one yearly rate".to_string());
    }
    if args.rates.len() > MAX_YEARS_INPUT as usize {
        return Err(format!(
            "--rates cannot cover more than {MAX_YEARS_INPUT} years"
        ));
    }
    let mut rates = Vec::with_capacity(args.rates.len());
    for (i, &value) in args.rates.iter().enumerate() {
        rates.push(validated_rate(&format!("--rates entry {}", i + 1), value)?);
    }
    Ok(VariableGrowthRequest {
        principal: args.principal,
        schedule: RateSchedule::new(rates),
    })
}

pub fn build_deplete_request(args: DepleteArgs) -> Result<DepleteRequest, String> {
    let balance = positive_amount("--balance", args.balance)?;
    let expense = positive_amount("--expense", args.expense)?;
    if expense > balance {
        return Err("--expense cannot exceed --balance".to_string());
    }
    let rate = positive_rate("--rate", args.rate)?;
    let cap_years = years_in_range("--cap-years", args.cap_years)?;
    Ok(DepleteRequest {
        balance,
        expense,
        rate,
        cap_years,
    })
}

pub fn build_optimize_request(args: OptimizeArgs) -> Result<OptimizeRequest, String> {
    let balance = positive_amount("--balance", args.balance)?;
    let rate = positive_rate("--rate", args.rate)?;
    let target_years = years_in_range("--target-years", args.target_years)?;
    Ok(OptimizeRequest {
        balance,
        rate,
        target_years,
    })
}

fn positive_amount(name: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{name} must be > 0"));
    }
    Ok(value)
}

fn validated_rate(name: &str, value: f64) -> Result<Rate, String> {
    if !(0.0..=MAX_RATE_INPUT).contains(&value) {
        return Err(format!("{name} must be between 0 and {MAX_RATE_INPUT}"));
    }
    Rate::from_input(value).map_err(|e| format!("{name}: {e}"))
}

fn positive_rate(name: &str, value: f64) -> Result<Rate, String> {
    if value <= 0.0 {
        return Err(format!("{name} must be > 0"));
    }
    validated_rate(name, value)
}

fn years_in_range(name: &str, years: u32) -> Result<u32, String> {
    if !(1..=MAX_YEARS_INPUT).contains(&years) {
        return Err(format!("{name} must be between 1 and {MAX_YEARS_INPUT}"));
    }
    Ok(years)
}

pub fn fixed_growth_response(request: &FixedGrowthRequest) -> Result<FixedGrowthResponse, String> {
    let final_balance =
        fixed_growth(request.principal, request.rate, request.years).map_err(|e| e.to_string())?;
    let trajectory = fixed_growth_trajectory(request.principal, request.rate, request.years)
        .map_err(|e| e.to_string())?;
    Ok(FixedGrowthResponse {
        principal: request.principal,
        rate: request.rate,
        years: request.years,
        final_balance,
        trajectory,
    })
}

pub fn variable_growth_response(
    request: &VariableGrowthRequest,
) -> Result<VariableGrowthResponse, String> {
    let final_balance =
        variable_growth(request.principal, &request.schedule).map_err(|e| e.to_string())?;
    let trajectory =
        variable_growth_trajectory(request.principal, &request.schedule).map_err(|e| e.to_string())?;
    Ok(VariableGrowthResponse {
        principal: request.principal,
        rates: request.schedule.clone(),
        final_balance,
        trajectory,
    })
}

pub fn deplete_response(request: &DepleteRequest) -> Result<DepleteResponse, String> {
    let result = deplete(
        request.balance,
        request.expense,
        request.rate,
        request.cap_years,
    )
    .map_err(|e| e.to_string())?;
    let message = if result.never_depletes() {
        format!("{} | {NEVER_DEPLETES_NOTE}", result.years_lasted)
    } else {
        format!("Retirement funds last {} years", result.years_lasted)
    };
    Ok(DepleteResponse {
        balance: request.balance,
        expense: request.expense,
        rate: request.rate,
        cap_years: result.cap_years,
        years_lasted: result.years_lasted,
        never_depletes: result.never_depletes(),
        outcome: result.outcome(),
        message,
        trajectory: result.trajectory,
    })
}

pub fn optimize_response(request: &OptimizeRequest) -> Result<OptimizeResponse, String> {
    let solved = solve_withdrawal(
        request.balance,
        request.rate,
        WithdrawalSolveConfig::new(request.target_years),
    )
    .map_err(|e| e.to_string())?;
    let message = if solved.never_depletes() {
        format!("{} | {NEVER_DEPLETES_NOTE}", solved.years_lasted)
    } else {
        solved.message.clone()
    };
    Ok(OptimizeResponse {
        balance: request.balance,
        rate: request.rate,
        target_years: request.target_years,
        withdrawal: solved.withdrawal,
        formatted_withdrawal: format!("${:.2}", solved.withdrawal),
        years_lasted: solved.years_lasted,
        never_depletes: solved.never_depletes(),
        outcome: solved.outcome,
        converged: solved.converged,
        iterations: solved.iterations.len(),
        message,
        trajectory: solved.trajectory,
    })
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{name} is required"))
}

fn fixed_growth_from_payload(payload: FixedGrowthPayload) -> Result<FixedGrowthRequest, String> {
    build_fixed_growth_request(FixedArgs {
        principal: required(payload.principal, "principal")?,
        rate: required(payload.rate, "rate")?,
        years: required(payload.years, "years")?,
    })
}

fn variable_growth_from_payload(
    payload: VariableGrowthPayload,
) -> Result<VariableGrowthRequest, String> {
    build_variable_growth_request(VariableArgs {
        principal: required(payload.principal, "principal")?,
        rates: required(payload.rates, "rates")?.into_values()?,
    })
}

fn deplete_from_payload(payload: DepletePayload) -> Result<DepleteRequest, String> {
    build_deplete_request(DepleteArgs {
        balance: required(payload.balance, "balance")?,
        expense: required(payload.expense, "expense")?,
        rate: required(payload.rate, "rate")?,
        cap_years: payload.cap_years.unwrap_or(crate::core::SAFETY_CAP_YEARS),
    })
}

fn optimize_from_payload(payload: OptimizePayload) -> Result<OptimizeRequest, String> {
    build_optimize_request(OptimizeArgs {
        balance: required(payload.balance, "balance")?,
        rate: required(payload.rate, "rate")?,
        target_years: required(payload.target_years, "targetYears")?,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!("nestegg HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/health");
    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/fixed-growth",
            get(fixed_growth_get_handler).post(fixed_growth_post_handler),
        )
        .route(
            "/api/variable-growth",
            get(variable_growth_get_handler).post(variable_growth_post_handler),
        )
        .route(
            "/api/deplete",
            get(deplete_get_handler).post(deplete_post_handler),
        )
        .route(
            "/api/optimize-withdrawal",
            get(optimize_get_handler).post(optimize_post_handler),
        )
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn fixed_growth_get_handler(Query(payload): Query<FixedGrowthPayload>) -> Response {
    respond(fixed_growth_from_payload(payload).and_then(|r| fixed_growth_response(&r)))
}

async fn fixed_growth_post_handler(Json(payload): Json<FixedGrowthPayload>) -> Response {
    respond(fixed_growth_from_payload(payload).and_then(|r| fixed_growth_response(&r)))
}

async fn variable_growth_get_handler(Query(payload): Query<VariableGrowthPayload>) -> Response {
    respond(variable_growth_from_payload(payload).and_then(|r| variable_growth_response(&r)))
}

async fn variable_growth_post_handler(Json(payload): Json<VariableGrowthPayload>) -> Response {
    respond(variable_growth_from_payload(payload).and_then(|r| variable_growth_response(&r)))
}

async fn deplete_get_handler(Query(payload): Query<DepletePayload>) -> Response {
    respond(deplete_from_payload(payload).and_then(|r| deplete_response(&r)))
}

async fn deplete_post_handler(Json(payload): Json<DepletePayload>) -> Response {
    respond(deplete_from_payload(payload).and_then(|r| deplete_response(&r)))
}

async fn optimize_get_handler(Query(payload): Query<OptimizePayload>) -> Response {
    respond(optimize_from_payload(payload).and_then(|r| optimize_response(&r)))
}

async fn optimize_post_handler(Json(payload): Json<OptimizePayload>) -> Response {
    respond(optimize_from_payload(payload).and_then(|r| optimize_response(&r)))
}

fn respond<T: Serialize>(result: Result<T, String>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn payload_from_json<T: DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).expect("json should parse")
    }

    fn query_from_uri<T: DeserializeOwned>(uri: &str) -> Query<T> {
        let uri: Uri = uri.parse().expect("uri should parse");
        Query::try_from_uri(&uri).expect("query should parse")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    fn sample_deplete_args() -> DepleteArgs {
        DepleteArgs {
            balance: 100_000.0,
            expense: 10_000.0,
            rate: 5.0,
            cap_years: crate::core::SAFETY_CAP_YEARS,
        }
    }

    #[test]
    fn fixed_growth_payload_normalizes_percent_rate() {
        let payload: FixedGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rate": 5, "years": 10 }"#);
        let request = fixed_growth_from_payload(payload).expect("valid request");
        assert_eq!(request.rate, Rate::from_fraction(0.05).unwrap());

        let response = fixed_growth_response(&request).expect("must compute");
        assert!((response.final_balance - 1_628.89).abs() < 0.005);
        assert_eq!(response.trajectory.len(), 11);
        assert_approx(response.trajectory[10], response.final_balance);
    }

    #[test]
    fn fixed_growth_payload_reports_missing_fields() {
        let payload: FixedGrowthPayload = payload_from_json(r#"{ "principal": 1000 }"#);
        let err = fixed_growth_from_payload(payload).expect_err("rate is missing");
        assert_eq!(err, "rate is required");
    }

    #[test]
    fn build_fixed_growth_rejects_out_of_range_inputs() {
        let args = FixedArgs {
            principal: 1_000.0,
            rate: 1_500.0,
            years: 10,
        };
        let err = build_fixed_growth_request(args).expect_err("rate too large");
        assert!(err.contains("--rate"));

        let args = FixedArgs {
            principal: 0.0,
            rate: 5.0,
            years: 10,
        };
        let err = build_fixed_growth_request(args).expect_err("principal must be positive");
        assert!(err.contains("--principal"));

        let args = FixedArgs {
            principal: 1_000.0,
            rate: 5.0,
            years: 1_001,
        };
        let err = build_fixed_growth_request(args).expect_err("years too large");
        assert!(err.contains("--years"));
    }

    #[test]
    fn variable_growth_payload_accepts_array_or_comma_separated_rates() {
        let from_array: VariableGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rates": [10, 5, 0.08] }"#);
        let from_csv: VariableGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rates": "10, 5, 0.08" }"#);
        let a = variable_growth_from_payload(from_array).expect("valid request");
        let b = variable_growth_from_payload(from_csv).expect("valid request");
        assert_eq!(a, b);

        let response = variable_growth_response(&a).expect("must compute");
        assert_approx(response.final_balance, 1_000.0 * 1.10 * 1.05 * 1.08);
        assert_eq!(response.trajectory.len(), 4);
    }

    #[test]
    fn variable_growth_payload_flags_bad_entries() {
        let payload: VariableGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rates": "5, abc" }"#);
        let err = variable_growth_from_payload(payload).expect_err("non-numeric rate");
        assert!(err.contains("entry 2"));

        let payload: VariableGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rates": [5, -3] }"#);
        let err = variable_growth_from_payload(payload).expect_err("negative rate");
        assert!(err.contains("--rates entry 2"));

        let payload: VariableGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rates": [] }"#);
        let err = variable_growth_from_payload(payload).expect_err("empty schedule");
        assert!(err.contains("at least one"));
    }

    #[test]
    fn build_deplete_rejects_expense_above_balance() {
        let mut args = sample_deplete_args();
        args.expense = 150_000.0;
        let err = build_deplete_request(args).expect_err("expense too high");
        assert!(err.contains("--expense cannot exceed --balance"));
    }

    #[test]
    fn build_deplete_rejects_zero_cap() {
        let mut args = sample_deplete_args();
        args.cap_years = 0;
        let err = build_deplete_request(args).expect_err("cap must be positive");
        assert!(err.contains("--cap-years"));
    }

    #[test]
    fn deplete_payload_defaults_cap_and_reports_years() {
        let payload: DepletePayload =
            payload_from_json(r#"{ "balance": 100000, "expense": 10000, "rate": 0.05 }"#);
        let request = deplete_from_payload(payload).expect("valid request");
        assert_eq!(request.cap_years, crate::core::SAFETY_CAP_YEARS);

        let response = deplete_response(&request).expect("must compute");
        assert_eq!(response.years_lasted, 14);
        assert!(!response.never_depletes);
        assert_eq!(response.message, "Retirement funds last 14 years");
        assert_eq!(response.trajectory.len(), 15);
    }

    #[test]
    fn deplete_response_marks_never_depleting_plans() {
        let mut args = sample_deplete_args();
        args.expense = 1_000.0;
        let request = build_deplete_request(args).expect("valid request");
        let response = deplete_response(&request).expect("must compute");
        assert!(response.never_depletes);
        assert_eq!(
            response.message,
            "120 | Retirement funds will never deplete in lifetime"
        );
    }

    #[test]
    fn optimize_payload_requires_target_years() {
        let payload: OptimizePayload = payload_from_json(r#"{ "balance": 100000, "rate": 5 }"#);
        let err = optimize_from_payload(payload).expect_err("target missing");
        assert_eq!(err, "targetYears is required");
    }

    #[test]
    fn optimize_response_serialization_contains_expected_fields() {
        let payload: OptimizePayload =
            payload_from_json(r#"{ "balance": 100000, "rate": 5, "targetYears": 20 }"#);
        let request = optimize_from_payload(payload).expect("valid request");
        let response = optimize_response(&request).expect("must solve");
        assert_eq!(response.years_lasted, 20);
        assert_eq!(response.formatted_withdrawal, "$7880.47");

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"withdrawal\""));
        assert!(json.contains("\"formattedWithdrawal\""));
        assert!(json.contains("\"yearsLasted\":20"));
        assert!(json.contains("\"neverDepletes\":false"));
        assert!(json.contains("\"outcome\":{\"kind\":\"depleted\",\"years\":20}"));
        assert!(json.contains("\"trajectory\""));
    }

    #[test]
    fn optimize_beyond_cap_reports_never_depletes() {
        let args = OptimizeArgs {
            balance: 100_000.0,
            rate: 5.0,
            target_years: 500,
        };
        let request = build_optimize_request(args).expect("valid request");
        let response = optimize_response(&request).expect("must solve");
        assert!(response.never_depletes);
        assert!(response.message.contains("never deplete"));
        assert!(response.withdrawal <= crate::core::WITHDRAWAL_EPSILON);
    }

    #[test]
    fn single_rate_requests_reject_zero_rate() {
        let err = build_fixed_growth_request(FixedArgs {
            principal: 1_000.0,
            rate: 0.0,
            years: 10,
        })
        .expect_err("zero rate");
        assert_eq!(err, "--rate must be > 0");

        let mut args = sample_deplete_args();
        args.rate = 0.0;
        assert_eq!(
            build_deplete_request(args).expect_err("zero rate"),
            "--rate must be > 0"
        );

        let err = build_optimize_request(OptimizeArgs {
            balance: 1_000.0,
            rate: -2.0,
            target_years: 4,
        })
        .expect_err("negative rate");
        assert_eq!(err, "--rate must be > 0");
    }

    #[test]
    fn rate_schedule_entries_may_be_zero() {
        let request = build_variable_growth_request(VariableArgs {
            principal: 1_000.0,
            rates: vec![0.0, 10.0],
        })
        .expect("zero entry is allowed");
        let response = variable_growth_response(&request).expect("must compute");
        assert_approx(response.final_balance, 1_100.0);
    }

    #[test]
    fn responses_surface_balance_overflow_as_errors() {
        let request = build_fixed_growth_request(FixedArgs {
            principal: 1_000.0,
            rate: 1_000.0,
            years: 1_000,
        })
        .expect("inputs are in range");
        let err = fixed_growth_response(&request).expect_err("must overflow");
        assert!(err.contains("overflow"), "{err}");

        let request = build_deplete_request(DepleteArgs {
            balance: 1_000.0,
            expense: 1.0,
            rate: 1_000.0,
            cap_years: 1_000,
        })
        .expect("inputs are in range");
        let err = deplete_response(&request).expect_err("must overflow");
        assert!(err.contains("overflow"), "{err}");

        let request = build_variable_growth_request(VariableArgs {
            principal: 1_000.0,
            rates: vec![1_000.0; 400],
        })
        .expect("inputs are in range");
        assert!(variable_growth_response(&request).is_err());
    }

    #[tokio::test]
    async fn variable_growth_get_reads_comma_separated_rates_from_query() {
        let query = query_from_uri("/api/variable-growth?principal=1000&rates=10,5,0.08");
        let response = variable_growth_get_handler(query).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );

        let body = body_json(response).await;
        let final_balance = body["finalBalance"].as_f64().expect("finalBalance");
        assert_approx(final_balance, 1_000.0 * 1.10 * 1.05 * 1.08);
        assert_eq!(body["trajectory"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn deplete_get_reads_camel_case_query_fields() {
        let query =
            query_from_uri("/api/deplete?balance=100000&expense=10000&rate=5&capYears=10");
        let body = body_json(deplete_get_handler(query).await).await;
        assert_eq!(body["yearsLasted"], 10);
        assert_eq!(body["neverDepletes"], true);
        assert_eq!(body["outcome"]["kind"], "neverDepletes");
    }

    #[tokio::test]
    async fn optimize_get_reports_validation_errors_as_bad_request() {
        let query = query_from_uri("/api/optimize-withdrawal?balance=100000&rate=0&targetYears=20");
        let response = optimize_get_handler(query).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "--rate must be > 0");
    }

    #[tokio::test]
    async fn fixed_growth_post_reports_overflow_as_bad_request() {
        let payload: FixedGrowthPayload =
            payload_from_json(r#"{ "principal": 1000, "rate": 1000, "years": 1000 }"#);
        let response = fixed_growth_post_handler(Json(payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("overflow"));
    }

    #[tokio::test]
    async fn unknown_routes_get_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Not found" })
        );
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = health_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "status": "ok" })
        );
    }

    #[test]
    fn error_response_is_json_with_no_store_cache_header() {
        let response = error_response(StatusCode::BAD_REQUEST, "--rate must be > 0");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }
}
