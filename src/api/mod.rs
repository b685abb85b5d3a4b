use axum::{
    Router,
    extract::{Json, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::core::{
    FilingStatus, HouseholdReport, MinimumPaymentPolicy, PaymentPolicy, PaymentSchedule,
    ReferenceTables, build_report_from_record, calculate_payment_schedule, effective_tax_rate,
    parse_household_json,
};
use crate::error::CliError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFilingStatus {
    #[serde(alias = "Single", alias = "SINGLE")]
    Single,
    #[serde(alias = "Joint", alias = "JOINT", alias = "married")]
    Joint,
}

impl From<ApiFilingStatus> for FilingStatus {
    fn from(value: ApiFilingStatus) -> Self {
        match value {
            ApiFilingStatus::Single => FilingStatus::Single,
            ApiFilingStatus::Joint => FilingStatus::Joint,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Household debt payoff estimator (income, federal tax, life-event haircut, card amortization)"
)]
pub struct Cli {
    #[arg(long, global = true, help = "JSON tax bracket table overriding the embedded 2024 table")]
    tax_table: Option<PathBuf>,
    #[arg(long, global = true, help = "JSON life-event impact table overriding the embedded one")]
    life_event_table: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Minimum payment floor in dollars (default from PAYOFF_MIN_PAYMENT_FLOOR or 25)"
    )]
    min_payment_floor: Option<f64>,
    #[arg(
        long,
        global = true,
        help = "Principal share of the minimum payment in percent (default 1)"
    )]
    required_principal_pct: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a report from a household JSON record and print it.
    Report {
        path: PathBuf,
        #[arg(long, help = "Projection date, YYYY-MM-DD; defaults to today")]
        as_of: Option<NaiveDate>,
    },
    /// Print one amortization schedule.
    Schedule {
        #[arg(long)]
        principal: f64,
        #[arg(long, help = "Annual percentage rate, e.g. 22.9")]
        apr: f64,
        #[arg(long, default_value_t = 25.0)]
        minimum_payment: f64,
        #[arg(long, default_value_t = 0.0)]
        additional_payment: f64,
        #[arg(long, default_value_t = 1.0)]
        required_principal_percentage: f64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Federal tax on an annual income.
    Tax {
        income: f64,
        #[arg(long, value_enum, default_value_t = ApiFilingStatus::Single)]
        filing_status: ApiFilingStatus,
    },
    /// Serve the JSON API.
    Serve {
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },
}

#[derive(Clone)]
pub struct AppState {
    tables: Arc<ReferenceTables>,
    policy: MinimumPaymentPolicy,
}

impl AppState {
    pub fn new(tables: Arc<ReferenceTables>, policy: MinimumPaymentPolicy) -> Self {
        Self { tables, policy }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AsOfQuery {
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    income: Option<f64>,
    filing_status: Option<ApiFilingStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    income: f64,
    filing_status: FilingStatus,
    federal_tax: f64,
    effective_tax_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AmortizationPayload {
    principal: Option<f64>,
    apr: Option<f64>,
    minimum_payment: Option<f64>,
    additional_payment: Option<f64>,
    required_principal_percentage: Option<f64>,
    as_of: Option<NaiveDate>,
    include_schedule: Option<bool>,
}

#[derive(Debug)]
struct AmortizationRequest {
    policy: PaymentPolicy,
    as_of: Option<NaiveDate>,
    include_schedule: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_cli(cli: Cli) -> Result<(), CliError> {
    let mut settings = Settings::from_env()?;
    apply_overrides(&mut settings, &cli)?;

    match cli.command {
        Command::Report { path, as_of } => {
            let tables = settings.load_tables()?;
            let json = fs::read_to_string(&path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let record = parse_household_json(&json).map_err(CliError::Record)?;
            let report = build_report_from_record(
                &record,
                &tables,
                &settings.minimum_payment,
                as_of.unwrap_or_else(today),
            );
            print_json(&report)
        }
        Command::Schedule {
            principal,
            apr,
            minimum_payment,
            additional_payment,
            required_principal_percentage,
            as_of,
        } => {
            let policy = build_policy(
                principal,
                apr,
                minimum_payment,
                additional_payment,
                required_principal_percentage,
            )
            .map_err(CliError::InvalidInput)?;
            print_json(&calculate_payment_schedule(&policy, as_of.unwrap_or_else(today)))
        }
        Command::Tax {
            income,
            filing_status,
        } => {
            let tables = settings.load_tables()?;
            print_json(&tax_response(&tables, income, filing_status.into()))
        }
        Command::Serve { port } => {
            let tables = Arc::new(settings.load_tables()?);
            let state = AppState::new(tables, settings.minimum_payment);
            run_http_server(port.unwrap_or(settings.port), state)
                .await
                .map_err(CliError::Server)
        }
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) -> Result<(), CliError> {
    if let Some(path) = &cli.tax_table {
        settings.tax_table_path = Some(path.clone());
    }
    if let Some(path) = &cli.life_event_table {
        settings.life_event_table_path = Some(path.clone());
    }
    if let Some(floor) = cli.min_payment_floor {
        if !floor.is_finite() || floor < 0.0 {
            return Err(CliError::InvalidInput(
                "--min-payment-floor must be >= 0".to_string(),
            ));
        }
        settings.minimum_payment.floor = floor;
    }
    if let Some(pct) = cli.required_principal_pct {
        if !(0.0..=100.0).contains(&pct) {
            return Err(CliError::InvalidInput(
                "--required-principal-pct must be between 0 and 100".to_string(),
            ));
        }
        settings.minimum_payment.required_principal_percentage = pct;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{json}");
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn build_policy(
    principal: f64,
    apr: f64,
    minimum_payment: f64,
    additional_payment: f64,
    required_principal_percentage: f64,
) -> Result<PaymentPolicy, String> {
    if !principal.is_finite() || principal < 0.0 {
        return Err("principal must be >= 0".to_string());
    }
    if !(0.0..=100.0).contains(&apr) {
        return Err("apr must be between 0 and 100".to_string());
    }
    if !minimum_payment.is_finite() || minimum_payment < 0.0 {
        return Err("minimumPayment must be >= 0".to_string());
    }
    if !additional_payment.is_finite() || additional_payment < 0.0 {
        return Err("additionalPayment must be >= 0".to_string());
    }
    if !(0.0..=100.0).contains(&required_principal_percentage) {
        return Err("requiredPrincipalPercentage must be between 0 and 100".to_string());
    }

    Ok(PaymentPolicy {
        principal,
        apr,
        minimum_payment,
        additional_payment,
        required_principal_percentage,
    })
}

fn tax_response(tables: &ReferenceTables, income: f64, filing_status: FilingStatus) -> TaxResponse {
    let federal_tax = tables.tax.calculate_tax(income, filing_status);
    TaxResponse {
        income,
        filing_status,
        federal_tax,
        effective_tax_rate: effective_tax_rate(federal_tax, income),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/report", post(report_handler))
        .route("/api/tax", post(tax_handler))
        .route("/api/amortization", post(amortization_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "payoff HTTP API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn report_handler(
    State(state): State<AppState>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
    body: String,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid query: {e}"));
        }
    };
    let record = match parse_household_json(&body) {
        Ok(record) => record,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid household record: {e}"),
            );
        }
    };

    let report: HouseholdReport = build_report_from_record(
        &record,
        &state.tables,
        &state.policy,
        query.as_of.unwrap_or_else(today),
    );
    json_response(StatusCode::OK, report)
}

async fn tax_handler(State(state): State<AppState>, body: String) -> Response {
    let payload: TaxPayload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Some(income) = payload.income else {
        return error_response(StatusCode::BAD_REQUEST, "income is required");
    };
    if !income.is_finite() {
        return error_response(StatusCode::BAD_REQUEST, "income must be a finite number");
    }
    let filing_status = payload
        .filing_status
        .unwrap_or(ApiFilingStatus::Single)
        .into();
    json_response(
        StatusCode::OK,
        tax_response(&state.tables, income, filing_status),
    )
}

async fn amortization_handler(
    State(state): State<AppState>,
    body: String,
) -> Response {
    let request = match parse_payload::<AmortizationPayload>(&body)
        .and_then(|payload| amortization_request_from_payload(payload, &state.policy))
    {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let mut schedule: PaymentSchedule =
        calculate_payment_schedule(&request.policy, request.as_of.unwrap_or_else(today));
    if !request.include_schedule {
        schedule.entries.clear();
    }
    json_response(StatusCode::OK, schedule)
}

fn amortization_request_from_payload(
    payload: AmortizationPayload,
    defaults: &MinimumPaymentPolicy,
) -> Result<AmortizationRequest, String> {
    let principal = payload
        .principal
        .ok_or_else(|| "principal is required".to_string())?;
    let apr = payload.apr.ok_or_else(|| "apr is required".to_string())?;
    let policy = build_policy(
        principal,
        apr,
        payload.minimum_payment.unwrap_or(defaults.floor),
        payload.additional_payment.unwrap_or(0.0),
        payload
            .required_principal_percentage
            .unwrap_or(defaults.required_principal_percentage),
    )?;

    Ok(AmortizationRequest {
        policy,
        as_of: payload.as_of,
        include_schedule: payload.include_schedule.unwrap_or(true),
    })
}

/// Malformed bodies become a 400 `{ "error" }` instead of axum's plain-text rejection.
fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, String> {
    serde_json::from_str::<T>(body).map_err(|e| format!("Invalid API JSON payload: {e}"))
}

#[cfg(test)]
fn amortization_request_from_json(json: &str) -> Result<AmortizationRequest, String> {
    amortization_request_from_payload(parse_payload(json)?, &MinimumPaymentPolicy::default())
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
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn app() -> Router {
        router(AppState::new(
            Arc::new(ReferenceTables::embedded()),
            MinimumPaymentPolicy::default(),
        ))
    }

    async fn post_json(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("valid request"),
            )
            .await
            .expect("infallible");
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (
            status,
            serde_json::from_slice(&bytes).expect("JSON response body"),
        )
    }

    #[test]
    fn amortization_request_from_json_parses_web_keys() {
        let request = amortization_request_from_json(
            r#"{
              "principal": 10000,
              "apr": 20,
              "minimumPayment": 35,
              "additionalPayment": 50,
              "requiredPrincipalPercentage": 2,
              "asOf": "2025-01-15",
              "includeSchedule": false
            }"#,
        )
        .expect("valid request");
        assert_approx(request.policy.principal, 10_000.0);
        assert_approx(request.policy.minimum_payment, 35.0);
        assert_approx(request.policy.additional_payment, 50.0);
        assert_approx(request.policy.required_principal_percentage, 2.0);
        assert_eq!(request.as_of, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert!(!request.include_schedule);
    }

    #[test]
    fn amortization_request_defaults_to_minimum_payment_policy() {
        let request = amortization_request_from_json(r#"{ "principal": 500, "apr": 18 }"#)
            .expect("valid request");
        assert_approx(request.policy.minimum_payment, 25.0);
        assert_approx(request.policy.required_principal_percentage, 1.0);
        assert_approx(request.policy.additional_payment, 0.0);
        assert!(request.include_schedule);
    }

    #[test]
    fn amortization_request_rejects_missing_and_invalid_fields() {
        let err = amortization_request_from_json(r#"{ "apr": 18 }"#).expect_err("no principal");
        assert!(err.contains("principal"));

        let err = amortization_request_from_json(r#"{ "principal": 100, "apr": 180 }"#)
            .expect_err("bad apr");
        assert!(err.contains("apr"));

        let err = amortization_request_from_json(
            r#"{ "principal": 100, "apr": 18, "additionalPayment": -1 }"#,
        )
        .expect_err("negative extra");
        assert!(err.contains("additionalPayment"));
    }

    #[test]
    fn api_filing_status_accepts_aliases() {
        let payload: TaxPayload =
            serde_json::from_str(r#"{ "income": 1, "filingStatus": "married" }"#).expect("valid");
        assert_eq!(payload.filing_status, Some(ApiFilingStatus::Joint));
    }

    #[test]
    fn cli_parses_report_subcommand() {
        let cli = Cli::try_parse_from([
            "payoff",
            "report",
            "household.json",
            "--as-of",
            "2025-01-15",
            "--min-payment-floor",
            "35",
        ])
        .expect("valid args");
        assert_eq!(cli.min_payment_floor, Some(35.0));
        match cli.command {
            Command::Report { path, as_of } => {
                assert_eq!(path, PathBuf::from("household.json"));
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2025, 1, 15));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_port_zero() {
        assert!(Cli::try_parse_from(["payoff", "serve", "--port", "0"]).is_err());
        let cli = Cli::try_parse_from(["payoff", "serve", "--port", "9000"]).expect("valid args");
        assert!(matches!(cli.command, Command::Serve { port: Some(9000) }));
    }

    #[test]
    fn overrides_reject_out_of_range_principal_pct() {
        let cli = Cli::try_parse_from(["payoff", "--required-principal-pct", "120", "serve"])
            .expect("valid args");
        let err = apply_overrides(&mut Settings::default(), &cli).expect_err("must reject");
        assert!(err.to_string().contains("--required-principal-pct"));
    }

    #[tokio::test]
    async fn tax_endpoint_returns_marginal_tax() {
        let (status, body) =
            post_json("/api/tax", r#"{ "income": 50000, "filingStatus": "single" }"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_approx(body["federalTax"].as_f64().expect("number"), 6_053.0);
        assert_eq!(body["filingStatus"], "single");
    }

    #[tokio::test]
    async fn malformed_bodies_are_json_400s() {
        for (uri, body) in [
            ("/api/tax", r#"{ "income": "abc" }"#),
            ("/api/tax", "not json"),
            ("/api/amortization", r#"{ "principal": [1], "apr": 10 }"#),
        ] {
            let (status, body) = post_json(uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(
                body["error"]
                    .as_str()
                    .expect("message")
                    .starts_with("Invalid API JSON payload"),
                "{body}"
            );
        }
    }

    #[tokio::test]
    async fn report_endpoint_rejects_bad_as_of_query() {
        let (status, body) = post_json("/api/report?asOf=someday", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").starts_with("Invalid query"));
    }

    #[tokio::test]
    async fn tax_endpoint_requires_income() {
        let (status, body) = post_json("/api/tax", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "income is required");
    }

    #[tokio::test]
    async fn amortization_endpoint_can_omit_entries() {
        let (status, body) = post_json(
            "/api/amortization",
            r#"{ "principal": 1000, "apr": 0, "minimumPayment": 1000, "requiredPrincipalPercentage": 0, "asOf": "2025-01-15", "includeSchedule": false }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["payoffMonths"], 1);
        assert_eq!(body["summary"]["debtFreeDate"], "2025-02-15");
        assert_eq!(body["entries"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn report_endpoint_accepts_persisted_envelope() {
        let (status, body) = post_json(
            "/api/report?asOf=2025-01-15",
            r#"{
              "email": "someone@example.com",
              "data": {
                "annualSalary": "150000",
                "spouseAnnualSalary": "50000",
                "userCards": [{
                  "cardType": "Visa",
                  "balance": 10000,
                  "interest": 20,
                  "creditLimit": 20000,
                  "monthlyPaymentType": "Minimum Payments",
                  "paymentTimelyStatus": "On-Time"
                }]
              }
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["income"]["filingStatus"], "joint");
        assert_approx(body["income"]["federalTax"].as_f64().expect("number"), 34_106.0);
        assert_eq!(body["cards"][0]["payoffMonths"], 295);
        assert_eq!(body["portfolio"]["paymentAmounts"]["label"], "Kicking the can down the road");
        assert_eq!(body["sentiment"], "Caution");
    }

    #[tokio::test]
    async fn report_endpoint_rejects_invalid_json() {
        let (status, body) = post_json("/api/report", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .expect("message")
                .starts_with("Invalid household record")
        );
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = post_json("/api/unknown", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
