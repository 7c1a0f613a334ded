use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    FinalIndicators, LoanDebtYear, MAX_YEARS, MonthlyRecord, PricePoint, SimulationConfig,
    YearSummary, final_indicators, format_amount, loan_debt_by_year, price_projection, run_simulation,
    yearly_summaries,
};

#[derive(Debug, Parser)]
#[command(
    name = "immo",
    about = "Month-by-month rental property investment simulator"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one simulation and print the result")]
    Simulate(SimulateArgs),
    #[command(about = "Serve the JSON API")]
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    #[arg(long, default_value_t = 2500.0, help = "Amount saved every month")]
    monthly_savings: f64,
    #[arg(long, default_value_t = 100_000.0, help = "Price of one property at start")]
    property_price: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Down payment per acquisition")]
    down_payment: f64,
    #[arg(long, default_value_t = 800.0, help = "Monthly rent of one property at start")]
    monthly_rent: f64,
    #[arg(long, default_value_t = 7)]
    loan_term_years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual loan interest rate in percent"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 12, help = "Total simulated years")]
    horizon_years: u32,
    #[arg(long, default_value_t = 4.0, help = "Rental vacancy in percent")]
    vacancy_rate: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Non-recoverable charges in percent of rent"
    )]
    charges_rate: f64,
    #[arg(
        long,
        default_value_t = 100.0,
        help = "Property tax per property and month"
    )]
    property_tax: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Annual property appreciation in percent"
    )]
    appreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Annual rent revaluation in percent"
    )]
    rent_revaluation_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Tax on positive monthly rental profit in percent"
    )]
    income_tax_rate: f64,
    #[arg(long, value_enum, default_value_t = OutputFormat::Yearly)]
    format: OutputFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    monthly_savings: Option<f64>,
    property_price: Option<f64>,
    down_payment: Option<f64>,
    monthly_rent: Option<f64>,
    loan_term_years: Option<u32>,
    interest_rate: Option<f64>,
    horizon_years: Option<u32>,
    vacancy_rate: Option<f64>,
    charges_rate: Option<f64>,
    property_tax: Option<f64>,
    appreciation_rate: Option<f64>,
    rent_revaluation_rate: Option<f64>,
    income_tax_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    months: Vec<MonthlyRecord>,
    years: Vec<YearSummary>,
    price_projection: Vec<PricePoint>,
    loan_debt_by_year: Vec<LoanDebtYear>,
    final_indicators: Option<FinalIndicators>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(args: &SimulateArgs) -> Result<SimulationConfig, String> {
    for (name, years) in [
        ("--loan-term-years", args.loan_term_years),
        ("--horizon-years", args.horizon_years),
    ] {
        if years == 0 {
            return Err(format!("{name} must be > 0"));
        }
        if years > MAX_YEARS {
            return Err(format!("{name} must be <= {MAX_YEARS}"));
        }
    }

    for (name, amount) in [
        ("--monthly-savings", args.monthly_savings),
        ("--property-price", args.property_price),
        ("--down-payment", args.down_payment),
        ("--monthly-rent", args.monthly_rent),
        ("--property-tax", args.property_tax),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, rate) in [
        ("--interest-rate", args.interest_rate),
        ("--vacancy-rate", args.vacancy_rate),
        ("--charges-rate", args.charges_rate),
        ("--appreciation-rate", args.appreciation_rate),
        ("--rent-revaluation-rate", args.rent_revaluation_rate),
        ("--income-tax-rate", args.income_tax_rate),
    ] {
        if !(0.0..100.0).contains(&rate) {
            return Err(format!("{name} must be >= 0 and < 100"));
        }
    }

    if args.down_payment > args.property_price {
        return Err("--down-payment must be <= --property-price".to_string());
    }

    let config = SimulationConfig {
        monthly_savings: args.monthly_savings,
        initial_property_price: args.property_price,
        down_payment: args.down_payment,
        initial_monthly_rent: args.monthly_rent,
        loan_term_years: args.loan_term_years,
        annual_interest_rate: args.interest_rate / 100.0,
        horizon_years: args.horizon_years,
        vacancy_rate: args.vacancy_rate / 100.0,
        charges_rate: args.charges_rate / 100.0,
        monthly_property_tax: args.property_tax,
        annual_appreciation_rate: args.appreciation_rate / 100.0,
        annual_rent_revaluation_rate: args.rent_revaluation_rate / 100.0,
        income_tax_rate: args.income_tax_rate / 100.0,
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub async fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::Simulate(args) => {
            let config = build_config(&args)?;
            let records = run_simulation(&config).map_err(|e| e.to_string())?;
            match args.format {
                OutputFormat::Json => {
                    let response = build_simulate_response(&config, records);
                    let json = serde_json::to_string_pretty(&response)
                        .map_err(|e| format!("Failed to serialize result: {e}"))?;
                    println!("{json}");
                }
                OutputFormat::Monthly => print!("{}", render_monthly_table(&records)),
                OutputFormat::Yearly => print!("{}", render_yearly_table(&records)),
            }
            Ok(())
        }
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("simulator HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let config = match config_from_payload(payload) {
        Ok(config) => config,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_simulation(&config) {
        Ok(records) => json_response(StatusCode::OK, build_simulate_response(&config, records)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
fn config_from_json(json: &str) -> Result<SimulationConfig, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    config_from_payload(payload)
}

fn config_from_payload(payload: SimulatePayload) -> Result<SimulationConfig, String> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.monthly_savings {
        args.monthly_savings = v;
    }
    if let Some(v) = payload.property_price {
        args.property_price = v;
    }
    if let Some(v) = payload.down_payment {
        args.down_payment = v;
    }
    if let Some(v) = payload.monthly_rent {
        args.monthly_rent = v;
    }
    if let Some(v) = payload.loan_term_years {
        args.loan_term_years = v;
    }
    if let Some(v) = payload.interest_rate {
        args.interest_rate = v;
    }
    if let Some(v) = payload.horizon_years {
        args.horizon_years = v;
    }
    if let Some(v) = payload.vacancy_rate {
        args.vacancy_rate = v;
    }
    if let Some(v) = payload.charges_rate {
        args.charges_rate = v;
    }
    if let Some(v) = payload.property_tax {
        args.property_tax = v;
    }
    if let Some(v) = payload.appreciation_rate {
        args.appreciation_rate = v;
    }
    if let Some(v) = payload.rent_revaluation_rate {
        args.rent_revaluation_rate = v;
    }
    if let Some(v) = payload.income_tax_rate {
        args.income_tax_rate = v;
    }

    build_config(&args)
}

fn default_args_for_api() -> SimulateArgs {
    SimulateArgs {
        monthly_savings: 2_500.0,
        property_price: 100_000.0,
        down_payment: 10_000.0,
        monthly_rent: 800.0,
        loan_term_years: 7,
        interest_rate: 3.0,
        horizon_years: 12,
        vacancy_rate: 4.0,
        charges_rate: 20.0,
        property_tax: 100.0,
        appreciation_rate: 1.5,
        rent_revaluation_rate: 2.0,
        income_tax_rate: 0.0,
        format: OutputFormat::Json,
    }
}

fn build_simulate_response(
    config: &SimulationConfig,
    records: Vec<MonthlyRecord>,
) -> SimulateResponse {
    SimulateResponse {
        years: yearly_summaries(&records),
        price_projection: price_projection(config),
        loan_debt_by_year: loan_debt_by_year(&records),
        final_indicators: final_indicators(&records),
        months: records,
    }
}

fn render_monthly_table(records: &[MonthlyRecord]) -> String {
    let mut out = format!(
        "{:>4} {:>5} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>9} {:>10} {:>10} {:>10} {:>10} {:>9}  {}\n",
        "Year",
        "Month",
        "Props",
        "Gross",
        "Net",
        "Payment",
        "Interest",
        "Princ.",
        "CashFlow",
        "Cash",
        "Debt",
        "Assets",
        "NetWorth",
        "Price",
        "Note"
    );
    for r in records {
        out.push_str(&format!(
            "{:>4} {:>5} {:>5} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>9.0} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>9.0}  {}\n",
            r.year,
            r.month,
            r.property_count,
            r.gross_rent,
            r.net_rent,
            r.total_payment,
            r.total_interest,
            r.total_principal,
            r.cash_flow,
            r.cash,
            r.total_debt,
            r.total_asset_value,
            r.net_worth,
            r.property_price,
            r.note
        ));
    }
    out
}

fn render_yearly_table(records: &[MonthlyRecord]) -> String {
    let mut out = format!(
        "{:>4} {:>5} {:>10} {:>12} {:>10} {:>10} {:>10} {:>10} {:>9}\n",
        "Year", "Props", "CashFlow", "Cumulative", "Cash", "Debt", "Assets", "NetWorth", "Rent"
    );
    for y in yearly_summaries(records) {
        out.push_str(&format!(
            "{:>4} {:>5} {:>10.0} {:>12.0} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>9.0}\n",
            y.year,
            y.property_count,
            y.cash_flow,
            y.cumulative_cash_flow,
            y.cash,
            y.total_debt,
            y.total_asset_value,
            y.net_worth,
            y.gross_rent
        ));
    }

    if let Some(last) = final_indicators(records) {
        out.push_str(&format!(
            "\nProperties: {}  Gross assets: {}  Debt: {}  Net worth: {}  Cash: {}\n",
            last.property_count,
            format_amount(last.gross_asset_value),
            format_amount(last.total_debt),
            format_amount(last.net_worth),
            format_amount(last.cash)
        ));
    }
    out
}
