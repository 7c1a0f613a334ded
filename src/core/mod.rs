mod engine;
mod error;
mod report;
mod types;

pub use engine::{SimulationState, advance_one_month, monthly_payment, run_simulation};
pub use error::{Result, SimulationError};
pub use report::{
    final_indicators, format_amount, loan_debt_by_year, price_projection, yearly_summaries,
};
pub use types::{
    FinalIndicators, Loan, LoanDebtYear, MAX_YEARS, MonthlyRecord, PricePoint,
    SimulationConfig, YearSummary,
};
