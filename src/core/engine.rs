use tracing::{debug, info};

use super::error::{Result, SimulationError};
use super::types::{Loan, MAX_YEARS, MonthlyRecord, SimulationConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    months_elapsed: u32,
    cash: f64,
    property_price: f64,
    monthly_rent: f64,
    loans: Vec<Loan>,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            months_elapsed: 0,
            cash: 0.0,
            property_price: config.initial_property_price,
            monthly_rent: config.initial_monthly_rent,
            loans: Vec::new(),
        })
    }

    pub fn months_elapsed(&self) -> u32 {
        self.months_elapsed
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn property_price(&self) -> f64 {
        self.property_price
    }

    pub fn monthly_rent(&self) -> f64 {
        self.monthly_rent
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn total_debt(&self) -> f64 {
        self.loans.iter().map(|loan| loan.remaining_principal).sum()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct LoanService {
    payment: f64,
    interest: f64,
    principal: f64,
}

pub fn monthly_payment(principal: f64, annual_rate: f64, term_years: u32) -> Result<f64> {
    if term_years == 0 {
        return Err(SimulationError::invalid_config(
            "loan_term_years",
            "must be > 0",
        ));
    }
    if term_years > MAX_YEARS {
        return Err(SimulationError::invalid_config(
            "loan_term_years",
            format!("must be <= {MAX_YEARS}"),
        ));
    }
    if !principal.is_finite() || principal < 0.0 {
        return Err(SimulationError::invalid_config("principal", "must be >= 0"));
    }
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(SimulationError::invalid_config(
            "annual_interest_rate",
            "must be >= 0",
        ));
    }
    Ok(annuity_payment(principal, annual_rate, term_years * 12))
}

fn annuity_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    let months = months as f64;
    if annual_rate == 0.0 {
        return principal / months;
    }
    let monthly_rate = annual_rate / 12.0;
    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-months))
}

pub fn run_simulation(config: &SimulationConfig) -> Result<Vec<MonthlyRecord>> {
    let mut state = SimulationState::new(config)?;
    let total_months = config.total_months();
    let mut records = Vec::with_capacity(total_months as usize);
    for _ in 0..total_months {
        records.push(advance_one_month(config, &mut state));
    }

    info!(
        months = total_months,
        properties = state.loans.len(),
        "simulation complete"
    );
    Ok(records)
}

// `state` must have been built from the same `config`.
pub fn advance_one_month(config: &SimulationConfig, state: &mut SimulationState) -> MonthlyRecord {
    state.months_elapsed += 1;
    let month_index = state.months_elapsed;
    let year = (month_index - 1) / 12 + 1;
    let month = (month_index - 1) % 12 + 1;

    state.cash += config.monthly_savings;

    let property_count = state.loans.len();
    let gross_rent: f64 = state.loans.iter().map(|loan| loan.locked_in_rent).sum();
    let net_rent = gross_rent * (1.0 - config.vacancy_rate - config.charges_rate)
        - property_count as f64 * config.monthly_property_tax;

    let service = service_loans(&mut state.loans, config.annual_interest_rate);

    let pre_tax_profit = net_rent - service.payment;
    let tax = pre_tax_profit.max(0.0) * config.income_tax_rate;
    // Savings were already banked above; they only feed the reported figure here.
    let cash_flow = pre_tax_profit - tax + config.monthly_savings;
    state.cash += net_rent - service.payment - tax;

    let acquired = state.cash >= config.down_payment;
    let note = if acquired {
        acquire_property(config, state, month_index)
    } else {
        String::new()
    };

    if month == 1 && month_index > 1 {
        state.property_price *= 1.0 + config.annual_appreciation_rate;
        state.monthly_rent *= 1.0 + config.annual_rent_revaluation_rate;
    }

    let property_count = state.loans.len();
    let total_debt = state.total_debt();
    let total_asset_value = property_count as f64 * state.property_price;

    MonthlyRecord {
        year,
        month,
        month_index,
        property_count,
        gross_rent,
        net_rent,
        total_payment: service.payment,
        total_interest: service.interest,
        total_principal: service.principal,
        cash_flow,
        cash: state.cash,
        total_debt,
        total_asset_value,
        net_worth: total_asset_value - total_debt,
        property_price: state.property_price,
        loan_balances: state
            .loans
            .iter()
            .map(|loan| loan.remaining_principal)
            .collect(),
        acquired,
        note,
    }
}

fn service_loans(loans: &mut [Loan], annual_rate: f64) -> LoanService {
    let mut service = LoanService::default();
    for loan in loans.iter_mut().filter(|loan| !loan.is_inert()) {
        let interest = loan.remaining_principal * (annual_rate / 12.0);
        let principal_paid = loan.monthly_payment - interest;
        loan.remaining_principal = (loan.remaining_principal - principal_paid).max(0.0);

        service.payment += loan.monthly_payment;
        service.interest += interest;
        service.principal += principal_paid;
    }
    service
}

fn acquire_property(
    config: &SimulationConfig,
    state: &mut SimulationState,
    month_index: u32,
) -> String {
    let principal = state.property_price - config.down_payment;
    let payment = annuity_payment(
        principal,
        config.annual_interest_rate,
        config.loan_term_years * 12,
    );
    state.loans.push(Loan {
        acquisition_month: month_index,
        locked_in_rent: state.monthly_rent,
        purchase_price: state.property_price,
        principal,
        monthly_payment: payment,
        remaining_principal: principal,
    });
    state.cash -= config.down_payment;

    let number = state.loans.len();
    debug!(
        month = month_index,
        property = number,
        price = state.property_price,
        payment,
        "acquired property"
    );
    format!(
        "Acquired property #{number} at price ≈{}",
        state.property_price.round()
    )
}
