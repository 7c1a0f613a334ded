use serde::Serialize;

use super::error::{Result, SimulationError};

pub const MAX_YEARS: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub monthly_savings: f64,
    pub initial_property_price: f64,
    pub down_payment: f64,
    pub initial_monthly_rent: f64,
    pub loan_term_years: u32,
    pub annual_interest_rate: f64,
    pub horizon_years: u32,
    pub vacancy_rate: f64,
    pub charges_rate: f64,
    pub monthly_property_tax: f64,
    pub annual_appreciation_rate: f64,
    pub annual_rent_revaluation_rate: f64,
    pub income_tax_rate: f64,
}

impl SimulationConfig {
    pub fn total_months(&self) -> u32 {
        self.horizon_years * 12
    }

    pub fn validate(&self) -> Result<()> {
        for (name, years) in [
            ("loan_term_years", self.loan_term_years),
            ("horizon_years", self.horizon_years),
        ] {
            if years == 0 {
                return Err(SimulationError::invalid_config(name, "must be > 0"));
            }
            if years > MAX_YEARS {
                return Err(SimulationError::invalid_config(
                    name,
                    format!("must be <= {MAX_YEARS}"),
                ));
            }
        }

        for (name, amount) in [
            ("monthly_savings", self.monthly_savings),
            ("initial_property_price", self.initial_property_price),
            ("down_payment", self.down_payment),
            ("initial_monthly_rent", self.initial_monthly_rent),
            ("monthly_property_tax", self.monthly_property_tax),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(SimulationError::invalid_config(name, "must be >= 0"));
            }
        }

        for (name, rate) in [
            ("annual_interest_rate", self.annual_interest_rate),
            ("vacancy_rate", self.vacancy_rate),
            ("charges_rate", self.charges_rate),
            ("annual_appreciation_rate", self.annual_appreciation_rate),
            (
                "annual_rent_revaluation_rate",
                self.annual_rent_revaluation_rate,
            ),
            ("income_tax_rate", self.income_tax_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(SimulationError::invalid_config(
                    name,
                    "must be between 0 and 1 (exclusive)",
                ));
            }
        }

        if self.vacancy_rate + self.charges_rate > 1.0 {
            return Err(SimulationError::invalid_config(
                "charges_rate",
                "combined with vacancy_rate must not exceed 1",
            ));
        }

        // The price never decreases, so checking the initial price covers every purchase.
        if self.down_payment > self.initial_property_price {
            return Err(SimulationError::invalid_config(
                "down_payment",
                "must not exceed initial_property_price",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub acquisition_month: u32,
    pub locked_in_rent: f64,
    pub purchase_price: f64,
    pub principal: f64,
    pub monthly_payment: f64,
    pub remaining_principal: f64,
}

impl Loan {
    pub fn is_inert(&self) -> bool {
        self.remaining_principal <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub year: u32,
    pub month: u32,
    pub month_index: u32,
    pub property_count: usize,
    pub gross_rent: f64,
    pub net_rent: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub total_principal: f64,
    pub cash_flow: f64,
    pub cash: f64,
    pub total_debt: f64,
    pub total_asset_value: f64,
    pub net_worth: f64,
    pub property_price: f64,
    pub loan_balances: Vec<f64>,
    pub acquired: bool,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub cash_flow: f64,
    pub cumulative_cash_flow: f64,
    pub gross_rent: f64,
    pub cash: f64,
    pub total_debt: f64,
    pub total_asset_value: f64,
    pub net_worth: f64,
    pub property_price: f64,
    pub property_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub year: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDebtYear {
    pub year: u32,
    pub balances: Vec<f64>,
    pub total_debt: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalIndicators {
    pub property_count: usize,
    pub gross_asset_value: f64,
    pub total_debt: f64,
    pub net_worth: f64,
    pub cash: f64,
}
