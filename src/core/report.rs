use super::types::{
    FinalIndicators, LoanDebtYear, MonthlyRecord, PricePoint, SimulationConfig, YearSummary,
};

// Flows are summed per year; balances keep the last month of the year.
pub fn yearly_summaries(records: &[MonthlyRecord]) -> Vec<YearSummary> {
    let mut years: Vec<YearSummary> = Vec::new();
    for record in records {
        match years.last_mut() {
            Some(summary) if summary.year == record.year => {
                summary.cash_flow += record.cash_flow;
                summary.gross_rent += record.gross_rent;
                summary.cash = record.cash;
                summary.total_debt = record.total_debt;
                summary.total_asset_value = record.total_asset_value;
                summary.net_worth = record.net_worth;
                summary.property_price = record.property_price;
                summary.property_count = record.property_count;
            }
            _ => years.push(YearSummary {
                year: record.year,
                cash_flow: record.cash_flow,
                cumulative_cash_flow: 0.0,
                gross_rent: record.gross_rent,
                cash: record.cash,
                total_debt: record.total_debt,
                total_asset_value: record.total_asset_value,
                net_worth: record.net_worth,
                property_price: record.property_price,
                property_count: record.property_count,
            }),
        }
    }

    let mut running = 0.0;
    for summary in &mut years {
        running += summary.cash_flow;
        summary.cumulative_cash_flow = running;
    }
    years
}

pub fn price_projection(config: &SimulationConfig) -> Vec<PricePoint> {
    (1..=config.horizon_years)
        .map(|year| PricePoint {
            year,
            price: config.initial_property_price
                * (1.0 + config.annual_appreciation_rate).powi(year as i32 - 1),
        })
        .collect()
}

// Loans not yet originated in a year count as zero.
pub fn loan_debt_by_year(records: &[MonthlyRecord]) -> Vec<LoanDebtYear> {
    let loan_count = records
        .iter()
        .map(|record| record.loan_balances.len())
        .max()
        .unwrap_or(0);
    if loan_count == 0 {
        return Vec::new();
    }

    let mut rows: Vec<LoanDebtYear> = Vec::new();
    for record in records {
        let mut balances = record.loan_balances.clone();
        balances.resize(loan_count, 0.0);
        let total_debt: f64 = balances.iter().sum();
        let row = LoanDebtYear {
            year: record.year,
            balances,
            total_debt,
        };
        match rows.last_mut() {
            Some(last) if last.year == record.year => *last = row,
            _ => rows.push(row),
        }
    }
    rows
}

pub fn final_indicators(records: &[MonthlyRecord]) -> Option<FinalIndicators> {
    let last = records.last()?;
    Some(FinalIndicators {
        property_count: last.property_count,
        gross_asset_value: last.total_asset_value,
        total_debt: last.total_debt,
        net_worth: last.net_worth,
        cash: last.cash,
    })
}

pub fn format_amount(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1} M€", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0} k€", value / 1_000.0)
    } else {
        format!("{:.0} €", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run_simulation;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_config() -> SimulationConfig {
        SimulationConfig {
            monthly_savings: 2_500.0,
            initial_property_price: 100_000.0,
            down_payment: 10_000.0,
            initial_monthly_rent: 800.0,
            loan_term_years: 7,
            annual_interest_rate: 0.03,
            horizon_years: 12,
            vacancy_rate: 0.04,
            charges_rate: 0.20,
            monthly_property_tax: 100.0,
            annual_appreciation_rate: 0.015,
            annual_rent_revaluation_rate: 0.02,
            income_tax_rate: 0.0,
        }
    }

    fn record(year: u32, month: u32, cash_flow: f64, balances: Vec<f64>) -> MonthlyRecord {
        let total_debt: f64 = balances.iter().sum();
        MonthlyRecord {
            year,
            month,
            month_index: (year - 1) * 12 + month,
            property_count: balances.len(),
            gross_rent: 100.0,
            net_rent: 80.0,
            total_payment: 0.0,
            total_interest: 0.0,
            total_principal: 0.0,
            cash_flow,
            cash: cash_flow * month as f64,
            total_debt,
            total_asset_value: 1_000.0 * balances.len() as f64,
            net_worth: 1_000.0 * balances.len() as f64 - total_debt,
            property_price: 1_000.0,
            loan_balances: balances,
            acquired: false,
            note: String::new(),
        }
    }

    #[test]
    fn yearly_summaries_sum_flows_and_keep_last_balances() {
        let records = vec![
            record(1, 1, 10.0, vec![]),
            record(1, 2, 20.0, vec![500.0]),
            record(2, 1, 5.0, vec![400.0]),
        ];
        let years = yearly_summaries(&records);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 1);
        assert_approx(years[0].cash_flow, 30.0);
        assert_approx(years[0].gross_rent, 200.0);
        assert_approx(years[0].cash, 40.0);
        assert_approx(years[0].total_debt, 500.0);
        assert_eq!(years[0].property_count, 1);
        assert_approx(years[0].cumulative_cash_flow, 30.0);

        assert_approx(years[1].cash_flow, 5.0);
        assert_approx(years[1].total_debt, 400.0);
        assert_approx(years[1].cumulative_cash_flow, 35.0);
    }

    #[test]
    fn yearly_summaries_match_simulation_year_ends() {
        let records = run_simulation(&sample_config()).expect("valid config");
        let years = yearly_summaries(&records);
        assert_eq!(years.len(), 12);

        for summary in &years {
            let year_records: Vec<_> = records.iter().filter(|r| r.year == summary.year).collect();
            assert_eq!(year_records.len(), 12);
            let last = year_records[11];
            assert_eq!(summary.net_worth, last.net_worth);
            assert_eq!(summary.property_price, last.property_price);
            let flows: f64 = year_records.iter().map(|r| r.cash_flow).sum();
            assert!((summary.cash_flow - flows).abs() <= 1e-6);
        }
    }

    #[test]
    fn price_projection_compounds_from_year_one() {
        let points = price_projection(&sample_config());
        assert_eq!(points.len(), 12);
        assert_eq!(points[0].year, 1);
        assert_approx(points[0].price, 100_000.0);
        assert_approx(points[1].price, 101_500.0);
        assert_approx(points[11].price, 100_000.0 * 1.015_f64.powi(11));
    }

    #[test]
    fn loan_debt_by_year_pads_unoriginated_loans_with_zero() {
        let records = vec![
            record(1, 1, 0.0, vec![900.0]),
            record(1, 2, 0.0, vec![800.0]),
            record(2, 1, 0.0, vec![700.0, 500.0]),
        ];
        let rows = loan_debt_by_year(&records);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].balances, vec![800.0, 0.0]);
        assert_approx(rows[0].total_debt, 800.0);
        assert_eq!(rows[1].balances, vec![700.0, 500.0]);
        assert_approx(rows[1].total_debt, 1_200.0);
    }

    #[test]
    fn loan_debt_by_year_is_empty_without_loans() {
        let records = vec![record(1, 1, 0.0, vec![])];
        assert!(loan_debt_by_year(&records).is_empty());
    }

    #[test]
    fn final_indicators_come_from_last_month() {
        assert!(final_indicators(&[]).is_none());

        let records = run_simulation(&sample_config()).expect("valid config");
        let last = records.last().expect("non-empty run");
        let indicators = final_indicators(&records).expect("non-empty run");
        assert_eq!(indicators.property_count, last.property_count);
        assert_eq!(indicators.gross_asset_value, last.total_asset_value);
        assert_eq!(indicators.net_worth, last.net_worth);
        assert_eq!(indicators.cash, last.cash);
    }

    #[test]
    fn format_amount_uses_thresholds() {
        assert_eq!(format_amount(950.0), "950 €");
        assert_eq!(format_amount(12_400.0), "12 k€");
        assert_eq!(format_amount(1_000.0), "1 k€");
        assert_eq!(format_amount(2_345_678.0), "2.3 M€");
    }
}
