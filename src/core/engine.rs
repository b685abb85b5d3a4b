use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::amortization::{MinimumPaymentPolicy, project_card};
use super::hardship::{
    Haircut, LifeEventImpactTable, apply_haircut, compute_haircut_percentage,
};
use super::income::{HouseholdIncome, aggregate_household_income};
use super::portfolio::{PortfolioSummary, SentimentLabel, sentiment_label, summarize_portfolio};
use super::record::{HouseholdInputs, HouseholdRecord, InputWarning};
use super::tax::{TaxTables, effective_tax_rate};
use super::types::{CardProjection, FilingStatus};
use crate::error::TableError;

/// Process-wide reference data. Loaded once, shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    pub tax: TaxTables,
    pub life_events: LifeEventImpactTable,
}

impl ReferenceTables {
    pub fn embedded() -> Self {
        Self {
            tax: TaxTables::embedded(),
            life_events: LifeEventImpactTable::embedded(),
        }
    }

    /// Files override the embedded defaults table by table.
    pub fn load(
        tax_path: Option<&Path>,
        life_event_path: Option<&Path>,
    ) -> Result<Self, TableError> {
        let tax = match tax_path {
            Some(path) => TaxTables::from_json(&read_table(path)?)?,
            None => TaxTables::embedded(),
        };
        let life_events = match life_event_path {
            Some(path) => LifeEventImpactTable::from_json(&read_table(path)?)?,
            None => LifeEventImpactTable::embedded(),
        };
        info!(
            tax_table = %tax_path.map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".to_string()),
            life_event_entries = life_events.len(),
            "reference tables loaded"
        );
        Ok(Self { tax, life_events })
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::embedded()
    }
}

fn read_table(path: &Path) -> Result<String, TableError> {
    fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Share of after-tax income an average household spends per category, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingBenchmark {
    pub housing: f64,
    pub transportation: f64,
    pub food: f64,
    pub personal_insurance_and_pensions: f64,
    pub healthcare: f64,
    pub misc: f64,
    pub savings_disposable: f64,
}

pub const NATIONAL_SPENDING: SpendingBenchmark = SpendingBenchmark {
    housing: 33.0,
    transportation: 17.0,
    food: 13.0,
    personal_insurance_and_pensions: 12.0,
    healthcare: 5.0,
    misc: 8.0,
    savings_disposable: 12.0,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeAnalysis {
    #[serde(flatten)]
    pub household: HouseholdIncome,
    pub filing_status: FilingStatus,
    pub federal_tax: f64,
    pub effective_tax_rate: f64,
    pub after_tax_annual_income: f64,
    pub after_tax_monthly_income: f64,
    pub haircut: Haircut,
    pub disposable_annual_income: f64,
    pub disposable_monthly_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdReport {
    pub as_of: NaiveDate,
    pub income: IncomeAnalysis,
    pub cards: Vec<CardProjection>,
    pub portfolio: PortfolioSummary,
    pub sentiment: SentimentLabel,
    pub national_spending: SpendingBenchmark,
    pub benchmark_debt_budget_monthly: f64,
    pub warnings: Vec<InputWarning>,
}

pub fn analyze_income(
    inputs: &HouseholdInputs,
    tables: &ReferenceTables,
    as_of: NaiveDate,
) -> IncomeAnalysis {
    let household = aggregate_household_income(&inputs.income, as_of);
    let filing_status = FilingStatus::from_spouse_salary(inputs.income.spouse_annual_salary);

    let gross = household.household_annual_income;
    let federal_tax = tables.tax.calculate_tax(gross, filing_status);
    let after_tax_annual_income = gross - federal_tax;

    let haircut = compute_haircut_percentage(&inputs.life_events, &tables.life_events);
    let disposable_annual_income = apply_haircut(after_tax_annual_income, haircut.haircut_percentage);

    debug!(
        gross,
        federal_tax,
        ?filing_status,
        haircut = haircut.haircut_percentage,
        "income analysed"
    );

    IncomeAnalysis {
        household,
        filing_status,
        federal_tax,
        effective_tax_rate: effective_tax_rate(federal_tax, gross),
        after_tax_annual_income,
        after_tax_monthly_income: after_tax_annual_income / 12.0,
        haircut,
        disposable_annual_income,
        disposable_monthly_income: disposable_annual_income / 12.0,
    }
}

pub fn build_report(
    inputs: &HouseholdInputs,
    tables: &ReferenceTables,
    policy: &MinimumPaymentPolicy,
    as_of: NaiveDate,
) -> HouseholdReport {
    let income = analyze_income(inputs, tables, as_of);

    let cards: Vec<CardProjection> = inputs
        .cards
        .iter()
        .map(|card| project_card(card, policy, as_of))
        .collect();
    let portfolio = summarize_portfolio(&inputs.cards, &cards);

    let sentiment = sentiment_label(
        portfolio.utilization.utilization,
        portfolio.total_minimum_payment,
        income.disposable_monthly_income,
    );
    let benchmark_debt_budget_monthly =
        income.after_tax_monthly_income * NATIONAL_SPENDING.savings_disposable / 100.0;

    info!(
        cards = cards.len(),
        warnings = inputs.warnings.len(),
        utilization = ?portfolio.utilization.label,
        payment_status = ?portfolio.payment_status.label,
        ?sentiment,
        "household report built"
    );

    HouseholdReport {
        as_of,
        income,
        cards,
        portfolio,
        sentiment,
        national_spending: NATIONAL_SPENDING,
        benchmark_debt_budget_monthly,
        warnings: inputs.warnings.clone(),
    }
}

pub fn build_report_from_record(
    record: &HouseholdRecord,
    tables: &ReferenceTables,
    policy: &MinimumPaymentPolicy,
    as_of: NaiveDate,
) -> HouseholdReport {
    build_report(&record.to_inputs(), tables, policy, as_of)
}
