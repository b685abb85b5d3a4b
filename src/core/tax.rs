use std::sync::OnceLock;

use serde::Deserialize;

use super::types::FilingStatus;
use crate::error::TableError;

const DEFAULT_TAX_TABLES_JSON: &str = include_str!("../../data/tax_brackets.json");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxBracketTable {
    brackets: Vec<TaxBracket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxTables {
    pub single: TaxBracketTable,
    pub joint: TaxBracketTable,
}

// `threshold: null` marks the unbounded top bracket; JSON has no infinity.
#[derive(Debug, Deserialize)]
struct RawBracket {
    threshold: Option<f64>,
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct RawTaxTables {
    single: Vec<RawBracket>,
    joint: Vec<RawBracket>,
}

impl TaxBracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, TableError> {
        let Some(last) = brackets.last() else {
            return Err(TableError::InvalidBrackets("table has no brackets".to_string()));
        };
        if last.threshold != f64::INFINITY {
            return Err(TableError::InvalidBrackets(
                "top bracket must be unbounded".to_string(),
            ));
        }

        let mut previous = 0.0;
        for (idx, bracket) in brackets.iter().enumerate() {
            if bracket.threshold.is_nan() || bracket.threshold <= previous {
                return Err(TableError::InvalidBrackets(format!(
                    "bracket {idx} threshold {} is not above {previous}",
                    bracket.threshold
                )));
            }
            if !(0.0..=1.0).contains(&bracket.rate) {
                return Err(TableError::InvalidBrackets(format!(
                    "bracket {idx} rate {} must be between 0 and 1",
                    bracket.rate
                )));
            }
            previous = bracket.threshold;
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    fn from_raw(raw: Vec<RawBracket>) -> Result<Self, TableError> {
        Self::new(
            raw.into_iter()
                .map(|b| TaxBracket {
                    threshold: b.threshold.unwrap_or(f64::INFINITY),
                    rate: b.rate,
                })
                .collect(),
        )
    }
}

impl TaxTables {
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let raw: RawTaxTables = serde_json::from_str(json)?;
        Ok(Self {
            single: TaxBracketTable::from_raw(raw.single)?,
            joint: TaxBracketTable::from_raw(raw.joint)?,
        })
    }

    /// 2024 US federal brackets.
    pub fn embedded() -> Self {
        Self::from_json(DEFAULT_TAX_TABLES_JSON).expect("embedded tax table is valid")
    }

    pub fn for_status(&self, filing_status: FilingStatus) -> &TaxBracketTable {
        match filing_status {
            FilingStatus::Single => &self.single,
            FilingStatus::Joint => &self.joint,
        }
    }

    pub fn calculate_tax(&self, income: f64, filing_status: FilingStatus) -> f64 {
        calculate_tax_with(self.for_status(filing_status), income)
    }
}

impl Default for TaxTables {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Marginal tax over the bracket table. Each bracket only taxes the slice of
/// income between the previous threshold and its own.
pub fn calculate_tax_with(table: &TaxBracketTable, income: f64) -> f64 {
    if income.is_nan() {
        return f64::NAN;
    }
    if income <= 0.0 {
        return 0.0;
    }

    let mut tax = 0.0;
    let mut previous_threshold = 0.0;
    for bracket in table.brackets() {
        if income <= bracket.threshold {
            tax += (income - previous_threshold) * bracket.rate;
            break;
        }
        tax += (bracket.threshold - previous_threshold) * bracket.rate;
        previous_threshold = bracket.threshold;
    }
    tax
}

/// Tax against the compiled-in tables.
pub fn calculate_tax(income: f64, filing_status: FilingStatus) -> f64 {
    static EMBEDDED: OnceLock<TaxTables> = OnceLock::new();
    EMBEDDED
        .get_or_init(TaxTables::embedded)
        .calculate_tax(income, filing_status)
}

pub fn effective_tax_rate(tax: f64, income: f64) -> f64 {
    if income > 0.0 { tax / income } else { 0.0 }
}
