use chrono::NaiveDate;
use serde::Serialize;

use super::types::{Expiration, HouseholdIncomeProfile, IncomeCategory, IncomeStream};

/// Every active stream is credited with a full year, however close its end date.
pub const PROJECTION_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamContribution {
    pub category: IncomeCategory,
    pub monthly_amount: f64,
    pub end_date: Option<NaiveDate>,
    pub active_months: u32,
    pub annual_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdIncome {
    pub household_annual_income: f64,
    pub household_monthly_income: f64,
    pub user_annual_income: f64,
    pub spouse_annual_income: f64,
    pub supplemental_annual_income: f64,
    pub streams: Vec<StreamContribution>,
}

impl HouseholdIncome {
    pub fn stream(&self, category: IncomeCategory) -> Option<&StreamContribution> {
        self.streams.iter().find(|s| s.category == category)
    }
}

pub fn aggregate_household_income(
    profile: &HouseholdIncomeProfile,
    as_of: NaiveDate,
) -> HouseholdIncome {
    let user_annual_income = profile.user_annual_salary;
    let spouse_annual_income = profile.spouse_annual_salary.unwrap_or(0.0);

    let streams: Vec<StreamContribution> = profile
        .streams
        .iter()
        .map(|stream| stream_contribution(stream, as_of))
        .collect();
    let supplemental_annual_income: f64 = streams.iter().map(|s| s.annual_amount).sum();

    let household_annual_income =
        user_annual_income + spouse_annual_income + supplemental_annual_income;

    HouseholdIncome {
        household_annual_income,
        household_monthly_income: household_annual_income / 12.0,
        user_annual_income,
        spouse_annual_income,
        supplemental_annual_income,
        streams,
    }
}

fn stream_contribution(stream: &IncomeStream, as_of: NaiveDate) -> StreamContribution {
    let (active_months, end_date) = match &stream.expiration {
        Expiration::Never => (Some(PROJECTION_MONTHS), None),
        Expiration::On(date) if *date > as_of => (Some(PROJECTION_MONTHS), Some(*date)),
        Expiration::On(date) => (Some(0), Some(*date)),
        Expiration::Malformed(_) => (None, None),
    };

    let annual_amount = match active_months {
        Some(months) => stream.monthly_amount * f64::from(months),
        None => f64::NAN,
    };

    StreamContribution {
        category: stream.category,
        monthly_amount: stream.monthly_amount,
        end_date,
        active_months: active_months.unwrap_or(0),
        annual_amount,
    }
}
