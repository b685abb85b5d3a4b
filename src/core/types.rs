use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilingStatus {
    Single,
    Joint,
}

impl FilingStatus {
    /// Joint only when a spouse salary is present and strictly positive.
    pub fn from_spouse_salary(spouse_salary: Option<f64>) -> Self {
        match spouse_salary {
            Some(salary) if salary > 0.0 => FilingStatus::Joint,
            _ => FilingStatus::Single,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncomeCategory {
    Alimony,
    Severance,
    Disability,
    WorkersCompensation,
    ChildSupport,
    Unemployment,
    SocialSecurity,
    Retirement,
    PartTime,
    Consulting,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expiration {
    Never,
    On(NaiveDate),
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IncomeStream {
    pub category: IncomeCategory,
    pub monthly_amount: f64,
    pub expiration: Expiration,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HouseholdIncomeProfile {
    pub user_annual_salary: f64,
    pub spouse_annual_salary: Option<f64>,
    pub streams: Vec<IncomeStream>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifeEventProfile {
    pub life_events: Vec<String>,
    pub catastrophic_loss: Option<String>,
    pub extended_family_care: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PaymentBehavior {
    #[serde(rename = "Minimum Payments", alias = "minimum")]
    Minimum,
    #[serde(rename = "More than Minimum", alias = "moreThanMinimum")]
    MoreThanMinimum,
    #[serde(rename = "Not Being Paid", alias = "notPaid")]
    NotPaid,
    #[serde(rename = "Account Charged Off", alias = "chargedOff")]
    ChargedOff,
    #[serde(other)]
    Unknown,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Timeliness {
    #[serde(rename = "On-Time", alias = "onTime")]
    OnTime,
    #[serde(rename = "30 to 60 days late")]
    Late30To60,
    #[serde(rename = "61 to 90 days late")]
    Late61To90,
    #[serde(rename = "90+ days late")]
    Late90Plus,
    #[serde(rename = "Account Charged Off", alias = "chargedOff")]
    ChargedOff,
    #[serde(other)]
    Unknown,
}

impl Timeliness {
    /// 61+ days late or charged off.
    pub fn is_severe(self) -> bool {
        matches!(
            self,
            Timeliness::Late61To90 | Timeliness::Late90Plus | Timeliness::ChargedOff
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreditCard {
    pub card_type: String,
    pub balance: f64,
    pub apr: f64,
    pub credit_limit: f64,
    pub payment_behavior: PaymentBehavior,
    pub timeliness: Timeliness,
    pub usage_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentPolicy {
    pub principal: f64,
    pub apr: f64,
    pub minimum_payment: f64,
    pub additional_payment: f64,
    pub required_principal_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub month: u32,
    pub starting_balance: f64,
    pub interest: f64,
    pub principal: f64,
    pub payment: f64,
    pub required_minimum_payment: f64,
    pub ending_balance: f64,
    pub cumulative_principal: f64,
    pub cumulative_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_interest_paid: f64,
    pub total_principal_paid: f64,
    pub payoff_months: u32,
    pub years_to_payoff: f64,
    pub monthly_payment: f64,
    pub debt_free_date: Option<NaiveDate>,
    pub debt_free_date_label: String,
    pub capped: bool,
    /// Set when an input amount was not a finite number.
    pub indeterminate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
    pub entries: Vec<ScheduleEntry>,
    pub summary: PaymentSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProjection {
    pub card_type: String,
    pub balance: f64,
    pub apr: f64,
    pub credit_limit: f64,
    pub utilization: Option<f64>,
    pub payment_behavior: PaymentBehavior,
    pub timeliness: Timeliness,
    pub usage_status: Option<String>,
    pub minimum_payment_due: f64,
    pub payoff_months: u32,
    pub years_to_payoff: f64,
    pub total_interest_paid: f64,
    pub debt_free_date: Option<NaiveDate>,
    pub debt_free_date_label: String,
    pub capped: bool,
    pub indeterminate: bool,
}
