use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::hardship::normalize_life_events;
use super::types::{
    CreditCard, Expiration, HouseholdIncomeProfile, IncomeCategory, IncomeStream,
    LifeEventProfile, PaymentBehavior, Timeliness,
};

/// Monetary fields arrive as numbers or as free-form strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// Life events arrive as a comma-separated string or as an array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LifeEventsField {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardRecord {
    pub card_type: Option<String>,
    pub balance: Option<RawAmount>,
    #[serde(alias = "apr")]
    pub interest: Option<RawAmount>,
    pub credit_limit: Option<RawAmount>,
    pub card_use_status: Option<String>,
    pub monthly_payment_type: Option<PaymentBehavior>,
    pub payment_timely_status: Option<Timeliness>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HouseholdRecord {
    pub annual_salary: Option<RawAmount>,
    pub spouse_annual_salary: Option<RawAmount>,

    #[serde(alias = "AlimonyMonthly")]
    pub alimony_monthly: Option<RawAmount>,
    #[serde(alias = "AlimonyEndDate")]
    pub alimony_end_date: Option<String>,
    #[serde(alias = "severenceMonthly")]
    pub severance_monthly: Option<RawAmount>,
    #[serde(alias = "severenceEndDate")]
    pub severance_end_date: Option<String>,
    pub disability_monthly: Option<RawAmount>,
    pub disability_end_date: Option<String>,
    pub worker_comp_monthly: Option<RawAmount>,
    pub worker_comp_end_date: Option<String>,
    pub child_support_monthly: Option<RawAmount>,
    pub child_support_end_date: Option<String>,
    pub unemployment_monthly: Option<RawAmount>,
    pub unemployment_end_date: Option<String>,
    pub social_security_monthly: Option<RawAmount>,
    pub social_security_end_date: Option<String>,
    #[serde(alias = "retirementMonthly")]
    pub user_retirement_monthly: Option<RawAmount>,
    #[serde(alias = "retirementEndDate")]
    pub user_retirement_end_date: Option<String>,
    pub part_time_monthly: Option<RawAmount>,
    pub part_time_end_date: Option<String>,
    pub consulting_monthly: Option<RawAmount>,
    pub consulting_end_date: Option<String>,

    pub all_life_events: Option<LifeEventsField>,
    #[serde(rename = "catastropicLoss", alias = "catastrophicLoss")]
    pub catastrophic_loss: Option<String>,
    pub extended_family_care: Option<String>,

    pub user_cards: Vec<CardRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputWarning {
    pub field: String,
    pub value: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdInputs {
    pub income: HouseholdIncomeProfile,
    pub life_events: LifeEventProfile,
    pub cards: Vec<CreditCard>,
    pub warnings: Vec<InputWarning>,
}

/// Accepts either the bare record or the persisted `{ "email", "data" }` envelope.
/// A `data` key marks the envelope; errors inside it are returned, never retried
/// against the bare shape.
pub fn parse_household_json(json: &str) -> Result<HouseholdRecord, serde_json::Error> {
    let mut payload: Value = serde_json::from_str(json)?;
    let data = payload.get_mut("data").map(Value::take);
    match data {
        Some(data) => {
            let email = payload.get("email").and_then(Value::as_str).unwrap_or("");
            tracing::debug!(email, "parsed household envelope");
            serde_json::from_value(data)
        }
        None => serde_json::from_value(payload),
    }
}

#[derive(Default)]
struct Boundary {
    warnings: Vec<InputWarning>,
}

impl Boundary {
    fn warn(&mut self, field: &str, value: &str, message: &str) {
        warn!(field, value, "{message}");
        self.warnings.push(InputWarning {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        });
    }

    /// Absent and blank values are `None`; unparseable ones become NaN.
    fn amount(&mut self, field: &str, raw: Option<&RawAmount>) -> Option<f64> {
        match raw? {
            RawAmount::Number(value) => Some(*value),
            RawAmount::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let cleaned: String = trimmed
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',')
                    .collect();
                match cleaned.parse::<f64>() {
                    Ok(value) if value.is_finite() => Some(value),
                    _ => {
                        self.warn(field, text, "not a number");
                        Some(f64::NAN)
                    }
                }
            }
        }
    }

    fn non_negative(&mut self, field: &str, raw: Option<&RawAmount>) -> f64 {
        match self.amount(field, raw) {
            Some(value) if value < 0.0 => {
                self.warn(field, &value.to_string(), "negative value treated as zero");
                0.0
            }
            Some(value) => value,
            None => 0.0,
        }
    }

    fn expiration(&mut self, field: &str, raw: Option<&str>) -> Expiration {
        let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
            return Expiration::Never;
        };
        match parse_date(text) {
            Some(date) => Expiration::On(date),
            None => {
                self.warn(field, text, "not a date");
                Expiration::Malformed(text.to_string())
            }
        }
    }

    fn stream(
        &mut self,
        streams: &mut Vec<IncomeStream>,
        category: IncomeCategory,
        (amount_field, amount): (&str, Option<&RawAmount>),
        (date_field, end_date): (&str, Option<&String>),
    ) {
        let Some(monthly_amount) = self.amount(amount_field, amount) else {
            return;
        };
        let expiration = self.expiration(date_field, end_date.map(String::as_str));
        streams.push(IncomeStream {
            category,
            monthly_amount,
            expiration,
        });
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(text, "%m/%d/%Y").ok())
}

impl HouseholdRecord {
    pub fn to_inputs(&self) -> HouseholdInputs {
        let mut boundary = Boundary::default();

        let user_annual_salary = boundary
            .amount("annualSalary", self.annual_salary.as_ref())
            .unwrap_or(0.0);
        let spouse_annual_salary =
            boundary.amount("spouseAnnualSalary", self.spouse_annual_salary.as_ref());

        let mut streams = Vec::new();
        for (category, amount, end_date) in [
            (
                IncomeCategory::Alimony,
                ("alimonyMonthly", self.alimony_monthly.as_ref()),
                ("alimonyEndDate", self.alimony_end_date.as_ref()),
            ),
            (
                IncomeCategory::Severance,
                ("severanceMonthly", self.severance_monthly.as_ref()),
                ("severanceEndDate", self.severance_end_date.as_ref()),
            ),
            (
                IncomeCategory::Disability,
                ("disabilityMonthly", self.disability_monthly.as_ref()),
                ("disabilityEndDate", self.disability_end_date.as_ref()),
            ),
            (
                IncomeCategory::WorkersCompensation,
                ("workerCompMonthly", self.worker_comp_monthly.as_ref()),
                ("workerCompEndDate", self.worker_comp_end_date.as_ref()),
            ),
            (
                IncomeCategory::ChildSupport,
                ("childSupportMonthly", self.child_support_monthly.as_ref()),
                ("childSupportEndDate", self.child_support_end_date.as_ref()),
            ),
            (
                IncomeCategory::Unemployment,
                ("unemploymentMonthly", self.unemployment_monthly.as_ref()),
                ("unemploymentEndDate", self.unemployment_end_date.as_ref()),
            ),
            (
                IncomeCategory::SocialSecurity,
                ("socialSecurityMonthly", self.social_security_monthly.as_ref()),
                ("socialSecurityEndDate", self.social_security_end_date.as_ref()),
            ),
            (
                IncomeCategory::Retirement,
                ("userRetirementMonthly", self.user_retirement_monthly.as_ref()),
                ("userRetirementEndDate", self.user_retirement_end_date.as_ref()),
            ),
            (
                IncomeCategory::PartTime,
                ("partTimeMonthly", self.part_time_monthly.as_ref()),
                ("partTimeEndDate", self.part_time_end_date.as_ref()),
            ),
            (
                IncomeCategory::Consulting,
                ("consultingMonthly", self.consulting_monthly.as_ref()),
                ("consultingEndDate", self.consulting_end_date.as_ref()),
            ),
        ] {
            boundary.stream(&mut streams, category, amount, end_date);
        }

        let life_events = match &self.all_life_events {
            Some(LifeEventsField::Text(text)) => normalize_life_events([text.as_str()]),
            Some(LifeEventsField::List(items)) => {
                normalize_life_events(items.iter().map(String::as_str))
            }
            None => Vec::new(),
        };

        let cards = self
            .user_cards
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                let field = |name: &str| format!("userCards[{idx}].{name}");
                CreditCard {
                    card_type: card
                        .card_type
                        .clone()
                        .unwrap_or_else(|| format!("Card {}", idx + 1)),
                    balance: boundary.non_negative(&field("balance"), card.balance.as_ref()),
                    apr: boundary.non_negative(&field("interest"), card.interest.as_ref()),
                    credit_limit: boundary
                        .non_negative(&field("creditLimit"), card.credit_limit.as_ref()),
                    payment_behavior: card
                        .monthly_payment_type
                        .unwrap_or(PaymentBehavior::Unknown),
                    timeliness: card.payment_timely_status.unwrap_or(Timeliness::Unknown),
                    usage_status: card.card_use_status.clone(),
                }
            })
            .collect();

        HouseholdInputs {
            income: HouseholdIncomeProfile {
                user_annual_salary,
                spouse_annual_salary,
                streams,
            },
            life_events: LifeEventProfile {
                life_events,
                catastrophic_loss: self.catastrophic_loss.clone(),
                extended_family_care: self.extended_family_care.clone(),
            },
            cards,
            warnings: boundary.warnings,
        }
    }
}
