use chrono::{Months, NaiveDate};

use super::types::{
    CardProjection, CreditCard, PaymentPolicy, PaymentSchedule, PaymentSummary, ScheduleEntry,
};

/// Fifty years. Policies whose payment never outruns interest stop here.
pub const MAX_SIMULATION_MONTHS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumPaymentPolicy {
    pub required_principal_percentage: f64,
    pub floor: f64,
}

impl Default for MinimumPaymentPolicy {
    fn default() -> Self {
        Self {
            required_principal_percentage: 1.0,
            floor: 25.0,
        }
    }
}

impl MinimumPaymentPolicy {
    /// Interest for the month plus the required principal share, never below
    /// the floor and never above what is owed.
    pub fn minimum_payment_due(&self, balance: f64, apr: f64) -> f64 {
        if !balance.is_finite() || !apr.is_finite() {
            return f64::NAN;
        }
        if balance <= 0.0 {
            return 0.0;
        }
        let interest = balance * monthly_rate(apr);
        let required = interest + balance * (self.required_principal_percentage / 100.0);
        required.max(self.floor).min(balance + interest)
    }

    pub fn payment_policy(&self, balance: f64, apr: f64) -> PaymentPolicy {
        PaymentPolicy {
            principal: balance,
            apr,
            minimum_payment: self.floor,
            additional_payment: 0.0,
            required_principal_percentage: self.required_principal_percentage,
        }
    }
}

fn monthly_rate(apr: f64) -> f64 {
    apr / 100.0 / 12.0
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn debt_free_date(as_of: NaiveDate, months: u32) -> Option<NaiveDate> {
    as_of.checked_add_months(Months::new(months))
}

pub fn format_debt_free_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

fn policy_is_finite(policy: &PaymentPolicy) -> bool {
    [
        policy.principal,
        policy.apr,
        policy.minimum_payment,
        policy.additional_payment,
        policy.required_principal_percentage,
    ]
    .iter()
    .all(|v| v.is_finite())
}

/// No schedule can be projected from unknown amounts: totals are NaN and there
/// is no debt-free date.
fn indeterminate_schedule() -> PaymentSchedule {
    PaymentSchedule {
        entries: Vec::new(),
        summary: PaymentSummary {
            total_interest_paid: f64::NAN,
            total_principal_paid: f64::NAN,
            payoff_months: 0,
            years_to_payoff: f64::NAN,
            monthly_payment: f64::NAN,
            debt_free_date: None,
            debt_free_date_label: String::new(),
            capped: false,
            indeterminate: true,
        },
    }
}

pub fn calculate_payment_schedule(policy: &PaymentPolicy, as_of: NaiveDate) -> PaymentSchedule {
    if !policy_is_finite(policy) {
        return indeterminate_schedule();
    }

    let rate = monthly_rate(policy.apr);
    let mut balance = policy.principal;
    let mut month = 0u32;
    let mut total_interest = 0.0;
    let mut total_principal = 0.0;
    let mut monthly_payment = 0.0;
    let mut entries = Vec::new();

    while balance > 0.0 && month < MAX_SIMULATION_MONTHS {
        month += 1;
        let starting_balance = balance;
        let interest = balance * rate;
        let required_principal = balance * (policy.required_principal_percentage / 100.0);
        let required_minimum_payment = (interest + required_principal).max(policy.minimum_payment);

        let owed = balance + interest;
        let mut payment = required_minimum_payment + policy.additional_payment;
        let principal;
        if payment >= owed {
            // Final month: settle exactly so float residue cannot add a month.
            payment = owed;
            principal = balance;
            balance = 0.0;
        } else {
            principal = payment - interest;
            balance -= principal;
        }

        total_interest += interest;
        total_principal += principal;
        monthly_payment = payment;

        entries.push(ScheduleEntry {
            month,
            starting_balance,
            interest,
            principal,
            payment,
            required_minimum_payment,
            ending_balance: balance,
            cumulative_principal: total_principal,
            cumulative_interest: total_interest,
        });
    }

    let capped = balance > 0.0;
    let date = debt_free_date(as_of, month);
    PaymentSchedule {
        entries,
        summary: PaymentSummary {
            total_interest_paid: round_cents(total_interest),
            total_principal_paid: round_cents(total_principal),
            payoff_months: month,
            years_to_payoff: round_cents(f64::from(month) / 12.0),
            monthly_payment: round_cents(monthly_payment),
            debt_free_date: date,
            debt_free_date_label: format_debt_free_date(date),
            capped,
            indeterminate: false,
        },
    }
}

/// Minimum-payment-only projection for one card.
pub fn project_card(
    card: &CreditCard,
    policy: &MinimumPaymentPolicy,
    as_of: NaiveDate,
) -> CardProjection {
    let schedule = calculate_payment_schedule(&policy.payment_policy(card.balance, card.apr), as_of);
    let summary = schedule.summary;
    let utilization = if card.credit_limit > 0.0 {
        Some(card.balance / card.credit_limit * 100.0)
    } else {
        None
    };

    CardProjection {
        card_type: card.card_type.clone(),
        balance: card.balance,
        apr: card.apr,
        credit_limit: card.credit_limit,
        utilization,
        payment_behavior: card.payment_behavior,
        timeliness: card.timeliness,
        usage_status: card.usage_status.clone(),
        minimum_payment_due: round_cents(policy.minimum_payment_due(card.balance, card.apr)),
        payoff_months: summary.payoff_months,
        years_to_payoff: summary.years_to_payoff,
        total_interest_paid: summary.total_interest_paid,
        debt_free_date: summary.debt_free_date,
        debt_free_date_label: summary.debt_free_date_label,
        capped: summary.capped,
        indeterminate: summary.indeterminate,
    }
}
