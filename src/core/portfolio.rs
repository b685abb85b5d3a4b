use serde::Serialize;

use super::types::{CardProjection, CreditCard, PaymentBehavior, Timeliness};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum UtilizationLabel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Undefined,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PaymentStatusLabel {
    Good,
    Concerning,
    Dire,
    Undefined,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PaymentBehaviorLabel {
    #[serde(rename = "In great shape")]
    GreatShape,
    #[serde(rename = "In good shape")]
    GoodShape,
    #[serde(rename = "Kicking the can down the road")]
    KickingTheCan,
    #[serde(rename = "Have a serious situation brewing")]
    SeriousSituation,
    Undefined,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum SentimentLabel {
    Stable,
    Caution,
    Vulnerable,
}

/// First rule whose inclusive upper bound covers the value wins. An even 50%
/// still reads as Moderate.
pub const UTILIZATION_RULES: &[(f64, UtilizationLabel)] = &[
    (30.0, UtilizationLabel::Low),
    (50.0, UtilizationLabel::Moderate),
    (72.99, UtilizationLabel::High),
    (f64::INFINITY, UtilizationLabel::VeryHigh),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentStatusRule {
    /// Matches when the on-time share is strictly below this percentage...
    pub on_time_below: f64,
    /// ...or when at least this many cards are 61+ days late or charged off.
    pub severe_cards_at_least: usize,
    pub label: PaymentStatusLabel,
}

/// Most severe first; no match means `Good`.
pub const PAYMENT_STATUS_RULES: &[PaymentStatusRule] = &[
    PaymentStatusRule {
        on_time_below: 50.0,
        severe_cards_at_least: 2,
        label: PaymentStatusLabel::Dire,
    },
    PaymentStatusRule {
        on_time_below: 65.0,
        severe_cards_at_least: 1,
        label: PaymentStatusLabel::Concerning,
    },
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BehaviorShare {
    Minimum,
    NotPaid,
    ChargedOff,
}

/// First rule whose share meets its lower bound wins; no match means `GreatShape`.
pub const PAYMENT_BEHAVIOR_RULES: &[(BehaviorShare, f64, PaymentBehaviorLabel)] = &[
    (
        BehaviorShare::NotPaid,
        9.99,
        PaymentBehaviorLabel::SeriousSituation,
    ),
    (
        BehaviorShare::ChargedOff,
        1.0,
        PaymentBehaviorLabel::SeriousSituation,
    ),
    (
        BehaviorShare::Minimum,
        67.0,
        PaymentBehaviorLabel::KickingTheCan,
    ),
    (BehaviorShare::Minimum, 35.0, PaymentBehaviorLabel::GoodShape),
];

/// (utilization below, label); both also require the minimum payment to fit
/// inside disposable income.
pub const SENTIMENT_RULES: &[(f64, SentimentLabel)] = &[
    (30.0, SentimentLabel::Stable),
    (60.0, SentimentLabel::Caution),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub utilization: f64,
    pub label: UtilizationLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub on_time_percentage: f64,
    pub label: PaymentStatusLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAmounts {
    pub min_payment_percentage: f64,
    pub more_than_min_payment_percentage: f64,
    pub not_being_paid_percentage: f64,
    pub charged_off_percentage: f64,
    pub label: PaymentBehaviorLabel,
}

impl PaymentAmounts {
    fn share(&self, share: BehaviorShare) -> f64 {
        match share {
            BehaviorShare::Minimum => self.min_payment_percentage,
            BehaviorShare::NotPaid => self.not_being_paid_percentage,
            BehaviorShare::ChargedOff => self.charged_off_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_balance: f64,
    pub total_credit_limit: f64,
    pub total_minimum_payment: f64,
    pub total_interest: f64,
    pub utilization: Utilization,
    pub payment_status: PaymentStatus,
    pub payment_amounts: PaymentAmounts,
}

pub fn classify_utilization(utilization: f64) -> UtilizationLabel {
    if utilization.is_nan() {
        return UtilizationLabel::Undefined;
    }
    UTILIZATION_RULES
        .iter()
        .find(|(upper, _)| utilization <= *upper)
        .map(|(_, label)| *label)
        .unwrap_or(UtilizationLabel::VeryHigh)
}

pub fn calculate_credit_card_utilization(cards: &[CreditCard]) -> Utilization {
    let total_balance: f64 = cards.iter().map(|c| c.balance).sum();
    let total_limit: f64 = cards.iter().map(|c| c.credit_limit).sum();

    if total_limit.is_nan() || total_limit <= 0.0 {
        return Utilization {
            utilization: 0.0,
            label: UtilizationLabel::Undefined,
        };
    }

    let utilization = total_balance / total_limit * 100.0;
    Utilization {
        utilization,
        label: classify_utilization(utilization),
    }
}

pub fn calculate_card_payment_status(cards: &[CreditCard]) -> PaymentStatus {
    if cards.is_empty() {
        return PaymentStatus {
            on_time_percentage: 0.0,
            label: PaymentStatusLabel::Undefined,
        };
    }

    let on_time = cards
        .iter()
        .filter(|c| c.timeliness == Timeliness::OnTime)
        .count();
    let severe = cards.iter().filter(|c| c.timeliness.is_severe()).count();
    let on_time_percentage = on_time as f64 / cards.len() as f64 * 100.0;

    let label = PAYMENT_STATUS_RULES
        .iter()
        .find(|rule| {
            on_time_percentage < rule.on_time_below || severe >= rule.severe_cards_at_least
        })
        .map(|rule| rule.label)
        .unwrap_or(PaymentStatusLabel::Good);

    PaymentStatus {
        on_time_percentage,
        label,
    }
}

pub fn calculate_card_payment_amounts(cards: &[CreditCard]) -> PaymentAmounts {
    let total_balance: f64 = cards.iter().map(|c| c.balance).sum();
    let balance_share = |behavior: PaymentBehavior| -> f64 {
        let balance: f64 = cards
            .iter()
            .filter(|c| c.payment_behavior == behavior)
            .map(|c| c.balance)
            .sum();
        balance / total_balance * 100.0
    };

    if total_balance.is_nan() || total_balance <= 0.0 {
        return PaymentAmounts {
            min_payment_percentage: 0.0,
            more_than_min_payment_percentage: 0.0,
            not_being_paid_percentage: 0.0,
            charged_off_percentage: 0.0,
            label: PaymentBehaviorLabel::Undefined,
        };
    }

    let mut amounts = PaymentAmounts {
        min_payment_percentage: balance_share(PaymentBehavior::Minimum),
        more_than_min_payment_percentage: balance_share(PaymentBehavior::MoreThanMinimum),
        not_being_paid_percentage: balance_share(PaymentBehavior::NotPaid),
        charged_off_percentage: balance_share(PaymentBehavior::ChargedOff),
        label: PaymentBehaviorLabel::GreatShape,
    };
    amounts.label = PAYMENT_BEHAVIOR_RULES
        .iter()
        .find(|(share, lower, _)| amounts.share(*share) >= *lower)
        .map(|(_, _, label)| *label)
        .unwrap_or(PaymentBehaviorLabel::GreatShape);
    amounts
}

pub fn sentiment_label(utilization: f64, minimum_payment: f64, disposable: f64) -> SentimentLabel {
    if minimum_payment.is_nan() || disposable.is_nan() || minimum_payment >= disposable {
        return SentimentLabel::Vulnerable;
    }
    SENTIMENT_RULES
        .iter()
        .find(|(below, _)| utilization < *below)
        .map(|(_, label)| *label)
        .unwrap_or(SentimentLabel::Vulnerable)
}

pub fn summarize_portfolio(cards: &[CreditCard], projections: &[CardProjection]) -> PortfolioSummary {
    PortfolioSummary {
        total_balance: cards.iter().map(|c| c.balance).sum(),
        total_credit_limit: cards.iter().map(|c| c.credit_limit).sum(),
        total_minimum_payment: projections.iter().map(|p| p.minimum_payment_due).sum(),
        total_interest: projections.iter().map(|p| p.total_interest_paid).sum(),
        utilization: calculate_credit_card_utilization(cards),
        payment_status: calculate_card_payment_status(cards),
        payment_amounts: calculate_card_payment_amounts(cards),
    }
}
