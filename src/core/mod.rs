mod amortization;
mod engine;
mod hardship;
mod income;
mod portfolio;
mod record;
mod tax;
mod types;

pub use amortization::{
    MAX_SIMULATION_MONTHS, MinimumPaymentPolicy, calculate_payment_schedule, project_card,
};
pub use engine::{
    HouseholdReport, IncomeAnalysis, NATIONAL_SPENDING, ReferenceTables, SpendingBenchmark,
    analyze_income, build_report, build_report_from_record,
};
pub use hardship::{
    CATASTROPHIC_LOSS, EXTENDED_FAMILY_CARE, Haircut, LifeEventImpactTable,
    compute_haircut_percentage, normalize_life_events,
};
pub use income::{HouseholdIncome, StreamContribution, aggregate_household_income};
pub use portfolio::{
    PaymentAmounts, PaymentBehaviorLabel, PaymentStatus, PaymentStatusLabel, PortfolioSummary,
    SentimentLabel, Utilization, UtilizationLabel, calculate_card_payment_amounts,
    calculate_card_payment_status, calculate_credit_card_utilization, sentiment_label,
};
pub use record::{HouseholdInputs, HouseholdRecord, InputWarning, parse_household_json};
pub use tax::{TaxBracket, TaxBracketTable, TaxTables, calculate_tax, effective_tax_rate};
pub use types::{
    CardProjection, CreditCard, Expiration, FilingStatus, HouseholdIncomeProfile,
    IncomeCategory, IncomeStream, LifeEventProfile, PaymentBehavior, PaymentPolicy,
    PaymentSchedule, PaymentSummary, ScheduleEntry, Timeliness,
};
