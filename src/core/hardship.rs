use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::LifeEventProfile;
use crate::error::TableError;

const DEFAULT_LIFE_EVENT_TABLE_JSON: &str = include_str!("../../data/life_event_impacts.json");

pub const CATASTROPHIC_LOSS: &str = "Catastrophic loss";
pub const EXTENDED_FAMILY_CARE: &str = "Financially supporting extended family";

#[derive(Debug, Clone, PartialEq)]
pub struct LifeEventImpactTable {
    impacts: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLifeEventTable {
    life_event_impact: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Haircut {
    pub haircut_percentage: f64,
    pub life_events: Vec<String>,
}

impl LifeEventImpactTable {
    pub fn new(impacts: HashMap<String, f64>) -> Result<Self, TableError> {
        if let Some((tag, value)) = impacts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TableError::InvalidImpact {
                tag: tag.clone(),
                value: *value,
            });
        }
        Ok(Self { impacts })
    }

    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let raw: RawLifeEventTable = serde_json::from_str(json)?;
        Self::new(raw.life_event_impact)
    }

    pub fn embedded() -> Self {
        Self::from_json(DEFAULT_LIFE_EVENT_TABLE_JSON).expect("embedded life-event table is valid")
    }

    /// Unmapped tags have no impact.
    pub fn impact(&self, tag: &str) -> f64 {
        self.impacts.get(tag).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.impacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }
}

impl Default for LifeEventImpactTable {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Splits a comma-separated event list into trimmed, non-empty tags.
pub fn normalize_life_events<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .flat_map(|chunk| chunk.split(','))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag_is_yes(flag: Option<&str>) -> bool {
    flag.is_some_and(|f| f.trim().eq_ignore_ascii_case("yes"))
}

pub fn compute_haircut_percentage(
    profile: &LifeEventProfile,
    table: &LifeEventImpactTable,
) -> Haircut {
    let mut life_events = profile.life_events.clone();
    let mut haircut_percentage: f64 = life_events.iter().map(|tag| table.impact(tag)).sum();

    if flag_is_yes(profile.catastrophic_loss.as_deref()) {
        haircut_percentage += table.impact(CATASTROPHIC_LOSS);
        life_events.push(CATASTROPHIC_LOSS.to_string());
    }
    if flag_is_yes(profile.extended_family_care.as_deref()) {
        haircut_percentage += table.impact(EXTENDED_FAMILY_CARE);
        life_events.push(EXTENDED_FAMILY_CARE.to_string());
    }

    Haircut {
        haircut_percentage,
        life_events,
    }
}

/// `amount * (1 + haircut / 100)`.
pub fn apply_haircut(amount: f64, haircut_percentage: f64) -> f64 {
    amount * (1.0 + haircut_percentage / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn table() -> LifeEventImpactTable {
        LifeEventImpactTable::new(HashMap::from([
            ("Divorce".to_string(), -15.0),
            ("Job loss".to_string(), -25.0),
            ("Marriage".to_string(), 5.0),
            (CATASTROPHIC_LOSS.to_string(), -20.0),
            (EXTENDED_FAMILY_CARE.to_string(), -10.0),
        ]))
        .expect("valid table")
    }

    #[test]
    fn normalizes_comma_separated_string() {
        assert_eq!(
            normalize_life_events([" Divorce, Job loss ,, ,Marriage"]),
            vec!["Divorce", "Job loss", "Marriage"]
        );
    }

    #[test]
    fn normalizes_array_entries() {
        assert_eq!(
            normalize_life_events(["  Divorce ", "", "Job loss"]),
            vec!["Divorce", "Job loss"]
        );
    }

    #[test]
    fn sums_known_tags_and_ignores_unknown() {
        let profile = LifeEventProfile {
            life_events: vec![
                "Divorce".to_string(),
                "Won the lottery".to_string(),
                "Marriage".to_string(),
            ],
            ..LifeEventProfile::default()
        };
        let haircut = compute_haircut_percentage(&profile, &table());
        assert_approx(haircut.haircut_percentage, -10.0);
        assert_eq!(haircut.life_events.len(), 3);
    }

    #[test]
    fn yes_flags_add_impact_and_tag_case_insensitively() {
        let profile = LifeEventProfile {
            life_events: vec!["Job loss".to_string()],
            catastrophic_loss: Some("YES".to_string()),
            extended_family_care: Some(" yes ".to_string()),
        };
        let haircut = compute_haircut_percentage(&profile, &table());
        assert_approx(haircut.haircut_percentage, -55.0);
        assert_eq!(
            haircut.life_events,
            vec!["Job loss", CATASTROPHIC_LOSS, EXTENDED_FAMILY_CARE]
        );
    }

    #[test]
    fn no_flags_leave_events_untouched() {
        let profile = LifeEventProfile {
            life_events: Vec::new(),
            catastrophic_loss: Some("No".to_string()),
            extended_family_care: None,
        };
        let haircut = compute_haircut_percentage(&profile, &table());
        assert_approx(haircut.haircut_percentage, 0.0);
        assert!(haircut.life_events.is_empty());
    }

    #[test]
    fn apply_haircut_scales_by_percentage() {
        assert_approx(apply_haircut(1_000.0, -25.0), 750.0);
        assert_approx(apply_haircut(1_000.0, 5.0), 1_050.0);
    }

    #[test]
    fn embedded_table_maps_flag_events() {
        let table = LifeEventImpactTable::embedded();
        assert!(table.impact(CATASTROPHIC_LOSS) < 0.0);
        assert!(table.impact(EXTENDED_FAMILY_CARE) < 0.0);
        assert_approx(table.impact("Not a real event"), 0.0);
    }

    #[test]
    fn rejects_non_finite_impacts() {
        let err = LifeEventImpactTable::new(HashMap::from([("Divorce".to_string(), f64::NAN)]))
            .expect_err("must reject NaN impact");
        assert!(err.to_string().contains("Divorce"));
    }

    proptest! {
        #[test]
        fn prop_haircut_is_idempotent(
            events in proptest::collection::vec("[A-Za-z ]{0,12}", 0..6),
            catastrophic in proptest::option::of("[Yy][Ee][Ss]|[Nn][Oo]"),
        ) {
            let profile = LifeEventProfile {
                life_events: events,
                catastrophic_loss: catastrophic,
                extended_family_care: None,
            };
            let table = table();
            prop_assert_eq!(
                compute_haircut_percentage(&profile, &table),
                compute_haircut_percentage(&profile, &table)
            );
        }
    }
}
