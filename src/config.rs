use std::path::PathBuf;

use crate::core::{MinimumPaymentPolicy, ReferenceTables};
use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub tax_table_path: Option<PathBuf>,
    pub life_event_table_path: Option<PathBuf>,
    pub minimum_payment: MinimumPaymentPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tax_table_path: None,
            life_event_table_path: None,
            minimum_payment: MinimumPaymentPolicy::default(),
        }
    }
}

impl Settings {
    /// Reads `PAYOFF_*` variables, honouring a `.env` file when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match var("PAYOFF_PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "PAYOFF_PORT",
                        expected: "a port between 1 and 65535",
                        value: raw,
                    });
                }
            },
            None => defaults.port,
        };

        let floor = match var("PAYOFF_MIN_PAYMENT_FLOOR") {
            Some(raw) => parse_non_negative("PAYOFF_MIN_PAYMENT_FLOOR", raw)?,
            None => defaults.minimum_payment.floor,
        };
        let required_principal_percentage = match var("PAYOFF_REQUIRED_PRINCIPAL_PCT") {
            Some(raw) => {
                let pct = parse_non_negative("PAYOFF_REQUIRED_PRINCIPAL_PCT", raw.clone())?;
                if pct > 100.0 {
                    return Err(ConfigError::InvalidValue {
                        name: "PAYOFF_REQUIRED_PRINCIPAL_PCT",
                        expected: "a percentage between 0 and 100",
                        value: raw,
                    });
                }
                pct
            }
            None => defaults.minimum_payment.required_principal_percentage,
        };

        Ok(Self {
            port,
            tax_table_path: var("PAYOFF_TAX_TABLE").map(PathBuf::from),
            life_event_table_path: var("PAYOFF_LIFE_EVENT_TABLE").map(PathBuf::from),
            minimum_payment: MinimumPaymentPolicy {
                required_principal_percentage,
                floor,
            },
        })
    }

    pub fn load_tables(&self) -> Result<ReferenceTables, ConfigError> {
        Ok(ReferenceTables::load(
            self.tax_table_path.as_deref(),
            self.life_event_table_path.as_deref(),
        )?)
    }
}

fn parse_non_negative(name: &'static str, raw: String) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "a non-negative number",
            value: raw,
        }),
    }
}
