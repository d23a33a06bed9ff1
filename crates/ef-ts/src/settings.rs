//! User-facing reduction settings, resolved into a [`ReductionStrategy`].

use chrono::NaiveDateTime;
use ef_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{TsError, TsResult};
use crate::reduce::ReductionStrategy;

/// Block lengths accepted when [`ReductionSettings::standard_blocks`] is on.
pub const STANDARD_BLOCK_HOURS: [usize; 6] = [4, 6, 8, 12, 24, 48];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hours: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_factor: Option<Real>,
    /// Restrict `block_hours` to [`STANDARD_BLOCK_HOURS`].
    #[serde(default)]
    pub standard_blocks: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_strategy() -> String {
    "full".to_string()
}

impl Default for ReductionSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            strategy: default_strategy(),
            block_hours: None,
            range_start: None,
            range_end: None,
            sampling_factor: None,
            standard_blocks: false,
        }
    }
}

impl ReductionSettings {
    /// Map the settings onto a strategy. Disabled settings resolve to
    /// [`ReductionStrategy::Full`].
    pub fn resolve(&self) -> TsResult<ReductionStrategy> {
        if !self.enabled {
            return Ok(ReductionStrategy::Full);
        }
        let strategy = match self.strategy.trim().to_ascii_lowercase().as_str() {
            "" | "full" => ReductionStrategy::Full,
            "block_average" | "averaging" => ReductionStrategy::BlockAverage {
                block_len: self.block_hours.ok_or(TsError::MissingParameter {
                    strategy: "block_average",
                    parameter: "block_hours",
                })?,
            },
            "time_range" | "range" => ReductionStrategy::Range {
                start: self.range_start.ok_or(TsError::MissingParameter {
                    strategy: "time_range",
                    parameter: "range_start",
                })?,
                end: self.range_end.ok_or(TsError::MissingParameter {
                    strategy: "time_range",
                    parameter: "range_end",
                })?,
            },
            "sampling" | "sampling_24n" => ReductionStrategy::PeriodicSampling {
                factor: self.sampling_factor.ok_or(TsError::MissingParameter {
                    strategy: "sampling",
                    parameter: "sampling_factor",
                })?,
            },
            _ => {
                return Err(TsError::UnknownStrategy {
                    name: self.strategy.clone(),
                });
            }
        };
        if let ReductionStrategy::BlockAverage { block_len } = &strategy {
            if self.standard_blocks && !STANDARD_BLOCK_HOURS.contains(block_len) {
                return Err(TsError::InvalidParameter {
                    what: "block_hours",
                    value: block_len.to_string(),
                });
            }
        }
        strategy.validate()?;
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_full() {
        assert_eq!(
            ReductionSettings::default().resolve().unwrap(),
            ReductionStrategy::Full
        );
    }

    #[test]
    fn disabled_ignores_strategy() {
        let settings = ReductionSettings {
            enabled: false,
            strategy: "nonsense".into(),
            ..Default::default()
        };
        assert_eq!(settings.resolve().unwrap(), ReductionStrategy::Full);
    }

    #[test]
    fn aliases_and_case() {
        let settings = ReductionSettings {
            strategy: " Averaging ".into(),
            block_hours: Some(6),
            ..Default::default()
        };
        assert_eq!(
            settings.resolve().unwrap(),
            ReductionStrategy::BlockAverage { block_len: 6 }
        );
    }

    #[test]
    fn standard_blocks_restrict_block_length() {
        let mut settings = ReductionSettings {
            strategy: "block_average".into(),
            block_hours: Some(5),
            ..Default::default()
        };
        assert_eq!(
            settings.resolve().unwrap(),
            ReductionStrategy::BlockAverage { block_len: 5 }
        );

        settings.standard_blocks = true;
        let err = settings.resolve().unwrap_err();
        assert_eq!(
            err,
            TsError::InvalidParameter {
                what: "block_hours",
                value: "5".into()
            }
        );
        assert!(err.is_configuration());

        for hours in STANDARD_BLOCK_HOURS {
            settings.block_hours = Some(hours);
            assert!(settings.resolve().is_ok(), "{hours}");
        }
    }

    #[test]
    fn unknown_name_is_configuration_error() {
        let settings = ReductionSettings {
            strategy: "typical_days".into(),
            ..Default::default()
        };
        let err = settings.resolve().unwrap_err();
        assert!(matches!(err, TsError::UnknownStrategy { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_parameter_reported() {
        let settings = ReductionSettings {
            strategy: "time_range".into(),
            ..Default::default()
        };
        assert_eq!(
            settings.resolve().unwrap_err(),
            TsError::MissingParameter {
                strategy: "time_range",
                parameter: "range_start"
            }
        );
    }

    #[test]
    fn resolve_validates_parameters() {
        let settings = ReductionSettings {
            strategy: "sampling".into(),
            sampling_factor: Some(0.25),
            ..Default::default()
        };
        assert!(matches!(
            settings.resolve(),
            Err(TsError::UnsupportedSamplingFactor { .. })
        ));
    }

    #[test]
    fn omitted_keys_take_defaults() {
        let settings: ReductionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ReductionSettings::default());
    }
}
