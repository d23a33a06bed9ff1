//! Document-level validation.
//!
//! Only problems that make the whole document unusable are reported here.
//! Row-level problems (empty or duplicate labels, unknown bus references,
//! bad factors) are the compiler's business and reject single rows.

use crate::schema::{CompileOptions, ModelSpec, TimeIndexDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing value: {field} in {context}")]
    MissingValue { field: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_spec(spec: &ModelSpec) -> Result<(), ValidationError> {
    if spec.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: spec.version,
        });
    }

    validate_time_index(&spec.settings.time_index)?;
    validate_options(&spec.settings.options)?;

    for name in spec.timeseries.names() {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingValue {
                field: "column name".to_string(),
                context: "timeseries".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_time_index(def: &TimeIndexDef) -> Result<(), ValidationError> {
    match def {
        TimeIndexDef::Regular {
            periods,
            freq_minutes,
            ..
        } => {
            if *periods == 0 {
                return Err(invalid("time_index.periods", periods, "must be positive"));
            }
            if *freq_minutes == 0 {
                return Err(invalid(
                    "time_index.freq_minutes",
                    freq_minutes,
                    "must be positive",
                ));
            }
        }
        TimeIndexDef::Explicit { timestamps } => {
            if timestamps.is_empty() {
                return Err(ValidationError::MissingValue {
                    field: "timestamps".to_string(),
                    context: "time_index".to_string(),
                });
            }
            if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
                return Err(invalid(
                    "time_index.timestamps",
                    timestamps[i + 1],
                    "must be strictly increasing",
                ));
            }
        }
    }
    Ok(())
}

fn validate_options(options: &CompileOptions) -> Result<(), ValidationError> {
    let fallback = options.invest_max_fallback;
    if !fallback.is_finite() || fallback < 0.0 {
        return Err(invalid(
            "options.invest_max_fallback",
            fallback,
            "must be finite and non-negative",
        ));
    }
    let buffer = options.sink_capacity_buffer;
    if !buffer.is_finite() || buffer < 1.0 {
        return Err(invalid(
            "options.sink_capacity_buffer",
            buffer,
            "must be finite and at least 1",
        ));
    }
    if options.list_delimiter == options.factor_delimiter {
        return Err(invalid(
            "options.factor_delimiter",
            options.factor_delimiter,
            "must differ from list_delimiter",
        ));
    }
    if options.factor_delimiter == ',' || options.factor_delimiter == '.' {
        return Err(invalid(
            "options.factor_delimiter",
            options.factor_delimiter,
            "collides with decimal separators",
        ));
    }
    Ok(())
}

fn invalid(field: &str, value: impl std::fmt::Display, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BusDef, EndpointDef};

    #[test]
    fn empty_document_is_valid() {
        assert!(validate_spec(&ModelSpec::new("empty")).is_ok());
    }

    #[test]
    fn future_version_rejected() {
        let mut spec = ModelSpec::new("v");
        spec.version = crate::LATEST_VERSION + 1;
        assert!(matches!(
            validate_spec(&spec),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn blank_row_label_is_left_to_the_compiler() {
        let mut spec = ModelSpec::new("m");
        spec.buses.push(BusDef::new("el"));
        spec.sinks.push(EndpointDef::new("  ", "el"));
        assert!(validate_spec(&spec).is_ok());
    }

    #[test]
    fn blank_column_name_rejected() {
        let mut spec = ModelSpec::new("m");
        spec.timeseries.insert(" ", vec![1.0]);
        assert!(matches!(
            validate_spec(&spec),
            Err(ValidationError::MissingValue { .. })
        ));
    }

    #[test]
    fn zero_periods_rejected() {
        let mut spec = ModelSpec::new("m");
        if let TimeIndexDef::Regular { periods, .. } = &mut spec.settings.time_index {
            *periods = 0;
        }
        assert!(matches!(
            validate_spec(&spec),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn buffer_below_one_rejected() {
        let mut spec = ModelSpec::new("m");
        spec.settings.options.sink_capacity_buffer = 0.5;
        assert!(validate_spec(&spec).is_err());
    }

    #[test]
    fn clashing_delimiters_rejected() {
        let mut spec = ModelSpec::new("m");
        spec.settings.options.factor_delimiter = '|';
        assert!(validate_spec(&spec).is_err());
        spec.settings.options.factor_delimiter = ',';
        assert!(validate_spec(&spec).is_err());
    }
}
