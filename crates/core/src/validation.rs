//! Entity validation.
//!
//! Entities declare their constraints with `#[derive(Validate)]`; this module
//! runs them and renders violations in the wording the public API has always
//! returned (`data.<field> should NOT be shorter than 1 characters`).

use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

/// Tagged result of validating one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub result: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
        }
    }

    /// Convert into a 400 [`CoreError::Http`] when validation failed.
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            ValidationOutcome { result: true, .. } => Ok(()),
            ValidationOutcome { error, .. } => Err(CoreError::validation(
                error.unwrap_or_else(|| "validation failed".into()),
            )),
        }
    }
}

/// Run the derived constraints of `entity`.
pub fn validate_entity<T: Validate>(entity: &T) -> ValidationOutcome {
    match entity.validate() {
        Ok(()) => ValidationOutcome::ok(),
        Err(errors) => ValidationOutcome::failed(format_errors(&errors)),
    }
}

/// Render all field violations, sorted by field name and joined with `", "`.
pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, Vec<ValidationError>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs.clone()))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errs)| errs.iter().map(move |err| format_error(field, err)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_error(field: &str, err: &ValidationError) -> String {
    let param_i64 = |name: &str| err.params.get(name).and_then(Value::as_i64);

    match err.code.as_ref() {
        "length" => {
            let actual = err
                .params
                .get("value")
                .and_then(Value::as_str)
                .map(|s| s.chars().count() as i64);
            match (param_i64("min"), param_i64("max"), actual) {
                (Some(min), _, Some(len)) if len < min => {
                    format!("data.{field} should NOT be shorter than {min} characters")
                }
                (_, Some(max), _) => {
                    format!("data.{field} should NOT be longer than {max} characters")
                }
                (Some(min), _, _) => {
                    format!("data.{field} should NOT be shorter than {min} characters")
                }
                _ => format!("data.{field} has an invalid length"),
            }
        }
        "email" => format!("data.{field} should match format \"email\""),
        "url" => format!("data.{field} should match format \"uri\""),
        "range" => {
            let actual = err.params.get("value").and_then(Value::as_f64);
            let min = err.params.get("min").and_then(Value::as_f64);
            let max = err.params.get("max").and_then(Value::as_f64);
            match (min, max, actual) {
                (Some(min), _, Some(value)) if value < min => {
                    format!("data.{field} should be >= {min}")
                }
                (_, Some(max), _) => format!("data.{field} should be <= {max}"),
                (Some(min), _, _) => format!("data.{field} should be >= {min}"),
                _ => format!("data.{field} is out of range"),
            }
        }
        "required" => format!("data should have required property '{field}'"),
        code => match &err.message {
            Some(message) => format!("data.{field} {message}"),
            None => format!("data.{field} failed {code}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 1))]
        name: String,
        #[validate(email)]
        email: String,
        #[validate(range(min = 0))]
        quantity: i64,
    }

    fn sample() -> Sample {
        Sample {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            quantity: 1,
        }
    }

    // -- formatting --

    #[test]
    fn valid_entity_passes() {
        assert_eq!(validate_entity(&sample()), ValidationOutcome::ok());
    }

    #[test]
    fn empty_string_reports_min_length() {
        let outcome = validate_entity(&Sample {
            name: String::new(),
            ..sample()
        });
        assert!(!outcome.result);
        assert_eq!(
            outcome.error.as_deref(),
            Some("data.name should NOT be shorter than 1 characters")
        );
    }

    #[test]
    fn malformed_email_reports_format() {
        let outcome = validate_entity(&Sample {
            email: "not-an-email".into(),
            ..sample()
        });
        assert_eq!(
            outcome.error.as_deref(),
            Some("data.email should match format \"email\"")
        );
    }

    #[test]
    fn multiple_violations_are_sorted_and_joined() {
        let outcome = validate_entity(&Sample {
            name: String::new(),
            email: "nope".into(),
            quantity: -1,
        });
        assert_eq!(
            outcome.error.as_deref(),
            Some(
                "data.email should match format \"email\", \
                 data.name should NOT be shorter than 1 characters, \
                 data.quantity should be >= 0"
            )
        );
    }

    // -- conversion --

    #[test]
    fn failed_outcome_becomes_http_400() {
        let err = ValidationOutcome::failed("bad").into_result().unwrap_err();
        assert_eq!(err, CoreError::validation("bad"));
    }
}
