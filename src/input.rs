//! Boundary validation for numeric input
//!
//! Times arrive as text from whatever front end drives the controller. They
//! are checked here, before any state is touched, and failures name the field.

use std::fmt;

/// Fallback used when a direct-move duration cannot be interpreted
pub const DEFAULT_INTERP_TIME: f64 = 2.0;

/// Which input field failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    HoldTime,
    InterpTime,
    Duration,
    JointValue,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::HoldTime => "hold time",
            Field::InterpTime => "interpolation time",
            Field::Duration => "duration",
            Field::JointValue => "joint value",
        };
        f.write_str(name)
    }
}

/// A rejected input value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid {field}: {reason}")]
pub struct InputError {
    pub field: Field,
    pub reason: String,
}

impl InputError {
    fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a time in seconds: finite and not negative
pub fn check_seconds(field: Field, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::new(field, format!("{} is not a finite number", value)));
    }
    if value < 0.0 {
        return Err(InputError::new(field, format!("{} is negative", value)));
    }
    Ok(value)
}

/// Parse and validate a time in seconds from text
pub fn parse_seconds(field: Field, text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| InputError::new(field, format!("'{}' is not a number", trimmed)))?;
    check_seconds(field, value)
}

/// Validate a joint angle (finite; limits are not enforced)
pub fn check_joint_value(value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::new(Field::JointValue, format!("{} is not a finite number", value)))
    }
}

/// Interpret a direct-move duration, falling back to the default when it is
/// missing or unusable instead of refusing the move
pub fn duration_or_default(value: Option<f64>) -> f64 {
    match value.map(|v| check_seconds(Field::Duration, v)) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn_fallback(&e);
            DEFAULT_INTERP_TIME
        }
        None => DEFAULT_INTERP_TIME,
    }
}

/// Text variant of `duration_or_default`
pub fn parse_duration_or_default(text: &str) -> f64 {
    match parse_seconds(Field::Duration, text) {
        Ok(v) => v,
        Err(e) => {
            warn_fallback(&e);
            DEFAULT_INTERP_TIME
        }
    }
}

fn warn_fallback(error: &InputError) {
    tracing::warn!(
        error = %error,
        fallback = DEFAULT_INTERP_TIME,
        "Using default interpolation time"
    );
}
