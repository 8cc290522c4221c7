//! Validation helpers for DTOs.

use validator::ValidationError;

/// Round time limits move in 15 second steps.
pub const TIME_LIMIT_STEP_SECONDS: u32 = 15;

/// Validates that a phone number is a complete `+1` number with an area code.
///
/// # Examples
///
/// ```ignore
/// validate_phone_number("+15551234567") // Ok
/// validate_phone_number("+11551234567") // Err - area code cannot start with 1
/// validate_phone_number("5551234567")   // Err - missing +1
/// ```
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let valid = phone.len() == 12
        && phone.starts_with("+1")
        && phone[2..].chars().all(|c| c.is_ascii_digit())
        && matches!(phone.as_bytes()[2], b'2'..=b'9');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number_format");
        err.message = Some("Invalid phone number. Be sure to include area code.".into());
        Err(err)
    }
}

/// Validates that `value` lies within `min..=max`.
pub fn validate_bounds(
    code: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        return Ok(());
    }

    let mut err = ValidationError::new(code);
    err.message = Some(format!("Must be between {min} and {max} (got {value})").into());
    Err(err)
}

/// Validates that a round time limit lands on a 15 second step.
pub fn validate_time_limit_step(seconds: u32) -> Result<(), ValidationError> {
    if seconds % TIME_LIMIT_STEP_SECONDS == 0 {
        return Ok(());
    }

    let mut err = ValidationError::new("time_limit_step");
    err.message = Some(
        format!("Time limit must be a multiple of {TIME_LIMIT_STEP_SECONDS} seconds (got {seconds})")
            .into(),
    );
    Err(err)
}
