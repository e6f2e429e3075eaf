use std::borrow::Cow;

use validator::ValidationError;

/// Reject strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("must not be blank"));
        return Err(err);
    }
    Ok(())
}

pub(crate) fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}
