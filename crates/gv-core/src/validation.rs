//! Text rules shared by every post, reply, edit and message path.

use crate::error::{AppError, Result};

/// Upper bound on user-supplied text, in code points.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Checks `text` and returns the trimmed value to store.
///
/// The length bound applies to the text as typed, before trimming.
/// `what` names the field in the error message ("post", "reply", ...).
pub fn validate_text(text: &str, what: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{what} text is empty")));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::ValidationError(format!(
            "{what} must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_valid_text() {
        assert_eq!(validate_text("  hello  ", "post").unwrap(), "hello");
    }

    #[test]
    fn rejects_blank_text() {
        assert!(matches!(validate_text(" \n\t ", "post"), Err(AppError::ValidationError(_))));
        assert!(matches!(validate_text("", "reply"), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn bound_counts_code_points_not_bytes() {
        let exact = "あ".repeat(MAX_TEXT_LENGTH);
        assert!(validate_text(&exact, "post").is_ok());

        let over = "a".repeat(MAX_TEXT_LENGTH + 1);
        assert!(matches!(validate_text(&over, "post"), Err(AppError::ValidationError(_))));
    }
}
