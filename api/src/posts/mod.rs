pub mod comment;
pub mod create;
pub mod routes;

use crate::error::FieldErrors;

pub const MAX_CONTENT_LENGTH: usize = 5000;

/// Trims and checks a submitted `content` field. Problems are recorded in
/// `errors` under `field`.
pub fn clean_content(
    content: Option<String>,
    field: &'static str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let Some(content) = content else {
        errors.add(field, "This field is required.");
        return None;
    };

    let content = content.trim();
    if content.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }

    if content.chars().count() > MAX_CONTENT_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_CONTENT_LENGTH} characters."),
        );
        return None;
    }

    Some(content.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        let mut errors = FieldErrors::new();
        let content = clean_content(Some("  hi there \n".into()), "content", &mut errors);
        assert_eq!(content.as_deref(), Some("hi there"));
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_blank_and_oversized_content_are_rejected() {
        for (input, message) in [
            (None, "This field is required."),
            (Some("   ".to_string()), "This field may not be blank."),
            (
                Some("x".repeat(MAX_CONTENT_LENGTH + 1)),
                "Ensure this field has no more than 5000 characters.",
            ),
        ] {
            let mut errors = FieldErrors::new();
            assert_eq!(clean_content(input, "content", &mut errors), None);
            assert_eq!(errors.get("content"), Some(&[message.to_string()][..]));
        }
    }
}
