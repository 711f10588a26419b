//! Typed evaluation of raw signature text.

use crate::param::ParamValue;

/// Converts `raw` to `T`, or returns `default` when `raw` is missing, blank
/// or not a valid `T`.
///
/// Strings are the exception to the blank rule: an explicitly empty string
/// value is still a value.
#[must_use]
pub fn eval<T: ParamValue>(raw: Option<&str>, default: T) -> T {
    match raw {
        Some(raw) if !raw.trim().is_empty() || default_is_text::<T>() => {
            T::parse(raw).unwrap_or(default)
        }
        _ => default,
    }
}

fn default_is_text<T: ParamValue>() -> bool {
    std::any::TypeId::of::<T>() == std::any::TypeId::of::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_parses_valid_text() {
        assert_eq!(eval(Some("3"), 0i32), 3);
        assert_eq!(eval(Some(" 1.5"), 0.0f64), 1.5);
        assert!(eval(Some("on"), false));
    }

    #[test]
    fn test_eval_defaults_on_missing_blank_or_invalid() {
        assert_eq!(eval(None, 4u32), 4);
        assert_eq!(eval(Some(""), 4u32), 4);
        assert_eq!(eval(Some("four"), 4u32), 4);
    }

    #[test]
    fn test_eval_keeps_empty_string() {
        assert_eq!(eval(Some(""), String::from("fallback")), "");
        assert_eq!(eval(None, String::from("fallback")), "fallback");
    }
}
