//! Error handling foundation for deep-research.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error types in their own
//! error modules and returns them wrapped in a rootcause `Report`.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// `C` is the context type at the top of the report.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unavailable;

    impl std::fmt::Display for Unavailable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "unavailable")
        }
    }

    impl std::error::Error for Unavailable {}

    fn fails() -> Result<u32, Unavailable> {
        Err(Unavailable.into())
    }

    #[test]
    fn result_type_works() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }

    #[test]
    fn typed_context_converts_into_report() {
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }
}
