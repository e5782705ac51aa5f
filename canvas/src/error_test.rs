use super::*;
use crate::pages::PageSpecError;
use crate::transform::TransformError;

#[test]
fn page_spec_codes_are_distinct() {
    let codes = [
        PageSpecError::Empty.error_code(),
        PageSpecError::InvalidToken("x".into()).error_code(),
        PageSpecError::ZeroPage.error_code(),
        PageSpecError::ReversedRange { start: 3, end: 1 }.error_code(),
    ];
    for (i, a) in codes.iter().enumerate() {
        assert!(a.starts_with("E_"));
        for b in &codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert!(!PageSpecError::Empty.retryable());
}

#[test]
fn only_unlaid_display_is_retryable() {
    assert!(TransformError::DisplayNotLaidOut { width: 0.0, height: 0.0 }.retryable());
    assert!(!TransformError::EmptyCanvas { width: 0, height: 0 }.retryable());
    assert!(!TransformError::OutsideSurface { x: -1.0, y: 0.0 }.retryable());
}
