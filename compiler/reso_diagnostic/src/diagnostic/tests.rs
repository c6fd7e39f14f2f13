use pretty_assertions::assert_eq;

use super::*;

#[test]
fn primary_span_skips_secondary_labels() {
    let diag = Diagnostic::error(ErrorCode::E2006)
        .with_message("function `f` is already defined in this scope")
        .with_secondary_label(Span::new(0, 1), "first definition of `f`")
        .with_label(Span::new(4, 9), "redefined here");

    assert!(diag.is_error());
    assert_eq!(diag.labels.len(), 2);
    assert_eq!(diag.primary_span(), Some(Span::new(4, 9)));
}

#[test]
fn display_format() {
    let diag = unknown_identifier(Span::new(10, 11), "x");
    assert_eq!(
        diag.to_string(),
        "error [E2003]: `x` is not defined\n  --> 10..11: not found in this scope"
    );
}

#[test]
fn display_lists_secondary_labels_and_notes() {
    let diag = Diagnostic::error(ErrorCode::E2026)
        .with_message("cannot bind integer literal and float literal in `+`")
        .with_label(Span::new(4, 5), "literal kinds differ")
        .with_secondary_label(Span::new(0, 1), "other operand")
        .with_note("add a type annotation");
    assert_eq!(
        diag.to_string(),
        "error [E2026]: cannot bind integer literal and float literal in `+`\n  \
         --> 4..5: literal kinds differ\n      0..1: other operand\n  = note: add a type annotation"
    );
}

#[test]
fn warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::W2001).with_message("unreachable statement");
    assert!(!diag.is_error());
    assert_eq!(diag.primary_span(), None);
    assert_eq!(diag.to_string(), "warning [W2001]: unreachable statement");
}

#[test]
fn type_mismatch_names_both_types() {
    let diag = type_mismatch(Span::new(1, 2), "bool", "i32", "if condition");
    assert_eq!(diag.code, ErrorCode::E2001);
    assert_eq!(
        diag.message,
        "type mismatch in if condition: expected `bool`, found `i32`"
    );
}
