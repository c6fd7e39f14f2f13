//! Diagnostic constructors for lowering.
//!
//! Every message is a single line naming the operation, the rule it broke
//! and the concrete types involved.

use reso_diagnostic::{Diagnostic, ErrorCode};
use reso_ir::Span;

// Operators

pub(crate) fn cannot_perform(span: Span, op: &str, left: &str, right: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2020)
        .with_message(format!("cannot perform `{op}` on `{left}` and `{right}`"))
        .with_label(span, "operand types must be identical")
}

pub(crate) fn non_numeric(span: Span, op: &str, left: &str, right: &str) -> Diagnostic {
    let types = if left == right {
        format!("`{left}`")
    } else {
        format!("`{left}` and `{right}`")
    };
    Diagnostic::error(ErrorCode::E2021)
        .with_message(format!("cannot perform `{op}` on non-numeric types {types}"))
        .with_label(span, "arithmetic requires numeric operands")
}

pub(crate) fn cannot_compare(span: Span, op: &str, left: &str, right: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2022)
        .with_message(format!("cannot compare `{left}` and `{right}` with `{op}`"))
        .with_label(span, "incomparable types")
}

pub(crate) fn ordering_unsupported(span: Span, op: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2023)
        .with_message(format!(
            "operator `{op}` is not supported for `{ty}`, which only supports `==` and `!=`"
        ))
        .with_label(span, "not ordered")
}

pub(crate) fn unary_operand(span: Span, op: &str, kind: &str, found: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2024)
        .with_message(format!("unary `{op}` requires {kind} operand, got `{found}`"))
        .with_label(span, format!("expected {kind} operand"))
}

pub(crate) fn invalid_conversion(span: Span, from: &str, to: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2025)
        .with_message(format!("cannot convert `{from}` to `{to}` with `as`"))
        .with_label(span, "unsupported conversion")
}

pub(crate) fn literal_out_of_range(span: Span, literal: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2026)
        .with_message(format!("{literal} does not fit in `{ty}`"))
        .with_label(span, format!("out of range for `{ty}`"))
}

pub(crate) fn literal_kinds_differ(span: Span, op: &str, left: &str, right: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2026)
        .with_message(format!("cannot bind {left} and {right} in `{op}`"))
        .with_label(span, "literal kinds differ")
        .with_note("add a type annotation or a conversion with `as`")
}

pub(crate) fn null_needs_reference(span: Span, context: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2027)
        .with_message(format!("`null` needs an aggregate or vector type in {context}"))
        .with_label(span, "type cannot be inferred from `null`")
}

pub(crate) fn const_div_by_zero(span: Span, op: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2033)
        .with_message(format!("attempt to compute `{op}` with a divisor of zero"))
        .with_label(span, "divisor is zero")
}

// Names and types

pub(crate) fn unknown_type(span: Span, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2002)
        .with_message(format!("unknown type `{name}`"))
        .with_label(span, "not a built-in or declared type")
}

pub(crate) fn already_defined(span: Span, what: &str, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2006)
        .with_message(format!("{what} `{name}` is already defined in this scope"))
        .with_label(span, "redefined here")
}

/// A program-level duplicate, pointing back at the definition that stays.
pub(crate) fn redefined(span: Span, first: Span, what: &str, name: &str) -> Diagnostic {
    already_defined(span, what, name).with_secondary_label(first, format!("first definition of `{name}`"))
}

pub(crate) fn unknown_field(span: Span, field: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2032)
        .with_message(format!("no field `{field}` on type `{ty}`"))
        .with_label(span, "unknown field")
}

pub(crate) fn missing_field(span: Span, field: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2032)
        .with_message(format!("missing field `{field}` in `{ty}` literal"))
        .with_label(span, format!("`{field}` not initialized"))
}

pub(crate) fn unknown_method(span: Span, method: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2032)
        .with_message(format!("no method `{method}` on type `{ty}`"))
        .with_label(span, "unknown method")
}

pub(crate) fn not_indexable(span: Span, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2032)
        .with_message(format!("cannot index into a value of type `{ty}`"))
        .with_label(span, "only `Vector<T>` supports indexing")
}

// Calls and statements

pub(crate) fn arg_count(span: Span, what: &str, name: &str, expected: usize, found: usize) -> Diagnostic {
    let plural = if expected == 1 { "" } else { "s" };
    Diagnostic::error(ErrorCode::E2004)
        .with_message(format!(
            "{what} `{name}` takes {expected} argument{plural} but {found} were supplied"
        ))
        .with_label(span, format!("expected {expected} argument{plural}"))
}

pub(crate) fn invalid_assign_target(span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2005)
        .with_message("invalid assignment target: expected a variable, field or vector element")
        .with_label(span, "cannot assign to this expression")
}

pub(crate) fn missing_return(span: Span, func: &str, ty: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2030)
        .with_message(format!(
            "function `{func}` must return a value of type `{ty}` on every path"
        ))
        .with_label(span, "control reaches the end of the body")
}

pub(crate) fn outside_loop(span: Span, keyword: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2031)
        .with_message(format!("`{keyword}` outside of a loop"))
        .with_label(span, format!("`{keyword}` is only valid inside `while`"))
}

pub(crate) fn unreachable_code(span: Span) -> Diagnostic {
    Diagnostic::warning(ErrorCode::W2001)
        .with_message("unreachable statement")
        .with_label(span, "follows an unconditional exit")
}
