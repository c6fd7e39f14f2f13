#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use reso_diagnostic::ErrorCode;
use reso_eval::{Interpreter, Val};
use reso_ir::{BinaryOp, UnaryOp};
use reso_llir::Module;

use crate::test_helpers::{call, codes, error_messages, function_text, lower, lower_ok};

/// `fn f(a: ty, b: ty) -> ret { return a op b }`
fn binary_fn(op: BinaryOp, ty: &str, ret: &str) -> Module {
    lower_ok(|b| {
        let l = b.ident("a");
        let r = b.ident("b");
        let e = b.binary(op, l, r);
        let s = b.ret_value(e);
        b.function("f", &[("a", ty), ("b", ty)], ret, vec![s]);
    })
}

fn f64_op(module: &Module, a: f64, b: f64) -> f64 {
    call(module, "f", &[Val::Float(a), Val::Float(b)])
        .unwrap()
        .unwrap()
        .as_float()
        .unwrap()
}

// ── Arithmetic ─────────────────────────────────────────────────

#[test]
fn signed_div_rem_mod() {
    let div = binary_fn(BinaryOp::Div, "i32", "i32");
    let rem = binary_fn(BinaryOp::Rem, "i32", "i32");
    let modulo = binary_fn(BinaryOp::Mod, "i32", "i32");

    assert_eq!(eval_i32(&div, "f", -7, 2), -3);
    assert_eq!(eval_i32(&rem, "f", -7, 2), -1);
    assert_eq!(eval_i32(&modulo, "f", -7, 2), 1);

    assert_eq!(eval_i32(&div, "f", 7, -2), -3);
    assert_eq!(eval_i32(&rem, "f", 7, -2), 1);
    assert_eq!(eval_i32(&modulo, "f", 7, -2), -1);

    assert_eq!(eval_i32(&modulo, "f", -7, -2), -1);
    assert_eq!(eval_i32(&modulo, "f", 6, -3), 0);
}

#[test]
fn unsigned_division_uses_unsigned_instructions() {
    let module = binary_fn(BinaryOp::Mod, "u8", "u8");
    let text = function_text(&module, "f");
    assert!(text.contains("urem i8"), "{text}");
    assert!(!text.contains("srem"), "{text}");
    assert!(!text.contains("select"), "{text}");

    let out = call(&module, "f", &[Val::Int(200), Val::Int(7)]).unwrap();
    assert_eq!(out, Some(Val::Int(4)));

    let div = binary_fn(BinaryOp::Div, "u8", "u8");
    assert!(function_text(&div, "f").contains("udiv i8"));
    assert_eq!(
        call(&div, "f", &[Val::Int(200), Val::Int(3)]).unwrap(),
        Some(Val::Int(66))
    );
}

#[test]
fn float_mod_follows_divisor_sign() {
    let module = binary_fn(BinaryOp::Mod, "f64", "f64");
    assert_eq!(f64_op(&module, -7.5, 2.0), 0.5);
    assert_eq!(f64_op(&module, 7.5, -2.0), -0.5);
    assert_eq!(f64_op(&module, 7.5, 2.0), 1.5);
}

#[test]
fn float_mod_keeps_zero_remainder_unadjusted() {
    let module = binary_fn(BinaryOp::Mod, "f64", "f64");
    let r = f64_op(&module, -4.0, 2.0);
    assert_eq!(r, 0.0);
    assert!(r.is_sign_negative());
    let r = f64_op(&module, 4.0, -2.0);
    assert_eq!(r, 0.0);
    assert!(r.is_sign_positive());
}

#[test]
fn float_arithmetic_uses_float_instructions() {
    let sub = binary_fn(BinaryOp::Sub, "f64", "f64");
    let mul = binary_fn(BinaryOp::Mul, "f64", "f64");
    let div = binary_fn(BinaryOp::Div, "f64", "f64");
    assert!(function_text(&sub, "f").contains("fsub double"));
    assert_eq!(f64_op(&sub, 1.5, 0.25), 1.25);
    assert_eq!(f64_op(&mul, 1.5, 4.0), 6.0);
    assert_eq!(f64_op(&div, 1.0, 4.0), 0.25);
}

#[test]
fn mixed_signedness_is_rejected_naming_both_types() {
    let out = lower(|b| {
        let ten = b.int(10);
        let five = b.int(5);
        let x = b.var("x", Some("i32"), ten);
        let y = b.var("y", Some("u32"), five);
        let l = b.ident("x");
        let r = b.ident("y");
        let sum = b.binary(BinaryOp::Add, l, r);
        let z = b.var("z", None, sum);
        b.function("f", &[], "()", vec![x, y, z]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2020]);
    assert_eq!(
        error_messages(&out),
        vec!["cannot perform `+` on `i32` and `u32`".to_owned()]
    );
}

#[test]
fn arithmetic_on_bool_is_non_numeric() {
    let out = lower(|b| {
        let l = b.ident("a");
        let r = b.ident("b");
        let e = b.binary(BinaryOp::Mul, l, r);
        let s = b.expr_stmt(e);
        b.function("f", &[("a", "bool"), ("b", "i32")], "()", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2021]);
    assert_eq!(
        error_messages(&out),
        vec!["cannot perform `*` on non-numeric types `bool`".to_owned()]
    );
}

#[test]
fn constant_zero_divisor_is_rejected() {
    let out = lower(|b| {
        let a = b.ident("a");
        let zero = b.int(0);
        let e = b.binary(BinaryOp::Rem, a, zero);
        let s = b.ret_value(e);
        b.function("f", &[("a", "i64")], "i64", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2033]);
}

#[test]
fn literal_operand_takes_sibling_type() {
    let module = lower_ok(|b| {
        let a = b.ident("a");
        let one = b.int(1);
        let e = b.binary(BinaryOp::Add, one, a);
        let s = b.ret_value(e);
        b.function("f", &[("a", "u8")], "u8", vec![s]);
    });
    let text = function_text(&module, "f");
    assert!(text.contains("add i8 1, %a."), "{text}");
    assert_eq!(
        call(&module, "f", &[Val::Int(255)]).unwrap(),
        Some(Val::Int(0))
    );
}

#[test]
fn literal_kinds_must_agree() {
    let out = lower(|b| {
        let one = b.int(1);
        let half = b.float(0.5);
        let a = b.ident("a");
        let mixed = b.binary(BinaryOp::Add, one, half);
        let e = b.binary(BinaryOp::Add, a, mixed);
        let s = b.ret_value(e);
        b.function("f", &[("a", "f64")], "f64", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2026]);
}

// ── Comparisons ────────────────────────────────────────────────

#[test]
fn ordering_uses_signedness_of_operands() {
    let signed = binary_fn(BinaryOp::Lt, "i8", "bool");
    let unsigned = binary_fn(BinaryOp::Lt, "u8", "bool");
    assert!(function_text(&signed, "f").contains("icmp slt"));
    assert!(function_text(&unsigned, "f").contains("icmp ult"));

    // 0xFF is -1 as i8 and 255 as u8.
    assert_eq!(
        call(&signed, "f", &[Val::Int(0xFF), Val::Int(1)]).unwrap(),
        Some(Val::bool(true))
    );
    assert_eq!(
        call(&unsigned, "f", &[Val::Int(0xFF), Val::Int(1)]).unwrap(),
        Some(Val::bool(false))
    );
}

#[test]
fn char_ordering_is_unsigned() {
    let module = binary_fn(BinaryOp::GtEq, "char", "bool");
    assert!(function_text(&module, "f").contains("icmp uge i32"));
}

#[test]
fn literal_comparisons_fold_to_constants() {
    for (op, l, r, expected) in [
        (BinaryOp::Lt, 1, 2, true),
        (BinaryOp::GtEq, 1, 2, false),
        (BinaryOp::Eq, 7, 7, true),
        (BinaryOp::NotEq, 7, 7, false),
    ] {
        let module = lower_ok(|b| {
            let (a, c) = (b.int(l), b.int(r));
            let e = b.binary(op, a, c);
            let s = b.ret_value(e);
            b.function("f", &[], "bool", vec![s]);
        });
        let text = function_text(&module, "f");
        assert!(!text.contains("cmp"), "{op:?}:\n{text}");
        assert_eq!(call(&module, "f", &[]).unwrap(), Some(Val::bool(expected)));
    }

    // -1.0 < 0.5 folds through the unary minus
    let module = lower_ok(|b| {
        let one = b.float(1.0);
        let neg = b.unary(UnaryOp::Neg, one);
        let half = b.float(0.5);
        let e = b.binary(BinaryOp::Lt, neg, half);
        let s = b.ret_value(e);
        b.function("f", &[], "bool", vec![s]);
    });
    assert!(!function_text(&module, "f").contains("cmp"));
    assert_eq!(call(&module, "f", &[]).unwrap(), Some(Val::bool(true)));
}

#[test]
fn folded_comparison_checks_literal_ranges() {
    let out = lower(|b| {
        let (big, one) = (b.int(3_000_000_000), b.int(1));
        let e = b.binary(BinaryOp::Gt, big, one);
        let s = b.ret_value(e);
        b.function("f", &[], "bool", vec![s]);
    });
    assert_eq!(
        error_messages(&out),
        vec!["integer literal `3000000000` does not fit in `i32`".to_owned()]
    );
}

#[test]
fn float_not_equal_is_unordered() {
    let module = binary_fn(BinaryOp::NotEq, "f64", "bool");
    assert!(function_text(&module, "f").contains("fcmp une"));
    assert_eq!(
        call(&module, "f", &[Val::Float(f64::NAN), Val::Float(f64::NAN)]).unwrap(),
        Some(Val::bool(true))
    );
}

#[test]
fn bool_supports_only_equality() {
    let eq = binary_fn(BinaryOp::Eq, "bool", "bool");
    assert!(function_text(&eq, "f").contains("icmp eq i1"));

    let out = lower(|b| {
        let l = b.ident("a");
        let r = b.ident("b");
        let e = b.binary(BinaryOp::Gt, l, r);
        let s = b.ret_value(e);
        b.function("f", &[("a", "bool"), ("b", "bool")], "bool", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2023]);
}

#[test]
fn distinct_aggregates_cannot_be_compared() {
    let out = lower(|b| {
        b.struct_def("A", &[("x", "i32")]);
        b.struct_def("B", &[("x", "i32")]);
        let l = b.ident("a");
        let r = b.ident("b");
        let e = b.binary(BinaryOp::Eq, l, r);
        let s = b.ret_value(e);
        b.function("f", &[("a", "A"), ("b", "B")], "bool", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2022]);
    assert_eq!(
        error_messages(&out),
        vec!["cannot compare `A` and `B` with `==`".to_owned()]
    );
}

#[test]
fn aggregate_compares_against_null() {
    let module = lower_ok(|b| {
        b.struct_def("A", &[("x", "i32")]);
        let a = b.ident("a");
        let null = b.null();
        let e = b.binary(BinaryOp::Eq, a, null);
        let s = b.ret_value(e);
        b.function("f", &[("a", "A")], "bool", vec![s]);
    });
    assert_eq!(
        call(&module, "f", &[Val::NULL]).unwrap(),
        Some(Val::bool(true))
    );
}

// ── Bitwise ────────────────────────────────────────────────────

#[test]
fn shift_amount_is_resized_to_value_width() {
    let module = lower_ok(|b| {
        let v = b.ident("v");
        let n = b.ident("n");
        let e = b.binary(BinaryOp::Shl, v, n);
        let s = b.ret_value(e);
        b.function("f", &[("v", "i64"), ("n", "u8")], "i64", vec![s]);
    });
    let text = function_text(&module, "f");
    assert!(text.contains("zext i8"), "{text}");
    let out = call(&module, "f", &[Val::Int(1), Val::Int(40)]).unwrap();
    assert_eq!(out, Some(Val::Int(1 << 40)));
}

#[test]
fn right_shift_is_arithmetic_for_signed_only() {
    let signed = binary_fn(BinaryOp::Shr, "i32", "i32");
    let unsigned = binary_fn(BinaryOp::Shr, "u32", "u32");
    assert!(function_text(&signed, "f").contains("ashr"));
    assert!(function_text(&unsigned, "f").contains("lshr"));
    assert_eq!(eval_i32(&signed, "f", -16, 2), -4);
    let out = call(&unsigned, "f", &[Val::Int(0xF000_0000), Val::Int(28)]).unwrap();
    assert_eq!(out, Some(Val::Int(0xF)));
}

#[test]
fn bitwise_operators_accept_bools() {
    let xor = binary_fn(BinaryOp::BitXor, "bool", "bool");
    assert_eq!(
        call(&xor, "f", &[Val::bool(true), Val::bool(true)]).unwrap(),
        Some(Val::bool(false))
    );
    let and = binary_fn(BinaryOp::BitAnd, "bool", "bool");
    assert_eq!(
        call(&and, "f", &[Val::bool(true), Val::bool(false)]).unwrap(),
        Some(Val::bool(false))
    );
}

#[test]
fn bitwise_on_floats_is_rejected() {
    let out = lower(|b| {
        let l = b.ident("a");
        let r = b.ident("b");
        let e = b.binary(BinaryOp::BitOr, l, r);
        let s = b.ret_value(e);
        b.function("f", &[("a", "f32"), ("b", "f32")], "f32", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2020]);
}

// ── Unary ──────────────────────────────────────────────────────

fn unary_fn(op: UnaryOp, ty: &str) -> Module {
    lower_ok(|b| {
        let a = b.ident("a");
        let e = b.unary(op, a);
        let s = b.ret_value(e);
        b.function("f", &[("a", ty)], ty, vec![s]);
    })
}

#[test]
fn unary_operators_evaluate() {
    let neg = unary_fn(UnaryOp::Neg, "i16");
    assert_eq!(
        call(&neg, "f", &[Val::from_i64(5, 16)]).unwrap(),
        Some(Val::from_i64(-5, 16))
    );
    let fneg = unary_fn(UnaryOp::Neg, "f64");
    assert!(function_text(&fneg, "f").contains("fneg"));
    let plus = unary_fn(UnaryOp::Plus, "u8");
    assert_eq!(call(&plus, "f", &[Val::Int(9)]).unwrap(), Some(Val::Int(9)));
    let not = unary_fn(UnaryOp::Not, "bool");
    assert_eq!(
        call(&not, "f", &[Val::bool(false)]).unwrap(),
        Some(Val::bool(true))
    );
    let bitnot = unary_fn(UnaryOp::BitNot, "u8");
    assert_eq!(
        call(&bitnot, "f", &[Val::Int(0x0F)]).unwrap(),
        Some(Val::Int(0xF0))
    );
}

#[test]
fn unary_operand_kinds_are_checked() {
    let out = lower(|b| {
        let a = b.ident("a");
        let not = b.unary(UnaryOp::Not, a);
        let s1 = b.expr_stmt(not);
        let c = b.ident("c");
        let bitnot = b.unary(UnaryOp::BitNot, c);
        let s2 = b.expr_stmt(bitnot);
        b.function("f", &[("a", "i32"), ("c", "bool")], "()", vec![s1, s2]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2024, ErrorCode::E2024]);
    assert_eq!(
        error_messages(&out),
        vec![
            "unary `not` requires a `bool` operand, got `i32`".to_owned(),
            "unary `~` requires an integer operand, got `bool`".to_owned(),
        ]
    );
}

// ── Short-circuit ──────────────────────────────────────────────

/// `fn side() -> bool { return true }` and a `main` computing
/// `lhs <op> side()`, returning 1 when true.
fn short_circuit_program(op: BinaryOp, lhs: bool) -> Module {
    lower_ok(|b| {
        let t = b.bool(true);
        let ret_t = b.ret_value(t);
        b.function("side", &[], "bool", vec![ret_t]);

        let l = b.bool(lhs);
        let call = b.call("side", &[]);
        let e = b.binary(op, l, call);
        let one = b.int(1);
        let ret_one = b.ret_value(one);
        let zero = b.int(0);
        let ret_zero = b.ret_value(zero);
        let branch = b.if_else(e, vec![ret_one], vec![ret_zero]);
        b.function("main", &[], "i32", vec![branch]);
    })
}

#[test]
fn and_or_skip_the_right_operand() {
    for (op, lhs, expected, calls) in [
        (BinaryOp::And, false, 0, 0),
        (BinaryOp::And, true, 1, 1),
        (BinaryOp::Or, true, 1, 0),
        (BinaryOp::Or, false, 1, 1),
    ] {
        let module = short_circuit_program(op, lhs);
        let mut interp = Interpreter::new(&module);
        assert_eq!(interp.run_main().unwrap(), expected, "{op:?} {lhs}");
        assert_eq!(interp.call_count("side"), calls, "{op:?} {lhs}");
    }
}

#[test]
fn short_circuit_merges_with_a_two_edge_phi() {
    let module = short_circuit_program(BinaryOp::And, true);
    let text = function_text(&module, "reso.main");
    assert!(
        text.contains("phi i1 [ false, %entry0 ], [ %side."),
        "{text}"
    );
    let module = short_circuit_program(BinaryOp::Or, true);
    let text = function_text(&module, "reso.main");
    assert!(text.contains("phi i1 [ true, %entry0 ]"), "{text}");
}

#[test]
fn non_bool_operand_of_and_is_rejected() {
    let out = lower(|b| {
        let a = b.ident("a");
        let t = b.bool(true);
        let e = b.binary(BinaryOp::And, a, t);
        let s = b.expr_stmt(e);
        b.function("f", &[("a", "i32")], "()", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
}

// ── Laws ───────────────────────────────────────────────────────

/// `(a div b) * b + (a rem b)`, `a mod b` and `a rem b` from one module.
fn law_module() -> Module {
    lower_ok(|b| {
        let a = b.ident("a");
        let d = b.ident("b");
        let q = b.binary(BinaryOp::Div, a, d);
        let d = b.ident("b");
        let qb = b.binary(BinaryOp::Mul, q, d);
        let a = b.ident("a");
        let d = b.ident("b");
        let r = b.binary(BinaryOp::Rem, a, d);
        let sum = b.binary(BinaryOp::Add, qb, r);
        let s = b.ret_value(sum);
        b.function("law", &[("a", "i32"), ("b", "i32")], "i32", vec![s]);

        for (name, op) in [("modulo", BinaryOp::Mod), ("remainder", BinaryOp::Rem)] {
            let a = b.ident("a");
            let d = b.ident("b");
            let e = b.binary(op, a, d);
            let s = b.ret_value(e);
            b.function(name, &[("a", "i32"), ("b", "i32")], "i32", vec![s]);
        }
    })
}

fn eval_i32(module: &Module, name: &str, a: i32, b: i32) -> i64 {
    let args = [Val::from_i64(a.into(), 32), Val::from_i64(b.into(), 32)];
    call(module, name, &args)
        .unwrap()
        .unwrap()
        .as_signed(32)
        .unwrap()
}

proptest! {
    #[test]
    fn division_law_holds(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        let module = law_module();
        prop_assert_eq!(eval_i32(&module, "law", a, b), i64::from(a));
    }

    #[test]
    fn mod_takes_divisor_sign(a in -10_000i32..10_000, b in (-100i32..100).prop_filter("non-zero", |b| *b != 0)) {
        let module = law_module();
        let m = eval_i32(&module, "modulo", a, b);
        let r = eval_i32(&module, "remainder", a, b);
        prop_assert!(m == 0 || (m < 0) == (b < 0));
        prop_assert!(r == 0 || (r < 0) == (a < 0));
        prop_assert!(m.abs() < i64::from(b).abs());
        if (a < 0) == (b < 0) {
            prop_assert_eq!(m, r);
        }
    }

    #[test]
    fn double_negations_cancel(x in any::<i32>()) {
        let module = lower_ok(|b| {
            let v = b.ident("x");
            let inner = b.unary(UnaryOp::BitNot, v);
            let outer = b.unary(UnaryOp::BitNot, inner);
            let s = b.ret_value(outer);
            b.function("f", &[("x", "i32")], "i32", vec![s]);
        });
        let out = call(&module, "f", &[Val::from_i64(x.into(), 32)]).unwrap().unwrap();
        prop_assert_eq!(out.as_signed(32).unwrap(), i64::from(x));
    }
}
