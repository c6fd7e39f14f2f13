#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;
use reso_diagnostic::ErrorCode;
use reso_eval::Val;
use reso_ir::{BinaryOp, SyntaxBuilder, UnaryOp};

use crate::test_helpers::{call, codes, error_messages, lower, lower_ok, run_main};

/// `fn sign(x: i32) -> i32` as an if / else-if / else chain.
fn sign_fn(b: &mut SyntaxBuilder<'_>, with_else: bool) {
    let x = b.ident("x");
    let zero = b.int(0);
    let neg = b.binary(BinaryOp::Lt, x, zero);
    let one = b.int(1);
    let minus_one = b.unary(UnaryOp::Neg, one);
    let ret_neg = b.ret_value(minus_one);

    let x = b.ident("x");
    let zero = b.int(0);
    let is_zero = b.binary(BinaryOp::Eq, x, zero);
    let zero = b.int(0);
    let ret_zero = b.ret_value(zero);

    let one = b.int(1);
    let ret_pos = b.ret_value(one);
    let else_body = with_else.then(|| vec![ret_pos]);
    let chain = b.if_chain(vec![(neg, vec![ret_neg]), (is_zero, vec![ret_zero])], else_body);
    b.function("sign", &[("x", "i32")], "i32", vec![chain]);
}

#[test]
fn if_chain_selects_first_true_clause() {
    let module = lower_ok(|b| sign_fn(b, true));
    for (x, expected) in [(-5, -1), (0, 0), (7, 1)] {
        let out = call(&module, "sign", &[Val::from_i64(x, 32)])
            .unwrap()
            .unwrap();
        assert_eq!(out.as_signed(32).unwrap(), expected, "sign({x})");
    }
}

#[test]
fn if_chain_without_else_misses_a_return() {
    let out = lower(|b| sign_fn(b, false));
    assert_eq!(codes(&out), vec![ErrorCode::E2030]);
    assert_eq!(
        error_messages(&out),
        vec!["function `sign` must return a value of type `i32` on every path".to_owned()]
    );
}

/// `fn f(c: bool) -> i32 { if c { return 1 } [else { return 0 }] }`
fn guarded_return(b: &mut SyntaxBuilder<'_>, with_else: bool) {
    let c = b.ident("c");
    let one = b.int(1);
    let ret_one = b.ret_value(one);
    let stmt = if with_else {
        let zero = b.int(0);
        let ret_zero = b.ret_value(zero);
        b.if_else(c, vec![ret_one], vec![ret_zero])
    } else {
        b.if_then(c, vec![ret_one])
    };
    b.function("f", &[("c", "bool")], "i32", vec![stmt]);
}

#[test]
fn single_if_return_needs_else() {
    assert_eq!(
        codes(&lower(|b| guarded_return(b, false))),
        vec![ErrorCode::E2030]
    );
    let module = lower_ok(|b| guarded_return(b, true));
    let out = call(&module, "f", &[Val::bool(false)]).unwrap();
    assert_eq!(out, Some(Val::from_i64(0, 32)));
}

#[test]
fn while_loop_accumulates() {
    // var i = 0; var sum = 0; while i < 10 { i = i + 1; sum = sum + i } return sum
    let code = run_main(|b| {
        let zero = b.int(0);
        let i = b.var("i", Some("i32"), zero);
        let zero = b.int(0);
        let sum = b.var("sum", Some("i32"), zero);
        let iv = b.ident("i");
        let ten = b.int(10);
        let cond = b.binary(BinaryOp::Lt, iv, ten);
        let iv = b.ident("i");
        let one = b.int(1);
        let inc = b.binary(BinaryOp::Add, iv, one);
        let step = b.assign_to("i", inc);
        let sv = b.ident("sum");
        let iv = b.ident("i");
        let add = b.binary(BinaryOp::Add, sv, iv);
        let acc = b.assign_to("sum", add);
        let lp = b.while_loop(cond, vec![step, acc]);
        let sv = b.ident("sum");
        let ret = b.ret_value(sv);
        b.function("main", &[], "i32", vec![i, sum, lp, ret]);
    });
    assert_eq!(code, Ok(55));
}

#[test]
fn break_and_continue_target_the_innermost_loop() {
    // Sum the odd numbers below 10, stopping once i reaches 7.
    let code = run_main(|b| {
        let zero = b.int(0);
        let i = b.var("i", Some("i64"), zero);
        let zero = b.int(0);
        let sum = b.var("sum", Some("i64"), zero);
        let t = b.bool(true);

        let iv = b.ident("i");
        let one = b.int(1);
        let inc = b.binary(BinaryOp::Add, iv, one);
        let step = b.assign_to("i", inc);

        let iv = b.ident("i");
        let seven = b.int(7);
        let done = b.binary(BinaryOp::GtEq, iv, seven);
        let brk = b.brk();
        let stop = b.if_then(done, vec![brk]);

        let iv = b.ident("i");
        let two = b.int(2);
        let parity = b.binary(BinaryOp::Rem, iv, two);
        let zero = b.int(0);
        let even = b.binary(BinaryOp::Eq, parity, zero);
        let cont = b.cont();
        let skip = b.if_then(even, vec![cont]);

        let sv = b.ident("sum");
        let iv = b.ident("i");
        let add = b.binary(BinaryOp::Add, sv, iv);
        let acc = b.assign_to("sum", add);
        let lp = b.while_loop(t, vec![step, stop, skip, acc]);

        let sv = b.ident("sum");
        let conv = b.cast(sv, "i32");
        let ret = b.ret_value(conv);
        b.function("main", &[], "i32", vec![i, sum, lp, ret]);
    });
    // 1 + 3 + 5
    assert_eq!(code, Ok(9));
}

#[test]
fn loop_exits_outside_a_loop_are_rejected() {
    let out = lower(|b| {
        let brk = b.brk();
        let cont = b.cont();
        let block = b.block(vec![cont]);
        b.function("f", &[], "()", vec![brk, block]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2031, ErrorCode::E2031]);
}

#[test]
fn division_example_compiles_and_holds() {
    let code = run_main(|b| {
        let ten = b.int(10);
        let a = b.var("a", Some("i32"), ten);
        let five = b.int(5);
        let bv = b.var("b", Some("i32"), five);
        let (x, y) = (b.ident("a"), b.ident("b"));
        let q = b.binary(BinaryOp::Div, x, y);
        let q = b.var("q", None, q);
        let (x, y) = (b.ident("a"), b.ident("b"));
        let r = b.binary(BinaryOp::Rem, x, y);
        let r = b.var("r", None, r);
        let (qv, yv) = (b.ident("q"), b.ident("b"));
        let qb = b.binary(BinaryOp::Mul, qv, yv);
        let rv = b.ident("r");
        let total = b.binary(BinaryOp::Add, qb, rv);
        let ret = b.ret_value(total);
        b.function("main", &[], "i32", vec![a, bv, q, r, ret]);
    });
    assert_eq!(code, Ok(10));
}

// ── Scopes ─────────────────────────────────────────────────────

#[test]
fn inner_block_shadows_and_restores() {
    let code = run_main(|b| {
        let one = b.int(1);
        let outer = b.var("x", Some("i32"), one);
        let hundred = b.int(100);
        let inner = b.var("x", Some("i32"), hundred);
        let block = b.block(vec![inner]);
        let xv = b.ident("x");
        let ret = b.ret_value(xv);
        b.function("main", &[], "i32", vec![outer, block, ret]);
    });
    assert_eq!(code, Ok(1));
}

#[test]
fn names_do_not_outlive_their_block() {
    let out = lower(|b| {
        let one = b.int(1);
        let inner = b.var("y", None, one);
        let block = b.block(vec![inner]);
        let yv = b.ident("y");
        let use_y = b.expr_stmt(yv);
        b.function("f", &[], "()", vec![block, use_y]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2003]);
}

#[test]
fn redeclaration_in_one_frame_is_rejected() {
    let out = lower(|b| {
        let one = b.int(1);
        let first = b.var("x", None, one);
        let two = b.int(2);
        let second = b.var("x", None, two);
        b.function("f", &[("p", "i32")], "()", vec![first, second]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2006]);
    assert_eq!(
        error_messages(&out),
        vec!["variable `x` is already defined in this scope".to_owned()]
    );
}

#[test]
fn branch_bodies_get_their_own_frame() {
    let out = lower(|b| {
        let c = b.ident("c");
        let one = b.int(1);
        let then_var = b.var("t", None, one);
        let two = b.int(2);
        let else_var = b.var("t", None, two);
        let branch = b.if_else(c, vec![then_var], vec![else_var]);
        b.function("f", &[("c", "bool")], "()", vec![branch]);
    });
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn poisoned_declaration_suppresses_later_uses() {
    let out = lower(|b| {
        let missing = b.ident("missing");
        let x = b.var("x", None, missing);
        let xv = b.ident("x");
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, xv, one);
        let use_x = b.expr_stmt(sum);
        b.function("f", &[], "()", vec![x, use_x]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2003]);
}

// ── Declarations and assignment ────────────────────────────────

#[test]
fn untyped_null_declaration_is_rejected() {
    let out = lower(|b| {
        let null = b.null();
        let x = b.var("x", None, null);
        b.function("f", &[], "()", vec![x]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2027]);
}

#[test]
fn declared_type_binds_literal_and_checks_range() {
    let out = lower(|b| {
        let big = b.int(300);
        let x = b.var("x", Some("u8"), big);
        b.function("f", &[], "()", vec![x]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2026]);
    assert_eq!(
        error_messages(&out),
        vec!["integer literal `300` does not fit in `u8`".to_owned()]
    );
}

#[test]
fn declaration_type_mismatch_names_the_variable() {
    let out = lower(|b| {
        let t = b.bool(true);
        let x = b.var("x", Some("i32"), t);
        b.function("f", &[], "()", vec![x]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
}

#[test]
fn invalid_assignment_target() {
    let out = lower(|b| {
        let one = b.int(1);
        let two = b.int(2);
        let s = b.assign(one, two);
        b.function("f", &[], "()", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2005]);
}

#[test]
fn assignment_to_unknown_name() {
    let out = lower(|b| {
        let one = b.int(1);
        let s = b.assign_to("nope", one);
        b.function("f", &[], "()", vec![s]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2003]);
}

#[test]
fn parameters_are_mutable_locals() {
    let module = lower_ok(|b| {
        let nv = b.ident("n");
        let two = b.int(2);
        let doubled = b.binary(BinaryOp::Mul, nv, two);
        let set = b.assign_to("n", doubled);
        let nv = b.ident("n");
        let ret = b.ret_value(nv);
        b.function("f", &[("n", "u16")], "u16", vec![set, ret]);
    });
    assert_eq!(
        call(&module, "f", &[Val::Int(21)]).unwrap(),
        Some(Val::Int(42))
    );
}

#[test]
fn non_bool_condition_is_rejected() {
    let out = lower(|b| {
        let n = b.ident("n");
        let body = b.brk();
        let lp = b.while_loop(n, vec![body]);
        b.function("f", &[("n", "i32")], "()", vec![lp]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
}

// ── Return ─────────────────────────────────────────────────────

#[test]
fn bare_return_in_value_function_is_rejected() {
    let out = lower(|b| {
        let ret = b.ret(None);
        b.function("f", &[], "i64", vec![ret]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
}

#[test]
fn return_value_must_match_declared_type() {
    let out = lower(|b| {
        let t = b.bool(true);
        let ret = b.ret_value(t);
        b.function("f", &[], "u32", vec![ret]);
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
    assert_eq!(
        error_messages(&out),
        vec!["type mismatch in return value of `f`: expected `u32`, found `bool`".to_owned()]
    );
}

#[test]
fn unit_function_returns_implicitly() {
    let module = lower_ok(|b| {
        let one = b.int(1);
        let x = b.var("x", None, one);
        b.function("f", &[], "()", vec![x]);
    });
    assert_eq!(call(&module, "f", &[]).unwrap(), None);
}
