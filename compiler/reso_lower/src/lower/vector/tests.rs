#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use reso_diagnostic::ErrorCode;
use reso_eval::{EvalError, Val};
use reso_ir::{BinaryOp, ExprId, SyntaxBuilder};
use reso_llir::{Callee, InstKind, Module};

use crate::test_helpers::{call, codes, error_messages, lower, lower_ok, lower_with, module_of, run_main};
use crate::{GcAllocator, LowerConfig, LowerOutput};

/// `fill(n)` builds `[0, 10, 20, ...]` of length `n`; `size_of`,
/// `capacity_of` and `nth` inspect a freshly filled vector.
fn fill_program(b: &mut SyntaxBuilder<'_>) {
    let new = b.vector_new("i64");
    let v = b.var("v", None, new);
    let zero = b.int(0);
    let i = b.var("i", Some("i64"), zero);
    let (iv, n) = (b.ident("i"), b.ident("n"));
    let cond = b.binary(BinaryOp::Lt, iv, n);
    let (vv, iv, ten) = (b.ident("v"), b.ident("i"), b.int(10));
    let scaled = b.binary(BinaryOp::Mul, iv, ten);
    let add = b.method_call(vv, "add", &[scaled]);
    let add = b.expr_stmt(add);
    let (iv, one) = (b.ident("i"), b.int(1));
    let inc = b.binary(BinaryOp::Add, iv, one);
    let step = b.assign_to("i", inc);
    let lp = b.while_loop(cond, vec![add, step]);
    let vv = b.ident("v");
    let ret = b.ret_value(vv);
    b.function("fill", &[("n", "i64")], "Vector<i64>", vec![v, i, lp, ret]);

    for (name, method) in [("size_of", "size"), ("capacity_of", "capacity")] {
        let n = b.ident("n");
        let filled = b.call("fill", &[n]);
        let query = b.method_call(filled, method, &[]);
        let ret = b.ret_value(query);
        b.function(name, &[("n", "i64")], "usize", vec![ret]);
    }

    let n = b.ident("n");
    let filled = b.call("fill", &[n]);
    let k = b.ident("k");
    let elem = b.index(filled, k);
    let ret = b.ret_value(elem);
    b.function("nth", &[("n", "i64"), ("k", "i64")], "i64", vec![ret]);
}

fn query(module: &Module, name: &str, args: &[i64]) -> Result<u64, EvalError> {
    let args: Vec<Val> = args.iter().map(|&a| Val::from_i64(a, 64)).collect();
    call(module, name, &args)?.unwrap().as_int()
}

/// Names of the allocator externs `func` calls, in emission order.
fn allocations(module: &Module, func: &str) -> Vec<String> {
    let id = module.function_by_name(func).unwrap();
    module
        .function(id)
        .insts()
        .filter_map(|inst| match &inst.kind {
            InstKind::Call {
                callee: Callee::Extern(ext),
                ..
            } => Some(module.extern_decl(*ext).name.clone()),
            _ => None,
        })
        .filter(|name| name.starts_with("GC_"))
        .collect()
}

/// `fn f() { var v = Vector<T>() }`
fn construct(b: &mut SyntaxBuilder<'_>, elem: &str) {
    let new = b.vector_new(elem);
    let v = b.var("v", None, new);
    b.function("f", &[], "()", vec![v]);
}

/// `removed`, `size_after` and `nth_after` fill `n` elements, insert `v`
/// at `i`, remove at `i` again and report what came back.
fn insert_remove_program(b: &mut SyntaxBuilder<'_>) {
    fill_program(b);
    let params = [("n", "i64"), ("i", "i64"), ("v", "i64"), ("k", "i64")];
    for (name, ret_ty) in [("removed", "i64"), ("size_after", "usize"), ("nth_after", "i64")] {
        let n = b.ident("n");
        let filled = b.call("fill", &[n]);
        let w = b.var("w", None, filled);
        let (wv, i, v) = (b.ident("w"), b.ident("i"), b.ident("v"));
        let ins = b.method_call(wv, "insert", &[i, v]);
        let ins = b.expr_stmt(ins);
        let (wv, i) = (b.ident("w"), b.ident("i"));
        let removed = b.method_call(wv, "remove", &[i]);
        let r = b.var("r", None, removed);
        let result = match name {
            "removed" => b.ident("r"),
            "size_after" => {
                let wv = b.ident("w");
                b.method_call(wv, "size", &[])
            }
            _ => {
                let (wv, k) = (b.ident("w"), b.ident("k"));
                b.index(wv, k)
            }
        };
        let ret = b.ret_value(result);
        b.function(name, &params, ret_ty, vec![w, ins, r, ret]);
    }
}

// ── Growth ─────────────────────────────────────────────────────

#[test]
fn capacity_doubles_from_the_initial_capacity() {
    let module = lower_ok(fill_program);
    assert_eq!(query(&module, "capacity_of", &[0]), Ok(4));
    assert_eq!(query(&module, "capacity_of", &[4]), Ok(4));
    assert_eq!(query(&module, "capacity_of", &[5]), Ok(8));
    assert_eq!(query(&module, "capacity_of", &[17]), Ok(32));
}

#[test]
fn zero_initial_capacity_grows_from_one() {
    let config = LowerConfig {
        vector_initial_capacity: 0,
        ..LowerConfig::default()
    };
    let module = module_of(lower_with(&config, fill_program));
    assert_eq!(query(&module, "capacity_of", &[0]), Ok(0));
    assert_eq!(query(&module, "capacity_of", &[1]), Ok(1));
    assert_eq!(query(&module, "capacity_of", &[2]), Ok(2));
    assert_eq!(query(&module, "capacity_of", &[3]), Ok(4));
    assert_eq!(query(&module, "size_of", &[3]), Ok(3));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn filled_vectors_hold_every_element(n in 0i64..40) {
        let module = lower_ok(fill_program);
        prop_assert_eq!(query(&module, "size_of", &[n]), Ok(n as u64));
        let cap = query(&module, "capacity_of", &[n]).unwrap();
        prop_assert!(cap >= n as u64);
        for k in 0..n {
            prop_assert_eq!(query(&module, "nth", &[n, k]), Ok((k * 10) as u64));
        }
    }
}

// ── Bounds ─────────────────────────────────────────────────────

#[test]
fn reading_past_the_end_fails_the_bounds_check() {
    let module = lower_ok(fill_program);
    assert_eq!(
        query(&module, "nth", &[3, 3]),
        Err(EvalError::BoundsCheck { index: 3, size: 3 })
    );
    assert_eq!(
        query(&module, "nth", &[0, 0]),
        Err(EvalError::BoundsCheck { index: 0, size: 0 })
    );
}

#[test]
fn negative_index_wraps_and_fails() {
    let module = lower_ok(fill_program);
    assert_eq!(
        query(&module, "nth", &[3, -1]),
        Err(EvalError::BoundsCheck {
            index: u64::MAX,
            size: 3
        })
    );
}

/// `fn f(at: usize) -> usize { var v = Vector<i32>(); v.insert(at, 1); return v.size() }`
fn insert_at(b: &mut SyntaxBuilder<'_>) {
    let new = b.vector_new("i32");
    let v = b.var("v", None, new);
    let (vv, at) = (b.ident("v"), b.ident("at"));
    let one = b.int(1);
    let ins = b.method_call(vv, "insert", &[at, one]);
    let ins = b.expr_stmt(ins);
    let vv = b.ident("v");
    let size = b.method_call(vv, "size", &[]);
    let ret = b.ret_value(size);
    b.function("f", &[("at", "usize")], "usize", vec![v, ins, ret]);
}

#[test]
fn insert_accepts_the_end_but_not_beyond() {
    let module = lower_ok(insert_at);
    assert_eq!(call(&module, "f", &[Val::Int(0)]).unwrap(), Some(Val::Int(1)));
    assert_eq!(
        call(&module, "f", &[Val::Int(1)]),
        Err(EvalError::BoundsCheck { index: 1, size: 0 })
    );
}

// ── Element access ─────────────────────────────────────────────

#[test]
fn get_set_and_index_sugar_agree() {
    // v = [1, 2]; v.set(0, 7); v[1] = 9; return v.get(0) + v[1]
    let code = run_main(|b| {
        let new = b.vector_new("i32");
        let v = b.var("v", None, new);
        let mut body = vec![v];
        for value in [1, 2] {
            let (vv, x) = (b.ident("v"), b.int(value));
            let add = b.method_call(vv, "add", &[x]);
            body.push(b.expr_stmt(add));
        }
        let (vv, zero, seven) = (b.ident("v"), b.int(0), b.int(7));
        let set = b.method_call(vv, "set", &[zero, seven]);
        body.push(b.expr_stmt(set));
        let (vv, one) = (b.ident("v"), b.int(1));
        let slot = b.index(vv, one);
        let nine = b.int(9);
        body.push(b.assign(slot, nine));
        let (vv, zero) = (b.ident("v"), b.int(0));
        let first = b.method_call(vv, "get", &[zero]);
        let (vv, one) = (b.ident("v"), b.int(1));
        let second = b.index(vv, one);
        let sum = b.binary(BinaryOp::Add, first, second);
        body.push(b.ret_value(sum));
        b.function("main", &[], "i32", body);
    });
    assert_eq!(code, Ok(16));
}

#[test]
fn insert_and_remove_shift_the_tail() {
    // v = [1, 2, 3]; v.insert(1, 10) -> [1, 10, 2, 3]
    // r = v.remove(0) -> [10, 2, 3]; v.insert(v.size(), 4) -> [10, 2, 3, 4]
    // r + v[0] * 100 + v[3] * 10 + v[2] + size * 1000
    let code = run_main(|b| {
        let new = b.vector_new("i32");
        let v = b.var("v", None, new);
        let mut body = vec![v];
        for value in [1, 2, 3] {
            let (vv, x) = (b.ident("v"), b.int(value));
            let add = b.method_call(vv, "add", &[x]);
            body.push(b.expr_stmt(add));
        }
        let (vv, one, ten) = (b.ident("v"), b.int(1), b.int(10));
        let ins = b.method_call(vv, "insert", &[one, ten]);
        body.push(b.expr_stmt(ins));
        let (vv, zero) = (b.ident("v"), b.int(0));
        let removed = b.method_call(vv, "remove", &[zero]);
        body.push(b.var("r", None, removed));
        let (vv, vs) = (b.ident("v"), b.ident("v"));
        let end = b.method_call(vs, "size", &[]);
        let four = b.int(4);
        let ins = b.method_call(vv, "insert", &[end, four]);
        body.push(b.expr_stmt(ins));

        let (vv, zero, hundred) = (b.ident("v"), b.int(0), b.int(100));
        let first = b.index(vv, zero);
        let first = b.binary(BinaryOp::Mul, first, hundred);
        let (vv, three, ten) = (b.ident("v"), b.int(3), b.int(10));
        let last = b.index(vv, three);
        let last = b.binary(BinaryOp::Mul, last, ten);
        let (vv, two) = (b.ident("v"), b.int(2));
        let third = b.index(vv, two);
        let vv = b.ident("v");
        let size = b.method_call(vv, "size", &[]);
        let size = b.cast(size, "i32");
        let thousand = b.int(1000);
        let size = b.binary(BinaryOp::Mul, size, thousand);

        let r = b.ident("r");
        let total = b.binary(BinaryOp::Add, r, first);
        let total = b.binary(BinaryOp::Add, total, last);
        let total = b.binary(BinaryOp::Add, total, third);
        let total = b.binary(BinaryOp::Add, total, size);
        body.push(b.ret_value(total));
        b.function("main", &[], "i32", body);
    });
    assert_eq!(code, Ok(1 + 1000 + 40 + 3 + 4000));
}

#[test]
fn remove_from_an_empty_vector_fails() {
    let code = run_main(|b| {
        let new = b.vector_new("i32");
        let v = b.var("v", None, new);
        let (vv, zero) = (b.ident("v"), b.int(0));
        let removed = b.method_call(vv, "remove", &[zero]);
        let ret = b.ret_value(removed);
        b.function("main", &[], "i32", vec![v, ret]);
    });
    assert_eq!(code, Err(EvalError::BoundsCheck { index: 0, size: 0 }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn remove_undoes_insert(
        (n, i) in (0i64..12).prop_flat_map(|n| (Just(n), 0..=n)),
        v in any::<i64>(),
    ) {
        let module = lower_ok(insert_remove_program);
        prop_assert_eq!(query(&module, "removed", &[n, i, v, 0]), Ok(v as u64));
        prop_assert_eq!(query(&module, "size_after", &[n, i, v, 0]), Ok(n as u64));
        for k in 0..n {
            prop_assert_eq!(query(&module, "nth_after", &[n, i, v, k]), Ok((k * 10) as u64));
        }
    }
}

// ── Allocation ─────────────────────────────────────────────────

#[test]
fn scalar_buffers_are_allocated_atomically() {
    let module = lower_ok(|b| construct(b, "i64"));
    assert_eq!(
        allocations(&module, "f"),
        vec![GcAllocator::GENERAL.to_owned(), GcAllocator::ATOMIC.to_owned()]
    );
}

#[test]
fn reference_buffers_are_scanned() {
    let module = lower_ok(|b| {
        b.struct_def("Node", &[("value", "i32")]);
        construct(b, "Node");
    });
    assert_eq!(
        allocations(&module, "f"),
        vec![GcAllocator::GENERAL.to_owned(), GcAllocator::GENERAL.to_owned()]
    );
}

#[test]
fn zero_capacity_defers_the_buffer() {
    let config = LowerConfig {
        vector_initial_capacity: 0,
        ..LowerConfig::default()
    };
    let module = module_of(lower_with(&config, |b| construct(b, "i64")));
    assert_eq!(allocations(&module, "f"), vec![GcAllocator::GENERAL.to_owned()]);
}

// ── Diagnostics ────────────────────────────────────────────────

/// `fn f(v: Vector<i64>) { <stmt built by make> }`
fn with_vector(make: impl FnOnce(&mut SyntaxBuilder<'_>) -> ExprId) -> LowerOutput {
    lower(|b| {
        let expr = make(b);
        let stmt = b.expr_stmt(expr);
        b.function("f", &[("v", "Vector<i64>")], "()", vec![stmt]);
    })
}

#[test]
fn unknown_vector_method_is_reported() {
    let out = with_vector(|b| {
        let (vv, one) = (b.ident("v"), b.int(1));
        b.method_call(vv, "push", &[one])
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2032]);
    assert_eq!(
        error_messages(&out),
        vec!["no method `push` on type `Vector<i64>`".to_owned()]
    );
}

#[test]
fn vector_method_arity_is_checked() {
    let out = with_vector(|b| {
        let vv = b.ident("v");
        b.method_call(vv, "get", &[])
    });
    assert_eq!(
        error_messages(&out),
        vec!["method `get` takes 1 argument but 0 were supplied".to_owned()]
    );
}

#[test]
fn elements_must_match_the_vector_type() {
    let out = with_vector(|b| {
        let (vv, t) = (b.ident("v"), b.bool(true));
        b.method_call(vv, "add", &[t])
    });
    assert_eq!(
        error_messages(&out),
        vec!["type mismatch in argument 1 of `add`: expected `i64`, found `bool`".to_owned()]
    );
}

#[test]
fn index_must_be_an_integer() {
    let out = with_vector(|b| {
        let (vv, f) = (b.ident("v"), b.float(1.0));
        b.index(vv, f)
    });
    assert_eq!(codes(&out), vec![ErrorCode::E2001]);
}

#[test]
fn only_vectors_are_indexable() {
    let out = lower(|b| {
        let (x, zero) = (b.ident("x"), b.int(0));
        let elem = b.index(x, zero);
        let stmt = b.expr_stmt(elem);
        b.function("f", &[("x", "i32")], "()", vec![stmt]);
    });
    assert_eq!(
        error_messages(&out),
        vec!["cannot index into a value of type `i32`".to_owned()]
    );
}

#[test]
fn unknown_element_type_is_reported() {
    let out = lower(|b| construct(b, "Missing"));
    assert_eq!(codes(&out), vec![ErrorCode::E2002]);
}
