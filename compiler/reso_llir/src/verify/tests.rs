#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use pretty_assertions::assert_eq;

use crate::{verify_function, verify_module, IrBuilder, IrType, Module, VerifyError};

#[test]
fn declarations_pass() {
    let mut module = Module::new("m", 64);
    let func = module.declare_function("f", vec![IrType::I32], IrType::I32);
    assert_eq!(verify_function(&module, func), Ok(()));
    assert_eq!(verify_module(&module), Ok(()));
}

#[test]
fn missing_terminator_is_reported() {
    let mut module = Module::new("m", 64);
    let func = module.declare_function("f", vec![], IrType::Void);
    let mut b = IrBuilder::new(&mut module, func);
    let entry = b.append_block("entry");
    b.position_at_end(entry);

    let errors = verify_function(&module, func).unwrap_err();
    assert_eq!(
        errors,
        vec![VerifyError::MissingTerminator {
            func: "f".to_owned(),
            block: entry,
        }]
    );
}

#[test]
fn return_type_must_match() {
    let mut module = Module::new("m", 64);
    let func = module.declare_function("f", vec![], IrType::I32);
    let mut b = IrBuilder::new(&mut module, func);
    let entry = b.append_block("entry");
    b.position_at_end(entry);
    b.ret_void();

    let errors = verify_function(&module, func).unwrap_err();
    assert!(matches!(errors[0], VerifyError::ReturnMismatch { .. }));
}

#[test]
fn phi_needs_edge_per_predecessor() {
    let mut module = Module::new("m", 64);
    let func = module.declare_function("f", vec![IrType::I1], IrType::I32);
    let mut b = IrBuilder::new(&mut module, func);
    let entry = b.append_block("entry");
    let left = b.append_block("left");
    let merge = b.append_block("merge");
    b.position_at_end(entry);
    let cond = b.param(0);
    b.cond_br(cond, left, merge);
    b.position_at_end(left);
    b.br(merge);
    b.position_at_end(merge);
    let one = b.const_i32(1);
    let phi = b.phi_from_incoming(IrType::I32, &[(one, left)], "v");
    b.ret(phi);

    let errors = verify_module(&module).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        VerifyError::PhiPredecessors { incoming, preds, .. }
            if incoming == &vec![left] && preds == &vec![entry, left]
    ));
}

#[test]
fn error_messages_name_function() {
    let err = VerifyError::CallArity {
        func: "main".to_owned(),
        callee: "g".to_owned(),
        expected: 2,
        found: 1,
    };
    assert_eq!(
        err.to_string(),
        "`main`: call to `g` passes 1 arguments, expected 2"
    );
}
