//! Structural verifier.
//!
//! Checks the invariants the backend relies on:
//! - every block ends in exactly one terminator
//! - branch targets and operands refer to existing blocks and values
//! - phi nodes lead their block and have one incoming edge per predecessor
//! - returns match the function's return type
//! - calls pass the declared number of arguments

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{BlockId, Callee, FuncId, InstKind, IrType, Module, Terminator, ValueId, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("`{func}`: block {block:?} has no terminator")]
    MissingTerminator { func: String, block: BlockId },
    #[error("`{func}`: block {block:?} branches to missing block {target:?}")]
    BadTarget {
        func: String,
        block: BlockId,
        target: BlockId,
    },
    #[error("`{func}`: block {block:?} uses undefined value {value:?}")]
    BadValue {
        func: String,
        block: BlockId,
        value: ValueId,
    },
    #[error("`{func}`: phi in block {block:?} is not at the block start")]
    MisplacedPhi { func: String, block: BlockId },
    #[error("`{func}`: phi in block {block:?} has incoming {incoming:?}, predecessors are {preds:?}")]
    PhiPredecessors {
        func: String,
        block: BlockId,
        incoming: Vec<BlockId>,
        preds: Vec<BlockId>,
    },
    #[error("`{func}`: return in block {block:?} does not match return type")]
    ReturnMismatch { func: String, block: BlockId },
    #[error("`{func}`: call to `{callee}` passes {found} arguments, expected {expected}")]
    CallArity {
        func: String,
        callee: String,
        expected: usize,
        found: usize,
    },
}

/// Verify every defined function of `module`.
pub fn verify_module(module: &Module) -> Result<(), Vec<VerifyError>> {
    let errors: Vec<VerifyError> = (0..module.functions.len())
        .map(FuncId::from_index)
        .flat_map(|id| verify_function(module, id).err().unwrap_or_default())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Verify one function. Declarations trivially pass.
pub fn verify_function(module: &Module, id: FuncId) -> Result<(), Vec<VerifyError>> {
    let func = module.function(id);
    if func.is_declaration() {
        return Ok(());
    }
    let mut errors = Vec::new();
    let preds = func.predecessors();
    let block_count = func.blocks.len();
    let name = || func.name.clone();

    // Values defined by instructions; constants and params are always valid.
    let mut defined: FxHashSet<ValueId> = FxHashSet::default();
    for inst in func.insts() {
        if let Some(result) = inst.result {
            defined.insert(result);
        }
    }
    let valid = |v: ValueId| {
        func.values.get(v.index()).is_some_and(|data| {
            !matches!(data.kind, ValueKind::Inst(_)) || defined.contains(&v)
        })
    };

    for id in func.block_ids() {
        let block = func.block(id);
        let mut seen_non_phi = false;

        for inst in &block.insts {
            for operand in inst.kind.operands() {
                if !valid(operand) {
                    errors.push(VerifyError::BadValue {
                        func: name(),
                        block: id,
                        value: operand,
                    });
                }
            }
            match &inst.kind {
                InstKind::Phi { incoming, .. } => {
                    if seen_non_phi {
                        errors.push(VerifyError::MisplacedPhi {
                            func: name(),
                            block: id,
                        });
                    }
                    let mut from: Vec<BlockId> = incoming.iter().map(|(_, b)| *b).collect();
                    let mut expected = preds[id.index()].clone();
                    from.sort();
                    expected.sort();
                    if from != expected {
                        errors.push(VerifyError::PhiPredecessors {
                            func: name(),
                            block: id,
                            incoming: from,
                            preds: expected,
                        });
                    }
                }
                InstKind::Call { callee, args, .. } => {
                    let (callee_name, expected) = match callee {
                        Callee::Func(f) => {
                            let f = module.function(*f);
                            (f.name.clone(), f.params.len())
                        }
                        Callee::Extern(e) => {
                            let e = module.extern_decl(*e);
                            (e.name.clone(), e.params.len())
                        }
                    };
                    if expected != args.len() {
                        errors.push(VerifyError::CallArity {
                            func: name(),
                            callee: callee_name,
                            expected,
                            found: args.len(),
                        });
                    }
                    seen_non_phi = true;
                }
                _ => seen_non_phi = true,
            }
        }

        let Some(term) = &block.terminator else {
            errors.push(VerifyError::MissingTerminator {
                func: name(),
                block: id,
            });
            continue;
        };
        for target in term.successors() {
            if target.index() >= block_count {
                errors.push(VerifyError::BadTarget {
                    func: name(),
                    block: id,
                    target,
                });
            }
        }
        match term {
            Terminator::CondBr { cond, .. } if !valid(*cond) => {
                errors.push(VerifyError::BadValue {
                    func: name(),
                    block: id,
                    value: *cond,
                });
            }
            Terminator::Ret(value) => {
                let ok = match value {
                    None => func.ret == IrType::Void,
                    Some(v) => valid(*v) && func.value(*v).ty == func.ret,
                };
                if !ok {
                    errors.push(VerifyError::ReturnMismatch {
                        func: name(),
                        block: id,
                    });
                }
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests;
