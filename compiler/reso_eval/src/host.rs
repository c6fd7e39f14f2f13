//! Host implementations of the runtime symbols lowered code calls.

use crate::memory::Memory;
use crate::{EvalError, EvalResult, Val};

fn arg(name: &str, args: &[Val], index: usize) -> EvalResult<Val> {
    args.get(index).copied().ok_or_else(|| EvalError::ArgCount {
        func: name.to_owned(),
        expected: index + 1,
        found: args.len(),
    })
}

/// Run the extern `name`. Returns `None` for void externs.
pub(crate) fn call_extern(memory: &mut Memory, name: &str, args: &[Val]) -> EvalResult<Option<Val>> {
    tracing::debug!(name, ?args, "extern call");
    match name {
        "GC_malloc" | "GC_malloc_atomic" => {
            let size = arg(name, args, 0)?.as_int()?;
            memory.allocate(size).map(|addr| Some(Val::Ptr(addr)))
        }
        "reso_rt_bounds_error" => Err(EvalError::BoundsCheck {
            index: arg(name, args, 0)?.as_int()?,
            size: arg(name, args, 1)?.as_int()?,
        }),
        _ => Err(EvalError::UnknownExtern(name.to_owned())),
    }
}
