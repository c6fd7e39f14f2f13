//! Runtime failures of the interpreter.

use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The lowered bounds check called the runtime hook.
    #[error("index {index} out of bounds for vector of size {size}")]
    BoundsCheck { index: u64, size: u64 },
    #[error("division by zero in `{func}`")]
    DivisionByZero { func: String },
    #[error("null pointer dereference")]
    NullDereference,
    #[error("invalid access of {len} bytes at {addr:#x}")]
    InvalidAccess { addr: u64, len: u64 },
    #[error("allocation of {0} bytes is too large")]
    AllocationTooLarge(u64),
    #[error("execution ran out of fuel")]
    OutOfFuel,
    #[error("call depth exceeded {0}")]
    StackOverflow(usize),
    #[error("reached `unreachable` in `{func}`")]
    Unreachable { func: String },
    #[error("function `{0}` is not defined")]
    UnknownFunction(String),
    #[error("extern `{0}` has no host implementation")]
    UnknownExtern(String),
    #[error("`{func}` expects {expected} arguments, got {found}")]
    ArgCount {
        func: String,
        expected: usize,
        found: usize,
    },
    #[error("only 64-bit modules can be interpreted, found {0}-bit")]
    UnsupportedTarget(u32),
    #[error("malformed IR: {0}")]
    Malformed(String),
}

impl EvalError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        EvalError::Malformed(message.into())
    }
}
