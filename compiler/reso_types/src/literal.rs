//! Unconstrained literal binding.
//!
//! Numeric literals start out without a concrete type. The first context
//! that supplies one (a declared type, a parameter, a typed sibling operand)
//! binds the literal exactly once; two unbound literals of the same kind stay
//! unbound together.

use crate::{TargetLayout, Type};

/// The natural kind of an unconstrained literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LitKind {
    /// Integer literal with its (possibly negated) value.
    Int(i128),
    Float,
}

impl LitKind {
    /// The type a literal takes when nothing constrains it.
    pub fn default_type(self) -> Type {
        match self {
            LitKind::Int(_) => Type::I32,
            LitKind::Float => Type::F64,
        }
    }

    /// Kind name for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            LitKind::Int(_) => "integer literal",
            LitKind::Float => "float literal",
        }
    }
}

/// Type state of a literal expression.
///
/// Every literal starts `Unbound`. [`LitType::bind`] moves it to `Bound`
/// once a context supplies a type; [`LitType::resolve`] gives the type it is
/// emitted at, falling back to the kind's default when nothing bound it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum LitType {
    Unbound(LitKind),
    Bound(Type),
}

impl LitType {
    /// Bind to `target`. An already bound literal keeps its type.
    pub fn bind(&self, target: &Type, layout: TargetLayout) -> Result<LitType, BindError> {
        match self {
            LitType::Unbound(kind) => bind_literal(*kind, target, layout).map(LitType::Bound),
            LitType::Bound(_) => Ok(self.clone()),
        }
    }

    pub fn resolve(self) -> Type {
        match self {
            LitType::Bound(ty) => ty,
            LitType::Unbound(kind) => kind.default_type(),
        }
    }
}

/// Why a literal could not take a type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BindError {
    /// The literal's kind is incompatible with the target type.
    Incompatible,
    /// Integer value outside the target's range.
    OutOfRange,
}

/// Bind a literal of `kind` to `target`.
///
/// Integer literals bind to any integer type whose range contains the value,
/// and to any float type. Float literals bind only to float types.
pub fn bind_literal(kind: LitKind, target: &Type, layout: TargetLayout) -> Result<Type, BindError> {
    match (kind, target) {
        (LitKind::Int(value), Type::Signed(w)) => {
            let bits = layout.int_bits(*w);
            let max = (1i128 << (bits - 1)) - 1;
            let min = -(1i128 << (bits - 1));
            if (min..=max).contains(&value) {
                Ok(target.clone())
            } else {
                Err(BindError::OutOfRange)
            }
        }
        (LitKind::Int(value), Type::Unsigned(w)) => {
            let bits = layout.int_bits(*w);
            let max = (1i128 << bits) - 1;
            if (0..=max).contains(&value) {
                Ok(target.clone())
            } else {
                Err(BindError::OutOfRange)
            }
        }
        (LitKind::Int(_) | LitKind::Float, Type::Float(_)) => Ok(target.clone()),
        _ => Err(BindError::Incompatible),
    }
}

/// Meet two unbound literals. Same kinds stay unbound; integer meets float fails.
pub fn unify_literals(left: LitKind, right: LitKind) -> Option<LitKind> {
    match (left, right) {
        (LitKind::Int(_), LitKind::Int(_)) => Some(left),
        (LitKind::Float, LitKind::Float) => Some(LitKind::Float),
        _ => None,
    }
}
