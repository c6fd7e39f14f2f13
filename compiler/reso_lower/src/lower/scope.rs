//! Lexical scopes for lowering.
//!
//! [`ScopeStack`] maps names to stack slots, one frame per lexical block.
//! Every local lives in an entry-block `alloca`, so there is no SSA merge at
//! join points: branches simply store to the same slot.

use reso_ir::Name;
use reso_llir::ValueId;
use reso_types::Type;
use rustc_hash::FxHashMap;

/// What a name resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Binding {
    /// A mutable local stored in `slot`.
    Local { slot: ValueId, ty: Type },
    /// Declared, but its declaration failed to lower. Uses are silently
    /// poisoned instead of reported as undefined.
    Poisoned,
}

/// The name was already bound in the innermost frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AlreadyDefined;

#[derive(Default)]
pub(crate) struct ScopeStack {
    frames: Vec<FxHashMap<Name, Binding>>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Close the innermost frame, dropping its bindings. Shadowed outer
    /// bindings become visible again.
    pub(crate) fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "scope stack underflow");
        self.frames.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame.
    pub(crate) fn declare(&mut self, name: Name, binding: Binding) -> Result<(), AlreadyDefined> {
        let Some(frame) = self.frames.last_mut() else {
            debug_assert!(false, "declare with no open frame");
            return Err(AlreadyDefined);
        };
        if frame.contains_key(&name) {
            return Err(AlreadyDefined);
        }
        frame.insert(name, binding);
        Ok(())
    }

    /// Innermost binding of `name`.
    pub(crate) fn lookup(&self, name: Name) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(&name))
    }
}
