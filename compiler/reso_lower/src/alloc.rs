//! Heap allocation seam.
//!
//! Aggregate instances and vector storage are allocated through a
//! [`HeapAllocator`]. The engine never frees; the allocator's runtime is
//! expected to keep memory alive and hand it out zeroed.

use reso_llir::{IrBuilder, IrType, ValueId};

/// What the allocated memory will hold.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AllocKind {
    /// May hold references to other heap objects.
    General,
    /// Known to hold no references (scalar vector buffers, plain records).
    NoInternalRefs,
}

/// Emits the IR for one heap allocation.
pub trait HeapAllocator {
    /// Allocate `size` bytes (a pointer-width integer value) at the current
    /// insertion point and return the pointer.
    fn allocate(
        &self,
        builder: &mut IrBuilder<'_>,
        size: ValueId,
        kind: AllocKind,
        name: &str,
    ) -> ValueId;
}

/// Boehm-style collector: `GC_malloc` and `GC_malloc_atomic`.
#[derive(Copy, Clone, Default, Debug)]
pub struct GcAllocator;

impl GcAllocator {
    pub const GENERAL: &'static str = "GC_malloc";
    pub const ATOMIC: &'static str = "GC_malloc_atomic";
}

impl HeapAllocator for GcAllocator {
    fn allocate(
        &self,
        builder: &mut IrBuilder<'_>,
        size: ValueId,
        kind: AllocKind,
        name: &str,
    ) -> ValueId {
        let symbol = match kind {
            AllocKind::General => Self::GENERAL,
            AllocKind::NoInternalRefs => Self::ATOMIC,
        };
        let size_ty = builder.ptr_int_type();
        let ext = builder
            .module_mut()
            .get_or_declare_extern(symbol, &[size_ty], IrType::Ptr);
        match builder.call_extern(ext, &[size], name) {
            Some(ptr) => ptr,
            None => builder.const_null(),
        }
    }
}
