//! Inline lowering of the `Vector<T>` intrinsics.
//!
//! A vector is a heap descriptor `{ ptr elems, usize size, usize cap }`.
//! Every operation is expanded in place; there is no runtime library
//! besides the allocator and the bounds-error hook.
//!
//! Element addresses are `elems + index * sizeof(T)`, byte-scaled for every
//! `T`. Growth doubles the capacity (starting at 1), copies the live prefix
//! into a fresh buffer and never frees the old one.

use reso_diagnostic::type_mismatch;
use reso_ir::{ExprId, ExprRange, Name, ParsedTypeId, Span};
use reso_llir::{ICmpPred, IrType, ValueId};
use reso_types::Type;

use crate::alloc::AllocKind;

use super::errors;
use super::{Lowered, Lowerer, Typed};

/// Runtime hook called with `(index, size)` when a bounds check fails.
pub(crate) const BOUNDS_ERROR_HOOK: &str = "reso_rt_bounds_error";

// Descriptor field indices.
const ELEMS: u32 = 0;
const SIZE: u32 = 1;
const CAP: u32 = 2;

/// A vector operation, resolved from the method name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VectorOp {
    Size,
    Capacity,
    Get,
    Set,
    Add,
    Insert,
    Remove,
}

impl VectorOp {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "size" => VectorOp::Size,
            "capacity" => VectorOp::Capacity,
            "get" => VectorOp::Get,
            "set" => VectorOp::Set,
            "add" => VectorOp::Add,
            "insert" => VectorOp::Insert,
            "remove" => VectorOp::Remove,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            VectorOp::Size | VectorOp::Capacity => 0,
            VectorOp::Get | VectorOp::Add | VectorOp::Remove => 1,
            VectorOp::Set | VectorOp::Insert => 2,
        }
    }
}

impl Lowerer<'_> {
    // ── Construction ───────────────────────────────────────────

    /// `Vector<T>()`: a descriptor with `LowerConfig::vector_initial_capacity`
    /// slots and size 0.
    pub(crate) fn lower_vector_new(&mut self, elem: ParsedTypeId, span: Span) -> Lowered {
        let elem = self.resolve(elem, span)?;
        let vector = self.tables.vector;
        let usize_ir = self.builder.ptr_int_type();

        let desc_bytes = self.builder.module().size_of(IrType::Struct(vector));
        let desc_size = self.builder.const_usize(desc_bytes);
        let desc = self
            .alloc
            .allocate(&mut self.builder, desc_size, AllocKind::General, "vec");

        let cap = self.config.vector_initial_capacity;
        let elems = if cap > 0 {
            let bytes = cap.saturating_mul(self.store_size(&elem));
            let size = self.builder.const_usize(bytes);
            let kind = buffer_kind(&elem);
            self.alloc.allocate(&mut self.builder, size, kind, "vec.buf")
        } else {
            self.builder.const_null()
        };

        let zero = self.builder.const_int(usize_ir, 0);
        let cap_value = self.builder.const_usize(cap);
        self.store_field(desc, ELEMS, elems);
        self.store_field(desc, SIZE, zero);
        self.store_field(desc, CAP, cap_value);
        Some(Typed {
            value: desc,
            ty: Type::vector(elem),
        })
    }

    // ── Method dispatch ────────────────────────────────────────

    pub(crate) fn lower_vector_method(
        &mut self,
        recv: Typed,
        elem: &Type,
        method: Name,
        args: ExprRange,
        span: Span,
    ) -> Lowered {
        let method_text = self.text(method);
        let Some(op) = VectorOp::from_name(method_text) else {
            let ty = self.show(&recv.ty);
            self.report(errors::unknown_method(span, method_text, &ty));
            self.lower_args_unchecked(args);
            return None;
        };
        let arena = self.arena;
        let arg_ids = arena.expr_list(args);
        if arg_ids.len() != op.arity() {
            self.report(errors::arg_count(span, "method", method_text, op.arity(), arg_ids.len()));
            self.lower_args_unchecked(args);
            return None;
        }

        let desc = recv.value;
        match op {
            VectorOp::Size => {
                let value = self.load_field(desc, SIZE, "vec.size");
                Some(Typed {
                    value,
                    ty: Type::USIZE,
                })
            }
            VectorOp::Capacity => {
                let value = self.load_field(desc, CAP, "vec.cap");
                Some(Typed {
                    value,
                    ty: Type::USIZE,
                })
            }
            VectorOp::Get => {
                let index = self.lower_index(arg_ids[0])?;
                self.emit_get(desc, elem, index)
            }
            VectorOp::Set => {
                let index = self.lower_index(arg_ids[0]);
                let value = self.lower_element(arg_ids[1], elem, "argument 2 of `set`");
                self.emit_set(desc, elem, index?, value?);
                self.unit()
            }
            VectorOp::Add => {
                let value = self.lower_element(arg_ids[0], elem, "argument 1 of `add`")?;
                self.emit_add(desc, elem, value);
                self.unit()
            }
            VectorOp::Insert => {
                let index = self.lower_index(arg_ids[0]);
                let value = self.lower_element(arg_ids[1], elem, "argument 2 of `insert`");
                self.emit_insert(desc, elem, index?, value?);
                self.unit()
            }
            VectorOp::Remove => {
                let index = self.lower_index(arg_ids[0])?;
                self.emit_remove(desc, elem, index)
            }
        }
    }

    // ── Indexing sugar ─────────────────────────────────────────

    /// `v[i]`, the same as `v.get(i)`.
    pub(crate) fn lower_index_expr(&mut self, receiver: ExprId, index: ExprId, span: Span) -> Lowered {
        let recv = self.lower_expr(receiver, None);
        let Some(recv) = recv else {
            self.lower_expr(index, None);
            return None;
        };
        let Some(elem) = recv.ty.element().cloned() else {
            let ty = self.show(&recv.ty);
            self.report(errors::not_indexable(span, &ty));
            self.lower_expr(index, None);
            return None;
        };
        let index = self.lower_index(index)?;
        self.emit_get(recv.value, &elem, index)
    }

    /// `v[i] = x`, the same as `v.set(i, x)`.
    pub(crate) fn lower_index_assign(&mut self, receiver: ExprId, index: ExprId, value: ExprId, span: Span) {
        let recv = self.lower_expr(receiver, None);
        let elem = match &recv {
            Some(recv) => match recv.ty.element() {
                Some(elem) => Some(elem.clone()),
                None => {
                    let ty = self.show(&recv.ty);
                    self.report(errors::not_indexable(span, &ty));
                    None
                }
            },
            None => None,
        };
        let (Some(recv), Some(elem)) = (recv, elem) else {
            self.lower_expr(index, None);
            self.lower_expr(value, None);
            return;
        };
        let index = self.lower_index(index);
        let value = self.lower_element(value, &elem, "assignment to vector element");
        if let (Some(index), Some(value)) = (index, value) {
            self.emit_set(recv.value, &elem, index, value);
        }
    }

    // ── Operands ───────────────────────────────────────────────

    /// An index operand as a `usize`. Any integer type is accepted and
    /// resized by its own signedness, so a negative index fails the check.
    fn lower_index(&mut self, id: ExprId) -> Option<ValueId> {
        let v = self.lower_expr(id, Some(&Type::USIZE))?;
        if !v.ty.is_integer() {
            let span = self.arena.expr_span(id);
            let found = self.show(&v.ty);
            self.report(type_mismatch(span, "integer", &found, "vector index"));
            return None;
        }
        let usize_ir = self.builder.ptr_int_type();
        Some(
            self.builder
                .int_resize(v.value, usize_ir, v.ty.is_signed_int(), "idx"),
        )
    }

    /// A value stored into a vector of `elem`.
    fn lower_element(&mut self, id: ExprId, elem: &Type, context: &str) -> Option<ValueId> {
        let span = self.arena.expr_span(id);
        self.lower_expr(id, Some(elem))
            .and_then(|v| self.coerce(v, elem, span, context))
            .map(|v| v.value)
    }

    // ── Descriptor access ──────────────────────────────────────

    fn field_ptr(&mut self, desc: ValueId, field: u32) -> ValueId {
        let vector = self.tables.vector;
        let name = match field {
            ELEMS => "elems.ptr",
            SIZE => "size.ptr",
            _ => "cap.ptr",
        };
        self.builder.struct_gep(vector, desc, field, name)
    }

    fn load_field(&mut self, desc: ValueId, field: u32, name: &str) -> ValueId {
        let ptr = self.field_ptr(desc, field);
        let ty = if field == ELEMS {
            IrType::Ptr
        } else {
            self.builder.ptr_int_type()
        };
        self.builder.load(ty, ptr, name)
    }

    fn store_field(&mut self, desc: ValueId, field: u32, value: ValueId) {
        let ptr = self.field_ptr(desc, field);
        self.builder.store(value, ptr);
    }

    /// `elems + index * sizeof(elem)`.
    fn element_ptr(&mut self, elems: ValueId, index: ValueId, elem: &Type) -> ValueId {
        let esize = self.store_size(elem);
        let esize = self.builder.const_usize(esize);
        let offset = self.builder.mul(index, esize, "elem.off");
        self.builder.ptr_add(elems, offset, "elem.ptr")
    }

    /// `count * sizeof(elem)` as a byte length.
    fn byte_len(&mut self, count: ValueId, elem: &Type) -> ValueId {
        let esize = self.store_size(elem);
        let esize = self.builder.const_usize(esize);
        self.builder.mul(count, esize, "bytes")
    }

    /// Branch to the bounds-error hook unless `index < size`
    /// (`index <= size` when `inclusive`). Continues in the in-bounds block.
    fn bounds_check(&mut self, index: ValueId, size: ValueId, inclusive: bool) {
        let pred = if inclusive { ICmpPred::Ule } else { ICmpPred::Ult };
        let ok = self.builder.icmp(pred, index, size, "inbounds");
        let in_bounds = self.builder.append_block("vec.inbounds");
        let out_of_bounds = self.builder.append_block("vec.oob");
        self.builder.cond_br(ok, in_bounds, out_of_bounds);

        self.builder.position_at_end(out_of_bounds);
        let usize_ir = self.builder.ptr_int_type();
        let hook = self.builder.module_mut().get_or_declare_extern(
            BOUNDS_ERROR_HOOK,
            &[usize_ir, usize_ir],
            IrType::Void,
        );
        self.builder.call_extern(hook, &[index, size], "");
        self.builder.unreachable();

        self.builder.position_at_end(in_bounds);
    }

    /// Grow the buffer when `size >= cap`. Continues in the block where
    /// capacity is known to exceed `size`.
    fn ensure_capacity(&mut self, desc: ValueId, size: ValueId, elem: &Type) {
        let usize_ir = self.builder.ptr_int_type();
        let cap = self.load_field(desc, CAP, "vec.cap");
        let full = self.builder.icmp(ICmpPred::Uge, size, cap, "vec.full");
        let grow = self.builder.append_block("vec.grow");
        let append = self.builder.append_block("vec.append");
        self.builder.cond_br(full, grow, append);

        self.builder.position_at_end(grow);
        let zero = self.builder.const_int(usize_ir, 0);
        let one = self.builder.const_int(usize_ir, 1);
        let two = self.builder.const_int(usize_ir, 2);
        let empty = self.builder.icmp(ICmpPred::Eq, cap, zero, "cap.zero");
        let doubled = self.builder.mul(cap, two, "cap.double");
        let new_cap = self.builder.select(empty, one, doubled, "cap.new");
        let bytes = self.byte_len(new_cap, elem);
        let buffer = self
            .alloc
            .allocate(&mut self.builder, bytes, buffer_kind(elem), "vec.buf");
        let old = self.load_field(desc, ELEMS, "vec.elems");
        let live = self.byte_len(size, elem);
        self.builder.memcpy(buffer, old, live);
        self.store_field(desc, ELEMS, buffer);
        self.store_field(desc, CAP, new_cap);
        self.builder.br(append);

        self.builder.position_at_end(append);
    }

    // ── Operations ─────────────────────────────────────────────

    fn emit_get(&mut self, desc: ValueId, elem: &Type, index: ValueId) -> Lowered {
        let size = self.load_field(desc, SIZE, "vec.size");
        self.bounds_check(index, size, false);
        let elems = self.load_field(desc, ELEMS, "vec.elems");
        let ptr = self.element_ptr(elems, index, elem);
        let ir = self.ir(elem);
        let value = self.builder.load(ir, ptr, "elem");
        Some(Typed {
            value,
            ty: elem.clone(),
        })
    }

    fn emit_set(&mut self, desc: ValueId, elem: &Type, index: ValueId, value: ValueId) {
        let size = self.load_field(desc, SIZE, "vec.size");
        self.bounds_check(index, size, false);
        let elems = self.load_field(desc, ELEMS, "vec.elems");
        let ptr = self.element_ptr(elems, index, elem);
        self.builder.store(value, ptr);
    }

    fn emit_add(&mut self, desc: ValueId, elem: &Type, value: ValueId) {
        let size = self.load_field(desc, SIZE, "vec.size");
        self.ensure_capacity(desc, size, elem);
        let elems = self.load_field(desc, ELEMS, "vec.elems");
        let ptr = self.element_ptr(elems, size, elem);
        self.builder.store(value, ptr);
        self.bump_size(desc, size, true);
    }

    fn emit_insert(&mut self, desc: ValueId, elem: &Type, index: ValueId, value: ValueId) {
        let size = self.load_field(desc, SIZE, "vec.size");
        self.bounds_check(index, size, true);
        self.ensure_capacity(desc, size, elem);
        let elems = self.load_field(desc, ELEMS, "vec.elems");
        let at = self.element_ptr(elems, index, elem);
        let one = self.builder.const_usize(1);
        let next = self.builder.add(index, one, "idx.next");
        let dst = self.element_ptr(elems, next, elem);
        let tail = self.builder.sub(size, index, "tail");
        let tail_bytes = self.byte_len(tail, elem);
        self.builder.memmove(dst, at, tail_bytes);
        self.builder.store(value, at);
        self.bump_size(desc, size, true);
    }

    fn emit_remove(&mut self, desc: ValueId, elem: &Type, index: ValueId) -> Lowered {
        let size = self.load_field(desc, SIZE, "vec.size");
        self.bounds_check(index, size, false);
        let elems = self.load_field(desc, ELEMS, "vec.elems");
        let at = self.element_ptr(elems, index, elem);
        let ir = self.ir(elem);
        let removed = self.builder.load(ir, at, "removed");

        let one = self.builder.const_usize(1);
        let next = self.builder.add(index, one, "idx.next");
        let has_tail = self.builder.icmp(ICmpPred::Ult, next, size, "has.tail");
        let shift = self.builder.append_block("vec.shift");
        let done = self.builder.append_block("vec.removed");
        self.builder.cond_br(has_tail, shift, done);

        self.builder.position_at_end(shift);
        let src = self.element_ptr(elems, next, elem);
        let tail = self.builder.sub(size, next, "tail");
        let tail_bytes = self.byte_len(tail, elem);
        self.builder.memmove(at, src, tail_bytes);
        self.builder.br(done);

        self.builder.position_at_end(done);
        self.bump_size(desc, size, false);
        Some(Typed {
            value: removed,
            ty: elem.clone(),
        })
    }

    /// Store `size + 1` (or `size - 1`) back into the descriptor.
    fn bump_size(&mut self, desc: ValueId, size: ValueId, grow: bool) {
        let one = self.builder.const_usize(1);
        let new_size = if grow {
            self.builder.add(size, one, "size.inc")
        } else {
            self.builder.sub(size, one, "size.dec")
        };
        self.store_field(desc, SIZE, new_size);
    }
}

/// Buffers of reference elements must be scanned by the collector.
fn buffer_kind(elem: &Type) -> AllocKind {
    if elem.is_reference() {
        AllocKind::General
    } else {
        AllocKind::NoInternalRefs
    }
}

#[cfg(test)]
mod tests;
