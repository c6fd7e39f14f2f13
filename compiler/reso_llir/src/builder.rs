//! ID-based instruction builder.
//!
//! `IrBuilder` fills in the body of one declared function. It follows the
//! "position at a block, emit instructions, terminate" pattern of LLVM's
//! `IRBuilder`; every emitted value comes back as a `Copy` [`ValueId`].
//!
//! Emission into a block that already has a terminator is a lowering bug.
//! It trips a debug assertion; in release builds the instruction is dropped
//! and the first terminator wins, so the produced function still verifies.

use smallvec::SmallVec;

use crate::{
    BinOp, BlockId, Callee, CastOp, ExternId, FCmpPred, FuncId, GlobalId, ICmpPred, Inst,
    InstKind, IrType, Module, StructId, Terminator, ValueData, ValueId, ValueKind,
};
use crate::module::Block;

pub struct IrBuilder<'m> {
    module: &'m mut Module,
    func: FuncId,
    current: Option<BlockId>,
    /// Terminators set through this builder; the edge set only changes
    /// when this grows.
    terminators: usize,
}

impl<'m> IrBuilder<'m> {
    /// Start building the body of `func`, which must be declared in `module`.
    pub fn new(module: &'m mut Module, func: FuncId) -> Self {
        debug_assert!(
            module.function(func).is_declaration(),
            "function `{}` already has a body",
            module.function(func).name
        );
        IrBuilder {
            module,
            func,
            current: None,
            terminators: 0,
        }
    }

    #[inline]
    pub fn module(&self) -> &Module {
        &*self.module
    }

    #[inline]
    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    #[inline]
    pub fn function_id(&self) -> FuncId {
        self.func
    }

    #[inline]
    fn function(&self) -> &crate::Function {
        self.module.function(self.func)
    }

    #[inline]
    fn function_mut(&mut self) -> &mut crate::Function {
        self.module.function_mut(self.func)
    }

    /// Value of the `index`th incoming parameter.
    pub fn param(&self, index: usize) -> ValueId {
        self.function().param(index)
    }

    /// Type of any value of the current function.
    pub fn value_type(&self, value: ValueId) -> IrType {
        self.function().value(value).ty
    }

    /// Integer constant payload, if `value` is one.
    pub fn const_int_value(&self, value: ValueId) -> Option<u64> {
        match self.function().value(value).kind {
            ValueKind::ConstInt(bits) => Some(bits),
            _ => None,
        }
    }

    /// Integer type as wide as a pointer.
    pub fn ptr_int_type(&self) -> IrType {
        self.module.ptr_int_type()
    }

    fn push_value(&mut self, ty: IrType, kind: ValueKind, name: &str) -> ValueId {
        let func = self.function_mut();
        let id = ValueId::from_index(func.values.len());
        func.values.push(ValueData {
            ty,
            kind,
            name: name.to_owned(),
        });
        id
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// Append a new empty block. The first block appended is the entry block.
    pub fn append_block(&mut self, name: &str) -> BlockId {
        let func = self.function_mut();
        let id = BlockId::from_index(func.blocks.len());
        func.blocks.push(Block {
            name: name.to_owned(),
            ..Block::default()
        });
        tracing::trace!(block = ?id, name, "append block");
        id
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.function().blocks.len(),
            "{block:?} out of bounds"
        );
        self.current = Some(block);
    }

    #[inline]
    pub fn current_block(&self) -> Option<BlockId> {
        self.current
    }

    pub fn block_has_terminator(&self, block: BlockId) -> bool {
        self.function().block(block).terminator.is_some()
    }

    /// Whether the insertion block is missing or already terminated.
    pub fn current_block_terminated(&self) -> bool {
        self.current.map_or(true, |b| self.block_has_terminator(b))
    }

    /// Number of terminators set so far. Graph queries over the partial
    /// function stay valid while this is unchanged.
    #[inline]
    pub fn terminator_count(&self) -> usize {
        self.terminators
    }

    /// Successor lists of every block, for graph queries over the partial function.
    pub fn successor_lists(&self) -> Vec<SmallVec<[BlockId; 2]>> {
        self.function()
            .blocks
            .iter()
            .map(|b| b.terminator.map(|t| t.successors()).unwrap_or_default())
            .collect()
    }

    /// Terminate `block` with `unreachable` if it has no terminator.
    pub fn seal_unterminated(&mut self, block: BlockId) -> bool {
        let func = self.function_mut();
        let slot = &mut func.blocks[block.index()].terminator;
        if slot.is_none() {
            *slot = Some(Terminator::Unreachable);
            self.terminators += 1;
            true
        } else {
            false
        }
    }

    // -----------------------------------------------------------------------
    // Instruction plumbing
    // -----------------------------------------------------------------------

    fn insert(&mut self, kind: InstKind, result: Option<ValueId>) {
        let Some(block) = self.current else {
            debug_assert!(false, "emitting {kind:?} with no insertion block");
            return;
        };
        let func = self.function_mut();
        let target = &mut func.blocks[block.index()];
        if target.terminator.is_some() {
            debug_assert!(false, "emitting {kind:?} into terminated block {block:?}");
            return;
        }
        target.insts.push(Inst { result, kind });
    }

    fn emit(&mut self, ty: IrType, kind: InstKind, name: &str) -> ValueId {
        let block = self.current.unwrap_or(BlockId::ENTRY);
        let result = self.push_value(ty, ValueKind::Inst(block), name);
        self.insert(kind, Some(result));
        result
    }

    fn emit_void(&mut self, kind: InstKind) {
        self.insert(kind, None);
    }

    fn terminate(&mut self, term: Terminator) {
        let Some(block) = self.current else {
            debug_assert!(false, "terminating with no insertion block");
            return;
        };
        let func = self.function_mut();
        let slot = &mut func.blocks[block.index()].terminator;
        if slot.is_some() {
            debug_assert!(false, "block {block:?} terminated twice");
            return;
        }
        *slot = Some(term);
        self.terminators += 1;
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    /// Integer constant of type `ty`; `value` is truncated to the width.
    pub fn const_int(&mut self, ty: IrType, value: u64) -> ValueId {
        let bits = ty.int_bits().unwrap_or(64);
        let masked = if bits >= 64 {
            value
        } else {
            value & ((1u64 << bits) - 1)
        };
        self.push_value(ty, ValueKind::ConstInt(masked), "")
    }

    pub fn const_bool(&mut self, value: bool) -> ValueId {
        self.const_int(IrType::I1, u64::from(value))
    }

    pub fn const_i32(&mut self, value: i32) -> ValueId {
        self.const_int(IrType::I32, value as u64)
    }

    /// Pointer-width unsigned constant.
    pub fn const_usize(&mut self, value: u64) -> ValueId {
        let ty = self.ptr_int_type();
        self.const_int(ty, value)
    }

    /// Float constant. `f32` constants are rounded through `f32`.
    pub fn const_float(&mut self, ty: IrType, value: f64) -> ValueId {
        let value = if ty == IrType::F32 {
            f64::from(value as f32)
        } else {
            value
        };
        self.push_value(ty, ValueKind::ConstFloat(value.to_bits()), "")
    }

    pub fn const_null(&mut self) -> ValueId {
        self.push_value(IrType::Ptr, ValueKind::ConstNull, "")
    }

    /// Pointer to a private NUL-terminated string constant.
    pub fn global_string(&mut self, text: &str) -> ValueId {
        let global: GlobalId = self.module.add_string(text);
        self.push_value(IrType::Ptr, ValueKind::Global(global), "")
    }

    // -----------------------------------------------------------------------
    // Memory
    // -----------------------------------------------------------------------

    pub fn alloca(&mut self, ty: IrType, name: &str) -> ValueId {
        self.emit(IrType::Ptr, InstKind::Alloca { ty }, name)
    }

    /// Stack slot placed at the start of the entry block, regardless of the
    /// current position.
    pub fn create_entry_alloca(&mut self, ty: IrType, name: &str) -> ValueId {
        let result = self.push_value(IrType::Ptr, ValueKind::Inst(BlockId::ENTRY), name);
        let func = self.function_mut();
        debug_assert!(!func.blocks.is_empty(), "no entry block");
        if let Some(entry) = func.blocks.first_mut() {
            let at = entry
                .insts
                .iter()
                .position(|i| !matches!(i.kind, InstKind::Alloca { .. }))
                .unwrap_or(entry.insts.len());
            entry.insts.insert(
                at,
                Inst {
                    result: Some(result),
                    kind: InstKind::Alloca { ty },
                },
            );
        }
        result
    }

    pub fn load(&mut self, ty: IrType, ptr: ValueId, name: &str) -> ValueId {
        debug_assert!(self.value_type(ptr).is_ptr(), "load from non-pointer");
        self.emit(ty, InstKind::Load { ty, ptr }, name)
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) {
        debug_assert!(self.value_type(ptr).is_ptr(), "store to non-pointer");
        self.emit_void(InstKind::Store { value, ptr });
    }

    /// `ptr + offset` bytes.
    pub fn ptr_add(&mut self, ptr: ValueId, offset: ValueId, name: &str) -> ValueId {
        self.emit(IrType::Ptr, InstKind::PtrAdd { ptr, offset }, name)
    }

    pub fn struct_gep(&mut self, ty: StructId, ptr: ValueId, field: u32, name: &str) -> ValueId {
        debug_assert!(
            (field as usize) < self.module.struct_type(ty).fields.len(),
            "struct_gep field {field} out of range"
        );
        self.emit(IrType::Ptr, InstKind::StructGep { ty, ptr, field }, name)
    }

    pub fn memcpy(&mut self, dst: ValueId, src: ValueId, len: ValueId) {
        self.emit_void(InstKind::MemCopy { dst, src, len });
    }

    pub fn memmove(&mut self, dst: ValueId, src: ValueId, len: ValueId) {
        self.emit_void(InstKind::MemMove { dst, src, len });
    }

    // -----------------------------------------------------------------------
    // Arithmetic
    // -----------------------------------------------------------------------

    /// Any two-operand operation; the result has the left operand's type.
    pub fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let ty = self.value_type(lhs);
        debug_assert_eq!(ty, self.value_type(rhs), "{op:?} operand types differ");
        debug_assert_eq!(op.is_float(), ty.is_float(), "{op:?} on {ty:?}");
        self.emit(ty, InstKind::Binary { op, lhs, rhs }, name)
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Add, lhs, rhs, name)
    }

    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Sub, lhs, rhs, name)
    }

    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Mul, lhs, rhs, name)
    }

    pub fn sdiv(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::SDiv, lhs, rhs, name)
    }

    pub fn udiv(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::UDiv, lhs, rhs, name)
    }

    pub fn srem(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::SRem, lhs, rhs, name)
    }

    pub fn urem(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::URem, lhs, rhs, name)
    }

    pub fn fadd(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::FAdd, lhs, rhs, name)
    }

    pub fn frem(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::FRem, lhs, rhs, name)
    }

    pub fn and(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::And, lhs, rhs, name)
    }

    pub fn or(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Or, lhs, rhs, name)
    }

    pub fn xor(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Xor, lhs, rhs, name)
    }

    /// Integer negation as `0 - x`.
    pub fn neg(&mut self, operand: ValueId, name: &str) -> ValueId {
        let ty = self.value_type(operand);
        let zero = self.const_int(ty, 0);
        self.sub(zero, operand, name)
    }

    pub fn fneg(&mut self, operand: ValueId, name: &str) -> ValueId {
        let ty = self.value_type(operand);
        self.emit(ty, InstKind::FNeg { operand }, name)
    }

    /// Bitwise complement as `x ^ -1` (boolean inversion for `i1`).
    pub fn not(&mut self, operand: ValueId, name: &str) -> ValueId {
        let ty = self.value_type(operand);
        let ones = self.const_int(ty, u64::MAX);
        self.xor(operand, ones, name)
    }

    // -----------------------------------------------------------------------
    // Comparisons
    // -----------------------------------------------------------------------

    pub fn icmp(&mut self, pred: ICmpPred, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        debug_assert_eq!(
            self.value_type(lhs),
            self.value_type(rhs),
            "icmp operand types differ"
        );
        self.emit(IrType::I1, InstKind::ICmp { pred, lhs, rhs }, name)
    }

    pub fn fcmp(&mut self, pred: FCmpPred, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.emit(IrType::I1, InstKind::FCmp { pred, lhs, rhs }, name)
    }

    // -----------------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------------

    pub fn cast(&mut self, op: CastOp, value: ValueId, to: IrType, name: &str) -> ValueId {
        self.emit(to, InstKind::Cast { op, value, to }, name)
    }

    pub fn trunc(&mut self, value: ValueId, to: IrType, name: &str) -> ValueId {
        self.cast(CastOp::Trunc, value, to, name)
    }

    pub fn sext(&mut self, value: ValueId, to: IrType, name: &str) -> ValueId {
        self.cast(CastOp::SExt, value, to, name)
    }

    pub fn zext(&mut self, value: ValueId, to: IrType, name: &str) -> ValueId {
        self.cast(CastOp::ZExt, value, to, name)
    }

    /// Resize an integer to `to`: extend per `signed`, truncate, or pass through.
    pub fn int_resize(&mut self, value: ValueId, to: IrType, signed: bool, name: &str) -> ValueId {
        let from_bits = self.value_type(value).int_bits().unwrap_or(64);
        let to_bits = to.int_bits().unwrap_or(64);
        match from_bits.cmp(&to_bits) {
            std::cmp::Ordering::Equal => value,
            std::cmp::Ordering::Less if signed => self.sext(value, to, name),
            std::cmp::Ordering::Less => self.zext(value, to, name),
            std::cmp::Ordering::Greater => self.trunc(value, to, name),
        }
    }

    // -----------------------------------------------------------------------
    // Select, phi, calls
    // -----------------------------------------------------------------------

    pub fn select(
        &mut self,
        cond: ValueId,
        then_val: ValueId,
        else_val: ValueId,
        name: &str,
    ) -> ValueId {
        let ty = self.value_type(then_val);
        self.emit(
            ty,
            InstKind::Select {
                cond,
                then_val,
                else_val,
            },
            name,
        )
    }

    /// Phi node with all incoming edges known up front. Placed after any
    /// existing phis of the current block.
    pub fn phi_from_incoming(
        &mut self,
        ty: IrType,
        incoming: &[(ValueId, BlockId)],
        name: &str,
    ) -> ValueId {
        let Some(block) = self.current else {
            debug_assert!(false, "phi with no insertion block");
            return self.const_int(ty, 0);
        };
        let result = self.push_value(ty, ValueKind::Inst(block), name);
        let target = &mut self.function_mut().blocks[block.index()];
        let at = target
            .insts
            .iter()
            .position(|i| !matches!(i.kind, InstKind::Phi { .. }))
            .unwrap_or(target.insts.len());
        target.insts.insert(
            at,
            Inst {
                result: Some(result),
                kind: InstKind::Phi {
                    ty,
                    incoming: incoming.iter().copied().collect(),
                },
            },
        );
        result
    }

    fn call_inner(
        &mut self,
        callee: Callee,
        ret: IrType,
        args: &[ValueId],
        name: &str,
    ) -> Option<ValueId> {
        let kind = InstKind::Call {
            callee,
            args: args.iter().copied().collect(),
            ret,
        };
        if ret == IrType::Void {
            self.emit_void(kind);
            None
        } else {
            Some(self.emit(ret, kind, name))
        }
    }

    /// Direct call to a function of this module. Returns `None` for void callees.
    pub fn call(&mut self, func: FuncId, args: &[ValueId], name: &str) -> Option<ValueId> {
        let callee = self.module.function(func);
        debug_assert_eq!(
            callee.params.len(),
            args.len(),
            "call to `{}` arity mismatch",
            callee.name
        );
        let ret = callee.ret;
        self.call_inner(Callee::Func(func), ret, args, name)
    }

    pub fn call_extern(&mut self, ext: ExternId, args: &[ValueId], name: &str) -> Option<ValueId> {
        let ret = self.module.extern_decl(ext).ret;
        self.call_inner(Callee::Extern(ext), ret, args, name)
    }

    // -----------------------------------------------------------------------
    // Terminators
    // -----------------------------------------------------------------------

    pub fn br(&mut self, dest: BlockId) {
        self.terminate(Terminator::Br(dest));
    }

    pub fn cond_br(&mut self, cond: ValueId, then_bb: BlockId, else_bb: BlockId) {
        debug_assert_eq!(self.value_type(cond), IrType::I1, "cond_br on non-i1");
        self.terminate(Terminator::CondBr {
            cond,
            then_bb,
            else_bb,
        });
    }

    pub fn ret(&mut self, value: ValueId) {
        self.terminate(Terminator::Ret(Some(value)));
    }

    pub fn ret_void(&mut self) {
        self.terminate(Terminator::Ret(None));
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }
}
