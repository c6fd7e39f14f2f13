//! Instructions and terminators.

use smallvec::{smallvec, SmallVec};

use crate::{BlockId, ExternId, FuncId, IrType, StructId, ValueId};

/// Two-operand arithmetic and bitwise operations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

impl BinOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::UDiv => "udiv",
            BinOp::SRem => "srem",
            BinOp::URem => "urem",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::FRem => "frem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::AShr => "ashr",
            BinOp::LShr => "lshr",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(
            self,
            BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv | BinOp::FRem
        )
    }
}

/// Integer comparison predicates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ICmpPred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl ICmpPred {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ICmpPred::Eq => "eq",
            ICmpPred::Ne => "ne",
            ICmpPred::Slt => "slt",
            ICmpPred::Sle => "sle",
            ICmpPred::Sgt => "sgt",
            ICmpPred::Sge => "sge",
            ICmpPred::Ult => "ult",
            ICmpPred::Ule => "ule",
            ICmpPred::Ugt => "ugt",
            ICmpPred::Uge => "uge",
        }
    }
}

/// Float comparison predicates. `O*` are ordered; `Une` is true on NaN.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FCmpPred {
    Oeq,
    Une,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FCmpPred {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            FCmpPred::Oeq => "oeq",
            FCmpPred::Une => "une",
            FCmpPred::Olt => "olt",
            FCmpPred::Ole => "ole",
            FCmpPred::Ogt => "ogt",
            FCmpPred::Oge => "oge",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CastOp {
    Trunc,
    SExt,
    ZExt,
    SIToFP,
    UIToFP,
    FPToSI,
    FPToUI,
    FPExt,
    FPTrunc,
}

impl CastOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            CastOp::Trunc => "trunc",
            CastOp::SExt => "sext",
            CastOp::ZExt => "zext",
            CastOp::SIToFP => "sitofp",
            CastOp::UIToFP => "uitofp",
            CastOp::FPToSI => "fptosi",
            CastOp::FPToUI => "fptoui",
            CastOp::FPExt => "fpext",
            CastOp::FPTrunc => "fptrunc",
        }
    }
}

/// Call target.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Callee {
    Func(FuncId),
    Extern(ExternId),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InstKind {
    /// Stack slot of `ty`; result is a pointer.
    Alloca { ty: IrType },
    Load { ty: IrType, ptr: ValueId },
    Store { value: ValueId, ptr: ValueId },
    Binary { op: BinOp, lhs: ValueId, rhs: ValueId },
    FNeg { operand: ValueId },
    ICmp { pred: ICmpPred, lhs: ValueId, rhs: ValueId },
    FCmp { pred: FCmpPred, lhs: ValueId, rhs: ValueId },
    Cast { op: CastOp, value: ValueId, to: IrType },
    Select {
        cond: ValueId,
        then_val: ValueId,
        else_val: ValueId,
    },
    /// One incoming value per predecessor block.
    Phi {
        ty: IrType,
        incoming: SmallVec<[(ValueId, BlockId); 2]>,
    },
    Call {
        callee: Callee,
        args: SmallVec<[ValueId; 4]>,
        ret: IrType,
    },
    /// `ptr + offset` in bytes; `offset` is pointer-width.
    PtrAdd { ptr: ValueId, offset: ValueId },
    /// Address of field `field` of the struct `ty` at `ptr`.
    StructGep {
        ty: StructId,
        ptr: ValueId,
        field: u32,
    },
    /// Non-overlapping copy of `len` bytes.
    MemCopy {
        dst: ValueId,
        src: ValueId,
        len: ValueId,
    },
    /// Overlap-safe copy of `len` bytes.
    MemMove {
        dst: ValueId,
        src: ValueId,
        len: ValueId,
    },
}

impl InstKind {
    /// Values read by this instruction, in operand order.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            InstKind::Alloca { .. } => SmallVec::new(),
            InstKind::Load { ptr, .. } => smallvec![*ptr],
            InstKind::Store { value, ptr } => smallvec![*value, *ptr],
            InstKind::Binary { lhs, rhs, .. }
            | InstKind::ICmp { lhs, rhs, .. }
            | InstKind::FCmp { lhs, rhs, .. } => smallvec![*lhs, *rhs],
            InstKind::FNeg { operand } => smallvec![*operand],
            InstKind::Cast { value, .. } => smallvec![*value],
            InstKind::Select {
                cond,
                then_val,
                else_val,
            } => smallvec![*cond, *then_val, *else_val],
            InstKind::Phi { incoming, .. } => incoming.iter().map(|(v, _)| *v).collect(),
            InstKind::Call { args, .. } => args.clone(),
            InstKind::PtrAdd { ptr, offset } => smallvec![*ptr, *offset],
            InstKind::StructGep { ptr, .. } => smallvec![*ptr],
            InstKind::MemCopy { dst, src, len } | InstKind::MemMove { dst, src, len } => {
                smallvec![*dst, *src, *len]
            }
        }
    }
}

/// An instruction with its optional result.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Inst {
    pub result: Option<ValueId>,
    pub kind: InstKind,
}

/// How control leaves a block.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: ValueId,
        then_bb: BlockId,
        else_bb: BlockId,
    },
    Ret(Option<ValueId>),
    Unreachable,
}

impl Terminator {
    /// Successor blocks, in branch order.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Br(target) => smallvec![*target],
            Terminator::CondBr {
                then_bb, else_bb, ..
            } => smallvec![*then_bb, *else_bb],
            Terminator::Ret(_) | Terminator::Unreachable => SmallVec::new(),
        }
    }
}
