//! The interpreter loop.
//!
//! One Rust call frame per IR call; phis are resolved on block entry from
//! the edge taken, all of a block's phis at once.

use reso_llir::{
    BinOp, BlockId, Callee, CastOp, FCmpPred, FuncId, Function, GlobalId, ICmpPred, InstKind,
    IrType, Module, Terminator, ValueId, ValueKind,
};
use reso_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::host;
use crate::memory::Memory;
use crate::value::{mask, sign_extend};
use crate::{EvalError, EvalResult, Val};

/// Execution limits.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Instructions (and terminators) executed before giving up.
    pub fuel: u64,
    /// Maximum nesting of IR calls.
    pub max_call_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            fuel: 10_000_000,
            max_call_depth: 4096,
        }
    }
}

struct Frame {
    args: Vec<Val>,
    regs: Vec<Option<Val>>,
    slots: Vec<u64>,
}

pub struct Interpreter<'m> {
    module: &'m Module,
    config: EvalConfig,
    memory: Memory,
    /// Lazily materialized string constants.
    globals: Vec<Option<u64>>,
    fuel_left: u64,
    depth: usize,
    calls: FxHashMap<FuncId, u64>,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_config(module, EvalConfig::default())
    }

    pub fn with_config(module: &'m Module, config: EvalConfig) -> Self {
        Interpreter {
            module,
            fuel_left: config.fuel,
            config,
            memory: Memory::new(),
            globals: vec![None; module.globals.len()],
            depth: 0,
            calls: FxHashMap::default(),
        }
    }

    /// Call the function `name` with `args`.
    pub fn call(&mut self, name: &str, args: &[Val]) -> EvalResult<Option<Val>> {
        if self.module.pointer_bits != 64 {
            return Err(EvalError::UnsupportedTarget(self.module.pointer_bits));
        }
        let id = self
            .module
            .function_by_name(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
        self.invoke(id, args.to_vec())
    }

    /// Run the C `main` entry point and return its exit code.
    pub fn run_main(&mut self) -> EvalResult<i32> {
        match self.call("main", &[])? {
            Some(value) => Ok(value.as_signed(32)? as i32),
            None => Ok(0),
        }
    }

    /// How often the function `name` was entered.
    pub fn call_count(&self, name: &str) -> u64 {
        self.module
            .function_by_name(name)
            .and_then(|id| self.calls.get(&id))
            .copied()
            .unwrap_or(0)
    }

    pub fn fuel_used(&self) -> u64 {
        self.config.fuel - self.fuel_left
    }

    /// Allocations still alive: heap objects plus slots of active frames.
    pub fn live_allocations(&self) -> usize {
        self.memory.live_allocations()
    }

    /// Read a NUL-terminated string, e.g. a lowered string literal.
    pub fn read_string(&self, ptr: Val) -> EvalResult<String> {
        self.memory.read_c_string(ptr.as_ptr()?)
    }

    fn tick(&mut self) -> EvalResult<()> {
        if self.fuel_left == 0 {
            return Err(EvalError::OutOfFuel);
        }
        self.fuel_left -= 1;
        Ok(())
    }

    fn invoke(&mut self, id: FuncId, args: Vec<Val>) -> EvalResult<Option<Val>> {
        let module = self.module;
        let func = module.function(id);
        if func.is_declaration() {
            return Err(EvalError::malformed(format!("`{}` has no body", func.name)));
        }
        if args.len() != func.params.len() {
            return Err(EvalError::ArgCount {
                func: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
            });
        }
        if self.depth >= self.config.max_call_depth {
            return Err(EvalError::StackOverflow(self.config.max_call_depth));
        }
        *self.calls.entry(id).or_insert(0) += 1;
        tracing::trace!(func = %func.name, depth = self.depth, "call");

        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.execute(func, args));
        self.depth -= 1;
        result
    }

    fn execute(&mut self, func: &'m Function, args: Vec<Val>) -> EvalResult<Option<Val>> {
        let mut frame = Frame {
            args,
            regs: vec![None; func.values.len()],
            slots: Vec::new(),
        };
        let result = self.run_blocks(func, &mut frame);
        for slot in frame.slots {
            self.memory.release(slot);
        }
        result
    }

    fn run_blocks(&mut self, func: &'m Function, frame: &mut Frame) -> EvalResult<Option<Val>> {
        let mut block = BlockId::ENTRY;
        let mut prev: Option<BlockId> = None;
        loop {
            let data = func
                .blocks
                .get(block.index())
                .ok_or_else(|| EvalError::malformed(format!("missing block {block:?}")))?;

            let phi_count = data
                .insts
                .iter()
                .take_while(|i| matches!(i.kind, InstKind::Phi { .. }))
                .count();
            let mut incoming_values = Vec::with_capacity(phi_count);
            for inst in &data.insts[..phi_count] {
                let InstKind::Phi { incoming, .. } = &inst.kind else {
                    continue;
                };
                let from = prev.ok_or_else(|| EvalError::malformed("phi in entry block"))?;
                let (value, _) = incoming.iter().find(|(_, b)| *b == from).ok_or_else(|| {
                    EvalError::malformed(format!("phi in {block:?} has no edge from {from:?}"))
                })?;
                incoming_values.push((inst.result, self.operand(func, frame, *value)?));
            }
            for (result, value) in incoming_values {
                if let Some(result) = result {
                    frame.regs[result.index()] = Some(value);
                }
            }

            for inst in &data.insts[phi_count..] {
                self.tick()?;
                let value = self.step(func, frame, &inst.kind)?;
                if let (Some(result), Some(value)) = (inst.result, value) {
                    frame.regs[result.index()] = Some(value);
                }
            }

            self.tick()?;
            let term = data.terminator.ok_or_else(|| {
                EvalError::malformed(format!("block {block:?} of `{}` is open", func.name))
            })?;
            prev = Some(block);
            block = match term {
                Terminator::Br(target) => target,
                Terminator::CondBr {
                    cond,
                    then_bb,
                    else_bb,
                } => {
                    if self.operand(func, frame, cond)?.as_bool()? {
                        then_bb
                    } else {
                        else_bb
                    }
                }
                Terminator::Ret(value) => {
                    return value.map(|v| self.operand(func, frame, v)).transpose();
                }
                Terminator::Unreachable => {
                    return Err(EvalError::Unreachable {
                        func: func.name.clone(),
                    });
                }
            };
        }
    }

    fn global_address(&mut self, id: GlobalId) -> EvalResult<u64> {
        if let Some(Some(addr)) = self.globals.get(id.index()) {
            return Ok(*addr);
        }
        let module = self.module;
        let bytes = &module.globals[id.index()].bytes;
        let addr = self.memory.allocate(bytes.len() as u64)?;
        self.memory.write(addr, bytes)?;
        self.globals[id.index()] = Some(addr);
        Ok(addr)
    }

    fn operand(&mut self, func: &Function, frame: &Frame, id: ValueId) -> EvalResult<Val> {
        let data = func
            .values
            .get(id.index())
            .ok_or_else(|| EvalError::malformed(format!("unknown value {id:?}")))?;
        Ok(match data.kind {
            ValueKind::Param(index) => frame
                .args
                .get(index as usize)
                .copied()
                .ok_or_else(|| EvalError::malformed(format!("missing parameter {index}")))?,
            ValueKind::ConstInt(bits) => Val::Int(bits),
            ValueKind::ConstFloat(bits) => Val::Float(f64::from_bits(bits)),
            ValueKind::ConstNull => Val::NULL,
            ValueKind::Global(global) => Val::Ptr(self.global_address(global)?),
            ValueKind::Inst(_) => frame.regs[id.index()].ok_or_else(|| {
                EvalError::malformed(format!("{id:?} used before definition in `{}`", func.name))
            })?,
        })
    }

    fn step(
        &mut self,
        func: &'m Function,
        frame: &mut Frame,
        kind: &InstKind,
    ) -> EvalResult<Option<Val>> {
        let value = match kind {
            InstKind::Alloca { ty } => {
                let addr = self.memory.allocate(self.module.size_of(*ty))?;
                frame.slots.push(addr);
                Val::Ptr(addr)
            }
            InstKind::Load { ty, ptr } => {
                let addr = self.operand(func, frame, *ptr)?.as_ptr()?;
                self.load(*ty, addr)?
            }
            InstKind::Store { value, ptr } => {
                let ty = func.value(*value).ty;
                let value = self.operand(func, frame, *value)?;
                let addr = self.operand(func, frame, *ptr)?.as_ptr()?;
                self.store(ty, addr, value)?;
                return Ok(None);
            }
            InstKind::Binary { op, lhs, rhs } => {
                let ty = func.value(*lhs).ty;
                let a = self.operand(func, frame, *lhs)?;
                let b = self.operand(func, frame, *rhs)?;
                if op.is_float() {
                    Val::Float(round_to(ty, float_binary(*op, a.as_float()?, b.as_float()?)))
                } else {
                    let bits = int_bits(ty)?;
                    Val::Int(int_binary(*op, bits, a.as_int()?, b.as_int()?).ok_or_else(
                        || EvalError::DivisionByZero {
                            func: func.name.clone(),
                        },
                    )?)
                }
            }
            InstKind::FNeg { operand } => {
                Val::Float(-self.operand(func, frame, *operand)?.as_float()?)
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                let ty = func.value(*lhs).ty;
                let a = self.operand(func, frame, *lhs)?;
                let b = self.operand(func, frame, *rhs)?;
                let (a, b, bits) = match (a, b) {
                    (Val::Ptr(a), Val::Ptr(b)) => (a, b, 64),
                    (a, b) => (a.as_int()?, b.as_int()?, int_bits(ty)?),
                };
                Val::bool(int_compare(*pred, bits, a, b))
            }
            InstKind::FCmp { pred, lhs, rhs } => {
                let a = self.operand(func, frame, *lhs)?.as_float()?;
                let b = self.operand(func, frame, *rhs)?.as_float()?;
                Val::bool(float_compare(*pred, a, b))
            }
            InstKind::Cast { op, value, to } => {
                let from = func.value(*value).ty;
                let value = self.operand(func, frame, *value)?;
                cast(*op, from, *to, value)?
            }
            InstKind::Select {
                cond,
                then_val,
                else_val,
            } => {
                let pick = if self.operand(func, frame, *cond)?.as_bool()? {
                    then_val
                } else {
                    else_val
                };
                self.operand(func, frame, *pick)?
            }
            InstKind::Phi { .. } => {
                return Err(EvalError::malformed(format!(
                    "phi after non-phi instruction in `{}`",
                    func.name
                )));
            }
            InstKind::Call { callee, args, .. } => {
                let args = args
                    .iter()
                    .map(|arg| self.operand(func, frame, *arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                let module = self.module;
                return match callee {
                    Callee::Func(id) => self.invoke(*id, args),
                    Callee::Extern(id) => {
                        host::call_extern(&mut self.memory, &module.extern_decl(*id).name, &args)
                    }
                };
            }
            InstKind::PtrAdd { ptr, offset } => {
                let addr = self.operand(func, frame, *ptr)?.as_ptr()?;
                let offset = self.operand(func, frame, *offset)?.as_int()?;
                Val::Ptr(addr.wrapping_add(offset))
            }
            InstKind::StructGep { ty, ptr, field } => {
                let addr = self.operand(func, frame, *ptr)?.as_ptr()?;
                if addr == 0 {
                    return Err(EvalError::NullDereference);
                }
                Val::Ptr(addr.wrapping_add(self.module.field_offset(*ty, *field)))
            }
            InstKind::MemCopy { dst, src, len } | InstKind::MemMove { dst, src, len } => {
                let dst = self.operand(func, frame, *dst)?.as_ptr()?;
                let src = self.operand(func, frame, *src)?.as_ptr()?;
                let len = self.operand(func, frame, *len)?.as_int()?;
                self.memory.copy(dst, src, len)?;
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    fn load(&self, ty: IrType, addr: u64) -> EvalResult<Val> {
        let size = self.module.size_of(ty);
        Ok(match ty {
            IrType::I1 => Val::Int(self.memory.read_uint(addr, 1)? & 1),
            IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64 => {
                Val::Int(self.memory.read_uint(addr, size)?)
            }
            IrType::F32 => {
                let bits = self.memory.read_uint(addr, 4)?;
                Val::Float(f64::from(f32::from_bits(bits as u32)))
            }
            IrType::F64 => Val::Float(f64::from_bits(self.memory.read_uint(addr, 8)?)),
            IrType::Ptr => Val::Ptr(self.memory.read_uint(addr, size)?),
            IrType::Void | IrType::Struct(_) => {
                return Err(EvalError::malformed(format!("load of {ty:?}")));
            }
        })
    }

    fn store(&mut self, ty: IrType, addr: u64, value: Val) -> EvalResult<()> {
        let size = self.module.size_of(ty);
        match (ty, value) {
            (IrType::F32, Val::Float(v)) => {
                self.memory
                    .write_uint(addr, 4, u64::from((v as f32).to_bits()))
            }
            (IrType::F64, Val::Float(v)) => self.memory.write_uint(addr, 8, v.to_bits()),
            (_, Val::Int(bits) | Val::Ptr(bits)) if size > 0 => {
                self.memory.write_uint(addr, size, bits)
            }
            _ => Err(EvalError::malformed(format!("store of {value:?} as {ty:?}"))),
        }
    }
}

fn int_bits(ty: IrType) -> EvalResult<u32> {
    match ty {
        IrType::Ptr => Ok(64),
        other => other
            .int_bits()
            .ok_or_else(|| EvalError::malformed(format!("integer operation on {other:?}"))),
    }
}

fn round_to(ty: IrType, value: f64) -> f64 {
    if ty == IrType::F32 {
        f64::from(value as f32)
    } else {
        value
    }
}

/// Integer arithmetic at `bits` width. `None` on division by zero.
fn int_binary(op: BinOp, bits: u32, a: u64, b: u64) -> Option<u64> {
    let sa = sign_extend(a, bits);
    let sb = sign_extend(b, bits);
    let result = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::SDiv => {
            if sb == 0 {
                return None;
            }
            sa.wrapping_div(sb) as u64
        }
        BinOp::UDiv => a.checked_div(b)?,
        BinOp::SRem => {
            if sb == 0 {
                return None;
            }
            sa.wrapping_rem(sb) as u64
        }
        BinOp::URem => a.checked_rem(b)?,
        BinOp::And => a & b,
        BinOp::Or => a | b,
        BinOp::Xor => a ^ b,
        BinOp::Shl if b < u64::from(bits) => a << b,
        BinOp::LShr if b < u64::from(bits) => a >> b,
        BinOp::Shl | BinOp::LShr => 0,
        BinOp::AShr => (sa >> b.min(u64::from(bits) - 1)) as u64,
        BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv | BinOp::FRem => a,
    };
    Some(mask(result, bits))
}

fn float_binary(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::FAdd => a + b,
        BinOp::FSub => a - b,
        BinOp::FMul => a * b,
        BinOp::FDiv => a / b,
        BinOp::FRem => a % b,
        _ => f64::NAN,
    }
}

fn int_compare(pred: ICmpPred, bits: u32, a: u64, b: u64) -> bool {
    let (sa, sb) = (sign_extend(a, bits), sign_extend(b, bits));
    match pred {
        ICmpPred::Eq => a == b,
        ICmpPred::Ne => a != b,
        ICmpPred::Slt => sa < sb,
        ICmpPred::Sle => sa <= sb,
        ICmpPred::Sgt => sa > sb,
        ICmpPred::Sge => sa >= sb,
        ICmpPred::Ult => a < b,
        ICmpPred::Ule => a <= b,
        ICmpPred::Ugt => a > b,
        ICmpPred::Uge => a >= b,
    }
}

fn float_compare(pred: FCmpPred, a: f64, b: f64) -> bool {
    match pred {
        FCmpPred::Oeq => a == b,
        FCmpPred::Une => a != b,
        FCmpPred::Olt => a < b,
        FCmpPred::Ole => a <= b,
        FCmpPred::Ogt => a > b,
        FCmpPred::Oge => a >= b,
    }
}

/// Float to integer, saturating at the bounds of the target width.
fn float_to_int(value: f64, bits: u32, signed: bool) -> u64 {
    let (min, max) = if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    };
    let wide = if value.is_nan() { 0 } else { value as i128 };
    mask(wide.clamp(min, max) as u64, bits)
}

fn cast(op: CastOp, from: IrType, to: IrType, value: Val) -> EvalResult<Val> {
    Ok(match op {
        CastOp::Trunc => Val::Int(mask(value.as_int()?, int_bits(to)?)),
        CastOp::ZExt => Val::Int(value.as_int()?),
        CastOp::SExt => {
            let wide = value.as_signed(int_bits(from)?)?;
            Val::Int(mask(wide as u64, int_bits(to)?))
        }
        CastOp::SIToFP => Val::Float(round_to(to, value.as_signed(int_bits(from)?)? as f64)),
        CastOp::UIToFP => Val::Float(round_to(to, value.as_int()? as f64)),
        CastOp::FPToSI => Val::Int(float_to_int(value.as_float()?, int_bits(to)?, true)),
        CastOp::FPToUI => Val::Int(float_to_int(value.as_float()?, int_bits(to)?, false)),
        CastOp::FPExt => Val::Float(value.as_float()?),
        CastOp::FPTrunc => Val::Float(round_to(to, value.as_float()?)),
    })
}
