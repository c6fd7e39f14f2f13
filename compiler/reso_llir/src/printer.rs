//! Textual form of a module, close to LLVM assembly.
//!
//! ```text
//! %Point = type { i32, i32 }
//! @.str.0 = private constant [3 x i8] c"hi\00"
//! declare ptr @GC_malloc(i64)
//!
//! define i32 @max(i32 %a, i32 %b) {
//! entry0:
//!   %gt.2 = icmp sgt i32 %a, %b
//!   br i1 %gt.2, label %then1, label %else2
//! ...
//! }
//! ```

use std::fmt::{self, Write as _};

use crate::{
    BlockId, Callee, Function, InstKind, IrType, Module, Terminator, ValueId, ValueKind,
};

struct TypeName<'a>(&'a Module, IrType);

impl fmt::Display for TypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            IrType::I1 => f.write_str("i1"),
            IrType::I8 => f.write_str("i8"),
            IrType::I16 => f.write_str("i16"),
            IrType::I32 => f.write_str("i32"),
            IrType::I64 => f.write_str("i64"),
            IrType::F32 => f.write_str("float"),
            IrType::F64 => f.write_str("double"),
            IrType::Ptr => f.write_str("ptr"),
            IrType::Void => f.write_str("void"),
            IrType::Struct(id) => write!(f, "%{}", self.0.struct_type(id).name),
        }
    }
}

struct FunctionPrinter<'a> {
    module: &'a Module,
    func: &'a Function,
}

impl FunctionPrinter<'_> {
    fn ty(&self, ty: IrType) -> TypeName<'_> {
        TypeName(self.module, ty)
    }

    fn value(&self, id: ValueId) -> String {
        let Some(data) = self.func.values.get(id.index()) else {
            return format!("%<bad {}>", id.raw());
        };
        match &data.kind {
            ValueKind::ConstInt(bits) => {
                if data.ty == IrType::I1 {
                    if *bits == 0 { "false" } else { "true" }.to_owned()
                } else {
                    sign_extended(*bits, data.ty.int_bits().unwrap_or(64)).to_string()
                }
            }
            ValueKind::ConstFloat(bits) => format!("{:?}", f64::from_bits(*bits)),
            ValueKind::ConstNull => "null".to_owned(),
            ValueKind::Global(g) => format!("@{}", self.module.globals[g.index()].name),
            ValueKind::Param(_) | ValueKind::Inst(_) => {
                if data.name.is_empty() {
                    format!("%{}", id.raw())
                } else if matches!(data.kind, ValueKind::Param(_)) {
                    format!("%{}", data.name)
                } else {
                    format!("%{}.{}", data.name, id.raw())
                }
            }
        }
    }

    fn typed(&self, id: ValueId) -> String {
        let ty = self.func.values.get(id.index()).map_or(IrType::Void, |v| v.ty);
        format!("{} {}", self.ty(ty), self.value(id))
    }

    fn block_label(&self, id: BlockId) -> String {
        match self.func.blocks.get(id.index()) {
            Some(b) if !b.name.is_empty() => format!("{}{}", b.name, id.raw()),
            _ => format!("bb{}", id.raw()),
        }
    }

    fn callee_name(&self, callee: Callee) -> &str {
        match callee {
            Callee::Func(id) => &self.module.function(id).name,
            Callee::Extern(id) => &self.module.extern_decl(id).name,
        }
    }

    fn inst(&self, out: &mut String, kind: &InstKind) -> fmt::Result {
        match kind {
            InstKind::Alloca { ty } => write!(out, "alloca {}", self.ty(*ty)),
            InstKind::Load { ty, ptr } => {
                write!(out, "load {}, {}", self.ty(*ty), self.typed(*ptr))
            }
            InstKind::Store { value, ptr } => {
                write!(out, "store {}, {}", self.typed(*value), self.typed(*ptr))
            }
            InstKind::Binary { op, lhs, rhs } => write!(
                out,
                "{} {}, {}",
                op.mnemonic(),
                self.typed(*lhs),
                self.value(*rhs)
            ),
            InstKind::FNeg { operand } => write!(out, "fneg {}", self.typed(*operand)),
            InstKind::ICmp { pred, lhs, rhs } => write!(
                out,
                "icmp {} {}, {}",
                pred.mnemonic(),
                self.typed(*lhs),
                self.value(*rhs)
            ),
            InstKind::FCmp { pred, lhs, rhs } => write!(
                out,
                "fcmp {} {}, {}",
                pred.mnemonic(),
                self.typed(*lhs),
                self.value(*rhs)
            ),
            InstKind::Cast { op, value, to } => write!(
                out,
                "{} {} to {}",
                op.mnemonic(),
                self.typed(*value),
                self.ty(*to)
            ),
            InstKind::Select {
                cond,
                then_val,
                else_val,
            } => write!(
                out,
                "select {}, {}, {}",
                self.typed(*cond),
                self.typed(*then_val),
                self.typed(*else_val)
            ),
            InstKind::Phi { ty, incoming } => {
                write!(out, "phi {} ", self.ty(*ty))?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "[ {}, %{} ]", self.value(*value), self.block_label(*block))?;
                }
                Ok(())
            }
            InstKind::Call { callee, args, ret } => {
                write!(out, "call {} @{}(", self.ty(*ret), self.callee_name(*callee))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.typed(*arg));
                }
                out.push(')');
                Ok(())
            }
            InstKind::PtrAdd { ptr, offset } => write!(
                out,
                "getelementptr i8, {}, {}",
                self.typed(*ptr),
                self.typed(*offset)
            ),
            InstKind::StructGep { ty, ptr, field } => write!(
                out,
                "getelementptr {}, {}, i32 0, i32 {field}",
                self.ty(IrType::Struct(*ty)),
                self.typed(*ptr)
            ),
            InstKind::MemCopy { dst, src, len } => write!(
                out,
                "call void @llvm.memcpy({}, {}, {})",
                self.typed(*dst),
                self.typed(*src),
                self.typed(*len)
            ),
            InstKind::MemMove { dst, src, len } => write!(
                out,
                "call void @llvm.memmove({}, {}, {})",
                self.typed(*dst),
                self.typed(*src),
                self.typed(*len)
            ),
        }
    }

    fn terminator(&self, out: &mut String, term: &Terminator) -> fmt::Result {
        match term {
            Terminator::Br(target) => write!(out, "br label %{}", self.block_label(*target)),
            Terminator::CondBr {
                cond,
                then_bb,
                else_bb,
            } => write!(
                out,
                "br {}, label %{}, label %{}",
                self.typed(*cond),
                self.block_label(*then_bb),
                self.block_label(*else_bb)
            ),
            Terminator::Ret(Some(value)) => write!(out, "ret {}", self.typed(*value)),
            Terminator::Ret(None) => out.write_str("ret void"),
            Terminator::Unreachable => out.write_str("unreachable"),
        }
    }

    fn print(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.func.is_declaration() {
            "declare"
        } else {
            "define"
        };
        write!(f, "{keyword} {} @{}(", self.ty(self.func.ret), self.func.name)?;
        for i in 0..self.func.params.len() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&self.typed(self.func.param(i)))?;
        }
        f.write_str(")")?;
        if self.func.is_declaration() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        for id in self.func.block_ids() {
            let block = self.func.block(id);
            writeln!(f, "{}:", self.block_label(id))?;
            for inst in &block.insts {
                let mut line = String::new();
                if let Some(result) = inst.result {
                    write!(line, "{} = ", self.value(result))?;
                }
                self.inst(&mut line, &inst.kind)?;
                writeln!(f, "  {line}")?;
            }
            if let Some(term) = &block.terminator {
                let mut line = String::new();
                self.terminator(&mut line, term)?;
                writeln!(f, "  {line}")?;
            }
        }
        writeln!(f, "}}")
    }
}

/// Interpret the low `bits` bits of `raw` as two's complement.
fn sign_extended(raw: u64, bits: u32) -> i64 {
    if bits >= 64 {
        raw as i64
    } else {
        let shift = 64 - bits;
        ((raw << shift) as i64) >> shift
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for st in &self.structs {
            let fields: Vec<String> = st
                .fields
                .iter()
                .map(|t| TypeName(self, *t).to_string())
                .collect();
            writeln!(f, "%{} = type {{ {} }}", st.name, fields.join(", "))?;
        }
        for global in &self.globals {
            write!(
                f,
                "@{} = private constant [{} x i8] c\"",
                global.name,
                global.bytes.len()
            )?;
            for &byte in &global.bytes {
                if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
                    write!(f, "{}", byte as char)?;
                } else {
                    write!(f, "\\{byte:02X}")?;
                }
            }
            writeln!(f, "\"")?;
        }
        for ext in &self.externs {
            let params: Vec<String> = ext
                .params
                .iter()
                .map(|t| TypeName(self, *t).to_string())
                .collect();
            writeln!(
                f,
                "declare {} @{}({})",
                TypeName(self, ext.ret),
                ext.name,
                params.join(", ")
            )?;
        }
        for func in &self.functions {
            writeln!(f)?;
            FunctionPrinter { module: self, func }.print(f)?;
        }
        Ok(())
    }
}
