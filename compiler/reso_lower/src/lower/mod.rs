//! Syntax tree → low-level IR lowering.
//!
//! # Architecture
//!
//! Lowering runs in two phases over a [`Program`]:
//!
//! 1. [`ProgramTables::collect`] resolves every aggregate and every function
//!    signature, registers struct types and declares IR functions. Calls may
//!    therefore target functions defined later in the source.
//! 2. One [`Lowerer`] per function body walks statements and expressions and
//!    emits instructions through an [`IrBuilder`].
//!
//! The `Lowerer` methods are split by concern:
//!
//! | File | Concern |
//! |------|---------|
//! | `expr.rs` | dispatch, literals, names, casts, fields, aggregate construction |
//! | `operators.rs` | binary and unary operators, short-circuit `and` / `or` |
//! | `control_flow.rs` | statements, `if` chains, loops, scopes |
//! | `reachability.rs` | dead code, return coverage, sealing |
//! | `function.rs` | entry block, parameters, the C `main` wrapper |
//! | `calls.rs` | direct calls and method dispatch |
//! | `vector.rs` | the `Vector<T>` intrinsics |
//!
//! A subexpression that fails to lower yields `None` ([`Lowered`]). Callers
//! propagate it without reporting again, so one mistake produces one
//! diagnostic.

mod calls;
mod control_flow;
pub(crate) mod errors;
mod expr;
pub(crate) mod fold;
mod function;
mod operators;
pub(crate) mod reachability;
pub(crate) mod scope;
mod vector;

use reso_diagnostic::{type_mismatch, Diagnostic, DiagnosticQueue};
use reso_ir::{Name, ParsedType, ParsedTypeId, Program, Span, StringInterner, SyntaxArena};
use reso_llir::{BlockId, FuncId, IrBuilder, IrType, Module, StructId, ValueId};
use reso_types::{assignable, FloatWidth, TargetLayout, Type};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::alloc::HeapAllocator;
use crate::LowerConfig;

use self::reachability::ReachCache;
use self::scope::ScopeStack;

/// IR symbol of the user entry point once the C `main` wrapper takes its name.
pub(crate) const USER_ENTRY_PREFIX: &str = "reso.";

/// Name of the vector descriptor struct type.
pub(crate) const VECTOR_STRUCT: &str = "reso.Vector";

// ── Type mapping ───────────────────────────────────────────────────

/// IR representation of a value of `ty`.
///
/// `()` is carried as an `i8` zero so unit-typed expressions still have a
/// value; references are opaque pointers.
pub(crate) fn ir_type(ty: &Type, layout: TargetLayout) -> IrType {
    match ty {
        Type::Signed(w) | Type::Unsigned(w) => {
            IrType::int(layout.int_bits(*w)).unwrap_or(IrType::I64)
        }
        Type::Float(FloatWidth::F32) => IrType::F32,
        Type::Float(FloatWidth::F64) => IrType::F64,
        Type::Bool => IrType::I1,
        Type::Char => IrType::I32,
        Type::Unit => IrType::I8,
        Type::String | Type::Aggregate(_) | Type::Array(_) | Type::Null => IrType::Ptr,
    }
}

/// IR return type: `()` returns `void`.
pub(crate) fn ret_ir_type(ty: &Type, layout: TargetLayout) -> IrType {
    if ty.is_unit() {
        IrType::Void
    } else {
        ir_type(ty, layout)
    }
}

// ── Program tables ─────────────────────────────────────────────────

pub(crate) struct StructInfo {
    pub(crate) id: StructId,
    /// Resolved fields in declaration order; the index is the IR field index.
    pub(crate) fields: Vec<(Name, Type)>,
}

impl StructInfo {
    pub(crate) fn field(&self, name: Name) -> Option<(u32, &Type)> {
        self.fields
            .iter()
            .position(|(field, _)| *field == name)
            .map(|index| (u32::try_from(index).unwrap_or(u32::MAX), &self.fields[index].1))
    }

    /// Instances must be scanned by the collector.
    pub(crate) fn has_references(&self) -> bool {
        self.fields.iter().any(|(_, ty)| ty.is_reference())
    }
}

/// Resolved signature of a declared function or method.
pub(crate) struct FnSig {
    pub(crate) func: FuncId,
    /// Index of the defining `FunctionDef` in the program.
    pub(crate) def_index: usize,
    pub(crate) receiver: Option<Type>,
    pub(crate) params: Vec<Type>,
    pub(crate) ret: Type,
}

/// Read-only facts shared by every function lowering.
pub(crate) struct ProgramTables {
    pub(crate) structs: FxHashMap<Name, StructInfo>,
    /// Keyed by the flat symbol; methods appear here under their mangled name.
    pub(crate) functions: FxHashMap<Name, FnSig>,
    /// `(receiver type, method name)` → symbol.
    pub(crate) methods: FxHashMap<(Type, Name), Name>,
    /// Symbols whose signature failed to resolve. Calls to them are poisoned
    /// instead of reported as undefined.
    pub(crate) poisoned: FxHashSet<Name>,
    pub(crate) vector: StructId,
}

/// Resolve a written type. The error is the first unknown name.
pub(crate) fn resolve_type(
    arena: &SyntaxArena,
    interner: &StringInterner,
    structs: &FxHashMap<Name, StructInfo>,
    id: ParsedTypeId,
) -> Result<Type, Name> {
    match arena.parsed_type(id) {
        ParsedType::Unit => Ok(Type::Unit),
        ParsedType::Named(name) => Type::primitive(interner.lookup(name))
            .or_else(|| structs.contains_key(&name).then_some(Type::Aggregate(name)))
            .ok_or(name),
        ParsedType::Vector(elem) => resolve_type(arena, interner, structs, elem).map(Type::vector),
    }
}

impl ProgramTables {
    /// Resolve aggregates and signatures, declaring IR structs and functions.
    pub(crate) fn collect(
        program: &Program,
        interner: &StringInterner,
        config: &LowerConfig,
        module: &mut Module,
        diags: &mut DiagnosticQueue,
    ) -> Self {
        let layout = TargetLayout::new(config.pointer_bits);
        let arena = &program.arena;
        let size = module.ptr_int_type();
        let vector = module.declare_struct(VECTOR_STRUCT);
        module.set_struct_body(vector, vec![IrType::Ptr, size, size]);

        let mut tables = ProgramTables {
            structs: FxHashMap::default(),
            functions: FxHashMap::default(),
            methods: FxHashMap::default(),
            poisoned: FxHashSet::default(),
            vector,
        };

        // Struct names first so fields and signatures may refer to any of them.
        let mut declared = Vec::with_capacity(program.structs.len());
        for def in &program.structs {
            let text = interner.lookup(def.name);
            if Type::primitive(text).is_some() {
                diags.add(errors::already_defined(def.span, "type", text));
                continue;
            }
            if tables.structs.contains_key(&def.name) {
                let first = program.structs.iter().find(|s| s.name == def.name);
                let first = first.map_or(def.span, |s| s.span);
                diags.add(errors::redefined(def.span, first, "type", text));
                continue;
            }
            let id = module.declare_struct(text);
            tables.structs.insert(
                def.name,
                StructInfo {
                    id,
                    fields: Vec::new(),
                },
            );
            declared.push(def);
        }

        for def in declared {
            let mut fields: Vec<(Name, Type)> = Vec::with_capacity(def.fields.len());
            for (index, field) in def.fields.iter().enumerate() {
                if let Some(first) = def.fields[..index].iter().find(|f| f.name == field.name) {
                    diags.add(errors::redefined(
                        field.span,
                        first.span,
                        "field",
                        interner.lookup(field.name),
                    ));
                    continue;
                }
                match resolve_type(arena, interner, &tables.structs, field.ty) {
                    Ok(ty) => fields.push((field.name, ty)),
                    Err(name) => {
                        diags.add(errors::unknown_type(field.span, interner.lookup(name)));
                    }
                }
            }
            if let Some(info) = tables.structs.get_mut(&def.name) {
                let body = fields.iter().map(|(_, ty)| ir_type(ty, layout)).collect();
                module.set_struct_body(info.id, body);
                info.fields = fields;
            }
        }

        for def_index in 0..program.functions.len() {
            tables.declare_function(def_index, program, interner, config, module, diags);
        }
        tables
    }

    fn declare_function(
        &mut self,
        def_index: usize,
        program: &Program,
        interner: &StringInterner,
        config: &LowerConfig,
        module: &mut Module,
        diags: &mut DiagnosticQueue,
    ) {
        let layout = TargetLayout::new(config.pointer_bits);
        let arena = &program.arena;
        let def = &program.functions[def_index];
        let symbol = interner.lookup(def.name);
        if self.functions.contains_key(&def.name) || self.poisoned.contains(&def.name) {
            let first = program.functions[..def_index].iter().find(|f| f.name == def.name);
            let first = first.map_or(def.span, |f| f.span);
            diags.add(errors::redefined(def.span, first, "function", symbol));
            return;
        }

        let mut resolve = |id: ParsedTypeId, span: Span| {
            resolve_type(arena, interner, &self.structs, id)
                .map_err(|name| diags.add(errors::unknown_type(span, interner.lookup(name))))
                .ok()
        };
        let receiver = def.receiver.map(|r| resolve(r.ty, def.span));
        let params: Vec<Option<Type>> = def.params.iter().map(|p| resolve(p.ty, p.span)).collect();
        let ret = resolve(def.return_type, def.span);

        let (Some(ret), Some(receiver), Some(params)) = (
            ret,
            receiver.map_or(Some(None), |r| r.map(Some)),
            params.into_iter().collect::<Option<Vec<Type>>>(),
        ) else {
            self.poisoned.insert(def.name);
            return;
        };

        if let (Some(recv_ty), Some(r)) = (&receiver, def.receiver) {
            let key = (recv_ty.clone(), r.method);
            if let Some(symbol) = self.methods.get(&key) {
                let first = self.functions.get(symbol);
                let first = first.map_or(def.span, |sig| program.functions[sig.def_index].span);
                diags.add(errors::redefined(
                    def.span,
                    first,
                    "method",
                    interner.lookup(r.method),
                ));
                self.poisoned.insert(def.name);
                return;
            }
            self.methods.insert(key, def.name);
        }

        let ir_name = if def.receiver.is_none() && symbol == config.entry_point {
            format!("{USER_ENTRY_PREFIX}{symbol}")
        } else {
            symbol.to_owned()
        };
        let ir_params = receiver
            .iter()
            .chain(&params)
            .map(|ty| ir_type(ty, layout))
            .collect();
        let func = module.declare_function(ir_name, ir_params, ret_ir_type(&ret, layout));
        self.functions.insert(
            def.name,
            FnSig {
                func,
                def_index,
                receiver,
                params,
                ret,
            },
        );
    }
}

// ── Lowerer ────────────────────────────────────────────────────────

/// A lowered expression: its IR value and Reso type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Typed {
    pub(crate) value: ValueId,
    pub(crate) ty: Type,
}

/// `None` when the expression failed to lower and was already reported.
pub(crate) type Lowered = Option<Typed>;

/// Branch targets of the innermost `while`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LoopTargets {
    /// `continue` jumps here.
    pub(crate) cond: BlockId,
    /// `break` jumps here.
    pub(crate) end: BlockId,
}

/// Lowers one function body.
pub(crate) struct Lowerer<'a> {
    pub(crate) arena: &'a SyntaxArena,
    pub(crate) interner: &'a StringInterner,
    pub(crate) tables: &'a ProgramTables,
    pub(crate) config: &'a LowerConfig,
    pub(crate) layout: TargetLayout,
    pub(crate) alloc: &'a dyn HeapAllocator,
    pub(crate) diags: &'a mut DiagnosticQueue,
    pub(crate) builder: IrBuilder<'a>,
    pub(crate) scope: ScopeStack,
    pub(crate) loops: Vec<LoopTargets>,
    /// Declared return type of the function being lowered.
    pub(crate) ret_ty: Type,
    /// Source name of the function, for messages.
    pub(crate) fn_name: &'static str,
    /// A W2001 was already emitted for the current run of dead statements.
    pub(crate) dead_reported: bool,
    pub(crate) reach: ReachCache,
}

impl Lowerer<'_> {
    pub(crate) fn report(&mut self, diag: Diagnostic) {
        self.diags.add(diag);
    }

    /// Source text of an interned name.
    #[inline]
    pub(crate) fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// Display form of a type, for messages.
    pub(crate) fn show(&self, ty: &Type) -> String {
        ty.display(self.interner).to_string()
    }

    #[inline]
    pub(crate) fn ir(&self, ty: &Type) -> IrType {
        ir_type(ty, self.layout)
    }

    /// Storage size of a value of `ty` as laid out in the module.
    pub(crate) fn store_size(&self, ty: &Type) -> u64 {
        let ir = self.ir(ty);
        self.builder.module().size_of(ir)
    }

    /// The value every `()` expression produces.
    pub(crate) fn unit_value(&mut self) -> ValueId {
        self.builder.const_int(IrType::I8, 0)
    }

    pub(crate) fn unit(&mut self) -> Lowered {
        let value = self.unit_value();
        Some(Typed {
            value,
            ty: Type::Unit,
        })
    }

    /// Resolve a written type, reporting unknown names at `span`.
    pub(crate) fn resolve(&mut self, id: ParsedTypeId, span: Span) -> Option<Type> {
        match resolve_type(self.arena, self.interner, &self.tables.structs, id) {
            Ok(ty) => Some(ty),
            Err(name) => {
                let text = self.text(name);
                self.report(errors::unknown_type(span, text));
                None
            }
        }
    }

    /// Check that `value` may be stored where `target` is expected.
    pub(crate) fn coerce(&mut self, value: Typed, target: &Type, span: Span, context: &str) -> Lowered {
        if assignable(&value.ty, target) {
            return Some(Typed {
                value: value.value,
                ty: target.clone(),
            });
        }
        let expected = self.show(target);
        let found = self.show(&value.ty);
        self.report(type_mismatch(span, &expected, &found, context));
        None
    }
}

/// Lower every function of `program` into a fresh module.
pub(crate) fn lower_program(
    program: &Program,
    interner: &StringInterner,
    config: &LowerConfig,
    alloc: &dyn HeapAllocator,
    diags: &mut DiagnosticQueue,
) -> Module {
    let mut module = Module::new(config.module_name.clone(), config.pointer_bits);
    let tables = ProgramTables::collect(program, interner, config, &mut module, diags);
    debug!(
        structs = tables.structs.len(),
        functions = tables.functions.len(),
        "program tables collected"
    );

    for (index, def) in program.functions.iter().enumerate() {
        let Some(sig) = tables.functions.get(&def.name) else {
            continue;
        };
        if sig.def_index != index {
            continue;
        }
        let mut lowerer = Lowerer {
            arena: &program.arena,
            interner,
            tables: &tables,
            config,
            layout: TargetLayout::new(config.pointer_bits),
            alloc,
            diags: &mut *diags,
            builder: IrBuilder::new(&mut module, sig.func),
            scope: ScopeStack::new(),
            loops: Vec::new(),
            ret_ty: sig.ret.clone(),
            fn_name: interner.lookup(def.name),
            dead_reported: false,
            reach: ReachCache::default(),
        };
        lowerer.lower_function(def, sig);
    }

    function::emit_entry_wrapper(program, interner, config, &tables, &mut module, diags);
    module
}
