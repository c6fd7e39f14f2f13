//! Function bodies and the program entry point.

use reso_diagnostic::{type_mismatch, DiagnosticQueue};
use reso_ir::{FunctionDef, Name, Program, Span, StringInterner};
use reso_llir::{IrBuilder, IrType, Module};
use reso_types::Type;
use tracing::debug;

use crate::LowerConfig;

use super::errors;
use super::scope::Binding;
use super::{FnSig, Lowerer, ProgramTables};

/// Symbol of the C entry point.
const C_MAIN: &str = "main";

impl Lowerer<'_> {
    /// Lower the body of `def` into its declared IR function.
    ///
    /// Every parameter, and the receiver of a method as `self`, is spilled
    /// to an entry-block slot so the body can assign to it.
    pub(crate) fn lower_function(&mut self, def: &FunctionDef, sig: &FnSig) {
        debug!(
            function = self.fn_name,
            params = sig.params.len(),
            method = sig.receiver.is_some(),
            "lowering function"
        );
        let entry = self.builder.append_block("entry");
        self.builder.position_at_end(entry);
        self.scope.push();

        let mut index = 0;
        if let Some(recv_ty) = &sig.receiver {
            let name = self.interner.intern("self");
            self.bind_param(index, name, recv_ty, def.span);
            index += 1;
        }
        for (param, ty) in def.params.iter().zip(&sig.params) {
            self.bind_param(index, param.name, ty, param.span);
            index += 1;
        }

        self.lower_stmts(def.body);
        self.finish_body(def.span);
        self.scope.pop();
        debug_assert_eq!(self.scope.depth(), 0, "unbalanced scopes in `{}`", self.fn_name);
    }

    fn bind_param(&mut self, index: usize, name: Name, ty: &Type, span: Span) {
        let text = self.text(name);
        let ir = self.ir(ty);
        let slot = self.builder.create_entry_alloca(ir, text);
        let incoming = self.builder.param(index);
        self.builder.store(incoming, slot);
        let binding = Binding::Local {
            slot,
            ty: ty.clone(),
        };
        if self.scope.declare(name, binding).is_err() {
            self.report(errors::already_defined(span, "parameter", text));
        }
    }
}

/// Emit `i32 main()` calling the user entry point, if the program has one.
///
/// An integer result is resized to `i32` by its own signedness; a unit
/// entry point exits with 0.
pub(crate) fn emit_entry_wrapper(
    program: &Program,
    interner: &StringInterner,
    config: &LowerConfig,
    tables: &ProgramTables,
    module: &mut Module,
    diags: &mut DiagnosticQueue,
) {
    let Some(def) = program
        .functions
        .iter()
        .find(|def| def.receiver.is_none() && interner.lookup(def.name) == config.entry_point)
    else {
        return;
    };
    let Some(sig) = tables.functions.get(&def.name) else {
        return;
    };
    let name = interner.lookup(def.name);
    if !sig.params.is_empty() {
        diags.add(errors::arg_count(def.span, "entry point", name, 0, sig.params.len()));
        return;
    }
    if !(sig.ret.is_integer() || sig.ret.is_unit()) {
        let found = sig.ret.display(interner).to_string();
        let context = format!("return type of entry point `{name}`");
        diags.add(type_mismatch(def.span, "integer or ()", &found, &context));
        return;
    }

    let wrapper = module.declare_function(C_MAIN, Vec::new(), IrType::I32);
    let mut builder = IrBuilder::new(module, wrapper);
    let entry = builder.append_block("entry");
    builder.position_at_end(entry);
    let result = builder.call(sig.func, &[], name);
    let code = match result {
        Some(value) if !sig.ret.is_unit() => {
            builder.int_resize(value, IrType::I32, sig.ret.is_signed_int(), "exit.code")
        }
        _ => builder.const_i32(0),
    };
    builder.ret(code);
    debug!(entry = name, "emitted C entry point");
}
