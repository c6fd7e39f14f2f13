//! Shared fixtures: build a program, lower it, verify it and run it.

#![allow(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use reso_diagnostic::ErrorCode;
use reso_eval::{EvalError, Interpreter, Val};
use reso_ir::{StringInterner, SyntaxBuilder};
use reso_llir::{verify_module, Module};

use crate::{lower_program, LowerConfig, LowerOutput};

/// Lower the program built by `build` with the default configuration.
pub(crate) fn lower(build: impl FnOnce(&mut SyntaxBuilder<'_>)) -> LowerOutput {
    lower_with(&LowerConfig::default(), build)
}

pub(crate) fn lower_with(config: &LowerConfig, build: impl FnOnce(&mut SyntaxBuilder<'_>)) -> LowerOutput {
    let interner = StringInterner::new();
    let mut b = SyntaxBuilder::new(&interner);
    build(&mut b);
    let program = b.finish();
    lower_program(&program, &interner, config)
}

/// Lower, require success, and verify the module structurally.
pub(crate) fn lower_ok(build: impl FnOnce(&mut SyntaxBuilder<'_>)) -> Module {
    module_of(lower(build))
}

pub(crate) fn module_of(output: LowerOutput) -> Module {
    let (module, _warnings) = match output.into_result() {
        Ok(ok) => ok,
        Err(failure) => panic!("{failure}"),
    };
    if let Err(errors) = verify_module(&module) {
        panic!("module failed verification: {errors:#?}\n{module}");
    }
    module
}

/// Lower, verify and run `main`, returning its exit code.
pub(crate) fn run_main(build: impl FnOnce(&mut SyntaxBuilder<'_>)) -> Result<i32, EvalError> {
    let module = lower_ok(build);
    Interpreter::new(&module).run_main()
}

/// Call the lowered function `name` with `args`.
pub(crate) fn call(module: &Module, name: &str, args: &[Val]) -> Result<Option<Val>, EvalError> {
    Interpreter::new(module).call(name, args)
}

/// Codes of every diagnostic, in report order.
pub(crate) fn codes(output: &LowerOutput) -> Vec<ErrorCode> {
    output.diagnostics.iter().map(|d| d.code).collect()
}

/// Messages of the error diagnostics.
pub(crate) fn error_messages(output: &LowerOutput) -> Vec<String> {
    output.errors().map(|d| d.message.clone()).collect()
}

/// Printed form of the function `name`, for structural assertions.
pub(crate) fn function_text(module: &Module, name: &str) -> String {
    let text = module.to_string();
    let header = format!("@{name}(");
    let start = text
        .lines()
        .position(|line| line.starts_with("define") && line.contains(&header))
        .unwrap();
    text.lines()
        .skip(start)
        .take_while(|line| *line != "}")
        .collect::<Vec<_>>()
        .join("\n")
}
