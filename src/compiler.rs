// This module provides ExpressionCompiler, the entry point that drives one expression through the
// whole pipeline. Each compile call opens a fresh CompilationSession backed by its own bumpalo
// arena and walks the stage machine: Lowering turns the tree into stack instructions and assigns
// slots, Assembling folds constants, checks runtime calls against the linkage table and appends
// the function to the runtime module, Validating checks the operand stack of the encoded program
// and, when enabled, runs the whole module through wasmparser, and Emitting freezes the bytes
// into a CompiledModule. The first error moves the session to Failed and is returned as is;
// no partial artifact escapes. The compiler itself only holds the shared runtime and its config,
// so one instance can serve any number of threads.

//! Expression compiler driver.

use crate::core::config::CompilerConfig;
use crate::core::error::CompileResult;
use crate::core::session::{CompilationSession, CompileStage};
use crate::expr::Expr;
use crate::lower::lower;
use crate::runtime::module::RuntimeModule;
use crate::wasm::assembler::ModuleAssembler;
use crate::wasm::emit::CompiledModule;
use crate::wasm::fold::fold_constants;
use crate::wasm::validate::{check_linkage, validate_module, validate_program};
use bumpalo::Bump;
use std::sync::Arc;

/// Compiles expressions against a pre-loaded runtime module.
#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    runtime: Arc<RuntimeModule>,
    config: CompilerConfig,
}

impl ExpressionCompiler {
    /// Create a compiler with the default configuration.
    pub fn new(runtime: Arc<RuntimeModule>) -> Self {
        Self::with_config(runtime, CompilerConfig::default())
    }

    pub fn with_config(runtime: Arc<RuntimeModule>, config: CompilerConfig) -> Self {
        Self { runtime, config }
    }

    pub fn runtime(&self) -> &RuntimeModule {
        &self.runtime
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `expr` into a standalone module exporting `executable`.
    pub fn compile(&self, expr: &Expr) -> CompileResult<CompiledModule> {
        let arena = Bump::new();
        let mut session = CompilationSession::new(&arena);
        log::debug!("🔧 Compiling expression: {}", expr);

        match self.run(expr, &mut session) {
            Ok(module) => {
                log::debug!(
                    "compiled {} slots into {} bytes, arena {} bytes",
                    module.slot_count(),
                    module.len(),
                    session.arena().allocated_bytes()
                );
                log::trace!("{}", session.stats());
                Ok(module)
            }
            Err(err) => {
                session.fail(&err);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        expr: &Expr,
        session: &mut CompilationSession<'_>,
    ) -> CompileResult<CompiledModule> {
        session.advance(CompileStage::Lowering)?;
        let mut program = lower(expr, session.symbols_mut())?;
        session.record_program(&program);

        session.advance(CompileStage::Assembling)?;
        if self.config.fold_constants {
            let folds = fold_constants(&mut program);
            session.record_folds(folds);
        }
        check_linkage(&program)?;
        let assembled = ModuleAssembler::new(&self.runtime, self.config.slot_limit())
            .assemble(&program, session.symbols().len())?;

        session.advance(CompileStage::Validating)?;
        let depth = validate_program(&program)?;
        session.record_stack_depth(depth);
        if self.config.validate_module {
            validate_module(&assembled.bytes)?;
        }

        session.advance(CompileStage::Emitting)?;
        let module = CompiledModule::emit(
            assembled,
            session.symbols(),
            &program,
            self.config.disassembly,
        );
        session.record_module_size(module.len());

        session.advance(CompileStage::Done)?;
        Ok(module)
    }
}

/// Compile `expr` against `runtime` with the default configuration.
pub fn compile(expr: &Expr, runtime: Arc<RuntimeModule>) -> CompileResult<CompiledModule> {
    ExpressionCompiler::new(runtime).compile(expr)
}
