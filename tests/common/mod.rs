//! Shared helpers for the integration tests.
//!
//! Modules are compiled against the bridge runtime, so every test host
//! supplies the math functions through `wasmtime` imports backed by Rust's
//! own `f64` routines.

#![allow(dead_code)]

use exprwasm::runtime::HOST_MODULE;
use exprwasm::{bridge_runtime, CompiledModule, ExpressionCompiler, RuntimeModule};
use std::sync::Arc;
use wasmtime::{Engine, Linker, Module, Store};

/// Offset of the argument buffer in linear memory.
pub const ARGS_OFFSET: usize = 1024;

const UNARY_HOST_FUNCTIONS: &[(&str, fn(f64) -> f64)] = &[
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("log1p", f64::ln_1p),
    ("expm1", f64::exp_m1),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("atan", f64::atan),
    ("sinh", f64::sinh),
    ("cosh", f64::cosh),
    ("tanh", f64::tanh),
    ("asinh", f64::asinh),
    ("acosh", f64::acosh),
    ("atanh", f64::atanh),
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn runtime() -> Arc<RuntimeModule> {
    init_logging();
    Arc::new(RuntimeModule::from_bytes(bridge_runtime()).unwrap())
}

pub fn compiler() -> ExpressionCompiler {
    ExpressionCompiler::new(runtime())
}

/// Host that instantiates compiled modules with native math imports.
pub struct Host {
    engine: Engine,
    linker: Linker<()>,
}

impl Host {
    pub fn new() -> Self {
        let engine = Engine::default();
        let mut linker = Linker::new(&engine);
        for &(name, f) in UNARY_HOST_FUNCTIONS {
            linker
                .func_wrap(HOST_MODULE, name, move |x: f64| f(x))
                .unwrap();
        }
        linker
            .func_wrap(HOST_MODULE, "pow", |x: f64, y: f64| x.powf(y))
            .unwrap();
        Self { engine, linker }
    }

    /// Run `module` with `args` bound by symbol name.
    pub fn eval(&self, module: &CompiledModule, args: &[(&str, f64)]) -> f64 {
        let buffer = module
            .argument_buffer(|name| {
                args.iter()
                    .find(|(symbol, _)| *symbol == name)
                    .map(|&(_, value)| value)
            })
            .expect("every symbol bound");
        self.eval_buffer(module, &buffer)
    }

    /// Run `module` against a pre-packed argument buffer.
    pub fn eval_buffer(&self, module: &CompiledModule, buffer: &[u8]) -> f64 {
        let wasm = Module::new(&self.engine, module.bytes()).unwrap();
        let mut store = Store::new(&self.engine, ());
        let instance = self.linker.instantiate(&mut store, &wasm).unwrap();

        let memory = instance.get_memory(&mut store, "memory").unwrap();
        memory.write(&mut store, ARGS_OFFSET, buffer).unwrap();

        let entry = instance
            .get_typed_func::<(i32, i32), f64>(&mut store, module.export_name())
            .unwrap();
        entry
            .call(&mut store, (ARGS_OFFSET as i32, module.slot_count() as i32))
            .unwrap()
    }
}
