//! Test module structure and failure behavior of expression compilation.
//!
//! These tests inspect the emitted bytes with wasmparser: the runtime module
//! must come through intact with exactly one new export, and every failure
//! must abort without an artifact.

mod common;

use exprwasm::core::MAX_SLOTS;
use exprwasm::runtime::bridge::scratch_memory;
use exprwasm::runtime::MEMORY_EXPORT;
use exprwasm::{
    BinaryOp, CompileError, CompilerConfig, Expr, ExpressionCompiler, RuntimeLoadError,
    RuntimeModule, UnaryOp,
};
use std::sync::Arc;
use wasm_encoder::{ExportKind, ExportSection, MemorySection, Module};
use wasmparser::{ExternalKind, FuncType, Parser, Payload, TypeRef, ValType};

/// Exports, function type indices (imports first) and types of a module.
struct Layout {
    exports: Vec<(String, ExternalKind, u32)>,
    functions: Vec<u32>,
    types: Vec<FuncType>,
}

fn layout(bytes: &[u8]) -> Layout {
    let mut layout = Layout {
        exports: Vec::new(),
        functions: Vec::new(),
        types: Vec::new(),
    };
    for payload in Parser::new(0).parse_all(bytes) {
        match payload.unwrap() {
            Payload::TypeSection(reader) => {
                for group in reader {
                    for ty in group.unwrap().into_types() {
                        layout.types.push(ty.unwrap_func().clone());
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    if let TypeRef::Func(index) = import.unwrap().ty {
                        layout.functions.push(index);
                    }
                }
            }
            Payload::FunctionSection(reader) => {
                for index in reader {
                    layout.functions.push(index.unwrap());
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.unwrap();
                    layout
                        .exports
                        .push((export.name.to_string(), export.kind, export.index));
                }
            }
            _ => {}
        }
    }
    layout
}

#[test]
fn test_exactly_one_export_is_added() {
    let compiler = common::compiler();
    let module = compiler
        .compile(&(Expr::symbol("x").sin() * Expr::symbol("y")))
        .unwrap();

    let before = layout(compiler.runtime().bytes());
    let after = layout(module.bytes());

    assert_eq!(after.exports.len(), before.exports.len() + 1);
    for export in &before.exports {
        assert!(after.exports.contains(export), "lost export {export:?}");
    }

    let added: Vec<_> = after
        .exports
        .iter()
        .filter(|e| !before.exports.contains(e))
        .collect();
    assert_eq!(added.len(), 1);
    let (name, kind, index) = added[0];
    assert_eq!(name, "executable");
    assert_eq!(*kind, ExternalKind::Func);
    assert_eq!(*index, module.function_index());

    let ty = &after.types[after.functions[*index as usize] as usize];
    assert_eq!(ty.params(), [ValType::I32, ValType::I32]);
    assert_eq!(ty.results(), [ValType::F64]);

    // Existing function indices and types are untouched.
    assert_eq!(&after.functions[..before.functions.len()], &before.functions[..]);
    assert_eq!(&after.types[..before.types.len()], &before.types[..]);
}

#[test]
fn test_compilation_is_deterministic() {
    let compiler = common::compiler();
    let t = Expr::symbol("t");
    let u = Expr::symbol("u");
    let expr = (t * 2.0).cos().exp() - u.pow(Expr::num(0.5));

    let first = compiler.compile(&expr).unwrap();
    let second = compiler.compile(&expr).unwrap();
    let fresh = common::compiler().compile(&expr).unwrap();
    assert_eq!(first.bytes(), second.bytes());
    assert_eq!(first.bytes(), fresh.bytes());
    assert_eq!(first.symbols(), ["t", "u"]);
}

#[test]
fn test_slots_follow_first_occurrence() {
    let (a, b, c) = (Expr::symbol("a"), Expr::symbol("b"), Expr::symbol("c"));
    let expr = c.clone() + a * c - b;
    let module = common::compiler().compile(&expr).unwrap();
    assert_eq!(module.symbols(), ["c", "a", "b"]);
    assert_eq!(module.slot_of("a"), Some(1));
    assert_eq!(module.slot_of("missing"), None);
}

#[test]
fn test_unsupported_operation_produces_no_module() {
    let compiler = common::compiler();

    let cases = [
        Expr::unary(UnaryOp::from_name("erf"), Expr::symbol("x")),
        Expr::binary(
            BinaryOp::from_name("atan2"),
            Expr::symbol("y"),
            Expr::symbol("x"),
        ),
        // Nested deep inside an otherwise valid tree.
        (Expr::symbol("x") + 1.0).sin()
            * Expr::unary(UnaryOp::from_name("gamma"), Expr::num(2.0)),
    ];
    for (expr, op) in cases.iter().zip(["erf", "atan2", "gamma"]) {
        assert_eq!(
            compiler.compile(expr).unwrap_err(),
            CompileError::UnsupportedOperation { op: op.into() }
        );
    }
}

#[test]
fn test_argument_count_exceeded() {
    let config = CompilerConfig::default().with_max_slots(3);
    let compiler = ExpressionCompiler::with_config(common::runtime(), config);

    let sum = |n: usize| {
        (1..n).fold(Expr::symbol("v0"), |acc, i| acc + Expr::symbol(format!("v{i}")))
    };
    assert_eq!(compiler.compile(&sum(3)).unwrap().slot_count(), 3);
    assert_eq!(
        compiler.compile(&sum(4)).unwrap_err(),
        CompileError::ArgumentCountExceeded { count: 4, limit: 3 }
    );
}

#[test]
fn test_max_slots_is_clamped() {
    let config = CompilerConfig::default().with_max_slots(usize::MAX);
    assert_eq!(config.slot_limit(), MAX_SLOTS);
}

#[test]
fn test_parallel_compilations_are_independent() {
    let runtime = common::runtime();
    let exprs: Vec<Expr> = (0..8)
        .map(|i| {
            let a = Expr::symbol(format!("a{i}"));
            let b = Expr::symbol(format!("b{i}"));
            (b * (i as f64)).sin() + a
        })
        .collect();

    let expected: Vec<_> = exprs
        .iter()
        .map(|e| ExpressionCompiler::new(Arc::clone(&runtime)).compile(e).unwrap())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = exprs
            .iter()
            .map(|expr| {
                let compiler = ExpressionCompiler::new(Arc::clone(&runtime));
                scope.spawn(move || compiler.compile(expr).unwrap())
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(&expected) {
            let module = handle.join().unwrap();
            assert_eq!(module.bytes(), expected.bytes());
            assert_eq!(module.symbols(), expected.symbols());
            assert_eq!(module.slot_of(&expected.symbols()[0]), Some(0));
        }
    });
}

#[test]
fn test_runtime_from_file() {
    let file = format!("exprwasm-runtime-{}.wasm", std::process::id());
    let path = std::env::temp_dir().join(file);
    std::fs::write(&path, exprwasm::bridge_runtime()).unwrap();

    let runtime = RuntimeModule::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let module = ExpressionCompiler::new(Arc::new(runtime))
        .compile(&Expr::symbol("x").ln())
        .unwrap();
    assert!(wasmparser::validate(module.bytes()).is_ok());
}

#[test]
fn test_runtime_without_math_is_a_linkage_error() {
    let mut memories = MemorySection::new();
    memories.memory(scratch_memory());
    let mut exports = ExportSection::new();
    exports.export(MEMORY_EXPORT, ExportKind::Memory, 0);
    let mut bare = Module::new();
    bare.section(&memories).section(&exports);

    let runtime = Arc::new(RuntimeModule::from_bytes(bare.finish()).unwrap());
    let compiler = ExpressionCompiler::new(runtime);

    assert_eq!(
        compiler.compile(&Expr::symbol("x").sin()).unwrap_err(),
        CompileError::LinkageError { name: "sin".into() }
    );
    // Arithmetic alone needs nothing from the runtime.
    assert!(compiler.compile(&(Expr::symbol("x") * 2.0)).is_ok());
}

#[test]
fn test_runtime_rejects_component() {
    // Component-model preamble: version 0x0d, layer 1.
    let component = b"\0asm\x0d\0\x01\0".to_vec();
    assert!(matches!(
        RuntimeModule::from_bytes(component),
        Err(RuntimeLoadError::NotCoreModule)
    ));
}

#[test]
fn test_validation_can_be_disabled() {
    let config = CompilerConfig::default().with_validation(false);
    let module = ExpressionCompiler::with_config(common::runtime(), config)
        .compile(&Expr::symbol("x").sqrt())
        .unwrap();
    assert!(wasmparser::validate(module.bytes()).is_ok());
}
