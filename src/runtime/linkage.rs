// This module holds the static RuntimeLinkageTable: the names and arities of the functions the
// compiler may call inside the runtime module. The table reflects what this compiler build
// expects the linked runtime to export. It is consulted before encoding to reject any call the
// compiler does not know how to link; a miss there is a LinkageError, which signals a mismatch
// between compiler and runtime rather than a problem with the user's expression.

//! Static registry of runtime-callable math functions.

/// Numeric kind of runtime function parameters and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    F64,
}

/// One externally callable runtime function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFunctionDescriptor {
    pub name: &'static str,
    pub arity: u32,
    pub kind: NumericKind,
}

impl RuntimeFunctionDescriptor {
    const fn unary(name: &'static str) -> Self {
        Self {
            name,
            arity: 1,
            kind: NumericKind::F64,
        }
    }

    const fn binary(name: &'static str) -> Self {
        Self {
            name,
            arity: 2,
            kind: NumericKind::F64,
        }
    }
}

/// Every runtime function the compiler can link against.
pub static RUNTIME_FUNCTIONS: &[RuntimeFunctionDescriptor] = &[
    RuntimeFunctionDescriptor::unary("sin"),
    RuntimeFunctionDescriptor::unary("cos"),
    RuntimeFunctionDescriptor::unary("tan"),
    RuntimeFunctionDescriptor::unary("exp"),
    RuntimeFunctionDescriptor::unary("log"),
    RuntimeFunctionDescriptor::unary("log1p"),
    RuntimeFunctionDescriptor::unary("expm1"),
    RuntimeFunctionDescriptor::unary("asin"),
    RuntimeFunctionDescriptor::unary("acos"),
    RuntimeFunctionDescriptor::unary("atan"),
    RuntimeFunctionDescriptor::unary("sinh"),
    RuntimeFunctionDescriptor::unary("cosh"),
    RuntimeFunctionDescriptor::unary("tanh"),
    RuntimeFunctionDescriptor::unary("asinh"),
    RuntimeFunctionDescriptor::unary("acosh"),
    RuntimeFunctionDescriptor::unary("atanh"),
    RuntimeFunctionDescriptor::binary("pow"),
];

/// Find the descriptor for `name`.
pub fn lookup(name: &str) -> Option<&'static RuntimeFunctionDescriptor> {
    RUNTIME_FUNCTIONS.iter().find(|f| f.name == name)
}
