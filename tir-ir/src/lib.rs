//! Typed IR toolkit - SSA Intermediate Representation
//!
//! This crate defines a typed, single-assignment IR in the style of LLVM:
//! modules own functions and globals, functions own basic blocks, and every
//! block ends in exactly one terminator.
//!
//! ## Architecture
//!
//! - `types` - Interned type system scoped to a module
//! - `values` - Value handles and the constant pool
//! - `ops` - Binary operations and comparison predicates
//! - `instructions` - The closed instruction set
//! - `blocks` - Basic block storage
//! - `function` - Function definitions and declarations
//! - `module` - Module, globals and the symbol table
//! - `builder` - Cursor-based instruction emission
//! - `cfg` - Derived control flow and dominators
//! - `verifier` - Structural well-formedness checks
//! - `printer` - Canonical textual form
//! - `samples` - Ready-made modules used by the driver and tests

pub mod types;
pub mod values;
pub mod ops;
pub mod instructions;
pub mod blocks;
pub mod function;
pub mod module;
pub mod builder;
pub mod cfg;
pub mod verifier;
pub mod printer;
pub mod samples;

mod constants;
mod typing;

#[cfg(test)]
mod tests;

pub use types::{TypeContext, TypeData, TypeId};
pub use values::{ArgRef, BlockId, ConstId, ConstKind, ConstantData, FuncId, GlobalId, InstRef, Value};
pub use ops::{BinaryOp, CmpOp, IntPredicate};
pub use instructions::{InstData, InstKind};
pub use blocks::BlockData;
pub use function::{ArgumentData, FunctionData};
pub use module::{GlobalData, GlobalKind, Linkage, Module, Symbol};
pub use builder::IrBuilder;
pub use cfg::{ControlFlowGraph, DominatorTree};
pub use verifier::{verify_function, verify_module, VerificationReport, VerifierConfig};
pub use printer::print_module;
pub use tir_common::{Diagnostic, DiagnosticKind, IrError, IrResult, Severity};
