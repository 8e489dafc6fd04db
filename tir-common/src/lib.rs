//! Typed IR toolkit - Errors and Diagnostics
//! 
//! This crate contains the error type returned by IR construction calls and
//! the diagnostic types produced by the verifier. It is shared by the IR
//! library and the command line driver.

pub mod error;

pub use error::{Diagnostic, DiagnosticKind, DiagnosticReporter, IrError, IrResult, Severity};
