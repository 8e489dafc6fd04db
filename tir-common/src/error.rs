//! Error handling for the typed IR toolkit
//!
//! `IrError` is returned synchronously by every construction call that can
//! fail. `Diagnostic` is the structured record the verifier emits for each
//! rule violation, and `DiagnosticReporter` collects them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or validating IR
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("block {block} already ends in a terminator")]
    BlockAlreadyTerminated { block: String },

    #[error("symbol '@{name}' is already defined in this module")]
    DuplicateSymbol { name: String },

    #[error("branch target {target} is not part of function '@{function}'")]
    UnknownTarget { function: String, target: String },

    #[error("value {value} belongs to '@{owner}' and cannot be used in '@{function}'")]
    ForeignValue {
        value: String,
        owner: String,
        function: String,
    },

    #[error("invalid {kind} handle: {handle}")]
    InvalidHandle { kind: &'static str, handle: String },

    #[error("no insertion point is set")]
    NoInsertPoint,

    #[error("module verification failed: {}", summarize(.diagnostics))]
    VerificationFailed { diagnostics: Vec<Diagnostic> },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

pub type IrResult<T> = Result<T, IrError>;

impl IrError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        IrError::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid handle error
    pub fn invalid_handle(kind: &'static str, handle: impl fmt::Debug) -> Self {
        IrError::InvalidHandle {
            kind,
            handle: format!("{handle:?}"),
        }
    }

    /// Diagnostics carried by a verification failure, empty for other errors
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            IrError::VerificationFailed { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    plural_summary(errors, warnings)
}

fn plural_summary(errors: usize, warnings: usize) -> String {
    match (errors, warnings) {
        (0, 0) => "No errors or warnings".to_string(),
        (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
        (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
        (e, w) => format!(
            "{} error{} and {} warning{}",
            e,
            if e == 1 { "" } else { "s" },
            w,
            if w == 1 { "" } else { "s" }
        ),
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// The structural rule a diagnostic reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    EmptyBlock,
    MissingTerminator,
    TerminatorNotLast,
    InvalidOperand,
    ForeignValue,
    UseBeforeDef,
    DefDoesNotDominateUse,
    UnknownTarget,
    SignatureMismatch,
    UnreachableBlock,
    ReturnTypeMismatch,
    TypeMismatch,
    InvalidType,
    InvalidLinkage,
    DuplicateSymbol,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::EmptyBlock => "empty-block",
            DiagnosticKind::MissingTerminator => "missing-terminator",
            DiagnosticKind::TerminatorNotLast => "terminator-not-last",
            DiagnosticKind::InvalidOperand => "invalid-operand",
            DiagnosticKind::ForeignValue => "foreign-value",
            DiagnosticKind::UseBeforeDef => "use-before-def",
            DiagnosticKind::DefDoesNotDominateUse => "def-does-not-dominate-use",
            DiagnosticKind::UnknownTarget => "unknown-target",
            DiagnosticKind::SignatureMismatch => "signature-mismatch",
            DiagnosticKind::UnreachableBlock => "unreachable-block",
            DiagnosticKind::ReturnTypeMismatch => "return-type-mismatch",
            DiagnosticKind::TypeMismatch => "type-mismatch",
            DiagnosticKind::InvalidType => "invalid-type",
            DiagnosticKind::InvalidLinkage => "invalid-linkage",
            DiagnosticKind::DuplicateSymbol => "duplicate-symbol",
        };
        write!(f, "{name}")
    }
}

/// A verifier finding: what rule, which entity, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Path of the offending entity, e.g. `@main/%entry`
    pub entity: String,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            entity: entity.into(),
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn warning(kind: DiagnosticKind, entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            entity: entity.into(),
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}: {}", self.severity, self.kind, self.entity, self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }

        Ok(())
    }
}

/// Collects diagnostics and keeps error/warning counts
#[derive(Debug, Default)]
pub struct DiagnosticReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    /// Stop recording after this many diagnostics (0 = unlimited)
    limit: usize,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Record a diagnostic. Returns `false` once the limit has been reached.
    pub fn report(&mut self, diagnostic: Diagnostic) -> bool {
        if self.is_full() {
            return false;
        }
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);
        true
    }

    pub fn is_full(&self) -> bool {
        self.limit != 0 && self.diagnostics.len() >= self.limit
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        plural_summary(self.error_count, self.warning_count)
    }
}
