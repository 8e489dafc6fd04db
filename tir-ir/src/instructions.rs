//! IR Instructions
//!
//! The instruction set is a closed enum: each kind has a fixed operand
//! shape, so the builder, verifier and printer match on it exhaustively.

use serde::{Deserialize, Serialize};
use crate::ops::{BinaryOp, IntPredicate};
use crate::types::TypeId;
use crate::values::{BlockId, FuncId, Value};

/// Operation kind and operands of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    /// Binary integer operation: result = op ty lhs, rhs
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },

    /// Integer comparison: result = icmp pred ty lhs, rhs
    ICmp {
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },

    /// Allocate a stack slot: result = alloca ty
    Alloca { allocated: TypeId },

    /// Load from memory: result = load ty, ptr
    Load { ty: TypeId, ptr: Value },

    /// Store to memory: store value, ptr
    Store { value: Value, ptr: Value },

    /// Direct call: result = call callee(args...)
    Call { callee: FuncId, args: Vec<Value> },

    /// Unconditional branch: br label
    Br { target: BlockId },

    /// Conditional branch: br i1 cond, label then, label else
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },

    /// Return: ret value or ret void
    Ret { value: Option<Value> },
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(self, InstKind::Br { .. } | InstKind::CondBr { .. } | InstKind::Ret { .. })
    }

    /// Value operands, in printing order
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Binary { lhs, rhs, .. } | InstKind::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstKind::Alloca { .. } => Vec::new(),
            InstKind::Load { ptr, .. } => vec![*ptr],
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Br { .. } => Vec::new(),
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Ret { value } => value.iter().copied().collect(),
        }
    }

    /// Control-flow targets of a terminator, empty for everything else
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            InstKind::Br { target } => vec![*target],
            InstKind::CondBr { then_block, else_block, .. } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }

    /// Mnemonic used in the textual form
    pub fn opcode(&self) -> String {
        match self {
            InstKind::Binary { op, .. } => op.to_string(),
            InstKind::ICmp { .. } => "icmp".to_string(),
            InstKind::Alloca { .. } => "alloca".to_string(),
            InstKind::Load { .. } => "load".to_string(),
            InstKind::Store { .. } => "store".to_string(),
            InstKind::Call { .. } => "call".to_string(),
            InstKind::Br { .. } | InstKind::CondBr { .. } => "br".to_string(),
            InstKind::Ret { .. } => "ret".to_string(),
        }
    }
}

/// An instruction placed in a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstData {
    pub(crate) kind: InstKind,
    /// Result type; void when the instruction produces no value
    pub(crate) ty: TypeId,
    pub(crate) name: Option<String>,
    pub(crate) block: BlockId,
}

impl InstData {
    pub fn kind(&self) -> &InstKind {
        &self.kind
    }

    pub fn result_type(&self) -> TypeId {
        self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }
}
