//! IR Operations
//!
//! Defines the binary operations and integer comparison predicates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary integer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add, Sub, Mul,
    SDiv, UDiv,    // Signed/unsigned division
    SRem, URem,    // Signed/unsigned remainder

    // Bitwise
    And, Or, Xor,
    Shl, LShr, AShr, // Logical/arithmetic shift right
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::UDiv => "udiv",
            BinaryOp::SRem => "srem",
            BinaryOp::URem => "urem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
        };
        write!(f, "{op_str}")
    }
}

/// Integer comparison predicates (`icmp`), always yielding `i1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntPredicate {
    Eq, Ne,
    Sgt, Sge, Slt, Sle, // Signed comparisons
    Ugt, Uge, Ult, Ule, // Unsigned comparisons
}

impl IntPredicate {
    pub fn signed(op: CmpOp) -> Self {
        match op {
            CmpOp::Eq => IntPredicate::Eq,
            CmpOp::Ne => IntPredicate::Ne,
            CmpOp::Gt => IntPredicate::Sgt,
            CmpOp::Ge => IntPredicate::Sge,
            CmpOp::Lt => IntPredicate::Slt,
            CmpOp::Le => IntPredicate::Sle,
        }
    }

    pub fn unsigned(op: CmpOp) -> Self {
        match op {
            CmpOp::Eq => IntPredicate::Eq,
            CmpOp::Ne => IntPredicate::Ne,
            CmpOp::Gt => IntPredicate::Ugt,
            CmpOp::Ge => IntPredicate::Uge,
            CmpOp::Lt => IntPredicate::Ult,
            CmpOp::Le => IntPredicate::Ule,
        }
    }
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pred_str = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Ugt => "ugt",
            IntPredicate::Uge => "uge",
            IntPredicate::Ult => "ult",
            IntPredicate::Ule => "ule",
        };
        write!(f, "{pred_str}")
    }
}

/// Signedness-neutral comparison, mapped to a predicate by
/// `IrBuilder::compare_signed` / `IrBuilder::compare_unsigned`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq, Ne, Gt, Ge, Lt, Le,
}
