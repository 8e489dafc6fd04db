//! Basic Block Management
//!
//! A block is an ordered list of instruction handles into its function's
//! arena. Predecessors and successors are not stored here; they are derived
//! from terminators (see `Module::successors` / `Module::predecessors`).

use serde::{Deserialize, Serialize};
use crate::values::InstRef;

/// Basic Block - a sequence of instructions with a single entry and exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    pub(crate) name: Option<String>,
    pub(crate) insts: Vec<InstRef>,
}

impl BlockData {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            insts: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Instruction handles in emission order
    pub fn insts(&self) -> &[InstRef] {
        &self.insts
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn last_inst(&self) -> Option<InstRef> {
        self.insts.last().copied()
    }
}
