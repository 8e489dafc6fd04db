//! Function Definitions
//!
//! A function owns its arguments, its blocks and an arena holding every
//! instruction emitted into those blocks. A function with no blocks is a
//! declaration of an external symbol.

use serde::{Deserialize, Serialize};
use crate::blocks::BlockData;
use crate::instructions::InstData;
use crate::module::Linkage;
use crate::types::TypeId;
use crate::values::{ArgRef, BlockId, FuncId, InstRef};

/// Formal argument, bound from the signature's parameter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentData {
    pub(crate) ty: TypeId,
    pub(crate) name: Option<String>,
}

impl ArgumentData {
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Function in IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionData {
    pub(crate) id: FuncId,
    pub(crate) name: String,
    pub(crate) ty: TypeId,
    pub(crate) linkage: Linkage,
    pub(crate) args: Vec<ArgumentData>,
    pub(crate) blocks: Vec<BlockData>,
    pub(crate) insts: Vec<InstData>,
}

impl FunctionData {
    pub(crate) fn new(id: FuncId, name: String, ty: TypeId, linkage: Linkage, params: &[TypeId]) -> Self {
        Self {
            id,
            name,
            ty,
            linkage,
            args: params
                .iter()
                .map(|&ty| ArgumentData { ty, name: None })
                .collect(),
            blocks: Vec::new(),
            insts: Vec::new(),
        }
    }

    pub fn id(&self) -> FuncId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function type this function was created with
    pub fn signature(&self) -> TypeId {
        self.ty
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn args(&self) -> &[ArgumentData] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<ArgRef> {
        (index < self.args.len()).then_some(ArgRef {
            func: self.id,
            index: index as u32,
        })
    }

    pub fn arg_data(&self, arg: ArgRef) -> Option<&ArgumentData> {
        if arg.func != self.id {
            return None;
        }
        self.args.get(arg.index())
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        (!self.blocks.is_empty()).then_some(BlockId {
            func: self.id,
            index: 0,
        })
    }

    /// Block handles in layout order
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.blocks.len()).map(move |index| BlockId {
            func: self.id,
            index: index as u32,
        })
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, block: BlockId) -> Option<&BlockData> {
        if block.func != self.id {
            return None;
        }
        self.blocks.get(block.index())
    }

    pub(crate) fn block_mut(&mut self, block: BlockId) -> Option<&mut BlockData> {
        if block.func != self.id {
            return None;
        }
        self.blocks.get_mut(block.index())
    }

    pub fn inst(&self, inst: InstRef) -> Option<&InstData> {
        if inst.func != self.id {
            return None;
        }
        self.insts.get(inst.index())
    }

    /// Number of instructions placed in blocks
    pub fn inst_count(&self) -> usize {
        self.blocks.iter().map(BlockData::len).sum()
    }

    /// Terminator of `block`, if its last instruction is one
    pub fn terminator(&self, block: BlockId) -> Option<&InstData> {
        let last = self.block(block)?.last_inst()?;
        self.inst(last).filter(|inst| inst.is_terminator())
    }
}
