//! IR Builder
//!
//! Cursor-style construction: the builder borrows a module mutably, keeps an
//! insertion point, and appends instructions to the end of that block. Every
//! emission is validated before the module is touched, so a failed call
//! leaves the block unchanged.

use log::trace;
use crate::instructions::InstKind;
use crate::module::{Linkage, Module};
use crate::ops::{BinaryOp, CmpOp, IntPredicate};
use crate::typing;
use crate::types::TypeId;
use crate::values::{BlockId, FuncId, InstRef, Value};
use tir_common::{IrError, IrResult};

/// Builder for constructing IR
pub struct IrBuilder<'m> {
    module: &'m mut Module,
    insert_point: Option<BlockId>,
}

impl<'m> IrBuilder<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            insert_point: None,
        }
    }

    pub fn module(&self) -> &Module {
        &*self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    pub fn create_block(&mut self, func: FuncId, name: &str) -> IrResult<BlockId> {
        self.module.create_block(func, name)
    }

    /// Subsequent emissions append to the end of `block`
    pub fn set_insert_point(&mut self, block: BlockId) -> IrResult<()> {
        if self.module.block(block).is_none() {
            return Err(IrError::invalid_handle("block", block));
        }
        self.insert_point = Some(block);
        Ok(())
    }

    pub fn insert_block(&self) -> Option<BlockId> {
        self.insert_point
    }

    pub fn clear_insert_point(&mut self) {
        self.insert_point = None;
    }

    // ==================== Constants ====================

    pub fn const_int(&mut self, width: u32, value: i64) -> IrResult<Value> {
        let ty = self.module.get_integer_type(width);
        self.module.get_integer_constant(ty, value)
    }

    pub fn const_i32(&mut self, value: i32) -> IrResult<Value> {
        self.const_int(32, value as i64)
    }

    pub fn const_bool(&mut self, value: bool) -> IrResult<Value> {
        self.const_int(1, value as i64)
    }

    /// Private, unnamed_addr global holding a NUL-terminated string
    pub fn global_string(&mut self, name: &str, text: &str) -> IrResult<Value> {
        let init = self.module.get_string_constant(text);
        let global = self.module.add_global_constant(name, init, Linkage::Private)?;
        self.module.set_unnamed_addr(global, true)?;
        Ok(Value::Global(global))
    }

    // ==================== Arithmetic ====================

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.emit_value(InstKind::Binary { op, lhs, rhs }, name)
    }

    pub fn add_int(&mut self, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.binary(BinaryOp::Add, lhs, rhs, name)
    }

    pub fn sub_int(&mut self, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.binary(BinaryOp::Sub, lhs, rhs, name)
    }

    pub fn mul_int(&mut self, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.binary(BinaryOp::Mul, lhs, rhs, name)
    }

    pub fn shl(&mut self, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.binary(BinaryOp::Shl, lhs, rhs, name)
    }

    // ==================== Comparisons ====================

    pub fn compare(&mut self, pred: IntPredicate, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.emit_value(InstKind::ICmp { pred, lhs, rhs }, name)
    }

    pub fn compare_signed(&mut self, op: CmpOp, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.compare(IntPredicate::signed(op), lhs, rhs, name)
    }

    pub fn compare_unsigned(&mut self, op: CmpOp, lhs: Value, rhs: Value, name: &str) -> IrResult<Value> {
        self.compare(IntPredicate::unsigned(op), lhs, rhs, name)
    }

    // ==================== Memory ====================

    /// Stack slot for one value of `ty`; yields a pointer
    pub fn alloca_local(&mut self, ty: TypeId, name: &str) -> IrResult<Value> {
        self.emit_value(InstKind::Alloca { allocated: ty }, name)
    }

    pub fn load(&mut self, ty: TypeId, addr: Value, name: &str) -> IrResult<Value> {
        self.emit_value(InstKind::Load { ty, ptr: addr }, name)
    }

    pub fn store(&mut self, value: Value, addr: Value) -> IrResult<()> {
        self.emit(InstKind::Store { value, ptr: addr }, "")?;
        Ok(())
    }

    // ==================== Calls ====================

    /// Direct call. Returns `None` when the callee returns void.
    pub fn call(&mut self, callee: FuncId, args: &[Value], name: &str) -> IrResult<Option<Value>> {
        let inst = self.emit(
            InstKind::Call {
                callee,
                args: args.to_vec(),
            },
            name,
        )?;
        let produces_value = self
            .module
            .inst(inst)
            .is_some_and(|data| !self.module.types().is_void(data.result_type()));
        Ok(produces_value.then_some(Value::Inst(inst)))
    }

    // ==================== Terminators ====================

    pub fn branch_conditional(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) -> IrResult<()> {
        self.emit(
            InstKind::CondBr {
                cond,
                then_block,
                else_block,
            },
            "",
        )?;
        Ok(())
    }

    pub fn branch_unconditional(&mut self, target: BlockId) -> IrResult<()> {
        self.emit(InstKind::Br { target }, "")?;
        Ok(())
    }

    pub fn return_value(&mut self, value: Value) -> IrResult<()> {
        self.emit(InstKind::Ret { value: Some(value) }, "")?;
        Ok(())
    }

    pub fn return_void(&mut self) -> IrResult<()> {
        self.emit(InstKind::Ret { value: None }, "")?;
        Ok(())
    }

    fn emit_value(&mut self, kind: InstKind, name: &str) -> IrResult<Value> {
        self.emit(kind, name).map(Value::Inst)
    }

    fn emit(&mut self, kind: InstKind, name: &str) -> IrResult<InstRef> {
        let block = self.insert_point.ok_or(IrError::NoInsertPoint)?;
        if self.module.block(block).is_none() {
            return Err(IrError::invalid_handle("block", block));
        }
        if self.module.has_terminator(block) {
            return Err(IrError::BlockAlreadyTerminated {
                block: self.module.describe_block(block),
            });
        }

        let ty = typing::infer_result_type(&*self.module, block.func(), &kind)?;
        // Only value-producing instructions keep a debug name
        let name = if self.module.types().is_void(ty) { "" } else { name };
        trace!(
            "{}: {} -> {}",
            self.module.describe_block(block),
            kind.opcode(),
            self.module.types().display(ty)
        );
        self.module.push_inst(block, kind, ty, name)
    }
}
