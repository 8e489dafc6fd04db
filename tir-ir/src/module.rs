//! Module and Global Objects
//!
//! The module is the top-level owner: it holds the type context, the
//! constant pool, every function and global, and the symbol table shared by
//! functions and globals. Dropping the module drops everything in it.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::blocks::BlockData;
use crate::function::FunctionData;
use crate::instructions::{InstData, InstKind};
use crate::printer;
use crate::types::{TypeContext, TypeId};
use crate::values::{ArgRef, BlockId, ConstId, ConstantPool, FuncId, GlobalId, InstRef, Value};
use crate::verifier::{self, VerificationReport, VerifierConfig};
use tir_common::{IrError, IrResult};

/// Linkage types for global symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    External,  // Visible to other modules
    Internal,  // Only visible within this module
    Private,   // Internal, and omitted from any symbol table
}

impl Linkage {
    pub fn is_local(self) -> bool {
        !matches!(self, Linkage::External)
    }
}

/// Whether a global's storage may change after initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalKind {
    Constant,
    Variable,
}

/// Global object definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalData {
    pub(crate) name: String,
    pub(crate) kind: GlobalKind,
    pub(crate) value_type: TypeId,
    pub(crate) initializer: ConstId,
    pub(crate) linkage: Linkage,
    pub(crate) unnamed_addr: bool,
}

impl GlobalData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GlobalKind {
        self.kind
    }

    pub fn is_constant(&self) -> bool {
        self.kind == GlobalKind::Constant
    }

    /// Type of the stored value (the global itself is a pointer)
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    pub fn initializer(&self) -> ConstId {
        self.initializer
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn unnamed_addr(&self) -> bool {
        self.unnamed_addr
    }
}

/// What a module-level name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    Function(FuncId),
    Global(GlobalId),
}

/// IR Module - represents a complete compilation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) types: TypeContext,
    pub(crate) constants: ConstantPool,
    pub(crate) functions: Vec<FunctionData>,
    pub(crate) globals: Vec<GlobalData>,
    pub(crate) symbols: BTreeMap<String, Symbol>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: TypeContext::new(),
            constants: ConstantPool::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            symbols: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &TypeContext {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeContext {
        &mut self.types
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    // ==================== Type shortcuts ====================

    pub fn get_integer_type(&mut self, width: u32) -> TypeId {
        self.types.get_integer_type(width)
    }

    pub fn get_pointer_type(&self) -> TypeId {
        self.types.get_pointer_type()
    }

    pub fn void_type(&self) -> TypeId {
        self.types.void_type()
    }

    pub fn get_array_type(&mut self, element: TypeId, len: u64) -> IrResult<TypeId> {
        self.types.get_array_type(element, len)
    }

    pub fn get_function_type(&mut self, ret: TypeId, params: Vec<TypeId>, is_vararg: bool) -> IrResult<TypeId> {
        self.types.get_function_type(ret, params, is_vararg)
    }

    // ==================== Functions ====================

    /// Create a function with no blocks and arguments bound per `ty`
    pub fn create_function(&mut self, ty: TypeId, name: &str, linkage: Linkage) -> IrResult<FuncId> {
        self.types.check(ty)?;
        let params = match self.types.function_signature(ty) {
            Some((_, params, _)) => params.to_vec(),
            None => {
                return Err(IrError::type_mismatch(
                    format!("signature of '@{name}'"),
                    "function type",
                    self.types.display(ty).to_string(),
                ))
            }
        };
        self.check_symbol_free(name)?;

        let id = FuncId(self.functions.len() as u32);
        self.functions.push(FunctionData::new(id, name.to_string(), ty, linkage, &params));
        self.symbols.insert(name.to_string(), Symbol::Function(id));
        debug!("created function @{} : {}", name, self.types.display(ty));
        Ok(id)
    }

    /// Declare an external function (a prototype with no body)
    pub fn declare_function(&mut self, ty: TypeId, name: &str) -> IrResult<FuncId> {
        self.create_function(ty, name, Linkage::External)
    }

    /// Return the function called `name`, declaring it if it does not exist
    pub fn get_or_insert_function(&mut self, name: &str, ty: TypeId) -> IrResult<FuncId> {
        match self.symbols.get(name).copied() {
            Some(Symbol::Function(id)) => {
                let existing = self
                    .function(id)
                    .map(FunctionData::signature)
                    .ok_or_else(|| IrError::invalid_handle("function", id))?;
                if existing == ty {
                    Ok(id)
                } else {
                    Err(IrError::type_mismatch(
                        format!("redeclaration of '@{name}'"),
                        self.types.display(existing).to_string(),
                        self.types.display(ty).to_string(),
                    ))
                }
            }
            Some(Symbol::Global(_)) => Err(IrError::DuplicateSymbol { name: name.to_string() }),
            None => self.declare_function(ty, name),
        }
    }

    pub fn set_arg_name(&mut self, arg: ArgRef, name: &str) -> IrResult<()> {
        let data = self
            .functions
            .get_mut(arg.func.index())
            .and_then(|func| func.args.get_mut(arg.index()))
            .ok_or_else(|| IrError::invalid_handle("argument", arg))?;
        data.name = non_empty(name);
        Ok(())
    }

    pub fn function(&self, id: FuncId) -> Option<&FunctionData> {
        self.functions.get(id.index())
    }

    pub(crate) fn function_mut(&mut self, id: FuncId) -> Option<&mut FunctionData> {
        self.functions.get_mut(id.index())
    }

    pub fn functions(&self) -> &[FunctionData] {
        &self.functions
    }

    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        match self.symbols.get(name) {
            Some(Symbol::Function(id)) => Some(*id),
            _ => None,
        }
    }

    // ==================== Blocks ====================

    /// Append an empty block to `func`
    pub fn create_block(&mut self, func: FuncId, name: &str) -> IrResult<BlockId> {
        let function = self
            .function_mut(func)
            .ok_or_else(|| IrError::invalid_handle("function", func))?;
        let block = BlockId {
            func,
            index: function.blocks.len() as u32,
        };
        function.blocks.push(BlockData::new(non_empty(name)));
        debug!("created block {} in @{}", block, function.name);
        Ok(block)
    }

    pub fn block(&self, block: BlockId) -> Option<&BlockData> {
        self.function(block.func)?.block(block)
    }

    pub fn inst(&self, inst: InstRef) -> Option<&InstData> {
        self.function(inst.func)?.inst(inst)
    }

    pub fn has_terminator(&self, block: BlockId) -> bool {
        self.function(block.func)
            .and_then(|func| func.terminator(block))
            .is_some()
    }

    /// Human-readable path of a block, e.g. `@main/%entry` or `@f/%1`.
    ///
    /// Labels match the printed text, slot numbers included.
    pub fn describe_block(&self, block: BlockId) -> String {
        let Some(func) = self.function(block.func) else {
            return block.to_string();
        };
        match printer::block_labels(self, func).get(block.index()) {
            Some(label) => format!("@{}/%{}", func.name, label),
            None => format!("@{}/%<badref>", func.name),
        }
    }

    /// Append an instruction; callers validate operands beforehand
    pub(crate) fn push_inst(&mut self, block: BlockId, kind: InstKind, ty: TypeId, name: &str) -> IrResult<InstRef> {
        let function = self
            .function_mut(block.func)
            .ok_or_else(|| IrError::invalid_handle("block", block))?;
        let inst = InstRef {
            func: block.func,
            index: function.insts.len() as u32,
        };
        function
            .block_mut(block)
            .ok_or_else(|| IrError::invalid_handle("block", block))?
            .insts
            .push(inst);
        function.insts.push(InstData {
            kind,
            ty,
            name: non_empty(name),
            block,
        });
        Ok(inst)
    }

    // ==================== Globals ====================

    /// Add a mutable global initialized with a constant of type `ty`
    pub fn add_global_variable(&mut self, name: &str, ty: TypeId, initializer: Value, linkage: Linkage) -> IrResult<GlobalId> {
        self.add_global(name, GlobalKind::Variable, Some(ty), initializer, linkage)
    }

    /// Add an immutable global whose type is that of its initializer
    pub fn add_global_constant(&mut self, name: &str, initializer: Value, linkage: Linkage) -> IrResult<GlobalId> {
        self.add_global(name, GlobalKind::Constant, None, initializer, linkage)
    }

    fn add_global(
        &mut self,
        name: &str,
        kind: GlobalKind,
        declared: Option<TypeId>,
        initializer: Value,
        linkage: Linkage,
    ) -> IrResult<GlobalId> {
        if let Some(ty) = declared {
            self.types.check(ty)?;
        }
        let context = format!("initializer of '@{name}'");
        let (init_id, init_ty) = match initializer {
            Value::Constant(id) => match self.constants.get(id) {
                Some(data) => (id, data.ty),
                None => return Err(IrError::invalid_handle("constant", id)),
            },
            other => {
                return Err(IrError::type_mismatch(context, "constant", format!("{other:?}")));
            }
        };
        let value_type = declared.unwrap_or(init_ty);
        if !self.types.is_sized(value_type) {
            return Err(IrError::type_mismatch(
                format!("type of '@{name}'"),
                "sized type",
                self.types.display(value_type).to_string(),
            ));
        }
        if init_ty != value_type {
            return Err(IrError::type_mismatch(
                context,
                self.types.display(value_type).to_string(),
                self.types.display(init_ty).to_string(),
            ));
        }
        self.check_symbol_free(name)?;

        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(GlobalData {
            name: name.to_string(),
            kind,
            value_type,
            initializer: init_id,
            linkage,
            unnamed_addr: false,
        });
        self.symbols.insert(name.to_string(), Symbol::Global(id));
        debug!("added global @{} : {}", name, self.types.display(value_type));
        Ok(id)
    }

    /// Mark a global's address as insignificant (only its contents matter)
    pub fn set_unnamed_addr(&mut self, global: GlobalId, unnamed_addr: bool) -> IrResult<()> {
        let data = self
            .globals
            .get_mut(global.index())
            .ok_or_else(|| IrError::invalid_handle("global", global))?;
        data.unnamed_addr = unnamed_addr;
        Ok(())
    }

    pub fn global(&self, id: GlobalId) -> Option<&GlobalData> {
        self.globals.get(id.index())
    }

    pub fn globals(&self) -> &[GlobalData] {
        &self.globals
    }

    pub fn global_by_name(&self, name: &str) -> Option<GlobalId> {
        match self.symbols.get(name) {
            Some(Symbol::Global(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    fn check_symbol_free(&self, name: &str) -> IrResult<()> {
        if self.symbols.contains_key(name) {
            return Err(IrError::DuplicateSymbol { name: name.to_string() });
        }
        Ok(())
    }

    // ==================== Values ====================

    /// Type of a value, or `None` if the handle does not resolve
    pub fn value_type(&self, value: Value) -> Option<TypeId> {
        match value {
            Value::Argument(arg) => self.function(arg.func)?.arg_data(arg).map(|a| a.ty),
            Value::Inst(inst) => self.inst(inst).map(|i| i.ty),
            Value::Constant(id) => self.constants.get(id).map(|c| c.ty),
            Value::Global(id) => self.global(id).map(|_| self.types.get_pointer_type()),
            Value::Function(id) => self.function(id).map(|_| self.types.get_pointer_type()),
        }
    }

    /// Debug name of a value, if it has one
    pub fn value_name(&self, value: Value) -> Option<&str> {
        match value {
            Value::Argument(arg) => self.function(arg.func)?.arg_data(arg)?.name(),
            Value::Inst(inst) => self.inst(inst)?.name(),
            Value::Constant(_) => None,
            Value::Global(id) => self.global(id).map(GlobalData::name),
            Value::Function(id) => self.function(id).map(FunctionData::name),
        }
    }

    // ==================== Verification & serialization ====================

    /// Run the verifier with the default configuration.
    ///
    /// Returns the report (warnings only) on success, or
    /// `IrError::VerificationFailed` carrying every diagnostic.
    pub fn verify(&self) -> IrResult<VerificationReport> {
        self.verify_with(&VerifierConfig::default())
    }

    pub fn verify_with(&self, config: &VerifierConfig) -> IrResult<VerificationReport> {
        verifier::verify_module(self, config).into_result()
    }

    /// Verify one function with the default configuration
    pub fn verify_function(&self, func: FuncId) -> IrResult<VerificationReport> {
        verifier::verify_function(self, func, &VerifierConfig::default()).into_result()
    }

    pub fn to_json(&self) -> IrResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| IrError::Serialization { message: e.to_string() })
    }

    pub fn from_json(json: &str) -> IrResult<Self> {
        serde_json::from_str(json).map_err(|e| IrError::Serialization { message: e.to_string() })
    }
}

pub(crate) fn non_empty(name: &str) -> Option<String> {
    (!name.is_empty()).then(|| name.to_string())
}
