//! IR Value Representations
//!
//! Values are small copyable handles. The data they name (argument,
//! instruction result, constant, global, function) is owned by the module;
//! consumers only ever hold references by handle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use crate::types::TypeId;

/// Handle to a function in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncId(pub(crate) u32);

/// Handle to a global object in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalId(pub(crate) u32);

/// Handle to a uniqued constant in a module's constant pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstId(pub(crate) u32);

/// Handle to a basic block: the owning function plus its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    pub(crate) func: FuncId,
    pub(crate) index: u32,
}

/// Handle to an instruction in its function's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstRef {
    pub(crate) func: FuncId,
    pub(crate) index: u32,
}

/// Handle to a formal argument of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArgRef {
    pub(crate) func: FuncId,
    pub(crate) index: u32,
}

impl FuncId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl GlobalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    pub fn func(self) -> FuncId {
        self.func
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl InstRef {
    pub fn func(self) -> FuncId {
        self.func
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl ArgRef {
    pub fn func(self) -> FuncId {
        self.func
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:bb{}", self.func, self.index)
    }
}

/// IR Value - an operand usable by instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Formal argument of the enclosing function
    Argument(ArgRef),

    /// Result of an instruction
    Inst(InstRef),

    /// Uniqued constant
    Constant(ConstId),

    /// Address of a global object
    Global(GlobalId),

    /// Address of a function
    Function(FuncId),
}

impl Value {
    /// Function that owns the definition, for function-local values
    pub fn owner(self) -> Option<FuncId> {
        match self {
            Value::Argument(arg) => Some(arg.func),
            Value::Inst(inst) => Some(inst.func),
            Value::Constant(_) | Value::Global(_) | Value::Function(_) => None,
        }
    }

    pub fn as_inst(self) -> Option<InstRef> {
        match self {
            Value::Inst(inst) => Some(inst),
            _ => None,
        }
    }
}

impl From<ArgRef> for Value {
    fn from(arg: ArgRef) -> Self {
        Value::Argument(arg)
    }
}

impl From<InstRef> for Value {
    fn from(inst: InstRef) -> Self {
        Value::Inst(inst)
    }
}

impl From<ConstId> for Value {
    fn from(id: ConstId) -> Self {
        Value::Constant(id)
    }
}

impl From<GlobalId> for Value {
    fn from(id: GlobalId) -> Self {
        Value::Global(id)
    }
}

impl From<FuncId> for Value {
    fn from(id: FuncId) -> Self {
        Value::Function(id)
    }
}

/// Payload of a constant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstKind {
    /// Integer bits, already truncated to the type's width
    Int(u64),

    /// Raw bytes of an `[N x i8]` array
    Bytes(Vec<u8>),

    /// The null pointer
    Null,

    /// All-zero aggregate
    Zero,
}

/// A constant together with its type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantData {
    pub ty: TypeId,
    pub kind: ConstKind,
}

impl ConstantData {
    /// Interpret an integer payload of `width` bits as a signed number
    pub fn as_signed(&self, width: u32) -> Option<i64> {
        match self.kind {
            ConstKind::Int(bits) => Some(sign_extend(bits, width)),
            _ => None,
        }
    }
}

/// Mask `value` down to `width` bits (two's-complement wraparound)
pub(crate) fn truncate_to_width(value: i64, width: u32) -> u64 {
    let bits = value as u64;
    if width >= 64 {
        bits
    } else {
        bits & ((1u64 << width) - 1)
    }
}

pub(crate) fn sign_extend(bits: u64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return bits as i64;
    }
    let shift = 64 - width;
    ((bits << shift) as i64) >> shift
}

/// Uniqued storage for a module's constants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ConstantData>", into = "Vec<ConstantData>")]
pub struct ConstantPool {
    constants: Vec<ConstantData>,
    lookup: HashMap<ConstantData, ConstId>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, data: ConstantData) -> ConstId {
        if let Some(&id) = self.lookup.get(&data) {
            return id;
        }
        let id = ConstId(self.constants.len() as u32);
        self.constants.push(data.clone());
        self.lookup.insert(data, id);
        id
    }

    pub fn get(&self, id: ConstId) -> Option<&ConstantData> {
        self.constants.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

impl From<Vec<ConstantData>> for ConstantPool {
    fn from(constants: Vec<ConstantData>) -> Self {
        let mut lookup = HashMap::with_capacity(constants.len());
        for (i, data) in constants.iter().enumerate() {
            lookup.entry(data.clone()).or_insert(ConstId(i as u32));
        }
        Self { constants, lookup }
    }
}

impl From<ConstantPool> for Vec<ConstantData> {
    fn from(pool: ConstantPool) -> Self {
        pool.constants
    }
}
