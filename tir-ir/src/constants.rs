//! Constant construction on `Module`

use log::debug;
use crate::module::Module;
use crate::types::{TypeData, TypeId};
use crate::values::{sign_extend, truncate_to_width, ConstKind, ConstantData, Value};
use tir_common::{IrError, IrResult};

impl Module {
    /// Get the uniqued integer constant `value` of type `ty`.
    ///
    /// Literals that do not fit are wrapped to the type's width.
    pub fn get_integer_constant(&mut self, ty: TypeId, value: i64) -> IrResult<Value> {
        self.types.check(ty)?;
        let width = self.types.int_width(ty).ok_or_else(|| {
            IrError::type_mismatch(
                "integer constant",
                "integer type",
                self.types.display(ty).to_string(),
            )
        })?;
        let bits = truncate_to_width(value, width);
        if sign_extend(bits, width) != value && bits != value as u64 {
            debug!("constant {} truncated to i{} value {}", value, width, bits);
        }
        let id = self.constants.intern(ConstantData {
            ty,
            kind: ConstKind::Int(bits),
        });
        Ok(Value::Constant(id))
    }

    /// NUL-terminated character array `[len+1 x i8]`
    pub fn get_string_constant(&mut self, text: &str) -> Value {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.get_bytes_constant(bytes)
    }

    /// Raw `[len x i8]` array, no terminator added
    pub fn get_bytes_constant(&mut self, bytes: Vec<u8>) -> Value {
        let i8_ty = self.types.get_integer_type(8);
        let ty = self.types.intern(TypeData::Array {
            element: i8_ty,
            len: bytes.len() as u64,
        });
        let id = self.constants.intern(ConstantData {
            ty,
            kind: ConstKind::Bytes(bytes),
        });
        Value::Constant(id)
    }

    pub fn get_null_pointer(&mut self) -> Value {
        let ty = self.types.get_pointer_type();
        Value::Constant(self.constants.intern(ConstantData { ty, kind: ConstKind::Null }))
    }

    /// All-zero value of an integer, pointer or array type
    pub fn get_zero_constant(&mut self, ty: TypeId) -> IrResult<Value> {
        self.types.check(ty)?;
        let kind = match self.types.get(ty) {
            Some(TypeData::Integer(_)) => ConstKind::Int(0),
            Some(TypeData::Pointer) => ConstKind::Null,
            Some(TypeData::Array { .. }) if self.types.is_sized(ty) => ConstKind::Zero,
            _ => {
                return Err(IrError::type_mismatch(
                    "zero constant",
                    "sized type",
                    self.types.display(ty).to_string(),
                ))
            }
        };
        Ok(Value::Constant(self.constants.intern(ConstantData { ty, kind })))
    }
}
