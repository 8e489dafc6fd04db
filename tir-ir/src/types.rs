//! IR Type System
//!
//! Types are interned in a `TypeContext` owned by each module, so two
//! requests for the same type yield the same `TypeId` and type equality is
//! handle equality. Nothing here is process-global.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tir_common::{IrError, IrResult};

/// Handle to an interned type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural description of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeData {
    /// No value (function returns only)
    Void,

    /// Integer of a fixed bit width (`i1` is the boolean type)
    Integer(u32),

    /// Opaque pointer
    Pointer,

    /// Array type [len x element]
    Array { element: TypeId, len: u64 },

    /// Function signature
    Function {
        ret: TypeId,
        params: Vec<TypeId>,
        is_vararg: bool,
    },
}

/// Module-scoped interning table for types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<TypeData>", into = "Vec<TypeData>")]
pub struct TypeContext {
    types: Vec<TypeData>,
    lookup: HashMap<TypeData, TypeId>,
    void: TypeId,
    bool: TypeId,
    ptr: TypeId,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Intern without checking components; callers pass types of this context
    pub(crate) fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.lookup.get(&data) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(data.clone());
        self.lookup.insert(data, id);
        id
    }

    pub fn void_type(&self) -> TypeId {
        self.void
    }

    /// The 1-bit integer type produced by comparisons
    pub fn bool_type(&self) -> TypeId {
        self.bool
    }

    pub fn get_pointer_type(&self) -> TypeId {
        self.ptr
    }

    /// Get the canonical integer type of `width` bits.
    ///
    /// Panics if `width` is zero.
    pub fn get_integer_type(&mut self, width: u32) -> TypeId {
        assert!(width > 0, "integer types must be at least one bit wide");
        self.intern(TypeData::Integer(width))
    }

    /// `[len x element]`; the element must be a sized type of this context
    pub fn get_array_type(&mut self, element: TypeId, len: u64) -> IrResult<TypeId> {
        self.check(element)?;
        if !self.is_sized(element) {
            return Err(IrError::type_mismatch(
                "array element",
                "sized type",
                self.display(element).to_string(),
            ));
        }
        Ok(self.intern(TypeData::Array { element, len }))
    }

    /// Function signature; parameters must be sized and the return type
    /// sized or void
    pub fn get_function_type(&mut self, ret: TypeId, params: Vec<TypeId>, is_vararg: bool) -> IrResult<TypeId> {
        self.check(ret)?;
        if !self.is_void(ret) && !self.is_sized(ret) {
            return Err(IrError::type_mismatch(
                "return type",
                "void or sized type",
                self.display(ret).to_string(),
            ));
        }
        for (i, &param) in params.iter().enumerate() {
            self.check(param)?;
            if !self.is_sized(param) {
                return Err(IrError::type_mismatch(
                    format!("parameter {i}"),
                    "sized type",
                    self.display(param).to_string(),
                ));
            }
        }
        Ok(self.intern(TypeData::Function { ret, params, is_vararg }))
    }

    /// `InvalidHandle` unless `ty` belongs to this context
    pub fn check(&self, ty: TypeId) -> IrResult<TypeId> {
        if self.contains(ty) {
            Ok(ty)
        } else {
            Err(IrError::invalid_handle("type", ty))
        }
    }

    pub fn get(&self, ty: TypeId) -> Option<&TypeData> {
        self.types.get(ty.index())
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        ty.index() < self.types.len()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        ty == self.void
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        matches!(self.get(ty), Some(TypeData::Integer(_)))
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        ty == self.ptr
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.get(ty), Some(TypeData::Function { .. }))
    }

    /// Width in bits for integer types
    pub fn int_width(&self, ty: TypeId) -> Option<u32> {
        match self.get(ty) {
            Some(TypeData::Integer(width)) => Some(*width),
            _ => None,
        }
    }

    /// Types that can be loaded, stored and allocated
    pub fn is_sized(&self, ty: TypeId) -> bool {
        match self.get(ty) {
            Some(TypeData::Integer(_) | TypeData::Pointer) => true,
            Some(TypeData::Array { element, .. }) => *element < ty && self.is_sized(*element),
            _ => false,
        }
    }

    /// Whether `ty` and every type it mentions resolve in this context.
    ///
    /// Components must precede the type that uses them, which is how the
    /// constructors intern them; tables loaded from JSON may break this.
    pub fn is_well_formed(&self, ty: TypeId) -> bool {
        let component = |c: TypeId| c < ty && self.is_well_formed(c);
        match self.get(ty) {
            None => false,
            Some(TypeData::Integer(width)) => *width > 0,
            Some(TypeData::Void | TypeData::Pointer) => true,
            Some(TypeData::Array { element, .. }) => component(*element),
            Some(TypeData::Function { ret, params, .. }) => {
                component(*ret) && params.iter().all(|&param| component(param))
            }
        }
    }

    /// Split a function type into `(ret, params, is_vararg)`
    pub fn function_signature(&self, ty: TypeId) -> Option<(TypeId, &[TypeId], bool)> {
        match self.get(ty) {
            Some(TypeData::Function { ret, params, is_vararg }) => Some((*ret, params, *is_vararg)),
            _ => None,
        }
    }

    /// Render a type, e.g. `i32`, `[16 x i8]`, `i32 (ptr, ...)`
    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { ctx: self, ty }
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<TypeData>> for TypeContext {
    fn from(types: Vec<TypeData>) -> Self {
        let mut ctx = TypeContext {
            types: Vec::with_capacity(types.len()),
            lookup: HashMap::with_capacity(types.len()),
            void: TypeId(0),
            bool: TypeId(0),
            ptr: TypeId(0),
        };
        // Keep positions stable so serialized handles stay valid
        for data in types {
            let id = TypeId(ctx.types.len() as u32);
            ctx.types.push(data.clone());
            ctx.lookup.entry(data).or_insert(id);
        }
        ctx.void = ctx.intern(TypeData::Void);
        ctx.bool = ctx.intern(TypeData::Integer(1));
        ctx.ptr = ctx.intern(TypeData::Pointer);
        ctx
    }
}

impl From<TypeContext> for Vec<TypeData> {
    fn from(ctx: TypeContext) -> Self {
        ctx.types
    }
}

/// Display adapter returned by [`TypeContext::display`]
pub struct TypeDisplay<'a> {
    ctx: &'a TypeContext,
    ty: TypeId,
}

impl TypeDisplay<'_> {
    // Components are always interned before the type that uses them
    fn nested(&self, f: &mut fmt::Formatter<'_>, ty: TypeId) -> fmt::Result {
        if ty < self.ty {
            write!(f, "{}", self.ctx.display(ty))
        } else {
            write!(f, "<invalid type #{}>", ty.0)
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ctx.get(self.ty) {
            None => write!(f, "<invalid type #{}>", self.ty.0),
            Some(TypeData::Void) => write!(f, "void"),
            Some(TypeData::Integer(width)) => write!(f, "i{width}"),
            Some(TypeData::Pointer) => write!(f, "ptr"),
            Some(TypeData::Array { element, len }) => {
                write!(f, "[{len} x ")?;
                self.nested(f, *element)?;
                write!(f, "]")
            }
            Some(TypeData::Function { ret, params, is_vararg }) => {
                self.nested(f, *ret)?;
                write!(f, " (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    self.nested(f, *param)?;
                }
                if *is_vararg {
                    if !params.is_empty() { write!(f, ", ")?; }
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
        }
    }
}
