//! Operand and result typing rules
//!
//! Shared by the builder (checked before anything is appended) and the
//! verifier (re-checked over whole modules, including ones loaded from JSON).

use crate::instructions::InstKind;
use crate::module::Module;
use crate::types::TypeId;
use crate::values::{BlockId, FuncId, Value};
use tir_common::{IrError, IrResult};

/// Short printable form of a value for error messages
pub(crate) fn describe_value(module: &Module, value: Value) -> String {
    match (value, module.value_name(value)) {
        (Value::Global(_) | Value::Function(_), Some(name)) => format!("@{name}"),
        (_, Some(name)) => format!("%{name}"),
        (_, None) => format!("{value:?}"),
    }
}

fn function_name(module: &Module, func: FuncId) -> String {
    module
        .function(func)
        .map(|f| f.name().to_string())
        .unwrap_or_else(|| func.to_string())
}

/// Resolve the type of `value` as used inside `func`
pub(crate) fn operand_type(module: &Module, func: FuncId, value: Value) -> IrResult<TypeId> {
    if let Some(owner) = value.owner() {
        if owner != func {
            return Err(IrError::ForeignValue {
                value: describe_value(module, value),
                owner: function_name(module, owner),
                function: function_name(module, func),
            });
        }
    }
    let ty = module
        .value_type(value)
        .ok_or_else(|| IrError::invalid_handle("value", value))?;
    if value.as_inst().is_some() && module.types().is_void(ty) {
        return Err(IrError::type_mismatch(
            format!("use of {}", describe_value(module, value)),
            "a value",
            "void",
        ));
    }
    Ok(ty)
}

pub(crate) fn check_target(module: &Module, func: FuncId, target: BlockId) -> IrResult<()> {
    let known = target.func() == func && module.block(target).is_some();
    if known {
        Ok(())
    } else {
        Err(IrError::UnknownTarget {
            function: function_name(module, func),
            target: module.describe_block(target),
        })
    }
}

/// Check the operands of `kind` and compute its result type (void if none)
pub(crate) fn infer_result_type(module: &Module, func: FuncId, kind: &InstKind) -> IrResult<TypeId> {
    let types = module.types();
    let show = |ty: TypeId| types.display(ty).to_string();
    let operand = |value: Value| operand_type(module, func, value);

    match kind {
        InstKind::Binary { op, lhs, rhs } => {
            let (lt, rt) = (operand(*lhs)?, operand(*rhs)?);
            let context = format!("'{op}' operands");
            if !types.is_integer(lt) {
                return Err(IrError::type_mismatch(context, "integer type", show(lt)));
            }
            if rt != lt {
                return Err(IrError::type_mismatch(context, show(lt), show(rt)));
            }
            Ok(lt)
        }

        InstKind::ICmp { pred, lhs, rhs } => {
            let (lt, rt) = (operand(*lhs)?, operand(*rhs)?);
            let context = format!("'icmp {pred}' operands");
            if !types.is_integer(lt) && !types.is_pointer(lt) {
                return Err(IrError::type_mismatch(context, "integer or pointer", show(lt)));
            }
            if rt != lt {
                return Err(IrError::type_mismatch(context, show(lt), show(rt)));
            }
            Ok(types.bool_type())
        }

        InstKind::Alloca { allocated } => {
            types.check(*allocated)?;
            if !types.is_sized(*allocated) {
                return Err(IrError::type_mismatch("alloca", "sized type", show(*allocated)));
            }
            Ok(types.get_pointer_type())
        }

        InstKind::Load { ty, ptr } => {
            types.check(*ty)?;
            if !types.is_sized(*ty) {
                return Err(IrError::type_mismatch("load", "sized type", show(*ty)));
            }
            let pt = operand(*ptr)?;
            if !types.is_pointer(pt) {
                return Err(IrError::type_mismatch("load address", "ptr", show(pt)));
            }
            Ok(*ty)
        }

        InstKind::Store { value, ptr } => {
            let vt = operand(*value)?;
            if !types.is_sized(vt) {
                return Err(IrError::type_mismatch("stored value", "sized type", show(vt)));
            }
            let pt = operand(*ptr)?;
            if !types.is_pointer(pt) {
                return Err(IrError::type_mismatch("store address", "ptr", show(pt)));
            }
            Ok(types.void_type())
        }

        InstKind::Call { callee, args } => {
            let target = module
                .function(*callee)
                .ok_or_else(|| IrError::invalid_handle("function", *callee))?;
            let (ret, params, is_vararg) = types.function_signature(target.signature()).ok_or_else(|| {
                IrError::type_mismatch(
                    format!("signature of '@{}'", target.name()),
                    "function type",
                    show(target.signature()),
                )
            })?;
            let arity_ok = if is_vararg {
                args.len() >= params.len()
            } else {
                args.len() == params.len()
            };
            if !arity_ok {
                return Err(IrError::type_mismatch(
                    format!("call to '@{}'", target.name()),
                    format!("{}{} argument(s)", if is_vararg { "at least " } else { "" }, params.len()),
                    args.len().to_string(),
                ));
            }
            for (i, arg) in args.iter().enumerate() {
                let at = operand(*arg)?;
                if let Some(&expected) = params.get(i) {
                    if at != expected {
                        return Err(IrError::type_mismatch(
                            format!("argument {} of call to '@{}'", i, target.name()),
                            show(expected),
                            show(at),
                        ));
                    }
                }
            }
            Ok(ret)
        }

        InstKind::Br { target } => {
            check_target(module, func, *target)?;
            Ok(types.void_type())
        }

        InstKind::CondBr { cond, then_block, else_block } => {
            let ct = operand(*cond)?;
            if ct != types.bool_type() {
                return Err(IrError::type_mismatch("branch condition", "i1", show(ct)));
            }
            check_target(module, func, *then_block)?;
            check_target(module, func, *else_block)?;
            Ok(types.void_type())
        }

        InstKind::Ret { value } => {
            let function = module
                .function(func)
                .ok_or_else(|| IrError::invalid_handle("function", func))?;
            let ret = types
                .function_signature(function.signature())
                .map(|(ret, _, _)| ret)
                .unwrap_or_else(|| types.void_type());
            let context = format!("return from '@{}'", function.name());
            match value {
                None if !types.is_void(ret) => Err(IrError::type_mismatch(context, show(ret), "void")),
                None => Ok(types.void_type()),
                Some(v) => {
                    let vt = operand(*v)?;
                    if vt != ret {
                        return Err(IrError::type_mismatch(context, show(ret), show(vt)));
                    }
                    Ok(types.void_type())
                }
            }
        }
    }
}
