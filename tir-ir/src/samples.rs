//! Ready-made modules used by the `tirc` driver and the tests

use crate::builder::IrBuilder;
use crate::module::{Linkage, Module};
use crate::ops::CmpOp;
use crate::values::{ArgRef, FuncId};
use tir_common::{IrError, IrResult};

/// A named module constructor
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> IrResult<Module>,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "query",
        description: "process_row(age): age + 10 when age > 30, else 0",
        build: query_module,
    },
    Sample {
        name: "counter",
        description: "string constant, mutable counter, puts declaration and main",
        build: counter_module,
    },
    Sample {
        name: "add",
        description: "add(a, b) returning a + b",
        build: add_module,
    },
];

pub fn find_sample(name: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|sample| sample.name == name)
}

/// `i32 process_row(i32 age)` with a conditional on `age > 30`
pub fn query_module() -> IrResult<Module> {
    let mut module = Module::new("query_module");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty], false)?;
    let func = module.create_function(fn_ty, "process_row", Linkage::External)?;
    let entry = module.create_block(func, "entry")?;
    let then_bb = module.create_block(func, "then")?;
    let else_bb = module.create_block(func, "else")?;

    let age = argument(&module, func, 0)?;
    module.set_arg_name(age, "age")?;

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry)?;
    let thirty = builder.const_i32(30)?;
    let cmp = builder.compare_signed(CmpOp::Gt, age.into(), thirty, "")?;
    builder.branch_conditional(cmp, then_bb, else_bb)?;

    builder.set_insert_point(then_bb)?;
    let ten = builder.const_i32(10)?;
    let result = builder.add_int(age.into(), ten, "result")?;
    builder.return_value(result)?;

    builder.set_insert_point(else_bb)?;
    let zero = builder.const_i32(0)?;
    builder.return_value(zero)?;

    Ok(module)
}

/// Globals, an external declaration and a `main` computing `(5 << 3) + 2`
pub fn counter_module() -> IrResult<Module> {
    let mut module = Module::new("counter");
    let i32_ty = module.get_integer_type(32);
    let ptr_ty = module.get_pointer_type();

    let mut builder = IrBuilder::new(&mut module);
    let greeting = builder.global_string("greeting", "Welcome to llvm")?;
    let zero = builder.const_i32(0)?;
    let counter = builder
        .module_mut()
        .add_global_variable("counter", i32_ty, zero, Linkage::External)?;

    let ir = builder.module_mut();
    let puts_ty = ir.get_function_type(i32_ty, vec![ptr_ty], false)?;
    let puts = ir.get_or_insert_function("puts", puts_ty)?;
    let main_ty = ir.get_function_type(i32_ty, Vec::new(), false)?;
    let main = ir.create_function(main_ty, "main", Linkage::External)?;
    let entry = ir.create_block(main, "entry")?;

    builder.set_insert_point(entry)?;
    let temp = builder.alloca_local(i32_ty, "temp")?;
    let five = builder.const_i32(5)?;
    builder.store(five, temp)?;
    let loaded = builder.load(i32_ty, temp, "")?;
    let three = builder.const_i32(3)?;
    let shifted = builder.shl(loaded, three, "")?;
    let two = builder.const_i32(2)?;
    let final_result = builder.add_int(shifted, two, "final_result")?;
    builder.store(final_result, counter.into())?;
    builder.call(puts, &[greeting], "")?;
    builder.return_value(final_result)?;

    Ok(module)
}

/// `i32 add(i32 a, i32 b)` returning `a + b` as `%sum`
pub fn add_module() -> IrResult<Module> {
    let mut module = Module::new("my_module");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty, i32_ty], false)?;
    let func = module.create_function(fn_ty, "add", Linkage::External)?;

    let a = argument(&module, func, 0)?;
    let b = argument(&module, func, 1)?;
    module.set_arg_name(a, "a")?;
    module.set_arg_name(b, "b")?;
    let entry = module.create_block(func, "entry")?;

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry)?;
    let sum = builder.add_int(a.into(), b.into(), "sum")?;
    builder.return_value(sum)?;

    Ok(module)
}

fn argument(module: &Module, func: FuncId, index: usize) -> IrResult<ArgRef> {
    module
        .function(func)
        .and_then(|f| f.arg(index))
        .ok_or_else(|| IrError::invalid_handle("argument", (func, index)))
}
