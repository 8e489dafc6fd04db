//! Unit tests for the IR crate

use super::*;
use pretty_assertions::assert_eq;

/// `i32 @f(i32 %x)` with an `entry` block and the builder positioned in it
fn function_with_entry(module: &mut Module, name: &str) -> (FuncId, BlockId, Value) {
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty], false).unwrap();
    let func = module.create_function(fn_ty, name, Linkage::External).unwrap();
    let entry = module.create_block(func, "entry").unwrap();
    let x = module.function(func).unwrap().arg(0).unwrap();
    module.set_arg_name(x, "x").unwrap();
    (func, entry, x.into())
}

fn kinds(report: &VerificationReport) -> Vec<DiagnosticKind> {
    report.diagnostics().iter().map(|d| d.kind).collect()
}

fn error_kinds(module: &Module) -> Vec<DiagnosticKind> {
    verify_module(module, &VerifierConfig::default())
        .errors()
        .map(|d| d.kind)
        .collect()
}

#[test]
fn test_type_interning() {
    let mut module = Module::new("types");
    let a = module.get_integer_type(32);
    let b = module.get_integer_type(32);
    let c = module.get_integer_type(64);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let f1 = module.get_function_type(a, vec![a, c], false).unwrap();
    let f2 = module.get_function_type(b, vec![b, c], false).unwrap();
    let f3 = module.get_function_type(b, vec![b, c], true).unwrap();
    assert_eq!(f1, f2);
    assert_ne!(f1, f3);

    assert_eq!(module.types().display(f3).to_string(), "i32 (i32, i64, ...)");
    assert_eq!(module.get_pointer_type(), module.get_pointer_type());
}

#[test]
fn test_type_contexts_are_per_module() {
    let mut first = Module::new("a");
    let mut second = Module::new("b");
    first.get_integer_type(8);
    let in_first = first.get_integer_type(16);
    let in_second = second.get_integer_type(16);
    assert_ne!(in_first, in_second);
    assert_eq!(second.types().display(in_second).to_string(), "i16");
}

#[test]
#[should_panic]
fn test_zero_width_integer_panics() {
    Module::new("m").get_integer_type(0);
}

#[test]
fn test_create_function_binds_arguments() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let ptr = module.get_pointer_type();
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty, ptr], false).unwrap();
    let func = module.create_function(fn_ty, "f", Linkage::Internal).unwrap();

    let data = module.function(func).unwrap();
    assert_eq!(data.args().len(), 2);
    assert_eq!(data.args()[1].ty(), ptr);
    assert!(data.is_declaration());
    assert_eq!(module.function_by_name("f"), Some(func));
}

#[test]
fn test_create_function_requires_function_type() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let err = module.create_function(i32_ty, "f", Linkage::External).unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    assert!(module.functions().is_empty());
}

#[test]
fn test_duplicate_symbols_are_rejected() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, Vec::new(), false).unwrap();
    module.create_function(fn_ty, "main", Linkage::External).unwrap();

    let err = module.create_function(fn_ty, "main", Linkage::External).unwrap_err();
    assert_eq!(err, IrError::DuplicateSymbol { name: "main".to_string() });

    let zero = module.get_integer_constant(i32_ty, 0).unwrap();
    let err = module
        .add_global_variable("main", i32_ty, zero, Linkage::External)
        .unwrap_err();
    assert_eq!(err, IrError::DuplicateSymbol { name: "main".to_string() });
    assert!(module.globals().is_empty());
}

#[test]
fn test_get_or_insert_function() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let ptr = module.get_pointer_type();
    let puts_ty = module.get_function_type(i32_ty, vec![ptr], false).unwrap();
    let other_ty = module.get_function_type(i32_ty, Vec::new(), false).unwrap();

    let first = module.get_or_insert_function("puts", puts_ty).unwrap();
    let second = module.get_or_insert_function("puts", puts_ty).unwrap();
    assert_eq!(first, second);
    assert_eq!(module.functions().len(), 1);

    let err = module.get_or_insert_function("puts", other_ty).unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
}

#[test]
fn test_global_initializer_type_must_match() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let i8_ty = module.get_integer_type(8);
    let init = module.get_integer_constant(i8_ty, 1).unwrap();
    let err = module
        .add_global_variable("g", i32_ty, init, Linkage::External)
        .unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
}

#[test]
fn test_value_types() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");
    let i32_ty = module.get_integer_type(32);
    let ptr = module.get_pointer_type();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let cmp = builder.compare_signed(CmpOp::Lt, x, x, "lt").unwrap();
    let slot = builder.alloca_local(i32_ty, "slot").unwrap();

    assert_eq!(module.value_type(x), Some(i32_ty));
    assert_eq!(module.value_type(cmp), Some(module.types().bool_type()));
    assert_eq!(module.value_type(slot), Some(ptr));
    assert_eq!(module.value_type(Value::Function(func)), Some(ptr));
    assert_eq!(module.value_name(cmp), Some("lt"));
}

#[test]
fn test_emission_requires_insert_point() {
    let mut module = Module::new("m");
    let (_, _, x) = function_with_entry(&mut module, "f");
    let mut builder = IrBuilder::new(&mut module);
    assert_eq!(builder.add_int(x, x, "").unwrap_err(), IrError::NoInsertPoint);
}

#[test]
fn test_emit_into_terminated_block_fails() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    builder.return_value(x).unwrap();

    let err = builder.add_int(x, x, "late").unwrap_err();
    assert!(matches!(err, IrError::BlockAlreadyTerminated { .. }));
    assert!(builder.return_value(x).is_err());

    let data = module.function(func).unwrap();
    assert_eq!(data.block(entry).unwrap().len(), 1);
    assert_eq!(data.inst_count(), 1);
}

#[test]
fn test_builder_type_checks() {
    let mut module = Module::new("m");
    let (_, entry, x) = function_with_entry(&mut module, "f");
    let i64_ty = module.get_integer_type(64);
    let wide = module.get_integer_constant(i64_ty, 1).unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();

    assert!(matches!(builder.add_int(x, wide, "").unwrap_err(), IrError::TypeMismatch { .. }));
    assert!(matches!(builder.load(i64_ty, x, "").unwrap_err(), IrError::TypeMismatch { .. }));
    assert!(matches!(builder.store(x, x).unwrap_err(), IrError::TypeMismatch { .. }));
    assert!(matches!(builder.branch_conditional(x, entry, entry).unwrap_err(), IrError::TypeMismatch { .. }));
    assert!(matches!(builder.return_value(wide).unwrap_err(), IrError::TypeMismatch { .. }));
    assert!(matches!(builder.return_void().unwrap_err(), IrError::TypeMismatch { .. }));

    // Nothing was appended by the failed calls
    assert!(module.block(entry).unwrap().is_empty());
}

#[test]
fn test_compare_operand_checks() {
    let mut module = Module::new("m");
    let (_, entry, x) = function_with_entry(&mut module, "f");
    let i64_ty = module.get_integer_type(64);
    let wide = module.get_integer_constant(i64_ty, 1).unwrap();
    let null = module.get_null_pointer();
    let text = module.get_string_constant("hi");

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();

    let err = builder.compare_signed(CmpOp::Gt, x, wide, "").unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    let err = builder.compare_unsigned(CmpOp::Lt, x, null, "").unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    let err = builder.compare(IntPredicate::Eq, text, text, "").unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    assert!(module.block(entry).unwrap().is_empty());

    // Pointers compare with pointers
    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let same = builder.compare(IntPredicate::Eq, null, null, "same").unwrap();
    assert_eq!(module.value_type(same), Some(module.types().bool_type()));
}

#[test]
fn test_unsized_types_are_rejected() {
    let mut module = Module::new("m");
    let (func, entry, _) = function_with_entry(&mut module, "f");
    let void = module.void_type();
    let fn_ty = module.function(func).unwrap().signature();
    let null = module.get_null_pointer();

    let err = module.get_array_type(void, 4).unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    let err = module.get_array_type(fn_ty, 2).unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));
    let err = module.get_function_type(void, vec![void], false).unwrap_err();
    assert!(matches!(err, IrError::TypeMismatch { .. }));

    // An entry that skipped the constructor checks, as a JSON table might hold
    let void_array = module.types_mut().intern(TypeData::Array { element: void, len: 4 });
    assert!(!module.types().is_sized(void_array));
    let i8_ty = module.get_integer_type(8);
    let nested = module.get_array_type(i8_ty, 3).unwrap();
    let nested = module.get_array_type(nested, 2).unwrap();
    assert!(module.types().is_sized(nested));

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    for ty in [void, fn_ty, void_array] {
        let err = builder.alloca_local(ty, "slot").unwrap_err();
        assert!(matches!(err, IrError::TypeMismatch { .. }), "{err}");
        let err = builder.load(ty, null, "v").unwrap_err();
        assert!(matches!(err, IrError::TypeMismatch { .. }), "{err}");
    }
    assert!(module.block(entry).unwrap().is_empty());
}

#[test]
fn test_type_handles_from_another_module_are_rejected() {
    let mut other = Module::new("other");
    for width in [8, 16, 24, 40, 48] {
        other.get_integer_type(width);
    }
    let foreign = other.get_integer_type(99);

    let mut module = Module::new("m");
    let (_, entry, _) = function_with_entry(&mut module, "f");
    assert!(!module.types().contains(foreign));

    let err = module.get_function_type(foreign, vec![foreign], false).unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { kind: "type", .. }));
    let err = module.get_array_type(foreign, 4).unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { .. }));
    let err = module.create_function(foreign, "g", Linkage::External).unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { .. }));
    let err = module.get_integer_constant(foreign, 1).unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { .. }));
    let err = module.get_zero_constant(foreign).unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { .. }));
    let zero = module.get_null_pointer();
    let err = module
        .add_global_variable("g", foreign, zero, Linkage::External)
        .unwrap_err();
    assert!(matches!(err, IrError::InvalidHandle { .. }));
    assert_eq!(module.functions().len(), 1);
    assert!(module.globals().is_empty());

    let null = module.get_null_pointer();
    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    assert!(matches!(builder.alloca_local(foreign, "").unwrap_err(), IrError::InvalidHandle { .. }));
    assert!(matches!(builder.load(foreign, null, "").unwrap_err(), IrError::InvalidHandle { .. }));
    assert!(module.block(entry).unwrap().is_empty());
}

#[test]
fn test_call_argument_checks() {
    let mut module = Module::new("m");
    let (_, entry, x) = function_with_entry(&mut module, "f");
    let i32_ty = module.get_integer_type(32);
    let ptr = module.get_pointer_type();
    let printf_ty = module.get_function_type(i32_ty, vec![ptr], true).unwrap();
    let printf = module.declare_function(printf_ty, "printf").unwrap();
    let fmt = module.get_null_pointer();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();

    assert!(builder.call(printf, &[], "").is_err());
    assert!(builder.call(printf, &[x], "").is_err());
    let result = builder.call(printf, &[fmt, x, x], "n").unwrap();
    assert!(result.is_some());
}

#[test]
fn test_void_call_has_no_value() {
    let mut module = Module::new("m");
    let (_, entry, _) = function_with_entry(&mut module, "f");
    let void = module.void_type();
    let hook_ty = module.get_function_type(void, Vec::new(), false).unwrap();
    let hook = module.declare_function(hook_ty, "hook").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    assert_eq!(builder.call(hook, &[], "ignored").unwrap(), None);
}

#[test]
fn test_foreign_values_and_targets_are_rejected() {
    let mut module = Module::new("m");
    let (_, f_entry, f_x) = function_with_entry(&mut module, "f");
    let (_, g_entry, g_x) = function_with_entry(&mut module, "g");

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(g_entry).unwrap();
    let err = builder.add_int(g_x, f_x, "").unwrap_err();
    assert!(matches!(err, IrError::ForeignValue { .. }));

    let err = builder.branch_unconditional(f_entry).unwrap_err();
    assert!(matches!(err, IrError::UnknownTarget { .. }));
}

#[test]
fn test_set_insert_point_rejects_stale_block() {
    let mut module = Module::new("m");
    let (func, _, _) = function_with_entry(&mut module, "f");
    let stale = BlockId { func, index: 9 };
    let mut builder = IrBuilder::new(&mut module);
    assert!(matches!(builder.set_insert_point(stale).unwrap_err(), IrError::InvalidHandle { .. }));
}

#[test]
fn test_verifier_accepts_samples() {
    for sample in samples::SAMPLES {
        let module = (sample.build)().unwrap();
        let report = module.verify().unwrap();
        assert!(report.diagnostics().is_empty(), "{}: {:?}", sample.name, report.diagnostics());
    }
}

#[test]
fn test_verifier_reports_block_shape() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");
    let dangling = module.create_block(func, "dangling").unwrap();
    module.create_block(func, "empty").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    builder.branch_unconditional(dangling).unwrap();
    builder.set_insert_point(dangling).unwrap();
    builder.add_int(x, x, "").unwrap();

    let errors = error_kinds(&module);
    assert_eq!(errors, vec![DiagnosticKind::MissingTerminator, DiagnosticKind::EmptyBlock]);

    let err = module.verify().unwrap_err();
    assert!(matches!(err, IrError::VerificationFailed { .. }));
    assert!(err.diagnostics().len() >= 2);
}

#[test]
fn test_verifier_reports_terminator_not_last() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let sum = builder.add_int(x, x, "").unwrap();
    builder.return_value(sum).unwrap();

    // Move the return in front of the add
    module.functions[func.index()].blocks[0].insts.reverse();

    let errors = error_kinds(&module);
    assert!(errors.contains(&DiagnosticKind::TerminatorNotLast));
    assert!(errors.contains(&DiagnosticKind::MissingTerminator));
    assert!(errors.contains(&DiagnosticKind::UseBeforeDef));
}

#[test]
fn test_verifier_reports_non_dominating_definition() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let bool_ty = module.types().bool_type();
    let fn_ty = module.get_function_type(i32_ty, vec![bool_ty, i32_ty], false).unwrap();
    let func = module.create_function(fn_ty, "pick", Linkage::External).unwrap();
    let cond: Value = module.function(func).unwrap().arg(0).unwrap().into();
    let x: Value = module.function(func).unwrap().arg(1).unwrap().into();
    let blocks: Vec<_> = ["entry", "left", "right", "join"]
        .iter()
        .map(|name| module.create_block(func, name).unwrap())
        .collect();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(blocks[0]).unwrap();
    let early = builder.add_int(x, x, "early").unwrap();
    builder.branch_conditional(cond, blocks[1], blocks[2]).unwrap();

    builder.set_insert_point(blocks[1]).unwrap();
    let left_only = builder.mul_int(x, x, "left_only").unwrap();
    builder.branch_unconditional(blocks[3]).unwrap();

    builder.set_insert_point(blocks[2]).unwrap();
    builder.branch_unconditional(blocks[3]).unwrap();

    builder.set_insert_point(blocks[3]).unwrap();
    // `early` dominates the join block, `left_only` does not
    let total = builder.add_int(early, left_only, "total").unwrap();
    builder.return_value(total).unwrap();

    let report = verify_module(&module, &VerifierConfig::default());
    assert_eq!(kinds(&report), vec![DiagnosticKind::DefDoesNotDominateUse]);
    assert_eq!(report.diagnostics()[0].entity, "@pick/%join");
}

#[test]
fn test_unreachable_blocks_are_warnings() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");
    let island = module.create_block(func, "island").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    builder.return_value(x).unwrap();
    builder.set_insert_point(island).unwrap();
    builder.return_value(x).unwrap();

    let report = module.verify().unwrap();
    assert_eq!(kinds(&report), vec![DiagnosticKind::UnreachableBlock]);
    assert_eq!(report.warning_count(), 1);
    assert!(!report.has_errors());

    let quiet = VerifierConfig {
        report_unreachable: false,
        ..VerifierConfig::default()
    };
    assert!(module.verify_with(&quiet).unwrap().diagnostics().is_empty());
}

#[test]
fn test_uses_in_unreachable_blocks_skip_dominance() {
    let mut module = Module::new("m");
    let (func, entry, x) = function_with_entry(&mut module, "f");
    let island = module.create_block(func, "island").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let sum = builder.add_int(x, x, "sum").unwrap();
    builder.return_value(sum).unwrap();
    builder.set_insert_point(island).unwrap();
    builder.return_value(sum).unwrap();

    assert_eq!(error_kinds(&module), Vec::new());
}

#[test]
fn test_verifier_collects_every_violation() {
    let mut module = Module::new("m");
    let (f, f_entry, f_x) = function_with_entry(&mut module, "f");
    let (g, g_entry, g_x) = function_with_entry(&mut module, "g");
    let i64_ty = module.get_integer_type(64);
    let wide = module.get_integer_constant(i64_ty, 7).unwrap();
    let callee_ty = module.get_function_type(i64_ty, vec![i64_ty], false).unwrap();
    let callee = module.declare_function(callee_ty, "callee").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(f_entry).unwrap();
    let call = builder.call(callee, &[wide], "c").unwrap().unwrap();
    builder.return_value(f_x).unwrap();
    builder.set_insert_point(g_entry).unwrap();
    builder.branch_unconditional(g_entry).unwrap();

    // Corrupt the finished module in ways the builder refuses to produce
    {
        let f_data = &mut module.functions[f.index()];
        let call_ref = call.as_inst().unwrap();
        f_data.insts[call_ref.index()].kind = InstKind::Call {
            callee,
            args: vec![f_x],
        };
        let ret = f_data.blocks[0].insts[1];
        f_data.insts[ret.index()].kind = InstKind::Ret { value: Some(wide) };
    }
    {
        let g_data = &mut module.functions[g.index()];
        let br = g_data.blocks[0].insts[0];
        g_data.insts[br.index()].kind = InstKind::Br { target: f_entry };
    }
    let extra = module.create_block(g, "uses_foreign").unwrap();
    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(extra).unwrap();
    builder.return_value(g_x).unwrap();
    let g_data = &mut module.functions[g.index()];
    let ret = g_data.blocks[1].insts[0];
    g_data.insts[ret.index()].kind = InstKind::Ret { value: Some(f_x) };

    let errors = error_kinds(&module);
    assert_eq!(
        errors,
        vec![
            DiagnosticKind::SignatureMismatch,
            DiagnosticKind::ReturnTypeMismatch,
            DiagnosticKind::UnknownTarget,
            DiagnosticKind::ForeignValue,
        ]
    );

    let limited = VerifierConfig {
        max_diagnostics: 2,
        ..VerifierConfig::default()
    };
    assert_eq!(verify_module(&module, &limited).diagnostics().len(), 2);
}

#[test]
fn test_verifier_reports_unresolved_types() {
    let mut module = samples::counter_module().unwrap();
    assert!(module.verify().is_ok());
    let bogus = TypeId(999);

    let counter = module.global_by_name("counter").unwrap();
    module.globals[counter.index()].value_type = bogus;
    let main = module.function_by_name("main").unwrap();
    let main_data = &mut module.functions[main.index()];
    let slot = main_data.blocks[0].insts[0];
    main_data.insts[slot.index()].kind = InstKind::Alloca { allocated: bogus };

    let report = verify_module(&module, &VerifierConfig::default());
    let invalid: Vec<_> = report
        .errors()
        .filter(|d| d.kind == DiagnosticKind::InvalidType)
        .map(|d| d.entity.as_str())
        .collect();
    assert_eq!(invalid, vec!["@counter", "@main/%entry"]);
    assert!(module.verify().is_err());

    let puts = module.function_by_name("puts").unwrap();
    module.functions[puts.index()].ty = bogus;
    let report = verify_function(&module, puts, &VerifierConfig::default());
    assert_eq!(kinds(&report), vec![DiagnosticKind::InvalidType]);
}

#[test]
fn test_verify_single_function() {
    let mut module = samples::add_module().unwrap();
    let add = module.function_by_name("add").unwrap();
    let report = module.verify_function(add).unwrap();
    assert!(report.diagnostics().is_empty());

    // Breaking another function does not affect this one
    let (broken, _, _) = function_with_entry(&mut module, "broken");
    assert!(module.verify_function(add).is_ok());
    let err = module.verify_function(broken).unwrap_err();
    assert_eq!(
        err.diagnostics().iter().map(|d| d.kind).collect::<Vec<_>>(),
        vec![DiagnosticKind::EmptyBlock]
    );
    assert!(module.verify().is_err());

    let missing = FuncId(42);
    let report = verify_function(&module, missing, &VerifierConfig::default());
    assert_eq!(kinds(&report), vec![DiagnosticKind::InvalidOperand]);
}

#[test]
fn test_unnamed_block_paths_follow_printed_labels() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty], false).unwrap();
    let func = module.create_function(fn_ty, "f", Linkage::External).unwrap();
    let entry = module.create_block(func, "").unwrap();
    let empty = module.create_block(func, "").unwrap();

    assert_eq!(module.describe_block(entry), "@f/%1");
    assert_eq!(module.describe_block(empty), "@f/%2");
    assert_eq!(module.describe_block(BlockId { func, index: 7 }), "@f/%<badref>");

    let report = verify_module(&module, &VerifierConfig::default());
    let entities: Vec<_> = report.errors().map(|d| d.entity.as_str()).collect();
    assert_eq!(entities, vec!["@f/%1", "@f/%2"]);
    assert!(print_module(&module).contains("\n1:\n"));
}

#[test]
fn test_declarations_must_be_external() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, Vec::new(), false).unwrap();
    module.create_function(fn_ty, "hidden", Linkage::Private).unwrap();
    assert_eq!(error_kinds(&module), vec![DiagnosticKind::InvalidLinkage]);
}

#[test]
fn test_printing_is_deterministic() {
    let module = samples::counter_module().unwrap();
    assert_eq!(print_module(&module), print_module(&module));
    assert_eq!(print_module(&module), module.to_string());
}

#[test]
fn test_duplicate_names_are_uniqued_when_printing() {
    let mut module = Module::new("m");
    let (_, entry, x) = function_with_entry(&mut module, "f");
    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let a = builder.add_int(x, x, "x").unwrap();
    let b = builder.add_int(a, a, "x").unwrap();
    let c = builder.add_int(b, b, "two words").unwrap();
    builder.return_value(c).unwrap();

    let text = print_module(&module);
    assert!(text.contains("  %x1 = add i32 %x, %x\n"), "{text}");
    assert!(text.contains("  %x2 = add i32 %x1, %x1\n"), "{text}");
    assert!(text.contains("  %\"two words\" = add i32 %x2, %x2\n"), "{text}");
}

#[test]
fn test_unnamed_values_get_slots() {
    let mut module = Module::new("m");
    let i32_ty = module.get_integer_type(32);
    let fn_ty = module.get_function_type(i32_ty, vec![i32_ty], false).unwrap();
    let func = module.create_function(fn_ty, "f", Linkage::Internal).unwrap();
    let entry = module.create_block(func, "").unwrap();
    let arg: Value = module.function(func).unwrap().arg(0).unwrap().into();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let one = builder.const_i32(-1).unwrap();
    let sum = builder.add_int(arg, one, "").unwrap();
    builder.return_value(sum).unwrap();

    let expected = "\
define internal i32 @f(i32 %0) {
1:
  %2 = add i32 %0, -1
  ret i32 %2
}
";
    assert!(print_module(&module).ends_with(expected), "{}", print_module(&module));
}

#[test]
fn test_bool_and_wrapped_constants_print() {
    let mut module = Module::new("m");
    let void = module.void_type();
    let fn_ty = module.get_function_type(void, Vec::new(), false).unwrap();
    let func = module.create_function(fn_ty, "f", Linkage::External).unwrap();
    let entry = module.create_block(func, "entry").unwrap();
    let exit = module.create_block(func, "exit").unwrap();

    let mut builder = IrBuilder::new(&mut module);
    builder.set_insert_point(entry).unwrap();
    let truthy = builder.const_bool(true).unwrap();
    builder.branch_conditional(truthy, exit, exit).unwrap();
    builder.set_insert_point(exit).unwrap();
    let i8_ty = builder.module_mut().get_integer_type(8);
    let slot = builder.alloca_local(i8_ty, "slot").unwrap();
    let wrapped = builder.const_int(8, 200).unwrap();
    builder.store(wrapped, slot).unwrap();
    builder.return_void().unwrap();

    let text = print_module(&module);
    assert!(text.contains("  br i1 true, label %exit, label %exit\n"), "{text}");
    assert!(text.contains("exit:                                             ; preds = %entry\n"), "{text}");
    assert!(text.contains("  store i8 -56, ptr %slot\n"), "{text}");
    assert!(text.contains("  ret void\n"), "{text}");
}

#[test]
fn test_json_round_trip_preserves_text() {
    for sample in samples::SAMPLES {
        let module = (sample.build)().unwrap();
        let json = module.to_json().unwrap();
        let restored = Module::from_json(&json).unwrap();
        assert_eq!(print_module(&restored), print_module(&module));
        assert!(restored.verify().is_ok());
    }
}

#[test]
fn test_from_json_rejects_garbage() {
    let err = Module::from_json("{ not json").unwrap_err();
    assert!(matches!(err, IrError::Serialization { .. }));
}
