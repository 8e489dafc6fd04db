//! IR Verifier
//!
//! Walks a whole module and records every rule violation instead of stopping
//! at the first. Unreachable blocks are reported as warnings; everything else
//! is an error. The module is never modified, so a failing module can still
//! be inspected and printed.

use log::debug;
use crate::cfg::{ControlFlowGraph, DominatorTree};
use crate::function::FunctionData;
use crate::instructions::InstKind;
use crate::module::{Module, Symbol};
use crate::printer;
use crate::typing;
use crate::values::{BlockId, FuncId, GlobalId, InstRef, Value};
use tir_common::{Diagnostic, DiagnosticKind, DiagnosticReporter, IrError, IrResult, Severity};

/// Verifier options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Stop after this many diagnostics (0 = unlimited)
    pub max_diagnostics: usize,
    /// Emit warnings for blocks unreachable from the entry
    pub report_unreachable: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_diagnostics: 0,
            report_unreachable: true,
        }
    }
}

/// Everything the verifier found, in module order
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    summary: String,
}

impl VerificationReport {
    fn from_reporter(reporter: DiagnosticReporter) -> Self {
        let error_count = reporter.error_count();
        let warning_count = reporter.warning_count();
        let summary = reporter.summary();
        Self {
            diagnostics: reporter.into_diagnostics(),
            error_count,
            warning_count,
            summary,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// e.g. "2 errors and 1 warning"
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// `Ok(self)` when only warnings were found
    pub fn into_result(self) -> IrResult<Self> {
        if self.has_errors() {
            Err(IrError::VerificationFailed {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self)
        }
    }
}

/// Verify every function, global and symbol of `module`
pub fn verify_module(module: &Module, config: &VerifierConfig) -> VerificationReport {
    let mut verifier = Verifier::new(module, config);
    verifier.verify_symbols();
    verifier.verify_globals();
    for func in module.functions() {
        if verifier.reporter.is_full() {
            break;
        }
        verifier.verify_function(func);
    }

    let report = VerificationReport::from_reporter(verifier.reporter);
    debug!("verified module '{}': {}", module.name(), report.summary());
    report
}

/// Verify a single function of `module`, ignoring globals and the symbol table
pub fn verify_function(module: &Module, func: FuncId, config: &VerifierConfig) -> VerificationReport {
    let mut verifier = Verifier::new(module, config);
    match module.function(func) {
        Some(data) => verifier.verify_function(data),
        None => verifier.error(
            DiagnosticKind::InvalidOperand,
            func.to_string(),
            "function does not exist in this module",
        ),
    }

    let report = VerificationReport::from_reporter(verifier.reporter);
    debug!("verified function {} of '{}': {}", func, module.name(), report.summary());
    report
}

struct Verifier<'a> {
    module: &'a Module,
    config: &'a VerifierConfig,
    reporter: DiagnosticReporter,
}

/// Where an instruction sits: block index and position in that block
type Placement = Option<(usize, usize)>;

/// Per-function state shared by the body checks
struct FunctionScope<'f> {
    func: &'f FunctionData,
    /// `@func/%label` of each block, labelled as the printer labels them
    paths: Vec<String>,
    placements: Vec<Placement>,
    tree: DominatorTree,
}

impl FunctionScope<'_> {
    fn path(&self, block: BlockId) -> String {
        block_path(&self.paths, block)
    }
}

fn block_path(paths: &[String], block: BlockId) -> String {
    paths.get(block.index()).cloned().unwrap_or_else(|| block.to_string())
}

/// The instruction whose operands are being checked
struct Site<'s> {
    block: BlockId,
    position: usize,
    entity: &'s str,
    opcode: &'s str,
}

impl<'a> Verifier<'a> {
    fn new(module: &'a Module, config: &'a VerifierConfig) -> Self {
        Self {
            module,
            config,
            reporter: DiagnosticReporter::with_limit(config.max_diagnostics),
        }
    }

    fn error(&mut self, kind: DiagnosticKind, entity: impl Into<String>, message: impl Into<String>) {
        self.reporter.report(Diagnostic::error(kind, entity, message));
    }

    fn verify_symbols(&mut self) {
        let module = self.module;
        for (index, func) in module.functions().iter().enumerate() {
            let expected = Symbol::Function(FuncId(index as u32));
            if module.symbol(func.name()) != Some(expected) {
                self.error(
                    DiagnosticKind::DuplicateSymbol,
                    format!("@{}", func.name()),
                    "function is not the symbol-table entry for its name",
                );
            }
        }
        for (index, global) in module.globals().iter().enumerate() {
            let expected = Symbol::Global(GlobalId(index as u32));
            if module.symbol(global.name()) != Some(expected) {
                self.error(
                    DiagnosticKind::DuplicateSymbol,
                    format!("@{}", global.name()),
                    "global is not the symbol-table entry for its name",
                );
            }
        }
        for (name, symbol) in &module.symbols {
            let resolved = match symbol {
                Symbol::Function(id) => module.function(*id).map(|f| f.name()),
                Symbol::Global(id) => module.global(*id).map(|g| g.name()),
            };
            if resolved != Some(name.as_str()) {
                self.error(
                    DiagnosticKind::DuplicateSymbol,
                    format!("@{name}"),
                    format!("symbol refers to {symbol:?}, which has a different name"),
                );
            }
        }
    }

    fn verify_globals(&mut self) {
        let module = self.module;
        let types = module.types();
        for global in module.globals() {
            let entity = format!("@{}", global.name());
            if !types.is_well_formed(global.value_type()) {
                self.error(
                    DiagnosticKind::InvalidType,
                    entity,
                    format!("global has unresolved type {}", types.display(global.value_type())),
                );
                continue;
            }
            if !types.is_sized(global.value_type()) {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    entity.clone(),
                    format!("global of unsized type {}", types.display(global.value_type())),
                );
            }
            match module.constants().get(global.initializer()) {
                None => self.error(
                    DiagnosticKind::InvalidOperand,
                    entity,
                    format!("initializer {:?} does not exist", global.initializer()),
                ),
                Some(init) if init.ty != global.value_type() => self.error(
                    DiagnosticKind::TypeMismatch,
                    entity,
                    format!(
                        "initializer has type {}, global is declared {}",
                        types.display(init.ty),
                        types.display(global.value_type())
                    ),
                ),
                Some(_) => {}
            }
        }
    }

    fn verify_function(&mut self, func: &FunctionData) {
        let module = self.module;
        let types = module.types();
        let entity = format!("@{}", func.name());

        if !types.is_well_formed(func.signature()) {
            self.error(
                DiagnosticKind::InvalidType,
                entity,
                format!("signature {} does not resolve in this module", types.display(func.signature())),
            );
            return;
        }
        for (index, arg) in func.args().iter().enumerate() {
            if !types.is_well_formed(arg.ty()) {
                self.error(
                    DiagnosticKind::InvalidType,
                    entity.clone(),
                    format!("argument {index} has unresolved type {}", types.display(arg.ty())),
                );
            }
        }

        match types.function_signature(func.signature()) {
            None => self.error(
                DiagnosticKind::SignatureMismatch,
                entity.clone(),
                format!("signature {} is not a function type", types.display(func.signature())),
            ),
            Some((_, params, _)) => {
                let bound: Vec<_> = func.args().iter().map(|arg| arg.ty()).collect();
                if bound != params {
                    self.error(
                        DiagnosticKind::SignatureMismatch,
                        entity.clone(),
                        format!(
                            "arguments do not match signature {}",
                            types.display(func.signature())
                        ),
                    );
                }
            }
        }

        if func.is_declaration() {
            if func.linkage().is_local() {
                self.error(
                    DiagnosticKind::InvalidLinkage,
                    entity,
                    format!("declaration cannot have {:?} linkage", func.linkage()),
                );
            }
            return;
        }

        let paths: Vec<String> = printer::block_labels(module, func)
            .into_iter()
            .map(|label| format!("{entity}/%{label}"))
            .collect();
        let placements = self.verify_layout(func, &paths);
        let scope = FunctionScope {
            func,
            paths,
            placements,
            tree: DominatorTree::compute(ControlFlowGraph::compute(func)),
        };

        if self.config.report_unreachable {
            for block in func.block_ids().filter(|b| !scope.tree.is_reachable(*b)) {
                self.reporter.report(Diagnostic::warning(
                    DiagnosticKind::UnreachableBlock,
                    scope.path(block),
                    "block is unreachable from the entry block",
                ));
            }
        }

        for block in func.block_ids() {
            let Some(data) = func.block(block) else { continue };
            for (position, &inst) in data.insts().iter().enumerate() {
                if self.reporter.is_full() {
                    return;
                }
                self.verify_inst(&scope, block, position, inst);
            }
        }
    }

    /// Block shape rules; returns where each instruction is placed
    fn verify_layout(&mut self, func: &FunctionData, paths: &[String]) -> Vec<Placement> {
        let mut placements: Vec<Placement> = vec![None; func.insts.len()];

        for block in func.block_ids() {
            let Some(data) = func.block(block) else { continue };
            let entity = block_path(paths, block);

            if data.is_empty() {
                self.error(DiagnosticKind::EmptyBlock, entity, "block has no instructions");
                continue;
            }

            for (position, &inst) in data.insts().iter().enumerate() {
                let Some(inst_data) = func.inst(inst) else {
                    self.error(
                        DiagnosticKind::InvalidOperand,
                        entity.clone(),
                        format!("instruction {position} refers to missing {inst:?}"),
                    );
                    continue;
                };
                if inst_data.block() != block || placements[inst.index()].is_some() {
                    self.error(
                        DiagnosticKind::InvalidOperand,
                        entity.clone(),
                        format!("instruction {position} is listed in more than one block"),
                    );
                    continue;
                }
                placements[inst.index()] = Some((block.index(), position));

                if inst_data.is_terminator() && position + 1 != data.len() {
                    self.reporter.report(
                        Diagnostic::error(
                            DiagnosticKind::TerminatorNotLast,
                            entity.clone(),
                            format!("'{}' terminator at position {position} is not last", inst_data.kind().opcode()),
                        )
                        .with_note(format!("block has {} instructions", data.len())),
                    );
                }
            }

            let terminated = func.terminator(block).is_some();
            if !terminated {
                let last = data
                    .last_inst()
                    .and_then(|inst| func.inst(inst))
                    .map(|inst| inst.kind().opcode())
                    .unwrap_or_default();
                self.reporter.report(
                    Diagnostic::error(
                        DiagnosticKind::MissingTerminator,
                        entity,
                        "block does not end in a terminator",
                    )
                    .with_note(format!("last instruction is `{last}`")),
                );
            }
        }

        placements
    }

    fn verify_inst(&mut self, scope: &FunctionScope<'_>, block: BlockId, position: usize, inst: InstRef) {
        let module = self.module;
        let types = module.types();
        let func = scope.func;
        let Some(data) = func.inst(inst) else { return };
        let entity = scope.path(block);
        let opcode = data.kind().opcode();

        let declared = match data.kind() {
            InstKind::Alloca { allocated } => Some(*allocated),
            InstKind::Load { ty, .. } => Some(*ty),
            _ => None,
        };
        let unresolved = std::iter::once(data.result_type())
            .chain(declared)
            .find(|&ty| !types.is_well_formed(ty));
        if let Some(ty) = unresolved {
            self.error(
                DiagnosticKind::InvalidType,
                entity,
                format!("'{opcode}' at position {position} mentions unresolved type {}", types.display(ty)),
            );
            return;
        }

        let site = Site {
            block,
            position,
            entity: &entity,
            opcode: &opcode,
        };
        let mut operands_ok = true;
        for operand in data.kind().operands() {
            if !self.verify_operand(scope, &site, operand) {
                operands_ok = false;
            }
        }

        for target in data.kind().successors() {
            if let Err(IrError::UnknownTarget { target, .. }) = typing::check_target(module, func.id(), target) {
                self.error(
                    DiagnosticKind::UnknownTarget,
                    entity.clone(),
                    format!("'{opcode}' targets {target}, which is not a block of @{}", func.name()),
                );
                operands_ok = false;
            }
        }

        if !operands_ok {
            return;
        }

        match typing::infer_result_type(module, func.id(), data.kind()) {
            Ok(ty) if ty != data.result_type() => self.error(
                DiagnosticKind::TypeMismatch,
                entity,
                format!(
                    "'{opcode}' records result type {}, operands give {}",
                    types.display(data.result_type()),
                    types.display(ty)
                ),
            ),
            Ok(_) => {}
            Err(err) => {
                let kind = match (&err, data.kind()) {
                    (IrError::TypeMismatch { .. }, InstKind::Ret { .. }) => DiagnosticKind::ReturnTypeMismatch,
                    (IrError::TypeMismatch { .. }, InstKind::Call { .. }) => DiagnosticKind::SignatureMismatch,
                    (IrError::TypeMismatch { .. }, _) => DiagnosticKind::TypeMismatch,
                    (IrError::ForeignValue { .. }, _) => DiagnosticKind::ForeignValue,
                    (IrError::UnknownTarget { .. }, _) => DiagnosticKind::UnknownTarget,
                    _ => DiagnosticKind::InvalidOperand,
                };
                self.error(kind, entity, format!("'{opcode}' at position {position}: {err}"));
            }
        }
    }

    /// Resolution and dominance of one operand; false if it is unusable
    fn verify_operand(&mut self, scope: &FunctionScope<'_>, site: &Site<'_>, operand: Value) -> bool {
        let module = self.module;
        let func = scope.func;
        let (entity, opcode) = (site.entity, site.opcode);
        let shown = typing::describe_value(module, operand);

        if let Some(owner) = operand.owner() {
            if owner != func.id() {
                let owner_name = module.function(owner).map(|f| f.name()).unwrap_or("<unknown>");
                self.error(
                    DiagnosticKind::ForeignValue,
                    entity,
                    format!("'{opcode}' uses {shown}, which belongs to @{owner_name}"),
                );
                return false;
            }
        }

        match module.value_type(operand) {
            None => {
                self.error(
                    DiagnosticKind::InvalidOperand,
                    entity,
                    format!("'{opcode}' uses {shown}, which does not exist"),
                );
                return false;
            }
            Some(ty) if !module.types().is_well_formed(ty) => {
                self.error(
                    DiagnosticKind::InvalidType,
                    entity,
                    format!("'{opcode}' uses {shown}, whose type does not resolve"),
                );
                return false;
            }
            Some(_) => {}
        }

        let Value::Inst(def) = operand else { return true };
        let Some((def_block, def_position)) = scope.placements.get(def.index()).copied().flatten() else {
            self.error(
                DiagnosticKind::InvalidOperand,
                entity,
                format!("'{opcode}' uses {shown}, which is not placed in any block"),
            );
            return false;
        };

        // Dominance is only meaningful on reachable code
        if !scope.tree.is_reachable(site.block) {
            return true;
        }

        if def_block == site.block.index() {
            if def_position >= site.position {
                self.error(
                    DiagnosticKind::UseBeforeDef,
                    entity,
                    format!(
                        "'{opcode}' at position {} uses {shown} defined at position {def_position}",
                        site.position
                    ),
                );
                return false;
            }
        } else {
            let def_block = BlockId {
                func: func.id(),
                index: def_block as u32,
            };
            if !scope.tree.dominates(def_block, site.block) {
                self.reporter.report(
                    Diagnostic::error(
                        DiagnosticKind::DefDoesNotDominateUse,
                        entity,
                        format!("'{opcode}' uses {shown}, whose definition does not dominate this block"),
                    )
                    .with_note(format!("{shown} is defined in {}", scope.path(def_block))),
                );
                return false;
            }
        }
        true
    }
}
