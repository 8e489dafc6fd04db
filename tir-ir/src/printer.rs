//! Textual IR printer
//!
//! Renders a module in an LLVM-flavoured text form. Output depends only on
//! the module contents, so printing the same module twice (or a module
//! reloaded from JSON) gives identical text. Unverified modules print on a
//! best-effort basis; unresolvable operands show up as `<badref>`.

use std::collections::HashSet;
use std::fmt::{self, Write};
use crate::function::FunctionData;
use crate::instructions::{InstData, InstKind};
use crate::module::{GlobalData, GlobalKind, Linkage, Module};
use crate::types::{TypeData, TypeId};
use crate::values::{sign_extend, BlockId, ConstId, ConstKind, FuncId, Value};

const COMMENT_COLUMN: usize = 50;

/// Render `module` as text
pub fn print_module(module: &Module) -> String {
    module.to_string()
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = escape_bytes(self.name().as_bytes());
        writeln!(f, "; ModuleID = '{name}'")?;
        writeln!(f, "source_filename = \"{name}\"")?;

        if !self.globals().is_empty() {
            writeln!(f)?;
            for global in self.globals() {
                write_global(f, self, global)?;
            }
        }

        for func in self.functions() {
            writeln!(f)?;
            FunctionPrinter::new(self, func).write(f)?;
        }
        Ok(())
    }
}

/// Label of every block of `func` in layout order, as printed
pub(crate) fn block_labels(module: &Module, func: &FunctionData) -> Vec<String> {
    FunctionPrinter::new(module, func).blocks
}

fn linkage_prefix(linkage: Linkage) -> &'static str {
    match linkage {
        Linkage::External => "",
        Linkage::Internal => "internal ",
        Linkage::Private => "private ",
    }
}

fn write_global(f: &mut fmt::Formatter<'_>, module: &Module, global: &GlobalData) -> fmt::Result {
    writeln!(
        f,
        "@{} = {}{}{} {} {}",
        ident(global.name()),
        linkage_prefix(global.linkage()),
        if global.unnamed_addr() { "unnamed_addr " } else { "" },
        match global.kind() {
            GlobalKind::Constant => "constant",
            GlobalKind::Variable => "global",
        },
        module.types().display(global.value_type()),
        constant_text(module, global.initializer()),
    )
}

/// Identifier text without sigil, quoted when it is not a plain name
fn ident(name: &str) -> String {
    let plain = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_');
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| plain(c) && !c.is_ascii_digit());
    if starts_ok && name.chars().all(plain) {
        name.to_string()
    } else {
        format!("\"{}\"", escape_bytes(name.as_bytes()))
    }
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if (byte.is_ascii_graphic() || byte == b' ') && byte != b'"' && byte != b'\\' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "\\{byte:02X}");
        }
    }
    out
}

fn constant_text(module: &Module, id: ConstId) -> String {
    let Some(data) = module.constants().get(id) else {
        return "<badref>".to_string();
    };
    match &data.kind {
        ConstKind::Int(bits) => match module.types().int_width(data.ty) {
            Some(1) => (if *bits & 1 == 1 { "true" } else { "false" }).to_string(),
            Some(width) => sign_extend(*bits, width).to_string(),
            None => bits.to_string(),
        },
        ConstKind::Bytes(bytes) => format!("c\"{}\"", escape_bytes(bytes)),
        ConstKind::Null => "null".to_string(),
        ConstKind::Zero => "zeroinitializer".to_string(),
    }
}

/// Prints one function; owns the local name table
struct FunctionPrinter<'a> {
    module: &'a Module,
    func: &'a FunctionData,
    args: Vec<String>,
    blocks: Vec<String>,
    insts: Vec<Option<String>>,
}

impl<'a> FunctionPrinter<'a> {
    fn new(module: &'a Module, func: &'a FunctionData) -> Self {
        let types = module.types();
        let mut used = HashSet::new();
        let mut next_slot = 0usize;
        let mut local = |name: Option<&str>| match name {
            Some(name) => {
                let mut candidate = name.to_string();
                let mut suffix = 0;
                while !used.insert(candidate.clone()) {
                    suffix += 1;
                    candidate = format!("{name}{suffix}");
                }
                ident(&candidate)
            }
            None => {
                next_slot += 1;
                (next_slot - 1).to_string()
            }
        };

        let args = func.args().iter().map(|arg| local(arg.name())).collect();
        let mut blocks = Vec::with_capacity(func.block_count());
        let mut insts = vec![None; func.insts.len()];

        for block in func.block_ids() {
            let Some(data) = func.block(block) else { continue };
            blocks.push(local(data.name()));
            for &inst in data.insts() {
                let Some(inst_data) = func.inst(inst) else { continue };
                if types.is_void(inst_data.result_type()) {
                    continue;
                }
                if let Some(slot) = insts.get_mut(inst.index()) {
                    if slot.is_none() {
                        *slot = Some(local(inst_data.name()));
                    }
                }
            }
        }

        Self {
            module,
            func,
            args,
            blocks,
            insts,
        }
    }

    fn ty(&self, ty: TypeId) -> String {
        self.module.types().display(ty).to_string()
    }

    fn value(&self, value: Value) -> String {
        let local = match value {
            Value::Argument(arg) if arg.func() == self.func.id() => self.args.get(arg.index()),
            Value::Inst(inst) if inst.func() == self.func.id() => {
                self.insts.get(inst.index()).and_then(Option::as_ref)
            }
            Value::Constant(id) => return constant_text(self.module, id),
            Value::Global(id) => {
                return match self.module.global(id) {
                    Some(global) => format!("@{}", ident(global.name())),
                    None => "@<badref>".to_string(),
                }
            }
            Value::Function(id) => {
                return match self.module.function(id) {
                    Some(func) => format!("@{}", ident(func.name())),
                    None => "@<badref>".to_string(),
                }
            }
            _ => None,
        };
        match local {
            Some(name) => format!("%{name}"),
            None => "%<badref>".to_string(),
        }
    }

    fn typed(&self, value: Value) -> String {
        let ty = match self.module.value_type(value) {
            Some(ty) => self.ty(ty),
            None => "<badref>".to_string(),
        };
        format!("{} {}", ty, self.value(value))
    }

    fn label(&self, block: BlockId) -> String {
        match self.blocks.get(block.index()) {
            Some(name) if block.func() == self.func.id() => format!("%{name}"),
            _ => "%<badref>".to_string(),
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.module.types();
        let (ret, params, is_vararg) = types
            .function_signature(self.func.signature())
            .map(|(ret, params, vararg)| (ret, params.to_vec(), vararg))
            .unwrap_or((types.void_type(), Vec::new(), false));

        let mut params_text: Vec<String> = if self.func.is_declaration() {
            params.iter().map(|&ty| self.ty(ty)).collect()
        } else {
            self.func
                .args()
                .iter()
                .zip(&self.args)
                .map(|(arg, name)| format!("{} %{}", self.ty(arg.ty()), name))
                .collect()
        };
        if is_vararg {
            params_text.push("...".to_string());
        }

        let keyword = if self.func.is_declaration() { "declare" } else { "define" };
        write!(
            f,
            "{} {}{} @{}({})",
            keyword,
            linkage_prefix(self.func.linkage()),
            self.ty(ret),
            ident(self.func.name()),
            params_text.join(", ")
        )?;
        if self.func.is_declaration() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;

        for (position, block) in self.func.block_ids().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            self.write_block(f, block, position == 0)?;
        }
        writeln!(f, "}}")
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, block: BlockId, is_entry: bool) -> fmt::Result {
        let mut header = format!("{}:", self.blocks.get(block.index()).map_or("<badref>", String::as_str));
        let preds = self.module.predecessors(block);
        let comment = if !preds.is_empty() {
            let names: Vec<_> = preds.iter().map(|&p| self.label(p)).collect();
            Some(format!("; preds = {}", names.join(", ")))
        } else if !is_entry {
            Some("; No predecessors!".to_string())
        } else {
            None
        };
        if let Some(comment) = comment {
            if header.len() < COMMENT_COLUMN {
                header.push_str(&" ".repeat(COMMENT_COLUMN - header.len()));
            } else {
                header.push(' ');
            }
            header.push_str(&comment);
        }
        writeln!(f, "{header}")?;

        let Some(data) = self.func.block(block) else { return Ok(()) };
        for &inst in data.insts() {
            match self.func.inst(inst) {
                Some(inst_data) => {
                    let result = self.insts.get(inst.index()).and_then(Option::as_ref);
                    match result {
                        Some(name) => writeln!(f, "  %{} = {}", name, self.inst_text(inst_data))?,
                        None => writeln!(f, "  {}", self.inst_text(inst_data))?,
                    }
                }
                None => writeln!(f, "  <badref>")?,
            }
        }
        Ok(())
    }

    fn inst_text(&self, inst: &InstData) -> String {
        match inst.kind() {
            InstKind::Binary { op, lhs, rhs } => {
                format!("{} {}, {}", op, self.typed(*lhs), self.value(*rhs))
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                format!("icmp {} {}, {}", pred, self.typed(*lhs), self.value(*rhs))
            }
            InstKind::Alloca { allocated } => format!("alloca {}", self.ty(*allocated)),
            InstKind::Load { ty, ptr } => format!("load {}, {}", self.ty(*ty), self.typed(*ptr)),
            InstKind::Store { value, ptr } => format!("store {}, {}", self.typed(*value), self.typed(*ptr)),
            InstKind::Call { callee, args } => self.call_text(inst, *callee, args),
            InstKind::Br { target } => format!("br label {}", self.label(*target)),
            InstKind::CondBr { cond, then_block, else_block } => format!(
                "br {}, label {}, label {}",
                self.typed(*cond),
                self.label(*then_block),
                self.label(*else_block)
            ),
            InstKind::Ret { value: Some(value) } => format!("ret {}", self.typed(*value)),
            InstKind::Ret { value: None } => "ret void".to_string(),
        }
    }

    fn call_text(&self, inst: &InstData, callee: FuncId, args: &[Value]) -> String {
        let args_text: Vec<_> = args.iter().map(|&arg| self.typed(arg)).collect();
        let callee_text = self.value(Value::Function(callee));
        // Vararg callees print their full signature, others just the return type
        let fn_ty = self.module.function(callee).map(FunctionData::signature);
        let ty_text = match fn_ty.and_then(|ty| self.module.types().get(ty)) {
            Some(TypeData::Function { is_vararg: true, .. }) => fn_ty.map(|ty| self.ty(ty)).unwrap_or_default(),
            _ => self.ty(inst.result_type()),
        };
        format!("call {} {}({})", ty_text, callee_text, args_text.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ident_quoting() {
        assert_eq!(ident("entry"), "entry");
        assert_eq!(ident("a.b-c$_1"), "a.b-c$_1");
        assert_eq!(ident("0"), "\"0\"");
        assert_eq!(ident("has space"), "\"has space\"");
        assert_eq!(ident(""), "\"\"");
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"Hi!\n\0"), "Hi!\\0A\\00");
        assert_eq!(escape_bytes(b"a\"b\\"), "a\\22b\\5C");
    }

    #[test]
    fn test_empty_module_header() {
        let module = Module::new("empty");
        assert_eq!(print_module(&module), "; ModuleID = 'empty'\nsource_filename = \"empty\"\n");
    }

    #[test]
    fn test_module_name_is_escaped() {
        let module = Module::new("a\"b\\c");
        assert_eq!(
            print_module(&module),
            "; ModuleID = 'a\\22b\\5Cc'\nsource_filename = \"a\\22b\\5Cc\"\n"
        );
    }
}
