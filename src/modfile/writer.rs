//! Mod-file writer: deterministic serialization of module scopes.
//!
//! Symbols are emitted in declaration order (ascending source-name
//! offset), namelists after everything else, common blocks appended.
//! Attributes render in enumeration order; `public` and `external` are
//! never written. A file that already holds the exact bytes is left
//! untouched so rebuilds do not invalidate downstream timestamps.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::context::SemanticsContext;
use crate::expr::Expression;
use crate::modfile::errors::ModFileError;
use crate::modfile::{header, mod_file_path};
use crate::symbols::{Attr, Attrs, Bound, Details, Flag, ShapeSpec};
use crate::symtab::{ScopeId, ScopeKind, SymbolId, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held the exact bytes; it was not reopened for write.
    Unchanged,
}

pub struct ModFileWriter<'a> {
    context: &'a mut SemanticsContext,
    uses: String,
    use_extra_attrs: String,
    decls: String,
    contains: String,
}

impl<'a> ModFileWriter<'a> {
    pub fn new(context: &'a mut SemanticsContext) -> Self {
        Self {
            context,
            uses: String::new(),
            use_extra_attrs: String::new(),
            decls: String::new(),
            contains: String::new(),
        }
    }

    /// Writes mod files for every module under the global scope.
    pub fn write_all(&mut self) -> bool {
        self.write_children(self.context.global_scope());
        !self.context.any_fatal_error()
    }

    fn write_children(&mut self, scope: ScopeId) {
        let children = self.context.table.scope(scope).children.clone();
        for child in children {
            self.write_one(child);
        }
    }

    fn write_one(&mut self, scope: ScopeId) {
        let kind = self.context.table.scope(scope).kind;
        if kind == ScopeKind::Module || kind == ScopeKind::Submodule {
            if let Some(symbol) = self.context.table.scope(scope).symbol {
                if !self.context.table.symbol(symbol).test(Flag::ModFile) {
                    self.write(symbol);
                }
            }
            // write out submodules
            self.write_children(scope);
        }
    }

    /// Writes the mod file for `symbol`, which must be a module or submodule.
    fn write(&mut self, symbol: SymbolId) {
        let (name, ancestor) = {
            let symbol_ref = self.context.table.symbol(symbol);
            let ancestor = match &symbol_ref.details {
                Details::Module(_) => None,
                Details::Submodule(details) => Some(
                    self.context
                        .table
                        .scope_name(details.ancestor)
                        .expect("submodule ancestor scope has no symbol")
                        .text
                        .clone(),
                ),
                _ => panic!("semantics bug: writing a non-module symbol"),
            };
            (symbol_ref.name().text.clone(), ancestor)
        };
        let path = mod_file_path(self.context.module_directory(), &name, ancestor.as_deref());
        let scope = self
            .context
            .table
            .symbol(symbol)
            .scope
            .expect("module symbol has no scope");
        self.put_symbols(scope);
        let contents = self.get_as_string(symbol);
        if let Err(error) = write_file(&path, &contents) {
            self.context.error(name, error.to_string());
        }
    }

    /// Returns the entire body of the module file and clears the buffers.
    fn get_as_string(&mut self, symbol: SymbolId) -> String {
        let table = &self.context.table;
        let symbol_ref = table.symbol(symbol);
        let mut all = String::new();
        match &symbol_ref.details {
            Details::Module(_) => {
                all.push_str("module ");
                all.push_str(&lower(&symbol_ref.name().text));
            }
            Details::Submodule(details) => {
                let ancestor = table
                    .scope_name(details.ancestor)
                    .expect("submodule ancestor scope has no symbol");
                all.push_str("submodule(");
                all.push_str(&lower(&ancestor.text));
                if details.parent != details.ancestor {
                    let parent = table
                        .scope_name(details.parent)
                        .expect("submodule parent scope has no symbol");
                    all.push(':');
                    all.push_str(&lower(&parent.text));
                }
                all.push_str(") ");
                all.push_str(&lower(&symbol_ref.name().text));
            }
            _ => panic!("semantics bug: writing a non-module symbol"),
        }
        all.push('\n');
        all.push_str(&std::mem::take(&mut self.uses));
        all.push_str(&std::mem::take(&mut self.use_extra_attrs));
        all.push_str(&std::mem::take(&mut self.decls));
        let contains = std::mem::take(&mut self.contains);
        if !contains.is_empty() {
            all.push_str("contains\n");
            all.push_str(&contains);
        }
        all.push_str("end\n");
        all
    }

    /// Puts out the visible symbols from a scope. Type-bound procedures
    /// collect into a trailing `contains` section.
    fn put_symbols(&mut self, scope: ScopeId) {
        let mut type_bindings = String::new();
        for symbol in collect_symbols(&self.context.table, scope) {
            self.put_symbol(&mut type_bindings, symbol);
        }
        if !type_bindings.is_empty() {
            self.decls.push_str("contains\n");
            self.decls.push_str(&type_bindings);
        }
    }

    fn put_symbol(&mut self, type_bindings: &mut String, symbol: SymbolId) {
        let details = self.context.table.symbol(symbol).details.clone();
        match details {
            Details::Module(_) | Details::Submodule(_) => {
                // the current module itself
            }
            Details::DerivedType(_) => self.put_derived_type(symbol),
            Details::Subprogram(_) => self.put_subprogram(symbol),
            Details::Generic(generic) => {
                self.put_generic(symbol);
                if let Some(specific) = generic.specific {
                    self.put_symbol(type_bindings, specific);
                }
                if let Some(derived_type) = generic.derived_type {
                    self.put_symbol(type_bindings, derived_type);
                }
            }
            Details::Use(_) => self.put_use(symbol),
            Details::UseError(_) => {}
            Details::ProcBinding(binding) => {
                let table = &self.context.table;
                let symbol_ref = table.symbol(symbol);
                let deferred = symbol_ref.attrs.test(Attr::Deferred);
                let bound_name = lower(&table.symbol(binding.symbol).name().text);
                type_bindings.push_str("procedure");
                if deferred {
                    type_bindings.push('(');
                    type_bindings.push_str(&bound_name);
                    type_bindings.push(')');
                }
                type_bindings.push_str(&pass_name_string(&binding.pass_name));
                type_bindings.push_str(&attrs_string(symbol_ref.attrs, None, ",", ""));
                type_bindings.push_str("::");
                type_bindings.push_str(&lower(&symbol_ref.name().text));
                if !deferred && bound_name != lower(&symbol_ref.name().text) {
                    type_bindings.push_str("=>");
                    type_bindings.push_str(&bound_name);
                }
                type_bindings.push('\n');
            }
            Details::GenericBinding(binding) => {
                let table = &self.context.table;
                let name = lower(&table.symbol(symbol).name().text);
                for proc in &binding.specific_procs {
                    type_bindings.push_str("generic::");
                    type_bindings.push_str(&name);
                    type_bindings.push_str("=>");
                    type_bindings.push_str(&lower(&table.symbol(*proc).name().text));
                    type_bindings.push('\n');
                }
            }
            Details::Namelist(namelist) => {
                let table = &self.context.table;
                self.decls.push_str("namelist/");
                self.decls
                    .push_str(&lower(&table.symbol(symbol).name().text));
                let mut separator = '/';
                for object in &namelist.objects {
                    self.decls.push(separator);
                    self.decls
                        .push_str(&lower(&table.symbol(*object).name().text));
                    separator = ',';
                }
                self.decls.push('\n');
            }
            Details::CommonBlock(common) => {
                let table = &self.context.table;
                let symbol_ref = table.symbol(symbol);
                let name = lower(&symbol_ref.name().text);
                self.decls.push_str("common/");
                self.decls.push_str(&name);
                let mut separator = '/';
                for object in &common.objects {
                    self.decls.push(separator);
                    self.decls
                        .push_str(&lower(&table.symbol(*object).name().text));
                    separator = ',';
                }
                self.decls.push('\n');
                if symbol_ref.attrs.test(Attr::BindC) {
                    self.decls.push_str(&attrs_string(
                        symbol_ref.attrs,
                        common.bind_name.as_ref(),
                        "",
                        "",
                    ));
                    self.decls.push_str("::/");
                    self.decls.push_str(&name);
                    self.decls.push_str("/\n");
                }
            }
            Details::FinalProc(_) => {
                type_bindings.push_str("final::");
                type_bindings.push_str(&lower(&self.context.table.symbol(symbol).name().text));
                type_bindings.push('\n');
            }
            Details::HostAssoc(_) | Details::Misc(_) => {}
            Details::ObjectEntity(_) | Details::ProcEntity(_) | Details::TypeParam(_) => {
                let line = entity_string(&self.context.table, symbol);
                self.decls.push_str(&line);
            }
        }
    }

    fn put_derived_type(&mut self, symbol: SymbolId) {
        let (line, sequence, type_scope) = {
            let table = &self.context.table;
            let symbol_ref = table.symbol(symbol);
            let details = match &symbol_ref.details {
                Details::DerivedType(details) => details,
                _ => unreachable!(),
            };
            let mut line = String::from("type");
            line.push_str(&attrs_string(symbol_ref.attrs, None, ",", ""));
            if let Some(extends) = details.extends {
                line.push_str(",extends(");
                line.push_str(&lower(&table.symbol(extends).name().text));
                line.push(')');
            }
            line.push_str("::");
            line.push_str(&lower(&symbol_ref.name().text));
            if !details.param_names.is_empty() {
                line.push('(');
                for (index, param) in details.param_names.iter().enumerate() {
                    if index > 0 {
                        line.push(',');
                    }
                    line.push_str(&lower(&param.text));
                }
                line.push(')');
            }
            line.push('\n');
            let type_scope = symbol_ref.scope.expect("derived type has no scope");
            (line, details.sequence, type_scope)
        };
        self.decls.push_str(&line);
        if sequence {
            self.decls.push_str("sequence\n");
        }
        self.put_symbols(type_scope);
        self.decls.push_str("end type\n");
    }

    fn put_subprogram(&mut self, symbol: SymbolId) {
        let table = &self.context.table;
        let symbol_ref = table.symbol(symbol);
        let details = match &symbol_ref.details {
            Details::Subprogram(details) => details.clone(),
            _ => unreachable!(),
        };
        let mut attrs = symbol_ref.attrs;
        let mut bind_attrs = Attrs::new();
        if attrs.test(Attr::BindC) {
            // bind(c) is a suffix, not prefix
            bind_attrs.insert(Attr::BindC);
            attrs.remove(Attr::BindC);
        }
        let mut out = String::new();
        if details.is_interface {
            out.push_str("interface\n");
        }
        out.push_str(&attrs_string(attrs, None, "", " "));
        out.push_str(if details.is_function {
            "function "
        } else {
            "subroutine "
        });
        out.push_str(&lower(&symbol_ref.name().text));
        out.push('(');
        for (index, dummy) in details.dummy_args.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(&lower(&table.symbol(*dummy).name().text));
        }
        out.push(')');
        out.push_str(&attrs_string(bind_attrs, details.bind_name.as_ref(), " ", ""));
        if details.is_function {
            let result = details.result.expect("function has no result symbol");
            let result_name = lower(&table.symbol(result).name().text);
            if result_name != lower(&symbol_ref.name().text) {
                out.push_str(" result(");
                out.push_str(&result_name);
                out.push(')');
            }
            out.push('\n');
            out.push_str(&entity_string(table, result));
        } else {
            out.push('\n');
        }
        for dummy in &details.dummy_args {
            out.push_str(&entity_string(table, *dummy));
        }
        out.push_str("end\n");
        if details.is_interface {
            out.push_str("end interface\n");
            self.decls.push_str(&out);
        } else {
            self.contains.push_str(&out);
        }
    }

    fn put_generic(&mut self, symbol: SymbolId) {
        let table = &self.context.table;
        let symbol_ref = table.symbol(symbol);
        let details = match &symbol_ref.details {
            Details::Generic(details) => details,
            _ => unreachable!(),
        };
        let mut out = String::from("generic");
        out.push_str(&attrs_string(symbol_ref.attrs, None, ",", ""));
        out.push_str("::");
        match details.kind {
            crate::symbols::GenericKind::DefinedOp => {
                out.push_str("operator(");
                out.push_str(&lower(&symbol_ref.name().text));
                out.push(')');
            }
            crate::symbols::GenericKind::Assignment => out.push_str("assignment(=)"),
            crate::symbols::GenericKind::Name => {
                out.push_str(&lower(&symbol_ref.name().text));
            }
        }
        out.push_str("=>");
        for (index, specific) in details.specific_procs.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(&lower(&table.symbol(*specific).name().text));
        }
        out.push('\n');
        self.decls.push_str(&out);
    }

    fn put_use(&mut self, symbol: SymbolId) {
        let table = &self.context.table;
        let symbol_ref = table.symbol(symbol);
        let details = match &symbol_ref.details {
            Details::Use(details) => details.clone(),
            _ => unreachable!(),
        };
        let used = table.symbol(details.symbol);
        let local_name = lower(&symbol_ref.name().text);
        self.uses.push_str("use ");
        self.uses
            .push_str(&lower(&table.symbol(details.module).name().text));
        self.uses.push_str(",only:");
        self.uses.push_str(&local_name);
        if lower(&used.name().text) != local_name {
            self.uses.push_str("=>");
            self.uses.push_str(&lower(&used.name().text));
        }
        self.uses.push('\n');
        self.put_use_extra_attr(Attr::Volatile, symbol, details.symbol);
        self.put_use_extra_attr(Attr::Asynchronous, symbol, details.symbol);
    }

    // We have "use local => used" in this module. If the attribute was
    // added locally, it has to be written out as its own declaration.
    fn put_use_extra_attr(&mut self, attr: Attr, local: SymbolId, used: SymbolId) {
        let table = &self.context.table;
        if table.symbol(local).attrs.test(attr) && !table.symbol(used).attrs.test(attr) {
            self.use_extra_attrs.push_str(&attr.to_string());
            self.use_extra_attrs.push_str("::");
            self.use_extra_attrs
                .push_str(&lower(&table.symbol(local).name().text));
            self.use_extra_attrs.push('\n');
        }
    }
}

fn lower(text: &str) -> String {
    text.to_lowercase()
}

/// Collects the symbols of a scope in declaration order (ascending
/// source-name offset), namelists last, common blocks appended.
fn collect_symbols(table: &SymbolTable, scope: ScopeId) -> Vec<SymbolId> {
    let scope_ref = table.scope(scope);
    let mut seen: HashSet<SymbolId> = HashSet::new();
    let mut sorted: Vec<SymbolId> = Vec::with_capacity(scope_ref.symbols.len());
    for &symbol in scope_ref.symbols.values() {
        if !table.symbol(symbol).test(Flag::ParentComp) && seen.insert(symbol) {
            sorted.push(symbol);
        }
    }
    for &symbol in scope_ref.common_blocks.values() {
        if seen.insert(symbol) {
            sorted.push(symbol);
        }
    }
    sorted.sort_by_key(|&symbol| {
        let symbol_ref = table.symbol(symbol);
        (symbol_ref.is_namelist(), symbol_ref.name().offset)
    });
    sorted
}

/// Renders an attribute set, each attribute surrounded by `before` and
/// `after`. `public` and `external` are never written; a bind name
/// renders as `bind(c, name=...)` and consumes the `bind(c)` flag.
fn attrs_string(
    mut attrs: Attrs,
    bind_name: Option<&Expression>,
    before: &str,
    after: &str,
) -> String {
    let mut out = String::new();
    attrs.remove(Attr::Public); // no need to write public
    attrs.remove(Attr::External); // no need to write external
    if let Some(bind_name) = bind_name {
        out.push_str(before);
        out.push_str("bind(c, name=");
        out.push_str(&bind_name.as_fortran());
        out.push(')');
        out.push_str(after);
        attrs.remove(Attr::BindC);
    }
    for attr in attrs.iter() {
        out.push_str(before);
        out.push_str(&attr.to_string());
        out.push_str(after);
    }
    out
}

fn pass_name_string(pass_name: &Option<String>) -> String {
    match pass_name {
        Some(name) => format!(",pass({})", lower(name)),
        None => String::new(),
    }
}

fn bound_string(bound: &Bound) -> String {
    match bound {
        Bound::Assumed => "*".to_string(),
        Bound::Deferred => String::new(),
        Bound::Explicit(expr) => expr.as_fortran(),
    }
}

fn shape_string(shape: &[ShapeSpec]) -> String {
    if shape.is_empty() {
        return String::new();
    }
    let mut out = String::from("(");
    for (index, spec) in shape.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if spec.lower == Bound::Assumed && spec.upper == Bound::Assumed {
            out.push_str("..");
        } else {
            out.push_str(&bound_string(&spec.lower));
            out.push(':');
            out.push_str(&bound_string(&spec.upper));
        }
    }
    out.push(')');
    out
}

/// One entity (object, procedure entity, or type parameter) declaration.
fn entity_string(table: &SymbolTable, symbol: SymbolId) -> String {
    let symbol_ref = table.symbol(symbol);
    let mut out = String::new();
    match &symbol_ref.details {
        Details::ObjectEntity(details) => {
            let type_spec = details
                .type_spec
                .as_ref()
                .expect("object entity has no type");
            out.push_str(&type_spec.to_string());
            out.push_str(&attrs_string(
                symbol_ref.attrs,
                details.bind_name.as_ref(),
                ",",
                "",
            ));
            out.push_str("::");
            out.push_str(&lower(&symbol_ref.name().text));
            out.push_str(&shape_string(&details.shape));
            if let Some(init) = &details.init {
                out.push('=');
                out.push_str(&init.as_fortran());
            }
        }
        Details::ProcEntity(details) => {
            out.push_str("procedure(");
            if let Some(interface_symbol) = details.interface.symbol {
                out.push_str(&lower(&table.symbol(interface_symbol).name().text));
            } else if let Some(type_spec) = &details.interface.type_spec {
                out.push_str(&type_spec.to_string());
            }
            out.push(')');
            out.push_str(&pass_name_string(&details.pass_name));
            out.push_str(&attrs_string(
                symbol_ref.attrs,
                details.bind_name.as_ref(),
                ",",
                "",
            ));
            out.push_str("::");
            out.push_str(&lower(&symbol_ref.name().text));
        }
        Details::TypeParam(details) => {
            let type_spec = details
                .type_spec
                .as_ref()
                .expect("type parameter has no type");
            out.push_str(&type_spec.to_string());
            out.push(',');
            out.push_str(&details.attr.to_string());
            out.push_str(&attrs_string(symbol_ref.attrs, None, ",", ""));
            out.push_str("::");
            out.push_str(&lower(&symbol_ref.name().text));
            if let Some(init) = &details.init {
                out.push('=');
                out.push_str(&init.as_fortran());
            }
        }
        details => panic!(
            "semantics bug: unexpected entity details: {}",
            details.kind_name()
        ),
    }
    out.push('\n');
    out
}

/// Writes the mod file at `path`, prepending the checksum header. The
/// file is not reopened for writing when it already matches.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<WriteOutcome, ModFileError> {
    let header = header(contents);
    let mut bytes = Vec::with_capacity(header.len() + 1 + contents.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(contents.as_bytes());
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() == bytes.len() as u64 {
            if let Ok(existing) = fs::read(path) {
                if existing == bytes {
                    return Ok(WriteOutcome::Unchanged);
                }
            }
        }
    }
    fs::write(path, &bytes).map_err(|source| ModFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriteOutcome::Written)
}
