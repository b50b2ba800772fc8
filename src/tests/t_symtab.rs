use crate::symbols::{Attrs, Details, Flag, ModuleDetails, SourceName, SubmoduleDetails};
use crate::symtab::{ScopeKind, SymbolTable};

#[test]
fn system_and_global_scopes_exist() {
    let table = SymbolTable::new();
    assert_eq!(table.scope(table.system_scope()).kind, ScopeKind::System);
    assert_eq!(table.scope(table.global_scope()).kind, ScopeKind::Global);
    assert_eq!(
        table.scope(table.global_scope()).parent,
        Some(table.system_scope())
    );
    assert!(table.scope(table.system_scope()).parent.is_none());
}

#[test]
fn symbols_keep_insertion_order() {
    let mut table = SymbolTable::new();
    let scope = table.make_scope(table.global_scope(), ScopeKind::Module);
    for (index, name) in ["c", "a", "b"].iter().enumerate() {
        table.make_symbol(
            scope,
            SourceName::new(*name, index * 10),
            Attrs::new(),
            Details::Misc(crate::symbols::MiscDetails),
        );
    }
    let names: Vec<&String> = table.scope(scope).symbols.keys().collect();
    assert_eq!(names, ["c", "a", "b"]);
}

#[test]
fn find_walks_one_scope_only() {
    let mut table = SymbolTable::new();
    let module = table.make_scope(table.global_scope(), ScopeKind::Module);
    let inner = table.make_scope(module, ScopeKind::Subprogram);
    table.make_symbol(
        module,
        SourceName::new("x", 0),
        Attrs::new(),
        Details::Misc(crate::symbols::MiscDetails),
    );
    assert!(table.find(module, "x").is_some());
    assert!(table.find(inner, "x").is_none());
}

#[test]
fn find_submodule_by_name() {
    let mut table = SymbolTable::new();
    let global = table.global_scope();
    let module_scope = table.make_scope(global, ScopeKind::Module);
    let module = table.make_symbol(
        global,
        SourceName::new("a", 0),
        Attrs::new(),
        Details::Module(ModuleDetails {
            scope: Some(module_scope),
        }),
    );
    table.set_symbol_scope(module, module_scope);

    let submodule_scope = table.make_scope(module_scope, ScopeKind::Submodule);
    let submodule = table.make_symbol(
        module_scope,
        SourceName::new("b", 10),
        Attrs::new(),
        Details::Submodule(SubmoduleDetails {
            scope: Some(submodule_scope),
            parent: module_scope,
            ancestor: module_scope,
        }),
    );
    table.set_symbol_scope(submodule, submodule_scope);

    assert_eq!(table.find_submodule(module_scope, "b"), Some(submodule_scope));
    assert_eq!(table.find_submodule(module_scope, "c"), None);
    assert!(!table.is_mod_file_scope(submodule_scope));

    table.symbol_mut(submodule).set(Flag::ModFile);
    assert!(table.is_mod_file_scope(submodule_scope));
}
