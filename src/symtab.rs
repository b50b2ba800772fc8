//! Scope tree and symbol arena.
//!
//! Scopes and symbols live in one `SymbolTable` and are addressed by
//! `ScopeId`/`SymbolId` handles. Ownership runs parent to children; the
//! parent handle is for lookup only. The `System` scope is created first
//! and is unique; the `Global` scope sits directly under it.

use indexmap::IndexMap;

use crate::symbols::{Attrs, Details, Flag, SourceName, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    System,
    Global,
    Module,
    Submodule,
    DerivedType,
    Subprogram,
    MainProgram,
    Block,
    Forall,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// The symbol this scope belongs to (module, subprogram, derived type).
    pub symbol: Option<SymbolId>,
    /// Insertion-ordered name table.
    pub symbols: IndexMap<String, SymbolId>,
    /// Common blocks are named in their own namespace.
    pub common_blocks: IndexMap<String, SymbolId>,
    pub children: Vec<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    system: ScopeId,
    global: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            scopes: Vec::new(),
            symbols: Vec::new(),
            system: ScopeId(0),
            global: ScopeId(0),
        };
        table.system = table.push_scope(ScopeKind::System, None);
        table.global = table.push_scope(ScopeKind::Global, Some(table.system));
        table
    }

    fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            kind,
            parent,
            symbol: None,
            symbols: IndexMap::new(),
            common_blocks: IndexMap::new(),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        id
    }

    pub fn system_scope(&self) -> ScopeId {
        self.system
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn make_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        assert!(
            kind != ScopeKind::System && kind != ScopeKind::Global,
            "system and global scopes are singletons"
        );
        self.push_scope(kind, Some(parent))
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    /// Creates a symbol in `scope`, replacing any previous binding of the name.
    pub fn make_symbol(
        &mut self,
        scope: ScopeId,
        name: SourceName,
        attrs: Attrs,
        details: Details,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let key = name.text.clone();
        self.symbols.push(Symbol::new(name, scope, attrs, details));
        self.scopes[scope.index()].symbols.insert(key, id);
        id
    }

    /// Creates a symbol without binding it in the scope's name table
    /// (common-block members that are not otherwise declared).
    pub fn make_detached_symbol(
        &mut self,
        scope: ScopeId,
        name: SourceName,
        attrs: Attrs,
        details: Details,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::new(name, scope, attrs, details));
        id
    }

    /// Creates a common-block symbol in the scope's common-block namespace.
    pub fn make_common_block(
        &mut self,
        scope: ScopeId,
        name: SourceName,
        attrs: Attrs,
        details: Details,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let key = name.text.clone();
        self.symbols.push(Symbol::new(name, scope, attrs, details));
        self.scopes[scope.index()].common_blocks.insert(key, id);
        id
    }

    pub fn find(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).symbols.get(name).copied()
    }

    /// Links a symbol with the scope it owns (module, subprogram, type).
    pub fn set_symbol_scope(&mut self, symbol: SymbolId, scope: ScopeId) {
        self.symbols[symbol.index()].scope = Some(scope);
        self.scopes[scope.index()].symbol = Some(symbol);
    }

    /// The name of the symbol a scope belongs to.
    pub fn scope_name(&self, scope: ScopeId) -> Option<&SourceName> {
        self.scope(scope).symbol.map(|id| self.symbol(id).name())
    }

    /// Searches the children of `scope` for a submodule scope of that name.
    pub fn find_submodule(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.scope(scope).children.iter().copied().find(|&child| {
            self.scope(child).kind == ScopeKind::Submodule
                && self
                    .scope_name(child)
                    .is_some_and(|source_name| source_name.text == name)
        })
    }

    /// True for module scopes loaded back from a mod file.
    pub fn is_mod_file_scope(&self, scope: ScopeId) -> bool {
        self.scope(scope)
            .symbol
            .is_some_and(|symbol| self.symbol(symbol).test(Flag::ModFile))
    }
}

#[cfg(test)]
#[path = "tests/t_symtab.rs"]
mod tests;
