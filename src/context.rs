//! Compilation-wide state shared by the semantics passes.

use std::path::{Path, PathBuf};

use crate::diag::{Message, Messages};
use crate::symtab::{ScopeId, SymbolTable};

pub struct SemanticsContext {
    pub table: SymbolTable,
    /// Directories searched for mod files, in order.
    search_directories: Vec<PathBuf>,
    /// Directory mod files are written to.
    module_directory: PathBuf,
    pub messages: Messages,
    any_fatal_error: bool,
}

impl Default for SemanticsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticsContext {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            search_directories: vec![PathBuf::from(".")],
            module_directory: PathBuf::from("."),
            messages: Messages::new(),
            any_fatal_error: false,
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        self.table.global_scope()
    }

    pub fn search_directories(&self) -> &[PathBuf] {
        &self.search_directories
    }

    pub fn set_search_directories(&mut self, directories: Vec<PathBuf>) {
        self.search_directories = directories;
    }

    pub fn module_directory(&self) -> &Path {
        &self.module_directory
    }

    pub fn set_module_directory(&mut self, directory: PathBuf) {
        self.module_directory = directory;
    }

    pub fn say(&mut self, message: Message) {
        if message.is_fatal() {
            self.any_fatal_error = true;
        }
        self.messages.say(message);
    }

    pub fn error(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.say(Message::error(name, text));
    }

    pub fn warning(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.say(Message::warning(name, text));
    }

    /// Internal-error diagnostic: does not abort, but the run is fatal.
    pub fn internal_error(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        self.say(Message::error(name, format!("Internal: {}", text)));
    }

    /// An explicit marker for constructs this middle end does not lower yet.
    pub fn unsupported(&mut self, name: impl Into<String>, what: &str) {
        self.say(Message::warning(name, format!("{} is not supported yet", what)));
    }

    pub fn any_fatal_error(&self) -> bool {
        self.any_fatal_error
    }
}
