//! Mod-file reader: locates, verifies, and rehydrates module files.
//!
//! The reader only orchestrates; parsing and name resolution are
//! collaborator interfaces. The defaults wired in by `ModFileReader::new`
//! are the in-crate subset parser and declaration resolver, which handle
//! exactly the canonical text the writer emits.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::ast;
use crate::context::SemanticsContext;
use crate::diag::{Message, Messages};
use crate::modfile::errors::ModFileError;
use crate::modfile::{checksum, mod_file_path, parser, CHECKSUM_DIGITS, MAGIC};
use crate::resolve::DeclResolver;
use crate::symbols::Flag;
use crate::symtab::ScopeId;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Alters diagnostic severity for constructs only a mod file may hold.
    pub is_module_file: bool,
}

pub struct ParseOutcome {
    pub program: Option<ast::Program>,
    pub messages: Messages,
    pub consumed_whole_file: bool,
}

/// The parser collaborator interface.
pub trait ModParser {
    fn parse(&self, path: &Path, options: &ParseOptions) -> ParseOutcome;
}

/// The name-resolution collaborator interface. Side-effects the context's
/// scope tree under `parent`.
pub trait NameResolver {
    fn resolve(
        &self,
        context: &mut SemanticsContext,
        program: &ast::Program,
        parent: ScopeId,
    ) -> bool;
}

/// Default parser: strips the checksum header and runs the canonical
/// declaration-subset parser over the body.
pub struct DefaultModParser;

impl ModParser for DefaultModParser {
    fn parse(&self, path: &Path, _options: &ParseOptions) -> ParseOutcome {
        let mut messages = Messages::new();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                messages.say(Message::error(
                    path.display().to_string(),
                    error.to_string(),
                ));
                return ParseOutcome {
                    program: None,
                    messages,
                    consumed_whole_file: false,
                };
            }
        };
        let body = match text.split_once('\n') {
            Some((_, body)) => body,
            None => {
                messages.say(Message::error(
                    path.display().to_string(),
                    "missing mod file header",
                ));
                return ParseOutcome {
                    program: None,
                    messages,
                    consumed_whole_file: false,
                };
            }
        };
        match parser::parse_mod_file(body) {
            Ok(program) => ParseOutcome {
                program: Some(program),
                messages,
                consumed_whole_file: true,
            },
            Err(error) => {
                messages.say(Message::error(
                    path.display().to_string(),
                    error.to_string(),
                ));
                ParseOutcome {
                    program: None,
                    messages,
                    consumed_whole_file: false,
                }
            }
        }
    }
}

pub struct ModFileReader<'a, P = DefaultModParser, R = DeclResolver> {
    context: &'a mut SemanticsContext,
    parser: P,
    resolver: R,
}

impl<'a> ModFileReader<'a> {
    pub fn new(context: &'a mut SemanticsContext) -> Self {
        Self {
            context,
            parser: DefaultModParser,
            resolver: DeclResolver,
        }
    }
}

impl<'a, P: ModParser, R: NameResolver> ModFileReader<'a, P, R> {
    pub fn with_collaborators(context: &'a mut SemanticsContext, parser: P, resolver: R) -> Self {
        Self {
            context,
            parser,
            resolver,
        }
    }

    /// Reads the module file for `name` and splices the resulting scope
    /// under the right parent: the global scope for modules, the
    /// ancestor's scope for submodules. Returns `None` when the file is
    /// missing or unusable; the diagnostics say which.
    pub fn read(&mut self, name: &str, ancestor: Option<ScopeId>) -> Option<ScopeId> {
        let mut ancestor_name = None;
        if let Some(ancestor_scope) = ancestor {
            if let Some(scope) = self.context.table.find_submodule(ancestor_scope, name) {
                return Some(scope);
            }
            ancestor_name = Some(
                self.context
                    .table
                    .scope_name(ancestor_scope)?
                    .text
                    .clone(),
            );
        } else if let Some(symbol) = self.context.table.find(self.context.global_scope(), name) {
            return self.context.table.symbol(symbol).scope;
        }

        let path = self.find_mod_file(name, ancestor_name.as_deref())?;
        if !verify_header(&path) {
            let error = ModFileError::InvalidChecksum {
                name: name.to_string(),
                path: path.clone(),
            };
            self.context.error(name, error.to_string());
            return None;
        }

        let options = ParseOptions {
            is_module_file: true,
        };
        let outcome = self.parser.parse(&path, &options);
        let program = match outcome.program {
            Some(program) if outcome.messages.is_empty() && outcome.consumed_whole_file => program,
            _ => {
                let error = ModFileError::Corrupt {
                    name: name.to_string(),
                    path,
                };
                self.context.error(name, error.to_string());
                return None;
            }
        };

        // the scope this module/submodule goes into
        let parent_scope = if ancestor.is_none() {
            self.context.global_scope()
        } else if let Some(parent) = submodule_parent(&program) {
            self.read(&parent, ancestor)?
        } else {
            ancestor.unwrap()
        };

        self.resolver.resolve(self.context, &program, parent_scope);
        let symbol = self.context.table.find(parent_scope, name)?;
        self.context.table.symbol_mut(symbol).set(Flag::ModFile);
        self.context.table.symbol(symbol).scope
    }

    /// Searches the configured directories in order. Per-directory
    /// failures attach to one "cannot find" error only if no candidate
    /// succeeds.
    fn find_mod_file(&mut self, name: &str, ancestor: Option<&str>) -> Option<PathBuf> {
        let mut attachments = Vec::new();
        let directories = self.context.search_directories().to_vec();
        for dir in &directories {
            let path = mod_file_path(dir, name, ancestor);
            log::trace!("trying mod file candidate {}", path.display());
            match fs::File::open(&path) {
                Err(error) => {
                    attachments.push(Message::warning(
                        name,
                        format!("{}: {}", path.display(), error),
                    ));
                }
                Ok(file) => {
                    let mut first_line = String::new();
                    let mut reader = BufReader::new(file);
                    let _ = reader.read_line(&mut first_line);
                    if first_line.starts_with(MAGIC) {
                        return Some(path);
                    }
                    attachments.push(Message::warning(
                        name,
                        format!("{}: Not a valid module file", path.display()),
                    ));
                }
            }
        }
        let text = match ancestor {
            None => format!("Cannot find module file for '{}'", name),
            Some(ancestor) => format!(
                "Cannot find module file for submodule '{}' of module '{}'",
                name, ancestor
            ),
        };
        self.context
            .say(Message::error(name, text).attach_all(attachments));
        None
    }
}

/// Splits the header from the body at the first newline, recomputes the
/// checksum of the body, and compares the 16 hex digits after the magic.
fn verify_header(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Some((header, body)) = contents.split_once('\n') else {
        return false;
    };
    let Some(expected) = header.strip_prefix(MAGIC) else {
        return false;
    };
    if expected.len() != CHECKSUM_DIGITS {
        return false;
    }
    expected == checksum(body.as_bytes())
}

/// The name of the parent submodule named by a `submodule(a:b) c`
/// statement, when the parent is not the ancestor module itself.
fn submodule_parent(program: &ast::Program) -> Option<String> {
    match program.units.first() {
        Some(ast::ProgramUnit::Submodule(submodule)) => submodule
            .stmt
            .stmt
            .parent
            .as_ref()
            .map(|parent| parent.text.clone()),
        _ => None,
    }
}
