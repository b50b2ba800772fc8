//! Parser for the canonical declaration subset the mod-file writer emits.
//!
//! Mod files are machine-generated: lowercase keywords, one declaration
//! per line, no continuation lines, no comments past the header. That
//! makes a line-oriented recursive descent sufficient. Name offsets are
//! byte positions in the body text, so declaration order survives a
//! round trip through the resolver.

use thiserror::Error;

use crate::ast;
use crate::symbols::{Attr, TypeParamAttr};
use crate::types::{DeclTypeSpec, TypeCategory};

#[derive(Debug, Clone, Error)]
#[error("{message} at byte {offset}")]
pub struct ModParseError {
    pub offset: usize,
    pub message: String,
}

fn err<T>(offset: usize, message: impl Into<String>) -> Result<T, ModParseError> {
    Err(ModParseError {
        offset,
        message: message.into(),
    })
}

/// Parses a mod-file body (the text after the checksum header).
pub fn parse_mod_file(text: &str) -> Result<ast::Program, ModParseError> {
    let mut parser = Parser::new(text);
    let unit = parser.parse_unit()?;
    if parser.peek().is_some() {
        return err(parser.peek().unwrap().offset, "trailing text after end");
    }
    Ok(ast::Program { units: vec![unit] })
}

#[derive(Clone, Copy)]
struct Line<'a> {
    offset: usize,
    text: &'a str,
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for line in text.split('\n') {
            if !line.is_empty() {
                lines.push(Line { offset, text: line });
            }
            offset += line.len() + 1;
        }
        Self { lines, index: 0 }
    }

    fn peek(&self) -> Option<&Line<'a>> {
        self.lines.get(self.index)
    }

    fn bump(&mut self) -> Option<Line<'a>> {
        let line = self.lines.get(self.index).copied();
        if line.is_some() {
            self.index += 1;
        }
        line
    }

    fn expect_line(&mut self, expected: &str) -> Result<(), ModParseError> {
        match self.bump() {
            Some(line) if line.text == expected => Ok(()),
            Some(line) => err(line.offset, format!("expected '{}'", expected)),
            None => err(usize::MAX, format!("expected '{}', found end of file", expected)),
        }
    }

    fn parse_unit(&mut self) -> Result<ast::ProgramUnit, ModParseError> {
        let line = match self.bump() {
            Some(line) => line,
            None => return err(0, "empty module file"),
        };
        let mut cursor = Cursor::new(line.text, line.offset);
        if cursor.eat("module ") {
            let name = cursor.take_name()?;
            cursor.expect_end()?;
            let (spec, contains) = self.parse_module_body()?;
            Ok(ast::ProgramUnit::Module(ast::ModuleUnit {
                stmt: ast::Statement::new(ast::ModuleStmt { name }),
                spec,
                contains,
            }))
        } else if cursor.eat("submodule(") {
            let ancestor = cursor.take_name()?;
            let parent = if cursor.eat(":") {
                Some(cursor.take_name()?)
            } else {
                None
            };
            cursor.expect(") ")?;
            let name = cursor.take_name()?;
            cursor.expect_end()?;
            let (spec, contains) = self.parse_module_body()?;
            Ok(ast::ProgramUnit::Submodule(ast::SubmoduleUnit {
                stmt: ast::Statement::new(ast::SubmoduleStmt {
                    ancestor,
                    parent,
                    name,
                }),
                spec,
                contains,
            }))
        } else {
            err(line.offset, "expected module or submodule header")
        }
    }

    fn parse_module_body(
        &mut self,
    ) -> Result<(ast::SpecificationPart, Vec<ast::ModuleSubprogram>), ModParseError> {
        let spec = self.parse_specification(false)?;
        let mut contains = Vec::new();
        if self.peek().is_some_and(|line| line.text == "contains") {
            self.bump();
            while self.peek().is_some_and(|line| line.text != "end") {
                contains.push(self.parse_subprogram()?);
            }
        }
        self.expect_line("end")?;
        Ok((spec, contains))
    }

    /// Parses declaration lines until `contains`, `end`, or (inside an
    /// interface body) `end interface`.
    fn parse_specification(
        &mut self,
        in_subprogram: bool,
    ) -> Result<ast::SpecificationPart, ModParseError> {
        let mut decls = Vec::new();
        loop {
            let (offset, text) = match self.peek() {
                Some(line) => (line.offset, line.text),
                None => return err(usize::MAX, "unexpected end of module file"),
            };
            match text {
                "end" | "contains" => break,
                "interface" => {
                    if in_subprogram {
                        return err(offset, "nested interface block");
                    }
                    self.bump();
                    let mut subprograms = Vec::new();
                    while self.peek().is_some_and(|line| line.text != "end interface") {
                        subprograms.push(self.parse_subprogram()?);
                    }
                    self.expect_line("end interface")?;
                    decls.push(ast::DeclarationConstruct::Interface(ast::InterfaceBlock {
                        subprograms,
                    }));
                    continue;
                }
                _ => {}
            }
            let line = self.bump().unwrap();
            let mut cursor = Cursor::new(line.text, line.offset);
            if cursor.eat("use ") {
                decls.push(ast::DeclarationConstruct::Use(parse_use(&mut cursor)?));
            } else if cursor.eat("namelist/") {
                let name = cursor.take_name()?;
                cursor.expect("/")?;
                let objects = parse_name_list(&mut cursor)?;
                cursor.expect_end()?;
                decls.push(ast::DeclarationConstruct::Namelist(ast::NamelistStmt {
                    name,
                    objects,
                }));
            } else if cursor.eat("common/") {
                let name = cursor.take_name()?;
                cursor.expect("/")?;
                let objects = parse_name_list(&mut cursor)?;
                cursor.expect_end()?;
                decls.push(ast::DeclarationConstruct::Common(ast::CommonStmt {
                    name,
                    objects,
                }));
            } else if cursor.eat("generic") {
                decls.push(ast::DeclarationConstruct::Generic(parse_generic(
                    &mut cursor,
                )?));
            } else if cursor.rest().starts_with("bind(") {
                decls.push(ast::DeclarationConstruct::CommonBind(parse_common_bind(
                    &mut cursor,
                )?));
            } else if cursor.eat("procedure(") {
                let decl = parse_proc_decl(&mut cursor)?;
                decls.push(ast::DeclarationConstruct::Procedure(decl));
            } else if cursor.rest().starts_with("type,")
                || cursor.rest().starts_with("type::")
            {
                let def = self.parse_derived_type(line.text, line.offset)?;
                decls.push(ast::DeclarationConstruct::DerivedType(def));
            } else if let Some(attr) = parse_standalone_attr(&mut cursor)? {
                decls.push(ast::DeclarationConstruct::Attr(attr));
            } else {
                let component = parse_entity_like(&mut cursor)?;
                match component {
                    ast::ComponentDecl::Entity(entity) => {
                        decls.push(ast::DeclarationConstruct::Entity(entity));
                    }
                    _ => return err(offset, "type parameter outside derived type"),
                }
            }
        }
        Ok(ast::SpecificationPart { decls })
    }

    fn parse_derived_type(
        &mut self,
        header: &str,
        header_offset: usize,
    ) -> Result<ast::DerivedTypeDef, ModParseError> {
        let mut cursor = Cursor::new(header, header_offset);
        cursor.expect("type")?;
        let mut attrs = Vec::new();
        let mut extends = None;
        while cursor.eat(",") {
            if cursor.eat("extends(") {
                extends = Some(cursor.take_name()?);
                cursor.expect(")")?;
            } else {
                attrs.push(cursor.take_attr()?);
            }
        }
        cursor.expect("::")?;
        let name = cursor.take_name()?;
        let mut param_names = Vec::new();
        if cursor.eat("(") {
            param_names = parse_name_list(&mut cursor)?;
            cursor.expect(")")?;
        }
        cursor.expect_end()?;

        let mut sequence = false;
        if self.peek().is_some_and(|line| line.text == "sequence") {
            self.bump();
            sequence = true;
        }
        let mut components = Vec::new();
        let mut bindings = Vec::new();
        let mut in_contains = false;
        loop {
            let (offset, text) = match self.peek() {
                Some(line) => (line.offset, line.text),
                None => return err(usize::MAX, "unterminated derived type"),
            };
            if text == "end type" {
                self.bump();
                break;
            }
            if text == "contains" {
                self.bump();
                in_contains = true;
                continue;
            }
            let line = self.bump().unwrap();
            let mut cursor = Cursor::new(line.text, line.offset);
            if in_contains {
                if cursor.eat("final::") {
                    let name = cursor.take_name()?;
                    cursor.expect_end()?;
                    bindings.push(ast::TypeBoundDecl::Final(ast::FinalDecl { name }));
                } else if cursor.eat("generic::") {
                    let name = cursor.take_name()?;
                    cursor.expect("=>")?;
                    let specific = cursor.take_name()?;
                    cursor.expect_end()?;
                    bindings.push(ast::TypeBoundDecl::Generic(ast::GenericBindingDecl {
                        name,
                        specific,
                    }));
                } else if cursor.eat("procedure") {
                    bindings.push(ast::TypeBoundDecl::Procedure(parse_proc_binding(
                        &mut cursor,
                    )?));
                } else {
                    return err(offset, "expected type-bound declaration");
                }
            } else if cursor.eat("procedure(") {
                components.push(ast::ComponentDecl::Procedure(parse_proc_decl(
                    &mut cursor,
                )?));
            } else {
                components.push(parse_entity_like(&mut cursor)?);
            }
        }
        Ok(ast::DerivedTypeDef {
            stmt: ast::DerivedTypeStmt {
                attrs,
                extends,
                name,
                param_names,
            },
            sequence,
            components,
            bindings,
        })
    }

    fn parse_subprogram(&mut self) -> Result<ast::ModuleSubprogram, ModParseError> {
        let line = match self.bump() {
            Some(line) => line,
            None => return err(usize::MAX, "expected subprogram"),
        };
        let mut cursor = Cursor::new(line.text, line.offset);
        let mut attrs = Vec::new();
        let is_function = loop {
            if cursor.eat("function ") {
                break true;
            }
            if cursor.eat("subroutine ") {
                break false;
            }
            let attr = cursor.take_attr()?;
            cursor.expect(" ")?;
            attrs.push(attr);
        };
        let name = cursor.take_name()?;
        cursor.expect("(")?;
        let dummy_args = if cursor.rest().starts_with(')') {
            Vec::new()
        } else {
            parse_name_list(&mut cursor)?
        };
        cursor.expect(")")?;
        let mut bind_name = None;
        let mut has_bind = false;
        if cursor.eat(" bind(c") {
            has_bind = true;
            if cursor.eat(", name=") {
                bind_name = Some(cursor.parse_expr()?);
            }
            cursor.expect(")")?;
        }
        let mut result = None;
        if cursor.eat(" result(") {
            result = Some(cursor.take_name()?);
            cursor.expect(")")?;
        }
        cursor.expect_end()?;
        if has_bind {
            attrs.push(Attr::BindC);
        }

        let spec = self.parse_specification(true)?;
        self.expect_line("end")?;
        let empty_body = Vec::new();
        if is_function {
            Ok(ast::ModuleSubprogram::Function(ast::FunctionSubprogram {
                stmt: ast::Statement::new(ast::FunctionStmt {
                    attrs,
                    name,
                    dummy_args,
                    result,
                    bind_name,
                }),
                spec,
                body: empty_body,
            }))
        } else {
            Ok(ast::ModuleSubprogram::Subroutine(ast::SubroutineSubprogram {
                stmt: ast::Statement::new(ast::SubroutineStmt {
                    attrs,
                    name,
                    dummy_args,
                    bind_name,
                }),
                spec,
                body: empty_body,
            }))
        }
    }
}

// --- line-level parsing ---

struct Cursor<'a> {
    text: &'a str,
    base: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, base: usize) -> Self {
        Self { text, base, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, prefix: &str) -> Result<(), ModParseError> {
        if self.eat(prefix) {
            Ok(())
        } else {
            err(self.offset(), format!("expected '{}'", prefix))
        }
    }

    fn expect_end(&mut self) -> Result<(), ModParseError> {
        if self.rest().is_empty() {
            Ok(())
        } else {
            err(self.offset(), "unexpected trailing text")
        }
    }

    fn take_name(&mut self) -> Result<ast::Name, ModParseError> {
        let start = self.pos;
        let bytes = self.rest().as_bytes();
        let mut len = 0;
        while len < bytes.len() {
            let c = bytes[len] as char;
            let is_name_char = c.is_ascii_alphanumeric() || c == '_';
            if (len == 0 && !(c.is_ascii_alphabetic() || c == '_')) || !is_name_char {
                break;
            }
            len += 1;
        }
        if len == 0 {
            return err(self.offset(), "expected a name");
        }
        self.pos += len;
        Ok(ast::Name::at(&self.text[start..start + len], self.base + start))
    }

    fn take_attr(&mut self) -> Result<Attr, ModParseError> {
        let offset = self.offset();
        let name = self.take_name()?;
        let attr = match name.text.as_str() {
            "abstract" => Attr::Abstract,
            "allocatable" => Attr::Allocatable,
            "asynchronous" => Attr::Asynchronous,
            "contiguous" => Attr::Contiguous,
            "deferred" => Attr::Deferred,
            "elemental" => Attr::Elemental,
            "external" => Attr::External,
            "impure" => Attr::Impure,
            "intent" => {
                self.expect("(")?;
                let which = self.take_name()?;
                self.expect(")")?;
                match which.text.as_str() {
                    "in" => Attr::IntentIn,
                    "inout" => Attr::IntentInOut,
                    "out" => Attr::IntentOut,
                    _ => return err(offset, "unknown intent"),
                }
            }
            "intrinsic" => Attr::Intrinsic,
            "nopass" => Attr::NoPass,
            "optional" => Attr::Optional,
            "parameter" => Attr::Parameter,
            "pointer" => Attr::Pointer,
            "private" => Attr::Private,
            "protected" => Attr::Protected,
            "public" => Attr::Public,
            "pure" => Attr::Pure,
            "recursive" => Attr::Recursive,
            "save" => Attr::Save,
            "target" => Attr::Target,
            "value" => Attr::Value,
            "volatile" => Attr::Volatile,
            "bind" => {
                self.expect("(c)")?;
                Attr::BindC
            }
            other => return err(offset, format!("unknown attribute '{}'", other)),
        };
        Ok(attr)
    }

    fn take_int(&mut self) -> Result<i64, ModParseError> {
        let start = self.pos;
        let bytes = self.rest().as_bytes();
        let mut len = 0;
        if len < bytes.len() && bytes[len] == b'-' {
            len += 1;
        }
        while len < bytes.len() && bytes[len].is_ascii_digit() {
            len += 1;
        }
        if len == 0 || (len == 1 && bytes[0] == b'-') {
            return err(self.offset(), "expected an integer");
        }
        self.pos += len;
        self.text[start..start + len]
            .parse()
            .map_err(|_| ModParseError {
                offset: self.base + start,
                message: "integer out of range".into(),
            })
    }

    /// Expression grammar for initializers and bind names; precedence is
    /// handled by nesting since the writer always parenthesizes.
    fn parse_expr(&mut self) -> Result<ast::Expr, ModParseError> {
        let left = self.parse_primary()?;
        if let Some(op) = self.peek_binary_op() {
            self.eat_binary_op(op);
            let right = self.parse_expr()?;
            return Ok(ast::Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<ast::BinaryOp> {
        let rest = self.rest();
        let table: &[(&str, ast::BinaryOp)] = &[
            ("**", ast::BinaryOp::Power),
            ("//", ast::BinaryOp::Concat),
            ("<=", ast::BinaryOp::Le),
            (">=", ast::BinaryOp::Ge),
            ("==", ast::BinaryOp::Eq),
            ("/=", ast::BinaryOp::Ne),
            ("<", ast::BinaryOp::Lt),
            (">", ast::BinaryOp::Gt),
            ("+", ast::BinaryOp::Add),
            ("-", ast::BinaryOp::Subtract),
            ("*", ast::BinaryOp::Multiply),
            ("/", ast::BinaryOp::Divide),
            (".and.", ast::BinaryOp::And),
            (".or.", ast::BinaryOp::Or),
            (".eqv.", ast::BinaryOp::Eqv),
            (".neqv.", ast::BinaryOp::Neqv),
        ];
        table
            .iter()
            .find(|(token, _)| rest.starts_with(token))
            .map(|(_, op)| *op)
    }

    fn eat_binary_op(&mut self, op: ast::BinaryOp) {
        let token = match op {
            ast::BinaryOp::Power => "**",
            ast::BinaryOp::Concat => "//",
            ast::BinaryOp::Le => "<=",
            ast::BinaryOp::Ge => ">=",
            ast::BinaryOp::Eq => "==",
            ast::BinaryOp::Ne => "/=",
            ast::BinaryOp::Lt => "<",
            ast::BinaryOp::Gt => ">",
            ast::BinaryOp::Add => "+",
            ast::BinaryOp::Subtract => "-",
            ast::BinaryOp::Multiply => "*",
            ast::BinaryOp::Divide => "/",
            ast::BinaryOp::And => ".and.",
            ast::BinaryOp::Or => ".or.",
            ast::BinaryOp::Eqv => ".eqv.",
            ast::BinaryOp::Neqv => ".neqv.",
        };
        self.pos += token.len();
    }

    fn parse_primary(&mut self) -> Result<ast::Expr, ModParseError> {
        let rest = self.rest();
        if rest.starts_with('(') {
            self.pos += 1;
            let inner = self.parse_expr()?;
            self.expect(")")?;
            return Ok(ast::Expr::Parentheses(Box::new(inner)));
        }
        if self.eat(".true.") {
            let kind = self.parse_kind_suffix()?;
            return Ok(ast::Expr::LogicalLiteral { value: true, kind });
        }
        if self.eat(".false.") {
            let kind = self.parse_kind_suffix()?;
            return Ok(ast::Expr::LogicalLiteral { value: false, kind });
        }
        if self.eat(".not.") {
            let operand = self.parse_primary()?;
            return Ok(ast::Expr::Unary {
                op: ast::UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if rest.starts_with('"') {
            return self.parse_char_literal();
        }
        if rest.starts_with('-') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.pos += 1;
            let expr = self.parse_number()?;
            return Ok(match expr {
                ast::Expr::IntLiteral { value, kind } => ast::Expr::IntLiteral {
                    value: -value,
                    kind,
                },
                ast::Expr::RealLiteral { value, kind } => ast::Expr::RealLiteral {
                    value: -value,
                    kind,
                },
                other => ast::Expr::Unary {
                    op: ast::UnaryOp::Negate,
                    operand: Box::new(other),
                },
            });
        }
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return self.parse_number();
        }
        let name = self.take_name()?;
        if self.eat("(") {
            let mut args = Vec::new();
            if !self.rest().starts_with(')') {
                loop {
                    args.push(self.parse_expr()?);
                    if !self.eat(",") {
                        break;
                    }
                }
            }
            self.expect(")")?;
            return Ok(ast::Expr::FunctionRef { name, args });
        }
        Ok(ast::Expr::name(name))
    }

    fn parse_number(&mut self) -> Result<ast::Expr, ModParseError> {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let mut end = self.pos;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let is_real = end < bytes.len() && bytes[end] == b'.' && {
            // don't swallow the dot of `.and.` style operators
            end + 1 >= bytes.len() || !bytes[end + 1].is_ascii_alphabetic()
        };
        if is_real {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            let text = &self.text[start..end];
            self.pos = end;
            let value: f64 = text.parse().map_err(|_| ModParseError {
                offset: self.base + start,
                message: "malformed real literal".into(),
            })?;
            let kind = self.parse_kind_suffix()?;
            Ok(ast::Expr::RealLiteral { value, kind })
        } else {
            let text = &self.text[start..end];
            self.pos = end;
            let value: i64 = text.parse().map_err(|_| ModParseError {
                offset: self.base + start,
                message: "integer out of range".into(),
            })?;
            let kind = self.parse_kind_suffix()?;
            Ok(ast::Expr::IntLiteral { value, kind })
        }
    }

    fn parse_kind_suffix(&mut self) -> Result<Option<i64>, ModParseError> {
        if self.eat("_") {
            Ok(Some(self.take_int()?))
        } else {
            Ok(None)
        }
    }

    fn parse_char_literal(&mut self) -> Result<ast::Expr, ModParseError> {
        self.expect("\"")?;
        let mut value = String::new();
        loop {
            let rest = self.rest();
            if rest.starts_with("\"\"") {
                value.push('"');
                self.pos += 2;
            } else if rest.starts_with('"') {
                self.pos += 1;
                return Ok(ast::Expr::CharLiteral { value });
            } else if let Some(c) = rest.chars().next() {
                value.push(c);
                self.pos += c.len_utf8();
            } else {
                return err(self.offset(), "unterminated character literal");
            }
        }
    }
}

fn parse_name_list(cursor: &mut Cursor) -> Result<Vec<ast::Name>, ModParseError> {
    let mut names = vec![cursor.take_name()?];
    while cursor.eat(",") {
        names.push(cursor.take_name()?);
    }
    Ok(names)
}

fn parse_use(cursor: &mut Cursor) -> Result<ast::UseStmt, ModParseError> {
    let module = cursor.take_name()?;
    cursor.expect(",only:")?;
    let local = cursor.take_name()?;
    let original = if cursor.eat("=>") {
        Some(cursor.take_name()?)
    } else {
        None
    };
    cursor.expect_end()?;
    Ok(ast::UseStmt {
        module,
        only: vec![ast::Rename { local, original }],
    })
}

fn parse_generic(cursor: &mut Cursor) -> Result<ast::GenericStmt, ModParseError> {
    let mut attrs = Vec::new();
    while cursor.eat(",") {
        attrs.push(cursor.take_attr()?);
    }
    cursor.expect("::")?;
    let spec = if cursor.eat("operator(") {
        let mut op = String::new();
        while !cursor.rest().starts_with(')') && !cursor.rest().is_empty() {
            let c = cursor.rest().chars().next().unwrap();
            op.push(c);
            cursor.pos += c.len_utf8();
        }
        cursor.expect(")")?;
        ast::GenericSpec::DefinedOp(op)
    } else if cursor.eat("assignment(=)") {
        ast::GenericSpec::Assignment
    } else {
        ast::GenericSpec::Name(cursor.take_name()?)
    };
    cursor.expect("=>")?;
    let specifics = parse_name_list(cursor)?;
    cursor.expect_end()?;
    Ok(ast::GenericStmt {
        spec,
        attrs,
        specifics,
    })
}

fn parse_common_bind(cursor: &mut Cursor) -> Result<ast::CommonBindStmt, ModParseError> {
    cursor.expect("bind(c")?;
    let bind_name = if cursor.eat(", name=") {
        Some(cursor.parse_expr()?)
    } else {
        None
    };
    cursor.expect(")")?;
    cursor.expect("::/")?;
    let name = cursor.take_name()?;
    cursor.expect("/")?;
    cursor.expect_end()?;
    Ok(ast::CommonBindStmt { name, bind_name })
}

/// `volatile::x,y` and `asynchronous::x,y` standalone declarations.
fn parse_standalone_attr(cursor: &mut Cursor) -> Result<Option<ast::AttrStmt>, ModParseError> {
    for (token, attr) in [
        ("volatile::", Attr::Volatile),
        ("asynchronous::", Attr::Asynchronous),
    ] {
        if cursor.eat(token) {
            let names = parse_name_list(cursor)?;
            cursor.expect_end()?;
            return Ok(Some(ast::AttrStmt { attr, names }));
        }
    }
    Ok(None)
}

/// `procedure(iface)[,pass(n)][,attrs]::name`, cursor past `procedure(`.
fn parse_proc_decl(cursor: &mut Cursor) -> Result<ast::ProcDecl, ModParseError> {
    let interface = if cursor.rest().starts_with(')') {
        None
    } else if let Some(type_spec) = try_parse_type_spec(cursor)? {
        Some(ast::ProcInterfaceDecl::Type(type_spec))
    } else {
        Some(ast::ProcInterfaceDecl::Name(cursor.take_name()?))
    };
    cursor.expect(")")?;
    let mut pass_name = None;
    let mut attrs = Vec::new();
    let mut bind_name = None;
    while cursor.eat(",") {
        if cursor.eat("pass(") {
            pass_name = Some(cursor.take_name()?);
            cursor.expect(")")?;
        } else if cursor.eat("bind(c") {
            if cursor.eat(", name=") {
                bind_name = Some(cursor.parse_expr()?);
            }
            cursor.expect(")")?;
            attrs.push(Attr::BindC);
        } else {
            attrs.push(cursor.take_attr()?);
        }
    }
    cursor.expect("::")?;
    let name = cursor.take_name()?;
    cursor.expect_end()?;
    Ok(ast::ProcDecl {
        interface,
        pass_name,
        attrs,
        bind_name,
        name,
    })
}

/// A type-bound procedure line, cursor past `procedure`.
fn parse_proc_binding(cursor: &mut Cursor) -> Result<ast::ProcBindingDecl, ModParseError> {
    let deferred_interface = if cursor.eat("(") {
        let name = cursor.take_name()?;
        cursor.expect(")")?;
        Some(name)
    } else {
        None
    };
    let mut pass_name = None;
    let mut attrs = Vec::new();
    while cursor.eat(",") {
        if cursor.eat("pass(") {
            pass_name = Some(cursor.take_name()?);
            cursor.expect(")")?;
        } else {
            attrs.push(cursor.take_attr()?);
        }
    }
    cursor.expect("::")?;
    let name = cursor.take_name()?;
    let bound_to = if cursor.eat("=>") {
        Some(cursor.take_name()?)
    } else {
        None
    };
    cursor.expect_end()?;
    Ok(ast::ProcBindingDecl {
        deferred_interface,
        pass_name,
        attrs,
        name,
        bound_to,
    })
}

fn try_parse_type_spec(cursor: &mut Cursor) -> Result<Option<DeclTypeSpec>, ModParseError> {
    let categories: &[(&str, TypeCategory)] = &[
        ("integer", TypeCategory::Integer),
        ("real", TypeCategory::Real),
        ("complex", TypeCategory::Complex),
        ("character", TypeCategory::Character),
        ("logical", TypeCategory::Logical),
    ];
    for (token, category) in categories {
        if let Some(rest) = cursor.rest().strip_prefix(token) {
            // don't mistake an identifier like `integer_thing` for a type
            if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                continue;
            }
            cursor.pos += token.len();
            let kind = if cursor.eat("(") {
                let kind = cursor.take_int()?;
                cursor.expect(")")?;
                kind
            } else {
                category.default_kind()
            };
            return Ok(Some(DeclTypeSpec::Intrinsic {
                category: *category,
                kind,
            }));
        }
    }
    if cursor.eat("type(*)") {
        return Ok(Some(DeclTypeSpec::TypeStar));
    }
    if cursor.eat("class(*)") {
        return Ok(Some(DeclTypeSpec::ClassStar));
    }
    if cursor.rest().starts_with("type(") {
        cursor.pos += "type(".len();
        let name = cursor.take_name()?;
        cursor.expect(")")?;
        return Ok(Some(DeclTypeSpec::Derived {
            name: name.text,
        }));
    }
    if cursor.rest().starts_with("class(") {
        cursor.pos += "class(".len();
        let name = cursor.take_name()?;
        cursor.expect(")")?;
        return Ok(Some(DeclTypeSpec::ClassDerived {
            name: name.text,
        }));
    }
    Ok(None)
}

/// An entity declaration or, inside a derived type, a type parameter.
fn parse_entity_like(cursor: &mut Cursor) -> Result<ast::ComponentDecl, ModParseError> {
    let offset = cursor.offset();
    let type_spec = match try_parse_type_spec(cursor)? {
        Some(type_spec) => type_spec,
        None => return err(offset, "expected a type specification"),
    };
    let mut attrs = Vec::new();
    let mut bind_name = None;
    let mut type_param_attr = None;
    while cursor.eat(",") {
        if cursor.eat("bind(c") {
            if cursor.eat(", name=") {
                bind_name = Some(cursor.parse_expr()?);
            }
            cursor.expect(")")?;
            attrs.push(Attr::BindC);
        } else if cursor.rest().starts_with("kind::") || cursor.rest().starts_with("kind,") {
            cursor.pos += "kind".len();
            type_param_attr = Some(TypeParamAttr::Kind);
        } else if cursor.rest().starts_with("len::") || cursor.rest().starts_with("len,") {
            cursor.pos += "len".len();
            type_param_attr = Some(TypeParamAttr::Len);
        } else {
            attrs.push(cursor.take_attr()?);
        }
    }
    cursor.expect("::")?;
    let name = cursor.take_name()?;
    if let Some(attr) = type_param_attr {
        let init = if cursor.eat("=") {
            Some(cursor.parse_expr()?)
        } else {
            None
        };
        cursor.expect_end()?;
        return Ok(ast::ComponentDecl::TypeParam(ast::TypeParamDecl {
            type_spec,
            attr,
            name,
            init,
        }));
    }
    let mut shape = Vec::new();
    if cursor.eat("(") {
        loop {
            if cursor.eat("..") {
                shape.push(ast::ShapeSpecDecl::AssumedRank);
            } else {
                let lower = parse_bound(cursor)?;
                cursor.expect(":")?;
                let upper = parse_bound(cursor)?;
                shape.push(ast::ShapeSpecDecl::Bounds { lower, upper });
            }
            if !cursor.eat(",") {
                break;
            }
        }
        cursor.expect(")")?;
    }
    let init = if cursor.eat("=") {
        Some(cursor.parse_expr()?)
    } else {
        None
    };
    cursor.expect_end()?;
    Ok(ast::ComponentDecl::Entity(ast::EntityDecl {
        type_spec,
        attrs,
        bind_name,
        name,
        shape,
        init,
    }))
}

fn parse_bound(cursor: &mut Cursor) -> Result<Option<ast::BoundDecl>, ModParseError> {
    if cursor.eat("*") {
        return Ok(Some(ast::BoundDecl::Assumed));
    }
    if cursor.rest().starts_with(':') || cursor.rest().starts_with(',') || cursor.rest().starts_with(')') {
        return Ok(None);
    }
    Ok(Some(ast::BoundDecl::Expr(cursor.parse_expr()?)))
}
