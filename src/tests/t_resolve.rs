use indoc::indoc;

use crate::ast::{self, ActionStmt, Expr, Name, Statement};
use crate::context::SemanticsContext;
use crate::expr::{Constant, Expression};
use crate::modfile::parser::parse_mod_file;
use crate::modfile::reader::NameResolver;
use crate::resolve::{check_names_resolved, DeclResolver};
use crate::symbols::{Attr, Details};
use crate::symtab::{ScopeKind, SymbolId};

fn resolve(body: &str) -> (SemanticsContext, crate::symtab::ScopeId) {
    let program = parse_mod_file(body).expect("body parses");
    let mut context = SemanticsContext::new();
    let global = context.global_scope();
    assert!(DeclResolver.resolve(&mut context, &program, global));
    let module = context
        .table
        .scope(global)
        .symbols
        .values()
        .next()
        .copied()
        .expect("module symbol created");
    let scope = context.table.symbol(module).scope.expect("module scope");
    (context, scope)
}

#[test]
fn resolves_objects_and_subprograms() {
    let (context, scope) = resolve(indoc! {"
        module m
        integer,parameter::k=3_4
        contains
        subroutine s(x)
        integer::x
        end
        end
    "});
    assert_eq!(context.table.scope(scope).kind, ScopeKind::Module);

    let k = context.table.find(scope, "k").expect("k resolved");
    let k_symbol = context.table.symbol(k);
    assert!(k_symbol.attrs.test(Attr::Parameter));
    match &k_symbol.details {
        Details::ObjectEntity(details) => assert_eq!(
            details.init,
            Some(Expression::Constant(Constant::Int { value: 3, kind: 4 }))
        ),
        other => panic!("expected an object entity, got {}", other.kind_name()),
    }

    let s = context.table.find(scope, "s").expect("s resolved");
    match &context.table.symbol(s).details {
        Details::Subprogram(details) => {
            assert!(!details.is_function);
            assert_eq!(details.dummy_args.len(), 1);
        }
        other => panic!("expected a subprogram, got {}", other.kind_name()),
    }
}

#[test]
fn resolves_use_association_against_a_loaded_module() {
    // the used module is already in the global scope
    let (mut context, base_scope) = resolve(indoc! {"
        module base
        integer::orig
        end
    "});
    let orig = context.table.find(base_scope, "orig").unwrap();

    let program = parse_mod_file(indoc! {"
        module user
        use base,only:loc=>orig
        end
    "})
    .expect("parses");
    let global = context.global_scope();
    assert!(DeclResolver.resolve(&mut context, &program, global));

    let user = context.table.find(global, "user").unwrap();
    let user_scope = context.table.symbol(user).scope.unwrap();
    let loc = context.table.find(user_scope, "loc").expect("loc resolved");
    match &context.table.symbol(loc).details {
        Details::Use(details) => assert_eq!(details.symbol, orig),
        other => panic!("expected a use association, got {}", other.kind_name()),
    }
}

#[test]
fn unknown_used_module_becomes_a_use_error() {
    let (context, scope) = resolve(indoc! {"
        module m
        use missing,only:ghost
        end
    "});
    let ghost = context.table.find(scope, "ghost").expect("ghost bound");
    match &context.table.symbol(ghost).details {
        Details::UseError(details) => assert_eq!(details.modules, ["missing"]),
        other => panic!("expected a use error, got {}", other.kind_name()),
    }
}

#[test]
fn extra_attr_line_updates_the_local_symbol() {
    let (context, scope) = resolve(indoc! {"
        module m
        integer::x
        volatile::x
        end
    "});
    let x = context.table.find(scope, "x").unwrap();
    assert!(context.table.symbol(x).attrs.test(Attr::Volatile));
}

#[test]
fn derived_type_gets_its_own_scope() {
    let (context, scope) = resolve(indoc! {"
        module m
        type::point
        real::x
        real::y
        end type
        end
    "});
    let point = context.table.find(scope, "point").unwrap();
    let type_scope = context.table.symbol(point).scope.expect("type scope");
    assert_eq!(context.table.scope(type_scope).kind, ScopeKind::DerivedType);
    assert!(context.table.find(type_scope, "x").is_some());
    assert!(context.table.find(type_scope, "y").is_some());
    assert!(context.table.find(scope, "x").is_none());
}

#[test]
fn check_names_reports_unresolved_names() {
    let program = ast::Program {
        units: vec![ast::ProgramUnit::Main(ast::MainProgram {
            name: None,
            spec: Default::default(),
            body: vec![ast::ExecutableConstruct::Action(Statement::new(
                ActionStmt::Assignment(ast::AssignmentStmt {
                    variable: ast::Variable::from_name(Name::new("ghost")),
                    expr: Expr::int(1),
                }),
            ))],
        })],
    };
    let mut context = SemanticsContext::new();
    check_names_resolved(&mut context, &program);
    assert!(context.any_fatal_error());
    assert!(context
        .messages
        .iter()
        .any(|message| message.text.contains("no symbol found for 'ghost'")));
}

#[test]
fn check_names_accepts_a_resolved_tree() {
    let program = ast::Program {
        units: vec![ast::ProgramUnit::Main(ast::MainProgram {
            name: None,
            spec: Default::default(),
            body: vec![ast::ExecutableConstruct::Action(Statement::new(
                ActionStmt::Assignment(ast::AssignmentStmt {
                    variable: ast::Variable::from_name(Name::resolved("x", SymbolId(0))),
                    expr: Expr::int(1),
                }),
            ))],
        })],
    };
    let mut context = SemanticsContext::new();
    check_names_resolved(&mut context, &program);
    assert!(!context.any_fatal_error());
    assert!(context.messages.is_empty());
}
