use crate::ast::{BinaryOp, Expr, Name, UnaryOp};
use crate::expr::{Constant, Expression, ExpressionAnalyzer};
use crate::symbols::{Attrs, Details, ObjectEntityDetails, SourceName};
use crate::symtab::{ScopeKind, SymbolTable};

fn analyze(expr: &Expr) -> Option<Expression> {
    let table = SymbolTable::new();
    ExpressionAnalyzer::new(&table).analyze(expr)
}

#[test]
fn int_literal_gets_default_kind() {
    let expr = analyze(&Expr::int(3)).unwrap();
    assert_eq!(expr, Expression::int(3, 4));
    assert_eq!(expr.as_fortran(), "3_4");
}

#[test]
fn folds_integer_arithmetic() {
    let expr = Expr::Binary {
        op: BinaryOp::Add,
        left: Box::new(Expr::int(2)),
        right: Box::new(Expr::Binary {
            op: BinaryOp::Multiply,
            left: Box::new(Expr::int(3)),
            right: Box::new(Expr::int(4)),
        }),
    };
    assert_eq!(analyze(&expr).unwrap(), Expression::int(14, 4));
}

#[test]
fn folds_comparisons_to_logical() {
    let expr = Expr::Binary {
        op: BinaryOp::Lt,
        left: Box::new(Expr::int(1)),
        right: Box::new(Expr::int(2)),
    };
    let folded = analyze(&expr).unwrap();
    assert_eq!(folded, Expression::logical(true, 4));
    assert_eq!(folded.as_fortran(), ".true._4");
}

#[test]
fn folds_unary_negate_and_not() {
    let negate = Expr::Unary {
        op: UnaryOp::Negate,
        operand: Box::new(Expr::int(5)),
    };
    assert_eq!(analyze(&negate).unwrap(), Expression::int(-5, 4));

    let not = Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(Expr::logical(true)),
    };
    assert_eq!(analyze(&not).unwrap(), Expression::logical(false, 4));
}

#[test]
fn division_by_zero_is_not_folded() {
    let expr = Expr::Binary {
        op: BinaryOp::Divide,
        left: Box::new(Expr::int(1)),
        right: Box::new(Expr::int(0)),
    };
    assert!(matches!(
        analyze(&expr).unwrap(),
        Expression::Binary { .. }
    ));
}

#[test]
fn unresolved_name_yields_none() {
    assert!(analyze(&Expr::name(Name::new("ghost"))).is_none());
}

#[test]
fn resolves_names_through_parent_scopes() {
    let mut table = SymbolTable::new();
    let module = table.make_scope(table.global_scope(), ScopeKind::Module);
    let inner = table.make_scope(module, ScopeKind::Subprogram);
    let symbol = table.make_symbol(
        module,
        SourceName::new("n", 0),
        Attrs::new(),
        Details::ObjectEntity(ObjectEntityDetails::default()),
    );

    let analyzer = ExpressionAnalyzer::in_scope(&table, inner);
    match analyzer.analyze(&Expr::name(Name::new("n"))).unwrap() {
        Expression::Designator(designator) => assert_eq!(designator.symbol, symbol),
        other => panic!("expected a designator, got {:?}", other),
    }
}

#[test]
fn renders_designators_and_calls_lowercase() {
    let mut table = SymbolTable::new();
    let module = table.make_scope(table.global_scope(), ScopeKind::Module);
    table.make_symbol(
        module,
        SourceName::new("Point", 0),
        Attrs::new(),
        Details::ObjectEntity(ObjectEntityDetails::default()),
    );
    let analyzer = ExpressionAnalyzer::in_scope(&table, module);
    let expr = analyzer.analyze(&Expr::name(Name::new("Point"))).unwrap();
    assert_eq!(expr.as_fortran(), "point");
}

#[test]
fn renders_constants() {
    assert_eq!(
        Expression::Constant(Constant::Char {
            value: "a\"b".into()
        })
        .as_fortran(),
        "\"a\"\"b\""
    );
    assert_eq!(Expression::int(-7, 8).as_fortran(), "-7_8");
}
