use crate::ast::{self, ActionStmt, ExecutableConstruct, Expr, Name, Statement};
use crate::context::SemanticsContext;
use crate::fir::verify::reachable_blocks;
use crate::fir::{verify_procedure, BlockId, Procedure, StmtKind, StoreValue};
use crate::lower::lower_program;
use crate::symbols::{Attrs, Details, ObjectEntityDetails, SourceName, SubprogramDetails};
use crate::symtab::{ScopeKind, SymbolId};
use crate::types::DeclTypeSpec;

struct Fixture {
    context: SemanticsContext,
    i: SymbolId,
    x: SymbolId,
    lbl: SymbolId,
    f: SymbolId,
}

fn fixture() -> Fixture {
    let mut context = SemanticsContext::new();
    let scope = context
        .table
        .make_scope(context.global_scope(), ScopeKind::MainProgram);
    let mut declare = |table: &mut crate::symtab::SymbolTable, name: &str, offset: usize| {
        table.make_symbol(
            scope,
            SourceName::new(name, offset),
            Attrs::new(),
            Details::ObjectEntity(ObjectEntityDetails {
                type_spec: Some(DeclTypeSpec::default_integer()),
                shape: Vec::new(),
                init: None,
                bind_name: None,
            }),
        )
    };
    let i = declare(&mut context.table, "i", 0);
    let x = declare(&mut context.table, "x", 10);
    let lbl = declare(&mut context.table, "lbl", 20);
    let f = context.table.make_symbol(
        scope,
        SourceName::new("f", 30),
        Attrs::new(),
        Details::Subprogram(SubprogramDetails::default()),
    );
    Fixture {
        context,
        i,
        x,
        lbl,
        f,
    }
}

fn lower_main(context: &mut SemanticsContext, body: ast::Block) -> Procedure {
    let program = ast::Program {
        units: vec![ast::ProgramUnit::Main(ast::MainProgram {
            name: None,
            spec: Default::default(),
            body,
        })],
    };
    let mut fir_program = lower_program(&program, context, false);
    assert_eq!(fir_program.procedures.len(), 1);
    fir_program.procedures.remove(0)
}

fn action(stmt: ActionStmt) -> ExecutableConstruct {
    ExecutableConstruct::Action(Statement::new(stmt))
}

fn labeled(label: ast::Label, stmt: ActionStmt) -> ExecutableConstruct {
    ExecutableConstruct::Action(Statement::labeled(label, stmt))
}

fn assign_x(fx: &Fixture, value: i64) -> ActionStmt {
    ActionStmt::Assignment(ast::AssignmentStmt {
        variable: ast::Variable::from_name(Name::resolved("x", fx.x)),
        expr: Expr::int(value),
    })
}

fn call_f(fx: &Fixture) -> ActionStmt {
    ActionStmt::Call(ast::CallStmt {
        call: ast::Call {
            designator: Name::resolved("f", fx.f),
            args: vec![ast::ActualArg::Expr(Expr::name(Name::resolved("i", fx.i)))],
        },
    })
}

fn blocks_with(procedure: &Procedure, pred: impl Fn(&StmtKind) -> bool) -> Vec<BlockId> {
    procedure
        .blocks
        .iter()
        .filter(|block| {
            block
                .stmts
                .iter()
                .any(|stmt| pred(&procedure.stmt(*stmt).kind))
        })
        .map(|block| block.id)
        .collect()
}

fn the_block(procedure: &Procedure, pred: impl Fn(&StmtKind) -> bool) -> BlockId {
    let blocks = blocks_with(procedure, pred);
    assert_eq!(blocks.len(), 1, "expected exactly one matching block");
    blocks[0]
}

#[test]
fn counted_do_builds_a_latch_cycle() {
    let mut fx = fixture();
    let body = vec![ExecutableConstruct::Do(ast::DoConstruct {
        stmt: Statement::new(ast::NonLabelDoStmt {
            name: None,
            control: Some(ast::LoopControl::Bounds(ast::LoopBounds {
                name: Name::resolved("i", fx.i),
                lower: Expr::int(1),
                upper: Expr::int(10),
                step: Some(Expr::int(2)),
            })),
        }),
        body: vec![action(call_f(&fx))],
    })];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());
    assert!(fx.context.messages.is_empty());

    let compare = the_block(&procedure, |kind| {
        matches!(kind, StmtKind::DoCondition { .. })
    });
    let entry = the_block(&procedure, |kind| matches!(kind, StmtKind::Call { .. }));
    let increment = the_block(&procedure, |kind| {
        matches!(kind, StmtKind::Increment { .. })
    });

    // compare branches to the loop body and the exit
    let compare_successors = procedure.successors(compare);
    assert_eq!(compare_successors.len(), 2);
    assert_eq!(compare_successors[0], entry);
    let exit = compare_successors[1];
    assert_ne!(exit, entry);

    // the body returns through the increment to the compare
    assert_eq!(procedure.successors(entry), vec![increment]);
    assert_eq!(procedure.successors(increment), vec![compare]);
    assert!(procedure.block(compare).preds.contains(&increment));

    // DO opens a region; the exit block lands back in the root
    assert_eq!(procedure.regions.len(), 2);
    assert_eq!(procedure.block(exit).region, procedure.root_region());
    assert_ne!(procedure.block(entry).region, procedure.root_region());
}

#[test]
fn if_else_if_forms_a_diamond() {
    let mut fx = fixture();
    let body = vec![ExecutableConstruct::If(ast::IfConstruct {
        stmt: Statement::new(ast::IfThenStmt {
            name: None,
            cond: Expr::logical(true),
        }),
        block: vec![action(assign_x(&fx, 1))],
        else_ifs: vec![ast::ElseIfBlock {
            stmt: Statement::new(ast::ElseIfStmt {
                cond: Expr::logical(false),
            }),
            block: vec![action(assign_x(&fx, 2))],
        }],
        else_block: Some(vec![action(assign_x(&fx, 3))]),
    })];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let stores = blocks_with(&procedure, |kind| matches!(kind, StmtKind::Store { .. }));
    assert_eq!(stores.len(), 3);

    // all three assignment blocks branch to one join block
    let joins: Vec<BlockId> = stores
        .iter()
        .map(|block| {
            let successors = procedure.successors(*block);
            assert_eq!(successors.len(), 1);
            successors[0]
        })
        .collect();
    assert!(joins.iter().all(|join| *join == joins[0]));
    assert_eq!(procedure.block(joins[0]).preds.len(), 3);

    // the first condition splits two ways, the second covers the rest
    let entry = BlockId(0);
    assert_eq!(procedure.successors(entry).len(), 2);
    let else_if = procedure.successors(entry)[1];
    assert_eq!(procedure.successors(else_if).len(), 2);
}

#[test]
fn io_with_three_labels_has_four_outgoing_edges() {
    let mut fx = fixture();
    let body = vec![
        action(ActionStmt::Read(ast::ReadStmt {
            specs: vec![
                ast::IoSpec::Unit(Expr::int(5)),
                ast::IoSpec::ErrLabel(10),
                ast::IoSpec::EorLabel(20),
                ast::IoSpec::EndLabel(30),
            ],
            items: vec![ast::Variable::from_name(Name::resolved("x", fx.x))],
        })),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
        labeled(30, ActionStmt::Continue),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let io_block = the_block(&procedure, |kind| matches!(kind, StmtKind::IoRuntime { .. }));
    let successors = procedure.successors(io_block);
    assert_eq!(successors.len(), 4, "normal edge plus err, eor, end");

    // the exceptional targets each record the I/O block as predecessor
    for successor in &successors {
        assert!(procedure.block(*successor).preds.contains(&io_block));
    }
}

#[test]
fn assigned_goto_branches_to_the_accumulated_labels() {
    let mut fx = fixture();
    let body = vec![
        action(ActionStmt::Assign(ast::AssignStmt {
            label: 100,
            name: Name::resolved("lbl", fx.lbl),
        })),
        action(ActionStmt::Assign(ast::AssignStmt {
            label: 200,
            name: Name::resolved("lbl", fx.lbl),
        })),
        action(ActionStmt::AssignedGoto(ast::AssignedGotoStmt {
            name: Name::resolved("lbl", fx.lbl),
            labels: Vec::new(),
        })),
        labeled(100, ActionStmt::Continue),
        labeled(200, ActionStmt::Continue),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let igoto_block = the_block(&procedure, |kind| {
        matches!(kind, StmtKind::IndirectBranch { .. })
    });
    let successors = procedure.successors(igoto_block);
    assert_eq!(successors.len(), 2);

    // both ASSIGN statements store block references
    let block_stores = procedure
        .stmts
        .iter()
        .filter(|stmt| {
            matches!(
                stmt.kind,
                StmtKind::Store {
                    value: StoreValue::Block(_),
                    ..
                }
            )
        })
        .count();
    assert_eq!(block_stores, 2);
}

#[test]
fn dead_code_behind_a_goto_stays_unreachable() {
    let mut fx = fixture();
    let body = vec![
        action(ActionStmt::Goto(ast::GotoStmt { label: 10 })),
        action(assign_x(&fx, 1)),
        labeled(10, ActionStmt::Continue),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let dead = the_block(&procedure, |kind| matches!(kind, StmtKind::Store { .. }));
    let reachable = reachable_blocks(&procedure);
    assert!(!reachable.contains(&dead));
    assert!(procedure.block(dead).preds.is_empty());
}

#[test]
fn select_case_lowers_to_switch_case() {
    let mut fx = fixture();
    let body = vec![ExecutableConstruct::Case(ast::CaseConstruct {
        stmt: Statement::new(ast::SelectCaseStmt {
            name: None,
            expr: Expr::name(Name::resolved("x", fx.x)),
        }),
        cases: vec![
            ast::Case {
                stmt: Statement::new(ast::CaseStmt {
                    selector: ast::CaseSelector::Ranges(vec![
                        ast::CaseValueRange::Exact(Expr::int(1)),
                        ast::CaseValueRange::Range {
                            lower: Some(Expr::int(3)),
                            upper: Some(Expr::int(5)),
                        },
                    ]),
                }),
                block: vec![action(assign_x(&fx, 1))],
            },
            ast::Case {
                stmt: Statement::new(ast::CaseStmt {
                    selector: ast::CaseSelector::Default,
                }),
                block: vec![action(assign_x(&fx, 2))],
            },
        ],
    })];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let switch_block = the_block(&procedure, |kind| {
        matches!(kind, StmtKind::SwitchCase { .. })
    });
    let terminator = procedure.terminator(switch_block).unwrap();
    match &procedure.stmt(terminator).kind {
        StmtKind::SwitchCase { default, cases, .. } => {
            assert_eq!(cases.len(), 1, "the default case moved out of the list");
            assert_eq!(cases[0].0.ranges.len(), 2);
            let default_block = procedure.block(*default);
            assert!(default_block
                .stmts
                .iter()
                .any(|stmt| matches!(procedure.stmt(*stmt).kind, StmtKind::Store { .. })));
        }
        _ => unreachable!(),
    }
}

#[test]
fn do_while_latch_reevaluates_the_condition() {
    let mut fx = fixture();
    let body = vec![ExecutableConstruct::Do(ast::DoConstruct {
        stmt: Statement::new(ast::NonLabelDoStmt {
            name: None,
            control: Some(ast::LoopControl::While(Expr::logical(true))),
        }),
        body: vec![action(call_f(&fx))],
    })];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    // no induction machinery for DO WHILE
    assert!(blocks_with(&procedure, |kind| matches!(
        kind,
        StmtKind::DoCondition { .. } | StmtKind::Increment { .. }
    ))
    .is_empty());
    let latch = the_block(&procedure, |kind| {
        matches!(kind, StmtKind::CondBranch { .. })
    });
    assert_eq!(procedure.successors(latch).len(), 2);
}

#[test]
fn block_construct_opens_and_closes_a_region() {
    let mut fx = fixture();
    let body = vec![
        ExecutableConstruct::Block(ast::BlockConstruct {
            stmt: Statement::new(ast::BlockStmt { name: None }),
            body: vec![action(assign_x(&fx, 1))],
        }),
        action(assign_x(&fx, 2)),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());
    assert_eq!(procedure.regions.len(), 2);

    let inner_store = blocks_with(&procedure, |kind| matches!(kind, StmtKind::Store { .. }));
    assert_eq!(inner_store.len(), 2);
    // first store inside the region, second back in the root
    assert_ne!(procedure.block(inner_store[0]).region, procedure.root_region());
    assert_eq!(procedure.block(inner_store[1]).region, procedure.root_region());
}

#[test]
fn associate_stores_its_selectors_on_entry() {
    let mut fx = fixture();
    let body = vec![ExecutableConstruct::Associate(ast::AssociateConstruct {
        stmt: Statement::new(ast::AssociateStmt {
            name: None,
            associations: vec![ast::Association {
                name: Name::resolved("i", fx.i),
                selector: ast::Selector::Expr(Expr::name(Name::resolved("x", fx.x))),
            }],
        }),
        body: vec![action(call_f(&fx))],
    })];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let store_block = the_block(&procedure, |kind| matches!(kind, StmtKind::Store { .. }));
    assert_ne!(procedure.block(store_block).region, procedure.root_region());
}

#[test]
fn arithmetic_if_splits_three_ways() {
    let mut fx = fixture();
    let body = vec![
        action(ActionStmt::ArithmeticIf(ast::ArithmeticIfStmt {
            expr: Expr::name(Name::resolved("x", fx.x)),
            less: 10,
            equal: 20,
            greater: 30,
        })),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
        labeled(30, ActionStmt::Continue),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let switch_block = the_block(&procedure, |kind| matches!(kind, StmtKind::Switch { .. }));
    assert_eq!(procedure.successors(switch_block).len(), 3);
}

#[test]
fn empty_body_returns_implicitly() {
    let mut fx = fixture();
    let procedure = lower_main(&mut fx.context, Vec::new());
    assert!(verify_procedure(&procedure).is_ok());
    assert_eq!(procedure.blocks.len(), 1);
    let terminator = procedure.terminator(BlockId(0)).unwrap();
    assert!(matches!(
        procedure.stmt(terminator).kind,
        StmtKind::Return { value: None }
    ));
}

#[test]
fn stop_lowers_to_runtime_call_and_unreachable() {
    let mut fx = fixture();
    let body = vec![action(ActionStmt::Stop(ast::StopStmt {
        is_error_stop: false,
        code: Some(Expr::int(2)),
    }))];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let stop_block = the_block(&procedure, |kind| matches!(kind, StmtKind::Runtime { .. }));
    let terminator = procedure.terminator(stop_block).unwrap();
    assert!(matches!(
        procedure.stmt(terminator).kind,
        StmtKind::Unreachable
    ));
}

#[test]
fn computed_goto_defaults_to_fallthrough() {
    let mut fx = fixture();
    let body = vec![
        action(ActionStmt::ComputedGoto(ast::ComputedGotoStmt {
            labels: vec![10, 20],
            expr: Expr::name(Name::resolved("x", fx.x)),
        })),
        action(assign_x(&fx, 1)),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
    ];
    let procedure = lower_main(&mut fx.context, body);
    assert!(verify_procedure(&procedure).is_ok());

    let switch_block = the_block(&procedure, |kind| matches!(kind, StmtKind::Switch { .. }));
    let terminator = procedure.terminator(switch_block).unwrap();
    match &procedure.stmt(terminator).kind {
        StmtKind::Switch { default, cases, .. } => {
            assert_eq!(cases.len(), 2);
            // the fall-through block holds the following assignment
            let default_block = procedure.block(*default);
            assert!(default_block
                .stmts
                .iter()
                .any(|stmt| matches!(procedure.stmt(*stmt).kind, StmtKind::Store { .. })));
        }
        _ => unreachable!(),
    }
}
