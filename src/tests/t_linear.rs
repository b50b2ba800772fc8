use crate::ast::{self, ActionStmt, ExecutableConstruct, Expr, Name, Statement};
use crate::lower::linear::{linearize, AnalysisData, LinearOp, SwitchKind};
use crate::symtab::SymbolId;

fn action(stmt: ActionStmt) -> ExecutableConstruct {
    ExecutableConstruct::Action(Statement::new(stmt))
}

fn labeled(label: ast::Label, stmt: ActionStmt) -> ExecutableConstruct {
    ExecutableConstruct::Action(Statement::labeled(label, stmt))
}

fn call_f() -> ActionStmt {
    ActionStmt::Call(ast::CallStmt {
        call: ast::Call {
            designator: Name::resolved("f", SymbolId(0)),
            args: vec![ast::ActualArg::Expr(Expr::int(1))],
        },
    })
}

fn assignment(name: &str) -> ActionStmt {
    ActionStmt::Assignment(ast::AssignmentStmt {
        variable: ast::Variable::from_name(Name::resolved(name, SymbolId(0))),
        expr: Expr::int(1),
    })
}

fn counted_do(body: Vec<ExecutableConstruct>) -> ExecutableConstruct {
    ExecutableConstruct::Do(ast::DoConstruct {
        stmt: Statement::new(ast::NonLabelDoStmt {
            name: None,
            control: Some(ast::LoopControl::Bounds(ast::LoopBounds {
                name: Name::resolved("i", SymbolId(1)),
                lower: Expr::int(1),
                upper: Expr::int(10),
                step: Some(Expr::int(2)),
            })),
        }),
        body,
    })
}

fn tags(ops: &[LinearOp<'_>]) -> Vec<&'static str> {
    ops.iter()
        .map(|op| match op {
            LinearOp::Label(_) => "label",
            LinearOp::Goto(_) => "goto",
            LinearOp::Return(_) => "return",
            LinearOp::CondGoto(..) => "cbranch",
            LinearOp::SwitchingIo(_) => "io-op",
            LinearOp::Switch(_) => "switch",
            LinearOp::Action(_) => "action",
            LinearOp::BeginConstruct(_) => "begin",
            LinearOp::EndConstruct(_) => "end",
            LinearOp::IndirectGoto(..) => "igoto",
            LinearOp::DoIncrement(_) => "do-increment",
            LinearOp::DoCompare(_) => "do-compare",
        })
        .collect()
}

#[test]
fn counted_do_schema() {
    let body = vec![counted_do(vec![action(call_f())])];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    assert_eq!(
        tags(&ops),
        [
            "begin",
            "goto",
            "label",
            "do-increment",
            "label",
            "do-compare",
            "cbranch",
            "label",
            "action",
            "goto",
            "end",
            "label",
        ]
    );
    // the trailing goto re-enters at the increment label
    let increment = match ops[2] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    let backedge_target = match ops[1] {
        LinearOp::Goto(target) => target,
        _ => unreachable!(),
    };
    let compare = match ops[4] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    assert_eq!(backedge_target, compare);
    match ops[9] {
        LinearOp::Goto(target) => assert_eq!(target, increment),
        _ => unreachable!(),
    }
}

#[test]
fn if_with_else_if_chains_conditions() {
    let construct = ExecutableConstruct::If(ast::IfConstruct {
        stmt: Statement::new(ast::IfThenStmt {
            name: None,
            cond: Expr::logical(true),
        }),
        block: vec![action(assignment("x"))],
        else_ifs: vec![ast::ElseIfBlock {
            stmt: Statement::new(ast::ElseIfStmt {
                cond: Expr::logical(false),
            }),
            block: vec![action(assignment("x"))],
        }],
        else_block: Some(vec![action(assignment("x"))]),
    });
    let mut ad = AnalysisData::new();
    let construct_vec = vec![construct];
    let ops = linearize(&construct_vec, &mut ad);
    assert_eq!(
        tags(&ops),
        [
            "begin", "cbranch", "label", "action", "goto", // then branch
            "label", "cbranch", "label", "action", "goto", // else if branch
            "label", "action", "goto", // else branch
            "label", "end",
        ]
    );
    // all three exits aim at the same join label
    let exits: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            LinearOp::Goto(target) => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(exits.len(), 3);
    assert!(exits.iter().all(|target| *target == exits[0]));
}

#[test]
fn computed_goto_appends_fallthrough_default() {
    let body = vec![
        action(ActionStmt::ComputedGoto(ast::ComputedGotoStmt {
            labels: vec![10, 20, 30],
            expr: Expr::int(2),
        })),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
        labeled(30, ActionStmt::Continue),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    let switch = match &ops[0] {
        LinearOp::Switch(switch) => switch,
        other => panic!("expected a switch, got {}", other),
    };
    assert!(matches!(switch.kind, SwitchKind::ComputedGoto(_)));
    assert_eq!(switch.refs.len(), 4);
    let next = match ops[1] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    assert_eq!(*switch.refs.last().unwrap(), next);
}

#[test]
fn arithmetic_if_has_three_targets() {
    let body = vec![
        action(ActionStmt::ArithmeticIf(ast::ArithmeticIfStmt {
            expr: Expr::int(0),
            less: 10,
            equal: 20,
            greater: 30,
        })),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
        labeled(30, ActionStmt::Continue),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    match &ops[0] {
        LinearOp::Switch(switch) => {
            assert!(matches!(switch.kind, SwitchKind::ArithmeticIf(_)));
            assert_eq!(switch.refs.len(), 3);
        }
        other => panic!("expected a switch, got {}", other),
    }
}

#[test]
fn alternate_returns_become_a_switch() {
    let call = ActionStmt::Call(ast::CallStmt {
        call: ast::Call {
            designator: Name::resolved("f", SymbolId(0)),
            args: vec![
                ast::ActualArg::Expr(Expr::int(1)),
                ast::ActualArg::AltReturn(10),
                ast::ActualArg::AltReturn(20),
            ],
        },
    });
    let body = vec![
        action(call),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    match &ops[0] {
        LinearOp::Switch(switch) => {
            assert!(matches!(switch.kind, SwitchKind::Call(_)));
            // two alternate returns plus the fall-through
            assert_eq!(switch.refs.len(), 3);
        }
        other => panic!("expected a switch, got {}", other),
    }
    assert!(matches!(ops[1], LinearOp::Label(_)));
}

#[test]
fn assign_accumulates_and_assigned_goto_is_indirect() {
    let variable = SymbolId(9);
    let body = vec![
        action(ActionStmt::Assign(ast::AssignStmt {
            label: 200,
            name: Name::resolved("lbl", variable),
        })),
        action(ActionStmt::Assign(ast::AssignStmt {
            label: 100,
            name: Name::resolved("lbl", variable),
        })),
        labeled(100, ActionStmt::Continue),
        labeled(200, ActionStmt::Continue),
        action(ActionStmt::AssignedGoto(ast::AssignedGotoStmt {
            name: Name::resolved("lbl", variable),
            labels: Vec::new(),
        })),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    match ops.last().unwrap() {
        LinearOp::IndirectGoto(symbol, labels) => {
            assert_eq!(*symbol, variable);
            assert!(labels.is_empty(), "accumulated set is applied later");
        }
        other => panic!("expected an indirect goto, got {}", other),
    }
    // accumulated targets come back in label order
    assert_eq!(ad.assigned_labels(variable).len(), 2);
}

#[test]
fn assigned_goto_explicit_list_overrides() {
    let variable = SymbolId(9);
    let body = vec![
        action(ActionStmt::Assign(ast::AssignStmt {
            label: 100,
            name: Name::resolved("lbl", variable),
        })),
        labeled(100, ActionStmt::Continue),
        labeled(200, ActionStmt::Continue),
        action(ActionStmt::AssignedGoto(ast::AssignedGotoStmt {
            name: Name::resolved("lbl", variable),
            labels: vec![200],
        })),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    match ops.last().unwrap() {
        LinearOp::IndirectGoto(_, labels) => assert_eq!(labels.len(), 1),
        other => panic!("expected an indirect goto, got {}", other),
    }
}

#[test]
fn if_statement_wraps_the_inner_action() {
    let body = vec![action(ActionStmt::If(ast::IfStmt {
        cond: Expr::logical(true),
        action: Box::new(Statement::new(call_f())),
    }))];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    assert_eq!(tags(&ops), ["cbranch", "label", "action", "label"]);
    match &ops[2] {
        LinearOp::Action(stmt) => assert!(matches!(stmt.stmt, ActionStmt::Call(_))),
        other => panic!("expected the inner action, got {}", other),
    }
}

#[test]
fn stop_and_fail_image_emit_returns() {
    let body = vec![
        action(ActionStmt::Stop(ast::StopStmt {
            is_error_stop: false,
            code: None,
        })),
        action(ActionStmt::FailImage),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    assert_eq!(tags(&ops), ["return", "return"]);
}

#[test]
fn continue_contributes_only_its_label() {
    let body = vec![labeled(10, ActionStmt::Continue)];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    assert_eq!(tags(&ops), ["label"]);
}

#[test]
fn io_specifiers_decide_between_action_and_switch() {
    let plain = vec![action(ActionStmt::Read(ast::ReadStmt {
        specs: vec![ast::IoSpec::Unit(Expr::int(5))],
        items: Vec::new(),
    }))];
    let mut ad = AnalysisData::new();
    assert_eq!(tags(&linearize(&plain, &mut ad)), ["action"]);

    let switching = vec![
        action(ActionStmt::Read(ast::ReadStmt {
            specs: vec![
                ast::IoSpec::Unit(Expr::int(5)),
                ast::IoSpec::ErrLabel(10),
                ast::IoSpec::EorLabel(20),
                ast::IoSpec::EndLabel(30),
            ],
            items: Vec::new(),
        })),
        labeled(10, ActionStmt::Continue),
        labeled(20, ActionStmt::Continue),
        labeled(30, ActionStmt::Continue),
    ];
    let mut ad = AnalysisData::new();
    let ops = linearize(&switching, &mut ad);
    match &ops[0] {
        LinearOp::SwitchingIo(io) => {
            assert!(io.err.is_some());
            assert!(io.eor.is_some());
            assert!(io.end.is_some());
        }
        other => panic!("expected a switching io op, got {}", other),
    }
    assert!(matches!(ops[1], LinearOp::Label(_)));
}

#[test]
fn open_without_err_is_a_plain_action() {
    let body = vec![action(ActionStmt::Open(vec![ast::IoSpec::Unit(
        Expr::int(5),
    )]))];
    let mut ad = AnalysisData::new();
    assert_eq!(tags(&linearize(&body, &mut ad)), ["action"]);
}

#[test]
fn unnamed_cycle_and_exit_resolve_to_nearest_loop() {
    let body = vec![counted_do(vec![
        action(ActionStmt::Exit(ast::ExitStmt { name: None })),
        action(ActionStmt::Cycle(ast::CycleStmt { name: None })),
    ])];
    let mut ad = AnalysisData::new();
    let ops = linearize(&body, &mut ad);
    let (_, cond_false) = match ops[6] {
        LinearOp::CondGoto(_, true_label, false_label) => (true_label, false_label),
        _ => unreachable!(),
    };
    let increment = match ops[2] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    // exit aims at the loop exit, cycle at the increment
    match (&ops[8], &ops[9]) {
        (LinearOp::Goto(exit_target), LinearOp::Goto(cycle_target)) => {
            assert_eq!(*exit_target, cond_false);
            assert_eq!(*cycle_target, increment);
        }
        other => panic!("expected two gotos, got {:?}", other),
    }
}

#[test]
fn named_exit_leaves_a_named_block_construct() {
    let block = ExecutableConstruct::Block(ast::BlockConstruct {
        stmt: Statement::new(ast::BlockStmt {
            name: Some(Name::new("outer")),
        }),
        body: vec![action(ActionStmt::Exit(ast::ExitStmt {
            name: Some(Name::new("outer")),
        }))],
    });
    let mut ad = AnalysisData::new();
    let block_vec = vec![block];
    let ops = linearize(&block_vec, &mut ad);
    // begin, goto(exit), end, label(exit)
    assert_eq!(tags(&ops), ["begin", "goto", "end", "label"]);
    let target = match ops[1] {
        LinearOp::Goto(target) => target,
        _ => unreachable!(),
    };
    let exit = match ops[3] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    assert_eq!(target, exit);
}

#[test]
#[should_panic(expected = "CYCLE|EXIT not in loop")]
fn exit_outside_any_loop_is_a_semantics_bug() {
    let body = vec![action(ActionStmt::Exit(ast::ExitStmt { name: None }))];
    let mut ad = AnalysisData::new();
    linearize(&body, &mut ad);
}

#[test]
#[should_panic(expected = "CYCLE names non-loop construct")]
fn cycle_naming_a_block_is_a_semantics_bug() {
    let block = ExecutableConstruct::Block(ast::BlockConstruct {
        stmt: Statement::new(ast::BlockStmt {
            name: Some(Name::new("b")),
        }),
        body: vec![action(ActionStmt::Cycle(ast::CycleStmt {
            name: Some(Name::new("b")),
        }))],
    });
    let mut ad = AnalysisData::new();
    linearize(&vec![block], &mut ad);
}

#[test]
fn select_case_switch_carries_exit_as_fallthrough() {
    let construct = ExecutableConstruct::Case(ast::CaseConstruct {
        stmt: Statement::new(ast::SelectCaseStmt {
            name: None,
            expr: Expr::int(1),
        }),
        cases: vec![
            ast::Case {
                stmt: Statement::new(ast::CaseStmt {
                    selector: ast::CaseSelector::Ranges(vec![ast::CaseValueRange::Exact(
                        Expr::int(1),
                    )]),
                }),
                block: vec![action(assignment("x"))],
            },
            ast::Case {
                stmt: Statement::new(ast::CaseStmt {
                    selector: ast::CaseSelector::Default,
                }),
                block: vec![action(assignment("x"))],
            },
        ],
    });
    let mut ad = AnalysisData::new();
    let construct_vec = vec![construct];
    let ops = linearize(&construct_vec, &mut ad);
    assert_eq!(
        tags(&ops),
        [
            "begin", "switch", "label", "action", "goto", "label", "action", "goto", "label",
            "end",
        ]
    );
    let switch = match &ops[1] {
        LinearOp::Switch(switch) => switch,
        _ => unreachable!(),
    };
    // two case labels plus the exit
    assert_eq!(switch.refs.len(), 3);
    let exit = match ops[8] {
        LinearOp::Label(label) => label,
        _ => unreachable!(),
    };
    assert_eq!(*switch.refs.last().unwrap(), exit);
}
