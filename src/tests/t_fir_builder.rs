use crate::expr::Expression;
use crate::fir::{
    verify_procedure, FirBuilder, Procedure, StmtKind, SwitchValue,
};

fn mk_procedure() -> Procedure {
    Procedure::new("test")
}

#[test]
fn starts_with_an_entry_block() {
    let mut procedure = mk_procedure();
    let builder = FirBuilder::new(&mut procedure);
    assert_eq!(builder.insertion_point().map(|block| block.0), Some(0));
    assert_eq!(builder.current_region(), builder.procedure().root_region());
}

#[test]
fn terminator_updates_predecessors() {
    let mut procedure = mk_procedure();
    {
        let mut builder = FirBuilder::new(&mut procedure);
        let root = builder.current_region();
        let target = builder.create_block(root);
        builder.create_branch(target);
        builder.set_insertion_point(target);
        builder.create_return(None);
    }
    assert_eq!(procedure.block(procedure.blocks[1].id).preds.len(), 1);
    assert_eq!(procedure.blocks[1].preds[0].0, 0);
    assert!(verify_procedure(&procedure).is_ok());
}

#[test]
fn predecessors_stay_unique() {
    let mut procedure = mk_procedure();
    {
        let mut builder = FirBuilder::new(&mut procedure);
        let root = builder.current_region();
        let target = builder.create_block(root);
        // both switch edges lead to the same block
        let cond = builder.create_expr(Expression::int(1, 4));
        builder.create_switch(
            cond,
            target,
            vec![(SwitchValue::Zero, target), (SwitchValue::Negative, target)],
        );
        builder.set_insertion_point(target);
        builder.create_return(None);
    }
    assert_eq!(procedure.blocks[1].preds.len(), 1);
    assert!(verify_procedure(&procedure).is_ok());
}

#[test]
fn regions_nest() {
    let mut procedure = mk_procedure();
    {
        let mut builder = FirBuilder::new(&mut procedure);
        let root = builder.current_region();
        let inner = builder.new_region(root);
        let block = builder.create_block(inner);
        builder.create_branch(block);
        builder.set_insertion_point(block);
        assert_eq!(builder.current_region(), inner);
        assert_eq!(builder.enclosing_region(), root);
        builder.create_return(None);
    }
    assert_eq!(procedure.regions.len(), 2);
    assert_eq!(procedure.region(procedure.root_region()).children.len(), 1);
    assert!(verify_procedure(&procedure).is_ok());
}

#[test]
fn verify_catches_unterminated_reachable_block() {
    let mut procedure = mk_procedure();
    {
        let mut builder = FirBuilder::new(&mut procedure);
        builder.create_expr(Expression::int(1, 4));
        // entry block never terminated
    }
    let errors = verify_procedure(&procedure).unwrap_err();
    assert!(errors.iter().any(|error| error.contains("not terminated")));
}

#[test]
fn verify_catches_inconsistent_predecessors() {
    let mut procedure = mk_procedure();
    {
        let mut builder = FirBuilder::new(&mut procedure);
        let root = builder.current_region();
        let target = builder.create_block(root);
        builder.create_branch(target);
        builder.set_insertion_point(target);
        builder.create_return(None);
    }
    procedure.blocks[1].preds.clear();
    let errors = verify_procedure(&procedure).unwrap_err();
    assert!(errors
        .iter()
        .any(|error| error.contains("predecessor set")));
}

#[test]
fn late_store_lands_before_the_terminator() {
    let mut procedure = mk_procedure();
    let (block, addr) = {
        let mut builder = FirBuilder::new(&mut procedure);
        let block = builder.insertion_point().unwrap();
        let addr = builder.create_addr(Expression::int(0, 4));
        builder.create_return(None);
        (block, addr)
    };
    {
        let mut builder = FirBuilder::new(&mut procedure);
        let target = builder.insertion_point().unwrap();
        builder.insert_into_block(
            block,
            StmtKind::Store {
                addr,
                value: crate::fir::StoreValue::Block(target),
            },
        );
    }
    let stmts = &procedure.block(block).stmts;
    assert_eq!(stmts.len(), 3);
    let last = *stmts.last().unwrap();
    assert!(procedure.stmt(last).kind.is_terminator());
}
