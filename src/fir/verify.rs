//! Well-formedness checks for constructed procedures.

use std::collections::HashSet;

use crate::fir::model::{BlockId, Procedure};

/// Checks that every reachable block is terminated exactly once, that
/// every successor belongs to the procedure, and that predecessor sets
/// are the inverse of the successor relation.
pub fn verify_procedure(procedure: &Procedure) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if procedure.blocks.is_empty() {
        errors.push(format!("procedure '{}' has no blocks", procedure.name));
        return Err(errors);
    }

    for block in &procedure.blocks {
        let terminators = block
            .stmts
            .iter()
            .filter(|stmt| procedure.stmt(**stmt).kind.is_terminator())
            .count();
        if terminators > 1 {
            errors.push(format!(
                "block b{} has {} terminators",
                block.id.0, terminators
            ));
        }
        if terminators == 1 && procedure.terminator(block.id).is_none() {
            errors.push(format!("block b{} has a non-final terminator", block.id.0));
        }
        for successor in procedure.successors(block.id) {
            if successor.index() >= procedure.blocks.len() {
                errors.push(format!(
                    "block b{} branches to unknown block b{}",
                    block.id.0, successor.0
                ));
            }
        }
    }

    for block in reachable_blocks(procedure) {
        if procedure.terminator(block).is_none() {
            errors.push(format!("reachable block b{} is not terminated", block.0));
        }
    }

    // predecessor sets must be the inverse of the successor relation
    for block in &procedure.blocks {
        let preds: HashSet<BlockId> = block.preds.iter().copied().collect();
        if preds.len() != block.preds.len() {
            errors.push(format!("block b{} has duplicate predecessors", block.id.0));
        }
        let inverse: HashSet<BlockId> = procedure
            .blocks
            .iter()
            .filter(|other| procedure.successors(other.id).contains(&block.id))
            .map(|other| other.id)
            .collect();
        if preds != inverse {
            errors.push(format!(
                "block b{} predecessor set {:?} does not match inverse successors {:?}",
                block.id.0, preds, inverse
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Blocks reachable from the entry block.
pub fn reachable_blocks(procedure: &Procedure) -> Vec<BlockId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut work = vec![BlockId(0)];
    while let Some(block) = work.pop() {
        if !visited.insert(block) {
            continue;
        }
        order.push(block);
        for successor in procedure.successors(block) {
            if !visited.contains(&successor) {
                work.push(successor);
            }
        }
    }
    order
}
