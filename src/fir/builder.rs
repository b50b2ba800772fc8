//! Statement builder with an insertion cursor.
//!
//! The cursor tracks a current region and an optional current block.
//! Inserting a terminator records this block as a predecessor of every
//! successor; the CFG constructor clears the cursor afterwards and the
//! next label or implicit reopen starts a fresh block.

use crate::expr::Expression;
use crate::fir::model::*;
use crate::symtab::SymbolId;
use crate::types::DeclTypeSpec;

pub struct FirBuilder<'p> {
    procedure: &'p mut Procedure,
    cursor_region: RegionId,
    cursor_block: Option<BlockId>,
}

impl<'p> FirBuilder<'p> {
    /// Starts with a fresh entry block in the procedure's root region.
    pub fn new(procedure: &'p mut Procedure) -> Self {
        let root = procedure.root_region();
        let entry = procedure.new_block(root);
        Self {
            procedure,
            cursor_region: root,
            cursor_block: Some(entry),
        }
    }

    pub fn procedure(&self) -> &Procedure {
        self.procedure
    }

    pub fn create_block(&mut self, region: RegionId) -> BlockId {
        self.procedure.new_block(region)
    }

    pub fn new_region(&mut self, parent: RegionId) -> RegionId {
        self.procedure.new_region(parent)
    }

    pub fn set_insertion_point(&mut self, block: BlockId) {
        self.cursor_region = self.procedure.block(block).region;
        self.cursor_block = Some(block);
    }

    pub fn clear_insertion_point(&mut self) {
        self.cursor_block = None;
    }

    pub fn insertion_point(&self) -> Option<BlockId> {
        self.cursor_block
    }

    pub fn current_region(&self) -> RegionId {
        self.cursor_region
    }

    pub fn set_current_region(&mut self, region: RegionId) {
        self.cursor_region = region;
    }

    pub fn enclosing_region(&self) -> RegionId {
        self.procedure
            .region(self.cursor_region)
            .parent
            .expect("root region has no enclosing region")
    }

    fn insert(&mut self, kind: StmtKind) -> StmtId {
        let block = self
            .cursor_block
            .expect("semantics bug: no insertion point");
        debug_assert!(
            self.procedure.terminator(block).is_none(),
            "cannot insert into a terminated block"
        );
        let stmt = self.procedure.new_stmt(kind);
        self.procedure.block_mut(block).stmts.push(stmt);
        stmt
    }

    fn insert_terminator(&mut self, kind: StmtKind) -> StmtId {
        let successors = kind.successors();
        let stmt = self.insert(kind);
        let block = self.cursor_block.unwrap();
        for successor in successors {
            self.procedure.block_mut(successor).add_pred(block);
        }
        stmt
    }

    pub fn create_alloc(&mut self, type_spec: Option<DeclTypeSpec>) -> StmtId {
        self.insert(StmtKind::Alloc { type_spec })
    }

    pub fn create_dealloc(&mut self, alloc: StmtId) -> StmtId {
        self.insert(StmtKind::Dealloc { alloc })
    }

    pub fn create_expr(&mut self, expr: Expression) -> StmtId {
        self.insert(StmtKind::ApplyExpr { expr })
    }

    pub fn create_addr(&mut self, expr: Expression) -> StmtId {
        self.insert(StmtKind::LocateExpr { expr })
    }

    pub fn create_load(&mut self, addr: StmtId) -> StmtId {
        self.insert(StmtKind::Load { addr })
    }

    pub fn create_store(&mut self, addr: StmtId, value: StmtId) -> StmtId {
        self.insert(StmtKind::Store {
            addr,
            value: StoreValue::Stmt(value),
        })
    }

    pub fn create_store_block(&mut self, addr: StmtId, block: BlockId) -> StmtId {
        self.insert(StmtKind::Store {
            addr,
            value: StoreValue::Block(block),
        })
    }

    pub fn create_call(
        &mut self,
        type_spec: Option<DeclTypeSpec>,
        callee: Expression,
        args: Vec<Expression>,
    ) -> StmtId {
        self.insert(StmtKind::Call {
            type_spec,
            callee,
            args,
        })
    }

    pub fn create_increment(&mut self, lhs: StmtId, step: StmtId) -> StmtId {
        self.insert(StmtKind::Increment { lhs, step })
    }

    pub fn create_do_condition(&mut self, step: StmtId, var: StmtId, upper: StmtId) -> StmtId {
        self.insert(StmtKind::DoCondition { step, var, upper })
    }

    pub fn create_io_call(&mut self, call: IoCall, args: Vec<Expression>) -> StmtId {
        self.insert(StmtKind::IoRuntime { call, args })
    }

    pub fn create_runtime_call(&mut self, call: RuntimeCall, args: Vec<Expression>) -> StmtId {
        self.insert(StmtKind::Runtime { call, args })
    }

    pub fn create_nullify(&mut self, addr: StmtId) -> StmtId {
        self.insert(StmtKind::Nullify { addr })
    }

    pub fn create_branch(&mut self, target: BlockId) -> StmtId {
        self.insert_terminator(StmtKind::Branch { target })
    }

    pub fn create_cond_branch(
        &mut self,
        cond: StmtId,
        true_block: BlockId,
        false_block: BlockId,
    ) -> StmtId {
        self.insert_terminator(StmtKind::CondBranch {
            cond,
            true_block,
            false_block,
        })
    }

    pub fn create_indirect_branch(
        &mut self,
        variable: SymbolId,
        targets: Vec<BlockId>,
    ) -> StmtId {
        self.insert_terminator(StmtKind::IndirectBranch { variable, targets })
    }

    pub fn create_switch(
        &mut self,
        cond: StmtId,
        default: BlockId,
        cases: Vec<(SwitchValue, BlockId)>,
    ) -> StmtId {
        self.insert_terminator(StmtKind::Switch {
            cond,
            default,
            cases,
        })
    }

    pub fn create_switch_case(
        &mut self,
        cond: StmtId,
        default: BlockId,
        cases: Vec<(CaseValue, BlockId)>,
    ) -> StmtId {
        self.insert_terminator(StmtKind::SwitchCase {
            cond,
            default,
            cases,
        })
    }

    pub fn create_switch_rank(
        &mut self,
        cond: StmtId,
        default: BlockId,
        cases: Vec<(RankValue, BlockId)>,
    ) -> StmtId {
        self.insert_terminator(StmtKind::SwitchRank {
            cond,
            default,
            cases,
        })
    }

    pub fn create_switch_type(
        &mut self,
        cond: StmtId,
        default: BlockId,
        cases: Vec<(TypeGuardValue, BlockId)>,
    ) -> StmtId {
        self.insert_terminator(StmtKind::SwitchType {
            cond,
            default,
            cases,
        })
    }

    pub fn create_return(&mut self, value: Option<StmtId>) -> StmtId {
        self.insert_terminator(StmtKind::Return { value })
    }

    pub fn create_unreachable(&mut self) -> StmtId {
        self.insert_terminator(StmtKind::Unreachable)
    }

    /// Inserts a non-terminator statement into `block`, before its
    /// terminator if it already has one. Used when patching a
    /// forward-referenced `ASSIGN` store after the label map is total.
    pub fn insert_into_block(&mut self, block: BlockId, kind: StmtKind) -> StmtId {
        debug_assert!(!kind.is_terminator());
        let stmt = self.procedure.new_stmt(kind);
        let terminated = self.procedure.terminator(block).is_some();
        let block_ref = self.procedure.block_mut(block);
        let position = if terminated {
            block_ref.stmts.len() - 1
        } else {
            block_ref.stmts.len()
        };
        block_ref.stmts.insert(position, stmt);
        stmt
    }
}

#[cfg(test)]
#[path = "../tests/t_fir_builder.rs"]
mod tests;
