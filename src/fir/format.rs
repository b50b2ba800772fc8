//! Deterministic text rendering of procedures, used by the debug dump
//! and the tests.

use std::fmt::{Display, Formatter, Result, Write};

use crate::fir::model::*;

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for procedure in &self.procedures {
            write!(f, "{}", procedure)?;
        }
        Ok(())
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "procedure {} {{", self.name)?;
        format_region(self, self.root_region(), 1, f)?;
        writeln!(f, "}}")
    }
}

fn indent(f: &mut Formatter<'_>, depth: usize) -> Result {
    for _ in 0..depth {
        write!(f, "  ")?;
    }
    Ok(())
}

fn format_region(
    procedure: &Procedure,
    region: RegionId,
    depth: usize,
    f: &mut Formatter<'_>,
) -> Result {
    indent(f, depth)?;
    writeln!(f, "region r{} {{", region.0)?;
    for &block in &procedure.region(region).blocks {
        format_block(procedure, block, depth + 1, f)?;
    }
    for &child in &procedure.region(region).children {
        format_region(procedure, child, depth + 1, f)?;
    }
    indent(f, depth)?;
    writeln!(f, "}}")
}

fn format_block(
    procedure: &Procedure,
    block: BlockId,
    depth: usize,
    f: &mut Formatter<'_>,
) -> Result {
    let block_ref = procedure.block(block);
    indent(f, depth)?;
    if block_ref.preds.is_empty() {
        writeln!(f, "b{}:", block.0)?;
    } else {
        let preds: Vec<String> = block_ref
            .preds
            .iter()
            .map(|pred| format!("b{}", pred.0))
            .collect();
        writeln!(f, "b{}: ; preds: {}", block.0, preds.join(", "))?;
    }
    for &stmt in &block_ref.stmts {
        indent(f, depth + 1)?;
        writeln!(
            f,
            "s{}: {}",
            stmt.0,
            format_stmt(&procedure.stmt(stmt).kind)
        )?;
    }
    Ok(())
}

fn stmt_ref(id: StmtId) -> String {
    format!("s{}", id.0)
}

fn block_ref(id: BlockId) -> String {
    format!("b{}", id.0)
}

fn format_stmt(kind: &StmtKind) -> String {
    match kind {
        StmtKind::Alloc { type_spec } => match type_spec {
            Some(type_spec) => format!("alloc {}", type_spec),
            None => "alloc".to_string(),
        },
        StmtKind::Dealloc { alloc } => format!("dealloc {}", stmt_ref(*alloc)),
        StmtKind::Load { addr } => format!("load {}", stmt_ref(*addr)),
        StmtKind::Store { addr, value } => match value {
            StoreValue::Stmt(stmt) => format!("store {}, {}", stmt_ref(*addr), stmt_ref(*stmt)),
            StoreValue::Block(block) => {
                format!("store {}, {}", stmt_ref(*addr), block_ref(*block))
            }
        },
        StmtKind::ApplyExpr { expr } => format!("apply-expr {}", expr),
        StmtKind::LocateExpr { expr } => format!("locate-expr {}", expr),
        StmtKind::Call { callee, args, .. } => {
            let mut out = format!("call {}(", callee);
            for (index, arg) in args.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}", arg);
            }
            out.push(')');
            out
        }
        StmtKind::Increment { lhs, step } => {
            format!("increment {}, {}", stmt_ref(*lhs), stmt_ref(*step))
        }
        StmtKind::DoCondition { step, var, upper } => format!(
            "do-condition {}, {}, {}",
            stmt_ref(*step),
            stmt_ref(*var),
            stmt_ref(*upper)
        ),
        StmtKind::IoRuntime { call, args } => {
            format!("io-call {} ({} args)", call.name(), args.len())
        }
        StmtKind::Runtime { call, args } => {
            format!("runtime-call {} ({} args)", call.name(), args.len())
        }
        StmtKind::Nullify { addr } => format!("nullify {}", stmt_ref(*addr)),
        StmtKind::Branch { target } => format!("br {}", block_ref(*target)),
        StmtKind::CondBranch {
            cond,
            true_block,
            false_block,
        } => format!(
            "condbr {}, {}, {}",
            stmt_ref(*cond),
            block_ref(*true_block),
            block_ref(*false_block)
        ),
        StmtKind::IndirectBranch { targets, .. } => {
            let targets: Vec<String> = targets.iter().map(|target| block_ref(*target)).collect();
            format!("indirectbr [{}]", targets.join(", "))
        }
        StmtKind::Switch { cond, default, cases } => {
            format_switch("switch", *cond, *default, cases.len())
        }
        StmtKind::SwitchCase { cond, default, cases } => {
            format_switch("switch-case", *cond, *default, cases.len())
        }
        StmtKind::SwitchRank { cond, default, cases } => {
            format_switch("switch-rank", *cond, *default, cases.len())
        }
        StmtKind::SwitchType { cond, default, cases } => {
            format_switch("switch-type", *cond, *default, cases.len())
        }
        StmtKind::Return { value } => match value {
            Some(value) => format!("ret {}", stmt_ref(*value)),
            None => "ret".to_string(),
        },
        StmtKind::Unreachable => "unreachable".to_string(),
    }
}

fn format_switch(name: &str, cond: StmtId, default: BlockId, cases: usize) -> String {
    format!(
        "{} {}, default {}, {} cases",
        name,
        stmt_ref(cond),
        block_ref(default),
        cases
    )
}
