//! Per-statement translation of action statements into IR statements.
//!
//! Control transfers (`CONTINUE`, `CYCLE`, `EXIT`, `GOTO`, `IF`,
//! `RETURN`, computed/arithmetic/assigned GOTO) are the linearizer's
//! business and must never reach this handler.

use crate::ast;
use crate::expr::Expression;
use crate::fir::RuntimeCall;
use crate::lower::CfgLowering;

impl CfgLowering<'_, '_, '_> {
    pub(crate) fn handle_action_statement(&mut self, stmt: &ast::Statement<ast::ActionStmt>) {
        use ast::ActionStmt::*;
        match &stmt.stmt {
            Allocate(allocate) => self.handle_allocate(allocate),
            Assignment(assignment) => self.handle_assignment(assignment),
            PointerAssignment(pointer) => self.handle_pointer_assignment(pointer),
            Assign(assign) => self.handle_assign(assign),
            Call(call) => {
                self.lower_call(call);
            }
            Deallocate(deallocate) => self.handle_deallocate(deallocate),
            Nullify(nullify) => self.handle_nullify(nullify),

            Backspace(_) | Close(_) | Endfile(_) | Flush(_) | Inquire(_) | Open(_)
            | Print(_) | Read(_) | Rewind(_) | Wait(_) | Write(_) => {
                self.lower_io_call(&stmt.stmt)
                    .expect("I/O statement translates to an I/O call");
            }

            EventPost(event) => {
                let mut args = vec![self.analyze_variable(&event.event)];
                args.extend(self.sync_stat_args(&event.stats));
                self.builder.create_runtime_call(RuntimeCall::EventPost, args);
            }
            EventWait(event) => {
                let mut args = vec![self.analyze_variable(&event.event)];
                if let Some(until_count) = &event.until_count {
                    args.push(self.analyze_expr(until_count));
                }
                args.extend(self.sync_stat_args(&event.stats));
                self.builder.create_runtime_call(RuntimeCall::EventWait, args);
            }
            FailImage => {
                self.builder
                    .create_runtime_call(RuntimeCall::FailImage, Vec::new());
            }
            FormTeam(form_team) => {
                let mut args = vec![
                    self.analyze_expr(&form_team.team_number),
                    self.analyze_variable(&form_team.team_var),
                ];
                args.extend(self.sync_stat_args(&form_team.stats));
                self.builder.create_runtime_call(RuntimeCall::FormTeam, args);
            }
            Lock(lock) => {
                let mut args = vec![self.analyze_variable(&lock.lock_var)];
                if let Some(acquired) = &lock.acquired {
                    args.push(self.analyze_variable(acquired));
                }
                args.extend(self.sync_stat_args(&lock.stats));
                self.builder.create_runtime_call(RuntimeCall::Lock, args);
            }
            Unlock(unlock) => {
                let mut args = vec![self.analyze_variable(&unlock.lock_var)];
                args.extend(self.sync_stat_args(&unlock.stats));
                self.builder.create_runtime_call(RuntimeCall::Unlock, args);
            }
            Pause(pause) => {
                let args = match &pause.code {
                    Some(code) => vec![self.analyze_expr(code)],
                    None => Vec::new(),
                };
                self.builder.create_runtime_call(RuntimeCall::Pause, args);
            }
            Stop(stop) => {
                let args = match &stop.code {
                    Some(code) => vec![self.analyze_expr(code)],
                    None => Vec::new(),
                };
                self.builder.create_runtime_call(RuntimeCall::Stop, args);
            }
            SyncAll(stats) => {
                let args = self.sync_stat_args(stats);
                self.builder.create_runtime_call(RuntimeCall::SyncAll, args);
            }
            SyncImages(sync) => {
                let mut args = Vec::new();
                if let ast::ImageSet::Expr(expr) = &sync.images {
                    args.push(self.analyze_expr(expr));
                }
                args.extend(self.sync_stat_args(&sync.stats));
                self.builder
                    .create_runtime_call(RuntimeCall::SyncImages, args);
            }
            SyncMemory(stats) => {
                let args = self.sync_stat_args(stats);
                self.builder
                    .create_runtime_call(RuntimeCall::SyncMemory, args);
            }
            SyncTeam(sync) => {
                let mut args = vec![self.analyze_expr(&sync.team)];
                args.extend(self.sync_stat_args(&sync.stats));
                self.builder.create_runtime_call(RuntimeCall::SyncTeam, args);
            }

            Where(_) => {
                self.context
                    .unsupported("where", "single-statement WHERE lowering");
            }
            Forall(_) => {
                self.context
                    .unsupported("forall", "single-statement FORALL lowering");
            }

            Continue | Cycle(_) | Exit(_) | Goto(_) | If(_) | Return(_) | ComputedGoto(_)
            | ArithmeticIf(_) | AssignedGoto(_) => {
                panic!(
                    "semantics bug: '{}' statement reached the action handler",
                    stmt.stmt.tag()
                );
            }
        }
    }

    fn handle_assignment(&mut self, assignment: &ast::AssignmentStmt) {
        // intrinsic assignment; defined assignment dispatches elsewhere
        let value = {
            let expr = self.analyze_expr(&assignment.expr);
            self.builder.create_expr(expr)
        };
        let addr = {
            let variable = self.analyze_variable(&assignment.variable);
            self.builder.create_addr(variable)
        };
        self.builder.create_store(addr, value);
    }

    fn handle_pointer_assignment(&mut self, pointer: &ast::PointerAssignmentStmt) {
        match &pointer.bounds {
            ast::PointerBounds::None => {}
            ast::PointerBounds::Spec(specs) if specs.is_empty() => {}
            ast::PointerBounds::Remapping(remaps) if remaps.is_empty() => {}
            _ => {
                let name = pointer.lhs.base().text.clone();
                self.context
                    .unsupported(name, "pointer assignment bounds remapping");
            }
        }
        let value = {
            let expr = self.analyze_expr(&pointer.expr);
            self.builder.create_addr(expr)
        };
        let addr = {
            let lhs = self.analyze_data_ref(&pointer.lhs);
            self.builder.create_addr(lhs)
        };
        self.builder.create_store(addr, value);
    }

    /// `ASSIGN label TO v` stores a block reference into the variable.
    fn handle_assign(&mut self, assign: &ast::AssignStmt) {
        let addr = {
            let name = self.analyze_name(&assign.name);
            self.builder.create_addr(name)
        };
        let label = self.ad.fetch_label(assign.label);
        match self.block_map.get(&label).copied() {
            Some(block) => {
                self.builder.create_store_block(addr, block);
            }
            None => self.queue_store_block(addr, label),
        }
    }

    fn handle_allocate(&mut self, allocate: &ast::AllocateStmt) {
        // evaluate the options up front
        for opt in &allocate.opts {
            match opt {
                ast::AllocOpt::Mold(expr) | ast::AllocOpt::Source(expr) => {
                    let expr = self.analyze_expr(expr);
                    self.builder.create_expr(expr);
                }
                ast::AllocOpt::Stat(variable) | ast::AllocOpt::ErrMsg(variable) => {
                    let variable = self.analyze_variable(variable);
                    self.builder.create_addr(variable);
                }
            }
        }
        for allocation in &allocate.allocations {
            for extent in &allocation.shape {
                let expr = self.analyze_expr(extent);
                self.builder.create_expr(expr);
            }
            self.builder.create_alloc(allocate.type_spec.clone());
        }
    }

    fn handle_deallocate(&mut self, deallocate: &ast::DeallocateStmt) {
        for opt in &deallocate.opts {
            if let ast::AllocOpt::Stat(variable) | ast::AllocOpt::ErrMsg(variable) = opt {
                let variable = self.analyze_variable(variable);
                self.builder.create_addr(variable);
            }
        }
        for object in &deallocate.objects {
            let addr = {
                let expr = self.analyze_data_ref(object);
                self.builder.create_addr(expr)
            };
            self.builder.create_dealloc(addr);
        }
    }

    fn handle_nullify(&mut self, nullify: &ast::NullifyStmt) {
        for object in &nullify.objects {
            let addr = {
                let expr = self.analyze_data_ref(object);
                self.builder.create_addr(expr)
            };
            self.builder.create_nullify(addr);
        }
    }

    fn sync_stat_args(&mut self, stats: &[ast::SyncStat]) -> Vec<Expression> {
        stats
            .iter()
            .map(|stat| match stat {
                ast::SyncStat::Stat(variable) | ast::SyncStat::ErrMsg(variable) => {
                    self.analyze_variable(variable)
                }
            })
            .collect()
    }
}
