//! Control-flow lowering: parse tree to typed, block-structured IR.
//!
//! Lowering runs in two stages per subprogram. The linearizer
//! (`linear.rs`) flattens the statement tree into a stream of linear ops;
//! the CFG constructor here consumes that stream in order, materializing
//! basic blocks inside nested regions and rewriting labels into block
//! references. A branch whose target block does not exist yet is queued
//! as a fixup and replayed once the label map is total.

pub mod actions;
pub mod linear;

use std::collections::HashMap;

use crate::ast;
use crate::context::SemanticsContext;
use crate::expr::{Expression, ExpressionAnalyzer};
use crate::fir;
use crate::fir::{
    BlockId, CaseRange, CaseValue, FirBuilder, IoCall, RankValue, RuntimeCall, StmtId,
    SwitchValue, TypeGuardValue,
};
use crate::lower::linear::{
    linearize, AnalysisData, CondGotoOp, ConstructOp, LabelRef, LinearOp, ReturnOp, SwitchIoOp,
    SwitchKind, SwitchOp,
};
use crate::symtab::SymbolId;

/// Lowers every subprogram of a program into an IR program.
pub fn lower_program(
    program: &ast::Program,
    context: &mut SemanticsContext,
    debug_linear: bool,
) -> fir::Program {
    let mut fir_program = fir::Program::new();
    for unit in &program.units {
        match unit {
            ast::ProgramUnit::Main(main) => {
                let name = main
                    .name
                    .as_ref()
                    .map(|name| name.text.clone())
                    .unwrap_or_else(|| "_MAIN".to_string());
                lower_routine(&mut fir_program, context, &name, &main.body, debug_linear);
            }
            ast::ProgramUnit::Function(function) => {
                let name = function.stmt.stmt.name.text.clone();
                lower_routine(&mut fir_program, context, &name, &function.body, debug_linear);
            }
            ast::ProgramUnit::Subroutine(subroutine) => {
                let name = subroutine.stmt.stmt.name.text.clone();
                lower_routine(
                    &mut fir_program,
                    context,
                    &name,
                    &subroutine.body,
                    debug_linear,
                );
            }
            ast::ProgramUnit::Module(module) => {
                for subprogram in &module.contains {
                    lower_module_subprogram(&mut fir_program, context, subprogram, debug_linear);
                }
            }
            ast::ProgramUnit::Submodule(submodule) => {
                for subprogram in &submodule.contains {
                    lower_module_subprogram(&mut fir_program, context, subprogram, debug_linear);
                }
            }
        }
    }
    fir_program
}

fn lower_module_subprogram(
    fir_program: &mut fir::Program,
    context: &mut SemanticsContext,
    subprogram: &ast::ModuleSubprogram,
    debug_linear: bool,
) {
    match subprogram {
        ast::ModuleSubprogram::Function(function) => {
            let name = function.stmt.stmt.name.text.clone();
            lower_routine(fir_program, context, &name, &function.body, debug_linear);
        }
        ast::ModuleSubprogram::Subroutine(subroutine) => {
            let name = subroutine.stmt.stmt.name.text.clone();
            lower_routine(fir_program, context, &name, &subroutine.body, debug_linear);
        }
    }
}

fn lower_routine(
    fir_program: &mut fir::Program,
    context: &mut SemanticsContext,
    name: &str,
    body: &ast::Block,
    debug_linear: bool,
) {
    assert!(
        !fir_program.contains_procedure(name),
        "semantics bug: procedure '{}' lowered twice",
        name
    );
    let mut procedure = fir::Procedure::new(name);
    {
        let mut ad = AnalysisData::new();
        let ops = linearize(body, &mut ad);
        if debug_linear {
            for op in &ops {
                log::debug!("{}", op);
            }
            log::debug!("--- END ---");
        }
        let mut lowering = CfgLowering {
            context,
            builder: FirBuilder::new(&mut procedure),
            ad,
            block_map: HashMap::new(),
            fixups: Vec::new(),
            do_contexts: Vec::new(),
        };
        lowering.construct_fir(&ops);
        lowering.draw_remaining_arcs();
        assert!(
            lowering.fixups.is_empty(),
            "semantics bug: unresolved fixups after lowering"
        );
    }
    fir_program.procedures.push(procedure);
}

/// Bounds and latch state of one active counted DO.
pub(crate) struct DoBoundsInfo {
    key: usize,
    do_var: StmtId,
    upper: StmtId,
    step: StmtId,
    condition: Option<StmtId>,
}

fn do_key(construct: &ast::DoConstruct) -> usize {
    construct as *const ast::DoConstruct as usize
}

/// A deferred control-flow edge, replayed once the label map is total.
pub(crate) struct Fixup {
    block: BlockId,
    kind: FixupKind,
}

pub(crate) enum FixupKind {
    Branch {
        target: LabelRef,
    },
    CondBranch {
        cond: StmtId,
        true_label: LabelRef,
        false_label: LabelRef,
    },
    IndirectBranch {
        variable: SymbolId,
        labels: Vec<LabelRef>,
    },
    Switch {
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(SwitchValue, LabelRef)>,
    },
    SwitchCase {
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(CaseValue, LabelRef)>,
    },
    SwitchRank {
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(RankValue, LabelRef)>,
    },
    SwitchType {
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(TypeGuardValue, LabelRef)>,
    },
    /// `ASSIGN` whose target label had no block yet.
    StoreBlock {
        addr: StmtId,
        label: LabelRef,
    },
}

pub(crate) struct CfgLowering<'a, 'p, 'ctx> {
    pub(crate) context: &'ctx mut SemanticsContext,
    pub(crate) builder: FirBuilder<'p>,
    pub(crate) ad: AnalysisData<'a>,
    pub(crate) block_map: HashMap<LabelRef, BlockId>,
    pub(crate) fixups: Vec<Fixup>,
    do_contexts: Vec<DoBoundsInfo>,
}

impl<'a, 'p, 'ctx> CfgLowering<'a, 'p, 'ctx> {
    fn construct_fir(&mut self, ops: &[LinearOp<'a>]) {
        let mut index = 0;
        while index < ops.len() {
            match &ops[index] {
                LinearOp::Label(label) => self.handle_label(*label),
                LinearOp::Goto(target) => {
                    self.check_insertion_point();
                    self.add_or_queue_branch(*target);
                    self.builder.clear_insertion_point();
                }
                LinearOp::IndirectGoto(symbol, labels) => {
                    self.check_insertion_point();
                    let labels = if labels.is_empty() {
                        self.ad.assigned_labels(*symbol)
                    } else {
                        labels.clone()
                    };
                    self.add_or_queue_indirect(*symbol, labels);
                    self.builder.clear_insertion_point();
                }
                LinearOp::Return(return_op) => {
                    self.check_insertion_point();
                    self.handle_return(*return_op);
                    self.builder.clear_insertion_point();
                }
                LinearOp::CondGoto(op, true_label, false_label) => {
                    self.check_insertion_point();
                    let cond = self.lower_condition(*op);
                    self.add_or_queue_cond_branch(cond, *true_label, *false_label);
                    self.builder.clear_insertion_point();
                }
                LinearOp::SwitchingIo(io) => {
                    self.check_insertion_point();
                    self.handle_switching_io(io);
                    self.builder.clear_insertion_point();
                }
                LinearOp::Switch(switch) => {
                    self.check_insertion_point();
                    self.handle_switch(switch);
                    self.builder.clear_insertion_point();
                }
                LinearOp::Action(stmt) => {
                    self.check_insertion_point();
                    self.handle_action_statement(stmt);
                }
                LinearOp::DoIncrement(construct) => {
                    self.check_insertion_point();
                    self.handle_do_increment(construct);
                }
                LinearOp::DoCompare(construct) => {
                    self.check_insertion_point();
                    self.handle_do_compare(construct);
                }
                LinearOp::BeginConstruct(construct) => {
                    self.begin_construct(construct);
                    // bind an immediately following label to the fresh
                    // first block instead of opening an empty one
                    if let Some(LinearOp::Label(label)) = ops.get(index + 1) {
                        if let Some(block) = self.builder.insertion_point() {
                            self.block_map.insert(*label, block);
                            index += 1;
                        }
                    }
                }
                LinearOp::EndConstruct(construct) => self.end_construct(construct),
            }
            index += 1;
        }
        // a body that falls off the end returns implicitly
        if self.builder.insertion_point().is_some() {
            self.builder.create_return(None);
            self.builder.clear_insertion_point();
        }
    }

    // --- cursor and label bookkeeping ---

    fn handle_label(&mut self, label: LabelRef) {
        if !self.ad.label_builder.is_referenced(label) {
            // nothing branches here; bind to the open block if any
            if let Some(block) = self.builder.insertion_point() {
                self.block_map.insert(label, block);
                return;
            }
        }
        let region = self.builder.current_region();
        let block = self.builder.create_block(region);
        self.block_map.insert(label, block);
        if self.builder.insertion_point().is_some() {
            self.builder.create_branch(block);
        }
        self.builder.set_insertion_point(block);
    }

    fn check_insertion_point(&mut self) {
        if self.builder.insertion_point().is_none() {
            let region = self.builder.current_region();
            let block = self.builder.create_block(region);
            self.builder.set_insertion_point(block);
        }
    }

    fn enter_region(&mut self) {
        let enclosing = self.builder.current_region();
        let region = self.builder.new_region(enclosing);
        let block = self.builder.create_block(region);
        self.check_insertion_point();
        self.builder.create_branch(block);
        self.builder.set_insertion_point(block);
    }

    fn exit_region(&mut self) {
        let enclosing = self.builder.enclosing_region();
        self.builder.set_current_region(enclosing);
    }

    // --- expression analysis ---

    pub(crate) fn analyze_expr(&mut self, expr: &ast::Expr) -> Expression {
        match ExpressionAnalyzer::new(&self.context.table).analyze(expr) {
            Some(expression) => expression,
            None => self.unresolved_expression(),
        }
    }

    pub(crate) fn analyze_variable(&mut self, variable: &ast::Variable) -> Expression {
        match ExpressionAnalyzer::new(&self.context.table).analyze_variable(variable) {
            Some(expression) => expression,
            None => self.unresolved_expression(),
        }
    }

    pub(crate) fn analyze_name(&mut self, name: &ast::Name) -> Expression {
        match ExpressionAnalyzer::new(&self.context.table).analyze_name(name) {
            Some(expression) => expression,
            None => {
                self.context.internal_error(
                    name.text.clone(),
                    format!("no symbol found for '{}'", name.text),
                );
                Expression::int(0, 4)
            }
        }
    }

    pub(crate) fn analyze_data_ref(&mut self, data_ref: &ast::DataRef) -> Expression {
        match ExpressionAnalyzer::new(&self.context.table).analyze_data_ref(data_ref) {
            Some(expression) => expression,
            None => {
                let name = data_ref.base().text.clone();
                self.context
                    .internal_error(name.clone(), format!("no symbol found for '{}'", name));
                Expression::int(0, 4)
            }
        }
    }

    fn unresolved_expression(&mut self) -> Expression {
        self.context
            .internal_error("expression", "unresolved name after analysis");
        Expression::int(0, 4)
    }

    fn analyze_selector(&mut self, selector: &ast::Selector) -> Expression {
        match selector {
            ast::Selector::Expr(expr) => self.analyze_expr(expr),
            ast::Selector::Variable(variable) => self.analyze_variable(variable),
        }
    }

    // --- construct entry and exit ---

    fn begin_construct(&mut self, construct: &ConstructOp<'a>) {
        match construct {
            ConstructOp::Associate(associate) => {
                self.enter_region();
                for association in &associate.stmt.stmt.associations {
                    let selector = self.analyze_selector(&association.selector);
                    let value = self.builder.create_expr(selector);
                    let name = self.analyze_name(&association.name);
                    let addr = self.builder.create_addr(name);
                    self.builder.create_store(addr, value);
                }
            }
            ConstructOp::Block(_) => self.enter_region(),
            ConstructOp::Case(case) => {
                self.check_insertion_point();
                let selector = self.analyze_expr(&case.stmt.stmt.expr);
                self.builder.create_expr(selector);
            }
            ConstructOp::ChangeTeam(change_team) => {
                self.enter_region();
                let name = self.construct_name_text(&change_team.stmt.stmt.name);
                self.context.unsupported(name, "CHANGE TEAM initiation");
            }
            ConstructOp::Do(do_construct) => {
                self.enter_region();
                self.initiate_do(do_construct);
            }
            ConstructOp::If(if_construct) => {
                self.check_insertion_point();
                let cond = self.analyze_expr(&if_construct.stmt.stmt.cond);
                self.builder.create_expr(cond);
            }
            ConstructOp::SelectRank(_) | ConstructOp::SelectType(_) => self.enter_region(),
            ConstructOp::Where(where_construct) => {
                self.check_insertion_point();
                let mask = self.analyze_expr(&where_construct.stmt.stmt.mask);
                self.builder.create_expr(mask);
            }
            ConstructOp::Forall(forall) => {
                let name = self.construct_name_text(&forall.stmt.stmt.name);
                self.context.unsupported(name, "FORALL iteration lowering");
            }
            ConstructOp::Critical(critical) => {
                let name = self.construct_name_text(&critical.stmt.stmt.name);
                self.context.unsupported(name, "CRITICAL lowering");
            }
        }
    }

    fn construct_name_text(&self, name: &Option<ast::Name>) -> String {
        name.as_ref()
            .map(|name| name.text.clone())
            .unwrap_or_else(|| "<unnamed construct>".to_string())
    }

    fn end_construct(&mut self, construct: &ConstructOp<'a>) {
        match construct {
            ConstructOp::Block(_) => self.exit_region(),
            ConstructOp::Do(do_construct) => {
                self.finish_do(do_construct);
                self.exit_region();
            }
            ConstructOp::Associate(_)
            | ConstructOp::ChangeTeam(_)
            | ConstructOp::SelectRank(_)
            | ConstructOp::SelectType(_) => self.exit_region(),
            ConstructOp::Case(_)
            | ConstructOp::If(_)
            | ConstructOp::Where(_)
            | ConstructOp::Forall(_)
            | ConstructOp::Critical(_) => {}
        }
    }

    // --- DO loops ---

    fn initiate_do(&mut self, construct: &ast::DoConstruct) {
        if let Some(ast::LoopControl::Bounds(bounds)) = &construct.stmt.stmt.control {
            let var = {
                let name = self.analyze_name(&bounds.name);
                self.builder.create_addr(name)
            };
            let lower = {
                let expr = self.analyze_expr(&bounds.lower);
                self.builder.create_expr(expr)
            };
            let upper = {
                let expr = self.analyze_expr(&bounds.upper);
                self.builder.create_expr(expr)
            };
            let step = match &bounds.step {
                Some(step) => {
                    let expr = self.analyze_expr(step);
                    self.builder.create_expr(expr)
                }
                None => self.builder.create_expr(Expression::int(1, 4)),
            };
            self.builder.create_store(var, lower);
            self.do_contexts.push(DoBoundsInfo {
                key: do_key(construct),
                do_var: var,
                upper,
                step,
                condition: None,
            });
        }
    }

    fn finish_do(&mut self, construct: &ast::DoConstruct) {
        if let Some(ast::LoopControl::Bounds(_)) = &construct.stmt.stmt.control {
            let key = do_key(construct);
            let position = self
                .do_contexts
                .iter()
                .rposition(|info| info.key == key)
                .expect("semantics bug: DO context not present");
            self.do_contexts.remove(position);
        }
    }

    fn bounds_info(&mut self, construct: &ast::DoConstruct) -> Option<&mut DoBoundsInfo> {
        let key = do_key(construct);
        self.do_contexts.iter_mut().rev().find(|info| info.key == key)
    }

    /// `do_var = do_var + step`
    fn handle_do_increment(&mut self, construct: &ast::DoConstruct) {
        let Some(info) = self.bounds_info(construct) else {
            return; // uncounted loops have no induction variable
        };
        let (do_var, step) = (info.do_var, info.step);
        let var = self.builder.create_load(do_var);
        self.builder.create_increment(var, step);
    }

    /// `(step > 0 && do_var <= upper) || (step < 0 && do_var >= upper)`
    fn handle_do_compare(&mut self, construct: &ast::DoConstruct) {
        let Some(info) = self.bounds_info(construct) else {
            return;
        };
        let (do_var, step, upper) = (info.do_var, info.step, info.upper);
        let var = self.builder.create_load(do_var);
        let condition = self.builder.create_do_condition(step, var, upper);
        if let Some(info) = self.bounds_info(construct) {
            info.condition = Some(condition);
        }
    }

    fn lower_condition(&mut self, op: CondGotoOp<'a>) -> StmtId {
        match op {
            CondGotoOp::IfThen(stmt) => {
                let cond = self.analyze_expr(&stmt.stmt.cond);
                self.builder.create_expr(cond)
            }
            CondGotoOp::ElseIf(stmt) => {
                let cond = self.analyze_expr(&stmt.stmt.cond);
                self.builder.create_expr(cond)
            }
            CondGotoOp::IfStmt(stmt) => {
                let cond = self.analyze_expr(&stmt.cond);
                self.builder.create_expr(cond)
            }
            CondGotoOp::Do(construct) => self.loop_latch(construct),
        }
    }

    fn loop_latch(&mut self, construct: &ast::DoConstruct) -> StmtId {
        match &construct.stmt.stmt.control {
            Some(ast::LoopControl::Bounds(_)) => self
                .bounds_info(construct)
                .and_then(|info| info.condition)
                .expect("semantics bug: DO condition not computed"),
            Some(ast::LoopControl::While(cond)) => {
                let cond = self.analyze_expr(cond);
                self.builder.create_expr(cond)
            }
            // DO CONCURRENT iterates under the runtime's control here
            Some(ast::LoopControl::Concurrent(_)) | None => {
                self.builder.create_expr(Expression::always_true())
            }
        }
    }

    // --- returns ---

    fn handle_return(&mut self, op: ReturnOp<'a>) {
        match op {
            ReturnOp::FailImage => {
                self.builder
                    .create_runtime_call(RuntimeCall::FailImage, Vec::new());
                self.builder.create_unreachable();
            }
            ReturnOp::Return(stmt) => match &stmt.expr {
                Some(expr) => {
                    let value = self.analyze_expr(expr);
                    let value = self.builder.create_expr(value);
                    self.builder.create_return(Some(value));
                }
                None => {
                    self.builder.create_return(None);
                }
            },
            ReturnOp::Stop(stmt) => {
                let args = match &stmt.code {
                    Some(code) => vec![self.analyze_expr(code)],
                    None => Vec::new(),
                };
                self.builder.create_runtime_call(RuntimeCall::Stop, args);
                self.builder.create_unreachable();
            }
        }
    }

    // --- switches ---

    fn handle_switching_io(&mut self, io: &SwitchIoOp<'a>) {
        let io_stmt = self
            .lower_io_call(&io.stmt.stmt)
            .expect("semantics bug: SwitchingIo over a non-I/O statement");
        let mut cases = Vec::new();
        if let Some(err) = io.err {
            cases.push((SwitchValue::IoError, err));
        }
        if let Some(eor) = io.eor {
            cases.push((SwitchValue::IoEndOfRecord, eor));
        }
        if let Some(end) = io.end {
            cases.push((SwitchValue::IoEndOfFile, end));
        }
        self.add_or_queue_switch(io_stmt, io.next, cases);
    }

    fn handle_switch(&mut self, switch: &SwitchOp<'a>) {
        match switch.kind {
            SwitchKind::Call(call) => {
                let call_stmt = self.lower_call(call);
                let mut refs = switch.refs.clone();
                let default = refs.pop().expect("alt-return switch has a fall-through");
                let cases = refs
                    .into_iter()
                    .enumerate()
                    .map(|(index, label)| (SwitchValue::AltReturn(index as u32 + 1), label))
                    .collect();
                self.add_or_queue_switch(call_stmt, default, cases);
            }
            SwitchKind::ComputedGoto(computed) => {
                let cond = {
                    let expr = self.analyze_expr(&computed.expr);
                    self.builder.create_expr(expr)
                };
                let mut refs = switch.refs.clone();
                let default = refs.pop().expect("computed GOTO has a fall-through");
                let cases = refs
                    .into_iter()
                    .enumerate()
                    .map(|(index, label)| {
                        let value = self
                            .builder
                            .create_expr(Expression::int(index as i64 + 1, 4));
                        (SwitchValue::Value(value), label)
                    })
                    .collect();
                self.add_or_queue_switch(cond, default, cases);
            }
            SwitchKind::ArithmeticIf(arithmetic) => {
                let cond = {
                    let expr = self.analyze_expr(&arithmetic.expr);
                    self.builder.create_expr(expr)
                };
                let cases = vec![
                    (SwitchValue::Negative, switch.refs[0]),
                    (SwitchValue::Zero, switch.refs[1]),
                ];
                self.add_or_queue_switch(cond, switch.refs[2], cases);
            }
            SwitchKind::Case(construct) => {
                let (cond, default, cases) = self.compose_switch_case(construct, &switch.refs);
                self.add_or_queue_switch_case(cond, default, cases);
            }
            SwitchKind::Rank(construct) => {
                let (cond, default, cases) = self.compose_switch_rank(construct, &switch.refs);
                self.add_or_queue_switch_rank(cond, default, cases);
            }
            SwitchKind::Type(construct) => {
                let (cond, default, cases) = self.compose_switch_type(construct, &switch.refs);
                self.add_or_queue_switch_type(cond, default, cases);
            }
        }
    }

    fn compose_switch_case(
        &mut self,
        construct: &ast::CaseConstruct,
        refs: &[LabelRef],
    ) -> (StmtId, LabelRef, Vec<(CaseValue, LabelRef)>) {
        let cond = {
            let expr = self.analyze_expr(&construct.stmt.stmt.expr);
            self.builder.create_expr(expr)
        };
        // the exit label rides last as the no-default fall-through
        let mut default = *refs.last().expect("switch has an exit label");
        let mut cases = Vec::new();
        for (case, &label) in construct.cases.iter().zip(refs) {
            match &case.stmt.stmt.selector {
                ast::CaseSelector::Default => default = label,
                ast::CaseSelector::Ranges(ranges) => {
                    let mut case_ranges = Vec::new();
                    for range in ranges {
                        let range = match range {
                            ast::CaseValueRange::Exact(expr) => {
                                let expr = self.analyze_expr(expr);
                                CaseRange::Exactly(self.builder.create_expr(expr))
                            }
                            ast::CaseValueRange::Range {
                                lower: Some(lower),
                                upper: Some(upper),
                            } => {
                                let lower = self.analyze_expr(lower);
                                let lower = self.builder.create_expr(lower);
                                let upper = self.analyze_expr(upper);
                                let upper = self.builder.create_expr(upper);
                                CaseRange::InclusiveRange { lower, upper }
                            }
                            ast::CaseValueRange::Range {
                                lower: Some(lower),
                                upper: None,
                            } => {
                                let lower = self.analyze_expr(lower);
                                CaseRange::InclusiveAbove {
                                    lower: self.builder.create_expr(lower),
                                }
                            }
                            ast::CaseValueRange::Range {
                                lower: None,
                                upper: Some(upper),
                            } => {
                                let upper = self.analyze_expr(upper);
                                CaseRange::InclusiveBelow {
                                    upper: self.builder.create_expr(upper),
                                }
                            }
                            ast::CaseValueRange::Range {
                                lower: None,
                                upper: None,
                            } => continue,
                        };
                        case_ranges.push(range);
                    }
                    cases.push((CaseValue { ranges: case_ranges }, label));
                }
            }
        }
        (cond, default, cases)
    }

    fn compose_switch_rank(
        &mut self,
        construct: &ast::SelectRankConstruct,
        refs: &[LabelRef],
    ) -> (StmtId, LabelRef, Vec<(RankValue, LabelRef)>) {
        let cond = {
            let selector = self.analyze_selector(&construct.stmt.stmt.selector);
            self.builder.create_expr(selector)
        };
        let mut default = *refs.last().expect("switch has an exit label");
        let mut cases = Vec::new();
        for (case, &label) in construct.cases.iter().zip(refs) {
            match &case.stmt.stmt.rank {
                ast::RankSelector::Default => default = label,
                ast::RankSelector::Star => cases.push((RankValue::AssumedSize, label)),
                ast::RankSelector::Value(expr) => {
                    let expr = self.analyze_expr(expr);
                    let value = self.builder.create_expr(expr);
                    cases.push((RankValue::Exactly(value), label));
                }
            }
        }
        (cond, default, cases)
    }

    fn compose_switch_type(
        &mut self,
        construct: &ast::SelectTypeConstruct,
        refs: &[LabelRef],
    ) -> (StmtId, LabelRef, Vec<(TypeGuardValue, LabelRef)>) {
        let cond = {
            let selector = self.analyze_selector(&construct.stmt.stmt.selector);
            self.builder.create_expr(selector)
        };
        let mut default = *refs.last().expect("switch has an exit label");
        let mut cases = Vec::new();
        for (case, &label) in construct.cases.iter().zip(refs) {
            match &case.stmt.stmt.guard {
                ast::TypeGuard::Default => default = label,
                ast::TypeGuard::TypeIs(type_spec) => {
                    cases.push((TypeGuardValue::TypeIs(type_spec.clone()), label));
                }
                ast::TypeGuard::ClassIs(type_spec) => {
                    cases.push((TypeGuardValue::ClassIs(type_spec.clone()), label));
                }
            }
        }
        (cond, default, cases)
    }

    // --- deferred edges ---

    fn snapshot_block(&self) -> BlockId {
        self.builder
            .insertion_point()
            .expect("semantics bug: no insertion point for deferred edge")
    }

    fn resolve_label(&self, label: LabelRef) -> BlockId {
        *self
            .block_map
            .get(&label)
            .unwrap_or_else(|| panic!("semantics bug: unresolved label {} after lowering", label))
    }

    fn add_or_queue_branch(&mut self, target: LabelRef) {
        match self.block_map.get(&target) {
            Some(&block) => {
                self.builder.create_branch(block);
            }
            None => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::Branch { target },
                });
            }
        }
    }

    fn add_or_queue_cond_branch(
        &mut self,
        cond: StmtId,
        true_label: LabelRef,
        false_label: LabelRef,
    ) {
        let true_block = self.block_map.get(&true_label).copied();
        let false_block = self.block_map.get(&false_label).copied();
        match (true_block, false_block) {
            (Some(true_block), Some(false_block)) => {
                self.builder.create_cond_branch(cond, true_block, false_block);
            }
            _ => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::CondBranch {
                        cond,
                        true_label,
                        false_label,
                    },
                });
            }
        }
    }

    fn add_or_queue_indirect(&mut self, variable: SymbolId, labels: Vec<LabelRef>) {
        let blocks: Option<Vec<BlockId>> = labels
            .iter()
            .map(|label| self.block_map.get(label).copied())
            .collect();
        match blocks {
            Some(blocks) => {
                self.builder.create_indirect_branch(variable, blocks);
            }
            None => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::IndirectBranch { variable, labels },
                });
            }
        }
    }

    fn add_or_queue_switch(
        &mut self,
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(SwitchValue, LabelRef)>,
    ) {
        let default_block = self.block_map.get(&default).copied();
        let case_blocks: Option<Vec<(SwitchValue, BlockId)>> = cases
            .iter()
            .map(|(value, label)| {
                self.block_map
                    .get(label)
                    .copied()
                    .map(|block| (value.clone(), block))
            })
            .collect();
        match (default_block, case_blocks) {
            (Some(default_block), Some(case_blocks)) => {
                self.builder.create_switch(cond, default_block, case_blocks);
            }
            _ => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::Switch {
                        cond,
                        default,
                        cases,
                    },
                });
            }
        }
    }

    fn add_or_queue_switch_case(
        &mut self,
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(CaseValue, LabelRef)>,
    ) {
        let default_block = self.block_map.get(&default).copied();
        let case_blocks: Option<Vec<(CaseValue, BlockId)>> = cases
            .iter()
            .map(|(value, label)| {
                self.block_map
                    .get(label)
                    .copied()
                    .map(|block| (value.clone(), block))
            })
            .collect();
        match (default_block, case_blocks) {
            (Some(default_block), Some(case_blocks)) => {
                self.builder
                    .create_switch_case(cond, default_block, case_blocks);
            }
            _ => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::SwitchCase {
                        cond,
                        default,
                        cases,
                    },
                });
            }
        }
    }

    fn add_or_queue_switch_rank(
        &mut self,
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(RankValue, LabelRef)>,
    ) {
        let default_block = self.block_map.get(&default).copied();
        let case_blocks: Option<Vec<(RankValue, BlockId)>> = cases
            .iter()
            .map(|(value, label)| {
                self.block_map
                    .get(label)
                    .copied()
                    .map(|block| (value.clone(), block))
            })
            .collect();
        match (default_block, case_blocks) {
            (Some(default_block), Some(case_blocks)) => {
                self.builder
                    .create_switch_rank(cond, default_block, case_blocks);
            }
            _ => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::SwitchRank {
                        cond,
                        default,
                        cases,
                    },
                });
            }
        }
    }

    fn add_or_queue_switch_type(
        &mut self,
        cond: StmtId,
        default: LabelRef,
        cases: Vec<(TypeGuardValue, LabelRef)>,
    ) {
        let default_block = self.block_map.get(&default).copied();
        let case_blocks: Option<Vec<(TypeGuardValue, BlockId)>> = cases
            .iter()
            .map(|(value, label)| {
                self.block_map
                    .get(label)
                    .copied()
                    .map(|block| (value.clone(), block))
            })
            .collect();
        match (default_block, case_blocks) {
            (Some(default_block), Some(case_blocks)) => {
                self.builder
                    .create_switch_type(cond, default_block, case_blocks);
            }
            _ => {
                let block = self.snapshot_block();
                self.fixups.push(Fixup {
                    block,
                    kind: FixupKind::SwitchType {
                        cond,
                        default,
                        cases,
                    },
                });
            }
        }
    }

    /// Queues a store of a block reference for a forward `ASSIGN` target.
    pub(crate) fn queue_store_block(&mut self, addr: StmtId, label: LabelRef) {
        let block = self.snapshot_block();
        self.fixups.push(Fixup {
            block,
            kind: FixupKind::StoreBlock { addr, label },
        });
    }

    /// Replays the deferred edges against the completed label map.
    fn draw_remaining_arcs(&mut self) {
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in fixups {
            match fixup.kind {
                FixupKind::Branch { target } => {
                    let target = self.resolve_label(target);
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_branch(target);
                }
                FixupKind::CondBranch {
                    cond,
                    true_label,
                    false_label,
                } => {
                    let true_block = self.resolve_label(true_label);
                    let false_block = self.resolve_label(false_label);
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_cond_branch(cond, true_block, false_block);
                }
                FixupKind::IndirectBranch { variable, labels } => {
                    let blocks = labels
                        .iter()
                        .map(|label| self.resolve_label(*label))
                        .collect();
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_indirect_branch(variable, blocks);
                }
                FixupKind::Switch {
                    cond,
                    default,
                    cases,
                } => {
                    let default = self.resolve_label(default);
                    let cases = cases
                        .into_iter()
                        .map(|(value, label)| (value, self.resolve_label(label)))
                        .collect();
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_switch(cond, default, cases);
                }
                FixupKind::SwitchCase {
                    cond,
                    default,
                    cases,
                } => {
                    let default = self.resolve_label(default);
                    let cases = cases
                        .into_iter()
                        .map(|(value, label)| (value, self.resolve_label(label)))
                        .collect();
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_switch_case(cond, default, cases);
                }
                FixupKind::SwitchRank {
                    cond,
                    default,
                    cases,
                } => {
                    let default = self.resolve_label(default);
                    let cases = cases
                        .into_iter()
                        .map(|(value, label)| (value, self.resolve_label(label)))
                        .collect();
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_switch_rank(cond, default, cases);
                }
                FixupKind::SwitchType {
                    cond,
                    default,
                    cases,
                } => {
                    let default = self.resolve_label(default);
                    let cases = cases
                        .into_iter()
                        .map(|(value, label)| (value, self.resolve_label(label)))
                        .collect();
                    self.builder.set_insertion_point(fixup.block);
                    self.builder.create_switch_type(cond, default, cases);
                }
                FixupKind::StoreBlock { addr, label } => {
                    let target = self.resolve_label(label);
                    self.builder.insert_into_block(
                        fixup.block,
                        fir::StmtKind::Store {
                            addr,
                            value: fir::StoreValue::Block(target),
                        },
                    );
                }
            }
        }
        self.builder.clear_insertion_point();
    }

    /// Translates an I/O action statement into its runtime call; `None`
    /// for statements that are not I/O.
    pub(crate) fn lower_io_call(&mut self, stmt: &ast::ActionStmt) -> Option<StmtId> {
        let (call, args) = match stmt {
            ast::ActionStmt::Backspace(specs) => (IoCall::Backspace, self.io_spec_args(specs)),
            ast::ActionStmt::Close(specs) => (IoCall::Close, self.io_spec_args(specs)),
            ast::ActionStmt::Endfile(specs) => (IoCall::Endfile, self.io_spec_args(specs)),
            ast::ActionStmt::Flush(specs) => (IoCall::Flush, self.io_spec_args(specs)),
            ast::ActionStmt::Open(specs) => (IoCall::Open, self.io_spec_args(specs)),
            ast::ActionStmt::Rewind(specs) => (IoCall::Rewind, self.io_spec_args(specs)),
            ast::ActionStmt::Wait(specs) => (IoCall::Wait, self.io_spec_args(specs)),
            ast::ActionStmt::Inquire(inquire) => {
                let args = match inquire {
                    ast::InquireStmt::Specs(specs) => self.io_spec_args(specs),
                    ast::InquireStmt::Iolength { length, items } => {
                        let mut args = vec![self.analyze_variable(length)];
                        for item in items {
                            args.push(self.analyze_expr(item));
                        }
                        args
                    }
                };
                (IoCall::Inquire, args)
            }
            ast::ActionStmt::Print(print) => {
                let mut args = Vec::new();
                if let ast::Format::Expr(expr) = &print.format {
                    args.push(self.analyze_expr(expr));
                }
                for item in &print.items {
                    args.push(self.analyze_expr(item));
                }
                (IoCall::Print, args)
            }
            ast::ActionStmt::Read(read) => {
                let mut args = self.io_spec_args(&read.specs);
                for item in &read.items {
                    args.push(self.analyze_variable(item));
                }
                (IoCall::Read, args)
            }
            ast::ActionStmt::Write(write) => {
                let mut args = self.io_spec_args(&write.specs);
                for item in &write.items {
                    args.push(self.analyze_expr(item));
                }
                (IoCall::Write, args)
            }
            _ => return None,
        };
        Some(self.builder.create_io_call(call, args))
    }

    fn io_spec_args(&mut self, specs: &[ast::IoSpec]) -> Vec<Expression> {
        let mut args = Vec::new();
        for spec in specs {
            match spec {
                ast::IoSpec::Unit(expr)
                | ast::IoSpec::File(expr)
                | ast::IoSpec::Status(expr) => args.push(self.analyze_expr(expr)),
                ast::IoSpec::Fmt(ast::Format::Expr(expr)) => args.push(self.analyze_expr(expr)),
                ast::IoSpec::IoStat(variable) | ast::IoSpec::IoMsg(variable) => {
                    args.push(self.analyze_variable(variable));
                }
                _ => {}
            }
        }
        args
    }

    /// Emits the call statement for a CALL (alternate returns are the
    /// caller's concern).
    pub(crate) fn lower_call(&mut self, call: &ast::CallStmt) -> StmtId {
        let callee = self.analyze_name(&call.call.designator);
        let args = call
            .call
            .args
            .iter()
            .filter_map(|arg| match arg {
                ast::ActualArg::Expr(expr) => Some(self.analyze_expr(expr)),
                ast::ActualArg::AltReturn(_) => None,
            })
            .collect();
        self.builder.create_call(None, callee, args)
    }
}

#[cfg(test)]
#[path = "../tests/t_lower.rs"]
mod tests;
