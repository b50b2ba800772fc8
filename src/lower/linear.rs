//! Linearizer: flattens the tree of one subprogram body into a stream of
//! linear ops, replacing structured nesting with explicit labels and
//! branches. Source labels are interned through a map so the same label
//! always yields the same linear id; fresh internal labels come from a
//! monotonic counter and carry a referenced bit so the CFG constructor
//! can prune fall-through labels nothing branches to.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::ast;
use crate::symtab::SymbolId;

pub type LabelRef = u32;

#[derive(Debug, Default)]
pub struct LabelBuilder {
    referenced: Vec<bool>,
    counter: u32,
}

impl LabelBuilder {
    pub fn next(&mut self) -> LabelRef {
        let label = self.counter;
        self.counter += 1;
        self.referenced.push(false);
        label
    }

    pub fn set_referenced(&mut self, label: LabelRef) {
        self.referenced[label as usize] = true;
    }

    pub fn is_referenced(&self, label: LabelRef) -> bool {
        self.referenced[label as usize]
    }
}

/// Per-procedure analysis state shared between the linearizer and the
/// CFG constructor.
#[derive(Debug, Default)]
pub struct AnalysisData<'a> {
    pub label_builder: LabelBuilder,
    label_map: HashMap<ast::Label, LabelRef>,
    /// `(construct name, exit label, cycle label)`; the cycle label is
    /// present only for loops.
    name_stack: Vec<(Option<&'a ast::Name>, LabelRef, Option<LabelRef>)>,
    /// `ASSIGN label TO v` accumulation, per variable.
    assign_map: HashMap<SymbolId, BTreeSet<ast::Label>>,
}

impl<'a> AnalysisData<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self) -> LabelRef {
        self.label_builder.next()
    }

    /// Interns a source label as a referenced linear label.
    pub fn fetch_label(&mut self, label: ast::Label) -> LabelRef {
        match self.label_map.get(&label) {
            Some(&linear) => {
                self.label_builder.set_referenced(linear);
                linear
            }
            None => {
                let linear = self.label_builder.next();
                self.label_builder.set_referenced(linear);
                self.label_map.insert(label, linear);
                linear
            }
        }
    }

    /// Interns a source label without marking it referenced (statement
    /// labels nothing may ever branch to).
    pub fn find_label(&mut self, label: ast::Label) -> LabelRef {
        match self.label_map.get(&label) {
            Some(&linear) => linear,
            None => {
                let linear = self.label_builder.next();
                self.label_map.insert(label, linear);
                linear
            }
        }
    }

    fn reference(&mut self, label: LabelRef) -> LabelRef {
        self.label_builder.set_referenced(label);
        label
    }

    pub fn add_assign(&mut self, symbol: SymbolId, label: ast::Label) {
        self.assign_map.entry(symbol).or_default().insert(label);
    }

    /// The accumulated `ASSIGN` targets of a variable, in label order.
    pub fn assigned_labels(&mut self, symbol: SymbolId) -> Vec<LabelRef> {
        let labels: Vec<ast::Label> = self
            .assign_map
            .get(&symbol)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        labels.into_iter().map(|label| self.fetch_label(label)).collect()
    }

    fn push_name(&mut self, name: Option<&'a ast::Name>, exit: LabelRef, cycle: Option<LabelRef>) {
        self.name_stack.push((name, exit, cycle));
    }

    fn pop_name(&mut self) {
        self.name_stack.pop();
    }

    fn find_stack(&self, name: &str) -> (LabelRef, Option<LabelRef>) {
        for (entry_name, exit, cycle) in self.name_stack.iter().rev() {
            if entry_name.is_some_and(|entry| entry.text == name) {
                return (*exit, *cycle);
            }
        }
        panic!("semantics bug: construct name '{}' not on stack", name);
    }

    fn nearest_enclosing_loop(&self) -> (LabelRef, LabelRef) {
        for (_, exit, cycle) in self.name_stack.iter().rev() {
            if let Some(cycle) = cycle {
                return (*exit, *cycle);
            }
        }
        panic!("semantics bug: CYCLE|EXIT not in loop");
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ReturnOp<'a> {
    FailImage,
    Return(&'a ast::ReturnStmt),
    Stop(&'a ast::StopStmt),
}

#[derive(Debug, Clone, Copy)]
pub enum CondGotoOp<'a> {
    IfThen(&'a ast::Statement<ast::IfThenStmt>),
    ElseIf(&'a ast::Statement<ast::ElseIfStmt>),
    IfStmt(&'a ast::IfStmt),
    Do(&'a ast::DoConstruct),
}

#[derive(Debug, Clone, Copy)]
pub struct SwitchIoOp<'a> {
    pub stmt: &'a ast::Statement<ast::ActionStmt>,
    pub next: LabelRef,
    pub err: Option<LabelRef>,
    pub eor: Option<LabelRef>,
    pub end: Option<LabelRef>,
}

#[derive(Debug, Clone, Copy)]
pub enum SwitchKind<'a> {
    Call(&'a ast::CallStmt),
    ComputedGoto(&'a ast::ComputedGotoStmt),
    ArithmeticIf(&'a ast::ArithmeticIfStmt),
    Case(&'a ast::CaseConstruct),
    Rank(&'a ast::SelectRankConstruct),
    Type(&'a ast::SelectTypeConstruct),
}

#[derive(Debug, Clone)]
pub struct SwitchOp<'a> {
    pub kind: SwitchKind<'a>,
    /// Branch targets; for multiway constructs and computed GOTO the
    /// fall-through/exit label is appended last.
    pub refs: Vec<LabelRef>,
}

#[derive(Debug, Clone, Copy)]
pub enum ConstructOp<'a> {
    Associate(&'a ast::AssociateConstruct),
    Block(&'a ast::BlockConstruct),
    Case(&'a ast::CaseConstruct),
    ChangeTeam(&'a ast::ChangeTeamConstruct),
    Critical(&'a ast::CriticalConstruct),
    Do(&'a ast::DoConstruct),
    If(&'a ast::IfConstruct),
    SelectRank(&'a ast::SelectRankConstruct),
    SelectType(&'a ast::SelectTypeConstruct),
    Where(&'a ast::WhereConstruct),
    Forall(&'a ast::ForallConstruct),
}

impl ConstructOp<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ConstructOp::Associate(_) => "ASSOCIATE",
            ConstructOp::Block(_) => "BLOCK",
            ConstructOp::Case(_) => "SELECT CASE",
            ConstructOp::ChangeTeam(_) => "CHANGE TEAM",
            ConstructOp::Critical(_) => "CRITICAL",
            ConstructOp::Do(_) => "DO",
            ConstructOp::If(_) => "IF",
            ConstructOp::SelectRank(_) => "SELECT RANK",
            ConstructOp::SelectType(_) => "SELECT TYPE",
            ConstructOp::Where(_) => "WHERE",
            ConstructOp::Forall(_) => "FORALL",
        }
    }
}

#[derive(Debug, Clone)]
pub enum LinearOp<'a> {
    Label(LabelRef),
    Goto(LabelRef),
    Return(ReturnOp<'a>),
    CondGoto(CondGotoOp<'a>, LabelRef, LabelRef),
    SwitchingIo(SwitchIoOp<'a>),
    Switch(SwitchOp<'a>),
    Action(&'a ast::Statement<ast::ActionStmt>),
    BeginConstruct(ConstructOp<'a>),
    EndConstruct(ConstructOp<'a>),
    IndirectGoto(SymbolId, Vec<LabelRef>),
    DoIncrement(&'a ast::DoConstruct),
    DoCompare(&'a ast::DoConstruct),
}

impl Display for LinearOp<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LinearOp::Label(label) => write!(f, "label: {}", label),
            LinearOp::Goto(target) => write!(f, "goto {}", target),
            LinearOp::Return(_) => write!(f, "return"),
            LinearOp::CondGoto(_, true_label, false_label) => {
                write!(f, "cbranch (?) {} {}", true_label, false_label)
            }
            LinearOp::SwitchingIo(io) => {
                write!(f, "io-op")?;
                if let Some(err) = io.err {
                    write!(f, " ERR={}", err)?;
                }
                if let Some(eor) = io.eor {
                    write!(f, " EOR={}", eor)?;
                }
                if let Some(end) = io.end {
                    write!(f, " END={}", end)?;
                }
                Ok(())
            }
            LinearOp::Switch(switch) => {
                let kind = match switch.kind {
                    SwitchKind::Call(_) => "alt-return",
                    SwitchKind::ComputedGoto(_) => "igoto",
                    SwitchKind::ArithmeticIf(_) => "<=>",
                    SwitchKind::Case(_) => "case",
                    SwitchKind::Rank(_) => "rank",
                    SwitchKind::Type(_) => "type",
                };
                write!(f, "switch-{}(?) {:?}", kind, switch.refs)
            }
            LinearOp::Action(stmt) => write!(f, "action: {}", stmt.stmt.tag()),
            LinearOp::BeginConstruct(construct) => {
                write!(f, "construct-{} {{", construct.name())
            }
            LinearOp::EndConstruct(construct) => {
                write!(f, "}} construct-{}", construct.name())
            }
            LinearOp::IndirectGoto(_, labels) => write!(f, "igoto {:?}", labels),
            LinearOp::DoIncrement(_) => write!(f, "do increment"),
            LinearOp::DoCompare(_) => write!(f, "do compare"),
        }
    }
}

// --- I/O branch specifier extraction ---

fn spec_err(specs: &[ast::IoSpec]) -> Option<ast::Label> {
    specs.iter().find_map(|spec| match spec {
        ast::IoSpec::ErrLabel(label) => Some(*label),
        _ => None,
    })
}

fn spec_eor(specs: &[ast::IoSpec]) -> Option<ast::Label> {
    specs.iter().find_map(|spec| match spec {
        ast::IoSpec::EorLabel(label) => Some(*label),
        _ => None,
    })
}

fn spec_end(specs: &[ast::IoSpec]) -> Option<ast::Label> {
    specs.iter().find_map(|spec| match spec {
        ast::IoSpec::EndLabel(label) => Some(*label),
        _ => None,
    })
}

/// Linearizes one subprogram body.
pub fn linearize<'a>(body: &'a ast::Block, ad: &mut AnalysisData<'a>) -> Vec<LinearOp<'a>> {
    let mut ops = Vec::new();
    walk_block(body, &mut ops, ad);
    ops
}

fn walk_block<'a>(block: &'a ast::Block, ops: &mut Vec<LinearOp<'a>>, ad: &mut AnalysisData<'a>) {
    for construct in block {
        walk_construct(construct, ops, ad);
    }
}

fn construct_name<'a>(name: &'a Option<ast::Name>) -> Option<&'a ast::Name> {
    name.as_ref()
}

fn walk_construct<'a>(
    construct: &'a ast::ExecutableConstruct,
    ops: &mut Vec<LinearOp<'a>>,
    ad: &mut AnalysisData<'a>,
) {
    match construct {
        ast::ExecutableConstruct::Action(stmt) => {
            if let Some(label) = stmt.label {
                let linear = ad.find_label(label);
                ops.push(LinearOp::Label(linear));
            }
            build_action(stmt, ops, ad);
        }
        ast::ExecutableConstruct::Associate(construct) => {
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::Associate(construct)));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::Associate(construct)));
            ad.pop_name();
        }
        ast::ExecutableConstruct::ChangeTeam(construct) => {
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::ChangeTeam(construct)));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::ChangeTeam(construct)));
            ad.pop_name();
        }
        ast::ExecutableConstruct::Critical(construct) => {
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::Critical(construct)));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::Critical(construct)));
            ad.pop_name();
        }
        ast::ExecutableConstruct::Block(construct) => {
            // the exit label lands after the construct end
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::Block(construct)));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::EndConstruct(ConstructOp::Block(construct)));
            ops.push(LinearOp::Label(exit));
            ad.pop_name();
        }
        ast::ExecutableConstruct::Do(construct) => {
            let backedge = ad.new_label();
            let increment = ad.new_label();
            let entry = ad.new_label();
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            let increment_ref = ad_reference(ad, increment);
            ad.push_name(
                construct_name(&construct.stmt.stmt.name),
                exit_ref,
                Some(increment_ref),
            );
            ops.push(LinearOp::BeginConstruct(ConstructOp::Do(construct)));
            ops.push(LinearOp::Goto(ad_reference(ad, backedge)));
            ops.push(LinearOp::Label(increment));
            ops.push(LinearOp::DoIncrement(construct));
            ops.push(LinearOp::Label(backedge));
            ops.push(LinearOp::DoCompare(construct));
            ops.push(LinearOp::CondGoto(
                CondGotoOp::Do(construct),
                ad_reference(ad, entry),
                exit_ref,
            ));
            ops.push(LinearOp::Label(entry));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::Goto(increment_ref));
            ops.push(LinearOp::EndConstruct(ConstructOp::Do(construct)));
            ops.push(LinearOp::Label(exit));
            ad.pop_name();
        }
        ast::ExecutableConstruct::If(construct) => {
            let mut then_label = ad.new_label();
            let mut else_label = ad.new_label();
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::If(construct)));
            ops.push(LinearOp::CondGoto(
                CondGotoOp::IfThen(&construct.stmt),
                ad_reference(ad, then_label),
                ad_reference(ad, else_label),
            ));
            ops.push(LinearOp::Label(then_label));
            walk_block(&construct.block, ops, ad);
            ops.push(LinearOp::Goto(exit_ref));
            for else_if in &construct.else_ifs {
                ops.push(LinearOp::Label(else_label));
                then_label = ad.new_label();
                let next_else = ad.new_label();
                ops.push(LinearOp::CondGoto(
                    CondGotoOp::ElseIf(&else_if.stmt),
                    ad_reference(ad, then_label),
                    ad_reference(ad, next_else),
                ));
                ops.push(LinearOp::Label(then_label));
                walk_block(&else_if.block, ops, ad);
                ops.push(LinearOp::Goto(exit_ref));
                else_label = next_else;
            }
            ops.push(LinearOp::Label(else_label));
            if let Some(else_block) = &construct.else_block {
                walk_block(else_block, ops, ad);
            }
            ops.push(LinearOp::Goto(exit_ref));
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::If(construct)));
            ad.pop_name();
        }
        ast::ExecutableConstruct::Case(construct) => {
            let blocks: Vec<&'a ast::Block> =
                construct.cases.iter().map(|case| &case.block).collect();
            multiway(
                ConstructOp::Case(construct),
                SwitchKind::Case(construct),
                construct_name(&construct.stmt.stmt.name),
                &blocks,
                ops,
                ad,
            );
        }
        ast::ExecutableConstruct::SelectRank(construct) => {
            let blocks: Vec<&'a ast::Block> =
                construct.cases.iter().map(|case| &case.block).collect();
            multiway(
                ConstructOp::SelectRank(construct),
                SwitchKind::Rank(construct),
                construct_name(&construct.stmt.stmt.name),
                &blocks,
                ops,
                ad,
            );
        }
        ast::ExecutableConstruct::SelectType(construct) => {
            let blocks: Vec<&'a ast::Block> =
                construct.cases.iter().map(|case| &case.block).collect();
            multiway(
                ConstructOp::SelectType(construct),
                SwitchKind::Type(construct),
                construct_name(&construct.stmt.stmt.name),
                &blocks,
                ops,
                ad,
            );
        }
        ast::ExecutableConstruct::Where(construct) => {
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::Where(construct)));
            walk_block(&construct.body, ops, ad);
            for masked in &construct.masked_elsewheres {
                walk_block(&masked.block, ops, ad);
            }
            if let Some(elsewhere) = &construct.elsewhere {
                walk_block(elsewhere, ops, ad);
            }
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::Where(construct)));
            ad.pop_name();
        }
        ast::ExecutableConstruct::Forall(construct) => {
            let exit = ad.new_label();
            let exit_ref = ad_reference(ad, exit);
            ad.push_name(construct_name(&construct.stmt.stmt.name), exit_ref, None);
            ops.push(LinearOp::BeginConstruct(ConstructOp::Forall(construct)));
            walk_block(&construct.body, ops, ad);
            ops.push(LinearOp::Label(exit));
            ops.push(LinearOp::EndConstruct(ConstructOp::Forall(construct)));
            ad.pop_name();
        }
    }
}

fn ad_reference(ad: &mut AnalysisData<'_>, label: LabelRef) -> LabelRef {
    ad.reference(label)
}

/// SELECT CASE / SELECT RANK / SELECT TYPE share one schema: a switch
/// over per-case labels, each case branching to the exit. The exit label
/// is appended to the switch targets as the no-default fall-through.
fn multiway<'a>(
    construct: ConstructOp<'a>,
    switch: SwitchKind<'a>,
    name: Option<&'a ast::Name>,
    blocks: &[&'a ast::Block],
    ops: &mut Vec<LinearOp<'a>>,
    ad: &mut AnalysisData<'a>,
) {
    let exit = ad.new_label();
    let exit_ref = ad_reference(ad, exit);
    ad.push_name(name, exit_ref, None);
    ops.push(LinearOp::BeginConstruct(construct));
    if !blocks.is_empty() {
        let case_labels: Vec<LabelRef> = blocks.iter().map(|_| ad.new_label()).collect();
        let mut targets: Vec<LabelRef> = case_labels
            .iter()
            .map(|&label| ad_reference(ad, label))
            .collect();
        targets.push(exit_ref);
        ops.push(LinearOp::Switch(SwitchOp {
            kind: switch,
            refs: targets,
        }));
        for (label, block) in case_labels.iter().zip(blocks) {
            ops.push(LinearOp::Label(*label));
            walk_block(block, ops, ad);
            ops.push(LinearOp::Goto(exit_ref));
        }
    }
    ops.push(LinearOp::Label(exit));
    ops.push(LinearOp::EndConstruct(construct));
    ad.pop_name();
}

fn has_alt_returns(call: &ast::CallStmt) -> bool {
    call.call
        .args
        .iter()
        .any(|arg| matches!(arg, ast::ActualArg::AltReturn(_)))
}

fn alt_return_labels(call: &ast::Call) -> Vec<ast::Label> {
    call.args
        .iter()
        .filter_map(|arg| match arg {
            ast::ActualArg::AltReturn(label) => Some(*label),
            _ => None,
        })
        .collect()
}

fn build_action<'a>(
    stmt: &'a ast::Statement<ast::ActionStmt>,
    ops: &mut Vec<LinearOp<'a>>,
    ad: &mut AnalysisData<'a>,
) {
    match &stmt.stmt {
        ast::ActionStmt::Call(call) if has_alt_returns(call) => {
            let next = ad.new_label();
            let mut labels: Vec<LabelRef> = alt_return_labels(&call.call)
                .into_iter()
                .map(|label| ad.fetch_label(label))
                .collect();
            labels.push(next);
            ops.push(LinearOp::Switch(SwitchOp {
                kind: SwitchKind::Call(call),
                refs: labels,
            }));
            ops.push(LinearOp::Label(next));
        }
        ast::ActionStmt::Assign(assign) => {
            let symbol = assign
                .name
                .symbol
                .expect("semantics bug: unresolved name in ASSIGN");
            ad.add_assign(symbol, assign.label);
            ops.push(LinearOp::Action(stmt));
        }
        ast::ActionStmt::Cycle(cycle) => {
            let target = match &cycle.name {
                Some(name) => match ad.find_stack(&name.text) {
                    (_, Some(cycle_label)) => cycle_label,
                    (_, None) => panic!(
                        "semantics bug: CYCLE names non-loop construct '{}'",
                        name.text
                    ),
                },
                None => ad.nearest_enclosing_loop().1,
            };
            ops.push(LinearOp::Goto(target));
        }
        ast::ActionStmt::Exit(exit) => {
            let target = match &exit.name {
                Some(name) => ad.find_stack(&name.text).0,
                None => ad.nearest_enclosing_loop().0,
            };
            ops.push(LinearOp::Goto(target));
        }
        ast::ActionStmt::Goto(goto) => {
            let target = ad.fetch_label(goto.label);
            ops.push(LinearOp::Goto(target));
        }
        ast::ActionStmt::Continue => {
            // label already emitted; nothing to execute
        }
        ast::ActionStmt::FailImage => {
            ops.push(LinearOp::Return(ReturnOp::FailImage));
        }
        ast::ActionStmt::Return(return_stmt) => {
            ops.push(LinearOp::Return(ReturnOp::Return(return_stmt)));
        }
        ast::ActionStmt::Stop(stop) => {
            ops.push(LinearOp::Return(ReturnOp::Stop(stop)));
        }
        ast::ActionStmt::Read(read) => {
            three_label_spec(stmt, &read.specs, ops, ad);
        }
        ast::ActionStmt::Write(write) => {
            three_label_spec(stmt, &write.specs, ops, ad);
        }
        ast::ActionStmt::Wait(specs) => {
            three_label_spec(stmt, specs, ops, ad);
        }
        ast::ActionStmt::Open(specs)
        | ast::ActionStmt::Close(specs)
        | ast::ActionStmt::Backspace(specs)
        | ast::ActionStmt::Endfile(specs)
        | ast::ActionStmt::Rewind(specs)
        | ast::ActionStmt::Flush(specs) => {
            err_label_spec(stmt, specs, ops, ad);
        }
        ast::ActionStmt::Inquire(inquire) => match inquire {
            ast::InquireStmt::Specs(specs) => err_label_spec(stmt, specs, ops, ad),
            ast::InquireStmt::Iolength { .. } => ops.push(LinearOp::Action(stmt)),
        },
        ast::ActionStmt::ComputedGoto(computed) => {
            let next = ad.new_label();
            let mut labels: Vec<LabelRef> = computed
                .labels
                .iter()
                .map(|label| ad.fetch_label(*label))
                .collect();
            labels.push(next);
            ops.push(LinearOp::Switch(SwitchOp {
                kind: SwitchKind::ComputedGoto(computed),
                refs: labels,
            }));
            ops.push(LinearOp::Label(next));
        }
        ast::ActionStmt::ArithmeticIf(arithmetic) => {
            let refs = vec![
                ad.fetch_label(arithmetic.less),
                ad.fetch_label(arithmetic.equal),
                ad.fetch_label(arithmetic.greater),
            ];
            ops.push(LinearOp::Switch(SwitchOp {
                kind: SwitchKind::ArithmeticIf(arithmetic),
                refs,
            }));
        }
        ast::ActionStmt::AssignedGoto(assigned) => {
            let symbol = assigned
                .name
                .symbol
                .expect("semantics bug: unresolved name in assigned GOTO");
            let labels: Vec<LabelRef> = assigned
                .labels
                .iter()
                .map(|label| ad.fetch_label(*label))
                .collect();
            ops.push(LinearOp::IndirectGoto(symbol, labels));
        }
        ast::ActionStmt::If(if_stmt) => {
            let then_label = ad.new_label();
            let endif_label = ad.new_label();
            ops.push(LinearOp::CondGoto(
                CondGotoOp::IfStmt(if_stmt),
                ad_reference(ad, then_label),
                ad_reference(ad, endif_label),
            ));
            ops.push(LinearOp::Label(then_label));
            build_action(&if_stmt.action, ops, ad);
            ops.push(LinearOp::Label(endif_label));
        }
        _ => {
            ops.push(LinearOp::Action(stmt));
        }
    }
}

/// `ERR=`/`EOR=`/`END=` capable statements (READ, WRITE, WAIT).
fn three_label_spec<'a>(
    stmt: &'a ast::Statement<ast::ActionStmt>,
    specs: &[ast::IoSpec],
    ops: &mut Vec<LinearOp<'a>>,
    ad: &mut AnalysisData<'a>,
) {
    let err = spec_err(specs);
    let eor = spec_eor(specs);
    let end = spec_end(specs);
    if err.is_some() || eor.is_some() || end.is_some() {
        let err = err.map(|label| ad.fetch_label(label));
        let eor = eor.map(|label| ad.fetch_label(label));
        let end = end.map(|label| ad.fetch_label(label));
        let next = ad.new_label();
        ops.push(LinearOp::SwitchingIo(SwitchIoOp {
            stmt,
            next,
            err,
            eor,
            end,
        }));
        ops.push(LinearOp::Label(next));
    } else {
        ops.push(LinearOp::Action(stmt));
    }
}

/// Statements with at most an `ERR=` specifier.
fn err_label_spec<'a>(
    stmt: &'a ast::Statement<ast::ActionStmt>,
    specs: &[ast::IoSpec],
    ops: &mut Vec<LinearOp<'a>>,
    ad: &mut AnalysisData<'a>,
) {
    if let Some(err) = spec_err(specs) {
        let err = ad.fetch_label(err);
        let next = ad.new_label();
        ops.push(LinearOp::SwitchingIo(SwitchIoOp {
            stmt,
            next,
            err: Some(err),
            eor: None,
            end: None,
        }));
        ops.push(LinearOp::Label(next));
    } else {
        ops.push(LinearOp::Action(stmt));
    }
}

#[cfg(test)]
#[path = "../tests/t_linear.rs"]
mod tests;
