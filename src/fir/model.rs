use crate::expr::Expression;
use crate::symtab::SymbolId;
use crate::types::DeclTypeSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(pub u32);

impl StmtId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub procedures: Vec<Procedure>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_procedure(&self, name: &str) -> bool {
        self.procedures.iter().any(|proc| proc.name == name)
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|proc| proc.name == name)
    }
}

/// Lexical nesting boundary grouping the blocks of one construct.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
    pub blocks: Vec<BlockId>,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub region: RegionId,
    pub stmts: Vec<StmtId>,
    /// Unique, order-insensitive predecessor set.
    pub preds: Vec<BlockId>,
}

impl BasicBlock {
    pub fn add_pred(&mut self, pred: BlockId) {
        if !self.preds.contains(&pred) {
            self.preds.push(pred);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub regions: Vec<Region>,
    pub blocks: Vec<BasicBlock>,
    pub stmts: Vec<Statement>,
}

impl Procedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: vec![Region {
                id: RegionId(0),
                parent: None,
                children: Vec::new(),
                blocks: Vec::new(),
            }],
            blocks: Vec::new(),
            stmts: Vec::new(),
        }
    }

    pub fn root_region(&self) -> RegionId {
        RegionId(0)
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.stmts[id.index()]
    }

    pub fn new_region(&mut self, parent: RegionId) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            parent: Some(parent),
            children: Vec::new(),
            blocks: Vec::new(),
        });
        self.regions[parent.index()].children.push(id);
        id
    }

    pub fn new_block(&mut self, region: RegionId) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            id,
            region,
            stmts: Vec::new(),
            preds: Vec::new(),
        });
        self.regions[region.index()].blocks.push(id);
        id
    }

    pub fn new_stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Statement { id, kind });
        id
    }

    /// The block's terminator, when its last statement is one.
    pub fn terminator(&self, block: BlockId) -> Option<StmtId> {
        let last = *self.block(block).stmts.last()?;
        self.stmt(last).kind.is_terminator().then_some(last)
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        match self.terminator(block) {
            Some(terminator) => self.stmt(terminator).kind.successors(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub id: StmtId,
    pub kind: StmtKind,
}

/// What a `Store` stores: an evaluated value, or a block reference for
/// `ASSIGN label TO v`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Stmt(StmtId),
    Block(BlockId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCall {
    Backspace,
    Close,
    Endfile,
    Flush,
    Inquire,
    Open,
    Print,
    Read,
    Rewind,
    Wait,
    Write,
}

impl IoCall {
    pub fn name(self) -> &'static str {
        match self {
            IoCall::Backspace => "backspace",
            IoCall::Close => "close",
            IoCall::Endfile => "endfile",
            IoCall::Flush => "flush",
            IoCall::Inquire => "inquire",
            IoCall::Open => "open",
            IoCall::Print => "print",
            IoCall::Read => "read",
            IoCall::Rewind => "rewind",
            IoCall::Wait => "wait",
            IoCall::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCall {
    EventPost,
    EventWait,
    FailImage,
    FormTeam,
    Lock,
    Pause,
    Stop,
    SyncAll,
    SyncImages,
    SyncMemory,
    SyncTeam,
    Unlock,
}

impl RuntimeCall {
    pub fn name(self) -> &'static str {
        match self {
            RuntimeCall::EventPost => "event-post",
            RuntimeCall::EventWait => "event-wait",
            RuntimeCall::FailImage => "fail-image",
            RuntimeCall::FormTeam => "form-team",
            RuntimeCall::Lock => "lock",
            RuntimeCall::Pause => "pause",
            RuntimeCall::Stop => "stop",
            RuntimeCall::SyncAll => "sync-all",
            RuntimeCall::SyncImages => "sync-images",
            RuntimeCall::SyncMemory => "sync-memory",
            RuntimeCall::SyncTeam => "sync-team",
            RuntimeCall::Unlock => "unlock",
        }
    }
}

/// Selector tag of one `Switch` edge.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchValue {
    /// Matches the evaluated selector exactly (computed GOTO index).
    Value(StmtId),
    /// The n-th alternate-return specifier of a CALL (1-based).
    AltReturn(u32),
    /// `ERR=` branch of an I/O statement.
    IoError,
    /// `EOR=` branch.
    IoEndOfRecord,
    /// `END=` branch.
    IoEndOfFile,
    /// Arithmetic IF partitions of the selector's sign.
    Negative,
    Zero,
}

/// One alternative of a CASE selector.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseRange {
    Exactly(StmtId),
    InclusiveRange { lower: StmtId, upper: StmtId },
    InclusiveAbove { lower: StmtId },
    InclusiveBelow { upper: StmtId },
}

/// The value list of one CASE (`case (1, 3:5)` has two ranges).
#[derive(Debug, Clone, PartialEq)]
pub struct CaseValue {
    pub ranges: Vec<CaseRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankValue {
    Exactly(StmtId),
    /// `rank(*)`
    AssumedSize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeGuardValue {
    TypeIs(DeclTypeSpec),
    ClassIs(DeclTypeSpec),
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Alloc {
        type_spec: Option<DeclTypeSpec>,
    },
    Dealloc {
        alloc: StmtId,
    },
    Load {
        addr: StmtId,
    },
    Store {
        addr: StmtId,
        value: StoreValue,
    },
    ApplyExpr {
        expr: Expression,
    },
    LocateExpr {
        expr: Expression,
    },
    Call {
        type_spec: Option<DeclTypeSpec>,
        callee: Expression,
        args: Vec<Expression>,
    },
    Increment {
        lhs: StmtId,
        step: StmtId,
    },
    /// `(step > 0 && var <= upper) || (step < 0 && var >= upper)`
    DoCondition {
        step: StmtId,
        var: StmtId,
        upper: StmtId,
    },
    IoRuntime {
        call: IoCall,
        args: Vec<Expression>,
    },
    Runtime {
        call: RuntimeCall,
        args: Vec<Expression>,
    },
    Nullify {
        addr: StmtId,
    },
    Branch {
        target: BlockId,
    },
    CondBranch {
        cond: StmtId,
        true_block: BlockId,
        false_block: BlockId,
    },
    IndirectBranch {
        variable: SymbolId,
        targets: Vec<BlockId>,
    },
    Switch {
        cond: StmtId,
        default: BlockId,
        cases: Vec<(SwitchValue, BlockId)>,
    },
    SwitchCase {
        cond: StmtId,
        default: BlockId,
        cases: Vec<(CaseValue, BlockId)>,
    },
    SwitchRank {
        cond: StmtId,
        default: BlockId,
        cases: Vec<(RankValue, BlockId)>,
    },
    SwitchType {
        cond: StmtId,
        default: BlockId,
        cases: Vec<(TypeGuardValue, BlockId)>,
    },
    Return {
        value: Option<StmtId>,
    },
    Unreachable,
}

impl StmtKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            StmtKind::Branch { .. }
                | StmtKind::CondBranch { .. }
                | StmtKind::IndirectBranch { .. }
                | StmtKind::Switch { .. }
                | StmtKind::SwitchCase { .. }
                | StmtKind::SwitchRank { .. }
                | StmtKind::SwitchType { .. }
                | StmtKind::Return { .. }
                | StmtKind::Unreachable
        )
    }

    /// Successor blocks of a terminator, in edge order.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            StmtKind::Branch { target } => vec![*target],
            StmtKind::CondBranch {
                true_block,
                false_block,
                ..
            } => vec![*true_block, *false_block],
            StmtKind::IndirectBranch { targets, .. } => targets.clone(),
            StmtKind::Switch { default, cases, .. } => {
                let mut successors: Vec<BlockId> =
                    cases.iter().map(|(_, block)| *block).collect();
                successors.push(*default);
                successors
            }
            StmtKind::SwitchCase { default, cases, .. } => {
                let mut successors: Vec<BlockId> =
                    cases.iter().map(|(_, block)| *block).collect();
                successors.push(*default);
                successors
            }
            StmtKind::SwitchRank { default, cases, .. } => {
                let mut successors: Vec<BlockId> =
                    cases.iter().map(|(_, block)| *block).collect();
                successors.push(*default);
                successors
            }
            StmtKind::SwitchType { default, cases, .. } => {
                let mut successors: Vec<BlockId> =
                    cases.iter().map(|(_, block)| *block).collect();
                successors.push(*default);
                successors
            }
            _ => Vec::new(),
        }
    }
}
