//! Parse-tree model consumed by the middle end.
//!
//! This is the fully parsed, name-resolved tree handed over by the front
//! end: program units with specification parts and executable bodies. The
//! mod-file subset parser produces the declaration half of this model; the
//! lowering engine walks the executable half. Names carry the resolved
//! symbol handle when name resolution has run.

use crate::symtab::SymbolId;
use crate::types::DeclTypeSpec;

/// A statement label as written in the source (`goto 100`).
pub type Label = u64;

/// An identifier occurrence, with its resolved symbol when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub text: String,
    pub symbol: Option<SymbolId>,
    pub offset: usize,
}

impl Name {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            symbol: None,
            offset: 0,
        }
    }

    pub fn at(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            symbol: None,
            offset,
        }
    }

    pub fn resolved(text: impl Into<String>, symbol: SymbolId) -> Self {
        Self {
            text: text.into(),
            symbol: Some(symbol),
            offset: 0,
        }
    }
}

/// A statement with its optional source label.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<T> {
    pub label: Option<Label>,
    pub stmt: T,
}

impl<T> Statement<T> {
    pub fn new(stmt: T) -> Self {
        Self { label: None, stmt }
    }

    pub fn labeled(label: Label, stmt: T) -> Self {
        Self {
            label: Some(label),
            stmt,
        }
    }
}

// --- Expressions and designators ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
    And,
    Or,
    Eqv,
    Neqv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral {
        value: i64,
        kind: Option<i64>,
    },
    RealLiteral {
        value: f64,
        kind: Option<i64>,
    },
    LogicalLiteral {
        value: bool,
        kind: Option<i64>,
    },
    CharLiteral {
        value: String,
    },
    Designator(DataRef),
    Parentheses(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    FunctionRef {
        name: Name,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::IntLiteral { value, kind: None }
    }

    pub fn logical(value: bool) -> Self {
        Expr::LogicalLiteral { value, kind: None }
    }

    pub fn name(name: Name) -> Self {
        Expr::Designator(DataRef::from_name(name))
    }
}

/// One part of a data reference: a name with optional subscripts.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRef {
    pub name: Name,
    pub subscripts: Vec<Expr>,
}

/// A (possibly component-qualified) reference to a datum.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRef {
    pub parts: Vec<PartRef>,
}

impl DataRef {
    pub fn from_name(name: Name) -> Self {
        Self {
            parts: vec![PartRef {
                name,
                subscripts: Vec::new(),
            }],
        }
    }

    pub fn base(&self) -> &Name {
        &self.parts[0].name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub data_ref: DataRef,
}

impl Variable {
    pub fn from_name(name: Name) -> Self {
        Self {
            data_ref: DataRef::from_name(name),
        }
    }
}

// --- Program structure ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub units: Vec<ProgramUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgramUnit {
    Main(MainProgram),
    Function(FunctionSubprogram),
    Subroutine(SubroutineSubprogram),
    Module(ModuleUnit),
    Submodule(SubmoduleUnit),
}

pub type Block = Vec<ExecutableConstruct>;

#[derive(Debug, Clone, PartialEq)]
pub struct MainProgram {
    pub name: Option<Name>,
    pub spec: SpecificationPart,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub attrs: Vec<crate::symbols::Attr>,
    pub name: Name,
    pub dummy_args: Vec<Name>,
    pub result: Option<Name>,
    pub bind_name: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSubprogram {
    pub stmt: Statement<FunctionStmt>,
    pub spec: SpecificationPart,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineStmt {
    pub attrs: Vec<crate::symbols::Attr>,
    pub name: Name,
    pub dummy_args: Vec<Name>,
    pub bind_name: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineSubprogram {
    pub stmt: Statement<SubroutineStmt>,
    pub spec: SpecificationPart,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStmt {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleUnit {
    pub stmt: Statement<ModuleStmt>,
    pub spec: SpecificationPart,
    pub contains: Vec<ModuleSubprogram>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmoduleStmt {
    /// The root module of the parent chain.
    pub ancestor: Name,
    /// The parent submodule, when the parent is not the ancestor itself.
    pub parent: Option<Name>,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmoduleUnit {
    pub stmt: Statement<SubmoduleStmt>,
    pub spec: SpecificationPart,
    pub contains: Vec<ModuleSubprogram>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSubprogram {
    Function(FunctionSubprogram),
    Subroutine(SubroutineSubprogram),
}

// --- Specification part (the subset the mod-file writer emits) ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecificationPart {
    pub decls: Vec<DeclarationConstruct>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationConstruct {
    Use(UseStmt),
    Entity(EntityDecl),
    Procedure(ProcDecl),
    Attr(AttrStmt),
    DerivedType(DerivedTypeDef),
    Interface(InterfaceBlock),
    Namelist(NamelistStmt),
    Common(CommonStmt),
    CommonBind(CommonBindStmt),
    Generic(GenericStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    pub local: Name,
    /// Present for `local => original`.
    pub original: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseStmt {
    pub module: Name,
    pub only: Vec<Rename>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundDecl {
    Expr(Expr),
    /// `*`
    Assumed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSpecDecl {
    /// `..`
    AssumedRank,
    /// `lower:upper` with either side optionally deferred (absent).
    Bounds {
        lower: Option<BoundDecl>,
        upper: Option<BoundDecl>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    pub type_spec: DeclTypeSpec,
    pub attrs: Vec<crate::symbols::Attr>,
    pub bind_name: Option<Expr>,
    pub name: Name,
    pub shape: Vec<ShapeSpecDecl>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcInterfaceDecl {
    Name(Name),
    Type(DeclTypeSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl {
    pub interface: Option<ProcInterfaceDecl>,
    pub pass_name: Option<Name>,
    pub attrs: Vec<crate::symbols::Attr>,
    pub bind_name: Option<Expr>,
    pub name: Name,
}

/// A standalone attribute declaration, e.g. `volatile::x`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrStmt {
    pub attr: crate::symbols::Attr,
    pub names: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTypeStmt {
    pub attrs: Vec<crate::symbols::Attr>,
    pub extends: Option<Name>,
    pub name: Name,
    pub param_names: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDecl {
    pub type_spec: DeclTypeSpec,
    pub attr: crate::symbols::TypeParamAttr,
    pub name: Name,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentDecl {
    Entity(EntityDecl),
    TypeParam(TypeParamDecl),
    Procedure(ProcDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcBindingDecl {
    /// `procedure(iface), deferred, ... :: name`
    pub deferred_interface: Option<Name>,
    pub pass_name: Option<Name>,
    pub attrs: Vec<crate::symbols::Attr>,
    pub name: Name,
    /// `name => implementation` when the binding renames.
    pub bound_to: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericBindingDecl {
    pub name: Name,
    pub specific: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalDecl {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBoundDecl {
    Procedure(ProcBindingDecl),
    Generic(GenericBindingDecl),
    Final(FinalDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTypeDef {
    pub stmt: DerivedTypeStmt,
    pub sequence: bool,
    pub components: Vec<ComponentDecl>,
    pub bindings: Vec<TypeBoundDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceBlock {
    pub subprograms: Vec<ModuleSubprogram>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamelistStmt {
    pub name: Name,
    pub objects: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonStmt {
    pub name: Name,
    pub objects: Vec<Name>,
}

/// The `bind(c, name=...)::/blk/` line following a `common` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonBindStmt {
    pub name: Name,
    pub bind_name: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericSpec {
    Name(Name),
    DefinedOp(String),
    Assignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericStmt {
    pub spec: GenericSpec,
    pub attrs: Vec<crate::symbols::Attr>,
    pub specifics: Vec<Name>,
}

// --- Executable constructs ---

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableConstruct {
    Action(Statement<ActionStmt>),
    Associate(AssociateConstruct),
    Block(BlockConstruct),
    Case(CaseConstruct),
    ChangeTeam(ChangeTeamConstruct),
    Critical(CriticalConstruct),
    Do(DoConstruct),
    If(IfConstruct),
    SelectRank(SelectRankConstruct),
    SelectType(SelectTypeConstruct),
    Where(WhereConstruct),
    Forall(ForallConstruct),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Expr(Expr),
    Variable(Variable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcurrentControl {
    pub name: Name,
    pub lower: Expr,
    pub upper: Expr,
    pub step: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcurrentHeader {
    pub controls: Vec<ConcurrentControl>,
    pub mask: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopBounds {
    pub name: Name,
    pub lower: Expr,
    pub upper: Expr,
    pub step: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopControl {
    Bounds(LoopBounds),
    While(Expr),
    Concurrent(ConcurrentHeader),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonLabelDoStmt {
    pub name: Option<Name>,
    pub control: Option<LoopControl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoConstruct {
    pub stmt: Statement<NonLabelDoStmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfThenStmt {
    pub name: Option<Name>,
    pub cond: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfStmt {
    pub cond: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfBlock {
    pub stmt: Statement<ElseIfStmt>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfConstruct {
    pub stmt: Statement<IfThenStmt>,
    pub block: Block,
    pub else_ifs: Vec<ElseIfBlock>,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseValueRange {
    Exact(Expr),
    Range {
        lower: Option<Expr>,
        upper: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseSelector {
    Default,
    Ranges(Vec<CaseValueRange>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseStmt {
    pub selector: CaseSelector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub stmt: Statement<CaseStmt>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCaseStmt {
    pub name: Option<Name>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseConstruct {
    pub stmt: Statement<SelectCaseStmt>,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankSelector {
    Value(Expr),
    /// `rank(*)`
    Star,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectRankCaseStmt {
    pub rank: RankSelector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankCase {
    pub stmt: Statement<SelectRankCaseStmt>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectRankStmt {
    pub name: Option<Name>,
    pub assoc: Option<Name>,
    pub selector: Selector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectRankConstruct {
    pub stmt: Statement<SelectRankStmt>,
    pub cases: Vec<RankCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeGuard {
    TypeIs(DeclTypeSpec),
    ClassIs(DeclTypeSpec),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeGuardStmt {
    pub guard: TypeGuard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCase {
    pub stmt: Statement<TypeGuardStmt>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectTypeStmt {
    pub name: Option<Name>,
    pub assoc: Option<Name>,
    pub selector: Selector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectTypeConstruct {
    pub stmt: Statement<SelectTypeStmt>,
    pub cases: Vec<TypeCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub name: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockConstruct {
    pub stmt: Statement<BlockStmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub name: Name,
    pub selector: Selector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateStmt {
    pub name: Option<Name>,
    pub associations: Vec<Association>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateConstruct {
    pub stmt: Statement<AssociateStmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTeamStmt {
    pub name: Option<Name>,
    pub team: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTeamConstruct {
    pub stmt: Statement<ChangeTeamStmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriticalStmt {
    pub name: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriticalConstruct {
    pub stmt: Statement<CriticalStmt>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereConstructStmt {
    pub name: Option<Name>,
    pub mask: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskedElsewhere {
    pub stmt: Statement<ElseIfStmt>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereConstruct {
    pub stmt: Statement<WhereConstructStmt>,
    pub body: Block,
    pub masked_elsewheres: Vec<MaskedElsewhere>,
    pub elsewhere: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForallConstructStmt {
    pub name: Option<Name>,
    pub header: ConcurrentHeader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForallConstruct {
    pub stmt: Statement<ForallConstructStmt>,
    pub body: Block,
}

// --- Action statements ---

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStmt {
    pub variable: Variable,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerBounds {
    None,
    /// `ptr(lo1:, lo2:) => target`
    Spec(Vec<Expr>),
    /// `ptr(lo1:hi1) => target`
    Remapping(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerAssignmentStmt {
    pub lhs: DataRef,
    pub bounds: PointerBounds,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocOpt {
    Mold(Expr),
    Source(Expr),
    Stat(Variable),
    ErrMsg(Variable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub object: DataRef,
    pub shape: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocateStmt {
    pub type_spec: Option<DeclTypeSpec>,
    pub allocations: Vec<Allocation>,
    pub opts: Vec<AllocOpt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeallocateStmt {
    pub objects: Vec<DataRef>,
    pub opts: Vec<AllocOpt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullifyStmt {
    pub objects: Vec<DataRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActualArg {
    Expr(Expr),
    /// `*label` alternate-return specifier.
    AltReturn(Label),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub designator: Name,
    pub args: Vec<ActualArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub call: Call,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GotoStmt {
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedGotoStmt {
    pub labels: Vec<Label>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticIfStmt {
    pub expr: Expr,
    pub less: Label,
    pub equal: Label,
    pub greater: Label,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub label: Label,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignedGotoStmt {
    pub name: Name,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleStmt {
    pub name: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitStmt {
    pub name: Option<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    /// Alternate-return selector.
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub action: Box<Statement<ActionStmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopStmt {
    pub is_error_stop: bool,
    pub code: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PauseStmt {
    pub code: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereStmt {
    pub mask: Expr,
    pub assignment: Box<AssignmentStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForallStmt {
    pub header: ConcurrentHeader,
    pub assignment: Box<AssignmentStmt>,
}

// --- I/O ---

#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    Star,
    Label(Label),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IoSpec {
    Unit(Expr),
    Fmt(Format),
    File(Expr),
    Status(Expr),
    IoStat(Variable),
    IoMsg(Variable),
    ErrLabel(Label),
    EorLabel(Label),
    EndLabel(Label),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadStmt {
    pub specs: Vec<IoSpec>,
    pub items: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteStmt {
    pub specs: Vec<IoSpec>,
    pub items: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub format: Format,
    pub items: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InquireStmt {
    Specs(Vec<IoSpec>),
    Iolength { length: Variable, items: Vec<Expr> },
}

// --- Image control ---

#[derive(Debug, Clone, PartialEq)]
pub enum SyncStat {
    Stat(Variable),
    ErrMsg(Variable),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSet {
    Star,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncImagesStmt {
    pub images: ImageSet,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncTeamStmt {
    pub team: Expr,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPostStmt {
    pub event: Variable,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventWaitStmt {
    pub event: Variable,
    pub until_count: Option<Expr>,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormTeamStmt {
    pub team_number: Expr,
    pub team_var: Variable,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockStmt {
    pub lock_var: Variable,
    pub acquired: Option<Variable>,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnlockStmt {
    pub lock_var: Variable,
    pub stats: Vec<SyncStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionStmt {
    Allocate(AllocateStmt),
    ArithmeticIf(ArithmeticIfStmt),
    Assign(AssignStmt),
    AssignedGoto(AssignedGotoStmt),
    Assignment(AssignmentStmt),
    Backspace(Vec<IoSpec>),
    Call(CallStmt),
    Close(Vec<IoSpec>),
    ComputedGoto(ComputedGotoStmt),
    Continue,
    Cycle(CycleStmt),
    Deallocate(DeallocateStmt),
    Endfile(Vec<IoSpec>),
    EventPost(EventPostStmt),
    EventWait(EventWaitStmt),
    Exit(ExitStmt),
    FailImage,
    Flush(Vec<IoSpec>),
    Forall(ForallStmt),
    FormTeam(FormTeamStmt),
    Goto(GotoStmt),
    If(IfStmt),
    Inquire(InquireStmt),
    Lock(LockStmt),
    Nullify(NullifyStmt),
    Open(Vec<IoSpec>),
    Pause(PauseStmt),
    PointerAssignment(PointerAssignmentStmt),
    Print(PrintStmt),
    Read(ReadStmt),
    Return(ReturnStmt),
    Rewind(Vec<IoSpec>),
    Stop(StopStmt),
    SyncAll(Vec<SyncStat>),
    SyncImages(SyncImagesStmt),
    SyncMemory(Vec<SyncStat>),
    SyncTeam(SyncTeamStmt),
    Unlock(UnlockStmt),
    Wait(Vec<IoSpec>),
    Where(WhereStmt),
    Write(WriteStmt),
}

impl ActionStmt {
    /// Short lowercase tag used by the linear-op dump.
    pub fn tag(&self) -> &'static str {
        match self {
            ActionStmt::Allocate(_) => "allocate",
            ActionStmt::ArithmeticIf(_) => "arithmetic-if",
            ActionStmt::Assign(_) => "assign",
            ActionStmt::AssignedGoto(_) => "assigned-goto",
            ActionStmt::Assignment(_) => "assignment",
            ActionStmt::Backspace(_) => "backspace",
            ActionStmt::Call(_) => "call",
            ActionStmt::Close(_) => "close",
            ActionStmt::ComputedGoto(_) => "computed-goto",
            ActionStmt::Continue => "continue",
            ActionStmt::Cycle(_) => "cycle",
            ActionStmt::Deallocate(_) => "deallocate",
            ActionStmt::Endfile(_) => "endfile",
            ActionStmt::EventPost(_) => "event-post",
            ActionStmt::EventWait(_) => "event-wait",
            ActionStmt::Exit(_) => "exit",
            ActionStmt::FailImage => "fail-image",
            ActionStmt::Flush(_) => "flush",
            ActionStmt::Forall(_) => "forall",
            ActionStmt::FormTeam(_) => "form-team",
            ActionStmt::Goto(_) => "goto",
            ActionStmt::If(_) => "if",
            ActionStmt::Inquire(_) => "inquire",
            ActionStmt::Lock(_) => "lock",
            ActionStmt::Nullify(_) => "nullify",
            ActionStmt::Open(_) => "open",
            ActionStmt::Pause(_) => "pause",
            ActionStmt::PointerAssignment(_) => "pointer-assignment",
            ActionStmt::Print(_) => "print",
            ActionStmt::Read(_) => "read",
            ActionStmt::Return(_) => "return",
            ActionStmt::Rewind(_) => "rewind",
            ActionStmt::Stop(_) => "stop",
            ActionStmt::SyncAll(_) => "sync-all",
            ActionStmt::SyncImages(_) => "sync-images",
            ActionStmt::SyncMemory(_) => "sync-memory",
            ActionStmt::SyncTeam(_) => "sync-team",
            ActionStmt::Unlock(_) => "unlock",
            ActionStmt::Wait(_) => "wait",
            ActionStmt::Where(_) => "where",
            ActionStmt::Write(_) => "write",
        }
    }
}
