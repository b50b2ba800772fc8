//! Declaration name resolution for rehydrated module files.
//!
//! This is the name-resolution collaborator the mod-file reader invokes:
//! it builds the scope and symbols for one parsed module or submodule
//! under a given parent scope. It handles exactly the declaration subset
//! the writer emits; executable code never appears in a mod file.
//!
//! Also provides the post-resolution check that every name in an
//! executable tree carries a symbol; a miss is an internal error that
//! marks the run fatal without aborting.

use crate::ast;
use crate::context::SemanticsContext;
use crate::expr::ExpressionAnalyzer;
use crate::modfile::reader::NameResolver;
use crate::symbols::{
    Attr, Attrs, Bound, CommonBlockDetails, Details, DerivedTypeDetails, GenericBindingDetails,
    GenericDetails, GenericKind, FinalProcDetails, ModuleDetails, NamelistDetails,
    ObjectEntityDetails, ProcBindingDetails, ProcEntityDetails, ProcInterface, ShapeSpec,
    SourceName, SubmoduleDetails, SubprogramDetails, TypeParamDetails, UseDetails,
    UseErrorDetails,
};
use crate::symtab::{ScopeId, ScopeKind, SymbolId, SymbolTable};

/// The default name-resolution collaborator.
pub struct DeclResolver;

impl NameResolver for DeclResolver {
    fn resolve(
        &self,
        context: &mut SemanticsContext,
        program: &ast::Program,
        parent: ScopeId,
    ) -> bool {
        for unit in &program.units {
            match unit {
                ast::ProgramUnit::Module(module) => {
                    resolve_module(context, module, parent);
                }
                ast::ProgramUnit::Submodule(submodule) => {
                    resolve_submodule(context, submodule, parent);
                }
                _ => {
                    context.internal_error(
                        "module file",
                        "module file holds a non-module program unit",
                    );
                }
            }
        }
        !context.any_fatal_error()
    }
}

fn source_name(name: &ast::Name) -> SourceName {
    SourceName::new(&name.text, name.offset)
}

fn lookup(table: &SymbolTable, mut scope: ScopeId, name: &str) -> Option<SymbolId> {
    loop {
        if let Some(symbol) = table.find(scope, name) {
            return Some(symbol);
        }
        scope = table.scope(scope).parent?;
    }
}

fn resolve_module(context: &mut SemanticsContext, module: &ast::ModuleUnit, parent: ScopeId) {
    let scope = context.table.make_scope(parent, ScopeKind::Module);
    let symbol = context.table.make_symbol(
        parent,
        source_name(&module.stmt.stmt.name),
        Attrs::new(),
        Details::Module(ModuleDetails { scope: Some(scope) }),
    );
    context.table.set_symbol_scope(symbol, scope);
    resolve_specification(context, scope, &module.spec);
    for subprogram in &module.contains {
        resolve_subprogram(context, scope, subprogram, false);
    }
}

fn resolve_submodule(
    context: &mut SemanticsContext,
    submodule: &ast::SubmoduleUnit,
    parent: ScopeId,
) {
    let ancestor = match context.table.scope(parent).kind {
        ScopeKind::Submodule => match &context
            .table
            .symbol(context.table.scope(parent).symbol.expect("scope has symbol"))
            .details
        {
            Details::Submodule(details) => details.ancestor,
            _ => parent,
        },
        _ => parent,
    };
    let scope = context.table.make_scope(parent, ScopeKind::Submodule);
    let symbol = context.table.make_symbol(
        parent,
        source_name(&submodule.stmt.stmt.name),
        Attrs::new(),
        Details::Submodule(SubmoduleDetails {
            scope: Some(scope),
            parent,
            ancestor,
        }),
    );
    context.table.set_symbol_scope(symbol, scope);
    resolve_specification(context, scope, &submodule.spec);
    for subprogram in &submodule.contains {
        resolve_subprogram(context, scope, subprogram, false);
    }
}

fn resolve_specification(
    context: &mut SemanticsContext,
    scope: ScopeId,
    spec: &ast::SpecificationPart,
) {
    for decl in &spec.decls {
        match decl {
            ast::DeclarationConstruct::Use(use_stmt) => resolve_use(context, scope, use_stmt),
            ast::DeclarationConstruct::Attr(attr_stmt) => {
                for name in &attr_stmt.names {
                    if let Some(symbol) = context.table.find(scope, &name.text) {
                        context.table.symbol_mut(symbol).attrs.insert(attr_stmt.attr);
                    }
                }
            }
            ast::DeclarationConstruct::Entity(entity) => {
                resolve_entity(context, scope, entity);
            }
            ast::DeclarationConstruct::Procedure(proc) => {
                resolve_proc_entity(context, scope, proc);
            }
            ast::DeclarationConstruct::DerivedType(def) => {
                resolve_derived_type(context, scope, def);
            }
            ast::DeclarationConstruct::Interface(block) => {
                for subprogram in &block.subprograms {
                    resolve_subprogram(context, scope, subprogram, true);
                }
            }
            ast::DeclarationConstruct::Namelist(namelist) => {
                let objects = namelist
                    .objects
                    .iter()
                    .map(|object| find_or_declare_object(context, scope, object))
                    .collect();
                context.table.make_symbol(
                    scope,
                    source_name(&namelist.name),
                    Attrs::new(),
                    Details::Namelist(NamelistDetails { objects }),
                );
            }
            ast::DeclarationConstruct::Common(common) => {
                let objects = common
                    .objects
                    .iter()
                    .map(|object| find_or_declare_object(context, scope, object))
                    .collect();
                context.table.make_common_block(
                    scope,
                    source_name(&common.name),
                    Attrs::new(),
                    Details::CommonBlock(CommonBlockDetails {
                        objects,
                        bind_name: None,
                    }),
                );
            }
            ast::DeclarationConstruct::CommonBind(bind) => {
                let bind_name = bind
                    .bind_name
                    .as_ref()
                    .and_then(|expr| ExpressionAnalyzer::in_scope(&context.table, scope).analyze(expr));
                if let Some(&symbol) = context.table.scope(scope).common_blocks.get(&bind.name.text)
                {
                    let symbol_ref = context.table.symbol_mut(symbol);
                    symbol_ref.attrs.insert(Attr::BindC);
                    if let Details::CommonBlock(details) = &mut symbol_ref.details {
                        details.bind_name = bind_name;
                    }
                }
            }
            ast::DeclarationConstruct::Generic(generic) => {
                resolve_generic(context, scope, generic);
            }
        }
    }
}

fn resolve_use(context: &mut SemanticsContext, scope: ScopeId, use_stmt: &ast::UseStmt) {
    let global = context.global_scope();
    let module_symbol = context.table.find(global, &use_stmt.module.text);
    for rename in &use_stmt.only {
        let original_name = rename.original.as_ref().unwrap_or(&rename.local);
        let resolved = module_symbol.and_then(|module| {
            let module_scope = context.table.symbol(module).scope?;
            let used = context.table.find(module_scope, &original_name.text)?;
            Some((module, used))
        });
        match resolved {
            Some((module, used)) => {
                context.table.make_symbol(
                    scope,
                    source_name(&rename.local),
                    Attrs::new(),
                    Details::Use(UseDetails {
                        module,
                        symbol: used,
                    }),
                );
            }
            None => {
                context.table.make_symbol(
                    scope,
                    source_name(&rename.local),
                    Attrs::new(),
                    Details::UseError(UseErrorDetails {
                        modules: vec![use_stmt.module.text.clone()],
                    }),
                );
            }
        }
    }
}

fn convert_shape(
    context: &SemanticsContext,
    scope: ScopeId,
    shape: &[ast::ShapeSpecDecl],
) -> Vec<ShapeSpec> {
    let analyzer = ExpressionAnalyzer::in_scope(&context.table, scope);
    shape
        .iter()
        .map(|spec| match spec {
            ast::ShapeSpecDecl::AssumedRank => ShapeSpec::assumed_rank(),
            ast::ShapeSpecDecl::Bounds { lower, upper } => {
                let convert = |bound: &Option<ast::BoundDecl>| match bound {
                    None => Bound::Deferred,
                    Some(ast::BoundDecl::Assumed) => Bound::Assumed,
                    Some(ast::BoundDecl::Expr(expr)) => match analyzer.analyze(expr) {
                        Some(expression) => Bound::Explicit(expression),
                        None => Bound::Deferred,
                    },
                };
                ShapeSpec::new(convert(lower), convert(upper))
            }
        })
        .collect()
}

fn resolve_entity(
    context: &mut SemanticsContext,
    scope: ScopeId,
    entity: &ast::EntityDecl,
) -> SymbolId {
    let analyzer = ExpressionAnalyzer::in_scope(&context.table, scope);
    let init = entity.init.as_ref().and_then(|expr| analyzer.analyze(expr));
    let bind_name = entity
        .bind_name
        .as_ref()
        .and_then(|expr| analyzer.analyze(expr));
    let shape = convert_shape(context, scope, &entity.shape);
    context.table.make_symbol(
        scope,
        source_name(&entity.name),
        Attrs::of(&entity.attrs),
        Details::ObjectEntity(ObjectEntityDetails {
            type_spec: Some(entity.type_spec.clone()),
            shape,
            init,
            bind_name,
        }),
    )
}

fn resolve_proc_entity(
    context: &mut SemanticsContext,
    scope: ScopeId,
    proc: &ast::ProcDecl,
) -> SymbolId {
    let interface = match &proc.interface {
        Some(ast::ProcInterfaceDecl::Name(name)) => ProcInterface {
            symbol: lookup(&context.table, scope, &name.text),
            type_spec: None,
        },
        Some(ast::ProcInterfaceDecl::Type(type_spec)) => ProcInterface {
            symbol: None,
            type_spec: Some(type_spec.clone()),
        },
        None => ProcInterface::default(),
    };
    let bind_name = proc
        .bind_name
        .as_ref()
        .and_then(|expr| ExpressionAnalyzer::in_scope(&context.table, scope).analyze(expr));
    context.table.make_symbol(
        scope,
        source_name(&proc.name),
        Attrs::of(&proc.attrs),
        Details::ProcEntity(ProcEntityDetails {
            interface,
            pass_name: proc.pass_name.as_ref().map(|name| name.text.clone()),
            bind_name,
        }),
    )
}

fn find_or_declare_object(
    context: &mut SemanticsContext,
    scope: ScopeId,
    name: &ast::Name,
) -> SymbolId {
    if let Some(symbol) = context.table.find(scope, &name.text) {
        return symbol;
    }
    context.table.make_detached_symbol(
        scope,
        source_name(name),
        Attrs::new(),
        Details::ObjectEntity(ObjectEntityDetails::default()),
    )
}

fn resolve_derived_type(
    context: &mut SemanticsContext,
    scope: ScopeId,
    def: &ast::DerivedTypeDef,
) {
    let extends = def
        .stmt
        .extends
        .as_ref()
        .and_then(|name| lookup(&context.table, scope, &name.text));
    let type_scope = context.table.make_scope(scope, ScopeKind::DerivedType);
    let symbol = context.table.make_symbol(
        scope,
        source_name(&def.stmt.name),
        Attrs::of(&def.stmt.attrs),
        Details::DerivedType(DerivedTypeDetails {
            param_names: def.stmt.param_names.iter().map(source_name).collect(),
            sequence: def.sequence,
            extends,
        }),
    );
    context.table.set_symbol_scope(symbol, type_scope);

    for component in &def.components {
        match component {
            ast::ComponentDecl::Entity(entity) => {
                resolve_entity(context, type_scope, entity);
            }
            ast::ComponentDecl::TypeParam(param) => {
                let analyzer = ExpressionAnalyzer::in_scope(&context.table, type_scope);
                let init = param.init.as_ref().and_then(|expr| analyzer.analyze(expr));
                context.table.make_symbol(
                    type_scope,
                    source_name(&param.name),
                    Attrs::new(),
                    Details::TypeParam(TypeParamDetails {
                        type_spec: Some(param.type_spec.clone()),
                        attr: param.attr,
                        init,
                    }),
                );
            }
            ast::ComponentDecl::Procedure(proc) => {
                resolve_proc_entity(context, type_scope, proc);
            }
        }
    }

    for binding in &def.bindings {
        match binding {
            ast::TypeBoundDecl::Procedure(proc_binding) => {
                let target_name = proc_binding
                    .deferred_interface
                    .as_ref()
                    .or(proc_binding.bound_to.as_ref())
                    .unwrap_or(&proc_binding.name);
                let target = lookup(&context.table, type_scope, &target_name.text);
                let Some(target) = target else {
                    context.internal_error(
                        proc_binding.name.text.clone(),
                        format!("no symbol found for binding target '{}'", target_name.text),
                    );
                    continue;
                };
                context.table.make_symbol(
                    type_scope,
                    source_name(&proc_binding.name),
                    Attrs::of(&proc_binding.attrs),
                    Details::ProcBinding(ProcBindingDetails {
                        symbol: target,
                        pass_name: proc_binding.pass_name.as_ref().map(|name| name.text.clone()),
                    }),
                );
            }
            ast::TypeBoundDecl::Generic(generic) => {
                let specific = lookup(&context.table, type_scope, &generic.specific.text);
                let Some(specific) = specific else {
                    continue;
                };
                match context
                    .table
                    .find(type_scope, &generic.name.text)
                    .map(|existing| (existing, context.table.symbol(existing).details.clone()))
                {
                    Some((existing, Details::GenericBinding(mut details))) => {
                        details.specific_procs.push(specific);
                        context.table.symbol_mut(existing).details =
                            Details::GenericBinding(details);
                    }
                    _ => {
                        context.table.make_symbol(
                            type_scope,
                            source_name(&generic.name),
                            Attrs::new(),
                            Details::GenericBinding(GenericBindingDetails {
                                specific_procs: vec![specific],
                            }),
                        );
                    }
                }
            }
            ast::TypeBoundDecl::Final(final_decl) => {
                context.table.make_symbol(
                    type_scope,
                    source_name(&final_decl.name),
                    Attrs::new(),
                    Details::FinalProc(FinalProcDetails),
                );
            }
        }
    }
}

fn resolve_generic(context: &mut SemanticsContext, scope: ScopeId, generic: &ast::GenericStmt) {
    let (name, kind) = match &generic.spec {
        ast::GenericSpec::Name(name) => (source_name(name), GenericKind::Name),
        ast::GenericSpec::DefinedOp(op) => (SourceName::new(op, 0), GenericKind::DefinedOp),
        ast::GenericSpec::Assignment => (SourceName::new("=", 0), GenericKind::Assignment),
    };
    // a specific procedure or derived type may share the generic's name
    let existing = context.table.find(scope, &name.text);
    let (specific, derived_type) = match existing.map(|id| (&context.table.symbol(id).details, id))
    {
        Some((Details::Subprogram(_), id)) | Some((Details::ProcEntity(_), id)) => {
            (Some(id), None)
        }
        Some((Details::DerivedType(_), id)) => (None, Some(id)),
        _ => (None, None),
    };
    let specific_procs = generic
        .specifics
        .iter()
        .filter_map(|specific_name| lookup(&context.table, scope, &specific_name.text))
        .collect();
    context.table.make_symbol(
        scope,
        name,
        Attrs::of(&generic.attrs),
        Details::Generic(GenericDetails {
            kind,
            specific_procs,
            specific,
            derived_type,
        }),
    );
}

fn resolve_subprogram(
    context: &mut SemanticsContext,
    enclosing: ScopeId,
    subprogram: &ast::ModuleSubprogram,
    is_interface: bool,
) {
    let (name, attrs, dummy_names, result_name, bind_expr, is_function, spec) = match subprogram {
        ast::ModuleSubprogram::Function(function) => (
            &function.stmt.stmt.name,
            &function.stmt.stmt.attrs,
            &function.stmt.stmt.dummy_args,
            function.stmt.stmt.result.clone(),
            function.stmt.stmt.bind_name.clone(),
            true,
            &function.spec,
        ),
        ast::ModuleSubprogram::Subroutine(subroutine) => (
            &subroutine.stmt.stmt.name,
            &subroutine.stmt.stmt.attrs,
            &subroutine.stmt.stmt.dummy_args,
            None,
            subroutine.stmt.stmt.bind_name.clone(),
            false,
            &subroutine.spec,
        ),
    };
    let bind_name = bind_expr
        .as_ref()
        .and_then(|expr| ExpressionAnalyzer::in_scope(&context.table, enclosing).analyze(expr));
    let scope = context.table.make_scope(enclosing, ScopeKind::Subprogram);
    let symbol = context.table.make_symbol(
        enclosing,
        source_name(name),
        Attrs::of(attrs),
        Details::Subprogram(SubprogramDetails {
            is_function,
            is_interface,
            dummy_args: Vec::new(),
            result: None,
            bind_name,
        }),
    );
    context.table.set_symbol_scope(symbol, scope);
    resolve_specification(context, scope, spec);

    let dummy_args: Vec<SymbolId> = dummy_names
        .iter()
        .map(|dummy| find_or_declare_object(context, scope, dummy))
        .collect();
    let result = if is_function {
        let result_name = result_name.as_ref().unwrap_or(name);
        Some(find_or_declare_object(context, scope, result_name))
    } else {
        None
    };
    if let Details::Subprogram(details) = &mut context.table.symbol_mut(symbol).details {
        details.dummy_args = dummy_args;
        details.result = result;
    }
}

// --- post-resolution name check ---

/// Checks that every name in the executable parts of a program carries a
/// resolved symbol. A miss is an internal error; the run keeps going but
/// is marked fatal.
pub fn check_names_resolved(context: &mut SemanticsContext, program: &ast::Program) {
    let mut check = |name: &ast::Name| {
        if name.symbol.is_none() {
            context.internal_error(
                name.text.clone(),
                format!("no symbol found for '{}'", name.text),
            );
        }
    };
    for unit in &program.units {
        match unit {
            ast::ProgramUnit::Main(main) => walk_block_names(&main.body, &mut check),
            ast::ProgramUnit::Function(function) => walk_block_names(&function.body, &mut check),
            ast::ProgramUnit::Subroutine(subroutine) => {
                walk_block_names(&subroutine.body, &mut check)
            }
            ast::ProgramUnit::Module(_) | ast::ProgramUnit::Submodule(_) => {}
        }
    }
}

fn walk_block_names(block: &ast::Block, check: &mut impl FnMut(&ast::Name)) {
    for construct in block {
        walk_construct_names(construct, check);
    }
}

fn walk_construct_names(construct: &ast::ExecutableConstruct, check: &mut impl FnMut(&ast::Name)) {
    use ast::ExecutableConstruct::*;
    match construct {
        Action(statement) => walk_action_names(&statement.stmt, check),
        Associate(associate) => {
            for association in &associate.stmt.stmt.associations {
                check(&association.name);
                walk_selector_names(&association.selector, check);
            }
            walk_block_names(&associate.body, check);
        }
        Block(block) => walk_block_names(&block.body, check),
        Case(case) => {
            walk_expr_names(&case.stmt.stmt.expr, check);
            for item in &case.cases {
                walk_block_names(&item.block, check);
            }
        }
        ChangeTeam(change_team) => {
            walk_expr_names(&change_team.stmt.stmt.team, check);
            walk_block_names(&change_team.body, check);
        }
        Critical(critical) => walk_block_names(&critical.body, check),
        Do(do_construct) => {
            if let Some(control) = &do_construct.stmt.stmt.control {
                match control {
                    ast::LoopControl::Bounds(bounds) => {
                        check(&bounds.name);
                        walk_expr_names(&bounds.lower, check);
                        walk_expr_names(&bounds.upper, check);
                        if let Some(step) = &bounds.step {
                            walk_expr_names(step, check);
                        }
                    }
                    ast::LoopControl::While(cond) => walk_expr_names(cond, check),
                    ast::LoopControl::Concurrent(header) => {
                        for control in &header.controls {
                            check(&control.name);
                            walk_expr_names(&control.lower, check);
                            walk_expr_names(&control.upper, check);
                        }
                    }
                }
            }
            walk_block_names(&do_construct.body, check);
        }
        If(if_construct) => {
            walk_expr_names(&if_construct.stmt.stmt.cond, check);
            walk_block_names(&if_construct.block, check);
            for else_if in &if_construct.else_ifs {
                walk_expr_names(&else_if.stmt.stmt.cond, check);
                walk_block_names(&else_if.block, check);
            }
            if let Some(else_block) = &if_construct.else_block {
                walk_block_names(else_block, check);
            }
        }
        SelectRank(select) => {
            walk_selector_names(&select.stmt.stmt.selector, check);
            for case in &select.cases {
                walk_block_names(&case.block, check);
            }
        }
        SelectType(select) => {
            walk_selector_names(&select.stmt.stmt.selector, check);
            for case in &select.cases {
                walk_block_names(&case.block, check);
            }
        }
        Where(where_construct) => {
            walk_expr_names(&where_construct.stmt.stmt.mask, check);
            walk_block_names(&where_construct.body, check);
            for masked in &where_construct.masked_elsewheres {
                walk_expr_names(&masked.stmt.stmt.cond, check);
                walk_block_names(&masked.block, check);
            }
            if let Some(elsewhere) = &where_construct.elsewhere {
                walk_block_names(elsewhere, check);
            }
        }
        Forall(forall) => walk_block_names(&forall.body, check),
    }
}

fn walk_selector_names(selector: &ast::Selector, check: &mut impl FnMut(&ast::Name)) {
    match selector {
        ast::Selector::Expr(expr) => walk_expr_names(expr, check),
        ast::Selector::Variable(variable) => walk_data_ref_names(&variable.data_ref, check),
    }
}

fn walk_data_ref_names(data_ref: &ast::DataRef, check: &mut impl FnMut(&ast::Name)) {
    check(data_ref.base());
    for part in &data_ref.parts {
        for subscript in &part.subscripts {
            walk_expr_names(subscript, check);
        }
    }
}

fn walk_expr_names(expr: &ast::Expr, check: &mut impl FnMut(&ast::Name)) {
    match expr {
        ast::Expr::Designator(data_ref) => walk_data_ref_names(data_ref, check),
        ast::Expr::Parentheses(inner) => walk_expr_names(inner, check),
        ast::Expr::Unary { operand, .. } => walk_expr_names(operand, check),
        ast::Expr::Binary { left, right, .. } => {
            walk_expr_names(left, check);
            walk_expr_names(right, check);
        }
        ast::Expr::FunctionRef { name, args } => {
            check(name);
            for arg in args {
                walk_expr_names(arg, check);
            }
        }
        _ => {}
    }
}

fn walk_action_names(stmt: &ast::ActionStmt, check: &mut impl FnMut(&ast::Name)) {
    use ast::ActionStmt::*;
    match stmt {
        Assignment(assignment) => {
            walk_data_ref_names(&assignment.variable.data_ref, check);
            walk_expr_names(&assignment.expr, check);
        }
        PointerAssignment(pointer) => {
            walk_data_ref_names(&pointer.lhs, check);
            walk_expr_names(&pointer.expr, check);
        }
        Call(call) => {
            check(&call.call.designator);
            for arg in &call.call.args {
                if let ast::ActualArg::Expr(expr) = arg {
                    walk_expr_names(expr, check);
                }
            }
        }
        Assign(assign) => check(&assign.name),
        AssignedGoto(assigned) => check(&assigned.name),
        ComputedGoto(computed) => walk_expr_names(&computed.expr, check),
        ArithmeticIf(arithmetic) => walk_expr_names(&arithmetic.expr, check),
        If(if_stmt) => {
            walk_expr_names(&if_stmt.cond, check);
            walk_action_names(&if_stmt.action.stmt, check);
        }
        Allocate(allocate) => {
            for allocation in &allocate.allocations {
                walk_data_ref_names(&allocation.object, check);
            }
        }
        Deallocate(deallocate) => {
            for object in &deallocate.objects {
                walk_data_ref_names(object, check);
            }
        }
        Nullify(nullify) => {
            for object in &nullify.objects {
                walk_data_ref_names(object, check);
            }
        }
        Read(read) => {
            for item in &read.items {
                walk_data_ref_names(&item.data_ref, check);
            }
        }
        Write(write) => {
            for item in &write.items {
                walk_expr_names(item, check);
            }
        }
        Print(print) => {
            for item in &print.items {
                walk_expr_names(item, check);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/t_resolve.rs"]
mod tests;
