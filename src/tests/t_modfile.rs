use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use indoc::indoc;

use crate::context::SemanticsContext;
use crate::expr::{Constant, Expression};
use crate::modfile::parser::parse_mod_file;
use crate::modfile::writer::write_file;
use crate::modfile::{
    checksum, header, mod_file_path, ModFileWriter, WriteOutcome, MAGIC,
};
use crate::symbols::{
    Attr, Attrs, Details, Flag, ModuleDetails, ObjectEntityDetails, SourceName, SubmoduleDetails,
    SubprogramDetails,
};
use crate::symtab::{ScopeId, ScopeKind, SymbolId};
use crate::types::DeclTypeSpec;
use crate::{ast, read_mod, write_all_mods};

static MODFILE_TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_dir(tag: &str) -> PathBuf {
    let run_id = MODFILE_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "ferric_modfile_{}_{}_{}",
        tag,
        std::process::id(),
        run_id
    ));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

/// `module m` with `integer, parameter :: k = 3` and `subroutine s(x)`.
fn sample_module_context(dir: &Path) -> SemanticsContext {
    let mut context = SemanticsContext::new();
    context.set_module_directory(dir.to_path_buf());
    context.set_search_directories(vec![dir.to_path_buf()]);
    let global = context.global_scope();

    let scope = context.table.make_scope(global, ScopeKind::Module);
    let module = context.table.make_symbol(
        global,
        SourceName::new("m", 0),
        Attrs::new(),
        Details::Module(ModuleDetails { scope: Some(scope) }),
    );
    context.table.set_symbol_scope(module, scope);

    context.table.make_symbol(
        scope,
        SourceName::new("k", 10),
        Attrs::of(&[Attr::Parameter]),
        Details::ObjectEntity(ObjectEntityDetails {
            type_spec: Some(DeclTypeSpec::default_integer()),
            shape: Vec::new(),
            init: Some(Expression::int(3, 4)),
            bind_name: None,
        }),
    );

    let sub_scope = context.table.make_scope(scope, ScopeKind::Subprogram);
    let subroutine = context.table.make_symbol(
        scope,
        SourceName::new("s", 20),
        Attrs::new(),
        Details::Subprogram(SubprogramDetails::default()),
    );
    context.table.set_symbol_scope(subroutine, sub_scope);
    let dummy = context.table.make_symbol(
        sub_scope,
        SourceName::new("x", 30),
        Attrs::new(),
        Details::ObjectEntity(ObjectEntityDetails {
            type_spec: Some(DeclTypeSpec::default_integer()),
            shape: Vec::new(),
            init: None,
            bind_name: None,
        }),
    );
    if let Details::Subprogram(details) = &mut context.table.symbol_mut(subroutine).details {
        details.dummy_args = vec![dummy];
    }
    context
}

const SAMPLE_BODY: &str = indoc! {"
    module m
    integer,parameter::k=3_4
    contains
    subroutine s(x)
    integer::x
    end
    end
"};

#[test]
fn checksum_of_empty_input_is_offset_basis() {
    assert_eq!(checksum(b""), "cbf29ce484222325");
}

#[test]
fn checksum_is_sixteen_hex_digits() {
    let sum = checksum(SAMPLE_BODY.as_bytes());
    assert_eq!(sum.len(), 16);
    assert!(sum.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(header(SAMPLE_BODY), format!("{}{}", MAGIC, sum));
}

#[test]
fn mod_file_naming() {
    assert_eq!(
        mod_file_path(Path::new("."), "M", None),
        PathBuf::from("m.mod")
    );
    assert_eq!(
        mod_file_path(Path::new("lib"), "b", Some("A")),
        PathBuf::from("lib/a-b.mod")
    );
    assert_eq!(
        mod_file_path(Path::new("."), "c", Some("a")),
        PathBuf::from("a-c.mod")
    );
}

#[test]
fn writer_emits_canonical_body() {
    let dir = temp_dir("canonical");
    let mut context = sample_module_context(&dir);
    assert!(ModFileWriter::new(&mut context).write_all());

    let written = fs::read_to_string(dir.join("m.mod")).expect("mod file written");
    let expected = format!("{}\n{}", header(SAMPLE_BODY), SAMPLE_BODY);
    assert_eq!(written, expected);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn emission_is_deterministic() {
    let dir_a = temp_dir("det_a");
    let dir_b = temp_dir("det_b");
    let mut context_a = sample_module_context(&dir_a);
    let mut context_b = sample_module_context(&dir_b);
    assert!(ModFileWriter::new(&mut context_a).write_all());
    assert!(ModFileWriter::new(&mut context_b).write_all());
    let bytes_a = fs::read(dir_a.join("m.mod")).unwrap();
    let bytes_b = fs::read(dir_b.join("m.mod")).unwrap();
    assert_eq!(bytes_a, bytes_b);
    let _ = fs::remove_dir_all(&dir_a);
    let _ = fs::remove_dir_all(&dir_b);
}

#[test]
fn matching_file_is_not_rewritten() {
    let dir = temp_dir("touch_free");
    let path = dir.join("m.mod");
    assert_eq!(
        write_file(&path, SAMPLE_BODY).unwrap(),
        WriteOutcome::Written
    );
    assert_eq!(
        write_file(&path, SAMPLE_BODY).unwrap(),
        WriteOutcome::Unchanged
    );
    // different contents are written again
    assert_eq!(
        write_file(&path, "module m\nend\n").unwrap(),
        WriteOutcome::Written
    );
    let _ = fs::remove_dir_all(&dir);
}

fn find_in_scope(context: &SemanticsContext, scope: ScopeId, name: &str) -> SymbolId {
    context
        .table
        .find(scope, name)
        .unwrap_or_else(|| panic!("symbol '{}' not found", name))
}

#[test]
fn reader_round_trips_module() {
    let dir = temp_dir("round_trip");
    let mut writer_context = sample_module_context(&dir);
    assert!(write_all_mods(&mut writer_context));

    let mut context = SemanticsContext::new();
    context.set_search_directories(vec![dir.clone()]);
    let scope = read_mod(&mut context, "m", None).expect("module read back");

    let k = find_in_scope(&context, scope, "k");
    let k_symbol = context.table.symbol(k);
    assert!(k_symbol.attrs.test(Attr::Parameter));
    match &k_symbol.details {
        Details::ObjectEntity(details) => {
            assert_eq!(details.type_spec, Some(DeclTypeSpec::default_integer()));
            assert_eq!(
                details.init,
                Some(Expression::Constant(Constant::Int { value: 3, kind: 4 }))
            );
        }
        other => panic!("expected an object entity, got {}", other.kind_name()),
    }

    let s = find_in_scope(&context, scope, "s");
    let s_symbol = context.table.symbol(s);
    match &s_symbol.details {
        Details::Subprogram(details) => {
            assert!(!details.is_function);
            assert_eq!(details.dummy_args.len(), 1);
            let dummy = context.table.symbol(details.dummy_args[0]);
            assert_eq!(dummy.name().text, "x");
        }
        other => panic!("expected a subprogram, got {}", other.kind_name()),
    }

    // loaded modules are flagged so the writer skips them
    let module = find_in_scope(&context, context.global_scope(), "m");
    assert!(context.table.symbol(module).test(Flag::ModFile));

    // a second read resolves from the scope tree, not the filesystem
    let again = read_mod(&mut context, "m", None);
    assert_eq!(again, Some(scope));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_checksum_is_rejected() {
    let dir = temp_dir("corrupt");
    let mut writer_context = sample_module_context(&dir);
    assert!(write_all_mods(&mut writer_context));

    let path = dir.join("m.mod");
    let mut contents = fs::read_to_string(&path).unwrap();
    contents.push_str("! trailing garbage\n");
    fs::write(&path, contents).unwrap();

    let mut context = SemanticsContext::new();
    context.set_search_directories(vec![dir.clone()]);
    assert!(read_mod(&mut context, "m", None).is_none());
    assert!(context
        .messages
        .iter()
        .any(|message| message.text.contains("invalid checksum")));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_module_aggregates_directory_attempts() {
    let dir_a = temp_dir("missing_a");
    let dir_b = temp_dir("missing_b");
    let mut context = SemanticsContext::new();
    context.set_search_directories(vec![dir_a.clone(), dir_b.clone()]);
    assert!(read_mod(&mut context, "nope", None).is_none());

    let error = context
        .messages
        .iter()
        .find(|message| message.text.contains("Cannot find module file for 'nope'"))
        .expect("aggregated error reported");
    assert_eq!(error.attachments.len(), 2);
    let _ = fs::remove_dir_all(&dir_a);
    let _ = fs::remove_dir_all(&dir_b);
}

/// Module `a`, submodule `b` of `a`, submodule `c` of `a:b`.
fn submodule_tree_context(dir: &Path) -> SemanticsContext {
    let mut context = SemanticsContext::new();
    context.set_module_directory(dir.to_path_buf());
    context.set_search_directories(vec![dir.to_path_buf()]);
    let global = context.global_scope();

    let a_scope = context.table.make_scope(global, ScopeKind::Module);
    let a = context.table.make_symbol(
        global,
        SourceName::new("a", 0),
        Attrs::new(),
        Details::Module(ModuleDetails {
            scope: Some(a_scope),
        }),
    );
    context.table.set_symbol_scope(a, a_scope);

    let b_scope = context.table.make_scope(a_scope, ScopeKind::Submodule);
    let b = context.table.make_symbol(
        a_scope,
        SourceName::new("b", 10),
        Attrs::new(),
        Details::Submodule(SubmoduleDetails {
            scope: Some(b_scope),
            parent: a_scope,
            ancestor: a_scope,
        }),
    );
    context.table.set_symbol_scope(b, b_scope);

    let c_scope = context.table.make_scope(b_scope, ScopeKind::Submodule);
    let c = context.table.make_symbol(
        b_scope,
        SourceName::new("c", 20),
        Attrs::new(),
        Details::Submodule(SubmoduleDetails {
            scope: Some(c_scope),
            parent: b_scope,
            ancestor: a_scope,
        }),
    );
    context.table.set_symbol_scope(c, c_scope);
    context
}

#[test]
fn submodule_files_use_ancestor_prefix() {
    let dir = temp_dir("submodule_names");
    let mut context = submodule_tree_context(&dir);
    assert!(write_all_mods(&mut context));

    assert!(dir.join("a.mod").exists());
    assert!(dir.join("a-b.mod").exists());
    assert!(dir.join("a-c.mod").exists());

    let b_file = fs::read_to_string(dir.join("a-b.mod")).unwrap();
    assert!(b_file.ends_with("submodule(a) b\nend\n"));
    let c_file = fs::read_to_string(dir.join("a-c.mod")).unwrap();
    assert!(c_file.ends_with("submodule(a:b) c\nend\n"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn reader_splices_submodule_under_discovered_parent() {
    let dir = temp_dir("submodule_read");
    let mut writer_context = submodule_tree_context(&dir);
    assert!(write_all_mods(&mut writer_context));

    let mut context = SemanticsContext::new();
    context.set_search_directories(vec![dir.clone()]);
    let a_scope = read_mod(&mut context, "a", None).expect("module a read");
    // reading c forces the parent submodule b to be read first
    let c_scope = read_mod(&mut context, "c", Some(a_scope)).expect("submodule c read");

    let b_scope = context
        .table
        .find_submodule(a_scope, "b")
        .expect("b spliced under a");
    assert_eq!(
        context.table.find_submodule(b_scope, "c"),
        Some(c_scope),
        "c spliced under b"
    );
    let _ = fs::remove_dir_all(&dir);
}

// --- subset parser ---

#[test]
fn parses_derived_type_with_bindings() {
    let body = indoc! {"
        module shapes
        type,abstract::shape(n)
        integer,kind::n=4
        real::area
        contains
        procedure,pass(self)::grow=>grow_impl
        final::cleanup
        end type
        end
    "};
    let program = parse_mod_file(body).expect("parses");
    let module = match &program.units[0] {
        ast::ProgramUnit::Module(module) => module,
        _ => panic!("expected a module"),
    };
    let def = match &module.spec.decls[0] {
        ast::DeclarationConstruct::DerivedType(def) => def,
        other => panic!("expected a derived type, got {:?}", other),
    };
    assert_eq!(def.stmt.name.text, "shape");
    assert_eq!(def.stmt.attrs, vec![Attr::Abstract]);
    assert_eq!(def.stmt.param_names.len(), 1);
    assert_eq!(def.components.len(), 2);
    assert!(matches!(
        def.components[0],
        ast::ComponentDecl::TypeParam(_)
    ));
    assert_eq!(def.bindings.len(), 2);
    match &def.bindings[0] {
        ast::TypeBoundDecl::Procedure(binding) => {
            assert_eq!(binding.name.text, "grow");
            assert_eq!(binding.bound_to.as_ref().unwrap().text, "grow_impl");
            assert_eq!(binding.pass_name.as_ref().unwrap().text, "self");
        }
        other => panic!("expected a procedure binding, got {:?}", other),
    }
}

#[test]
fn parses_use_interface_namelist_and_common() {
    let body = indoc! {"
        module plumbing
        use iso,only:ik=>int_kind
        volatile::flag
        interface
        pure function f(x) result(y)
        integer::y
        integer::x
        end
        end interface
        namelist/knobs/alpha,beta
        common/blk/gamma
        end
    "};
    let program = parse_mod_file(body).expect("parses");
    let module = match &program.units[0] {
        ast::ProgramUnit::Module(module) => module,
        _ => panic!("expected a module"),
    };
    let decls = &module.spec.decls;
    assert!(matches!(decls[0], ast::DeclarationConstruct::Use(_)));
    assert!(matches!(decls[1], ast::DeclarationConstruct::Attr(_)));
    match &decls[2] {
        ast::DeclarationConstruct::Interface(block) => {
            match &block.subprograms[0] {
                ast::ModuleSubprogram::Function(function) => {
                    assert_eq!(function.stmt.stmt.attrs, vec![Attr::Pure]);
                    assert_eq!(function.stmt.stmt.result.as_ref().unwrap().text, "y");
                }
                other => panic!("expected a function, got {:?}", other),
            }
        }
        other => panic!("expected an interface block, got {:?}", other),
    }
    assert!(matches!(decls[3], ast::DeclarationConstruct::Namelist(_)));
    assert!(matches!(decls[4], ast::DeclarationConstruct::Common(_)));
}

#[test]
fn rejects_trailing_garbage() {
    assert!(parse_mod_file("module m\nend\nextra\n").is_err());
    assert!(parse_mod_file("not a module\n").is_err());
}
