//! 上下文树的集成测试（从 di-impl 迁移）

use di_abstractions::{FnMaker, Item, ItemResolver, Maker};
use di_impl::{AliasMap, Context, ContextManager};
use di_impl_integration_tests::{tracked_maker, Journal, Resource};
use infrastructure_common::{ContextError, ContextState};
use std::collections::HashMap;
use std::sync::Arc;

fn app_request(makers: Vec<Arc<dyn Maker>>) -> anyhow::Result<Arc<ContextManager>> {
    Ok(ContextManager::new(
        ["app", "request"],
        AliasMap::new(),
        HashMap::new(),
        makers,
    )?)
}

#[test]
fn test_root_and_sub_context_scopes() -> anyhow::Result<()> {
    let manager = app_request(Vec::new())?;
    let root = manager.root_context();

    assert_eq!(root.scope(), "app");
    assert!(root.parent().is_none());
    assert_eq!(root.sub_scopes(), ["request"]);
    assert!(root.has_sub_scope("request"));
    assert!(!root.has_sub_scope("app"));

    let child = root.sub_context("request")?;
    assert_eq!(child.scope(), "request");
    assert_eq!(child.parent_scopes(), ["app"]);
    assert!(child.sub_scopes().is_empty());
    assert_eq!(child.parent(), Some(root.clone()));
    assert_eq!(root.children(), vec![child.clone()]);

    assert!(matches!(
        child.sub_context("app"),
        Err(ContextError::ScopeMismatch { .. })
    ));
    assert!(matches!(
        root.sub_context("app"),
        Err(ContextError::ScopeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_sub_context_creates_intermediate_scopes() -> anyhow::Result<()> {
    let manager = ContextManager::new(
        ["app", "request", "subrequest"],
        AliasMap::new(),
        HashMap::new(),
        Vec::<Arc<dyn Maker>>::new(),
    )?;
    let root = manager.root_context();

    let deep = root.sub_context("subrequest")?;
    assert_eq!(deep.scope(), "subrequest");

    let middle = deep.parent().expect("intermediate context");
    assert_eq!(middle.scope(), "request");
    assert_eq!(middle.parent(), Some(root.clone()));
    assert_eq!(deep.parent_with_scope("app"), Some(root.clone()));
    assert_eq!(deep.parent_with_scope("request"), Some(middle));
    assert!(deep.parent_with_scope("subrequest").is_none());
    Ok(())
}

#[test]
fn test_memoization() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![tracked_maker(&journal, "db", "app")])?;
    let root = manager.root_context();

    let first = root.safe_get("db")?;
    let second = root.safe_get("db")?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(journal.builds(), 1);
    assert_eq!(root.get_as::<Resource>("db")?.label, "db");
    Ok(())
}

#[test]
fn test_cross_scope_delegation() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![tracked_maker(&journal, "db", "app")])?;
    let root = manager.root_context();
    let child = root.sub_context("request")?;

    let from_child = child.safe_get("db")?;
    let from_root = root.safe_get("db")?;

    assert!(Arc::ptr_eq(&from_child, &from_root));
    assert!(root.is_built("db"));
    assert!(!child.is_built("db"));
    assert_eq!(journal.builds(), 1);
    Ok(())
}

#[test]
fn test_inner_scope_maker_unreachable_from_outer_context() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![tracked_maker(&journal, "session", "request")])?;
    let root = manager.root_context();

    assert!(matches!(
        root.safe_get("session"),
        Err(ContextError::ScopeMismatch { .. })
    ));
    assert_eq!(journal.builds(), 0);
    Ok(())
}

#[test]
fn test_sibling_contexts_build_separately() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![tracked_maker(&journal, "session", "request")])?;
    let root = manager.root_context();
    let first = root.sub_context("request")?;
    let second = root.sub_context("request")?;

    let a = first.safe_get("session")?;
    let b = second.safe_get("session")?;

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(journal.builds(), 2);
    Ok(())
}

#[test]
fn test_cascading_teardown() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![
        tracked_maker(&journal, "db", "app"),
        tracked_maker(&journal, "session", "request"),
    ])?;
    let root = manager.root_context();
    let child = root.sub_context("request")?;

    root.safe_get("db")?;
    child.safe_get("session")?;

    root.delete();

    assert_eq!(journal.closed(), ["session", "db"]);
    assert_eq!(root.state(), ContextState::Closed);
    assert_eq!(child.state(), ContextState::Closed);
    assert!(root.children().is_empty());
    assert!(child.parent().is_none());
    assert!(matches!(
        child.safe_get("anything"),
        Err(ContextError::ClosedContext { .. })
    ));
    assert!(matches!(
        root.sub_context("request"),
        Err(ContextError::ClosedContext { .. })
    ));
    assert!(root.parent_scopes().is_empty());
    assert!(root.sub_scopes().is_empty());
    assert!(!root.has_sub_scope("request"));
    assert!(root.context_manager().is_none());
    Ok(())
}

#[test]
fn test_items_in_one_context_close_in_reverse_build_order() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![
        tracked_maker(&journal, "config", "app"),
        tracked_maker(&journal, "pool", "app"),
        tracked_maker(&journal, "cache", "app"),
    ])?;
    let root = manager.root_context();

    root.safe_get("config")?;
    root.safe_get("pool")?;
    root.safe_get("cache")?;
    root.delete();

    assert_eq!(journal.closed(), ["cache", "pool", "config"]);
    Ok(())
}

#[test]
fn test_delete_is_idempotent() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![tracked_maker(&journal, "db", "app")])?;
    let root = manager.root_context();
    root.safe_get("db")?;

    root.delete();
    root.delete();

    assert_eq!(journal.closed(), ["db"]);
    Ok(())
}

#[test]
fn test_deleting_child_keeps_parent_open() -> anyhow::Result<()> {
    let journal = Journal::new();
    let manager = app_request(vec![
        tracked_maker(&journal, "db", "app"),
        tracked_maker(&journal, "session", "request"),
    ])?;
    let root = manager.root_context();
    let child = root.sub_context("request")?;
    child.safe_get("session")?;
    child.safe_get("db")?;

    child.delete();

    assert_eq!(journal.closed(), ["session"]);
    assert!(!root.is_closed());
    assert!(root.children().is_empty());
    assert!(root.is_built("db"));

    root.delete();
    assert_eq!(journal.closed(), ["session", "db"]);
    Ok(())
}

#[test]
fn test_unresolved_name() -> anyhow::Result<()> {
    let manager = app_request(Vec::new())?;
    let root = manager.root_context();

    assert!(matches!(
        root.safe_get("ghost"),
        Err(ContextError::Unresolved { .. })
    ));
    assert!(root.get("ghost").is_none());
    Ok(())
}

#[test]
fn test_instances_and_aliases() -> anyhow::Result<()> {
    let journal = Journal::new();
    let mut instances: HashMap<String, Item> = HashMap::new();
    instances.insert("port".to_string(), Arc::new(8080_u16));

    let aliases: AliasMap = [("database", "db"), ("listen", "port"), ("loop", "loop")]
        .into_iter()
        .collect();
    let manager = ContextManager::new(
        ["app", "request"],
        aliases,
        instances,
        vec![tracked_maker(&journal, "db", "app")],
    )?;
    let root = manager.root_context();
    let child = root.sub_context("request")?;

    assert_eq!(*child.get_as::<u16>("listen")?, 8080);
    assert!(Arc::ptr_eq(&root.safe_get("port")?, &child.safe_get("port")?));
    assert!(!child.is_built("port"));

    let via_alias = child.safe_get("database")?;
    assert!(Arc::ptr_eq(&via_alias, &root.safe_get("db")?));
    assert!(root.is_built("database"));

    assert!(matches!(
        root.safe_get("loop"),
        Err(ContextError::CircularAlias { .. })
    ));

    root.delete();
    assert_eq!(journal.closed(), ["db"]);
    Ok(())
}

#[test]
fn test_fill() -> anyhow::Result<()> {
    let mut instances: HashMap<String, Item> = HashMap::new();
    instances.insert("dsn".to_string(), Arc::new(String::from("postgres://localhost")));
    let manager = ContextManager::new(
        ["app"],
        AliasMap::new(),
        instances,
        Vec::<Arc<dyn Maker>>::new(),
    )?;
    let root = manager.root_context();

    let mut dsn = String::new();
    root.fill("dsn", &mut dsn)?;
    assert_eq!(dsn, "postgres://localhost");

    let mut port = 0_u16;
    assert!(matches!(
        root.fill("dsn", &mut port),
        Err(ContextError::TypeMismatch { .. })
    ));
    assert_eq!(port, 0);
    assert!(matches!(
        root.fill("missing", &mut port),
        Err(ContextError::Unresolved { .. })
    ));
    Ok(())
}

#[test]
fn test_build_can_request_ancestor_items() -> anyhow::Result<()> {
    let journal = Journal::new();
    let handler = FnMaker::new("handler", "request", |ctx: &dyn ItemResolver| {
        assert_eq!(ctx.scope(), "request");
        let db = ctx.get_as::<Resource>("db")?;
        Ok(Arc::new(format!("handler using {}", db.label)) as Item)
    })
    .shared();
    let manager = app_request(vec![tracked_maker(&journal, "db", "app"), handler])?;
    let root = manager.root_context();
    let child = root.sub_context("request")?;

    assert_eq!(*child.get_as::<String>("handler")?, "handler using db");
    assert!(root.is_built("db"));
    assert!(child.is_built("handler"));
    Ok(())
}

#[test]
fn test_build_error_is_reported() -> anyhow::Result<()> {
    let failing = FnMaker::new("broken", "app", |_| Err("connection refused".into())).shared();
    let manager = app_request(vec![failing])?;
    let root = manager.root_context();

    match root.safe_get("broken") {
        Err(ContextError::BuildFailure { name, source }) => {
            assert_eq!(name, "broken");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!root.is_built("broken"));
    Ok(())
}

#[test]
fn test_context_handles_compare_by_node() -> anyhow::Result<()> {
    let manager = app_request(Vec::new())?;
    let root = manager.root_context();
    let other_root: Context = manager.root_context();

    assert_eq!(root, root.clone());
    assert_ne!(root, other_root);
    assert_ne!(root.id(), other_root.id());
    Ok(())
}
