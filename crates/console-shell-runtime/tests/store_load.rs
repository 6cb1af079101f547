#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use console_shell_core::{
    MenuDictionary, PermissionNeed, RawMenuNode, Resolver, RouteCatalog, RouteMeta, RouteRecord,
    StaticRoutes,
};
use console_shell_runtime::{
    CollaboratorError, LoadError, LoadOptions, LoadOutcome, LoadSummary, MemoryPagePool,
    MemoryRouter, MemorySearchIndex, MemorySession, PermissionStore, RouterRuntime,
    ShellServices, StaticMenuSource,
};
use serde_json::json;

struct Harness {
    store: Arc<PermissionStore>,
    source: Arc<StaticMenuSource>,
    router: Arc<MemoryRouter>,
    pages: Arc<MemoryPagePool>,
}

fn system_tree() -> Vec<RawMenuNode> {
    serde_json::from_value(json!([
        {
            "menuType": "1", "isShow": "1", "menuName": "System", "menuIcon": "cog",
            "childList": [
                {
                    "menuType": "1", "isShow": "1", "menuName": "Users", "menuUrl": "/users",
                    "childList": [
                        { "menuType": "2", "permission": "sys:user:view" },
                        { "menuType": "2", "permission": "sys:user:edit" }
                    ]
                },
                {
                    "menuType": "1", "isShow": "0", "menuName": "Audit", "menuUrl": "/audit",
                    "childList": [{ "menuType": "2", "permission": "sys:audit:view" }]
                }
            ]
        },
        { "menuType": "1", "isShow": "1", "menuName": "Reports", "menuUrl": "/reports" }
    ]))
    .expect("system tree")
}

fn catalog() -> RouteCatalog {
    RouteCatalog(vec![
        RouteRecord::new("/reports", "reports", "views/reports")
            .with_meta(RouteMeta::titled("Reports")),
        RouteRecord::new("/audit", "audit", "views/audit"),
        RouteRecord::new("/users", "users", "views/users").with_meta(RouteMeta::titled("Users")),
    ])
}

fn harness(session: MemorySession, source: StaticMenuSource) -> Harness {
    let resolver = Resolver::new(MenuDictionary::default(), catalog(), StaticRoutes::default());
    let source = Arc::new(source);
    let router = Arc::new(MemoryRouter::new(resolver.constant_table()));
    let pages = Arc::new(MemoryPagePool::default());
    let services = ShellServices {
        menu_source: source.clone(),
        session: Arc::new(session),
        router: router.clone(),
        page_pool: pages.clone(),
        search: Arc::new(MemorySearchIndex::default()),
    };
    Harness {
        store: Arc::new(PermissionStore::new(resolver, services)),
        source,
        router,
        pages,
    }
}

#[tokio::test]
async fn load_resolves_menus_permissions_and_routes_from_one_fetch() {
    let h = harness(MemorySession::signed_in("token"), StaticMenuSource::new(system_tree()));
    let outcome = h.store.load(LoadOptions::default()).await.expect("load");
    assert_eq!(
        outcome,
        LoadOutcome::Loaded(LoadSummary {
            menus: 2,
            permissions: 3,
            dynamic_routes: 2,
        })
    );

    let snapshot = h.store.snapshot();
    let header_titles = snapshot
        .menus
        .header
        .iter()
        .map(|menu| menu.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(header_titles, vec!["System", "Reports"]);
    let aside_titles = snapshot
        .menus
        .aside
        .iter()
        .map(|menu| menu.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(aside_titles, vec!["Users"]);

    // A hidden menu does not unlock its route.
    let table = h.router.current_table();
    assert_eq!(
        table.resolve("/reports").and_then(|route| route.name),
        Some("reports".to_string())
    );
    assert_eq!(
        table.resolve("/audit").and_then(|route| route.name),
        Some("404".to_string())
    );
    assert!(h.pages.pool().contains("users"));
    assert_eq!(h.source.fetch_count(), 1);
}

#[tokio::test]
async fn permission_queries_follow_all_and_any_semantics() {
    let h = harness(MemorySession::signed_in("token"), StaticMenuSource::new(system_tree()));
    h.store.load(LoadOptions::default()).await.expect("load");

    assert!(h.store.has("sys:audit:view", true));
    assert!(h.store.has(["sys:user:view", "sys:user:edit"], true));
    assert!(!h.store.has(["sys:user:view", "sys:user:delete"], true));
    assert!(h.store.has(["sys:user:view", "sys:user:delete"], false));
    assert!(h.store.has(PermissionNeed::Many(Vec::new()), true));
    assert!(!h.store.has(PermissionNeed::Many(Vec::new()), false));
}

#[tokio::test]
async fn repeated_loads_fetch_and_install_once() {
    let h = harness(MemorySession::signed_in("token"), StaticMenuSource::new(system_tree()));
    for _ in 0..3 {
        h.store.load(LoadOptions::default()).await.expect("load");
    }
    assert_eq!(h.source.fetch_count(), 1);
    assert_eq!(h.router.install_count(), 1);

    h.store.load(LoadOptions::forced()).await.expect("forced load");
    assert_eq!(h.source.fetch_count(), 2);
    assert_eq!(h.router.install_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_loads_share_a_single_fetch() {
    let h = harness(
        MemorySession::signed_in("token"),
        StaticMenuSource::new(system_tree()).with_latency(Duration::from_millis(25)),
    );

    let tasks = (0..8)
        .map(|_| {
            let store = Arc::clone(&h.store);
            tokio::spawn(async move { store.load(LoadOptions::default()).await })
        })
        .collect::<Vec<_>>();

    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.expect("join").expect("load"));
    }

    let loaded = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, LoadOutcome::Loaded(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|outcome| **outcome == LoadOutcome::AlreadyLoaded)
        .count();
    assert_eq!(loaded, 1);
    assert_eq!(skipped, outcomes.len() - 1);
    assert_eq!(h.source.fetch_count(), 1);
    assert_eq!(h.router.install_count(), 1);
    assert!(h.store.is_loaded());
}

#[tokio::test]
async fn failed_fetch_keeps_previous_table_and_unloaded_state() {
    let h = harness(
        MemorySession::signed_in("token"),
        StaticMenuSource::failing(CollaboratorError::Unauthenticated),
    );
    let before = h.router.current_table();

    let error = h
        .store
        .load(LoadOptions::navigate_to("/users"))
        .await
        .expect_err("fetch should fail");

    assert!(matches!(error, LoadError::Fetch(CollaboratorError::Unauthenticated)));
    assert!(!h.store.is_loaded());
    assert!(!h.store.has("sys:user:view", false));
    assert_eq!(h.router.current_table(), before);
    assert_eq!(h.router.install_count(), 0);
    assert!(h.router.history().is_empty());
}

#[tokio::test]
async fn anonymous_session_loads_supplied_tree_only() {
    let h = harness(MemorySession::anonymous(), StaticMenuSource::new(system_tree()));
    assert_eq!(
        h.store.load(LoadOptions::default()).await.expect("load"),
        LoadOutcome::SkippedUnauthenticated
    );

    let supplied = serde_json::from_value(json!([
        { "menuType": "1", "isShow": "1", "menuName": "Reports", "menuUrl": "/reports" }
    ]))
    .expect("supplied tree");
    let outcome = h
        .store
        .load(LoadOptions::with_data(supplied))
        .await
        .expect("load with data");

    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    assert_eq!(h.source.fetch_count(), 0);
    assert_eq!(h.store.snapshot().menus.header.len(), 1);
}
