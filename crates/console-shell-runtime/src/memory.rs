//! In-process collaborators for tests, fixtures, and the operator CLI.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use console_shell_core::{RawMenuNode, RouteMatch, RouteTable, UiMenuNode};
use serde::Serialize;

use crate::collaborators::{MenuSource, PagePool, SearchIndex, Session};
use crate::error::CollaboratorError;

/// Serves a fixed raw tree and counts fetches.
pub struct StaticMenuSource {
    response: RwLock<Result<Vec<RawMenuNode>, CollaboratorError>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticMenuSource {
    pub fn new(tree: Vec<RawMenuNode>) -> Self {
        Self {
            response: RwLock::new(Ok(tree)),
            latency: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            response: RwLock::new(Err(error)),
            latency: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn respond_with(&self, response: Result<Vec<RawMenuNode>, CollaboratorError>) {
        *self.response.write().unwrap_or_else(PoisonError::into_inner) = response;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MenuSource for StaticMenuSource {
    async fn fetch_menus(&self) -> Result<Vec<RawMenuNode>, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Session with an optional token. Authenticated while a token is held.
#[derive(Default)]
pub struct MemorySession {
    token: RwLock<Option<String>>,
}

impl MemorySession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl Session for MemorySession {
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedPage {
    pub name: String,
    pub full_path: String,
    pub title: Option<String>,
}

#[derive(Default)]
struct PagePoolState {
    pool: HashSet<String>,
    opened: Vec<OpenedPage>,
}

/// Tab pool keyed by route name.
pub struct MemoryPagePool {
    state: Mutex<PagePoolState>,
    unavailable: AtomicBool,
    inits: AtomicUsize,
}

impl Default for MemoryPagePool {
    fn default() -> Self {
        Self {
            state: Mutex::new(PagePoolState::default()),
            unavailable: AtomicBool::new(false),
            inits: AtomicUsize::new(0),
        }
    }
}

impl MemoryPagePool {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn pool(&self) -> HashSet<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pool
            .clone()
    }

    pub fn opened(&self) -> Vec<OpenedPage> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .opened
            .clone()
    }
}

#[async_trait]
impl PagePool for MemoryPagePool {
    fn init(&self, routes: &RouteTable) {
        let pool = routes
            .flatten()
            .into_iter()
            .filter(|(_, record)| !record.hidden)
            .filter_map(|(_, record)| record.name.clone())
            .collect();
        self.state.lock().unwrap_or_else(PoisonError::into_inner).pool = pool;
        self.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn open(&self, route: &RouteMatch) {
        let Some(name) = route.name.clone() else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.pool.contains(&name) {
            return;
        }
        let page = OpenedPage {
            name,
            full_path: route.full_path.clone(),
            title: route.title().map(str::to_string),
        };
        match state.opened.iter().position(|opened| opened.name == page.name) {
            Some(index) => state.opened[index] = page,
            None => state.opened.push(page),
        }
    }

    async fn opened_load(&self, filter: bool) {
        if !filter {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let PagePoolState { pool, opened } = &mut *state;
        opened.retain(|page| pool.contains(&page.name));
    }

    async fn wait_loaded(&self) -> Result<(), CollaboratorError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CollaboratorError::PagePool(
                "opened pages could not be restored".to_string(),
            ));
        }
        Ok(())
    }
}

/// One searchable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub path: String,
    pub title: String,
    /// Ancestor titles joined with `" / "`.
    pub full_title: String,
}

#[derive(Default)]
pub struct MemorySearchIndex {
    entries: RwLock<Vec<SearchEntry>>,
}

impl MemorySearchIndex {
    pub fn entries(&self) -> Vec<SearchEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn search(&self, needle: &str) -> Vec<SearchEntry> {
        let needle = needle.trim().to_lowercase();
        self.entries()
            .into_iter()
            .filter(|entry| entry.full_title.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Leaf entries in document order. Ancestor titles stay borrowed until a
/// leaf needs them, so a deep chain joins its prefix once.
fn flatten_search_entries(menus: &[UiMenuNode]) -> Vec<SearchEntry> {
    let mut entries = Vec::new();
    let mut ancestors: Vec<&str> = Vec::new();
    let mut pending: Vec<(&UiMenuNode, usize)> = menus.iter().rev().map(|menu| (menu, 0)).collect();
    while let Some((menu, depth)) = pending.pop() {
        ancestors.truncate(depth);
        match &menu.children {
            Some(children) => {
                ancestors.push(&menu.title);
                pending.extend(children.iter().rev().map(|child| (child, depth + 1)));
            }
            None => {
                let mut full_title = ancestors.join(" / ");
                if !full_title.is_empty() {
                    full_title.push_str(" / ");
                }
                full_title.push_str(&menu.title);
                entries.push(SearchEntry {
                    path: menu.path.clone(),
                    title: menu.title.clone(),
                    full_title,
                });
            }
        }
    }
    entries
}

impl SearchIndex for MemorySearchIndex {
    fn init(&self, menus: &[UiMenuNode]) {
        let entries = flatten_search_entries(menus);
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }
}
