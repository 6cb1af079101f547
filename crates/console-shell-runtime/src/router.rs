use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use console_shell_core::RouteTable;

use crate::collaborators::{NavigationMode, RouterRuntime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub location: String,
    pub mode: NavigationMode,
}

/// Router holding the active table behind a swappable `Arc`.
///
/// Installing a table replaces the pointer in one write, so a concurrent
/// `resolve` sees either the old table or the new one, never a mix.
pub struct MemoryRouter {
    table: RwLock<Arc<RouteTable>>,
    installs: AtomicUsize,
    history: Mutex<Vec<HistoryEntry>>,
}

impl MemoryRouter {
    pub fn new(initial: RouteTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(initial)),
            installs: AtomicUsize::new(0),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RouterRuntime for MemoryRouter {
    fn install_routes(&self, table: RouteTable) {
        let table = Arc::new(table);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
        self.installs.fetch_add(1, Ordering::SeqCst);
    }

    fn current_table(&self) -> Arc<RouteTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current_location(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|entry| entry.location.clone())
    }

    async fn navigate(&self, location: &str, mode: NavigationMode) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = HistoryEntry {
            location: location.to_string(),
            mode,
        };
        match mode {
            NavigationMode::Replace if !history.is_empty() => {
                if let Some(last) = history.last_mut() {
                    *last = entry;
                }
            }
            _ => history.push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_shell_core::{RouteRecord, StaticRoutes};

    #[test]
    fn install_swaps_the_whole_table() {
        let statics = StaticRoutes::default();
        let router = MemoryRouter::new(RouteTable::constant(&statics));
        assert!(router.resolve("/dash").is_some_and(|route| route.name.as_deref() == Some("404")));

        let table =
            RouteTable::assemble(vec![RouteRecord::new("/dash", "dash", "views/dash")], &statics);
        router.install_routes(table.clone());
        router.install_routes(table);

        assert_eq!(router.install_count(), 2);
        assert_eq!(router.current_table().routes()[0].children.len(), 3);
        assert_eq!(
            router.resolve("/dash").and_then(|route| route.name),
            Some("dash".to_string())
        );
    }

    #[tokio::test]
    async fn replace_overwrites_current_entry() {
        let router = MemoryRouter::new(RouteTable::default());
        router.navigate("/index", NavigationMode::Replace).await;
        router.navigate("/log", NavigationMode::Push).await;
        router.navigate("/dash", NavigationMode::Replace).await;

        let locations = router
            .history()
            .into_iter()
            .map(|entry| entry.location)
            .collect::<Vec<_>>();
        assert_eq!(locations, vec!["/index", "/dash"]);
        assert_eq!(router.current_location().as_deref(), Some("/dash"));
    }
}
