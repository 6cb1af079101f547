use std::sync::Arc;

use async_trait::async_trait;
use console_shell_core::{RawMenuNode, RouteMatch, RouteTable, UiMenuNode};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Fetches the current user's raw menu tree.
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menus(&self) -> Result<Vec<RawMenuNode>, CollaboratorError>;
}

pub trait Session: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    Push,
    Replace,
}

/// The live router. Tables are swapped whole, never patched.
#[async_trait]
pub trait RouterRuntime: Send + Sync {
    fn install_routes(&self, table: RouteTable);
    fn current_table(&self) -> Arc<RouteTable>;
    /// Full path of the current history entry, if any navigation happened.
    fn current_location(&self) -> Option<String>;
    fn resolve(&self, location: &str) -> Option<RouteMatch> {
        self.current_table().resolve(location)
    }
    /// Navigation failures are the router's concern and are not reported back.
    async fn navigate(&self, location: &str, mode: NavigationMode);
}

/// Multi-tab page bookkeeping.
#[async_trait]
pub trait PagePool: Send + Sync {
    fn init(&self, routes: &RouteTable);
    fn open(&self, route: &RouteMatch);
    /// Recomputes the open tabs; with `filter` set, tabs whose route is no
    /// longer installed are dropped.
    async fn opened_load(&self, filter: bool);
    async fn wait_loaded(&self) -> Result<(), CollaboratorError>;
}

pub trait SearchIndex: Send + Sync {
    fn init(&self, menus: &[UiMenuNode]);
}

/// Collaborators the permission store and guard talk to.
#[derive(Clone)]
pub struct ShellServices {
    pub menu_source: Arc<dyn MenuSource>,
    pub session: Arc<dyn Session>,
    pub router: Arc<dyn RouterRuntime>,
    pub page_pool: Arc<dyn PagePool>,
    pub search: Arc<dyn SearchIndex>,
}
