use std::sync::{Arc, PoisonError, RwLock};

use console_shell_core::{
    Location, MenuLayout, PermissionNeed, PermissionSet, RawMenuNode, Resolution, Resolver,
    RouteTable,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::collaborators::{NavigationMode, ShellServices};
use crate::error::LoadError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reload even if this session already loaded its permissions.
    pub focus: bool,
    /// Location to replace the current one with once the new table is installed.
    pub to: Option<String>,
    /// Pre-supplied raw tree. Skips the fetch and the authentication check.
    pub data: Option<Vec<RawMenuNode>>,
}

impl LoadOptions {
    pub fn navigate_to(to: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn forced() -> Self {
        Self {
            focus: true,
            ..Self::default()
        }
    }

    pub fn with_data(data: Vec<RawMenuNode>) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub menus: usize,
    pub permissions: usize,
    pub dynamic_routes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum LoadOutcome {
    SkippedUnauthenticated,
    AlreadyLoaded,
    Loaded(LoadSummary),
}

/// Immutable view of the session's permission state.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshot {
    pub is_loaded: bool,
    pub permissions: Arc<PermissionSet>,
    pub menus: Arc<MenuLayout>,
    pub routes: Arc<RouteTable>,
}

/// Session-scoped permission state and the load transaction that fills it.
///
/// `load` is single-flight: concurrent callers queue on one async mutex and
/// re-check the loaded flag once they hold it, so a session fetches and
/// installs at most once unless a caller forces a reload.
pub struct PermissionStore {
    resolver: Resolver,
    services: ShellServices,
    state: RwLock<PermissionSnapshot>,
    load_flight: Mutex<()>,
}

impl PermissionStore {
    pub fn new(resolver: Resolver, services: ShellServices) -> Self {
        let state = PermissionSnapshot {
            routes: Arc::new(resolver.constant_table()),
            ..PermissionSnapshot::default()
        };
        Self {
            resolver,
            services,
            state: RwLock::new(state),
            load_flight: Mutex::new(()),
        }
    }

    pub fn services(&self) -> &ShellServices {
        &self.services
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn snapshot(&self) -> PermissionSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_loaded
    }

    pub fn has(&self, need: impl Into<PermissionNeed>, all: bool) -> bool {
        let need = need.into();
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .permissions
            .has(&need, all)
    }

    pub async fn load(&self, options: LoadOptions) -> Result<LoadOutcome, LoadError> {
        let LoadOptions { focus, to, data } = options;
        if data.is_none() && !self.services.session.is_authenticated() {
            tracing::debug!("permission load skipped: session not authenticated");
            return Ok(LoadOutcome::SkippedUnauthenticated);
        }

        let flight = self.load_flight.lock().await;
        if !focus && self.is_loaded() {
            tracing::debug!("permission load skipped: already loaded");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let source = match data {
            Some(data) => data,
            None => self.services.menu_source.fetch_menus().await.map_err(|error| {
                tracing::warn!(reason = %error, "menu fetch failed; permission state unchanged");
                LoadError::Fetch(error)
            })?,
        };

        let summary = self.commit(self.resolver.resolve(&source)).await;
        drop(flight);

        // Released first: the router may re-enter the guard, which calls load again.
        if let Some(to) = to.filter(|to| !to.is_empty()) {
            let location = self
                .services
                .router
                .resolve(&to)
                .map_or_else(|| Location::parse(&to).full_path(), |route| route.full_path);
            self.services.router.navigate(&location, NavigationMode::Replace).await;
        }
        Ok(LoadOutcome::Loaded(summary))
    }

    /// Logs the session out of its permission state and reinstalls the
    /// permission-free table.
    pub async fn reset(&self) {
        let _flight = self.load_flight.lock().await;
        let routes = self.resolver.constant_table();
        self.services.router.install_routes(routes.clone());
        self.services.page_pool.init(&routes);
        self.services.page_pool.opened_load(true).await;
        self.services.search.init(&[]);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = PermissionSnapshot {
            routes: Arc::new(routes),
            ..PermissionSnapshot::default()
        };
        tracing::info!("permission state reset");
    }

    async fn commit(&self, resolution: Resolution) -> LoadSummary {
        let Resolution {
            permissions,
            menus,
            matched_routes,
            routes,
        } = resolution;
        let summary = LoadSummary {
            menus: menus.header.len(),
            permissions: permissions.len(),
            dynamic_routes: matched_routes.len(),
        };

        self.services.router.install_routes(routes.clone());
        let snapshot = PermissionSnapshot {
            is_loaded: true,
            permissions: Arc::new(permissions),
            menus: Arc::new(menus),
            routes: Arc::new(routes),
        };
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();

        self.services.page_pool.init(&snapshot.routes);
        self.services.page_pool.opened_load(true).await;
        self.services.search.init(&snapshot.menus.header);

        tracing::info!(
            menus = summary.menus,
            permissions = summary.permissions,
            dynamic_routes = summary.dynamic_routes,
            "permission routes installed"
        );
        summary
    }
}
