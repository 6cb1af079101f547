use std::sync::Arc;

use console_shell_core::route_table::LOGIN_ROUTE_NAME;
use console_shell_core::{Location, RouteMatch, ShellConfig};
use serde::Serialize;

use crate::collaborators::NavigationMode;
use crate::error::GuardError;
use crate::store::{LoadOptions, PermissionStore};

/// Paths that skip the token check.
pub const DEFAULT_ALLOW_LIST: [&str; 2] = ["/login", "/redirect"];

/// Session token value a broken cookie write leaves behind.
const PLACEHOLDER_TOKEN: &str = "undefined";

/// Guard redirects followed by `navigate` before giving up.
const MAX_GUARD_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "location")]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
    Deny,
}

/// Outcome of a full navigation: guard, history update, and after-hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub requested: String,
    pub decision: NavigationDecision,
    /// Location the router ended up on, if the navigation went through.
    pub location: Option<String>,
    pub route_name: Option<String>,
    pub document_title: Option<String>,
}

/// Gates every navigation on the permission load and the session token.
pub struct NavigationGuard {
    store: Arc<PermissionStore>,
    config: ShellConfig,
    allow_list: Vec<String>,
}

impl NavigationGuard {
    pub fn new(store: Arc<PermissionStore>, config: ShellConfig) -> Self {
        Self {
            store,
            config,
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|path| path.to_string()).collect(),
        }
    }

    pub fn with_allow_list<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn store(&self) -> &Arc<PermissionStore> {
        &self.store
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Exact match, or a sub-path of an allow-listed prefix.
    pub fn is_allow_listed(&self, path: &str) -> bool {
        self.allow_list.iter().any(|allowed| {
            path == allowed
                || path
                    .strip_prefix(allowed.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub async fn before_each(&self, to: &str) -> NavigationDecision {
        match self.evaluate(to).await {
            Ok(decision) => decision,
            Err(error) => {
                tracing::warn!(target_location = to, reason = %error, "navigation denied");
                NavigationDecision::Deny
            }
        }
    }

    /// Records the page and returns the document title to display.
    pub fn after_each(&self, route: &RouteMatch) -> String {
        self.store.services().page_pool.open(route);
        self.config.document_title(route.title())
    }

    /// Runs `to` through the guard, moves the router, and fires the after-hook.
    pub async fn navigate(&self, to: &str, mode: NavigationMode) -> Transition {
        let router = &self.store.services().router;
        let mut target = to.to_string();
        let mut mode = mode;
        let mut decision = NavigationDecision::Deny;

        for _ in 0..=MAX_GUARD_REDIRECTS {
            decision = self.before_each(&target).await;
            let NavigationDecision::Redirect(next) = &decision else {
                break;
            };
            tracing::debug!(from = %target, to = %next, "navigation redirected");
            target = next.clone();
            mode = NavigationMode::Replace;
        }

        let mut transition = Transition {
            requested: to.to_string(),
            decision: decision.clone(),
            location: None,
            route_name: None,
            document_title: None,
        };
        if decision != NavigationDecision::Allow {
            if matches!(decision, NavigationDecision::Redirect(_)) {
                tracing::warn!(requested = to, "navigation abandoned after repeated redirects");
            }
            return transition;
        }

        let Some(route) = router.resolve(&target) else {
            return transition;
        };
        // The first load already replaced the current entry with the target.
        let current = router
            .current_location()
            .and_then(|current| router.resolve(&current))
            .map(|current| current.full_path);
        if current.as_deref() != Some(route.full_path.as_str()) {
            router.navigate(&route.full_path, mode).await;
        }
        transition.document_title = Some(self.after_each(&route));
        transition.location = Some(route.full_path.clone());
        transition.route_name = route.name.clone();
        transition
    }

    async fn evaluate(&self, to: &str) -> Result<NavigationDecision, GuardError> {
        let services = self.store.services();
        services
            .page_pool
            .wait_loaded()
            .await
            .map_err(GuardError::PagePool)?;
        self.store.load(LoadOptions::navigate_to(to)).await?;

        let table = services.router.current_table();
        let Some(route) = table.resolve(to) else {
            return Ok(NavigationDecision::Allow);
        };
        if self.is_allow_listed(&route.path) || !route.requires_auth() {
            return Ok(NavigationDecision::Allow);
        }

        let token = services.session.token();
        if token
            .as_deref()
            .is_some_and(|token| !token.is_empty() && token != PLACEHOLDER_TOKEN)
        {
            return Ok(NavigationDecision::Allow);
        }

        let login = table
            .path_of(LOGIN_ROUTE_NAME)
            .unwrap_or_else(|| DEFAULT_ALLOW_LIST[0].to_string());
        let redirect = Location::parse(&login)
            .with_query("redirect", route.full_path.clone())
            .full_path();
        tracing::info!(requested = %route.full_path, "missing session token; redirecting to login");
        Ok(NavigationDecision::Redirect(redirect))
    }
}
