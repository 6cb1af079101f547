//! Session-scoped permission loading for the console shell.
//!
//! [`PermissionStore`] fetches the user's menu tree once per session, resolves
//! it through `console-shell-core`, and swaps the resulting route table into
//! the router. [`NavigationGuard`] runs that load ahead of every navigation
//! and enforces the session token on routes that require it.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod collaborators;
pub mod error;
pub mod guard;
pub mod memory;
pub mod router;
pub mod store;

pub use collaborators::{
    MenuSource, NavigationMode, PagePool, RouterRuntime, SearchIndex, Session, ShellServices,
};
pub use error::{CollaboratorError, GuardError, LoadError};
pub use guard::{DEFAULT_ALLOW_LIST, NavigationDecision, NavigationGuard, Transition};
pub use memory::{
    MemoryPagePool, MemorySearchIndex, MemorySession, OpenedPage, SearchEntry, StaticMenuSource,
};
pub use router::{HistoryEntry, MemoryRouter};
pub use store::{LoadOptions, LoadOutcome, LoadSummary, PermissionSnapshot, PermissionStore};
