//! Pure resolution of the console's server-supplied menu tree.
//!
//! One raw tree yields three independent views: the UI menu tree, the flat
//! permission set, and the subset of the route catalog the session may reach.
//! Nothing here performs I/O; see `console-shell-runtime` for the stateful
//! store, router, and navigation guard built on top.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod menu;
pub mod node;
pub mod permission;
pub mod resolve;
pub mod route;
pub mod route_table;
mod tree;

pub use config::{ConfigError, MenuDictionary, ShellConfig};
pub use menu::{MenuLayout, UiMenuNode, build_menus, supplement_path, unique_menu_path};
pub use node::{NodeKind, RawMenuNode};
pub use permission::{PermissionNeed, PermissionSet, collect_permissions};
pub use resolve::{Resolution, Resolver};
pub use route::{
    ComponentRef, RouteCatalog, RouteMeta, RouteRecord, collect_menu_urls, default_route_catalog,
    match_routes,
};
pub use route_table::{Location, RouteMatch, RouteTable, StaticRoutes};
