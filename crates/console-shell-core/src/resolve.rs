use serde::Serialize;

use crate::config::MenuDictionary;
use crate::menu::{MenuLayout, build_menus, supplement_path};
use crate::node::RawMenuNode;
use crate::permission::{PermissionSet, collect_permissions};
use crate::route::{RouteCatalog, RouteRecord, default_route_catalog, match_routes};
use crate::route_table::{RouteTable, StaticRoutes};

/// Everything derived from one raw menu tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub permissions: PermissionSet,
    pub menus: MenuLayout,
    pub matched_routes: Vec<RouteRecord>,
    pub routes: RouteTable,
}

/// Turns raw menu trees into menus, permissions, and an installable table.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    dictionary: MenuDictionary,
    catalog: RouteCatalog,
    statics: StaticRoutes,
}

impl Resolver {
    pub fn new(dictionary: MenuDictionary, catalog: RouteCatalog, statics: StaticRoutes) -> Self {
        Self {
            dictionary,
            catalog,
            statics,
        }
    }

    /// Resolver with the built-in catalog and static routes.
    pub fn with_dictionary(dictionary: MenuDictionary) -> Self {
        Self::new(dictionary, default_route_catalog(), StaticRoutes::default())
    }

    pub fn dictionary(&self) -> &MenuDictionary {
        &self.dictionary
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    pub fn statics(&self) -> &StaticRoutes {
        &self.statics
    }

    pub fn constant_table(&self) -> RouteTable {
        RouteTable::constant(&self.statics)
    }

    pub fn resolve(&self, source: &[RawMenuNode]) -> Resolution {
        let permissions = collect_permissions(source, &self.dictionary);
        let menus = MenuLayout::from_menus(supplement_path(build_menus(source, &self.dictionary)));
        let matched_routes = match_routes(source, &self.catalog, &self.dictionary);
        let routes = RouteTable::assemble(matched_routes.clone(), &self.statics);
        tracing::debug!(
            top_level_menus = menus.header.len(),
            permissions = permissions.len(),
            matched_routes = matched_routes.len(),
            "resolved menu tree"
        );
        Resolution {
            permissions,
            menus,
            matched_routes,
            routes,
        }
    }
}
