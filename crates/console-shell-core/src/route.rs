use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::MenuDictionary;
use crate::node::RawMenuNode;

/// Identifier of the view module a route renders, e.g. `system/index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(pub String);

impl ComponentRef {
    pub fn new(view: impl Into<String>) -> Self {
        Self(view.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auth: bool,
}

impl RouteMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            auth: false,
        }
    }

    pub fn with_auth(mut self) -> Self {
        self.auth = true;
        self
    }
}

/// A path-to-view binding, declared ahead of time rather than derived from
/// server data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Name of the route to redirect to when this record itself is matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            component: Some(ComponentRef::new(view)),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Every route the menu service could unlock. Only entries whose path shows
/// up as a visible menu url are installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteCatalog(pub Vec<RouteRecord>);

impl RouteCatalog {
    pub fn entries(&self) -> &[RouteRecord] {
        &self.0
    }
}

pub fn default_route_catalog() -> RouteCatalog {
    RouteCatalog(vec![
        RouteRecord::new("/js/a/sys/empUser/index", "userManager", "management/user")
            .with_meta(RouteMeta::titled("User Management")),
        RouteRecord::new("/js/a/sys/office/index", "institution", "management/dept")
            .with_meta(RouteMeta::titled("Institution Management")),
        RouteRecord::new("/js/a/sys/company/list", "company", "management/dict")
            .with_meta(RouteMeta::titled("Company Management")),
        RouteRecord::new("/js/a/sys/post/list", "post", "management/post")
            .with_meta(RouteMeta::titled("Post Management")),
        RouteRecord::new("listData", "role", "management/role")
            .with_meta(RouteMeta::titled("Role Management")),
        RouteRecord::new("secAdmin", "secAdmin", "management/config")
            .with_meta(RouteMeta::titled("Secondary Administrators")),
    ])
}

/// Urls of every visible menu node, wherever it sits in the tree.
///
/// Traversal does not stop at hidden or malformed nodes, so a visible menu
/// below a hidden group still unlocks its route even though the menu tree
/// does not show it.
pub fn collect_menu_urls<'a>(
    source: &'a [RawMenuNode],
    dictionary: &MenuDictionary,
) -> HashSet<&'a str> {
    let mut urls = HashSet::new();
    let mut pending = source.iter().collect::<Vec<_>>();
    while let Some(node) = pending.pop() {
        pending.extend(node.children());
        if dictionary.is_menu(node) && dictionary.is_visible(node) && !node.menu_url.is_empty() {
            urls.insert(node.menu_url.as_str());
        }
    }
    urls
}

/// Catalog entries whose path exactly equals a visible menu url, in catalog order.
pub fn match_routes(
    source: &[RawMenuNode],
    catalog: &RouteCatalog,
    dictionary: &MenuDictionary,
) -> Vec<RouteRecord> {
    let urls = collect_menu_urls(source, dictionary);
    catalog
        .entries()
        .iter()
        .filter(|route| urls.contains(route.path.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<RawMenuNode> {
        serde_json::from_value(value).expect("raw tree")
    }

    fn catalog(paths: &[&str]) -> RouteCatalog {
        RouteCatalog(
            paths
                .iter()
                .map(|path| RouteRecord::new(*path, path.trim_start_matches('/'), "view"))
                .collect(),
        )
    }

    #[test]
    fn matches_in_catalog_order_by_exact_path() {
        let source = tree(json!([
            { "menuType": "1", "isShow": "1", "menuName": "B", "menuUrl": "/b" },
            { "menuType": "1", "isShow": "1", "menuName": "A", "menuUrl": "/a" },
            { "menuType": "1", "isShow": "1", "menuName": "C", "menuUrl": "/c/" }
        ]));
        let matched = match_routes(
            &source,
            &catalog(&["/a", "/b", "/c", "/d"]),
            &MenuDictionary::default(),
        );
        let paths = matched.iter().map(|route| route.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn hidden_menu_url_is_not_matched_but_descendants_are_visited() {
        let source = tree(json!([{
            "menuType": "1", "isShow": "0", "menuName": "Hidden", "menuUrl": "/hidden",
            "childList": [
                { "menuType": "2", "permission": "p", "menuUrl": "/button" },
                { "menuType": "1", "isShow": "1", "menuName": "Inner", "menuUrl": "/inner" }
            ]
        }]));
        let matched = match_routes(
            &source,
            &catalog(&["/hidden", "/inner", "/button"]),
            &MenuDictionary::default(),
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].path, "/inner");
    }

    #[test]
    fn default_catalog_contains_management_routes() {
        let catalog = default_route_catalog();
        assert_eq!(catalog.entries().len(), 6);
        assert!(
            catalog
                .entries()
                .iter()
                .all(|route| route.name.is_some() && route.component.is_some())
        );
    }

    #[test]
    fn catalog_parses_from_json() {
        let parsed: RouteCatalog = serde_json::from_value(json!([
            { "path": "/dash", "name": "dash", "component": "views/dash", "meta": { "title": "Dash", "auth": true } }
        ]))
        .expect("catalog");
        assert_eq!(parsed.entries()[0].meta, RouteMeta::titled("Dash").with_auth());
        assert!(!parsed.entries()[0].hidden);
    }
}
