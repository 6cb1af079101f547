use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::route::{ComponentRef, RouteMeta, RouteRecord};

pub const LAYOUT_ROUTE_PATH: &str = "/";
pub const INDEX_ROUTE_NAME: &str = "index";
pub const LOGIN_ROUTE_NAME: &str = "login";
pub const REDIRECT_ROUTE_NAME: &str = "redirect";
pub const REFRESH_ROUTE_NAME: &str = "refresh";
pub const NOT_FOUND_ROUTE_NAME: &str = "404";
pub const CATCH_ALL_PATH: &str = "*";

const MAX_REDIRECTS: usize = 8;

/// Routes that exist regardless of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoutes {
    pub layout_component: ComponentRef,
    /// Route name the bare layout path redirects to.
    pub home_route: String,
    /// Rendered inside the layout, ahead of the permission-gated routes.
    pub in_layout: Vec<RouteRecord>,
    /// Rendered without the layout. Keep the catch-all last.
    pub out_of_layout: Vec<RouteRecord>,
}

impl Default for StaticRoutes {
    fn default() -> Self {
        Self {
            layout_component: ComponentRef::new("layout/header-aside"),
            home_route: INDEX_ROUTE_NAME.to_string(),
            in_layout: vec![
                RouteRecord::new("index", INDEX_ROUTE_NAME, "system/index")
                    .with_meta(RouteMeta::titled("Home").with_auth()),
                RouteRecord::new("log", "log", "system/log")
                    .with_meta(RouteMeta::titled("Frontend Log").with_auth()),
            ],
            out_of_layout: vec![
                RouteRecord::new("/refresh", REFRESH_ROUTE_NAME, "system/function/refresh")
                    .hidden(),
                RouteRecord::new(
                    "/redirect/:route*",
                    REDIRECT_ROUTE_NAME,
                    "system/function/redirect",
                )
                .hidden(),
                RouteRecord::new("/login", LOGIN_ROUTE_NAME, "system/login").hidden(),
                RouteRecord::new(CATCH_ALL_PATH, NOT_FOUND_ROUTE_NAME, "system/error/404").hidden(),
            ],
        }
    }
}

/// The full, ordered route table handed to the router in one piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable(Vec<RouteRecord>);

impl RouteTable {
    /// `[layout { base in-layout routes ++ dynamic }] ++ out-of-layout routes`.
    ///
    /// The layout wrapper is always present, even without dynamic routes.
    pub fn assemble(dynamic: Vec<RouteRecord>, statics: &StaticRoutes) -> Self {
        let mut children = statics.in_layout.clone();
        children.extend(dynamic);
        let layout = RouteRecord {
            path: LAYOUT_ROUTE_PATH.to_string(),
            component: Some(statics.layout_component.clone()),
            redirect: Some(statics.home_route.clone()),
            children,
            ..RouteRecord::default()
        };

        let mut routes = Vec::with_capacity(statics.out_of_layout.len() + 1);
        routes.push(layout);
        routes.extend(statics.out_of_layout.iter().cloned());
        Self(routes)
    }

    /// Table installed before any permission data is known.
    pub fn constant(statics: &StaticRoutes) -> Self {
        Self::assemble(Vec::new(), statics)
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.0
    }

    /// Every record with its absolute path, parents before children.
    pub fn flatten(&self) -> Vec<(String, &RouteRecord)> {
        fn visit<'a>(
            records: &'a [RouteRecord],
            parent: &str,
            out: &mut Vec<(String, &'a RouteRecord)>,
        ) {
            for record in records {
                let path = join_path(parent, &record.path);
                out.push((path.clone(), record));
                visit(&record.children, &path, out);
            }
        }

        let mut out = Vec::new();
        visit(&self.0, "", &mut out);
        out
    }

    /// Absolute path of the first record carrying `name`.
    pub fn path_of(&self, name: &str) -> Option<String> {
        self.flatten()
            .into_iter()
            .find(|(_, record)| record.name.as_deref() == Some(name))
            .map(|(path, _)| path)
    }

    /// Matches `location` (path plus optional query and hash) against the table.
    ///
    /// Children are tried before their parent, records in table order.
    /// Redirects by name are followed, keeping the requested query.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch> {
        let mut location = Location::parse(location);
        for _ in 0..=MAX_REDIRECTS {
            let (chain, params) = self
                .0
                .iter()
                .find_map(|record| match_record(record, "", &location.path))?;
            let leaf = chain.last()?;
            if let Some(target) = leaf
                .redirect
                .as_deref()
                .and_then(|name| self.path_of(name))
            {
                location.path = target;
                continue;
            }

            return Some(RouteMatch {
                name: leaf.name.clone(),
                full_path: location.full_path(),
                path: location.path,
                query: location.query,
                params,
                matched: chain.into_iter().cloned().collect(),
            });
        }
        None
    }
}

fn match_record<'a>(
    record: &'a RouteRecord,
    parent: &str,
    path: &str,
) -> Option<(Vec<&'a RouteRecord>, BTreeMap<String, String>)> {
    let full = join_path(parent, &record.path);
    for child in &record.children {
        if let Some((mut chain, params)) = match_record(child, &full, path) {
            chain.insert(0, record);
            return Some((chain, params));
        }
    }
    match_pattern(&full, path).map(|params| (vec![record], params))
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() || child.starts_with('/') || child == CATCH_ALL_PATH {
        child.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Static segments, `:param`, the `:param*` tail, and the `*` catch-all.
fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    let segments = path.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();
    if pattern == CATCH_ALL_PATH {
        params.insert("pathMatch".to_string(), path.to_string());
        return Some(params);
    }

    let pattern_segments = pattern
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    for (index, expected) in pattern_segments.iter().enumerate() {
        if *expected == CATCH_ALL_PATH {
            let rest = segments.get(index..).unwrap_or_default();
            params.insert("pathMatch".to_string(), rest.join("/"));
            return Some(params);
        }
        if let Some(name) = expected.strip_prefix(':') {
            if let Some(name) = name.strip_suffix('*') {
                let rest = segments.get(index..).unwrap_or_default();
                params.insert(name.to_string(), rest.join("/"));
                return Some(params);
            }
            let actual = segments.get(index)?;
            params.insert(name.to_string(), decode_component(actual));
            continue;
        }
        if segments.get(index)? != expected {
            return None;
        }
    }

    (segments.len() == pattern_segments.len()).then_some(params)
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// A navigation target split into path, query, and hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub hash: String,
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let (rest, hash) = raw.split_once('#').unwrap_or((raw, ""));
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        let path = if path.is_empty() { LAYOUT_ROUTE_PATH } else { path };
        Self {
            path: path.to_string(),
            query,
            hash: hash.to_string(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn full_path(&self) -> String {
        let mut full = self.path.clone();
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            full.push('?');
            full.push_str(&query);
        }
        if !self.hash.is_empty() {
            full.push('#');
            full.push_str(&self.hash);
        }
        full
    }
}

/// Result of resolving a location against the installed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: Option<String>,
    pub path: String,
    pub full_path: String,
    pub query: Vec<(String, String)>,
    pub params: BTreeMap<String, String>,
    /// Outermost record first, the matched leaf last.
    pub matched: Vec<RouteRecord>,
}

impl RouteMatch {
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|record| record.meta.auth)
    }

    pub fn title(&self) -> Option<&str> {
        self.matched.last().and_then(|record| record.meta.title.as_deref())
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }
}
