use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::MenuDictionary;
use crate::node::RawMenuNode;

/// Flat capability strings granted to the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.0.insert(permission.into())
    }

    /// `all` requires every needed permission, otherwise one is enough. An
    /// empty need is vacuously satisfied by `all` and never by `one of`.
    pub fn has(&self, need: &PermissionNeed, all: bool) -> bool {
        let needed = need.as_slice();
        if all {
            needed.iter().all(|permission| self.contains(permission))
        } else {
            needed.iter().any(|permission| self.contains(permission))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The argument of a permission check: one permission or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionNeed {
    One(String),
    Many(Vec<String>),
}

impl PermissionNeed {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(permission) => std::slice::from_ref(permission),
            Self::Many(permissions) => permissions,
        }
    }
}

impl From<&str> for PermissionNeed {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for PermissionNeed {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for PermissionNeed {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl<const N: usize> From<[&str; N]> for PermissionNeed {
    fn from(value: [&str; N]) -> Self {
        Self::Many(value.iter().map(|permission| (*permission).to_string()).collect())
    }
}

/// Collects the permission of every button node in the tree.
///
/// Unlike menu building this ignores visibility and ancestor validity: a
/// button under a hidden or malformed menu still grants its permission.
pub fn collect_permissions(source: &[RawMenuNode], dictionary: &MenuDictionary) -> PermissionSet {
    let mut permissions = PermissionSet::new();
    let mut pending = source.iter().collect::<Vec<_>>();
    while let Some(node) = pending.pop() {
        if dictionary.is_button(node) && !node.permission.is_empty() {
            permissions.insert(node.permission.clone());
        }
        pending.extend(node.children());
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<RawMenuNode> {
        serde_json::from_value(value).expect("raw tree")
    }

    #[test]
    fn collects_buttons_at_any_depth_regardless_of_visibility() {
        let source = tree(json!([{
            "menuType": "1", "isShow": "0", "menuName": "",
            "childList": [
                { "menuType": "2", "permission": "sys:user:view" },
                {
                    "menuType": "3",
                    "childList": [{ "menuType": "2", "isShow": "0", "permission": "sys:user:edit" }]
                },
                { "menuType": "2", "permission": "" },
                { "menuType": "1", "permission": "not-a-button" }
            ]
        }]));
        let permissions = collect_permissions(&source, &MenuDictionary::default());
        assert_eq!(
            permissions,
            ["sys:user:view", "sys:user:edit"].into_iter().collect::<PermissionSet>()
        );
    }

    #[test]
    fn has_checks_all_or_one() {
        let permissions = ["a", "c"].into_iter().collect::<PermissionSet>();
        assert!(permissions.has(&PermissionNeed::from("a"), false));
        assert!(permissions.has(&PermissionNeed::from("a"), true));
        assert!(!permissions.has(&PermissionNeed::from(["a", "b"]), true));
        assert!(permissions.has(&PermissionNeed::from(["a", "b"]), false));
        assert!(!permissions.has(&PermissionNeed::from(["b", "d"]), false));
        assert!(permissions.has(&PermissionNeed::from(["a", "c"]), true));
    }

    #[test]
    fn empty_need_is_vacuous_for_all_only() {
        let permissions = ["a"].into_iter().collect::<PermissionSet>();
        let need = PermissionNeed::Many(Vec::new());
        assert!(permissions.has(&need, true));
        assert!(!permissions.has(&need, false));
    }

    #[test]
    fn need_deserializes_from_string_or_list() {
        let one: PermissionNeed = serde_json::from_value(json!("a")).expect("one");
        let many: PermissionNeed = serde_json::from_value(json!(["a", "b"])).expect("many");
        assert_eq!(one, PermissionNeed::One("a".to_string()));
        assert_eq!(many.as_slice().len(), 2);
    }
}
