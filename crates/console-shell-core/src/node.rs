use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::MenuDictionary;
use crate::tree;

/// One node of the menu tree returned by the menu service.
///
/// Every field is optional on the wire. Missing or `null` values decode to
/// empty strings so a malformed node is simply ineffective rather than an error.
/// Like [`crate::UiMenuNode`], cloning and dropping do not recurse.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMenuNode {
    #[serde(default, deserialize_with = "dictionary_code")]
    pub menu_type: String,
    #[serde(default, deserialize_with = "dictionary_code")]
    pub is_show: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub menu_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub menu_icon: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub menu_url: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub permission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_list: Option<Vec<RawMenuNode>>,
}

impl RawMenuNode {
    pub fn children(&self) -> &[RawMenuNode] {
        self.child_list.as_deref().unwrap_or_default()
    }

    /// Decodes a whole tree from JSON text without serde_json's nesting limit.
    /// Deeper levels continue on heap-allocated stack segments.
    pub fn parse_tree(raw: &str) -> Result<Vec<RawMenuNode>, serde_json::Error> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        deserializer.disable_recursion_limit();
        let tree = Vec::<RawMenuNode>::deserialize(serde_stacker::Deserializer::new(
            &mut deserializer,
        ))?;
        deserializer.end()?;
        Ok(tree)
    }

    fn shallow_copy(&self) -> Self {
        Self {
            menu_type: self.menu_type.clone(),
            is_show: self.is_show.clone(),
            menu_name: self.menu_name.clone(),
            menu_icon: self.menu_icon.clone(),
            menu_url: self.menu_url.clone(),
            permission: self.permission.clone(),
            child_list: None,
        }
    }
}

impl Clone for RawMenuNode {
    fn clone(&self) -> Self {
        tree::rebuild(
            std::slice::from_ref(self),
            |node| Some((node.shallow_copy(), node.child_list.as_deref())),
            |parent: &mut RawMenuNode, children| parent.child_list = Some(children),
        )
        .into_iter()
        .next()
        .unwrap_or_default()
    }
}

impl Drop for RawMenuNode {
    fn drop(&mut self) {
        tree::dismantle(self.child_list.take(), |node| node.child_list.take());
    }
}

/// Node kind after resolving `menuType` against the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Menu,
    Button,
    Other,
}

impl MenuDictionary {
    pub fn kind_of(&self, node: &RawMenuNode) -> NodeKind {
        let code = node.menu_type.trim();
        if code == self.menu_type_menu {
            NodeKind::Menu
        } else if code == self.menu_type_button {
            NodeKind::Button
        } else {
            NodeKind::Other
        }
    }

    pub fn is_menu(&self, node: &RawMenuNode) -> bool {
        self.kind_of(node) == NodeKind::Menu
    }

    pub fn is_button(&self, node: &RawMenuNode) -> bool {
        self.kind_of(node) == NodeKind::Button
    }

    pub fn is_visible(&self, node: &RawMenuNode) -> bool {
        node.is_show.trim() == self.visible_true
    }

    /// Buttons alone do not make a node navigable; at least one direct child
    /// must be a menu.
    pub fn has_effective_children(&self, node: &RawMenuNode) -> bool {
        node.children().iter().any(|child| self.is_menu(child))
    }
}

/// Accepts strings, numbers, and booleans, since dictionary columns are not
/// typed consistently across menu service versions.
fn dictionary_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        Some(Value::Bool(code)) => code.to_string(),
        Some(other) => other.to_string(),
    })
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
