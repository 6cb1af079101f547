use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::MenuDictionary;
use crate::node::RawMenuNode;
use crate::tree;

pub const MENU_EMPTY_PATH_PREFIX: &str = "console-menu-empty-";

static MENU_EMPTY_PATH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Menu entry as rendered by the header, aside, and search surfaces.
///
/// `Clone` and `Drop` walk the tree with an explicit stack, so a node may
/// nest arbitrarily deep.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMenuNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<UiMenuNode>>,
}

impl UiMenuNode {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: String::new(),
            path: path.into(),
            children: None,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<UiMenuNode>) -> Self {
        self.children = Some(children);
        self
    }

    fn shallow_copy(&self) -> Self {
        Self::new(self.title.clone(), self.path.clone()).with_icon(self.icon.clone())
    }
}

impl Clone for UiMenuNode {
    fn clone(&self) -> Self {
        tree::rebuild(
            std::slice::from_ref(self),
            |node| Some((node.shallow_copy(), node.children.as_deref())),
            |parent: &mut UiMenuNode, children| parent.children = Some(children),
        )
        .into_iter()
        .next()
        .unwrap_or_default()
    }
}

impl Drop for UiMenuNode {
    fn drop(&mut self) {
        tree::dismantle(self.children.take(), |node| node.children.take());
    }
}

/// Next placeholder path. Ids come from a process-wide counter, so they never
/// repeat within a session.
pub fn unique_menu_path() -> String {
    let id = MENU_EMPTY_PATH_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{MENU_EMPTY_PATH_PREFIX}{id}")
}

/// Gives every node without a path a unique placeholder. Ids are handed out
/// in document order.
pub fn supplement_path(mut menus: Vec<UiMenuNode>) -> Vec<UiMenuNode> {
    let mut pending: Vec<&mut UiMenuNode> = menus.iter_mut().rev().collect();
    while let Some(menu) = pending.pop() {
        if menu.path.is_empty() {
            menu.path = unique_menu_path();
        }
        if let Some(children) = menu.children.as_mut() {
            pending.extend(children.iter_mut().rev());
        }
    }
    menus
}

/// Builds the navigable menu tree.
///
/// A node survives only if it is a visible menu with a name. Anything else is
/// pruned together with its whole subtree. Children are kept only when at
/// least one direct child is a menu. Paths are not normalized here, see
/// [`supplement_path`].
pub fn build_menus(source: &[RawMenuNode], dictionary: &MenuDictionary) -> Vec<UiMenuNode> {
    tree::rebuild(
        source,
        |node| {
            is_effective_menu(node, dictionary).then(|| {
                let menu = UiMenuNode::new(node.menu_name.clone(), node.menu_url.clone())
                    .with_icon(node.menu_icon.clone());
                let children = dictionary
                    .has_effective_children(node)
                    .then(|| node.children());
                (menu, children)
            })
        },
        |parent: &mut UiMenuNode, children| parent.children = Some(children),
    )
}

fn is_effective_menu(node: &RawMenuNode, dictionary: &MenuDictionary) -> bool {
    dictionary.is_menu(node) && dictionary.is_visible(node) && !node.menu_name.is_empty()
}

/// Header and aside menus derived from one built tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLayout {
    pub header: Vec<UiMenuNode>,
    pub aside: Vec<UiMenuNode>,
}

impl MenuLayout {
    /// The aside shows the children of the first top-level group. With no
    /// top-level node, or a first node without children, it falls back to the
    /// header sequence.
    pub fn from_menus(menus: Vec<UiMenuNode>) -> Self {
        let aside = menus
            .first()
            .and_then(|first| first.children.clone())
            .unwrap_or_else(|| menus.clone());
        Self {
            header: menus,
            aside,
        }
    }
}

/// Visits every node depth-first, parents before children.
pub fn walk_menus<'a>(menus: &'a [UiMenuNode], mut visit: impl FnMut(&'a UiMenuNode)) {
    let mut pending: Vec<&'a UiMenuNode> = menus.iter().rev().collect();
    while let Some(menu) = pending.pop() {
        visit(menu);
        if let Some(children) = &menu.children {
            pending.extend(children.iter().rev());
        }
    }
}
