#![allow(clippy::expect_used)]

use std::thread;

use console_shell_core::menu::walk_menus;
use console_shell_core::{MenuDictionary, RawMenuNode, Resolver, UiMenuNode};

const DEPTH: usize = 20_000;
const SMALL_STACK: usize = 2 * 1024 * 1024;

fn node(menu_type: &str, name: &str, permission: &str) -> RawMenuNode {
    RawMenuNode {
        menu_type: menu_type.to_string(),
        is_show: "1".to_string(),
        menu_name: name.to_string(),
        menu_icon: String::new(),
        menu_url: String::new(),
        permission: permission.to_string(),
        child_list: None,
    }
}

/// A single chain of visible menus ending in one button.
fn menu_chain(depth: usize) -> Vec<RawMenuNode> {
    let mut tail = vec![node("2", "", "deep:view")];
    for level in (0..depth).rev() {
        let mut menu = node("1", &format!("Level {level}"), "");
        menu.child_list = Some(tail);
        tail = vec![menu];
    }
    tail
}

fn menu_depth(menus: &[UiMenuNode]) -> usize {
    let mut depth = 0;
    let mut level = menus;
    while let Some(menu) = level.first() {
        depth += 1;
        level = menu.children.as_deref().unwrap_or_default();
    }
    depth
}

fn on_small_stack<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(SMALL_STACK)
        .spawn(work)
        .expect("spawn resolver thread")
        .join()
        .expect("resolver thread finished")
}

#[test]
fn resolves_a_very_deep_menu_chain_on_a_small_stack() {
    let (header, aside, has_permission, visited) = on_small_stack(|| {
        let tree = menu_chain(DEPTH);
        let resolution = Resolver::with_dictionary(MenuDictionary::default()).resolve(&tree);

        let mut visited = 0;
        walk_menus(&resolution.menus.header, |menu| {
            assert!(!menu.path.is_empty());
            visited += 1;
        });
        let copy = tree.clone();
        drop(copy);
        (
            menu_depth(&resolution.menus.header),
            menu_depth(&resolution.menus.aside),
            resolution.permissions.contains("deep:view"),
            visited,
        )
    });

    assert_eq!(header, DEPTH);
    assert_eq!(aside, DEPTH - 1);
    assert_eq!(visited, DEPTH);
    assert!(has_permission);
}
