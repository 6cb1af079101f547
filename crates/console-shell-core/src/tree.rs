//! Explicit-stack folds shared by the raw and UI menu trees.
//!
//! Menu trees have no depth bound, so none of these walk the tree on the
//! call stack.

struct Level<'a, S, T> {
    rest: std::slice::Iter<'a, S>,
    built: Vec<T>,
    parent: Option<T>,
}

/// Maps a forest bottom-up, keeping source order.
///
/// `map` returns the output node for a source node, or `None` to prune it
/// together with its subtree, plus the source children to descend into.
/// `attach` hands a finished child sequence to its parent.
pub(crate) fn rebuild<'a, S, T>(
    roots: &'a [S],
    mut map: impl FnMut(&'a S) -> Option<(T, Option<&'a [S]>)>,
    mut attach: impl FnMut(&mut T, Vec<T>),
) -> Vec<T> {
    let mut levels = vec![Level {
        rest: roots.iter(),
        built: Vec::new(),
        parent: None,
    }];
    loop {
        let next = match levels.last_mut() {
            Some(level) => level.rest.next(),
            None => return Vec::new(),
        };

        if let Some(source) = next {
            let Some((node, children)) = map(source) else {
                continue;
            };
            match children {
                Some(children) => levels.push(Level {
                    rest: children.iter(),
                    built: Vec::new(),
                    parent: Some(node),
                }),
                None => {
                    if let Some(level) = levels.last_mut() {
                        level.built.push(node);
                    }
                }
            }
            continue;
        }

        let Some(done) = levels.pop() else {
            return Vec::new();
        };
        // Only the root level has no parent.
        let Some(mut parent) = done.parent else {
            return done.built;
        };
        attach(&mut parent, done.built);
        if let Some(level) = levels.last_mut() {
            level.built.push(parent);
        }
    }
}

/// Pulls every descendant out of `children` so dropping a deep tree never
/// recurses. `take` detaches a node's own children.
pub(crate) fn dismantle<T>(
    children: Option<Vec<T>>,
    mut take: impl FnMut(&mut T) -> Option<Vec<T>>,
) {
    let mut pending = children.unwrap_or_default();
    while let Some(mut node) = pending.pop() {
        if let Some(grandchildren) = take(&mut node) {
            pending.extend(grandchildren);
        }
    }
}
