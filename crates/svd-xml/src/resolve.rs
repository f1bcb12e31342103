//! Tree rewriting passes applied before typed decoding.
//!
//! [`resolve_derived`] materializes `derivedFrom` references between siblings
//! and [`propagate_properties`] pushes the register property group from the
//! device down to peripherals, registers and fields. Both passes only ever add
//! children that are missing; an element's own definitions always win.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::tree::{NodeId, Tree};

/// Attribute naming the prototype sibling of an element.
pub const DERIVED_FROM: &str = "derivedFrom";

/// Tags of the SVD `registerPropertiesGroup`.
pub const REGISTER_PROPERTIES: &[&str] = &["size", "access", "protection", "resetValue", "resetMask"];

/// Properties a field inherits from its register.
pub const FIELD_PROPERTIES: &[&str] = &["access"];

/// One level of the property cascade: the container holding the elements
/// that receive `properties` from the container's owner.
#[derive(Debug, Clone, Copy)]
struct Level {
    container: &'static str,
    properties: &'static [&'static str],
}

const CASCADE: &[Level] = &[
    Level {
        container: "peripherals",
        properties: REGISTER_PROPERTIES,
    },
    Level {
        container: "registers",
        properties: REGISTER_PROPERTIES,
    },
    Level {
        container: "fields",
        properties: FIELD_PROPERTIES,
    },
];

/// Recoverable condition reported while resolving a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `derivedFrom` reference named no sibling. The element was left as is.
    UnresolvedPrototype { path: String, prototype: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedPrototype { path, prototype } => {
                write!(f, "{path}: prototype not found: {prototype}")
            }
        }
    }
}

/// Run both passes in order: sibling prototypes across the whole tree first,
/// then the top-down property cascade.
pub fn resolve(tree: &mut Tree) -> Vec<Diagnostic> {
    let diagnostics = resolve_derived(tree);
    propagate_properties(tree);
    diagnostics
}

/// Resolve every `derivedFrom` attribute in the tree.
pub fn resolve_derived(tree: &mut Tree) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    resolve_all_scopes(tree, &mut diagnostics);
    diagnostics
}

/// Visit every scope in post-order, children in document order, so that a
/// scope is merged only after all of its descendants are resolved.
fn resolve_all_scopes(tree: &mut Tree, diagnostics: &mut Vec<Diagnostic>) {
    let mut pending = vec![(tree.root(), false)];
    while let Some((node, expanded)) = pending.pop() {
        if expanded {
            resolve_siblings(tree, node, diagnostics);
            continue;
        }
        pending.push((node, true));
        pending.extend(tree.children(node).iter().rev().map(|&child| (child, false)));
    }
}

/// Merge prototypes among the direct children of `parent`.
fn resolve_siblings(tree: &mut Tree, parent: NodeId, diagnostics: &mut Vec<Diagnostic>) {
    let children = tree.children(parent).to_vec();
    for &child in &children {
        let Some(prototype_name) = tree.attribute(child, DERIVED_FROM).map(str::to_owned) else {
            continue;
        };
        let prototype = children
            .iter()
            .copied()
            .find(|&sibling| tree.label(sibling) == Some(prototype_name.as_str()));
        match prototype {
            Some(prototype) => {
                let copied = copy_missing_children(tree, prototype, child);
                debug!(
                    element = %tree.path(child),
                    prototype = %prototype_name,
                    copied,
                    "resolved derivedFrom"
                );
            }
            None => {
                let path = tree.path(child);
                warn!(element = %path, prototype = %prototype_name, "prototype not found");
                diagnostics.push(Diagnostic::UnresolvedPrototype {
                    path,
                    prototype: prototype_name,
                });
            }
        }
    }
}

/// Append a copy of every child of `prototype` whose tag `target` does not
/// define yet. Only the first element of a tag repeated in the prototype is
/// copied.
fn copy_missing_children(tree: &mut Tree, prototype: NodeId, target: NodeId) -> usize {
    let mut present: HashSet<String> = tree
        .children(target)
        .iter()
        .map(|&child| tree.name(child).to_owned())
        .collect();
    let candidates = tree.children(prototype).to_vec();
    let mut copied = 0;
    for candidate in candidates {
        if present.contains(tree.name(candidate)) {
            continue;
        }
        tree.copy_subtree(candidate, target);
        present.insert(tree.name(candidate).to_owned());
        copied += 1;
    }
    copied
}

/// Cascade the register property group from the device root down to fields.
pub fn propagate_properties(tree: &mut Tree) {
    cascade(tree, tree.root(), CASCADE);
}

fn cascade(tree: &mut Tree, owner: NodeId, levels: &[Level]) {
    let Some((level, rest)) = levels.split_first() else {
        return;
    };
    let Some(container) = tree.child(owner, level.container) else {
        return;
    };
    let properties: Vec<NodeId> = level
        .properties
        .iter()
        .filter_map(|property| tree.child(owner, property))
        .collect();
    debug!(
        owner = %tree.path(owner),
        container = level.container,
        properties = properties.len(),
        "propagate properties"
    );

    let elements = tree.children(container).to_vec();
    for element in elements {
        for &property in &properties {
            if !tree.has_child(element, tree.name(property)) {
                tree.copy_subtree(property, element);
            }
        }
        cascade(tree, element, rest);
    }
}
