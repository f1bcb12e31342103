//! Typed decoding of a resolved SVD tree.
//!
//! An [`Element`] is a cursor into a [`Tree`]. Entities implement [`FromNode`]
//! and pull their members out of the element with four queries:
//!
//! - [`Element::required`]: the named child must exist;
//! - [`Element::optional`]: the named child may be absent;
//! - [`Element::list`]: every child of a named container element;
//! - [`Element::all`]: every direct child carrying a tag name.

use std::str::FromStr;

use svd_xml::{NodeId, Tree};

use crate::scalar::{
    parse_bool, Access, BitRange, Identifier, ScalarError, ScaledNonNegativeInteger,
};
use crate::SvdError;

/// Conversion from a tree element into a typed value.
pub trait FromNode: Sized {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError>;
}

/// Borrowed position inside a [`Tree`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Element<'t> {
    pub fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Cursor at the document's top-level element.
    pub fn root(tree: &'t Tree) -> Self {
        Self::new(tree, tree.root())
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn name(&self) -> &'t str {
        self.tree.name(self.id)
    }

    /// Location of the element for diagnostics.
    pub fn path(&self) -> String {
        self.tree.path(self.id)
    }

    /// First child named `key`.
    pub fn child(&self, key: &str) -> Option<Element<'t>> {
        self.tree.child(self.id, key).map(|id| Self::new(self.tree, id))
    }

    /// Character data of a leaf element. Elements with attributes or children
    /// are rejected.
    pub fn scalar(&self) -> Result<&'t str, SvdError> {
        let node = self.tree.node(self.id);
        if !node.attributes.is_empty() || !self.tree.children(self.id).is_empty() {
            return Err(SvdError::ExpectedScalar { path: self.path() });
        }
        Ok(node.text.as_str())
    }

    /// Parse the element's character data with `T`'s validating parser.
    pub fn parse<T>(&self) -> Result<T, SvdError>
    where
        T: FromStr<Err = ScalarError>,
    {
        let value = self.scalar()?;
        value.parse().map_err(|source| SvdError::Conversion {
            path: self.path(),
            value: value.to_string(),
            source,
        })
    }

    /// Decode the child named `key`; absence is [`SvdError::MissingElement`].
    pub fn required<T: FromNode>(&self, key: &str) -> Result<T, SvdError> {
        let child = self.child(key).ok_or_else(|| SvdError::MissingElement {
            parent: self.path(),
            key: key.to_string(),
        })?;
        T::from_node(child)
    }

    /// Decode the child named `key` if present.
    pub fn optional<T: FromNode>(&self, key: &str) -> Result<Option<T>, SvdError> {
        self.child(key).map(T::from_node).transpose()
    }

    /// Decode every child of the container named `container`. A missing or
    /// empty container yields an empty list.
    pub fn list<T: FromNode>(&self, container: &str) -> Result<Vec<T>, SvdError> {
        let Some(container) = self.child(container) else {
            return Ok(Vec::new());
        };
        self.tree
            .children(container.id)
            .iter()
            .map(|&id| T::from_node(Self::new(self.tree, id)))
            .collect()
    }

    /// Decode every direct child named `tag`.
    pub fn all<T: FromNode>(&self, tag: &str) -> Result<Vec<T>, SvdError> {
        self.tree
            .children_named(self.id, tag)
            .map(|id| T::from_node(Self::new(self.tree, id)))
            .collect()
    }

    /// Parse the attribute `key` if present.
    pub fn attribute<T>(&self, key: &str) -> Result<Option<T>, SvdError>
    where
        T: FromStr<Err = ScalarError>,
    {
        let Some(value) = self.tree.attribute(self.id, key) else {
            return Ok(None);
        };
        value.parse().map(Some).map_err(|source| SvdError::Conversion {
            path: format!("{}@{key}", self.path()),
            value: value.to_string(),
            source,
        })
    }
}

impl FromNode for String {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        element.scalar().map(str::to_owned)
    }
}

impl FromNode for bool {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        let value = element.scalar()?;
        parse_bool(value).map_err(|source| SvdError::Conversion {
            path: element.path(),
            value: value.to_string(),
            source,
        })
    }
}

impl FromNode for u32 {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        let scaled: ScaledNonNegativeInteger = element.parse()?;
        u32::try_from(scaled.value()).map_err(|_| SvdError::Conversion {
            path: element.path(),
            value: scaled.to_string(),
            source: ScalarError::Overflow {
                base: scaled.base(),
                shift: scaled.shift(),
            },
        })
    }
}

macro_rules! from_node_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromNode for $ty {
                fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
                    element.parse()
                }
            }
        )*
    };
}

from_node_via_parse!(ScaledNonNegativeInteger, BitRange, Access, Identifier);
