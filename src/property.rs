//! Property tree shown in the selection panel.
//!
//! Selection handlers describe picked targets as a tree of named, typed
//! values under a caller-supplied parent. The tree is an arena keyed by
//! [`PropertyId`]; removing a node removes its whole subtree. The panel
//! reads it through [`PropertyTree::to_json`], the same JSON bridge the
//! options panel uses.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SelectionError;

/// Identifier of a node in a [`PropertyTree`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct PropertyId(pub u64);

/// Value held by a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Grouping node without a value of its own.
    Category,
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Free text.
    Text(String),
    /// 3D vector (position, scale, ...).
    Vector(Vec3),
    /// Orientation.
    Quaternion(Quat),
    /// Linear RGBA colour.
    Color([f32; 4]),
}

/// One node of the property tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Display name.
    pub name: String,
    /// Current value.
    pub value: PropertyValue,
    /// Tooltip text.
    pub description: String,
    /// Whether the panel may edit the value.
    pub read_only: bool,
    parent: Option<PropertyId>,
    children: Vec<PropertyId>,
}

impl Property {
    /// Parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<PropertyId> {
        self.parent
    }

    /// Child nodes in insertion order.
    #[must_use]
    pub fn children(&self) -> &[PropertyId] {
        &self.children
    }
}

/// Arena-backed property tree with a single root category.
#[derive(Debug)]
pub struct PropertyTree {
    root: PropertyId,
    nodes: FxHashMap<PropertyId, Property>,
    next_id: u64,
}

impl Default for PropertyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyTree {
    /// Create a tree holding only the root category.
    #[must_use]
    pub fn new() -> Self {
        let root = PropertyId(0);
        let mut nodes = FxHashMap::default();
        let _ = nodes.insert(
            root,
            Property {
                name: String::new(),
                value: PropertyValue::Category,
                description: String::new(),
                read_only: true,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            root,
            nodes,
            next_id: 0,
        }
    }

    /// The root category.
    #[must_use]
    pub fn root(&self) -> PropertyId {
        self.root
    }

    /// Add a read-only property under `parent`.
    pub fn add(
        &mut self,
        parent: PropertyId,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Result<PropertyId, SelectionError> {
        self.add_with(parent, name, value, "", true)
    }

    /// Add a grouping category under `parent`.
    pub fn add_category(
        &mut self,
        parent: PropertyId,
        name: impl Into<String>,
    ) -> Result<PropertyId, SelectionError> {
        self.add(parent, name, PropertyValue::Category)
    }

    /// Add a property with full control over description and editability.
    pub fn add_with(
        &mut self,
        parent: PropertyId,
        name: impl Into<String>,
        value: PropertyValue,
        description: impl Into<String>,
        read_only: bool,
    ) -> Result<PropertyId, SelectionError> {
        self.next_id += 1;
        let id = PropertyId(self.next_id);
        self.nodes
            .get_mut(&parent)
            .ok_or(SelectionError::MissingProperty(parent))?
            .children
            .push(id);
        let _ = self.nodes.insert(
            id,
            Property {
                name: name.into(),
                value,
                description: description.into(),
                read_only,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Look up a node.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&Property> {
        self.nodes.get(&id)
    }

    /// Current value of a node.
    #[must_use]
    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.nodes.get(&id).map(|p| &p.value)
    }

    /// Replace a node's value. Returns `false` for unknown ids.
    pub fn set_value(&mut self, id: PropertyId, value: PropertyValue) -> bool {
        match self.nodes.get_mut(&id) {
            Some(p) => {
                p.value = value;
                true
            }
            None => false,
        }
    }

    /// First child of `parent` with the given name.
    #[must_use]
    pub fn find_child(
        &self,
        parent: PropertyId,
        name: &str,
    ) -> Option<PropertyId> {
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).is_some_and(|p| p.name == name))
    }

    /// Remove a node and its subtree. The root and unknown ids are left
    /// alone. Returns the number of nodes removed.
    pub fn remove(&mut self, id: PropertyId) -> usize {
        if id == self.root {
            return 0;
        }
        let Some(parent) = self.nodes.get(&id).and_then(|p| p.parent) else {
            return 0;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|&c| c != id);
        }
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                removed += 1;
                stack.extend(node.children);
            }
        }
        removed
    }

    /// Whether the id refers to a live node.
    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Serialize the subtree under `id` for the UI bridge.
    #[must_use]
    pub fn to_json(&self, id: PropertyId) -> Value {
        let Some(node) = self.nodes.get(&id) else {
            return Value::Null;
        };
        let children: Vec<Value> =
            node.children.iter().map(|&c| self.to_json(c)).collect();
        json!({
            "name": node.name,
            "description": node.description,
            "read_only": node.read_only,
            "value": node.value,
            "children": children,
        })
    }
}
