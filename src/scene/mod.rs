//! Scene-graph boundary used by selection handlers.
//!
//! Handlers never own scene objects. They read world bounds, attach a
//! single [`ObjectListener`] per tracked object, tag objects with their pick
//! handle, and create the positioning nodes and wireframe boxes used for
//! highlights. Everything goes through the [`SceneGraph`] trait so a real
//! renderer can back it; [`Scene`] is the headless implementation used by
//! tests, benches and the demo.
//!
//! All methods take `&self`. Implementations keep their state behind
//! interior mutability and must release it before delivering listener
//! callbacks, so listeners can call straight back into the scene.

mod headless;
mod transform;

use std::fmt;
use std::rc::Weak;

use glam::Vec3;
pub use headless::{Scene, WireBoxView};
use serde::{Deserialize, Serialize};
pub use transform::Transform;

use crate::bounds::Aabb;
use crate::picked::PickHandle;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Identifier of a positioning node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct NodeId(pub u64);

/// Identifier of a renderable (movable) object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct ObjectId(pub u64);

/// Identifier of a wireframe bounding box.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct WireBoxId(pub u64);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a scene-graph implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The node does not exist.
    UnknownNode(NodeId),
    /// The object does not exist.
    UnknownObject(ObjectId),
    /// The wireframe box does not exist.
    UnknownWireBox(WireBoxId),
    /// No material with this name is registered.
    UnknownMaterial(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown scene node {}", id.0),
            Self::UnknownObject(id) => {
                write!(f, "unknown scene object {}", id.0)
            }
            Self::UnknownWireBox(id) => {
                write!(f, "unknown wire box {}", id.0)
            }
            Self::UnknownMaterial(name) => {
                write!(f, "unknown material '{name}'")
            }
        }
    }
}

impl std::error::Error for SceneError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Receives lifecycle notifications for objects it is attached to.
///
/// Called synchronously from the scene mutation that caused them.
pub trait ObjectListener {
    /// The object's world transform or bounds changed.
    fn object_moved(&self, object: ObjectId);
    /// The object was destroyed. Its id is no longer valid when this runs.
    fn object_destroyed(&self, object: ObjectId);
}

/// The subset of a scene graph that selection handlers talk to.
pub trait SceneGraph {
    /// Root of the node hierarchy.
    fn root_node(&self) -> NodeId;

    /// Direct children of `node`. Empty for unknown nodes.
    fn child_nodes(&self, node: NodeId) -> Vec<NodeId>;

    /// Objects attached directly to `node`. Empty for unknown nodes.
    fn attached_objects(&self, node: NodeId) -> Vec<ObjectId>;

    /// Whether `object` currently exists.
    fn contains_object(&self, object: ObjectId) -> bool;

    /// World-space bounds of `object`, `None` if it does not exist or is
    /// not attached to a node.
    fn world_bounds(&self, object: ObjectId) -> Option<Aabb>;

    /// Replace the object's single listener slot. Returns `false` if the
    /// object does not exist.
    fn set_listener(
        &self,
        object: ObjectId,
        listener: Option<Weak<dyn ObjectListener>>,
    ) -> bool;

    /// The object's current listener slot.
    fn listener(&self, object: ObjectId) -> Option<Weak<dyn ObjectListener>>;

    /// Tag the object with the handle the picking pass should render it
    /// with. Returns `false` if the object does not exist.
    fn set_pick_handle(
        &self,
        object: ObjectId,
        handle: Option<PickHandle>,
    ) -> bool;

    /// Whether a material with this name can be assigned to boxes.
    fn has_material(&self, name: &str) -> bool;

    /// Create a positioning node under `parent`.
    fn create_child_node(&self, parent: NodeId) -> Result<NodeId, SceneError>;

    /// Set a node's position relative to its parent.
    fn set_node_position(
        &self,
        node: NodeId,
        position: Vec3,
    ) -> Result<(), SceneError>;

    /// Destroy a node and its child nodes. Attached objects and boxes are
    /// detached, not destroyed. Unknown nodes are ignored.
    fn destroy_node(&self, node: NodeId);

    /// Create a wireframe box centred on its node's origin.
    fn create_wire_box(
        &self,
        half_extents: Vec3,
        material: &str,
    ) -> Result<WireBoxId, SceneError>;

    /// Resize a wireframe box and reassign its material.
    fn update_wire_box(
        &self,
        wire_box: WireBoxId,
        half_extents: Vec3,
        material: &str,
    ) -> Result<(), SceneError>;

    /// Attach a wireframe box to a node, detaching it from any previous one.
    fn attach_wire_box(
        &self,
        node: NodeId,
        wire_box: WireBoxId,
    ) -> Result<(), SceneError>;

    /// Release a wireframe box. Unknown boxes are ignored.
    fn destroy_wire_box(&self, wire_box: WireBoxId);
}

/// Every object attached anywhere under `root`, depth first, parents before
/// children.
pub fn collect_objects(scene: &dyn SceneGraph, root: NodeId) -> Vec<ObjectId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.extend(scene.attached_objects(node));
        let mut children = scene.child_nodes(node);
        children.reverse();
        stack.extend(children);
    }
    out
}
