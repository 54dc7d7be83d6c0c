//! In-memory scene graph without a renderer behind it.
//!
//! Mirrors the parts of a retained-mode engine the selection layer relies
//! on: a node hierarchy with local transforms, movable objects with local
//! bounds and one listener slot each, named materials, and wireframe boxes.

use std::cell::RefCell;
use std::rc::Weak;

use glam::{Affine3A, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    NodeId, ObjectId, ObjectListener, SceneError, SceneGraph, Transform,
    WireBoxId,
};
use crate::bounds::Aabb;
use crate::picked::PickHandle;

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    objects: Vec<ObjectId>,
    wire_boxes: Vec<WireBoxId>,
    local: Transform,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            objects: Vec::new(),
            wire_boxes: Vec::new(),
            local: Transform::IDENTITY,
        }
    }
}

struct MovableObject {
    name: String,
    node: Option<NodeId>,
    local_bounds: Aabb,
    listener: Option<Weak<dyn ObjectListener>>,
    pick_handle: Option<PickHandle>,
}

struct WireBox {
    node: Option<NodeId>,
    half_extents: Vec3,
    material: String,
}

/// Snapshot of a wireframe box, for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct WireBoxView {
    /// Node the box is attached to, if any.
    pub node: Option<NodeId>,
    /// Half widths of the box around its node origin.
    pub half_extents: Vec3,
    /// Assigned material name.
    pub material: String,
}

struct SceneState {
    root: NodeId,
    nodes: FxHashMap<NodeId, Node>,
    objects: FxHashMap<ObjectId, MovableObject>,
    wire_boxes: FxHashMap<WireBoxId, WireBox>,
    materials: FxHashSet<String>,
    next_id: u64,
}

impl SceneState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn world_transform(&self, node: NodeId) -> Option<Affine3A> {
        let mut current = self.nodes.get(&node)?;
        let mut world = current.local.to_affine();
        while let Some(parent) = current.parent {
            current = self.nodes.get(&parent)?;
            world = current.local.to_affine() * world;
        }
        Some(world)
    }

    /// Node ids of the subtree rooted at `node`, including `node`.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(n.children.iter().copied());
            }
        }
        out
    }

    /// Listeners of every object attached in the subtree of `node`.
    fn subtree_listeners(&self, node: NodeId) -> Vec<(ObjectId, Listener)> {
        self.subtree(node)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .flat_map(|n| n.objects.iter().copied())
            .filter_map(|obj| self.listener_of(obj).map(|l| (obj, l)))
            .collect()
    }

    fn listener_of(&self, object: ObjectId) -> Option<Listener> {
        self.objects.get(&object)?.listener.clone()
    }

    fn detach_object(&mut self, object: ObjectId) {
        let Some(node) =
            self.objects.get_mut(&object).and_then(|o| o.node.take())
        else {
            return;
        };
        if let Some(n) = self.nodes.get_mut(&node) {
            n.objects.retain(|&o| o != object);
        }
    }

    fn require_material(&self, material: &str) -> Result<(), SceneError> {
        if self.materials.contains(material) {
            Ok(())
        } else {
            Err(SceneError::UnknownMaterial(material.to_owned()))
        }
    }
}

type Listener = Weak<dyn ObjectListener>;

fn notify_moved(listeners: Vec<(ObjectId, Listener)>) {
    for (object, listener) in listeners {
        if let Some(listener) = listener.upgrade() {
            listener.object_moved(object);
        }
    }
}

/// Headless scene graph implementing [`SceneGraph`].
pub struct Scene {
    state: RefCell<SceneState>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene holding only the root node and no materials.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = FxHashMap::default();
        let _ = nodes.insert(root, Node::new(None));
        Self {
            state: RefCell::new(SceneState {
                root,
                nodes,
                objects: FxHashMap::default(),
                wire_boxes: FxHashMap::default(),
                materials: FxHashSet::default(),
                next_id: 0,
            }),
        }
    }

    /// Create a scene with the given materials registered.
    #[must_use]
    pub fn with_materials<I, S>(materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scene = Self::new();
        for name in materials {
            scene.register_material(name);
        }
        scene
    }

    /// Make a material name available to wireframe boxes.
    pub fn register_material(&self, name: impl Into<String>) {
        let _ = self.state.borrow_mut().materials.insert(name.into());
    }

    /// Create a node under `parent`.
    pub fn create_node(&self, parent: NodeId) -> Result<NodeId, SceneError> {
        self.create_child_node(parent)
    }

    /// Replace a node's local transform. Every object in the node's subtree
    /// is notified as moved.
    pub fn set_transform(
        &self,
        node: NodeId,
        transform: Transform,
    ) -> Result<(), SceneError> {
        let listeners = {
            let mut state = self.state.borrow_mut();
            let n = state
                .nodes
                .get_mut(&node)
                .ok_or(SceneError::UnknownNode(node))?;
            n.local = transform;
            state.subtree_listeners(node)
        };
        notify_moved(listeners);
        Ok(())
    }

    /// Local transform of a node.
    #[must_use]
    pub fn transform(&self, node: NodeId) -> Option<Transform> {
        self.state.borrow().nodes.get(&node).map(|n| n.local)
    }

    /// World-space position of a node's origin.
    #[must_use]
    pub fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.state
            .borrow()
            .world_transform(node)
            .map(|t| Vec3::from(t.translation))
    }

    /// Parent of a node (`None` for the root and unknown nodes).
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    /// Create an unattached object with bounds in its node's local space.
    pub fn create_object(
        &self,
        name: impl Into<String>,
        local_bounds: Aabb,
    ) -> ObjectId {
        let mut state = self.state.borrow_mut();
        let id = ObjectId(state.next_id());
        let _ = state.objects.insert(
            id,
            MovableObject {
                name: name.into(),
                node: None,
                local_bounds,
                listener: None,
                pick_handle: None,
            },
        );
        id
    }

    /// Attach an object to a node, detaching it from its previous node.
    /// The object is notified as moved.
    pub fn attach_object(
        &self,
        node: NodeId,
        object: ObjectId,
    ) -> Result<(), SceneError> {
        let listener = {
            let mut state = self.state.borrow_mut();
            if !state.nodes.contains_key(&node) {
                return Err(SceneError::UnknownNode(node));
            }
            if !state.objects.contains_key(&object) {
                return Err(SceneError::UnknownObject(object));
            }
            state.detach_object(object);
            if let Some(o) = state.objects.get_mut(&object) {
                o.node = Some(node);
            }
            if let Some(n) = state.nodes.get_mut(&node) {
                n.objects.push(object);
            }
            state.listener_of(object)
        };
        notify_moved(listener.map(|l| (object, l)).into_iter().collect());
        Ok(())
    }

    /// Replace an object's local bounds. The object is notified as moved.
    pub fn set_local_bounds(
        &self,
        object: ObjectId,
        bounds: Aabb,
    ) -> Result<(), SceneError> {
        let listener = {
            let mut state = self.state.borrow_mut();
            let o = state
                .objects
                .get_mut(&object)
                .ok_or(SceneError::UnknownObject(object))?;
            o.local_bounds = bounds;
            o.listener.clone()
        };
        notify_moved(listener.map(|l| (object, l)).into_iter().collect());
        Ok(())
    }

    /// Destroy an object. Its listener, if any, is told after the object is
    /// gone. Returns `false` for unknown objects.
    pub fn destroy_object(&self, object: ObjectId) -> bool {
        let listener = {
            let mut state = self.state.borrow_mut();
            state.detach_object(object);
            match state.objects.remove(&object) {
                Some(o) => o.listener,
                None => return false,
            }
        };
        log::trace!("scene object {} destroyed", object.0);
        if let Some(listener) = listener.and_then(|l| l.upgrade()) {
            listener.object_destroyed(object);
        }
        true
    }

    /// Name given to an object at creation.
    #[must_use]
    pub fn object_name(&self, object: ObjectId) -> Option<String> {
        self.state
            .borrow()
            .objects
            .get(&object)
            .map(|o| o.name.clone())
    }

    /// Whether the object's listener slot is occupied by a live listener.
    #[must_use]
    pub fn has_listener(&self, object: ObjectId) -> bool {
        self.state
            .borrow()
            .listener_of(object)
            .is_some_and(|l| l.strong_count() > 0)
    }

    /// Pick handle the object is tagged with.
    #[must_use]
    pub fn pick_handle(&self, object: ObjectId) -> Option<PickHandle> {
        self.state
            .borrow()
            .objects
            .get(&object)
            .and_then(|o| o.pick_handle)
    }

    /// Snapshot of a wireframe box.
    #[must_use]
    pub fn wire_box(&self, wire_box: WireBoxId) -> Option<WireBoxView> {
        self.state
            .borrow()
            .wire_boxes
            .get(&wire_box)
            .map(|b| WireBoxView {
                node: b.node,
                half_extents: b.half_extents,
                material: b.material.clone(),
            })
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// Number of live wireframe boxes.
    #[must_use]
    pub fn wire_box_count(&self) -> usize {
        self.state.borrow().wire_boxes.len()
    }
}

impl SceneGraph for Scene {
    fn root_node(&self) -> NodeId {
        self.state.borrow().root
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn attached_objects(&self, node: NodeId) -> Vec<ObjectId> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.objects.clone())
            .unwrap_or_default()
    }

    fn contains_object(&self, object: ObjectId) -> bool {
        self.state.borrow().objects.contains_key(&object)
    }

    fn world_bounds(&self, object: ObjectId) -> Option<Aabb> {
        let state = self.state.borrow();
        let o = state.objects.get(&object)?;
        let world = state.world_transform(o.node?)?;
        Some(o.local_bounds.transformed(&world))
    }

    fn set_listener(
        &self,
        object: ObjectId,
        listener: Option<Weak<dyn ObjectListener>>,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(o) = state.objects.get_mut(&object) else {
            return false;
        };
        o.listener = listener;
        true
    }

    fn listener(&self, object: ObjectId) -> Option<Weak<dyn ObjectListener>> {
        self.state.borrow().listener_of(object)
    }

    fn set_pick_handle(
        &self,
        object: ObjectId,
        handle: Option<PickHandle>,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(o) = state.objects.get_mut(&object) else {
            return false;
        };
        o.pick_handle = handle;
        true
    }

    fn has_material(&self, name: &str) -> bool {
        self.state.borrow().materials.contains(name)
    }

    fn create_child_node(&self, parent: NodeId) -> Result<NodeId, SceneError> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = NodeId(state.next_id());
        let _ = state.nodes.insert(id, Node::new(Some(parent)));
        if let Some(p) = state.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    fn set_node_position(
        &self,
        node: NodeId,
        position: Vec3,
    ) -> Result<(), SceneError> {
        let current = self
            .transform(node)
            .ok_or(SceneError::UnknownNode(node))?;
        self.set_transform(
            node,
            Transform {
                translation: position,
                ..current
            },
        )
    }

    fn destroy_node(&self, node: NodeId) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if node == state.root {
                log::warn!("refusing to destroy the scene root node");
                return;
            }
            let listeners = state.subtree_listeners(node);
            let doomed = state.subtree(node);
            if let Some(parent) =
                state.nodes.get(&node).and_then(|n| n.parent)
            {
                if let Some(p) = state.nodes.get_mut(&parent) {
                    p.children.retain(|&c| c != node);
                }
            }
            for id in doomed {
                let Some(n) = state.nodes.remove(&id) else {
                    continue;
                };
                for obj in n.objects {
                    if let Some(o) = state.objects.get_mut(&obj) {
                        o.node = None;
                    }
                }
                for wb in n.wire_boxes {
                    if let Some(b) = state.wire_boxes.get_mut(&wb) {
                        b.node = None;
                    }
                }
            }
            listeners
        };
        // Detached objects lose their world bounds.
        notify_moved(listeners);
    }

    fn create_wire_box(
        &self,
        half_extents: Vec3,
        material: &str,
    ) -> Result<WireBoxId, SceneError> {
        let mut state = self.state.borrow_mut();
        state.require_material(material)?;
        let id = WireBoxId(state.next_id());
        let _ = state.wire_boxes.insert(
            id,
            WireBox {
                node: None,
                half_extents,
                material: material.to_owned(),
            },
        );
        Ok(id)
    }

    fn update_wire_box(
        &self,
        wire_box: WireBoxId,
        half_extents: Vec3,
        material: &str,
    ) -> Result<(), SceneError> {
        let mut state = self.state.borrow_mut();
        state.require_material(material)?;
        let b = state
            .wire_boxes
            .get_mut(&wire_box)
            .ok_or(SceneError::UnknownWireBox(wire_box))?;
        b.half_extents = half_extents;
        if b.material != material {
            material.clone_into(&mut b.material);
        }
        Ok(())
    }

    fn attach_wire_box(
        &self,
        node: NodeId,
        wire_box: WireBoxId,
    ) -> Result<(), SceneError> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&node) {
            return Err(SceneError::UnknownNode(node));
        }
        let previous = state
            .wire_boxes
            .get_mut(&wire_box)
            .ok_or(SceneError::UnknownWireBox(wire_box))?
            .node
            .replace(node);
        if let Some(prev) = previous.and_then(|p| state.nodes.get_mut(&p)) {
            prev.wire_boxes.retain(|&b| b != wire_box);
        }
        if let Some(n) = state.nodes.get_mut(&node) {
            n.wire_boxes.push(wire_box);
        }
        Ok(())
    }

    fn destroy_wire_box(&self, wire_box: WireBoxId) {
        let mut state = self.state.borrow_mut();
        let Some(b) = state.wire_boxes.remove(&wire_box) else {
            return;
        };
        if let Some(n) = b.node.and_then(|node| state.nodes.get_mut(&node)) {
            n.wire_boxes.retain(|&id| id != wire_box);
        }
    }
}
