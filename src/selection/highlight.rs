//! Highlight box registry.
//!
//! Each box is a positioning node under the scene root plus a wireframe box
//! attached to it, keyed by `(handle, sub_index)`. The node sits at the
//! centre of the bounds and the box carries their half extents.

use rustc_hash::FxHashMap;

use crate::bounds::Aabb;
use crate::error::SelectionError;
use crate::picked::BoxKey;
use crate::scene::{NodeId, SceneGraph, WireBoxId};

/// One highlight box owned by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightBox {
    /// Positioning node under the scene root.
    pub node: NodeId,
    /// Wireframe box attached to `node`.
    pub wire_box: WireBoxId,
    /// World bounds the box currently shows.
    pub bounds: Aabb,
    /// Material the box is drawn with.
    pub material: String,
}

/// Highlight boxes of one handler.
#[derive(Debug, Default)]
pub struct BoxRegistry {
    boxes: FxHashMap<BoxKey, HighlightBox>,
}

impl BoxRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the box for `key`, or move and restyle it if it exists.
    ///
    /// Bounds that cannot be drawn (null, infinite or NaN) leave the
    /// registry untouched. A failed creation leaves no scene resources
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Scene`] if the scene rejects the material
    /// or any node/box operation.
    pub fn create(
        &mut self,
        scene: &dyn SceneGraph,
        key: BoxKey,
        bounds: &Aabb,
        material: &str,
    ) -> Result<(), SelectionError> {
        if !bounds.is_drawable() {
            log::trace!("skipping highlight box {key:?}: bounds not drawable");
            return Ok(());
        }

        if let Some(entry) = self.boxes.get_mut(&key) {
            scene.update_wire_box(
                entry.wire_box,
                bounds.half_extents(),
                material,
            )?;
            scene.set_node_position(entry.node, bounds.center())?;
            entry.bounds = *bounds;
            if entry.material != material {
                material.clone_into(&mut entry.material);
            }
            return Ok(());
        }

        let node = scene.create_child_node(scene.root_node())?;
        let wire_box =
            match scene.create_wire_box(bounds.half_extents(), material) {
                Ok(wire_box) => wire_box,
                Err(e) => {
                    scene.destroy_node(node);
                    return Err(e.into());
                }
            };
        if let Err(e) = scene
            .set_node_position(node, bounds.center())
            .and_then(|()| scene.attach_wire_box(node, wire_box))
        {
            scene.destroy_wire_box(wire_box);
            scene.destroy_node(node);
            return Err(e.into());
        }

        let _ = self.boxes.insert(
            key,
            HighlightBox {
                node,
                wire_box,
                bounds: *bounds,
                material: material.to_owned(),
            },
        );
        log::debug!(
            "highlight box {}:{} created with '{material}'",
            key.handle,
            key.sub_index
        );
        Ok(())
    }

    /// Release the box for `key`. Returns `false` if there was none.
    pub fn destroy(&mut self, scene: &dyn SceneGraph, key: &BoxKey) -> bool {
        let Some(entry) = self.boxes.remove(key) else {
            return false;
        };
        release(scene, &entry);
        true
    }

    /// Release every box.
    pub fn clear(&mut self, scene: &dyn SceneGraph) {
        for (_, entry) in self.boxes.drain() {
            release(scene, &entry);
        }
    }

    /// The box for `key`.
    #[must_use]
    pub fn get(&self, key: &BoxKey) -> Option<&HighlightBox> {
        self.boxes.get(key)
    }

    /// Whether a box exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &BoxKey) -> bool {
        self.boxes.contains_key(key)
    }

    /// Keys of all boxes, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<BoxKey> {
        let mut keys: Vec<_> = self.boxes.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether there are no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

fn release(scene: &dyn SceneGraph, entry: &HighlightBox) {
    scene.destroy_wire_box(entry.wire_box);
    scene.destroy_node(entry.node);
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::picked::PickHandle;
    use crate::scene::Scene;

    fn key(sub: u64) -> BoxKey {
        BoxKey::new(PickHandle::from_raw(3).unwrap(), sub)
    }

    fn scene() -> Scene {
        Scene::with_materials(["red", "blue"])
    }

    #[test]
    fn create_places_node_at_bounds_centre() {
        let scene = scene();
        let mut boxes = BoxRegistry::new();
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0));
        boxes.create(&scene, key(0), &bounds, "red").unwrap();

        let entry = boxes.get(&key(0)).unwrap();
        assert_eq!(scene.world_position(entry.node), Some(bounds.center()));
        let view = scene.wire_box(entry.wire_box).unwrap();
        assert_eq!(view.node, Some(entry.node));
        assert_eq!(view.half_extents, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(view.material, "red");
        assert_eq!(scene.parent(entry.node), Some(scene.root_node()));
    }

    #[test]
    fn create_twice_updates_in_place() {
        let scene = scene();
        let mut boxes = BoxRegistry::new();
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(4.0), Vec3::splat(6.0));
        boxes.create(&scene, key(1), &a, "red").unwrap();
        let first = boxes.get(&key(1)).unwrap().clone();
        let nodes = scene.node_count();

        boxes.create(&scene, key(1), &b, "blue").unwrap();
        let second = boxes.get(&key(1)).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(scene.node_count(), nodes);
        assert_eq!(second.node, first.node);
        assert_eq!(second.material, "blue");
        assert_eq!(scene.world_position(second.node), Some(Vec3::splat(5.0)));
        assert_eq!(scene.wire_box(second.wire_box).unwrap().material, "blue");
    }

    #[test]
    fn undrawable_bounds_create_nothing() {
        let scene = scene();
        let mut boxes = BoxRegistry::new();
        boxes.create(&scene, key(0), &Aabb::NULL, "red").unwrap();
        let infinite = Aabb::new(Vec3::ZERO, Vec3::splat(f32::INFINITY));
        boxes.create(&scene, key(1), &infinite, "red").unwrap();
        assert!(boxes.is_empty());
        assert_eq!(scene.wire_box_count(), 0);
    }

    #[test]
    fn unknown_material_leaves_no_resources() {
        let scene = scene();
        let mut boxes = BoxRegistry::new();
        let nodes = scene.node_count();
        let unit = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let err = boxes.create(&scene, key(0), &unit, "green").unwrap_err();
        assert!(matches!(err, SelectionError::Scene(_)));
        assert!(boxes.is_empty());
        assert_eq!(scene.node_count(), nodes);
        assert_eq!(scene.wire_box_count(), 0);
    }

    #[test]
    fn destroy_releases_scene_resources() {
        let scene = scene();
        let mut boxes = BoxRegistry::new();
        let nodes = scene.node_count();
        for sub in 0..3 {
            let unit = Aabb::new(Vec3::ZERO, Vec3::ONE);
            boxes.create(&scene, key(sub), &unit, "red").unwrap();
        }
        assert_eq!(boxes.keys(), vec![key(0), key(1), key(2)]);

        assert!(boxes.destroy(&scene, &key(1)));
        assert!(!boxes.destroy(&scene, &key(1)));
        assert_eq!(scene.wire_box_count(), 2);

        boxes.clear(&scene);
        assert!(boxes.is_empty());
        assert_eq!(scene.wire_box_count(), 0);
        assert_eq!(scene.node_count(), nodes);
    }
}
