use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::highlight::BoxRegistry;
use super::tracker::ObjectTracker;
use crate::bounds::Aabb;
use crate::context::DisplayContext;
use crate::error::SelectionError;
use crate::interaction::InteractiveObjectWeak;
use crate::picked::{BoxKey, PickHandle, Picked};
use crate::property::{PropertyId, PropertyTree};
use crate::scene::{collect_objects, NodeId, ObjectId, SceneGraph};

/// Shared, borrow-checked pointer to any selection handler.
pub type SelectionHandlerPtr = Rc<RefCell<dyn SelectionHandler>>;

/// Non-owning counterpart of [`SelectionHandlerPtr`].
pub type SelectionHandlerWeak = Weak<RefCell<dyn SelectionHandler>>;

/// Whoever hands out pick handles and routes picks to handlers. A handler
/// deregisters itself exactly once, when its core is dropped.
pub trait HandlerRegistry {
    /// Forget the handler registered under `handle`.
    fn remove_object(&self, handle: PickHandle);
}

/// State every selection handler owns: its handle, tracked objects,
/// highlight boxes, the properties it added and its interaction delegate.
///
/// Dropping the core detaches every listener, releases every box, removes
/// owned properties from the tree and deregisters the handle.
pub struct HandlerCore {
    handle: PickHandle,
    context: Rc<DisplayContext>,
    tracker: Rc<ObjectTracker>,
    boxes: BoxRegistry,
    properties: Vec<PropertyId>,
    interactive_object: Option<InteractiveObjectWeak>,
    registry: Weak<dyn HandlerRegistry>,
}

impl HandlerCore {
    pub(crate) fn new(
        handle: PickHandle,
        context: Rc<DisplayContext>,
        owner: SelectionHandlerWeak,
        registry: Weak<dyn HandlerRegistry>,
    ) -> Self {
        Self {
            handle,
            context,
            tracker: Rc::new(ObjectTracker::new(handle, owner)),
            boxes: BoxRegistry::new(),
            properties: Vec::new(),
            interactive_object: None,
            registry,
        }
    }

    /// The handle this handler answers to.
    #[must_use]
    pub fn handle(&self) -> PickHandle {
        self.handle
    }

    /// The display context the handler was built on.
    #[must_use]
    pub fn context(&self) -> &Rc<DisplayContext> {
        &self.context
    }

    /// Shortcut for the context's scene.
    #[must_use]
    pub fn scene(&self) -> &dyn SceneGraph {
        self.context.scene()
    }

    /// The lifecycle observer attached to tracked objects.
    #[must_use]
    pub fn tracker(&self) -> &Rc<ObjectTracker> {
        &self.tracker
    }

    /// Tracked objects in id order.
    #[must_use]
    pub fn tracked_objects(&self) -> Vec<ObjectId> {
        self.tracker.objects()
    }

    /// Whether `object` is tracked.
    #[must_use]
    pub fn is_tracked(&self, object: ObjectId) -> bool {
        self.tracker.contains(object)
    }

    /// Track one object. Returns `true` if it was newly tracked.
    pub fn track_object(&mut self, object: ObjectId) -> bool {
        self.tracker.track(self.context.scene(), object)
    }

    /// Track every object attached anywhere under `root`. Returns how many
    /// were newly tracked.
    pub fn track_subtree(&mut self, root: NodeId) -> usize {
        let scene = self.context.scene();
        collect_objects(scene, root)
            .into_iter()
            .filter(|&object| self.tracker.track(scene, object))
            .count()
    }

    /// Stop tracking `object` without touching the boxes. Returns `false`
    /// if it was not tracked.
    pub fn untrack_object(&mut self, object: ObjectId) -> bool {
        self.tracker.untrack(self.context.scene(), object)
    }

    /// Append the world bounds of every tracked object that has some.
    pub fn tracked_aabbs(&self, out: &mut Vec<Aabb>) {
        let scene = self.context.scene();
        out.extend(
            self.tracker
                .objects()
                .into_iter()
                .filter_map(|object| scene.world_bounds(object)),
        );
    }

    /// Create or update the highlight box for `key`.
    ///
    /// # Errors
    ///
    /// Propagates scene failures, e.g. an unknown material.
    pub fn create_box(
        &mut self,
        key: BoxKey,
        bounds: &Aabb,
        material: &str,
    ) -> Result<(), SelectionError> {
        self.boxes.create(self.context.scene(), key, bounds, material)
    }

    /// Release the highlight box for `key`. Returns `false` if none existed.
    pub fn destroy_box(&mut self, key: &BoxKey) -> bool {
        self.boxes.destroy(self.context.scene(), key)
    }

    /// The handler's highlight boxes.
    #[must_use]
    pub fn boxes(&self) -> &BoxRegistry {
        &self.boxes
    }

    /// Record a property the handler added so it is removed with the
    /// handler.
    pub fn push_property(&mut self, id: PropertyId) {
        self.properties.push(id);
    }

    /// Properties recorded with [`push_property`](Self::push_property).
    #[must_use]
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Remove every recorded property (and its children) from `tree`.
    /// Returns how many tree entries were removed.
    pub fn remove_properties(&mut self, tree: &mut PropertyTree) -> usize {
        self.properties.drain(..).map(|id| tree.remove(id)).sum()
    }
}

impl Drop for HandlerCore {
    fn drop(&mut self) {
        let scene = self.context.scene();
        self.tracker.detach_all(scene);
        self.boxes.clear(scene);

        if !self.properties.is_empty() {
            match self.context.property_tree().try_borrow_mut() {
                Ok(mut tree) => {
                    for id in self.properties.drain(..) {
                        let _ = tree.remove(id);
                    }
                }
                Err(_) => log::warn!(
                    "handler {}: property tree busy, {} properties leaked",
                    self.handle,
                    self.properties.len()
                ),
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.remove_object(self.handle);
        }
        log::debug!("selection handler {} destroyed", self.handle);
    }
}

/// A selection handler: the per-target object the selection manager routes
/// picks to.
///
/// Implementors embed a [`HandlerCore`] and expose it through
/// [`core`](Self::core) and [`core_mut`](Self::core_mut); everything else
/// has a default that can be overridden.
pub trait SelectionHandler {
    /// Shared handler state.
    fn core(&self) -> &HandlerCore;

    /// Shared handler state, mutably.
    fn core_mut(&mut self) -> &mut HandlerCore;

    /// The handle this handler answers to.
    fn handle(&self) -> PickHandle {
        self.core().handle()
    }

    /// Track every object attached under `root`, recursively.
    fn add_tracked_objects(&mut self, root: NodeId) -> usize {
        self.core_mut().track_subtree(root)
    }

    /// Track one object: attach the lifecycle observer and tag the object
    /// with this handler's pick handle.
    fn add_tracked_object(&mut self, object: ObjectId) -> bool {
        self.core_mut().track_object(object)
    }

    /// Stop tracking `object` and refresh the boxes to the remaining
    /// objects. Untracked objects are ignored.
    ///
    /// # Errors
    ///
    /// Propagates failures of
    /// [`update_tracked_boxes`](Self::update_tracked_boxes).
    fn remove_tracked_object(
        &mut self,
        object: ObjectId,
    ) -> Result<(), SelectionError> {
        if !self.core_mut().untrack_object(object) {
            return Ok(());
        }
        self.update_tracked_boxes()
    }

    /// Recompute every existing box from [`get_aabbs`](Self::get_aabbs),
    /// keeping its material. Boxes whose bounds merge to nothing drawable
    /// are released. No boxes are created.
    ///
    /// # Errors
    ///
    /// Propagates scene failures while moving a box.
    fn update_tracked_boxes(&mut self) -> Result<(), SelectionError> {
        let keys = self.core().boxes().keys();
        let mut aabbs = Vec::new();
        for key in keys {
            let Some(material) =
                self.core().boxes().get(&key).map(|b| b.material.clone())
            else {
                continue;
            };
            aabbs.clear();
            self.get_aabbs(&Picked::for_key(key), &mut aabbs);
            let merged = Aabb::merged(&aabbs);
            if merged.is_drawable() {
                self.core_mut().create_box(key, &merged, &material)?;
            } else {
                let _ = self.core_mut().destroy_box(&key);
            }
        }
        Ok(())
    }

    /// Add this handler's properties for `picked` under `parent`. Ids
    /// should be recorded with [`HandlerCore::push_property`].
    ///
    /// # Errors
    ///
    /// Implementations report property tree failures.
    fn create_properties(
        &mut self,
        _picked: &Picked,
        _tree: &mut PropertyTree,
        _parent: PropertyId,
    ) -> Result<(), SelectionError> {
        Ok(())
    }

    /// Remove the properties this handler added.
    fn destroy_properties(
        &mut self,
        _picked: &Picked,
        tree: &mut PropertyTree,
        _parent: PropertyId,
    ) {
        let _ = self.core_mut().remove_properties(tree);
    }

    /// Refresh property values from the live target.
    fn update_properties(&mut self, _tree: &mut PropertyTree) {}

    /// Whether pick pass `pass` (1-based beyond the first) is needed.
    fn needs_additional_render_pass(&self, _pass: u32) -> bool {
        false
    }

    /// Hook run before pick pass `pass`.
    fn pre_render_pass(&mut self, _pass: u32) {}

    /// Hook run after pick pass `pass`.
    fn post_render_pass(&mut self, _pass: u32) {}

    /// Append the world bounds describing `picked`. The default reports
    /// every tracked object that has bounds.
    fn get_aabbs(&self, _picked: &Picked, aabbs: &mut Vec<Aabb>) {
        self.core().tracked_aabbs(aabbs);
    }

    /// Called when `picked` joins the selection.
    fn on_select(&mut self, _picked: &Picked) {}

    /// Called when `picked` leaves the selection.
    fn on_deselect(&mut self, _picked: &Picked) {}

    /// Draw the whole-target box around `picked` with `material`. Returns
    /// `false` if there was nothing drawable to box.
    ///
    /// # Errors
    ///
    /// Propagates scene failures, e.g. an unknown material.
    fn highlight_picked(
        &mut self,
        picked: &Picked,
        material: &str,
    ) -> Result<bool, SelectionError> {
        let mut aabbs = Vec::new();
        self.get_aabbs(picked, &mut aabbs);
        let merged = Aabb::merged(&aabbs);
        if !merged.is_drawable() {
            return Ok(false);
        }
        self.core_mut()
            .create_box(BoxKey::whole(picked.handle), &merged, material)?;
        Ok(true)
    }

    /// Release the whole-target box of `picked`.
    fn clear_highlight(&mut self, picked: &Picked) -> bool {
        self.core_mut().destroy_box(&BoxKey::whole(picked.handle))
    }

    /// Store a non-owning reference to the interaction delegate, or clear
    /// it with `None`.
    fn set_interactive_object(
        &mut self,
        object: Option<InteractiveObjectWeak>,
    ) {
        self.core_mut().interactive_object = object;
    }

    /// The stored interaction delegate. May point at an object that has
    /// since been dropped.
    fn interactive_object(&self) -> Option<InteractiveObjectWeak> {
        self.core().interactive_object.clone()
    }
}

/// Handler with the default behaviour for every hook: it tracks objects
/// and boxes them, and adds no properties.
pub struct BasicSelectionHandler {
    core: HandlerCore,
}

impl BasicSelectionHandler {
    /// Wrap a core handed out by the selection manager.
    #[must_use]
    pub fn new(core: HandlerCore) -> Self {
        Self { core }
    }
}

impl SelectionHandler for BasicSelectionHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }
}
