use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::handler::SelectionHandlerWeak;
use crate::picked::PickHandle;
use crate::scene::{ObjectId, ObjectListener, SceneGraph};

/// The per-handler lifecycle observer.
///
/// Owns the set of tracked objects and sits in each tracked object's
/// listener slot. Move notifications refresh the owning handler's boxes;
/// destroy notifications drop the object from tracking.
pub struct ObjectTracker {
    handle: PickHandle,
    tracked: RefCell<BTreeSet<ObjectId>>,
    owner: SelectionHandlerWeak,
}

impl ObjectTracker {
    pub(crate) fn new(
        handle: PickHandle,
        owner: SelectionHandlerWeak,
    ) -> Self {
        Self {
            handle,
            tracked: RefCell::new(BTreeSet::new()),
            owner,
        }
    }

    /// Whether `object` is tracked.
    #[must_use]
    pub fn contains(&self, object: ObjectId) -> bool {
        self.tracked.borrow().contains(&object)
    }

    /// Tracked objects in id order.
    #[must_use]
    pub fn objects(&self) -> Vec<ObjectId> {
        self.tracked.borrow().iter().copied().collect()
    }

    /// Whether `object`'s listener slot points at this tracker.
    fn holds_slot(&self, scene: &dyn SceneGraph, object: ObjectId) -> bool {
        let this = std::ptr::from_ref(self);
        scene
            .listener(object)
            .is_some_and(|l| std::ptr::addr_eq(l.as_ptr(), this))
    }

    /// Start tracking `object`: take its listener slot and tag it with the
    /// handle. Re-tracking refreshes both. Returns `true` if the object was
    /// not tracked before, `false` if it is unknown or another live
    /// listener already holds its slot.
    pub(crate) fn track(
        self: &Rc<Self>,
        scene: &dyn SceneGraph,
        object: ObjectId,
    ) -> bool {
        if !scene.contains_object(object) {
            log::debug!(
                "handler {}: ignoring unknown object {}",
                self.handle,
                object.0
            );
            return false;
        }
        let this = Rc::as_ptr(self);
        let taken = scene.listener(object).is_some_and(|l| {
            l.strong_count() > 0 && !std::ptr::addr_eq(l.as_ptr(), this)
        });
        if taken {
            log::warn!(
                "handler {}: object {} is observed by another handler",
                self.handle,
                object.0
            );
            return false;
        }
        let inserted = self.tracked.borrow_mut().insert(object);
        let listener: Rc<dyn ObjectListener> = self.clone();
        let _ = scene.set_listener(object, Some(Rc::downgrade(&listener)));
        let _ = scene.set_pick_handle(object, Some(self.handle));
        inserted
    }

    /// Stop tracking `object` and clear its listener and handle if the slot
    /// is still ours. Returns `false` if it was not tracked.
    pub(crate) fn untrack(
        &self,
        scene: &dyn SceneGraph,
        object: ObjectId,
    ) -> bool {
        let removed = self.tracked.borrow_mut().remove(&object);
        if removed {
            self.release(scene, object);
        }
        removed
    }

    /// Release every tracked object.
    pub(crate) fn detach_all(&self, scene: &dyn SceneGraph) {
        let objects = std::mem::take(&mut *self.tracked.borrow_mut());
        for object in objects {
            self.release(scene, object);
        }
    }

    fn release(&self, scene: &dyn SceneGraph, object: ObjectId) {
        if !self.holds_slot(scene, object) {
            return;
        }
        let _ = scene.set_listener(object, None);
        let _ = scene.set_pick_handle(object, None);
    }
}

impl ObjectListener for ObjectTracker {
    fn object_moved(&self, object: ObjectId) {
        if !self.contains(object) {
            return;
        }
        let Some(owner) = self.owner.upgrade() else {
            return;
        };
        let Ok(mut handler) = owner.try_borrow_mut() else {
            log::debug!(
                "handler {} busy, skipping box refresh for object {}",
                self.handle,
                object.0
            );
            return;
        };
        if let Err(e) = handler.update_tracked_boxes() {
            log::warn!("handler {}: box refresh failed: {e}", self.handle);
        }
    }

    fn object_destroyed(&self, object: ObjectId) {
        if !self.contains(object) {
            return;
        }
        let owner = self.owner.upgrade();
        match owner.as_ref().map(|o| o.try_borrow_mut()) {
            Some(Ok(mut handler)) => {
                if let Err(e) = handler.remove_tracked_object(object) {
                    log::warn!(
                        "handler {}: box refresh after destroy failed: {e}",
                        self.handle
                    );
                }
            }
            _ => {
                let _ = self.tracked.borrow_mut().remove(&object);
                log::warn!(
                    "handler {}: object {} destroyed while handler busy, \
                     boxes not refreshed",
                    self.handle,
                    object.0
                );
            }
        }
        log::trace!("handler {}: object {} untracked", self.handle, object.0);
    }
}
