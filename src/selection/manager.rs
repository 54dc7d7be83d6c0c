use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use web_time::Instant;

use super::handler::{
    HandlerCore, HandlerRegistry, SelectionHandler, SelectionHandlerPtr,
    SelectionHandlerWeak,
};
use crate::bounds::Aabb;
use crate::context::DisplayContext;
use crate::error::SelectionError;
use crate::interaction::{self, ViewportMouseEvent};
use crate::picked::{PickHandle, Picked, PickedMap};

struct RegistryState {
    handlers: FxHashMap<PickHandle, SelectionHandlerWeak>,
    selection: PickedMap,
    last_handle: u32,
}

/// Handle allocation plus the weak handler table.
///
/// Handlers deregister through [`HandlerRegistry`] from their `Drop`, so the
/// state borrow is never held while a handler could be dropped.
struct HandleRegistry {
    state: RefCell<RegistryState>,
}

impl HandleRegistry {
    fn new() -> Self {
        Self {
            state: RefCell::new(RegistryState {
                handlers: FxHashMap::default(),
                selection: PickedMap::default(),
                last_handle: 0,
            }),
        }
    }

    /// Next free handle after the last one handed out, wrapping past
    /// [`PickHandle::MAX`] back to 1.
    fn allocate(&self) -> Result<PickHandle, SelectionError> {
        let mut state = self.state.borrow_mut();
        if state.handlers.len() >= PickHandle::MAX as usize {
            return Err(SelectionError::HandlesExhausted);
        }
        let mut raw = state.last_handle;
        loop {
            raw = if raw >= PickHandle::MAX { 1 } else { raw + 1 };
            let Some(handle) = PickHandle::from_raw(raw) else {
                continue;
            };
            if !state.handlers.contains_key(&handle) {
                state.last_handle = raw;
                return Ok(handle);
            }
        }
    }

    fn get(&self, handle: PickHandle) -> Option<SelectionHandlerPtr> {
        self.state
            .borrow()
            .handlers
            .get(&handle)
            .and_then(Weak::upgrade)
    }

    /// Live handlers in handle order. The returned pointers outlive the
    /// state borrow.
    fn live(&self) -> Vec<SelectionHandlerPtr> {
        let state = self.state.borrow();
        let mut handles: Vec<_> = state.handlers.keys().copied().collect();
        handles.sort_unstable();
        handles
            .into_iter()
            .filter_map(|h| state.handlers.get(&h).and_then(Weak::upgrade))
            .collect()
    }
}

impl HandlerRegistry for HandleRegistry {
    fn remove_object(&self, handle: PickHandle) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            log::error!("handle registry busy, cannot deregister {handle}");
            return;
        };
        let _ = state.handlers.remove(&handle);
        let _ = state.selection.remove(&handle);
        log::debug!("handle {handle} deregistered");
    }
}

/// Owns the handle space and the current selection, and drives every
/// registered handler.
///
/// Handlers are owned by their creators; the manager keeps weak references
/// only and forgets a handler as soon as it is dropped.
pub struct SelectionManager {
    context: Rc<DisplayContext>,
    registry: Rc<HandleRegistry>,
    last_property_refresh: Option<Instant>,
    interaction_enabled: bool,
}

impl SelectionManager {
    /// Create a manager on a validated context.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidContext`] if the context cannot
    /// host handlers.
    pub fn new(context: Rc<DisplayContext>) -> Result<Self, SelectionError> {
        context.validate()?;
        Ok(Self {
            context,
            registry: Rc::new(HandleRegistry::new()),
            last_property_refresh: None,
            interaction_enabled: false,
        })
    }

    /// The shared display context.
    #[must_use]
    pub fn context(&self) -> &Rc<DisplayContext> {
        &self.context
    }

    /// Allocate a handle and build a handler around a fresh core.
    ///
    /// Objects tracked inside `build` are tagged with the allocated handle
    /// straight away; the handler becomes reachable through
    /// [`handler`](Self::handler) once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::HandlesExhausted`] when no handle is free.
    /// Nothing is registered in that case.
    pub fn create_handler<H, F>(
        &self,
        build: F,
    ) -> Result<Rc<RefCell<H>>, SelectionError>
    where
        H: SelectionHandler + 'static,
        F: FnOnce(HandlerCore) -> H,
    {
        let handle = self.registry.allocate()?;
        let registry: Rc<dyn HandlerRegistry> = self.registry.clone();
        let registry = Rc::downgrade(&registry);
        let context = Rc::clone(&self.context);

        let handler = Rc::new_cyclic(|weak: &Weak<RefCell<H>>| {
            let owner: SelectionHandlerWeak = weak.clone();
            RefCell::new(build(HandlerCore::new(
                handle, context, owner, registry,
            )))
        });

        let as_dyn: SelectionHandlerPtr = handler.clone();
        let _ = self
            .registry
            .state
            .borrow_mut()
            .handlers
            .insert(handle, Rc::downgrade(&as_dyn));
        log::debug!("selection handler {handle} created");
        Ok(handler)
    }

    /// The live handler registered under `handle`.
    #[must_use]
    pub fn handler(&self, handle: PickHandle) -> Option<SelectionHandlerPtr> {
        self.registry.get(handle)
    }

    /// Handles of all live handlers, sorted.
    #[must_use]
    pub fn handles(&self) -> Vec<PickHandle> {
        let state = self.registry.state.borrow();
        let mut handles: Vec<_> = state
            .handlers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(&handle, _)| handle)
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.registry.state.borrow().handlers.len()
    }

    /// A copy of the current selection.
    #[must_use]
    pub fn selection(&self) -> PickedMap {
        self.registry.state.borrow().selection.clone()
    }

    /// Whether anything of `handle` is selected.
    #[must_use]
    pub fn is_selected(&self, handle: PickHandle) -> bool {
        self.registry.state.borrow().selection.contains_key(&handle)
    }

    /// Replace the selection with `picks`.
    ///
    /// # Errors
    ///
    /// See [`add_selection`](Self::add_selection).
    pub fn set_selection(
        &mut self,
        picks: &PickedMap,
    ) -> Result<(), SelectionError> {
        let current = self.selection();
        self.remove_selection(&current);
        self.add_selection(picks)
    }

    /// Add `picks` to the selection. Only what was not selected before is
    /// reported to handlers: `on_select`, the highlight box (when enabled)
    /// and `create_properties` under the property root.
    ///
    /// # Errors
    ///
    /// Returns the first highlight or property failure. The selection map
    /// is updated for every pick regardless.
    pub fn add_selection(
        &mut self,
        picks: &PickedMap,
    ) -> Result<(), SelectionError> {
        let mut added = Vec::new();
        {
            let mut state = self.registry.state.borrow_mut();
            let mut handles: Vec<_> = picks.keys().copied().collect();
            handles.sort_unstable();
            for handle in handles {
                let Some(pick) = picks.get(&handle) else {
                    continue;
                };
                if let Some(delta) = merge_pick(&mut state.selection, pick) {
                    added.push(delta);
                }
            }
        }

        let highlight = &self.context.options().highlight;
        let mut result = Ok(());
        for picked in &added {
            let Some(handler) = self.registry.get(picked.handle) else {
                log::debug!("handle {} has no handler", picked.handle);
                continue;
            };
            let Ok(mut handler) = handler.try_borrow_mut() else {
                log::warn!("handler {} busy, select skipped", picked.handle);
                continue;
            };
            handler.on_select(picked);
            if highlight.enabled {
                if let Err(e) =
                    handler.highlight_picked(picked, &highlight.material)
                {
                    log::warn!("highlight for {} failed: {e}", picked.handle);
                    result = result.and(Err(e));
                }
            }
            let Ok(mut tree) = self.context.property_tree().try_borrow_mut()
            else {
                log::warn!("property tree busy, skipping {}", picked.handle);
                continue;
            };
            let root = tree.root();
            if let Err(e) = handler.create_properties(picked, &mut tree, root)
            {
                log::warn!("properties for {} failed: {e}", picked.handle);
                result = result.and(Err(e));
            }
        }
        log::debug!("{} picks added to selection", added.len());
        result
    }

    /// Remove `picks` from the selection. Handlers see `destroy_properties`,
    /// their highlight cleared and `on_deselect` for whatever was actually
    /// selected.
    pub fn remove_selection(&mut self, picks: &PickedMap) {
        let mut removed = Vec::new();
        {
            let mut state = self.registry.state.borrow_mut();
            let mut handles: Vec<_> = picks.keys().copied().collect();
            handles.sort_unstable();
            for handle in handles {
                let Some(pick) = picks.get(&handle) else {
                    continue;
                };
                if let Some(delta) = unmerge_pick(&mut state.selection, pick) {
                    removed.push(delta);
                }
            }
        }

        for (picked, emptied) in &removed {
            let Some(handler) = self.registry.get(picked.handle) else {
                continue;
            };
            let Ok(mut handler) = handler.try_borrow_mut() else {
                log::warn!("handler {} busy, deselect skipped", picked.handle);
                continue;
            };
            if *emptied {
                match self.context.property_tree().try_borrow_mut() {
                    Ok(mut tree) => {
                        let root = tree.root();
                        handler.destroy_properties(picked, &mut tree, root);
                    }
                    Err(_) => log::warn!(
                        "property tree busy, properties of {} kept",
                        picked.handle
                    ),
                }
                let _ = handler.clear_highlight(picked);
            }
            handler.on_deselect(picked);
        }
        log::debug!("{} picks removed from selection", removed.len());
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        let current = self.selection();
        self.remove_selection(&current);
    }

    /// Merged bounds of everything selected, for framing the camera.
    /// [`Aabb::NULL`] when nothing drawable is selected.
    #[must_use]
    pub fn selection_bounds(&self) -> Aabb {
        let mut aabbs = Vec::new();
        for picked in self.selection().values() {
            if let Some(handler) = self.registry.get(picked.handle) {
                if let Ok(handler) = handler.try_borrow() {
                    handler.get_aabbs(picked, &mut aabbs);
                }
            }
        }
        Aabb::merged(&aabbs)
    }

    /// Refresh every handler's highlight boxes.
    ///
    /// # Errors
    ///
    /// Returns the first failure; remaining handlers are still refreshed.
    pub fn update_tracked_boxes(&self) -> Result<(), SelectionError> {
        let mut result = Ok(());
        for handler in self.registry.live() {
            let Ok(mut handler) = handler.try_borrow_mut() else {
                continue;
            };
            if let Err(e) = handler.update_tracked_boxes() {
                log::warn!("box refresh for {} failed: {e}", handler.handle());
                result = result.and(Err(e));
            }
        }
        log::trace!("highlight boxes refreshed");
        result
    }

    /// Let every selected handler refresh its property values.
    pub fn update_properties(&self) {
        let mut handles: Vec<_> =
            self.registry.state.borrow().selection.keys().copied().collect();
        handles.sort_unstable();
        let Ok(mut tree) = self.context.property_tree().try_borrow_mut() else {
            log::warn!("property tree busy, refresh skipped");
            return;
        };
        for handle in handles {
            if let Some(handler) = self.registry.get(handle) {
                if let Ok(mut handler) = handler.try_borrow_mut() {
                    handler.update_properties(&mut tree);
                }
            }
        }
    }

    /// Per-frame entry point. Refreshes properties once the configured
    /// interval has elapsed since the last refresh; returns whether it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match self.last_property_refresh {
            None => true,
            Some(last) => {
                now.saturating_duration_since(last)
                    >= self.context.options().refresh_interval()
            }
        };
        if due {
            self.update_properties();
            self.last_property_refresh = Some(now);
        }
        due
    }

    /// Run the pick pipeline: pass 0 always, then further passes while any
    /// handler asks for one, up to the configured cap. Every handler sees
    /// `pre_render_pass` before and `post_render_pass` after each pass.
    /// Returns the number of passes run.
    pub fn run_render_passes(&self, mut render: impl FnMut(u32)) -> u32 {
        let handlers = self.registry.live();
        let max_extra =
            self.context.options().render_passes.max_additional_passes;
        let mut pass = 0;
        loop {
            if pass > 0 {
                if pass > max_extra {
                    log::debug!("render pass cap {max_extra} reached");
                    break;
                }
                let needed = handlers.iter().any(|h| {
                    h.try_borrow()
                        .is_ok_and(|h| h.needs_additional_render_pass(pass))
                });
                if !needed {
                    break;
                }
            }
            for handler in &handlers {
                if let Ok(mut h) = handler.try_borrow_mut() {
                    h.pre_render_pass(pass);
                }
            }
            render(pass);
            for handler in &handlers {
                if let Ok(mut h) = handler.try_borrow_mut() {
                    h.post_render_pass(pass);
                }
            }
            pass += 1;
        }
        pass
    }

    /// Whether the interact tool is active.
    #[must_use]
    pub fn interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    /// Activate or deactivate the interact tool on every live delegate.
    pub fn set_interaction_enabled(&mut self, enable: bool) {
        self.interaction_enabled = enable;
        for handler in self.registry.live() {
            let delegate = handler
                .try_borrow()
                .ok()
                .and_then(|h| h.interactive_object());
            if let Some(delegate) = delegate {
                let _ = interaction::set_interaction_enabled(&delegate, enable);
            }
        }
    }

    /// Forward a mouse event to the delegate of the handler under the
    /// cursor. Returns whether it was delivered.
    pub fn dispatch_mouse_event(
        &self,
        handle: PickHandle,
        event: &ViewportMouseEvent,
    ) -> bool {
        if !self.interaction_enabled {
            return false;
        }
        let Some(handler) = self.registry.get(handle) else {
            return false;
        };
        let delegate =
            handler.try_borrow().ok().and_then(|h| h.interactive_object());
        delegate.is_some_and(|d| interaction::dispatch_mouse_event(&d, event))
    }
}

/// Fold `pick` into the selection. Returns what was newly selected.
fn merge_pick(selection: &mut PickedMap, pick: &Picked) -> Option<Picked> {
    let Some(current) = selection.get_mut(&pick.handle) else {
        let _ = selection.insert(pick.handle, pick.clone());
        return Some(pick.clone());
    };
    let mut added = Picked::new(pick.handle);
    added.pixel_count = pick.pixel_count;
    for &sub in &pick.extra_handles {
        if current.extra_handles.insert(sub) {
            let _ = added.extra_handles.insert(sub);
        }
    }
    (!added.extra_handles.is_empty()).then_some(added)
}

/// Take `pick` out of the selection. Returns what was deselected and
/// whether the handle left the selection entirely.
fn unmerge_pick(
    selection: &mut PickedMap,
    pick: &Picked,
) -> Option<(Picked, bool)> {
    let current = selection.get_mut(&pick.handle)?;
    if pick.extra_handles.is_empty() {
        let removed = selection.remove(&pick.handle)?;
        return Some((removed, true));
    }
    let mut removed = Picked::new(pick.handle);
    for sub in &pick.extra_handles {
        if current.extra_handles.remove(sub) {
            let _ = removed.extra_handles.insert(*sub);
        }
    }
    if removed.extra_handles.is_empty() {
        return None;
    }
    let emptied = current.extra_handles.is_empty();
    if emptied {
        let _ = selection.remove(&pick.handle);
    }
    Some((removed, emptied))
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use web_time::Duration;

    use super::*;
    use crate::interaction::{InteractiveObject, MouseEventKind};
    use crate::options::SelectionOptions;
    use crate::picked::BoxKey;
    use crate::scene::{Scene, SceneGraph, Transform};
    use crate::selection::fixtures::{handle, Fixture, Probe};
    use crate::selection::BasicSelectionHandler;

    fn picks(items: impl IntoIterator<Item = Picked>) -> PickedMap {
        items.into_iter().map(|p| (p.handle, p)).collect()
    }

    #[test]
    fn handles_are_monotone_and_not_reused() {
        let fx = Fixture::new();
        let first = fx.basic();
        let second = fx.basic();
        assert_eq!(first.borrow().handle(), handle(1));
        assert_eq!(second.borrow().handle(), handle(2));

        drop(first);
        let third = fx.basic();
        assert_eq!(third.borrow().handle(), handle(3));
        assert_eq!(fx.manager.handles(), vec![handle(2), handle(3)]);
        assert!(fx.manager.handler(handle(1)).is_none());
        assert!(fx.manager.handler(handle(3)).is_some());
    }

    #[test]
    fn allocation_wraps_and_skips_live_handles() {
        let registry = HandleRegistry::new();
        registry.state.borrow_mut().last_handle = PickHandle::MAX - 1;
        assert_eq!(registry.allocate().unwrap().raw(), PickHandle::MAX);
        assert_eq!(registry.allocate().unwrap(), handle(1));
    }

    #[test]
    fn context_without_highlight_material_is_rejected() {
        let scene: Rc<dyn SceneGraph> = Rc::new(Scene::new());
        let context =
            Rc::new(DisplayContext::new(scene, SelectionOptions::default()));
        assert!(matches!(
            SelectionManager::new(context),
            Err(SelectionError::InvalidContext(_))
        ));
    }

    #[test]
    fn box_follows_object_until_it_is_destroyed() {
        let fx = Fixture::new();
        for _ in 0..6 {
            drop(fx.basic());
        }
        let (node, a) = fx.unit_object("A");
        let handler = fx.basic();
        let key = BoxKey::new(handle(7), 0);
        {
            let mut h = handler.borrow_mut();
            assert_eq!(h.handle(), handle(7));
            assert!(h.add_tracked_object(a));
            let bounds = fx.scene.world_bounds(a).unwrap();
            h.core_mut().create_box(key, &bounds, "highlight_red").unwrap();
        }

        fx.scene
            .set_transform(node, Transform::from_translation(Vec3::splat(2.0)))
            .unwrap();
        {
            let h = handler.borrow();
            let entry = h.core().boxes().get(&key).unwrap();
            let moved = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
            assert!(entry.bounds.abs_diff_eq(&moved, 1e-6));
            assert_eq!(entry.material, "highlight_red");
        }

        assert!(fx.scene.destroy_object(a));
        let h = handler.borrow();
        assert!(h.core().tracked_objects().is_empty());
        assert!(!h.core().boxes().contains(&key));
        assert_eq!(fx.scene.wire_box_count(), 0);
    }

    #[test]
    fn add_selection_runs_select_highlight_and_properties() {
        let fx = Fixture::new();
        let (_, a) = fx.unit_object("a");
        let mut manager = fx.manager;
        let probe = manager.create_handler(Probe::new).unwrap();
        assert!(probe.borrow_mut().add_tracked_object(a));
        let h = probe.borrow().handle();

        manager.add_selection(&picks([Picked::new(h)])).unwrap();
        assert!(manager.is_selected(h));
        {
            let p = probe.borrow();
            assert_eq!(p.selected.len(), 1);
            let entry = p.core().boxes().get(&BoxKey::whole(h)).unwrap();
            assert_eq!(entry.material, "selection/cyan");
            assert_eq!(p.core().properties().len(), 1);
        }
        let tree = Rc::clone(fx.context.property_tree());
        assert_eq!(tree.borrow().len(), 4);

        // Selecting the same thing again reports nothing new.
        manager.add_selection(&picks([Picked::new(h)])).unwrap();
        assert_eq!(probe.borrow().selected.len(), 1);
        assert_eq!(tree.borrow().len(), 4);
    }

    #[test]
    fn only_new_sub_indices_are_reported() {
        let fx = Fixture::new();
        let mut manager = fx.manager;
        let probe = manager.create_handler(Probe::new).unwrap();
        let h = probe.borrow().handle();

        let first = Picked::new(h).with_extra([1, 2]);
        manager.add_selection(&picks([first])).unwrap();
        let second = Picked::new(h).with_extra([2, 3]);
        manager.add_selection(&picks([second])).unwrap();

        let p = probe.borrow();
        assert_eq!(p.selected.len(), 2);
        assert_eq!(
            p.selected[1].extra_handles.iter().copied().collect::<Vec<_>>(),
            vec![3]
        );
        let selection = manager.selection();
        assert_eq!(selection[&h].extra_handles.len(), 3);
    }

    #[test]
    fn remove_selection_undoes_add() {
        let fx = Fixture::new();
        let (_, a) = fx.unit_object("a");
        let mut manager = fx.manager;
        let probe = manager.create_handler(Probe::new).unwrap();
        assert!(probe.borrow_mut().add_tracked_object(a));
        let h = probe.borrow().handle();
        let all = picks([Picked::new(h)]);

        manager.add_selection(&all).unwrap();
        manager.remove_selection(&all);

        assert!(!manager.is_selected(h));
        let p = probe.borrow();
        assert_eq!(p.deselected.len(), 1);
        assert!(p.core().boxes().is_empty());
        assert!(p.core().properties().is_empty());
        assert!(fx.context.property_tree().borrow().is_empty());

        // Removing again is a no-op.
        drop(p);
        manager.remove_selection(&all);
        assert_eq!(probe.borrow().deselected.len(), 1);
    }

    #[test]
    fn partial_removal_keeps_the_rest_selected() {
        let fx = Fixture::new();
        let (_, a) = fx.unit_object("a");
        let mut manager = fx.manager;
        let probe = manager.create_handler(Probe::new).unwrap();
        assert!(probe.borrow_mut().add_tracked_object(a));
        let h = probe.borrow().handle();

        manager
            .add_selection(&picks([Picked::new(h).with_extra([1, 2])]))
            .unwrap();
        manager.remove_selection(&picks([Picked::new(h).with_extra([1])]));
        assert!(manager.is_selected(h));
        assert!(probe.borrow().core().boxes().contains(&BoxKey::whole(h)));

        manager.remove_selection(&picks([Picked::new(h).with_extra([2])]));
        assert!(!manager.is_selected(h));
        assert!(probe.borrow().core().boxes().is_empty());
        assert_eq!(probe.borrow().deselected.len(), 2);
    }

    #[test]
    fn set_selection_replaces_previous_selection() {
        let fx = Fixture::new();
        let mut manager = fx.manager;
        let make = || manager.create_handler(Probe::new).unwrap();
        let first = make();
        let second = make();
        let h1 = first.borrow().handle();
        let h2 = second.borrow().handle();

        manager.set_selection(&picks([Picked::new(h1)])).unwrap();
        manager.set_selection(&picks([Picked::new(h2)])).unwrap();

        assert!(!manager.is_selected(h1));
        assert!(manager.is_selected(h2));
        assert_eq!(first.borrow().deselected.len(), 1);
        assert_eq!(second.borrow().selected.len(), 1);

        manager.clear_selection();
        assert!(manager.selection().is_empty());
    }

    #[test]
    fn highlight_can_be_disabled() {
        let mut options = SelectionOptions::default();
        options.highlight.enabled = false;
        let fx = Fixture::with_options(options);
        let (_, a) = fx.unit_object("a");
        let mut manager = fx.manager;
        let handler =
            manager.create_handler(BasicSelectionHandler::new).unwrap();
        assert!(handler.borrow_mut().add_tracked_object(a));
        let h = handler.borrow().handle();

        manager.add_selection(&picks([Picked::new(h)])).unwrap();
        assert!(manager.is_selected(h));
        assert_eq!(fx.scene.wire_box_count(), 0);
    }

    #[test]
    fn selection_bounds_merge_all_selected_handlers() {
        let fx = Fixture::new();
        let (_, a) = fx.unit_object("a");
        let (_, b) = fx.object("b", Vec3::splat(4.0), Vec3::splat(5.0));
        let first = fx.basic();
        let second = fx.basic();
        assert!(first.borrow_mut().add_tracked_object(a));
        assert!(second.borrow_mut().add_tracked_object(b));
        let h1 = first.borrow().handle();
        let h2 = second.borrow().handle();

        let mut manager = fx.manager;
        assert!(manager.selection_bounds().is_null());
        manager
            .add_selection(&picks([Picked::new(h1), Picked::new(h2)]))
            .unwrap();
        let bounds = manager.selection_bounds();
        let expected = Aabb::new(Vec3::ZERO, Vec3::splat(5.0));
        assert!(bounds.abs_diff_eq(&expected, 1e-6));
    }

    #[test]
    fn dropped_handler_leaves_the_selection() {
        let fx = Fixture::new();
        let handler = fx.basic();
        let h = handler.borrow().handle();
        let mut manager = fx.manager;
        manager.add_selection(&picks([Picked::new(h)])).unwrap();
        assert!(manager.is_selected(h));

        drop(handler);
        assert!(!manager.is_selected(h));
        assert_eq!(manager.handler_count(), 0);
    }

    #[test]
    fn update_tracked_boxes_refreshes_every_handler() {
        let fx = Fixture::new();
        let (_, a) = fx.unit_object("a");
        let handler = fx.basic();
        let h = handler.borrow().handle();
        assert!(handler.borrow_mut().add_tracked_object(a));
        let mut manager = fx.manager;
        manager.add_selection(&picks([Picked::new(h)])).unwrap();

        let grown = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        fx.scene.set_local_bounds(a, grown).unwrap();
        manager.update_tracked_boxes().unwrap();

        let hb = handler.borrow();
        let entry = hb.core().boxes().get(&BoxKey::whole(h)).unwrap();
        assert!(entry.bounds.abs_diff_eq(&grown, 1e-6));
    }

    #[test]
    fn tick_throttles_property_refresh() {
        let fx = Fixture::new();
        let mut manager = fx.manager;
        let probe = manager.create_handler(Probe::new).unwrap();
        let h = probe.borrow().handle();
        manager.add_selection(&picks([Picked::new(h)])).unwrap();

        let start = Instant::now();
        assert!(manager.tick(start));
        assert!(!manager.tick(start + Duration::from_millis(50)));
        assert!(manager.tick(start + Duration::from_millis(200)));
        assert_eq!(probe.borrow().property_refreshes, 2);
    }

    #[test]
    fn render_passes_follow_handler_requests() {
        let fx = Fixture::new();
        let probe = fx.probe();
        probe.borrow_mut().extra_passes = 2;

        let mut rendered = Vec::new();
        let passes = fx.manager.run_render_passes(|pass| rendered.push(pass));
        assert_eq!(passes, 3);
        assert_eq!(rendered, vec![0, 1, 2]);
        let p = probe.borrow();
        assert_eq!(p.pre_passes, vec![0, 1, 2]);
        assert_eq!(p.post_passes, vec![0, 1, 2]);
    }

    #[test]
    fn render_passes_are_capped() {
        let mut options = SelectionOptions::default();
        options.render_passes.max_additional_passes = 1;
        let fx = Fixture::with_options(options);
        let probe = fx.probe();
        probe.borrow_mut().extra_passes = 10;
        assert_eq!(fx.manager.run_render_passes(|_| {}), 2);

        let fx = Fixture::new();
        assert_eq!(fx.manager.run_render_passes(|_| {}), 1);
    }

    #[derive(Default)]
    struct Gizmo {
        enabled: bool,
        events: usize,
    }

    impl InteractiveObject for Gizmo {
        fn is_interactive(&self) -> bool {
            self.enabled
        }

        fn enable_interaction(&mut self, enable: bool) {
            self.enabled = enable;
        }

        fn handle_mouse_event(&mut self, _event: &ViewportMouseEvent) {
            self.events += 1;
        }
    }

    #[test]
    fn mouse_events_reach_delegate_only_while_interacting() {
        let fx = Fixture::new();
        let handler = fx.basic();
        let h = handler.borrow().handle();
        let gizmo = Rc::new(RefCell::new(Gizmo::default()));
        let as_dyn: Rc<RefCell<dyn InteractiveObject>> = gizmo.clone();
        handler
            .borrow_mut()
            .set_interactive_object(Some(Rc::downgrade(&as_dyn)));

        let mut manager = fx.manager;
        let event = ViewportMouseEvent::new(MouseEventKind::Move, 4.0, 2.0);
        assert!(!manager.dispatch_mouse_event(h, &event));

        manager.set_interaction_enabled(true);
        assert!(manager.interaction_enabled());
        assert!(gizmo.borrow().enabled);
        assert!(manager.dispatch_mouse_event(h, &event));
        assert!(!manager.dispatch_mouse_event(handle(99), &event));
        assert_eq!(gizmo.borrow().events, 1);

        manager.set_interaction_enabled(false);
        assert!(!gizmo.borrow().enabled);
        assert!(!manager.dispatch_mouse_event(h, &event));
    }
}
