//! Shared setup for the selection tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use super::{
    BasicSelectionHandler, HandlerCore, SelectionHandler, SelectionManager,
};
use crate::bounds::Aabb;
use crate::context::DisplayContext;
use crate::error::SelectionError;
use crate::options::SelectionOptions;
use crate::picked::{PickHandle, Picked};
use crate::property::{PropertyId, PropertyTree, PropertyValue};
use crate::scene::{NodeId, ObjectId, Scene, SceneGraph};

pub(crate) struct Fixture {
    pub scene: Rc<Scene>,
    pub context: Rc<DisplayContext>,
    pub manager: SelectionManager,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(SelectionOptions::default())
    }

    pub fn with_options(options: SelectionOptions) -> Self {
        let scene = Rc::new(Scene::with_materials([
            "selection/cyan",
            "highlight_red",
        ]));
        let as_dyn: Rc<dyn SceneGraph> = scene.clone();
        let context = Rc::new(DisplayContext::new(as_dyn, options));
        let manager = SelectionManager::new(Rc::clone(&context)).unwrap();
        Self {
            scene,
            context,
            manager,
        }
    }

    /// An object with the given local bounds on its own node under the
    /// root.
    pub fn object(
        &self,
        name: &str,
        min: Vec3,
        max: Vec3,
    ) -> (NodeId, ObjectId) {
        let node = self.scene.create_node(self.scene.root_node()).unwrap();
        let object = self.scene.create_object(name, Aabb::new(min, max));
        self.scene.attach_object(node, object).unwrap();
        (node, object)
    }

    pub fn unit_object(&self, name: &str) -> (NodeId, ObjectId) {
        self.object(name, Vec3::ZERO, Vec3::ONE)
    }

    pub fn basic(&self) -> Rc<RefCell<BasicSelectionHandler>> {
        self.manager.create_handler(BasicSelectionHandler::new).unwrap()
    }

    pub fn probe(&self) -> Rc<RefCell<Probe>> {
        self.manager.create_handler(Probe::new).unwrap()
    }
}

pub(crate) fn handle(raw: u32) -> PickHandle {
    PickHandle::from_raw(raw).unwrap()
}

/// Handler recording every hook it receives.
pub(crate) struct Probe {
    core: HandlerCore,
    pub selected: Vec<Picked>,
    pub deselected: Vec<Picked>,
    pub extra_passes: u32,
    pub pre_passes: Vec<u32>,
    pub post_passes: Vec<u32>,
    pub property_refreshes: usize,
}

impl Probe {
    pub fn new(core: HandlerCore) -> Self {
        Self {
            core,
            selected: Vec::new(),
            deselected: Vec::new(),
            extra_passes: 0,
            pre_passes: Vec::new(),
            post_passes: Vec::new(),
            property_refreshes: 0,
        }
    }
}

impl SelectionHandler for Probe {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn create_properties(
        &mut self,
        picked: &Picked,
        tree: &mut PropertyTree,
        parent: PropertyId,
    ) -> Result<(), SelectionError> {
        let category =
            tree.add_category(parent, format!("Probe {}", picked.handle))?;
        let tracked = self.core.tracked_objects().len() as i64;
        let _ = tree.add(category, "Tracked", PropertyValue::Int(tracked))?;
        let _ = tree.add(category, "Pixels", PropertyValue::Int(1))?;
        self.core.push_property(category);
        Ok(())
    }

    fn update_properties(&mut self, _tree: &mut PropertyTree) {
        self.property_refreshes += 1;
    }

    fn needs_additional_render_pass(&self, pass: u32) -> bool {
        pass <= self.extra_passes
    }

    fn pre_render_pass(&mut self, pass: u32) {
        self.pre_passes.push(pass);
    }

    fn post_render_pass(&mut self, pass: u32) {
        self.post_passes.push(pass);
    }

    fn on_select(&mut self, picked: &Picked) {
        self.selected.push(picked.clone());
    }

    fn on_deselect(&mut self, picked: &Picked) {
        self.deselected.push(picked.clone());
    }
}
