//! Headless walkthrough of the selection layer: track a small node
//! hierarchy, select it, move it, destroy part of it and drop the handler.

use std::path::Path;
use std::rc::Rc;

use glam::Vec3;
use viso_selection::bounds::Aabb;
use viso_selection::context::DisplayContext;
use viso_selection::error::SelectionError;
use viso_selection::options::SelectionOptions;
use viso_selection::picked::{Picked, PickedMap};
use viso_selection::property::{PropertyId, PropertyTree, PropertyValue};
use viso_selection::scene::{ObjectId, Scene, SceneGraph, Transform};
use viso_selection::selection::{
    HandlerCore, SelectionHandler, SelectionManager,
};

/// Shows the name and world centre of every tracked object.
struct ObjectGroupHandler {
    core: HandlerCore,
    scene: Rc<Scene>,
    rows: Vec<(ObjectId, PropertyId)>,
}

impl ObjectGroupHandler {
    fn new(core: HandlerCore, scene: Rc<Scene>) -> Self {
        Self {
            core,
            scene,
            rows: Vec::new(),
        }
    }
}

impl SelectionHandler for ObjectGroupHandler {
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
        let group =
            tree.add_category(parent, format!("Group {}", picked.handle))?;
        self.core.push_property(group);
        for object in self.core.tracked_objects() {
            let name = self.scene.object_name(object).unwrap_or_default();
            let centre = self
                .scene
                .world_bounds(object)
                .map_or(Vec3::ZERO, |b| b.center());
            let row = tree.add(group, name, PropertyValue::Vector(centre))?;
            self.rows.push((object, row));
        }
        Ok(())
    }

    fn destroy_properties(
        &mut self,
        _picked: &Picked,
        tree: &mut PropertyTree,
        _parent: PropertyId,
    ) {
        self.rows.clear();
        let _ = self.core.remove_properties(tree);
    }

    fn update_properties(&mut self, tree: &mut PropertyTree) {
        let core = &self.core;
        self.rows.retain(|&(object, row)| {
            let keep = core.is_tracked(object);
            if !keep {
                let _ = tree.remove(row);
            }
            keep
        });
        for &(object, row) in &self.rows {
            if let Some(bounds) = self.scene.world_bounds(object) {
                let centre = PropertyValue::Vector(bounds.center());
                let _ = tree.set_value(row, centre);
            }
        }
    }
}

fn load_options() -> Result<SelectionOptions, SelectionError> {
    match std::env::args().nth(1) {
        Some(path) => SelectionOptions::load(Path::new(&path)),
        None => Ok(SelectionOptions::default()),
    }
}

fn run() -> Result<(), SelectionError> {
    let options = load_options()?;
    let scene = Rc::new(Scene::with_materials([
        options.highlight.material.clone(),
    ]));
    let scene_dyn: Rc<dyn SceneGraph> = scene.clone();
    let context = Rc::new(DisplayContext::new(scene_dyn, options));
    let mut manager = SelectionManager::new(Rc::clone(&context))?;

    let group = scene.create_node(scene.root_node())?;
    let arm = scene.create_node(group)?;
    let unit = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let base = scene.create_object("base", unit);
    let tip = scene.create_object("tip", unit);
    scene.attach_object(group, base)?;
    scene.attach_object(arm, tip)?;
    scene.set_transform(arm, Transform::from_translation(Vec3::Y * 2.0))?;

    let handler = manager.create_handler(|core| {
        ObjectGroupHandler::new(core, Rc::clone(&scene))
    })?;
    let handle = handler.borrow().handle();
    let tracked = handler.borrow_mut().add_tracked_objects(group);
    log::info!("handler {handle} tracks {tracked} objects");

    let mut selection = PickedMap::default();
    let _ = selection.insert(handle, Picked::new(handle));
    manager.set_selection(&selection)?;
    log::info!("selection bounds: {:?}", manager.selection_bounds());

    scene.set_transform(group, Transform::from_translation(Vec3::X * 5.0))?;
    manager.update_properties();
    {
        let tree = context.property_tree().borrow();
        log::info!("after move: {}", tree.to_json(tree.root()));
    }

    let _ = scene.destroy_object(tip);
    manager.update_properties();
    log::info!(
        "after destroying tip: {} tracked, selection bounds {:?}",
        handler.borrow().core().tracked_objects().len(),
        manager.selection_bounds()
    );

    let passes = manager.run_render_passes(|pass| {
        log::debug!("pick pass {pass}");
    });
    log::info!("{passes} pick pass(es) rendered");

    manager.clear_selection();
    drop(handler);
    log::info!(
        "handler dropped: {} handlers, {} wire boxes left",
        manager.handler_count(),
        scene.wire_box_count()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
