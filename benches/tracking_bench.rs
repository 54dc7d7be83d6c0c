//! Highlight box refresh cost over many tracked objects.
#![allow(missing_docs)]

use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};
use glam::Vec3;
use viso_selection::bounds::Aabb;
use viso_selection::context::DisplayContext;
use viso_selection::options::SelectionOptions;
use viso_selection::picked::{BoxKey, Picked};
use viso_selection::scene::{NodeId, Scene, SceneGraph, Transform};
use viso_selection::selection::{
    BasicSelectionHandler, SelectionHandler, SelectionManager,
};

struct Setup {
    scene: Rc<Scene>,
    _manager: SelectionManager,
    handler: Rc<RefCell<BasicSelectionHandler>>,
    group: NodeId,
}

fn setup(count: usize) -> Setup {
    let options = SelectionOptions::default();
    let scene =
        Rc::new(Scene::with_materials([options.highlight.material.clone()]));
    let scene_dyn: Rc<dyn SceneGraph> = scene.clone();
    let context = Rc::new(DisplayContext::new(scene_dyn, options));
    let manager = SelectionManager::new(context).unwrap();

    let group = scene.create_node(scene.root_node()).unwrap();
    for i in 0..count {
        let node = scene.create_node(group).unwrap();
        let offset = Vec3::new(i as f32, (i % 7) as f32, (i % 13) as f32);
        scene
            .set_transform(node, Transform::from_translation(offset))
            .unwrap();
        let object = scene.create_object(
            format!("atom-{i}"),
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        );
        scene.attach_object(node, object).unwrap();
    }

    let handler = manager
        .create_handler(BasicSelectionHandler::new)
        .unwrap();
    {
        let mut h = handler.borrow_mut();
        let _ = h.add_tracked_objects(group);
        let picked = Picked::new(h.handle());
        let _ = h.highlight_picked(&picked, "selection/cyan").unwrap();
    }
    Setup {
        scene,
        _manager: manager,
        handler,
        group,
    }
}

fn update_boxes_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_tracked_boxes");
    for count in [10, 100, 1000] {
        let setup = setup(count);
        group.bench_function(format!("{count}_objects"), |b| {
            b.iter(|| {
                setup.handler.borrow_mut().update_tracked_boxes().unwrap();
            });
        });
    }
    group.finish();
}

fn move_notification_benchmark(c: &mut Criterion) {
    let setup = setup(500);
    let mut step = 0.0_f32;
    c.bench_function("move_group_500_objects", |b| {
        b.iter(|| {
            step += 0.01;
            setup
                .scene
                .set_transform(
                    setup.group,
                    Transform::from_translation(Vec3::splat(step)),
                )
                .unwrap();
        });
    });
    let h = setup.handler.borrow();
    let _ = black_box(h.core().boxes().get(&BoxKey::whole(h.handle())));
}

criterion_group!(benches, update_boxes_benchmark, move_notification_benchmark);
criterion_main!(benches);
