use codecity_engine::catalog::{Catalog, DistrictMap, EntityKind};
use codecity_engine::config::{PhysicsConfig, SimMode, VehicleConfig};
use codecity_engine::events::{EventBus, SceneEvent};
use codecity_engine::layout;
use codecity_engine::model::{ModelAsset, ModelLoader, PrimitiveLoader};
use codecity_engine::physics::PhysicsWorld;
use codecity_engine::scene::CityScene;

/// Loader that fails for classes only, to exercise the per-entity fallback.
struct FlakyLoader;

impl ModelLoader for FlakyLoader {
    fn load(&mut self, kind: EntityKind) -> Result<ModelAsset, String> {
        match kind {
            EntityKind::Class => Err("class mesh unavailable".to_string()),
            _ => Ok(ModelAsset::unit_cube()),
        }
    }
}

fn build(loader: &mut dyn ModelLoader, mode: SimMode) -> (CityScene, PhysicsWorld, EventBus) {
    let catalog = Catalog::demo();
    let plan = layout::plan(&catalog, &DistrictMap::builtin());
    let physics_config = PhysicsConfig::default();
    let mut physics = PhysicsWorld::new(physics_config.gravity.into());
    let mut bus = EventBus::new();
    let (scene, _) = CityScene::build(
        &catalog,
        &plan,
        &mut physics,
        loader,
        mode,
        &physics_config,
        &VehicleConfig::default(),
        &mut bus,
    )
    .expect("build");
    (scene, physics, bus)
}

#[test]
fn missing_assets_fall_back_instead_of_failing_the_build() {
    let mut loader = FlakyLoader;
    let (scene, _, mut bus) = build(&mut loader, SimMode::Static);
    // Both demo classes degrade to cubes; all six buildings still exist.
    assert_eq!(scene.pick_nodes().len(), 6);
    let events = bus.drain();
    let fallbacks: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SceneEvent::AssetFallback { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(fallbacks, vec!["Application", "Router"]);
    let placed = events.iter().filter(|e| matches!(e, SceneEvent::BuildingPlaced { .. })).count();
    assert_eq!(placed, 6);
}

#[test]
fn every_pick_node_resolves_through_the_side_table() {
    let mut loader = PrimitiveLoader;
    let (scene, _, _) = build(&mut loader, SimMode::Static);
    let catalog = Catalog::demo();
    let mut seen = Vec::new();
    for &node in scene.pick_nodes() {
        let index = scene.catalog_index(node).expect("side table entry");
        seen.push(catalog.get(index).expect("catalog entry").id.clone());
    }
    seen.sort();
    let mut expected: Vec<String> =
        catalog.entities().iter().map(|entity| entity.id.clone()).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn rejected_entities_get_events_but_no_nodes() {
    let text = r#"[
        { "id": "ok", "kind": "module", "display_name": "ok", "district": "core" },
        { "id": "lost", "kind": "module", "display_name": "lost", "district": "nowhere" }
    ]"#;
    let catalog = Catalog::from_json(text).expect("parse");
    let plan = layout::plan(&catalog, &DistrictMap::builtin());
    let physics_config = PhysicsConfig::default();
    let mut physics = PhysicsWorld::new(physics_config.gravity.into());
    let mut bus = EventBus::new();
    let mut loader = PrimitiveLoader;
    let (scene, _) = CityScene::build(
        &catalog,
        &plan,
        &mut physics,
        &mut loader,
        SimMode::Static,
        &physics_config,
        &VehicleConfig::default(),
        &mut bus,
    )
    .expect("build");
    assert_eq!(scene.pick_nodes().len(), 1);
    let rejected: Vec<_> = bus
        .drain()
        .into_iter()
        .filter(|e| matches!(e, SceneEvent::EntityRejected { .. }))
        .collect();
    assert_eq!(rejected.len(), 1);
}

#[test]
fn teardown_releases_nodes_and_bodies_once() {
    let mut loader = PrimitiveLoader;
    let (mut scene, mut physics, _) = build(&mut loader, SimMode::Drive);
    assert!(physics.body_count() > 0);
    scene.teardown(&mut physics);
    assert_eq!(physics.body_count(), 0);
    assert_eq!(scene.node_count(), 0);
    assert!(scene.is_torn_down());
    // Second teardown is a no-op, not a panic.
    scene.teardown(&mut physics);
    assert_eq!(physics.body_count(), 0);
}
