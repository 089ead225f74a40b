use crate::catalog::Catalog;
use crate::config::{PhysicsConfig, SimMode, VehicleConfig};
use crate::events::{EventBus, SceneEvent};
use crate::layout::LayoutPlan;
use crate::model::{ModelAsset, ModelLoader};
use crate::physics::{BodySpec, PhysicsWorld};
use crate::vehicle::{Vehicle, WHEEL_ANCHORS};
use anyhow::Result;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use rapier3d::prelude::RigidBodyHandle;
use std::collections::HashMap;

#[derive(Component, Debug, Clone, Copy)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform3D {
    pub fn from_translation_scale(translation: Vec3, scale: Vec3) -> Self {
        Self { translation, rotation: Quat::IDENTITY, scale }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Cached world matrix, refreshed once per frame after physics sync.
#[derive(Component, Debug, Clone, Copy)]
pub struct WorldTransform3D(pub Mat4);

/// Local-space mesh bounds, scaled through the node transform for picking.
#[derive(Component, Debug, Clone, Copy)]
pub struct LocalBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl LocalBounds {
    pub fn from_asset(asset: &ModelAsset) -> Self {
        Self { min: asset.min, max: asset.max }
    }
}

/// Index into the catalog for nodes that represent a code entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct CatalogTag {
    pub index: usize,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct BodyRef {
    pub handle: RigidBodyHandle,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Ground,
    Building,
    Chassis,
    Wheel,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Tint(pub [f32; 3]);

/// Flat instance list handed to a renderer each frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderInstance {
    pub transform: Mat4,
    pub color: [f32; 3],
}

/// The built city: an ECS world of nodes plus the index structures derived
/// at build time. Node-to-entity association lives in an explicit side table,
/// never in collider user data.
pub struct CityScene {
    world: World,
    nodes: Vec<Entity>,
    pick_nodes: Vec<Entity>,
    node_entities: HashMap<Entity, usize>,
    body_nodes: Vec<(Entity, RigidBodyHandle)>,
    torn_down: bool,
}

impl CityScene {
    /// Builds scene nodes and physics bodies from a layout plan. Per-entity
    /// failures (rejected placements, missing assets) degrade that entity and
    /// report on the bus; only structural failures abort the build.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        catalog: &Catalog,
        plan: &LayoutPlan,
        physics: &mut PhysicsWorld,
        loader: &mut dyn ModelLoader,
        mode: SimMode,
        physics_config: &PhysicsConfig,
        vehicle_config: &VehicleConfig,
        bus: &mut EventBus,
    ) -> Result<(Self, Option<Vehicle>)> {
        let mut world = World::new();
        let mut nodes = Vec::new();
        let mut pick_nodes = Vec::new();
        let mut node_entities = HashMap::new();
        let mut body_nodes = Vec::new();

        for rejection in &plan.rejected {
            bus.push(SceneEvent::EntityRejected {
                id: rejection.id.clone(),
                district: rejection.district.clone(),
                reason: rejection.reason.clone(),
            });
        }

        let g = physics_config.ground_half_extent;
        let ground_center = Vec3::new(0.0, -0.5, 0.0);
        let ground_half = Vec3::new(g, 0.5, g);
        physics.add_body(&BodySpec::fixed_cuboid(ground_center, ground_half))?;
        let ground = world
            .spawn((
                Transform3D::from_translation_scale(ground_center, ground_half * 2.0),
                WorldTransform3D(Mat4::IDENTITY),
                LocalBounds::from_asset(&ModelAsset::unit_cube()),
                NodeKind::Ground,
                Tint([0.12, 0.12, 0.14]),
            ))
            .id();
        nodes.push(ground);

        for instance in &plan.instances {
            let Some(entity) = catalog.get(instance.entity_index) else {
                continue;
            };
            let asset = match loader.load(entity.kind) {
                Ok(asset) => asset,
                Err(reason) => {
                    bus.push(SceneEvent::AssetFallback { id: entity.id.clone(), reason });
                    ModelAsset::unit_cube()
                }
            };
            let asset_extent = asset.max - asset.min;
            let scale = if asset_extent.cmpgt(Vec3::ZERO).all() {
                instance.scale / asset_extent
            } else {
                instance.scale
            };
            physics.add_body(&BodySpec::fixed_cuboid(instance.position, instance.half_extents))?;
            let node = world
                .spawn((
                    Transform3D::from_translation_scale(instance.position, scale),
                    WorldTransform3D(Mat4::IDENTITY),
                    LocalBounds::from_asset(&asset),
                    CatalogTag { index: instance.entity_index },
                    NodeKind::Building,
                    Tint(instance.color),
                ))
                .id();
            nodes.push(node);
            pick_nodes.push(node);
            node_entities.insert(node, instance.entity_index);
            bus.push(SceneEvent::BuildingPlaced { id: entity.id.clone() });
        }

        let vehicle = if mode == SimMode::Drive {
            let vehicle = Vehicle::spawn(physics, vehicle_config)?;
            let spawn: Vec3 = vehicle_config.spawn.into();
            let chassis_half: Vec3 = vehicle_config.chassis_half.into();
            let chassis = world
                .spawn((
                    Transform3D::from_translation_scale(spawn, chassis_half * 2.0),
                    WorldTransform3D(Mat4::IDENTITY),
                    LocalBounds::from_asset(&ModelAsset::unit_cube()),
                    NodeKind::Chassis,
                    Tint([0.85, 0.2, 0.2]),
                    BodyRef { handle: vehicle.chassis() },
                ))
                .id();
            nodes.push(chassis);
            body_nodes.push((chassis, vehicle.chassis()));
            for (handle, anchor) in vehicle.wheels().iter().zip(WHEEL_ANCHORS) {
                let size = Vec3::new(
                    vehicle_config.wheel_half_width * 2.0,
                    vehicle_config.wheel_radius * 2.0,
                    vehicle_config.wheel_radius * 2.0,
                );
                let wheel = world
                    .spawn((
                        Transform3D::from_translation_scale(spawn + anchor, size),
                        WorldTransform3D(Mat4::IDENTITY),
                        LocalBounds::from_asset(&ModelAsset::unit_cube()),
                        NodeKind::Wheel,
                        Tint([0.1, 0.1, 0.1]),
                        BodyRef { handle: *handle },
                    ))
                    .id();
                nodes.push(wheel);
                body_nodes.push((wheel, *handle));
            }
            Some(vehicle)
        } else {
            None
        };

        let mut scene =
            Self { world, nodes, pick_nodes, node_entities, body_nodes, torn_down: false };
        scene.sync_world_transforms();
        Ok((scene, vehicle))
    }

    /// Copies solver poses onto the dynamic nodes. Static buildings never
    /// move, so only body-backed nodes are touched.
    pub fn sync_body_transforms(&mut self, physics: &PhysicsWorld) {
        for &(node, handle) in &self.body_nodes {
            let Some((position, rotation)) = physics.body_pose(handle) else {
                continue;
            };
            if let Some(mut transform) = self.world.get_mut::<Transform3D>(node) {
                transform.translation = position;
                transform.rotation = rotation;
            }
        }
    }

    pub fn sync_world_transforms(&mut self) {
        for &node in &self.nodes {
            let Some(local) = self.world.get::<Transform3D>(node).copied() else {
                continue;
            };
            if let Some(mut cached) = self.world.get_mut::<WorldTransform3D>(node) {
                cached.0 = local.matrix();
            }
        }
    }

    pub fn transform(&self, node: Entity) -> Option<&Transform3D> {
        self.world.get::<Transform3D>(node)
    }

    pub fn world_transform(&self, node: Entity) -> Option<Mat4> {
        self.world.get::<WorldTransform3D>(node).map(|t| t.0)
    }

    pub fn bounds(&self, node: Entity) -> Option<&LocalBounds> {
        self.world.get::<LocalBounds>(node)
    }

    pub fn set_scale(&mut self, node: Entity, scale: Vec3) {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(node) {
            transform.scale = scale;
        }
    }

    /// Nodes eligible for hover and click resolution, in placement order.
    pub fn pick_nodes(&self) -> &[Entity] {
        &self.pick_nodes
    }

    pub fn catalog_index(&self, node: Entity) -> Option<usize> {
        self.node_entities.get(&node).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn render_instances(&self) -> Vec<RenderInstance> {
        self.nodes
            .iter()
            .filter_map(|node| {
                let transform = self.world.get::<WorldTransform3D>(*node)?.0;
                let color = self.world.get::<Tint>(*node)?.0;
                Some(RenderInstance { transform, color })
            })
            .collect()
    }

    /// Releases scene nodes and every physics body. Safe to call twice; the
    /// second call is a no-op.
    pub fn teardown(&mut self, physics: &mut PhysicsWorld) {
        if self.torn_down {
            return;
        }
        for node in self.nodes.drain(..) {
            self.world.despawn(node);
        }
        self.pick_nodes.clear();
        self.node_entities.clear();
        self.body_nodes.clear();
        physics.clear();
        self.torn_down = true;
    }
}
