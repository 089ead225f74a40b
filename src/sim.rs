use crate::ambient::ParticleField;
use crate::camera::{Camera3D, CameraMode, CameraRig, RigSettings};
use crate::catalog::{Catalog, CodeEntity, DistrictMap};
use crate::config::{EngineConfig, SimMode};
use crate::effects::Effects;
use crate::events::{EventBus, SceneEvent};
use crate::input::Input;
use crate::layout;
use crate::model::ModelLoader;
use crate::physics::PhysicsWorld;
use crate::picking;
use crate::scene::{CityScene, RenderInstance};
use crate::time::{FixedStepper, Time};
use crate::vehicle::Vehicle;
use anyhow::Result;
use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

/// Per-frame report: how many fixed slices ran and whether backlog was shed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTick {
    pub fixed_steps: u32,
    pub dropped_seconds: Option<f32>,
}

/// The whole engine state behind one explicit owner: scene, physics, vehicle,
/// camera rig, input, effects, and the event bus. Every frame flows through
/// `advance`, which keeps the update order fixed regardless of frame rate.
pub struct Simulation {
    mode: SimMode,
    catalog: Catalog,
    scene: CityScene,
    physics: PhysicsWorld,
    vehicle: Option<Vehicle>,
    rig: CameraRig,
    input: Input,
    effects: Effects,
    ambient: ParticleField,
    bus: EventBus,
    stepper: FixedStepper,
    max_backlog: f32,
    time: Time,
    viewport: PhysicalSize<u32>,
    hovered: Option<usize>,
}

impl Simulation {
    pub fn new(
        config: &EngineConfig,
        catalog: Catalog,
        loader: &mut dyn ModelLoader,
    ) -> Result<Self> {
        let districts = DistrictMap::builtin();
        let plan = layout::plan(&catalog, &districts);
        let mut physics = PhysicsWorld::new(config.physics.gravity.into());
        let mut bus = EventBus::new();
        let (scene, vehicle) = CityScene::build(
            &catalog,
            &plan,
            &mut physics,
            loader,
            config.mode,
            &config.physics,
            &config.vehicle,
            &mut bus,
        )?;
        let camera = Camera3D::new(
            config.camera.position.into(),
            Vec3::ZERO,
            config.camera.fov_y_degrees.to_radians(),
            config.camera.near,
            config.camera.far,
        );
        let settings = RigSettings {
            follow_offset: config.camera.follow_offset.into(),
            follow_rate: config.camera.follow_rate,
            overview_point: config.camera.overview_point.into(),
            overview_rate: config.camera.overview_rate,
        };
        Ok(Self {
            mode: config.mode,
            catalog,
            scene,
            physics,
            vehicle,
            rig: CameraRig::new(camera, config.camera.initial_mode, settings),
            input: Input::new(),
            effects: Effects::new(),
            ambient: ParticleField::new(&config.ambient),
            bus,
            stepper: FixedStepper::new(config.physics.fixed_dt),
            max_backlog: config.physics.max_backlog,
            time: Time::new(),
            viewport: PhysicalSize::new(config.window.width, config.window.height),
            hovered: None,
        })
    }

    /// Advances the simulation by `dt` seconds of render time. Fixed order:
    /// discrete input, physics slices at the fixed step, render-time effects,
    /// then deferred pointer resolution against the settled transforms.
    pub fn advance(&mut self, dt: f32) -> SimTick {
        let mut tick = SimTick::default();
        if self.scene.is_torn_down() {
            return tick;
        }

        if let Some(size) = self.input.take_resize() {
            self.resize(size);
        }
        if self.input.take_cycle_request() {
            self.cycle_camera();
        }
        let keys = self.input.snapshot();

        if let Some(dropped) = self.stepper.accumulate(dt, self.max_backlog) {
            self.bus.push(SceneEvent::BacklogDropped { seconds: dropped });
            tick.dropped_seconds = Some(dropped);
        }
        while let Some(fixed_dt) = self.stepper.pop() {
            if self.mode == SimMode::Drive {
                if let Some(vehicle) = &self.vehicle {
                    vehicle.apply_drive(&mut self.physics, keys);
                }
                self.physics.step(fixed_dt);
                self.scene.sync_body_transforms(&self.physics);
            }
            let focus = self
                .vehicle
                .as_ref()
                .and_then(|vehicle| vehicle.chassis_pose(&self.physics))
                .map(|(position, _)| position);
            self.rig.update(focus);
            tick.fixed_steps += 1;
        }

        self.ambient.update(dt);
        self.effects.update(&mut self.scene, dt);
        self.scene.sync_world_transforms();

        let cursor = self.input.cursor_position();
        if self.input.take_cursor_moved() {
            if let Some((x, y)) = cursor {
                self.resolve_hover(Vec2::new(x, y));
            }
        }
        if self.input.take_click() {
            if let Some((x, y)) = cursor {
                self.resolve_click(Vec2::new(x, y));
            }
        }
        tick
    }

    /// Wall-clock variant of `advance` for windowed runs.
    pub fn frame(&mut self) -> SimTick {
        self.time.tick();
        let dt = self.time.delta_seconds();
        self.advance(dt)
    }

    /// Records a window event into input state; nothing is processed inline,
    /// the next `advance` consumes it.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.input.handle_window_event(event);
    }

    /// On-demand pick query against the latest synced transforms.
    pub fn pick(&self, screen: Vec2) -> Option<&CodeEntity> {
        let hit = picking::pick_at(&self.scene, &self.rig.camera, screen, self.viewport)?;
        self.catalog.get(hit.entity_index)
    }

    fn resolve_hover(&mut self, screen: Vec2) {
        let hit = picking::pick_at(&self.scene, &self.rig.camera, screen, self.viewport);
        let hovered = hit.map(|hit| hit.entity_index);
        if hovered != self.hovered {
            self.hovered = hovered;
            let id = hovered
                .and_then(|index| self.catalog.get(index))
                .map(|entity| entity.id.clone());
            self.bus.push(SceneEvent::HoverChanged { id });
        }
    }

    fn resolve_click(&mut self, screen: Vec2) {
        let Some(hit) = picking::pick_at(&self.scene, &self.rig.camera, screen, self.viewport)
        else {
            return;
        };
        let Some(entity) = self.catalog.get(hit.entity_index) else {
            return;
        };
        self.bus.push(SceneEvent::EntityClicked { id: entity.id.clone() });
        let node = self
            .scene
            .pick_nodes()
            .iter()
            .copied()
            .find(|node| self.scene.catalog_index(*node) == Some(hit.entity_index));
        if let Some(node) = node {
            self.effects.trigger_pulse(&self.scene, node);
        }
    }

    pub fn cycle_camera(&mut self) -> CameraMode {
        let mode = self.rig.cycle();
        self.bus.push(SceneEvent::CameraModeChanged { mode });
        mode
    }

    /// Ignores degenerate sizes; the last valid viewport stays active.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.viewport = size;
    }

    /// Releases the scene and every physics body. Subsequent `advance` calls
    /// become no-ops.
    pub fn request_teardown(&mut self) {
        if let Some(vehicle) = self.vehicle.take() {
            vehicle.despawn(&mut self.physics);
        }
        self.scene.teardown(&mut self.physics);
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.bus.drain()
    }

    pub fn render_instances(&self) -> Vec<RenderInstance> {
        self.scene.render_instances()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.rig.mode()
    }

    pub fn camera(&self) -> &Camera3D {
        &self.rig.camera
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    pub fn mode(&self) -> SimMode {
        self.mode
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scene(&self) -> &CityScene {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    pub fn ambient(&self) -> &ParticleField {
        &self.ambient
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }
}
