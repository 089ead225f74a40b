use crate::scene::CityScene;
use bevy_ecs::prelude::Entity;
use glam::Vec3;
use std::collections::HashMap;

pub const PULSE_DURATION: f32 = 0.35;
pub const PULSE_AMPLITUDE: f32 = 0.25;

/// A click feedback animation on one node: a sine envelope over the node's
/// base scale. The base is captured at trigger time so the effect restores
/// the exact pre-pulse scale when it ends.
#[derive(Debug, Clone, Copy)]
struct PulseEffect {
    base_scale: Vec3,
    elapsed: f32,
}

/// Timed, self-reverting visual effects. Advanced on render time, not the
/// fixed physics step, so pulse playback speed is independent of the
/// simulation backlog.
#[derive(Debug, Default)]
pub struct Effects {
    pulses: HashMap<Entity, PulseEffect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a pulse on `node`. Retriggering while a pulse is
    /// live restarts the envelope but keeps the originally captured base, so
    /// rapid clicks cannot compound the scale.
    pub fn trigger_pulse(&mut self, scene: &CityScene, node: Entity) {
        let base_scale = match self.pulses.get(&node) {
            Some(active) => active.base_scale,
            None => match scene.transform(node) {
                Some(transform) => transform.scale,
                None => return,
            },
        };
        self.pulses.insert(node, PulseEffect { base_scale, elapsed: 0.0 });
    }

    pub fn update(&mut self, scene: &mut CityScene, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            return;
        }
        let mut finished = Vec::new();
        for (&node, pulse) in self.pulses.iter_mut() {
            pulse.elapsed += dt;
            if pulse.elapsed >= PULSE_DURATION {
                scene.set_scale(node, pulse.base_scale);
                finished.push(node);
                continue;
            }
            let phase = (pulse.elapsed / PULSE_DURATION) * std::f32::consts::PI;
            let factor = 1.0 + PULSE_AMPLITUDE * phase.sin();
            scene.set_scale(node, pulse.base_scale * factor);
        }
        for node in finished {
            self.pulses.remove(&node);
        }
    }

    pub fn active_count(&self) -> usize {
        self.pulses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, DistrictMap};
    use crate::config::{PhysicsConfig, SimMode, VehicleConfig};
    use crate::events::EventBus;
    use crate::layout;
    use crate::model::PrimitiveLoader;
    use crate::physics::PhysicsWorld;

    fn demo_scene() -> CityScene {
        let catalog = Catalog::demo();
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
        scene
    }

    #[test]
    fn pulse_grows_then_restores_exact_base() {
        let mut scene = demo_scene();
        let node = scene.pick_nodes()[0];
        let base = scene.transform(node).expect("transform").scale;
        let mut effects = Effects::new();
        effects.trigger_pulse(&scene, node);
        effects.update(&mut scene, PULSE_DURATION * 0.5);
        let mid = scene.transform(node).expect("transform").scale;
        assert!(mid.x > base.x);
        effects.update(&mut scene, PULSE_DURATION);
        let after = scene.transform(node).expect("transform").scale;
        assert_eq!(after, base);
        assert_eq!(effects.active_count(), 0);
    }

    #[test]
    fn retrigger_mid_pulse_keeps_the_original_base() {
        let mut scene = demo_scene();
        let node = scene.pick_nodes()[0];
        let base = scene.transform(node).expect("transform").scale;
        let mut effects = Effects::new();
        effects.trigger_pulse(&scene, node);
        effects.update(&mut scene, PULSE_DURATION * 0.5);
        // Second click while scaled up must not capture the inflated scale.
        effects.trigger_pulse(&scene, node);
        effects.update(&mut scene, PULSE_DURATION);
        assert_eq!(scene.transform(node).expect("transform").scale, base);
    }

    #[test]
    fn unknown_node_is_ignored() {
        let scene = demo_scene();
        let mut effects = Effects::new();
        effects.trigger_pulse(&scene, Entity::PLACEHOLDER);
        assert_eq!(effects.active_count(), 0);
    }
}
