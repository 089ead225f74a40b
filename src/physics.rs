use anyhow::{bail, Result};
use glam::{Quat, Vec3};
use rapier3d::prelude::{
    CCDSolver, CoefficientCombineRule, ColliderBuilder, ColliderHandle, ColliderSet,
    DefaultBroadPhase, Group, ImpulseJointSet, IntegrationParameters, InteractionGroups,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, Real,
    RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};

/// Solver iterations per step, bounded so worst-case cost per slice is fixed.
const SOLVER_ITERATIONS: usize = 10;

/// Ground plane and buildings.
pub const WORLD_GROUP: u32 = 1 << 0;
/// Chassis and wheels. Vehicle parts collide with the world but not with each
/// other; the wheels overlap the chassis box at their anchors.
pub const VEHICLE_GROUP: u32 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Fixed,
    Dynamic,
}

#[derive(Debug, Clone, Copy)]
pub enum BodyShape {
    Cuboid { half: Vec3 },
    Cylinder { half_height: f32, radius: f32 },
    Ball { radius: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct BodySpec {
    pub kind: BodyKind,
    pub shape: BodyShape,
    pub position: Vec3,
    pub mass: f32,
    pub friction: f32,
    pub friction_combine: CoefficientCombineRule,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub memberships: u32,
    pub filter: u32,
}

impl BodySpec {
    pub fn fixed_cuboid(position: Vec3, half: Vec3) -> Self {
        Self {
            kind: BodyKind::Fixed,
            shape: BodyShape::Cuboid { half },
            position,
            mass: 0.0,
            friction: 0.8,
            friction_combine: CoefficientCombineRule::Average,
            restitution: 0.3,
            linear_damping: 0.0,
            angular_damping: 0.0,
            memberships: WORLD_GROUP,
            filter: WORLD_GROUP | VEHICLE_GROUP,
        }
    }
}

/// Result of routing a force or torque to a body. Rejections are reported,
/// not panicked on; a bad input must never poison the solver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceOutcome {
    Applied,
    IgnoredStatic,
    RejectedNonFinite,
    UnknownBody,
}

/// Owned rapier world. Construction, mutation, and stepping all flow through
/// this type; nothing else holds solver state.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        if let Some(iterations) = std::num::NonZeroUsize::new(SOLVER_ITERATIONS) {
            integration_parameters.num_solver_iterations = iterations;
        }
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vec_to_rapier(gravity),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn add_body(&mut self, spec: &BodySpec) -> Result<(RigidBodyHandle, ColliderHandle)> {
        if !spec.position.is_finite() {
            bail!("Body position must be finite, got {:?}", spec.position);
        }
        if !spec.mass.is_finite() || spec.mass < 0.0 {
            bail!("Body mass must be finite and non-negative, got {}", spec.mass);
        }
        let builder = match spec.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linear_damping(spec.linear_damping)
                .angular_damping(spec.angular_damping),
        };
        let body = builder.translation(vec_to_rapier(spec.position)).build();
        let body_handle = self.bodies.insert(body);
        if spec.kind == BodyKind::Dynamic && spec.mass > 0.0 {
            if let Some(body) = self.bodies.get_mut(body_handle) {
                body.set_additional_mass(spec.mass, true);
                body.wake_up(true);
            }
        }
        let collider = match spec.shape {
            BodyShape::Cuboid { half } => ColliderBuilder::cuboid(half.x, half.y, half.z),
            BodyShape::Cylinder { half_height, radius } => {
                ColliderBuilder::cylinder(half_height, radius)
            }
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
        }
        .friction(spec.friction)
        .friction_combine_rule(spec.friction_combine)
        .restitution(spec.restitution)
        .collision_groups(InteractionGroups::new(
            Group::from_bits_truncate(spec.memberships),
            Group::from_bits_truncate(spec.filter),
        ))
        .build();
        let collider_handle =
            self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        Ok((body_handle, collider_handle))
    }

    /// Applies a body-local force, rotated into world space by the body's
    /// current orientation. Matches per-step force semantics: `step` clears
    /// all accumulated forces after integrating.
    pub fn apply_local_force(&mut self, handle: RigidBodyHandle, local: Vec3) -> ForceOutcome {
        if !local.is_finite() {
            return ForceOutcome::RejectedNonFinite;
        }
        let Some(body) = self.bodies.get_mut(handle) else {
            return ForceOutcome::UnknownBody;
        };
        if !body.is_dynamic() {
            return ForceOutcome::IgnoredStatic;
        }
        let world = *body.rotation() * vec_to_rapier(local);
        body.add_force(world, true);
        ForceOutcome::Applied
    }

    pub fn apply_local_torque(&mut self, handle: RigidBodyHandle, local: Vec3) -> ForceOutcome {
        if !local.is_finite() {
            return ForceOutcome::RejectedNonFinite;
        }
        let Some(body) = self.bodies.get_mut(handle) else {
            return ForceOutcome::UnknownBody;
        };
        if !body.is_dynamic() {
            return ForceOutcome::IgnoredStatic;
        }
        let world = *body.rotation() * vec_to_rapier(local);
        body.add_torque(world, true);
        ForceOutcome::Applied
    }

    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        let hooks = ();
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );
        self.query_pipeline.update(&self.colliders);
        // Forces last exactly one step; the next frame re-applies them from
        // live input instead of accumulating.
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.reset_forces(true);
                body.reset_torques(true);
            }
        }
    }

    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.bodies.get(handle)?;
        let translation = body.translation();
        let rotation = body.rotation();
        Some((
            Vec3::new(translation.x, translation.y, translation.z),
            Quat::from_xyzw(rotation.coords.x, rotation.coords.y, rotation.coords.z, rotation.coords.w),
        ))
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        let body = self.bodies.get(handle)?;
        let v = body.linvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        let _ = self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn clear(&mut self) {
        let handles: Vec<RigidBodyHandle> =
            self.bodies.iter().map(|(handle, _)| handle).collect();
        for handle in handles {
            self.remove_body(handle);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

fn vec_to_rapier(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}
