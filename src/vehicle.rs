use crate::config::VehicleConfig;
use crate::input::DriveKeys;
use crate::physics::{
    BodyKind, BodyShape, BodySpec, ForceOutcome, PhysicsWorld, VEHICLE_GROUP, WORLD_GROUP,
};
use anyhow::Result;
use glam::{Quat, Vec3};
use rapier3d::prelude::{CoefficientCombineRule, RigidBodyHandle};

/// Wheel anchor offsets from the chassis center: front-left, front-right,
/// rear-left, rear-right.
pub const WHEEL_ANCHORS: [Vec3; 4] = [
    Vec3::new(-1.5, -0.5, 1.2),
    Vec3::new(1.5, -0.5, 1.2),
    Vec3::new(-1.5, -0.5, -1.2),
    Vec3::new(1.5, -0.5, -1.2),
];

/// Drivable rig: one dynamic chassis box plus four dynamic wheel cylinders.
/// The parts share a collision group so they never collide with each other,
/// only with the world.
pub struct Vehicle {
    chassis: RigidBodyHandle,
    wheels: [RigidBodyHandle; 4],
    drive_force: f32,
    steer_torque: f32,
}

impl Vehicle {
    pub fn spawn(physics: &mut PhysicsWorld, config: &VehicleConfig) -> Result<Self> {
        let spawn: Vec3 = config.spawn.into();
        // The chassis slides on its belly; a frictionless contact keeps the
        // drive force effective and leaves stopping to the linear damping.
        let (chassis, _) = physics.add_body(&BodySpec {
            kind: BodyKind::Dynamic,
            shape: BodyShape::Cuboid { half: config.chassis_half.into() },
            position: spawn,
            mass: config.chassis_mass,
            friction: 0.0,
            friction_combine: CoefficientCombineRule::Min,
            restitution: 0.3,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            memberships: VEHICLE_GROUP,
            filter: WORLD_GROUP,
        })?;
        let mut wheels = [RigidBodyHandle::invalid(); 4];
        for (slot, anchor) in wheels.iter_mut().zip(WHEEL_ANCHORS) {
            let (wheel, _) = physics.add_body(&BodySpec {
                kind: BodyKind::Dynamic,
                shape: BodyShape::Cylinder {
                    half_height: config.wheel_half_width,
                    radius: config.wheel_radius,
                },
                position: spawn + anchor,
                mass: config.wheel_mass,
                friction: 1.5,
                friction_combine: CoefficientCombineRule::Average,
                restitution: 0.1,
                linear_damping: config.linear_damping,
                angular_damping: config.angular_damping,
                memberships: VEHICLE_GROUP,
                filter: WORLD_GROUP,
            })?;
            *slot = wheel;
        }
        Ok(Self { chassis, wheels, drive_force: config.drive_force, steer_torque: config.steer_torque })
    }

    /// Translates the current key snapshot into chassis-local forces. Applied
    /// once per fixed tick, before the physics step; opposing keys cancel.
    pub fn apply_drive(&self, physics: &mut PhysicsWorld, keys: DriveKeys) -> ForceOutcome {
        let mut thrust = 0.0;
        if keys.contains(DriveKeys::FORWARD) {
            thrust += self.drive_force;
        }
        if keys.contains(DriveKeys::REVERSE) {
            thrust -= self.drive_force;
        }
        let mut yaw = 0.0;
        if keys.contains(DriveKeys::STEER_LEFT) {
            yaw += self.steer_torque;
        }
        if keys.contains(DriveKeys::STEER_RIGHT) {
            yaw -= self.steer_torque;
        }
        let mut outcome = ForceOutcome::Applied;
        if thrust != 0.0 {
            outcome = physics.apply_local_force(self.chassis, Vec3::new(0.0, 0.0, thrust));
        }
        if yaw != 0.0 {
            let torque = physics.apply_local_torque(self.chassis, Vec3::new(0.0, yaw, 0.0));
            if outcome == ForceOutcome::Applied {
                outcome = torque;
            }
        }
        outcome
    }

    pub fn chassis(&self) -> RigidBodyHandle {
        self.chassis
    }

    pub fn wheels(&self) -> &[RigidBodyHandle; 4] {
        &self.wheels
    }

    pub fn chassis_pose(&self, physics: &PhysicsWorld) -> Option<(Vec3, Quat)> {
        physics.body_pose(self.chassis)
    }

    pub fn despawn(self, physics: &mut PhysicsWorld) {
        physics.remove_body(self.chassis);
        for wheel in self.wheels {
            physics.remove_body(wheel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    fn world_with_ground() -> PhysicsWorld {
        let config = PhysicsConfig::default();
        let mut physics = PhysicsWorld::new(config.gravity.into());
        physics
            .add_body(&BodySpec::fixed_cuboid(
                Vec3::new(0.0, -0.5, 0.0),
                Vec3::new(config.ground_half_extent, 0.5, config.ground_half_extent),
            ))
            .expect("ground");
        physics
    }

    #[test]
    fn spawn_creates_five_bodies() {
        let mut physics = world_with_ground();
        let vehicle = Vehicle::spawn(&mut physics, &VehicleConfig::default()).expect("spawn");
        assert_eq!(physics.body_count(), 6);
        assert!(vehicle.chassis_pose(&physics).is_some());
    }

    #[test]
    fn forward_drive_moves_chassis_along_local_z() {
        let mut physics = world_with_ground();
        let vehicle = Vehicle::spawn(&mut physics, &VehicleConfig::default()).expect("spawn");
        // Settle onto the ground before driving.
        for _ in 0..120 {
            physics.step(1.0 / 60.0);
        }
        let (start, _) = vehicle.chassis_pose(&physics).expect("pose");
        for _ in 0..180 {
            vehicle.apply_drive(&mut physics, DriveKeys::FORWARD);
            physics.step(1.0 / 60.0);
        }
        let (end, _) = vehicle.chassis_pose(&physics).expect("pose");
        assert!(end.z - start.z > 1.0, "moved {} along z", end.z - start.z);
        assert!((end.x - start.x).abs() < 1.0);
    }

    #[test]
    fn steering_yaws_the_chassis() {
        let mut physics = world_with_ground();
        let vehicle = Vehicle::spawn(&mut physics, &VehicleConfig::default()).expect("spawn");
        for _ in 0..120 {
            physics.step(1.0 / 60.0);
        }
        let (_, start_rot) = vehicle.chassis_pose(&physics).expect("pose");
        for _ in 0..180 {
            vehicle.apply_drive(&mut physics, DriveKeys::FORWARD | DriveKeys::STEER_LEFT);
            physics.step(1.0 / 60.0);
        }
        let (_, end_rot) = vehicle.chassis_pose(&physics).expect("pose");
        let start_forward = start_rot * Vec3::Z;
        let end_forward = end_rot * Vec3::Z;
        let yaw_delta = start_forward.xz_angle_to(end_forward);
        assert!(yaw_delta.abs() > 0.05, "yawed by {yaw_delta}");
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut physics = world_with_ground();
        let vehicle = Vehicle::spawn(&mut physics, &VehicleConfig::default()).expect("spawn");
        for _ in 0..120 {
            physics.step(1.0 / 60.0);
        }
        let (start, _) = vehicle.chassis_pose(&physics).expect("pose");
        for _ in 0..120 {
            vehicle.apply_drive(&mut physics, DriveKeys::FORWARD | DriveKeys::REVERSE);
            physics.step(1.0 / 60.0);
        }
        let (end, _) = vehicle.chassis_pose(&physics).expect("pose");
        assert!((end - start).length() < 0.2);
    }

    #[test]
    fn despawn_removes_all_parts() {
        let mut physics = world_with_ground();
        let vehicle = Vehicle::spawn(&mut physics, &VehicleConfig::default()).expect("spawn");
        vehicle.despawn(&mut physics);
        assert_eq!(physics.body_count(), 1);
    }

    trait XzAngle {
        fn xz_angle_to(self, other: Vec3) -> f32;
    }

    impl XzAngle for Vec3 {
        fn xz_angle_to(self, other: Vec3) -> f32 {
            let a = f32::atan2(self.x, self.z);
            let b = f32::atan2(other.x, other.z);
            let mut d = b - a;
            while d > std::f32::consts::PI {
                d -= std::f32::consts::TAU;
            }
            while d < -std::f32::consts::PI {
                d += std::f32::consts::TAU;
            }
            d
        }
    }
}
