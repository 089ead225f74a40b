use crate::camera::CameraMode;
use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2Data> for Vec2 {
    fn from(value: Vec2Data) -> Self {
        Vec2::new(value.x, value.y)
    }
}

impl From<Vec2> for Vec2Data {
    fn from(value: Vec2) -> Self {
        Self { x: value.x, y: value.y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

impl From<Vec3> for Vec3Data {
    fn from(value: Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

/// One engine, two configurations: `Drive` runs the vehicle plus the stepped
/// physics world; `Static` builds the deterministic city and serves picking
/// only (static colliders exist but nothing is integrated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimMode {
    #[default]
    Drive,
    Static,
}

impl SimMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "drive" => Some(Self::Drive),
            "static" => Some(Self::Static),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_title")]
    pub title: String,
    #[serde(default = "WindowConfig::default_width")]
    pub width: u32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: u32,
}

impl WindowConfig {
    fn default_title() -> String {
        "Code City".to_string()
    }
    const fn default_width() -> u32 {
        1280
    }
    const fn default_height() -> u32 {
        720
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "PhysicsConfig::default_gravity")]
    pub gravity: Vec3Data,
    #[serde(default = "PhysicsConfig::default_fixed_dt")]
    pub fixed_dt: f32,
    #[serde(default = "PhysicsConfig::default_max_backlog")]
    pub max_backlog: f32,
    #[serde(default = "PhysicsConfig::default_ground_half_extent")]
    pub ground_half_extent: f32,
}

impl PhysicsConfig {
    fn default_gravity() -> Vec3Data {
        Vec3Data { x: 0.0, y: -9.82, z: 0.0 }
    }
    const fn default_fixed_dt() -> f32 {
        1.0 / 60.0
    }
    const fn default_max_backlog() -> f32 {
        0.25
    }
    const fn default_ground_half_extent() -> f32 {
        150.0
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Self::default_gravity(),
            fixed_dt: Self::default_fixed_dt(),
            max_backlog: Self::default_max_backlog(),
            ground_half_extent: Self::default_ground_half_extent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    #[serde(default = "VehicleConfig::default_chassis_half")]
    pub chassis_half: Vec3Data,
    #[serde(default = "VehicleConfig::default_chassis_mass")]
    pub chassis_mass: f32,
    #[serde(default = "VehicleConfig::default_spawn")]
    pub spawn: Vec3Data,
    #[serde(default = "VehicleConfig::default_wheel_radius")]
    pub wheel_radius: f32,
    #[serde(default = "VehicleConfig::default_wheel_half_width")]
    pub wheel_half_width: f32,
    #[serde(default = "VehicleConfig::default_wheel_mass")]
    pub wheel_mass: f32,
    #[serde(default = "VehicleConfig::default_drive_force")]
    pub drive_force: f32,
    #[serde(default = "VehicleConfig::default_steer_torque")]
    pub steer_torque: f32,
    #[serde(default = "VehicleConfig::default_linear_damping")]
    pub linear_damping: f32,
    #[serde(default = "VehicleConfig::default_angular_damping")]
    pub angular_damping: f32,
}

impl VehicleConfig {
    fn default_chassis_half() -> Vec3Data {
        Vec3Data { x: 2.0, y: 0.75, z: 1.0 }
    }
    const fn default_chassis_mass() -> f32 {
        150.0
    }
    fn default_spawn() -> Vec3Data {
        Vec3Data { x: 0.0, y: 2.0, z: 0.0 }
    }
    const fn default_wheel_radius() -> f32 {
        0.4
    }
    const fn default_wheel_half_width() -> f32 {
        0.15
    }
    const fn default_wheel_mass() -> f32 {
        10.0
    }
    const fn default_drive_force() -> f32 {
        300.0
    }
    const fn default_steer_torque() -> f32 {
        50.0
    }
    const fn default_linear_damping() -> f32 {
        0.1
    }
    const fn default_angular_damping() -> f32 {
        1.0
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            chassis_half: Self::default_chassis_half(),
            chassis_mass: Self::default_chassis_mass(),
            spawn: Self::default_spawn(),
            wheel_radius: Self::default_wheel_radius(),
            wheel_half_width: Self::default_wheel_half_width(),
            wheel_mass: Self::default_wheel_mass(),
            drive_force: Self::default_drive_force(),
            steer_torque: Self::default_steer_torque(),
            linear_damping: Self::default_linear_damping(),
            angular_damping: Self::default_angular_damping(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_y_degrees")]
    pub fov_y_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
    #[serde(default = "CameraConfig::default_position")]
    pub position: Vec3Data,
    #[serde(default = "CameraConfig::default_follow_offset")]
    pub follow_offset: Vec3Data,
    #[serde(default = "CameraConfig::default_follow_rate")]
    pub follow_rate: f32,
    #[serde(default = "CameraConfig::default_overview_point")]
    pub overview_point: Vec3Data,
    #[serde(default = "CameraConfig::default_overview_rate")]
    pub overview_rate: f32,
    #[serde(default)]
    pub initial_mode: CameraMode,
}

impl CameraConfig {
    const fn default_fov_y_degrees() -> f32 {
        75.0
    }
    const fn default_near() -> f32 {
        0.1
    }
    const fn default_far() -> f32 {
        1000.0
    }
    fn default_position() -> Vec3Data {
        Vec3Data { x: 0.0, y: 15.0, z: 30.0 }
    }
    fn default_follow_offset() -> Vec3Data {
        Vec3Data { x: 0.0, y: 8.0, z: -15.0 }
    }
    const fn default_follow_rate() -> f32 {
        0.05
    }
    fn default_overview_point() -> Vec3Data {
        Vec3Data { x: 0.0, y: 50.0, z: 50.0 }
    }
    const fn default_overview_rate() -> f32 {
        0.02
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: Self::default_fov_y_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
            position: Self::default_position(),
            follow_offset: Self::default_follow_offset(),
            follow_rate: Self::default_follow_rate(),
            overview_point: Self::default_overview_point(),
            overview_rate: Self::default_overview_rate(),
            initial_mode: CameraMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmbientConfig {
    #[serde(default = "AmbientConfig::default_particle_count")]
    pub particle_count: u32,
    #[serde(default = "AmbientConfig::default_half_extent")]
    pub half_extent: f32,
    #[serde(default = "AmbientConfig::default_max_height")]
    pub max_height: f32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AmbientConfig {
    const fn default_particle_count() -> u32 {
        100
    }
    const fn default_half_extent() -> f32 {
        100.0
    }
    const fn default_max_height() -> f32 {
        30.0
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            particle_count: Self::default_particle_count(),
            half_extent: Self::default_half_extent(),
            max_height: Self::default_max_height(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
    #[serde(default)]
    pub mode: SimMode,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("[config] {err:#}; falling back to defaults");
                Self::default()
            }
        }
    }
}
