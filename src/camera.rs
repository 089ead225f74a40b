use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::Deserialize;
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera; view/projection math plus screen-space ray and point
/// projection used by the picking resolver.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        let aspect =
            if viewport.height > 0 { viewport.width as f32 / viewport.height as f32 } else { 1.0 };
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Generates a world-space ray originating from the camera through a
    /// screen-space position. Returns `None` for a zero-sized viewport.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let view = self.view_matrix();
        let proj = self.projection_matrix(viewport.width as f32 / viewport.height as f32);
        let inv_view_proj = (proj * view).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let world_pos = (world.truncate() / world.w) - self.position;
        let dir = world_pos.normalize();
        Some((self.position, dir))
    }

    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let view = self.view_matrix();
        let proj = self.projection_matrix(viewport.width as f32 / viewport.height as f32);
        let clip = proj * view * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Follow,
    Overview,
    Free,
}

impl CameraMode {
    pub fn next(self) -> Self {
        match self {
            Self::Follow => Self::Overview,
            Self::Overview => Self::Free,
            Self::Free => Self::Follow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Overview => "overview",
            Self::Free => "free",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RigSettings {
    pub follow_offset: Vec3,
    pub follow_rate: f32,
    pub overview_point: Vec3,
    pub overview_rate: f32,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            follow_offset: Vec3::new(0.0, 8.0, -15.0),
            follow_rate: 0.05,
            overview_point: Vec3::new(0.0, 50.0, 50.0),
            overview_rate: 0.02,
        }
    }
}

/// Finite-state camera rig. Transitions are external discrete events
/// (`cycle`); `update` runs once per fixed tick and only ever interpolates
/// position toward the current target, never the target definition itself.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: Camera3D,
    mode: CameraMode,
    settings: RigSettings,
}

impl CameraRig {
    pub fn new(camera: Camera3D, mode: CameraMode, settings: RigSettings) -> Self {
        let settings = RigSettings {
            follow_rate: settings.follow_rate.clamp(0.0, 1.0),
            overview_rate: settings.overview_rate.clamp(0.0, 1.0),
            ..settings
        };
        Self { camera, mode, settings }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Advances follow -> overview -> free -> follow. Takes effect on the
    /// next tick.
    pub fn cycle(&mut self) -> CameraMode {
        self.mode = self.mode.next();
        self.mode
    }

    pub fn update(&mut self, focus: Option<Vec3>) {
        match self.mode {
            CameraMode::Follow => {
                // Without a focus (picking-only scenes) follow has nothing to
                // chase; hold position like free mode.
                let Some(focus) = focus else {
                    return;
                };
                let target = focus + self.settings.follow_offset;
                self.camera.position =
                    self.camera.position.lerp(target, self.settings.follow_rate);
                self.camera.target = focus;
            }
            CameraMode::Overview => {
                self.camera.position = self
                    .camera
                    .position
                    .lerp(self.settings.overview_point, self.settings.overview_rate);
                self.camera.target = Vec3::ZERO;
            }
            CameraMode::Free => {}
        }
    }
}
