use crate::catalog::EntityKind;
use glam::Vec3;

/// Local-space bounds of a loaded (or procedural) mesh asset. The scene only
/// needs extents for scaling and picking; vertex data stays renderer-side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelAsset {
    pub min: Vec3,
    pub max: Vec3,
}

impl ModelAsset {
    /// Unit cube centered at the origin, the guaranteed fallback shape.
    pub fn unit_cube() -> Self {
        Self { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) }
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn center(&self) -> Vec3 {
        (self.max + self.min) * 0.5
    }
}

/// Conventional asset key per entity kind. Loaders are free to ignore it.
pub fn asset_key(kind: EntityKind) -> String {
    format!("models/{}.glb", kind.label())
}

/// Source of building meshes. Scene build calls this once per placed
/// instance; a failure is not fatal, the instance falls back to
/// [`ModelAsset::unit_cube`] and the scene reports the substitution.
pub trait ModelLoader {
    fn load(&mut self, kind: EntityKind) -> Result<ModelAsset, String>;
}

/// Default loader: procedural unit cubes for every kind, never fails.
#[derive(Debug, Default)]
pub struct PrimitiveLoader;

impl ModelLoader for PrimitiveLoader {
    fn load(&mut self, _kind: EntityKind) -> Result<ModelAsset, String> {
        Ok(ModelAsset::unit_cube())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_is_symmetric() {
        let cube = ModelAsset::unit_cube();
        assert_eq!(cube.half_extents(), Vec3::splat(0.5));
        assert_eq!(cube.center(), Vec3::ZERO);
    }

    #[test]
    fn asset_keys_follow_kind_labels() {
        assert_eq!(asset_key(EntityKind::Module), "models/module.glb");
        assert_eq!(asset_key(EntityKind::Class), "models/class.glb");
        assert_eq!(asset_key(EntityKind::Function), "models/function.glb");
    }

    #[test]
    fn primitive_loader_always_succeeds() {
        let mut loader = PrimitiveLoader;
        assert!(loader.load(EntityKind::Class).is_ok());
    }
}
