use crate::catalog::{Catalog, CodeEntity, DistrictMap, EntityKind};
use glam::{Vec2, Vec3};

// Semantic scale weights. Layout must stay a pure function of entity
// attributes: identical catalogs reproduce identical plans bit-for-bit.
pub const MODULE_BASE_WIDTH: f32 = 2.0;
pub const MODULE_DEP_WEIGHT: f32 = 0.5;
pub const MODULE_BASE_HEIGHT: f32 = 2.0;
pub const MODULE_LOC_HEIGHT_WEIGHT: f32 = 0.02;

pub const CLASS_BASE_WIDTH: f32 = 1.5;
pub const CLASS_LOC_WIDTH_WEIGHT: f32 = 0.004;
pub const CLASS_COMPLEXITY_WIDTH_WEIGHT: f32 = 0.1;
pub const CLASS_BASE_HEIGHT: f32 = 1.5;
pub const CLASS_LOC_HEIGHT_WEIGHT: f32 = 0.015;
pub const CLASS_COMPLEXITY_HEIGHT_WEIGHT: f32 = 0.25;

pub const FUNCTION_BASE_WIDTH: f32 = 1.0;
pub const FUNCTION_COMPLEXITY_WIDTH_WEIGHT: f32 = 0.05;
pub const FUNCTION_BASE_HEIGHT: f32 = 1.0;
pub const FUNCTION_LOC_HEIGHT_WEIGHT: f32 = 0.01;
pub const FUNCTION_COMPLEXITY_HEIGHT_WEIGHT: f32 = 0.1;

const MAX_WIDTH: f32 = 12.0;
const MAX_HEIGHT: f32 = 40.0;

/// One catalog entity placed in the world. Created once at scene-build time,
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedInstance {
    pub entity_index: usize,
    /// Center of the building volume; y is half the height so the footprint
    /// rests on the ground plane.
    pub position: Vec3,
    /// Full extents (width, height, depth) applied as node scale.
    pub scale: Vec3,
    pub half_extents: Vec3,
    pub color: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct LayoutRejection {
    pub entity_index: usize,
    pub id: String,
    pub district: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutPlan {
    pub instances: Vec<PlacedInstance>,
    pub rejected: Vec<LayoutRejection>,
}

/// Derives the visual extents of a building from entity metrics. Deterministic
/// and type-dependent: modules widen with fan-out and rise with size, classes
/// grow with both size and complexity, functions stay small.
pub fn building_scale(entity: &CodeEntity) -> Vec3 {
    let loc = entity.lines_of_code as f32;
    let complexity = f32::from(entity.complexity);
    let (width, height) = match entity.kind {
        EntityKind::Module => {
            let deps = entity.dependencies.len() as f32;
            (
                MODULE_BASE_WIDTH + deps * MODULE_DEP_WEIGHT,
                MODULE_BASE_HEIGHT + loc * MODULE_LOC_HEIGHT_WEIGHT,
            )
        }
        EntityKind::Class => (
            CLASS_BASE_WIDTH
                + loc * CLASS_LOC_WIDTH_WEIGHT
                + complexity * CLASS_COMPLEXITY_WIDTH_WEIGHT,
            CLASS_BASE_HEIGHT
                + loc * CLASS_LOC_HEIGHT_WEIGHT
                + complexity * CLASS_COMPLEXITY_HEIGHT_WEIGHT,
        ),
        EntityKind::Function => (
            FUNCTION_BASE_WIDTH + complexity * FUNCTION_COMPLEXITY_WIDTH_WEIGHT,
            FUNCTION_BASE_HEIGHT
                + loc * FUNCTION_LOC_HEIGHT_WEIGHT
                + complexity * FUNCTION_COMPLEXITY_HEIGHT_WEIGHT,
        ),
    };
    let width = width.min(MAX_WIDTH);
    let height = height.min(MAX_HEIGHT);
    Vec3::new(width, height, width)
}

/// Maps every catalog entity to a world placement. Entities referencing an
/// unknown district, or authored outside their district radius, are rejected
/// individually; the rest of the catalog still builds (partial failure, not
/// whole-scene abort).
pub fn plan(catalog: &Catalog, districts: &DistrictMap) -> LayoutPlan {
    let mut out = LayoutPlan::default();
    for (index, entity) in catalog.entities().iter().enumerate() {
        let Some(district) = districts.get(&entity.district) else {
            out.rejected.push(LayoutRejection {
                entity_index: index,
                id: entity.id.clone(),
                district: entity.district.clone(),
                reason: "unknown district".to_string(),
            });
            continue;
        };
        let offset = entity.offset();
        if offset.length() > district.radius {
            out.rejected.push(LayoutRejection {
                entity_index: index,
                id: entity.id.clone(),
                district: entity.district.clone(),
                reason: format!(
                    "offset {:.1} exceeds district radius {:.1}",
                    offset.length(),
                    district.radius
                ),
            });
            continue;
        }
        let scale = building_scale(entity);
        let footprint: Vec2 = district.center + offset;
        out.instances.push(PlacedInstance {
            entity_index: index,
            position: Vec3::new(footprint.x, scale.y * 0.5, footprint.y),
            scale,
            half_extents: scale * 0.5,
            color: district.color,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DISTRICT_RADIUS;

    fn demo_plan() -> LayoutPlan {
        plan(&Catalog::demo(), &DistrictMap::builtin())
    }

    #[test]
    fn layout_is_bit_identical_across_runs() {
        let a = demo_plan();
        let b = demo_plan();
        assert_eq!(a.instances.len(), b.instances.len());
        for (lhs, rhs) in a.instances.iter().zip(b.instances.iter()) {
            for (l, r) in lhs
                .position
                .to_array()
                .iter()
                .chain(lhs.scale.to_array().iter())
                .zip(rhs.position.to_array().iter().chain(rhs.scale.to_array().iter()))
            {
                assert_eq!(l.to_bits(), r.to_bits());
            }
        }
    }

    #[test]
    fn placements_stay_within_district_radius() {
        let catalog = Catalog::demo();
        let districts = DistrictMap::builtin();
        for instance in demo_plan().instances {
            let entity = catalog.get(instance.entity_index).expect("entity");
            let district = districts.get(&entity.district).expect("district");
            let footprint = Vec2::new(instance.position.x, instance.position.z);
            assert!((footprint - district.center).length() <= DISTRICT_RADIUS + 1e-4);
        }
    }

    #[test]
    fn module_scale_matches_weight_formula() {
        // module, district core, 150 lines, 3 dependencies, authored at
        // offset (0, -8): the demo catalog's first entry.
        let catalog = Catalog::demo();
        let plan = demo_plan();
        let instance = plan.instances[0];
        let entity = catalog.get(instance.entity_index).expect("entity");
        assert_eq!(entity.kind, EntityKind::Module);
        let expected_width = MODULE_BASE_WIDTH + 3.0 * MODULE_DEP_WEIGHT;
        let expected_height = MODULE_BASE_HEIGHT + 150.0 * MODULE_LOC_HEIGHT_WEIGHT;
        assert!((instance.scale.x - expected_width).abs() < 1e-6);
        assert!((instance.scale.y - expected_height).abs() < 1e-6);
        assert_eq!(instance.position, Vec3::new(0.0, expected_height * 0.5, -8.0));
    }

    #[test]
    fn unknown_district_rejects_only_that_entity() {
        let text = r#"[
            { "id": "ok", "kind": "function", "display_name": "ok", "district": "core" },
            { "id": "lost", "kind": "function", "display_name": "lost", "district": "atlantis" }
        ]"#;
        let catalog = Catalog::from_json(text).expect("parse");
        let plan = plan(&catalog, &DistrictMap::builtin());
        assert_eq!(plan.instances.len(), 1);
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(plan.rejected[0].id, "lost");
        assert!(plan.rejected[0].reason.contains("unknown district"));
    }

    #[test]
    fn out_of_radius_offset_is_rejected() {
        let text = r#"[
            { "id": "far", "kind": "function", "display_name": "far", "district": "core",
              "offset": { "x": 30.0, "y": 0.0 } }
        ]"#;
        let catalog = Catalog::from_json(text).expect("parse");
        let plan = plan(&catalog, &DistrictMap::builtin());
        assert!(plan.instances.is_empty());
        assert!(plan.rejected[0].reason.contains("radius"));
    }

    #[test]
    fn functions_stay_smaller_than_modules() {
        let text = r#"[
            { "id": "m", "kind": "module", "display_name": "m", "district": "core",
              "lines_of_code": 150, "complexity": 5, "dependencies": ["a", "b"] },
            { "id": "f", "kind": "function", "display_name": "f", "district": "core",
              "lines_of_code": 150, "complexity": 5, "offset": { "x": 5.0, "y": 0.0 } }
        ]"#;
        let catalog = Catalog::from_json(text).expect("parse");
        let plan = plan(&catalog, &DistrictMap::builtin());
        assert!(plan.instances[1].scale.x < plan.instances[0].scale.x);
        assert!(plan.instances[1].scale.y < plan.instances[0].scale.y);
    }
}
