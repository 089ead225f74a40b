use codecity_engine::catalog::{Catalog, DistrictMap};
use codecity_engine::layout;
use std::io::Write;

const CATALOG_JSON: &str = r#"[
    { "id": "src/main.ts", "kind": "module", "display_name": "src/main.ts",
      "district": "core", "lines_of_code": 150, "complexity": 8,
      "dependencies": ["auth", "api", "database"] },
    { "id": "Session", "kind": "class", "display_name": "Session",
      "district": "auth", "lines_of_code": 90, "complexity": 3,
      "offset": { "x": 4.0, "y": -4.0 } },
    { "id": "hashPassword", "kind": "function", "display_name": "hashPassword",
      "district": "auth", "lines_of_code": 25, "complexity": 2,
      "offset": { "x": -6.0, "y": 3.0 } }
]"#;

#[test]
fn catalog_loaded_from_disk_plans_identically_to_in_memory() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CATALOG_JSON.as_bytes()).expect("write");
    let from_disk = Catalog::from_path(file.path()).expect("load");
    let in_memory = Catalog::from_json(CATALOG_JSON).expect("parse");

    let districts = DistrictMap::builtin();
    let plan_a = layout::plan(&from_disk, &districts);
    let plan_b = layout::plan(&in_memory, &districts);
    assert_eq!(plan_a.instances.len(), 3);
    for (a, b) in plan_a.instances.iter().zip(&plan_b.instances) {
        assert_eq!(a.position.to_array().map(f32::to_bits), b.position.to_array().map(f32::to_bits));
        assert_eq!(a.scale.to_array().map(f32::to_bits), b.scale.to_array().map(f32::to_bits));
        assert_eq!(a.color, b.color);
    }
}

#[test]
fn plan_order_follows_catalog_order() {
    let catalog = Catalog::from_json(CATALOG_JSON).expect("parse");
    let plan = layout::plan(&catalog, &DistrictMap::builtin());
    let indices: Vec<usize> = plan.instances.iter().map(|i| i.entity_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn every_placement_rests_on_the_ground_plane() {
    let catalog = Catalog::from_json(CATALOG_JSON).expect("parse");
    let plan = layout::plan(&catalog, &DistrictMap::builtin());
    for instance in &plan.instances {
        assert!((instance.position.y - instance.scale.y * 0.5).abs() < 1e-6);
    }
}
