use crate::config::Vec2Data;
use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
    Module,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Module => "module",
        }
    }
}

/// Semantic description of one code entity. Immutable once the catalog is
/// built; placed instances reference entries by index, they never own them.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeEntity {
    pub id: String,
    pub kind: EntityKind,
    pub display_name: String,
    pub district: String,
    #[serde(default)]
    pub lines_of_code: u32,
    #[serde(default = "CodeEntity::default_complexity")]
    pub complexity: u8,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// Authored position relative to the owning district's center (x, z).
    #[serde(default)]
    pub offset: Vec2Data,
}

impl CodeEntity {
    const fn default_complexity() -> u8 {
        1
    }

    pub fn offset(&self) -> Vec2 {
        self.offset.into()
    }
}

/// A named spatial and thematic grouping of entities. The district table is
/// fixed at startup; centers sit on a grid whose separation (40) is at least
/// twice the district radius, so placements can never overlap across
/// districts by construction.
#[derive(Debug, Clone)]
pub struct District {
    pub id: String,
    pub center: Vec2,
    pub color: [f32; 3],
    pub radius: f32,
}

pub const DISTRICT_RADIUS: f32 = 16.0;
pub const DISTRICT_SEPARATION: f32 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct DistrictMap {
    districts: BTreeMap<String, District>,
}

impl DistrictMap {
    pub fn builtin() -> Self {
        let mut map = Self::default();
        map.insert("core", Vec2::new(0.0, 0.0), [0.545, 0.361, 0.965]);
        map.insert("auth", Vec2::new(-DISTRICT_SEPARATION, 0.0), [0.937, 0.267, 0.267]);
        map.insert("api", Vec2::new(DISTRICT_SEPARATION, 0.0), [0.024, 0.714, 0.831]);
        map.insert("database", Vec2::new(0.0, -DISTRICT_SEPARATION), [0.063, 0.725, 0.506]);
        map.insert("ui", Vec2::new(0.0, DISTRICT_SEPARATION), [0.961, 0.620, 0.043]);
        map.insert(
            "utils",
            Vec2::new(-DISTRICT_SEPARATION, -DISTRICT_SEPARATION),
            [0.420, 0.447, 0.502],
        );
        map
    }

    fn insert(&mut self, id: &str, center: Vec2, color: [f32; 3]) {
        self.districts.insert(
            id.to_string(),
            District { id: id.to_string(), center, color, radius: DISTRICT_RADIUS },
        );
    }

    pub fn get(&self, id: &str) -> Option<&District> {
        self.districts.get(id)
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &District> {
        self.districts.values()
    }
}

/// Ordered list of code entities. Entity metadata is supplied, never computed
/// from source; the catalog only validates shape.
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<CodeEntity>,
}

impl Catalog {
    pub fn new(mut entities: Vec<CodeEntity>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.id.as_str()) {
                bail!("Duplicate catalog entity id '{}'", entity.id);
            }
        }
        for entity in &mut entities {
            let clamped = entity.complexity.clamp(1, 10);
            if clamped != entity.complexity {
                eprintln!(
                    "[catalog] entity '{}': complexity {} out of range, clamped to {clamped}",
                    entity.id, entity.complexity
                );
                entity.complexity = clamped;
            }
        }
        Ok(Self { entities })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entities: Vec<CodeEntity> =
            serde_json::from_str(text).context("Failed to parse catalog JSON")?;
        Self::new(entities)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog '{}'", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to load catalog '{}'", path.display()))
    }

    pub fn entities(&self) -> &[CodeEntity] {
        &self.entities
    }

    pub fn get(&self, index: usize) -> Option<&CodeEntity> {
        self.entities.get(index)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Built-in six-building catalog used by the demo binary and tests.
    pub fn demo() -> Self {
        let text = r#"[
            { "id": "src/main.ts", "kind": "module", "display_name": "src/main.ts",
              "district": "core", "lines_of_code": 150, "complexity": 8,
              "dependencies": ["auth", "api", "database"], "offset": { "x": 0.0, "y": -8.0 } },
            { "id": "Application", "kind": "class", "display_name": "Application",
              "district": "core", "lines_of_code": 200, "complexity": 6,
              "dependencies": ["Router"], "offset": { "x": -8.0, "y": 8.0 } },
            { "id": "Router", "kind": "class", "display_name": "Router",
              "district": "core", "lines_of_code": 120, "complexity": 4,
              "offset": { "x": 8.0, "y": 8.0 } },
            { "id": "src/auth/index.ts", "kind": "module", "display_name": "src/auth/index.ts",
              "district": "auth", "lines_of_code": 180, "complexity": 9,
              "dependencies": ["database"] },
            { "id": "src/api/index.ts", "kind": "module", "display_name": "src/api/index.ts",
              "district": "api", "lines_of_code": 120, "complexity": 6,
              "dependencies": ["auth"] },
            { "id": "src/database/index.ts", "kind": "module", "display_name": "src/database/index.ts",
              "district": "database", "lines_of_code": 200, "complexity": 7 }
        ]"#;
        Self::from_json(text).expect("built-in demo catalog is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_references_known_districts() {
        let catalog = Catalog::demo();
        let districts = DistrictMap::builtin();
        assert_eq!(catalog.len(), 6);
        for entity in catalog.entities() {
            assert!(districts.get(&entity.district).is_some(), "district {}", entity.district);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"[
            { "id": "a", "kind": "function", "display_name": "a", "district": "core" },
            { "id": "a", "kind": "class", "display_name": "a2", "district": "core" }
        ]"#;
        let err = Catalog::from_json(text).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn complexity_is_clamped_into_range() {
        let text = r#"[
            { "id": "hot", "kind": "function", "display_name": "hot", "district": "core",
              "complexity": 42 }
        ]"#;
        let catalog = Catalog::from_json(text).expect("parse");
        assert_eq!(catalog.get(0).expect("entity").complexity, 10);
    }

    #[test]
    fn district_grid_separation_prevents_overlap() {
        let districts = DistrictMap::builtin();
        let all: Vec<_> = districts.iter().collect();
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert!((a.center - b.center).length() >= 2.0 * DISTRICT_RADIUS);
            }
        }
    }
}
