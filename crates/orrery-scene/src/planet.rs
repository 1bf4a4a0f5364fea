//! Static marker-id → planet table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name that marks the host star. Exactly this string, case-sensitive.
pub const SUN_NAME: &str = "Sun";

/// Orbital attributes attached to a marker id.
///
/// The zero value (empty name, no speed, no radius, empty texture path) is
/// what unknown ids resolve to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    /// Orbit advance in degrees per drawn frame; `0` keeps the planet still.
    #[serde(default)]
    pub speed: f32,
    /// Orbit radius in scene units; `0` means no orbit.
    #[serde(default)]
    pub radius: f32,
    #[serde(default)]
    pub texture_path: String,
}

impl Planet {
    pub fn new(name: &str, speed: f32, radius: f32, texture_path: &str) -> Self {
        Self {
            name: name.to_owned(),
            speed,
            radius,
            texture_path: texture_path.to_owned(),
        }
    }

    #[inline]
    pub fn is_sun(&self) -> bool {
        self.name == SUN_NAME
    }
}

static UNKNOWN_PLANET: Planet = Planet {
    name: String::new(),
    speed: 0.0,
    radius: 0.0,
    texture_path: String::new(),
};

/// One table row as it appears in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetEntry {
    pub id: i32,
    #[serde(flatten)]
    pub planet: Planet,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TableError {
    #[error("marker id {0} is listed more than once")]
    DuplicateId(i32),
}

/// Immutable mapping from marker ids to planets, built once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetTable {
    planets: BTreeMap<i32, Planet>,
}

impl PlanetTable {
    /// Earth on 141, the Sun on 217, Jupiter on 144.
    pub fn builtin() -> Self {
        let planets = BTreeMap::from([
            (141, Planet::new("Earth", 2.0, 0.2, "textures/earth.jpg")),
            (217, Planet::new(SUN_NAME, 0.0, 0.0, "textures/sun.jpg")),
            (144, Planet::new("Jupiter", 1.0, 0.4, "textures/jupiter.jpg")),
        ]);
        Self { planets }
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = PlanetEntry>,
    ) -> Result<Self, TableError> {
        let mut planets = BTreeMap::new();
        for entry in entries {
            if planets.insert(entry.id, entry.planet).is_some() {
                return Err(TableError::DuplicateId(entry.id));
            }
        }
        Ok(Self { planets })
    }

    /// Resolve relative texture paths against `root`.
    pub fn with_texture_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        for planet in self.planets.values_mut() {
            if planet.texture_path.is_empty() || Path::new(&planet.texture_path).is_absolute() {
                continue;
            }
            planet.texture_path = root.join(&planet.texture_path).to_string_lossy().into_owned();
        }
        self
    }

    /// The planet for `id`, or the zero-valued planet when `id` is unknown.
    pub fn lookup(&self, id: i32) -> &Planet {
        self.planets.get(&id).unwrap_or(&UNKNOWN_PLANET)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.planets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    pub fn entries(&self) -> Vec<PlanetEntry> {
        self.planets
            .iter()
            .map(|(&id, planet)| PlanetEntry {
                id,
                planet: planet.clone(),
            })
            .collect()
    }
}

impl Default for PlanetTable {
    fn default() -> Self {
        Self::builtin()
    }
}
