//! Solar-system overlay logic on top of detected markers.
//!
//! This crate focuses on:
//! - the static marker-id → planet table,
//! - locating the sun marker and checking that planets appear in radius order,
//! - the shared orbit animation and the per-planet transform composition,
//! - issuing draw calls through the [`Renderer`] seam.
//!
//! It does **not** detect markers or own a GPU context. Markers come from
//! `orrery-core`, pixels go to whatever implements [`Renderer`].

mod consistency;
mod orbit;
pub mod overlay;
mod planet;
mod render;
mod scene;
mod sun;
mod texture;
mod transform;

pub use consistency::{
    all_pairs_consistent, check_marker_order, pair_is_consistent, ConsistencyRule,
};
pub use orbit::{advance_angle, OrbitState};
pub use planet::{Planet, PlanetEntry, PlanetTable, TableError, SUN_NAME};
pub use render::{
    Color, DrawCommand, LineSegment, RecordingRenderer, Renderer, SphereSpec, TextureHandle,
};
pub use scene::{FrameSummary, PlacedPlanet, Scene, SceneConfig};
pub use sun::{locate_sun, SunSighting};
pub use texture::{ImageTextureLoader, TextureCache, TextureImage, TextureLoader};
pub use transform::{MatrixScope, MatrixStack};
