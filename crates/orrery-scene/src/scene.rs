//! Per-frame drawing of the marker-registered solar system.

use nalgebra::{Matrix4, Vector3};
use orrery_core::{CameraParameters, ImageSize, Marker, RgbImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::overlay::{draw_axis, draw_wire_cube};
use crate::{
    all_pairs_consistent, check_marker_order, locate_sun, Color, ConsistencyRule,
    ImageTextureLoader, MatrixStack, OrbitState, PlanetTable, Renderer, SphereSpec, TextureCache,
    TextureLoader,
};

fn default_marker_size() -> f32 {
    0.05
}

fn default_near() -> f64 {
    0.01
}

fn default_far() -> f64 {
    100.0
}

fn default_tessellation() -> u32 {
    20
}

/// Drawing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Physical marker side, in the unit of the marker poses.
    /// Spheres get this diameter.
    #[serde(default = "default_marker_size")]
    pub marker_size: f32,
    #[serde(default = "default_near")]
    pub near: f64,
    #[serde(default = "default_far")]
    pub far: f64,
    #[serde(default)]
    pub rule: ConsistencyRule,
    #[serde(default = "default_tessellation")]
    pub sphere_slices: u32,
    #[serde(default = "default_tessellation")]
    pub sphere_stacks: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            marker_size: default_marker_size(),
            near: default_near(),
            far: default_far(),
            rule: ConsistencyRule::default(),
            sphere_slices: default_tessellation(),
            sphere_stacks: default_tessellation(),
        }
    }
}

/// What happened to one marker in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedPlanet {
    pub marker_id: i32,
    pub name: String,
    /// Drawn at the sun's pose instead of its own marker.
    pub anchored_to_sun: bool,
    /// Rotated onto its orbit this frame.
    pub orbiting: bool,
    /// Shared angle after this planet was drawn.
    pub angle: f32,
    pub textured: bool,
    pub model_view: Matrix4<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub marker_count: usize,
    pub sun_present: bool,
    /// Consistency flag after the last marker.
    pub consistent: bool,
    pub angle: f32,
    pub planets: Vec<PlacedPlanet>,
}

/// Planet table plus everything that persists between frames: the orbit
/// state, uploaded textures and the matrix stack.
pub struct Scene<L = ImageTextureLoader> {
    config: SceneConfig,
    table: PlanetTable,
    state: OrbitState,
    textures: TextureCache,
    loader: L,
    stack: MatrixStack,
}

impl Scene<ImageTextureLoader> {
    pub fn new(config: SceneConfig, table: PlanetTable) -> Self {
        Self::with_loader(config, table, ImageTextureLoader)
    }
}

impl<L: TextureLoader> Scene<L> {
    pub fn with_loader(config: SceneConfig, table: PlanetTable, loader: L) -> Self {
        Self {
            config,
            table,
            state: OrbitState::default(),
            textures: TextureCache::new(),
            loader,
            stack: MatrixStack::new(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn table(&self) -> &PlanetTable {
        &self.table
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Draw one frame: background, projection, then one sphere per marker in
    /// detector order.
    ///
    /// The projection maps `camera.image_size` onto `window`. Returns `None`
    /// (and draws nothing) for an empty frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(markers = markers.len()))
    )]
    pub fn draw_frame<R: Renderer + ?Sized>(
        &mut self,
        frame: RgbImageView<'_>,
        markers: &[Marker],
        camera: &CameraParameters,
        window: ImageSize,
        renderer: &mut R,
    ) -> Option<FrameSummary> {
        if frame.height == 0 || frame.width == 0 {
            return None;
        }

        renderer.draw_background(frame);
        let projection = camera.gl_projection_matrix(
            camera.image_size,
            window,
            self.config.near,
            self.config.far,
        );
        renderer.load_projection(&projection);

        log::info!("number of markers: {}", markers.len());

        let sun_present = locate_sun(markers, &self.table, &mut self.state.sun);
        if self.config.rule == ConsistencyRule::AllPairs {
            self.state.consistent =
                all_pairs_consistent(markers, &self.table, self.state.sun.center);
        }

        let mut planets = Vec::with_capacity(markers.len());
        for (index, marker) in markers.iter().enumerate() {
            log::debug!("checking marker id {}", marker.id);
            if self.config.rule == ConsistencyRule::LastPair {
                check_marker_order(
                    markers,
                    index,
                    &self.table,
                    self.state.sun.center,
                    &mut self.state.consistent,
                );
            }
            planets.push(self.draw_planet(marker, sun_present, renderer));
        }

        Some(FrameSummary {
            marker_count: markers.len(),
            sun_present,
            consistent: self.state.consistent,
            angle: self.state.angle,
            planets,
        })
    }

    fn draw_planet<R: Renderer + ?Sized>(
        &mut self,
        marker: &Marker,
        sun_present: bool,
        renderer: &mut R,
    ) -> PlacedPlanet {
        let planet = self.table.lookup(marker.id);
        let orbiting = sun_present && self.state.consistent;
        let anchored_to_sun = orbiting && !planet.is_sun();
        let pose = if anchored_to_sun {
            self.state.sun.pose
        } else {
            marker.pose
        };

        let texture = self
            .textures
            .get_or_load(marker.id, planet, &self.loader, renderer);

        let size = self.config.marker_size as f64;
        self.stack.load(pose.gl_model_view());
        let mut scope = self.stack.push();
        // Lift the sphere so it rests on the marker plane.
        scope.translate(0.0, 0.0, size / 2.0);
        if orbiting {
            let angle = self.state.advance(planet.speed);
            scope.rotate_z_degrees(angle as f64);
            scope.translate(planet.radius as f64, 0.0, 0.0);
        }

        let model_view = *scope.top();
        renderer.draw_sphere(
            &model_view,
            SphereSpec {
                radius: self.config.marker_size / 2.0,
                slices: self.config.sphere_slices,
                stacks: self.config.sphere_stacks,
            },
            texture,
        );

        PlacedPlanet {
            marker_id: marker.id,
            name: planet.name.clone(),
            anchored_to_sun,
            orbiting,
            angle: self.state.angle,
            textured: texture.is_some(),
            model_view,
        }
    }

    /// Draw the marker's local axes. Out-of-range indices are ignored.
    pub fn draw_marker_axis<R: Renderer + ?Sized>(
        &self,
        markers: &[Marker],
        index: usize,
        renderer: &mut R,
    ) {
        let Some(marker) = markers.get(index) else {
            return;
        };
        draw_axis(renderer, &marker.gl_model_view(), self.config.marker_size);
    }

    /// Draw a wire cube sitting on the marker. Out-of-range indices are ignored.
    pub fn draw_marker_cube<R: Renderer + ?Sized>(
        &self,
        markers: &[Marker],
        index: usize,
        renderer: &mut R,
    ) {
        let Some(marker) = markers.get(index) else {
            return;
        };
        let size = self.config.marker_size;
        let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, size as f64 / 2.0));
        draw_wire_cube(renderer, &(marker.gl_model_view() * lift), size, Color::WHITE);
    }

    /// Release every uploaded texture.
    pub fn shutdown<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.textures.release_all(renderer);
    }
}
