//! Renderer seam and a recording implementation.

use std::collections::BTreeSet;

use nalgebra::Matrix4;
use orrery_core::RgbImageView;
use serde::{Deserialize, Serialize};

use crate::TextureImage;

/// Opaque id of an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub const RED: Color = Color([1.0, 0.0, 0.0]);
    pub const GREEN: Color = Color([0.0, 1.0, 0.0]);
    pub const BLUE: Color = Color([0.0, 0.0, 1.0]);
    pub const WHITE: Color = Color([1.0, 1.0, 1.0]);
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: [f32; 3],
    pub to: [f32; 3],
    pub color: Color,
}

/// Quadric sphere centred at the model-view origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereSpec {
    pub radius: f32,
    pub slices: u32,
    pub stacks: u32,
}

/// Immediate-mode drawing backend.
///
/// Transforms are passed explicitly with every primitive; a backend keeps
/// no matrix state between calls except the projection.
pub trait Renderer {
    /// Blit the camera frame as the full-window background.
    fn draw_background(&mut self, frame: RgbImageView<'_>);
    fn load_projection(&mut self, projection: &Matrix4<f64>);
    fn upload_texture(&mut self, texture: &TextureImage) -> TextureHandle;
    fn release_texture(&mut self, handle: TextureHandle);
    fn draw_sphere(
        &mut self,
        model_view: &Matrix4<f64>,
        sphere: SphereSpec,
        texture: Option<TextureHandle>,
    );
    fn draw_lines(&mut self, model_view: &Matrix4<f64>, lines: &[LineSegment]);
}

/// One recorded renderer call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Background {
        width: usize,
        height: usize,
    },
    Projection {
        matrix: Matrix4<f64>,
    },
    UploadTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
    },
    ReleaseTexture {
        handle: TextureHandle,
    },
    Sphere {
        model_view: Matrix4<f64>,
        sphere: SphereSpec,
        texture: Option<TextureHandle>,
    },
    Lines {
        model_view: Matrix4<f64>,
        lines: Vec<LineSegment>,
    },
}

/// Renderer that records every call instead of drawing.
///
/// Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
    next_handle: u32,
    live: BTreeSet<TextureHandle>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands; texture bookkeeping is kept.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn spheres(&self) -> impl Iterator<Item = (&Matrix4<f64>, &SphereSpec, Option<TextureHandle>)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Sphere {
                model_view,
                sphere,
                texture,
            } => Some((model_view, sphere, *texture)),
            _ => None,
        })
    }

    pub fn live_texture_count(&self) -> usize {
        self.live.len()
    }
}

impl Renderer for RecordingRenderer {
    fn draw_background(&mut self, frame: RgbImageView<'_>) {
        self.commands.push(DrawCommand::Background {
            width: frame.width,
            height: frame.height,
        });
    }

    fn load_projection(&mut self, projection: &Matrix4<f64>) {
        self.commands.push(DrawCommand::Projection {
            matrix: *projection,
        });
    }

    fn upload_texture(&mut self, texture: &TextureImage) -> TextureHandle {
        self.next_handle += 1;
        let handle = TextureHandle(self.next_handle);
        self.live.insert(handle);
        self.commands.push(DrawCommand::UploadTexture {
            handle,
            width: texture.width,
            height: texture.height,
        });
        handle
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if !self.live.remove(&handle) {
            log::warn!("release of unknown texture {handle:?}");
        }
        self.commands.push(DrawCommand::ReleaseTexture { handle });
    }

    fn draw_sphere(
        &mut self,
        model_view: &Matrix4<f64>,
        sphere: SphereSpec,
        texture: Option<TextureHandle>,
    ) {
        self.commands.push(DrawCommand::Sphere {
            model_view: *model_view,
            sphere,
            texture,
        });
    }

    fn draw_lines(&mut self, model_view: &Matrix4<f64>, lines: &[LineSegment]) {
        self.commands.push(DrawCommand::Lines {
            model_view: *model_view,
            lines: lines.to_vec(),
        });
    }
}
