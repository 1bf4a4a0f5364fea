//! Texture decoding and the per-planet handle cache.

use std::collections::HashMap;
use std::path::Path;

use crate::{Planet, Renderer, TextureHandle};

/// Decoded RGB8 pixels, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Source of texture pixels. `None` means the texture is unavailable; the
/// caller draws untextured.
pub trait TextureLoader {
    fn load(&self, path: &Path) -> Option<TextureImage>;
}

impl<F> TextureLoader for F
where
    F: Fn(&Path) -> Option<TextureImage>,
{
    fn load(&self, path: &Path) -> Option<TextureImage> {
        self(path)
    }
}

/// Decodes image files from disk with the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageTextureLoader;

impl TextureLoader for ImageTextureLoader {
    fn load(&self, path: &Path) -> Option<TextureImage> {
        if path.as_os_str().is_empty() {
            log::warn!("failed to load texture: empty path");
            return None;
        }
        match image::open(path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                Some(TextureImage {
                    width: rgb.width(),
                    height: rgb.height(),
                    data: rgb.into_raw(),
                })
            }
            Err(err) => {
                log::warn!("failed to load texture {}: {err}", path.display());
                None
            }
        }
    }
}

/// Uploaded texture handles keyed by marker id.
///
/// A handle is cached on the first successful upload and kept until
/// [`TextureCache::release_all`]. Failed loads are not cached and are
/// retried the next time the planet is drawn.
#[derive(Debug, Default)]
pub struct TextureCache {
    handles: HashMap<i32, TextureHandle>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, marker_id: i32) -> Option<TextureHandle> {
        self.handles.get(&marker_id).copied()
    }

    pub fn get_or_load<L, R>(
        &mut self,
        marker_id: i32,
        planet: &Planet,
        loader: &L,
        renderer: &mut R,
    ) -> Option<TextureHandle>
    where
        L: TextureLoader + ?Sized,
        R: Renderer + ?Sized,
    {
        if let Some(handle) = self.get(marker_id) {
            return Some(handle);
        }
        let image = loader.load(Path::new(&planet.texture_path))?;
        let handle = renderer.upload_texture(&image);
        log::debug!(
            "uploaded texture {}x{} for marker {} ({:?})",
            image.width,
            image.height,
            marker_id,
            handle
        );
        self.handles.insert(marker_id, handle);
        Some(handle)
    }

    /// Release every cached handle through `renderer` and empty the cache.
    pub fn release_all<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        for (_, handle) in self.handles.drain() {
            renderer.release_texture(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
