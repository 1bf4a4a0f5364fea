use serde::{Deserialize, Serialize};

/// Width/height pair in pixels, used for camera frames and the GL window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow the width until an RGB row (`width * 3` bytes) is 4-byte aligned.
    ///
    /// Pixel blits assume unpadded rows, so window widths that would need
    /// row padding are widened instead. `None` when the widened width no
    /// longer fits in `u32`.
    pub fn aligned_for_rgb_rows(self) -> Option<Self> {
        // 3 is odd, so `width * 3` is 4-aligned exactly when `width` is.
        let width = self.width.checked_next_multiple_of(4)?;
        Some(Self {
            width,
            height: self.height,
        })
    }
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Borrowed, tightly packed RGB8 frame (row-major, `len = w * h * 3`).
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl RgbImageView<'_> {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width as u32, self.height as u32)
    }

    /// `true` when the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(3))
            .is_some_and(|n| n == self.data.len())
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }
}
