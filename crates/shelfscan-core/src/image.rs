/// Errors raised when a caller-provided pixel buffer cannot be used.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("pixel buffer is empty")]
    EmptyBuffer,
    #[error("invalid image dimensions (width={width}, height={height})")]
    ZeroDimensions { width: usize, height: usize },
    #[error("invalid RGBA buffer length (expected {expected} bytes, got {got})")]
    BufferSizeMismatch { expected: usize, got: usize },
}

/// Borrowed RGBA8 frame, row-major, 4 bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h*4
}

/// Owned RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> RgbaImageView<'a> {
    /// Validate a raw buffer and wrap it.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        if data.is_empty() {
            return Err(ImageError::EmptyBuffer);
        }
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroDimensions { width, height });
        }
        let Some(expected) = width.checked_mul(height).and_then(|n| n.checked_mul(4)) else {
            return Err(ImageError::ZeroDimensions { width, height });
        };
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Re-check the invariants of a view built with a struct literal.
    pub fn validate(&self) -> Result<(), ImageError> {
        Self::new(self.width, self.height, self.data).map(|_| ())
    }

    /// RGB triple at `(x, y)`, or `None` outside the frame.
    #[inline]
    pub fn rgb(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Rec.601 luminance at `(x, y)` on a 0..255 scale.
    #[inline]
    pub fn luma(&self, x: i64, y: i64) -> Option<f32> {
        self.rgb(x, y).map(luminance)
    }
}

impl RgbaImage {
    /// Frame filled with one colour (alpha = 255).
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Paint an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, rgb: [u8; 3]) {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        for y in y0.min(y1)..y1 {
            for x in x0.min(x1)..x1 {
                let idx = (y * self.width + x) * 4;
                self.data[idx..idx + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
    }

    pub fn view(&self) -> RgbaImageView<'_> {
        RgbaImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Rec.601 luma of an RGB triple.
#[inline]
pub fn luminance(rgb: [u8; 3]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

/// Euclidean distance between two RGB triples.
#[inline]
pub fn rgb_distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}
