use crate::foundation::error::{ChromaError, ChromaResult};

pub use kurbo::{Size, Vec2};

/// Straight 8-bit RGB triple.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb8 {
    /// Color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The same color with alpha `a`.
    pub const fn with_alpha(self, a: u8) -> Rgba8 {
        Rgba8 {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from(v: [u8; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Rgb8> for [u8; 3] {
    fn from(c: Rgb8) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Straight (non-premultiplied) RGBA8 pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 0 is fully keyed out.
    pub a: u8,
}

impl Rgba8 {
    /// Transparent black, the default surface clear color.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Pixel from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Drop the alpha channel.
    pub const fn rgb(self) -> Rgb8 {
        Rgb8::new(self.r, self.g, self.b)
    }

    /// `[r, g, b, a]`.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        c.to_array()
    }
}

/// A W×H buffer of straight RGBA8 pixels, tightly packed, row-major.
///
/// The byte length always equals `width * height * 4`; every constructor checks it, so pipeline
/// stages can index without re-validating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an existing RGBA8 buffer.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ChromaResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(ChromaError::validation(format!(
                "frame buffer has {} bytes, expected {expected} for {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single color.
    pub fn solid(width: u32, height: u32, px: Rgba8) -> ChromaResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: px.to_array().repeat(len / 4),
        })
    }

    /// A fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> ChromaResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Take over a decoded `image` buffer without copying.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Hand the buffer to `image`, e.g. for PNG encoding.
    pub fn into_rgba_image(self) -> ChromaResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| ChromaError::evaluation("frame buffer does not fit an RgbaImage"))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Native size in pixels.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// `width * height`.
    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    /// `true` for a zero-area frame.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes. The length cannot change through this view.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give up the raw RGBA8 bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// `None` when `(x, y)` lies outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let idx = self.index_of(x, y)?;
        Some(Rgba8::new(
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ))
    }

    /// Returns `false` when `(x, y)` lies outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba8) -> bool {
        match self.index_of(x, y) {
            Some(idx) => {
                self.data[idx..idx + 4].copy_from_slice(&px.to_array());
                true
            }
            None => false,
        }
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba8> + '_ {
        self.data
            .chunks_exact(4)
            .map(|p| Rgba8::new(p[0], p[1], p[2], p[3]))
    }

    pub(crate) fn row_bytes(&self) -> usize {
        (self.width as usize) * 4
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(((y as usize) * (self.width as usize) + (x as usize)) * 4)
    }
}

pub(crate) fn rgba_len(width: u32, height: u32) -> ChromaResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ChromaError::validation("frame buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
