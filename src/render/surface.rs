use image::{ImageBuffer, Rgba, RgbaImage, imageops};

use crate::{
    effects::composite::over_in_place,
    foundation::core::{Frame, Rgba8},
    foundation::error::{ChromaError, ChromaResult},
    layout::geometry::ResolvedGeometry,
};

/// Resampling filter used when the composited frame is drawn at a size other than its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    /// Nearest neighbor.
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom).
    CatmullRom,
    /// Lanczos with window 3.
    Lanczos3,
}

impl From<ScaleFilter> for imageops::FilterType {
    fn from(f: ScaleFilter) -> Self {
        match f {
            ScaleFilter::Nearest => imageops::FilterType::Nearest,
            ScaleFilter::Triangle => imageops::FilterType::Triangle,
            ScaleFilter::CatmullRom => imageops::FilterType::CatmullRom,
            ScaleFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Presentation settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSettings {
    /// If set, the surface is cleared to this color before each draw; otherwise to transparent.
    pub clear_rgba: Option<Rgba8>,
    /// Resampling filter used when scaling.
    pub filter: ScaleFilter,
}

/// The destination the frame loop presents into.
///
/// Only the frame loop writes to it. Every [`present`](Self::present) clears the whole surface
/// first, so nothing from an earlier frame survives a redraw.
#[derive(Clone, Debug)]
pub struct PresentationSurface {
    settings: SurfaceSettings,
    pixels: Frame,
    presented: u64,
}

impl PresentationSurface {
    /// An empty (0×0) surface; the first present sizes it.
    pub fn new(settings: SurfaceSettings) -> Self {
        Self {
            settings,
            pixels: Frame::from_rgba_image(RgbaImage::new(0, 0)),
            presented: 0,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> SurfaceSettings {
        self.settings
    }

    /// Takes effect on the next present.
    pub fn set_settings(&mut self, settings: SurfaceSettings) {
        self.settings = settings;
    }

    /// Current surface contents.
    pub fn frame(&self) -> &Frame {
        &self.pixels
    }

    /// Number of completed presents.
    pub fn presented_count(&self) -> u64 {
        self.presented
    }

    /// Resize to `width`×`height` and fill with the clear color.
    pub fn clear(&mut self, width: u32, height: u32) -> ChromaResult<()> {
        let fill = self.settings.clear_rgba.unwrap_or(Rgba8::TRANSPARENT);
        self.pixels = Frame::solid(width, height, fill)?;
        Ok(())
    }

    /// Clear, then draw `composited` scaled to the resolved size at the resolved offset.
    ///
    /// Parts that land outside the surface are clipped. The offset is rounded to whole pixels.
    #[tracing::instrument(skip(self, composited), fields(w = geometry.width, h = geometry.height))]
    pub fn present(
        &mut self,
        composited: &Frame,
        geometry: &ResolvedGeometry,
    ) -> ChromaResult<()> {
        self.clear(geometry.width, geometry.height)?;

        let scaled = scale_to(
            composited,
            geometry.width,
            geometry.height,
            self.settings.filter,
        )?;
        let ox = geometry.offset.x.round() as i64;
        let oy = geometry.offset.y.round() as i64;
        blit_over(&mut self.pixels, &scaled, ox, oy)?;

        self.presented += 1;
        Ok(())
    }
}

fn scale_to(src: &Frame, width: u32, height: u32, filter: ScaleFilter) -> ChromaResult<Frame> {
    if src.width() == width && src.height() == height {
        return Ok(src.clone());
    }
    if src.is_empty() {
        return Frame::transparent(width, height);
    }

    // Filter in premultiplied space so the RGB of keyed pixels does not fringe into the subject.
    let mut premul = src.as_bytes().to_vec();
    for px in premul.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * a + 127) / 255) as u8;
        }
    }
    let view: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(src.width(), src.height(), premul)
            .ok_or_else(|| ChromaError::evaluation("composited frame does not fit an image"))?;

    let mut resized = imageops::resize(&view, width, height, filter.into()).into_raw();
    for px in resized.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    Frame::new(width, height, resized)
}

fn blit_over(dst: &mut Frame, src: &Frame, ox: i64, oy: i64) -> ChromaResult<()> {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    // Offsets are any finite value; rounding saturates at the i64 range.
    let x0 = ox.max(0);
    let x1 = ox.saturating_add(sw).min(dw);
    let y0 = oy.max(0);
    let y1 = oy.saturating_add(sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let span = ((x1 - x0) as usize) * 4;
    let dst_row = dst.row_bytes();
    let src_row = src.row_bytes();
    let dst_bytes = dst.as_bytes_mut();
    let src_bytes = src.as_bytes();

    for y in y0..y1 {
        let d = (y as usize) * dst_row + (x0 as usize) * 4;
        let s = ((y - oy) as usize) * src_row + ((x0 - ox) as usize) * 4;
        over_in_place(&mut dst_bytes[d..d + span], &src_bytes[s..s + span])?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
