use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use anyhow::Context;

use crate::foundation::core::{IntRect, Rgba8Premul};
use crate::foundation::error::{RasterError, RasterResult};

/// Row-major premultiplied RGBA pixels, one packed word per pixel.
///
/// Every word is an independent relaxed atomic so that several workers can write disjoint bands
/// of the same storage through shared handles. Tiles never overlap, so no two threads touch the
/// same word during a flush; the flush handshake (thread-pool join or worker state transitions)
/// publishes their writes to the flushing thread.
#[derive(Debug)]
pub struct PixelStorage {
    words: Box<[AtomicU32]>,
    width: u32,
    height: u32,
    stride: usize,
}

impl PixelStorage {
    pub(crate) fn new(width: u32, height: u32) -> RasterResult<Self> {
        let stride = width as usize;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(RasterError::NoMemory)?;
        let mut words = Vec::new();
        words.try_reserve_exact(len)?;
        words.resize_with(len, || AtomicU32::new(0));
        Ok(Self {
            words: words.into_boxed_slice(),
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.stride + x as usize)
    }

    /// Pixel at `(x, y)`, transparent outside the storage.
    pub fn load(&self, x: i32, y: i32) -> Rgba8Premul {
        match self.index(x, y) {
            Some(i) => Rgba8Premul::from_word(self.words[i].load(Ordering::Relaxed)),
            None => Rgba8Premul::transparent(),
        }
    }

    pub(crate) fn store(&self, x: i32, y: i32, color: Rgba8Premul) {
        if let Some(i) = self.index(x, y) {
            self.words[i].store(color.to_word(), Ordering::Relaxed);
        }
    }

    /// Copy out as tightly packed premultiplied RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height as usize {
            let row = &self.words[y * self.stride..y * self.stride + self.width as usize];
            for w in row {
                out.extend_from_slice(&w.load(Ordering::Relaxed).to_le_bytes());
            }
        }
        out
    }
}

/// A window onto shared pixel storage.
///
/// Coordinates stay in device space; the view only limits which pixels may be written. Tile
/// views created for one flush share the destination storage and never own pixels themselves.
#[derive(Clone, Debug)]
pub struct ImageView {
    pixels: Arc<PixelStorage>,
    bounds: IntRect,
}

impl ImageView {
    /// Writable device rectangle.
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    /// Underlying storage.
    pub fn pixels(&self) -> &Arc<PixelStorage> {
        &self.pixels
    }

    /// Pixel at device `(x, y)`.
    pub fn load(&self, x: i32, y: i32) -> Rgba8Premul {
        self.pixels.load(x, y)
    }

    /// Write a pixel; writes outside [`ImageView::bounds`] are dropped.
    pub fn store(&self, x: i32, y: i32, color: Rgba8Premul) {
        if self.bounds.contains(x, y) {
            self.pixels.store(x, y, color);
        }
    }
}

/// The destination raster image behind a surface.
#[derive(Debug)]
pub struct ImageSurface {
    pixels: Arc<PixelStorage>,
    serial: AtomicU64,
    finished: AtomicBool,
}

impl ImageSurface {
    /// Transparent image of the given size.
    pub fn new(width: u32, height: u32) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::validation("image surface size must be non-zero"));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(RasterError::validation(format!(
                "image surface size {width}x{height} exceeds device coordinate range"
            )));
        }
        Ok(Self {
            pixels: Arc::new(PixelStorage::new(width, height)?),
            serial: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixels per row.
    pub fn stride(&self) -> usize {
        self.pixels.stride()
    }

    /// Device rectangle covering the whole image.
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.width() as i32, self.height() as i32)
    }

    /// Shared pixel storage.
    pub fn pixels(&self) -> &Arc<PixelStorage> {
        &self.pixels
    }

    /// View of the whole image.
    pub fn full_view(&self) -> ImageView {
        ImageView {
            pixels: self.pixels.clone(),
            bounds: self.bounds(),
        }
    }

    /// View of `rect`, sharing this image's storage and stride.
    pub fn create_sub_view(&self, rect: IntRect) -> RasterResult<ImageView> {
        if rect.is_empty() || !self.bounds().contains_rect(rect) {
            return Err(RasterError::validation(format!(
                "sub view {rect:?} is not inside image bounds {:?}",
                self.bounds()
            )));
        }
        Ok(ImageView {
            pixels: self.pixels.clone(),
            bounds: rect,
        })
    }

    /// Announce an upcoming direct mutation.
    ///
    /// Bumps the modification serial; fails once the surface has been finished.
    pub fn begin_modification(&self) -> RasterResult<()> {
        if self.is_finished() {
            return Err(RasterError::Finished);
        }
        self.serial.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Modification serial, bumped before every direct mutation.
    pub fn serial(&self) -> u64 {
        self.serial.load(Ordering::Relaxed)
    }

    /// Make the image read-only.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Return `true` once [`ImageSurface::finish`] was called.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Premultiplied RGBA8 bytes, tightly packed, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.to_rgba8()
    }

    /// Straight-alpha copy suitable for encoders.
    pub fn to_rgba_image(&self) -> RasterResult<image::RgbaImage> {
        let mut data = self.to_rgba8();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a != 0 && a != 255 {
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        image::RgbaImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| RasterError::validation("pixel buffer does not match image size"))
    }

    /// Encode the image as PNG at `path`.
    pub fn write_png(&self, path: impl AsRef<Path>) -> RasterResult<()> {
        let path = path.as_ref();
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write png to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/image.rs"]
mod tests;
