use image::{Rgba, RgbaImage};

/// Maximum supported bitmap dimension in pixels (per axis).
/// Prevents memory exhaustion from crafted templates and project files.
pub const MAX_CANVAS_DIM: u32 = 32_768;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================================
// BITMAP: flat RGBA8 pixel buffer, row-major
// ============================================================================

/// The live editable raster. `pixels.len() == width * height * 4` always holds;
/// every constructor checks it and the fields are never exposed mutably as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&color.0);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap an existing RGBA buffer. Returns `None` when the length does not
    /// match the dimensions.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Flat pixel index (not byte offset). Caller guarantees bounds.
    #[inline]
    pub fn index_of(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn pixel_at(&self, idx: usize) -> Rgba<u8> {
        let o = idx * 4;
        Rgba([
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ])
    }

    #[inline]
    pub fn set_pixel_at(&mut self, idx: usize, color: Rgba<u8>) {
        let o = idx * 4;
        self.pixels[o..o + 4].copy_from_slice(&color.0);
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(self.pixel_at(self.index_of(x as u32, y as u32)))
    }

    /// Write a pixel; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if self.in_bounds(x, y) {
            let idx = self.index_of(x as u32, y as u32);
            self.set_pixel_at(idx, color);
        }
    }

    /// Copy pixel `idx` from `src`, which must have the same dimensions.
    #[inline]
    pub fn copy_pixel_from(&mut self, src: &Bitmap, idx: usize) {
        let o = idx * 4;
        self.pixels[o..o + 4].copy_from_slice(&src.pixels[o..o + 4]);
    }

    pub fn same_size(&self, other: &Bitmap) -> bool {
        self.width == other.width && self.height == other.height
    }
}

// ============================================================================
// POINTS & COLOURS
// ============================================================================

/// A position in bitmap space. May lie outside the bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Painted pixels are always opaque.
#[inline]
pub fn opaque(color: Rgba<u8>) -> Rgba<u8> {
    Rgba([color.0[0], color.0[1], color.0[2], 255])
}

/// Rec.709 relative luminance on the 0–255 scale.
#[inline]
pub fn luma(p: Rgba<u8>) -> f32 {
    0.2126 * p.0[0] as f32 + 0.7152 * p.0[1] as f32 + 0.0722 * p.0[2] as f32
}

/// True when every channel (R, G, B, A independently) differs by at most `tolerance`.
#[inline]
pub fn within_tolerance(a: Rgba<u8>, b: Rgba<u8>, tolerance: u8) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .all(|(&ca, &cb)| ca.abs_diff(cb) <= tolerance)
}

/// Parse `#RRGGBB`, `RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

// ============================================================================
// PIXEL MASK: one bit per pixel
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl PixelMask {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            words: vec![0; len.div_ceil(64)],
        }
    }

    /// Build from one flag per pixel, row-major.
    pub fn from_flags(width: u32, height: u32, flags: &[bool]) -> Self {
        let mut mask = Self::new(width, height);
        for (i, _) in flags.iter().enumerate().filter(|&(_, &f)| f) {
            mask.set(i);
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        self.words
            .get(idx / 64)
            .is_some_and(|w| w & (1u64 << (idx % 64)) != 0)
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        if let Some(w) = self.words.get_mut(idx / 64) {
            *w |= 1u64 << (idx % 64);
        }
    }

    /// Mask value at `(x, y)`; out-of-bounds reads as unset.
    pub fn get_xy(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.get(y as usize * self.width as usize + x as usize)
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when any of the 8 neighbours of `(x, y)` is set.
    #[inline]
    pub fn any_neighbor8(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as i32, y as i32);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx != 0 || dy != 0) && self.get_xy(x + dx, y + dy) {
                    return true;
                }
            }
        }
        false
    }
}
