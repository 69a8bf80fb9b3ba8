use image::Rgba;
use rayon::prelude::*;

use crate::canvas::{Bitmap, PixelMask, luma};

/// Dark-line classification thresholds for one mask flavour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineThreshold {
    pub min_alpha: u8,
    pub max_min_channel: u8,
    pub max_luma: f32,
    pub dilate_passes: u32,
}

/// Loose threshold, dilated twice: closes 1px anti-aliasing gaps in outlines
/// so the flood fill cannot leak through them.
pub const SOFT: LineThreshold = LineThreshold {
    min_alpha: 180,
    max_min_channel: 80,
    max_luma: 120.0,
    dilate_passes: 2,
};

/// Strict threshold, never dilated: marks only the true dark outline.
pub const STRICT: LineThreshold = LineThreshold {
    min_alpha: 200,
    max_min_channel: 60,
    max_luma: 100.0,
    dilate_passes: 0,
};

/// The pair of boundary masks derived from one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryMasks {
    /// Gates flood-fill traversal and seed nudging.
    pub soft: PixelMask,
    /// Forbids edge-coat bleed onto real line pixels.
    pub strict: PixelMask,
}

impl BoundaryMasks {
    /// Build both masks from the untouched template.
    pub fn build(template: &Bitmap) -> Self {
        Self {
            soft: build_mask(template, SOFT),
            strict: build_mask(template, STRICT),
        }
    }

    pub fn matches_size(&self, bitmap: &Bitmap) -> bool {
        self.soft.width() == bitmap.width() && self.soft.height() == bitmap.height()
    }
}

/// Classify every pixel against `threshold`, then apply its dilation passes.
pub fn build_mask(bitmap: &Bitmap, threshold: LineThreshold) -> PixelMask {
    let w = bitmap.width() as usize;
    let h = bitmap.height() as usize;
    if w == 0 || h == 0 {
        return PixelMask::new(bitmap.width(), bitmap.height());
    }

    let mut flags: Vec<bool> = bitmap
        .as_raw()
        .par_chunks_exact(4)
        .map(|p| is_line_pixel(p, threshold))
        .collect();

    for _ in 0..threshold.dilate_passes {
        flags = dilate8(&flags, w, h);
    }

    PixelMask::from_flags(bitmap.width(), bitmap.height(), &flags)
}

#[inline]
fn is_line_pixel(p: &[u8], t: LineThreshold) -> bool {
    if p[3] < t.min_alpha {
        return false;
    }
    let min_channel = p[0].min(p[1]).min(p[2]);
    min_channel <= t.max_min_channel || luma(Rgba([p[0], p[1], p[2], p[3]])) <= t.max_luma
}

/// One 3×3 dilation pass: a pixel becomes set if it or any 8-neighbour was set.
fn dilate8(src: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut out = vec![false; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for (x, cell) in row_out.iter_mut().enumerate() {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            *cell = (y0..=y1).any(|ny| src[ny * w + x0..=ny * w + x1].iter().any(|&f| f));
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    #[test]
    fn single_dark_pixel_grows_two_rings_in_soft_mask() {
        let mut bmp = Bitmap::new_filled(9, 9, WHITE);
        bmp.put_pixel(4, 4, BLACK);
        let masks = BoundaryMasks::build(&bmp);

        // Two dilation passes → a 5×5 block.
        assert_eq!(masks.soft.count(), 25);
        assert!(masks.soft.get_xy(2, 2));
        assert!(masks.soft.get_xy(6, 6));
        assert!(!masks.soft.get_xy(1, 4));

        assert_eq!(masks.strict.count(), 1);
        assert!(masks.strict.get_xy(4, 4));
    }

    #[test]
    fn grey_between_thresholds_is_soft_only() {
        // luma 110: dark enough for soft (<=120), too light for strict (<=100).
        let mut bmp = Bitmap::new_filled(5, 5, WHITE);
        bmp.put_pixel(2, 2, Rgba([110, 110, 110, 255]));
        let masks = BoundaryMasks::build(&bmp);
        assert!(masks.soft.get_xy(2, 2));
        assert!(!masks.strict.get_xy(2, 2));
    }

    #[test]
    fn translucent_dark_pixels_are_not_lines() {
        let mut bmp = Bitmap::new_filled(5, 5, WHITE);
        bmp.put_pixel(1, 1, Rgba([0, 0, 0, 179]));
        bmp.put_pixel(3, 3, Rgba([0, 0, 0, 190]));
        let masks = BoundaryMasks::build(&bmp);
        assert!(!masks.soft.get_xy(1, 1));
        assert!(masks.soft.get_xy(3, 3));
        assert_eq!(masks.strict.count(), 0);
    }

    #[test]
    fn saturated_colour_counts_via_min_channel() {
        // Pure blue: luma ≈ 18 and min channel 0 → line in both masks.
        let mut bmp = Bitmap::new_filled(3, 3, WHITE);
        bmp.put_pixel(1, 1, Rgba([0, 0, 255, 255]));
        let masks = BoundaryMasks::build(&bmp);
        assert!(masks.strict.get_xy(1, 1));
    }

    #[test]
    fn classification_follows_canvas_luma() {
        // Every channel above the min-channel limits, so only luma decides.
        let navy = Rgba([85, 95, 200, 255]);
        assert!(luma(navy) > STRICT.max_luma && luma(navy) <= SOFT.max_luma);
        assert!(is_line_pixel(&navy.0, SOFT));
        assert!(!is_line_pixel(&navy.0, STRICT));

        let pale = Rgba([200, 200, 90, 255]);
        assert!(luma(pale) > SOFT.max_luma);
        assert!(!is_line_pixel(&pale.0, SOFT));
    }

    #[test]
    fn empty_bitmap_yields_empty_masks() {
        let masks = BoundaryMasks::build(&Bitmap::new(0, 0));
        assert!(masks.soft.is_empty());
        assert!(masks.strict.is_empty());
    }
}
