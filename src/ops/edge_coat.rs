use image::Rgba;

use crate::canvas::{Bitmap, PixelMask, luma, opaque};

pub const EDGE_COAT_PASSES: u32 = 2;
/// Rim pixels at or below this luma are left alone.
pub const EDGE_COAT_MIN_LUMA: f32 = 115.0;

/// Claim the anti-aliased rim between a fresh fill and its outline.
///
/// Each pass collects every pixel that is outside `filled`, outside `strict`,
/// brighter than [`EDGE_COAT_MIN_LUMA`] and 8-adjacent to `filled`, then
/// paints and adds them all at once. Returns the number of pixels painted.
pub fn refine(bitmap: &mut Bitmap, filled: &mut PixelMask, strict: &PixelMask, color: Rgba<u8>) -> usize {
    let color = opaque(color);
    let n = bitmap.pixel_count();
    if n == 0 || filled.len() != n || strict.len() != n {
        return 0;
    }

    let w = bitmap.width();
    let h = bitmap.height();
    let mut painted = 0;

    for _ in 0..EDGE_COAT_PASSES {
        let mut claimed = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let idx = bitmap.index_of(x, y);
                if filled.get(idx) || strict.get(idx) {
                    continue;
                }
                if !filled.any_neighbor8(x, y) {
                    continue;
                }
                if luma(bitmap.pixel_at(idx)) > EDGE_COAT_MIN_LUMA {
                    claimed.push(idx);
                }
            }
        }

        if claimed.is_empty() {
            break;
        }
        for &idx in &claimed {
            bitmap.set_pixel_at(idx, color);
            filled.set(idx);
        }
        painted += claimed.len();
    }

    painted
}
