use std::collections::VecDeque;

use image::Rgba;

use crate::canvas::{Bitmap, PixelMask, Point, opaque, within_tolerance};

/// Tuning for [`flood_fill`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillOptions {
    /// Per-channel window for accepting a neighbour into the region.
    pub tolerance: u8,
    /// Per-channel window for "the seed already has the fill colour".
    pub match_tolerance: u8,
    /// Largest Chebyshev radius searched when the seed sits on a boundary.
    pub max_nudge_radius: u32,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            tolerance: 20,
            match_tolerance: 10,
            max_nudge_radius: 5,
        }
    }
}

/// Result of one fill. `count == filled.count()`; zero is a normal outcome.
#[derive(Clone, Debug)]
pub struct FillOutcome {
    pub filled: PixelMask,
    pub count: usize,
    /// The seed actually used after nudging, if one was found.
    pub seed: Option<Point>,
}

impl FillOutcome {
    fn empty(bitmap: &Bitmap, seed: Option<Point>) -> Self {
        Self {
            filled: PixelMask::new(bitmap.width(), bitmap.height()),
            count: 0,
            seed,
        }
    }
}

/// Move a seed that is off-canvas or on a boundary to the first fillable
/// pixel within `max_radius` (square rings, row-major scan).
pub fn resolve_seed(bitmap: &Bitmap, soft: &PixelMask, seed: Point, max_radius: u32) -> Option<Point> {
    let fillable = |x: i32, y: i32| bitmap.in_bounds(x, y) && !soft.get_xy(x, y);

    if fillable(seed.x, seed.y) {
        return Some(seed);
    }

    let max_radius = max_radius.min(i32::MAX as u32) as i32;
    for r in 1..=max_radius {
        for dy in -r..=r {
            for dx in -r..=r {
                let x = seed.x.saturating_add(dx);
                let y = seed.y.saturating_add(dy);
                if fillable(x, y) {
                    return Some(Point::new(x, y));
                }
            }
        }
    }
    None
}

/// Paint the 4-connected, colour-tolerant region around `seed` that does not
/// cross `soft`. The returned mask feeds [`super::edge_coat::refine`].
///
/// Neighbour colours are read from the live buffer while it is being painted.
/// Pixels are painted only once visited and compared only while unvisited, so
/// every comparison still sees the pre-fill colour.
pub fn flood_fill(
    bitmap: &mut Bitmap,
    soft: &PixelMask,
    seed: Point,
    color: Rgba<u8>,
    options: FillOptions,
) -> FillOutcome {
    let color = opaque(color);
    if bitmap.pixel_count() == 0 || soft.len() != bitmap.pixel_count() {
        return FillOutcome::empty(bitmap, None);
    }

    let Some(start) = resolve_seed(bitmap, soft, seed, options.max_nudge_radius) else {
        return FillOutcome::empty(bitmap, None);
    };

    let w = bitmap.width();
    let h = bitmap.height();
    let seed_idx = bitmap.index_of(start.x as u32, start.y as u32);
    let target = bitmap.pixel_at(seed_idx);

    if within_tolerance(target, color, options.match_tolerance) {
        return FillOutcome::empty(bitmap, Some(start));
    }

    let mut visited = PixelMask::new(w, h);
    let mut filled = PixelMask::new(w, h);
    let mut queue: VecDeque<u32> = VecDeque::with_capacity(4096);
    let mut count = 0usize;

    visited.set(seed_idx);
    queue.push_back(seed_idx as u32);

    while let Some(idx) = queue.pop_front() {
        let idx = idx as usize;
        bitmap.set_pixel_at(idx, color);
        filled.set(idx);
        count += 1;

        let x = (idx % w as usize) as u32;
        let y = (idx / w as usize) as u32;

        let neighbors = [
            (x > 0).then(|| idx - 1),
            (x + 1 < w).then(|| idx + 1),
            (y > 0).then(|| idx - w as usize),
            (y + 1 < h).then(|| idx + w as usize),
        ];
        for ni in neighbors.into_iter().flatten() {
            if visited.get(ni) || soft.get(ni) {
                continue;
            }
            if within_tolerance(bitmap.pixel_at(ni), target, options.tolerance) {
                visited.set(ni);
                queue.push_back(ni as u32);
            }
        }
    }

    FillOutcome {
        filled,
        count,
        seed: Some(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};
    use crate::ops::boundary::BoundaryMasks;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// 20×20 white canvas split by a vertical black line at x = 10.
    fn split_canvas() -> Bitmap {
        let mut bmp = Bitmap::new_filled(20, 20, WHITE);
        for y in 0..20 {
            bmp.put_pixel(10, y, BLACK);
        }
        bmp
    }

    #[test]
    fn fills_one_side_of_a_wall() {
        let mut bmp = split_canvas();
        let masks = BoundaryMasks::build(&bmp);
        let out = flood_fill(&mut bmp, &masks.soft, Point::new(2, 2), RED, FillOptions::default());

        // Soft mask covers x = 8..=12, so the left region is x = 0..=7.
        assert_eq!(out.count, 8 * 20);
        assert_eq!(out.filled.count(), out.count);
        assert_eq!(bmp.get_pixel(7, 19), Some(RED));
        assert_eq!(bmp.get_pixel(8, 0), Some(WHITE));
        assert_eq!(bmp.get_pixel(15, 5), Some(WHITE));
    }

    #[test]
    fn diagonal_gaps_do_not_connect() {
        // Checkerboard of two colours far outside tolerance: a 4-connected fill
        // from a white cell paints only that cell.
        let mut bmp = Bitmap::new_filled(4, 4, WHITE);
        for y in 0..4 {
            for x in 0..4 {
                if (x + y) % 2 == 1 {
                    bmp.put_pixel(x, y, Rgba([200, 0, 200, 255]));
                }
            }
        }
        let soft = PixelMask::new(4, 4);
        let out = flood_fill(&mut bmp, &soft, Point::new(0, 0), RED, FillOptions::default());
        assert_eq!(out.count, 1);
    }

    #[test]
    fn tolerance_window_is_respected() {
        let mut bmp = Bitmap::new_filled(3, 1, WHITE);
        bmp.put_pixel(1, 0, Rgba([235, 235, 235, 255])); // Δ20: accepted
        bmp.put_pixel(2, 0, Rgba([214, 214, 214, 255])); // Δ41 from target: rejected
        let soft = PixelMask::new(3, 1);
        let out = flood_fill(&mut bmp, &soft, Point::new(0, 0), RED, FillOptions::default());
        assert_eq!(out.count, 2);
        assert_eq!(bmp.get_pixel(2, 0), Some(Rgba([214, 214, 214, 255])));
    }

    #[test]
    fn already_matching_colour_is_a_no_op() {
        let mut bmp = Bitmap::new_filled(5, 5, Rgba([250, 5, 5, 255]));
        let soft = PixelMask::new(5, 5);
        let before = bmp.clone();
        let out = flood_fill(&mut bmp, &soft, Point::new(2, 2), RED, FillOptions::default());
        assert_eq!(out.count, 0);
        assert_eq!(out.seed, Some(Point::new(2, 2)));
        assert_eq!(bmp, before);
    }

    #[test]
    fn seed_on_boundary_is_nudged() {
        let mut bmp = split_canvas();
        let masks = BoundaryMasks::build(&bmp);
        // (10, 5) is on the line; the soft band spans x = 8..=12, so radius 3 reaches x = 7.
        let out = flood_fill(&mut bmp, &masks.soft, Point::new(10, 5), RED, FillOptions::default());
        assert_eq!(out.seed, Some(Point::new(7, 2)));
        assert_eq!(out.count, 8 * 20);
    }

    #[test]
    fn seed_without_fillable_neighbourhood_is_a_no_op() {
        let mut bmp = Bitmap::new_filled(30, 30, BLACK);
        let masks = BoundaryMasks::build(&bmp);
        let out = flood_fill(&mut bmp, &masks.soft, Point::new(15, 15), RED, FillOptions::default());
        assert_eq!(out.count, 0);
        assert_eq!(out.seed, None);
    }

    #[test]
    fn off_canvas_seed_is_pulled_in() {
        let mut bmp = Bitmap::new_filled(10, 10, WHITE);
        let soft = PixelMask::new(10, 10);
        let out = flood_fill(&mut bmp, &soft, Point::new(-2, -2), RED, FillOptions::default());
        assert_eq!(out.seed, Some(Point::new(0, 0)));
        assert_eq!(out.count, 100);

        let far = flood_fill(&mut bmp, &soft, Point::new(i32::MAX, i32::MIN), RED, FillOptions::default());
        assert_eq!(far.count, 0);
        assert_eq!(far.seed, None);
    }

    #[test]
    fn fill_colour_is_forced_opaque() {
        let mut bmp = Bitmap::new_filled(2, 2, WHITE);
        let soft = PixelMask::new(2, 2);
        flood_fill(&mut bmp, &soft, Point::new(0, 0), Rgba([0, 0, 255, 10]), FillOptions::default());
        assert_eq!(bmp.get_pixel(1, 1), Some(Rgba([0, 0, 255, 255])));
    }
}
