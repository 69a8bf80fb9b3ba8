use image::Rgba;

use crate::canvas::{Bitmap, Point, opaque};

/// What a stamp writes into the bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushMode {
    Paint(Rgba<u8>),
    /// Restore pixels from the original template.
    Erase,
}

/// Brush radius capped at `width + height`: a disc that wide already covers
/// the whole canvas from any centre on it.
pub fn effective_radius(bitmap: &Bitmap, radius: u32) -> u32 {
    radius.min(bitmap.width().saturating_add(bitmap.height()))
}

/// Stamp a filled circle (`dx² + dy² <= r²`) centred on `center`.
/// Returns the number of pixels written; off-canvas pixels are skipped.
pub fn stamp_circle(bitmap: &mut Bitmap, template: &Bitmap, center: Point, radius: u32, mode: BrushMode) -> usize {
    stamp_points(bitmap, template, &[center], radius, mode)
}

/// Stamp the union of the discs around `points`, writing each pixel once.
///
/// Rows are rasterised as spans. `points` must be a chain of 8-neighbours
/// (as [`interpolate`] returns), so the discs of one row always join into a
/// single interval.
fn stamp_points(bitmap: &mut Bitmap, template: &Bitmap, points: &[Point], radius: u32, mode: BrushMode) -> usize {
    if mode == BrushMode::Erase && !bitmap.same_size(template) {
        return 0;
    }
    let w = bitmap.width() as i64;
    let h = bitmap.height() as i64;
    if w == 0 || h == 0 || points.is_empty() {
        return 0;
    }
    let mode = match mode {
        BrushMode::Paint(c) => BrushMode::Paint(opaque(c)),
        BrushMode::Erase => BrushMode::Erase,
    };

    let r = radius as i64;
    let r2 = radius as u64 * radius as u64;
    let top = points.iter().map(|p| p.y as i64).min().unwrap_or(0);
    let bottom = points.iter().map(|p| p.y as i64).max().unwrap_or(0);

    let mut written = 0;
    for y in (top - r).max(0)..=(bottom + r).min(h - 1) {
        let mut span: Option<(i64, i64)> = None;
        for p in points {
            let dy = (y - p.y as i64).unsigned_abs();
            if dy > radius as u64 {
                continue;
            }
            let half = (r2 - dy * dy).isqrt() as i64;
            let (x0, x1) = (p.x as i64 - half, p.x as i64 + half);
            span = Some(match span {
                Some((a, b)) => (a.min(x0), b.max(x1)),
                None => (x0, x1),
            });
        }
        let Some((x0, x1)) = span else {
            continue;
        };
        let (x0, x1) = (x0.max(0), x1.min(w - 1));
        for x in x0..=x1 {
            let idx = bitmap.index_of(x as u32, y as u32);
            match mode {
                BrushMode::Paint(c) => bitmap.set_pixel_at(idx, c),
                BrushMode::Erase => bitmap.copy_pixel_from(template, idx),
            }
            written += 1;
        }
    }
    written
}

/// The `max(|Δx|, |Δy|) + 1` integer points from `from` to `to`, both inclusive.
pub fn interpolate(from: Point, to: Point) -> Vec<Point> {
    let dx = to.x as i64 - from.x as i64;
    let dy = to.y as i64 - from.y as i64;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        return vec![to];
    }

    (0..=steps)
        .map(|i| {
            let x = from.x as i64 + round_div(dx * i, steps);
            let y = from.y as i64 + round_div(dy * i, steps);
            Point::new(x as i32, y as i32)
        })
        .collect()
}

/// `n / d` rounded half away from zero, `d > 0`.
fn round_div(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

/// Stamp one brush segment. With no previous point this is a single dab;
/// otherwise every interpolated point between the two samples is stamped so
/// fast, sparse input still produces a continuous stroke. Returns the number
/// of distinct pixels written.
pub fn stamp_segment(
    bitmap: &mut Bitmap,
    template: &Bitmap,
    previous: Option<Point>,
    current: Point,
    radius: u32,
    mode: BrushMode,
) -> usize {
    match previous {
        None => stamp_circle(bitmap, template, current, radius, mode),
        Some(prev) => stamp_points(bitmap, template, &interpolate(prev, current), radius, mode),
    }
}

/// Clamp a caller-supplied point into the bitmap extent padded by the
/// (effective) brush radius; stamps further out could never touch a pixel.
pub fn clamp_to_reach(bitmap: &Bitmap, p: Point, radius: u32) -> Point {
    let pad = effective_radius(bitmap, radius) as i64 + 1;
    let max_x = bitmap.width() as i64 + pad;
    let max_y = bitmap.height() as i64 + pad;
    Point::new(
        (p.x as i64).clamp(-pad, max_x) as i32,
        (p.y as i64).clamp(-pad, max_y) as i32,
    )
}
