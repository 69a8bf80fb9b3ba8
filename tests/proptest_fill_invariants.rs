//! Property-based invariant tests for the colouring pipeline.
//!
//! For arbitrary small line-art bitmaps and seeds:
//!
//! 1. Fill plus edge coat is deterministic.
//! 2. A second fill at the same seed with the same colour paints nothing.
//! 3. Fill never paints soft-mask pixels; the edge coat never paints strict ones.
//! 4. Only pixels in the returned mask change, and the count matches it.
//! 5. PNG and data-URL encodings round-trip every RGBA value and byte.
//! 6. A brush dab never writes outside its disc.
//! 7. Undo always returns to the previous committed state.

use image::Rgba;
use inkfill::canvas::{BLACK, WHITE};
use inkfill::io;
use inkfill::ops::boundary::BoundaryMasks;
use inkfill::ops::brush::{self, BrushMode};
use inkfill::ops::{edge_coat, fill};
use inkfill::{Bitmap, ColoringSession, EngineSettings, FillOptions, Point};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const PALETTE: [Rgba<u8>; 6] = [
    WHITE,
    WHITE,
    BLACK,
    Rgba([110, 110, 110, 255]),
    Rgba([250, 240, 235, 255]),
    Rgba([0, 0, 0, 90]),
];

fn line_art_strategy() -> impl Strategy<Value = Bitmap> {
    (1u32..=24, 1u32..=24).prop_flat_map(|(w, h)| {
        prop::collection::vec(prop::sample::select(PALETTE.to_vec()), (w * h) as usize).prop_map(
            move |px| {
                let raw = px.iter().flat_map(|c| c.0).collect::<Vec<u8>>();
                Bitmap::from_raw(w, h, raw).unwrap()
            },
        )
    })
}

fn any_bitmap_strategy() -> impl Strategy<Value = Bitmap> {
    (1u32..=16, 1u32..=16).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |raw| Bitmap::from_raw(w, h, raw).unwrap())
    })
}

fn color_strategy() -> impl Strategy<Value = Rgba<u8>> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgba([r, g, b, 255]))
}

fn seed_strategy() -> impl Strategy<Value = (i32, i32)> {
    (-4i32..=28, -4i32..=28)
}

/// Run one fill + edge coat the way a session does.
fn fill_and_coat(bmp: &mut Bitmap, masks: &BoundaryMasks, seed: Point, color: Rgba<u8>) -> usize {
    let mut outcome = fill::flood_fill(bmp, &masks.soft, seed, color, FillOptions::default());
    if outcome.count == 0 {
        return 0;
    }
    outcome.count + edge_coat::refine(bmp, &mut outcome.filled, &masks.strict, color)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fill_is_deterministic(
        art in line_art_strategy(),
        (x, y) in seed_strategy(),
        color in color_strategy(),
    ) {
        let masks = BoundaryMasks::build(&art);
        let mut a = art.clone();
        let mut b = art.clone();
        let na = fill_and_coat(&mut a, &masks, Point::new(x, y), color);
        let nb = fill_and_coat(&mut b, &masks, Point::new(x, y), color);
        prop_assert_eq!(na, nb);
        prop_assert_eq!(a, b);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn second_fill_paints_nothing(
        art in line_art_strategy(),
        (x, y) in seed_strategy(),
        color in color_strategy(),
    ) {
        let masks = BoundaryMasks::build(&art);
        let mut bmp = art.clone();
        fill_and_coat(&mut bmp, &masks, Point::new(x, y), color);
        let after_first = bmp.clone();

        let again = fill_and_coat(&mut bmp, &masks, Point::new(x, y), color);
        prop_assert_eq!(again, 0, "second fill at ({}, {}) painted {}", x, y, again);
        prop_assert_eq!(bmp, after_first);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Boundaries hold
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn boundaries_are_never_painted(
        art in line_art_strategy(),
        (x, y) in seed_strategy(),
        color in color_strategy(),
    ) {
        let masks = BoundaryMasks::build(&art);
        let mut bmp = art.clone();
        let mut outcome =
            fill::flood_fill(&mut bmp, &masks.soft, Point::new(x, y), color, FillOptions::default());

        for idx in 0..art.pixel_count() {
            if masks.soft.get(idx) {
                prop_assert!(!outcome.filled.get(idx), "fill entered soft pixel {}", idx);
                prop_assert_eq!(bmp.pixel_at(idx), art.pixel_at(idx));
            }
        }

        edge_coat::refine(&mut bmp, &mut outcome.filled, &masks.strict, color);
        for idx in 0..art.pixel_count() {
            if masks.strict.get(idx) {
                prop_assert_eq!(bmp.pixel_at(idx), art.pixel_at(idx), "strict pixel {} painted", idx);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Reported mask matches the change
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn only_masked_pixels_change(
        art in line_art_strategy(),
        (x, y) in seed_strategy(),
        color in color_strategy(),
    ) {
        let masks = BoundaryMasks::build(&art);
        let mut bmp = art.clone();
        let outcome =
            fill::flood_fill(&mut bmp, &masks.soft, Point::new(x, y), color, FillOptions::default());

        prop_assert_eq!(outcome.count, outcome.filled.count());
        for idx in 0..art.pixel_count() {
            if outcome.filled.get(idx) {
                prop_assert_eq!(bmp.pixel_at(idx), color);
            } else {
                prop_assert_eq!(bmp.pixel_at(idx), art.pixel_at(idx));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Codec round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn png_round_trip_is_lossless(bmp in any_bitmap_strategy()) {
        let png = io::encode_png(&bmp).unwrap();
        prop_assert_eq!(io::decode(&png).unwrap(), bmp.clone());

        let url = io::to_data_url(&png);
        prop_assert_eq!(io::decode(url.as_bytes()).unwrap(), bmp);
    }

    #[test]
    fn data_url_payload_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let url = io::to_data_url(&bytes);
        let payload = url.trim_start_matches("data:image/png;base64,");
        prop_assert_eq!(payload.len() % 4, 0);
        prop_assert_eq!(io::decode_data_url(url.as_bytes()).unwrap(), bytes);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Brush stays inside its disc
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dab_stays_within_radius(
        (cx, cy) in (-8i32..=32, -8i32..=32),
        radius in 0u32..=6,
        color in color_strategy(),
    ) {
        let template = Bitmap::new_filled(24, 24, WHITE);
        let mut bmp = template.clone();
        let color = if color == WHITE { BLACK } else { color };
        let written =
            brush::stamp_circle(&mut bmp, &template, Point::new(cx, cy), radius, BrushMode::Paint(color));

        let r2 = (radius * radius) as i32;
        let mut inside = 0;
        for y in 0..24 {
            for x in 0..24 {
                let d2 = (x - cx) * (x - cx) + (y - cy) * (y - cy);
                let px = bmp.get_pixel(x, y).unwrap();
                if d2 <= r2 {
                    prop_assert_eq!(px, color);
                    inside += 1;
                } else {
                    prop_assert_eq!(px, WHITE);
                }
            }
        }
        prop_assert_eq!(written, inside);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Undo walks back through committed states
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn undo_restores_each_prior_state(
        dabs in prop::collection::vec(((0i32..32, 0i32..32), color_strategy()), 1..8),
    ) {
        let mut session = ColoringSession::new(EngineSettings {
            fallback_width: 32,
            fallback_height: 32,
            max_undo_steps: 0,
            ..Default::default()
        });
        let mut states = vec![session.bitmap().clone()];
        for ((x, y), color) in &dabs {
            session.begin_stroke(*x, *y, BrushMode::Paint(*color), 2);
            session.end_stroke();
            states.push(session.bitmap().clone());
        }

        states.pop();
        while let Some(expected) = states.pop() {
            prop_assert!(session.undo());
            prop_assert_eq!(session.bitmap(), &expected);
        }
        prop_assert!(!session.undo());
    }
}
