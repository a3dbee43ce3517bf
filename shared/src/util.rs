use once_cell::sync::Lazy;
use std::f32::consts::TAU;

const LOOKUP_TABLE_SIZE: usize = 360;

/// Precomputed (sin, cos) for whole-degree angles.
static SIN_COS_TABLE: Lazy<[(f32, f32); LOOKUP_TABLE_SIZE]> = Lazy::new(|| {
    let mut arr = [(0.0f32, 0.0f32); LOOKUP_TABLE_SIZE];
    let step = TAU / LOOKUP_TABLE_SIZE as f32;
    for (i, entry) in arr.iter_mut().enumerate() {
        let angle = i as f32 * step;
        *entry = (angle.sin(), angle.cos());
    }
    arr
});

/// Fast sine and cosine using the lookup table. Any angle is accepted.
#[inline(always)]
pub fn fast_sin_cos(angle: f32) -> (f32, f32) {
    let frac = angle.rem_euclid(TAU) / TAU;
    let idx = ((frac * LOOKUP_TABLE_SIZE as f32).round() as usize) % LOOKUP_TABLE_SIZE;
    SIN_COS_TABLE[idx]
}

/// Angle of heading `index` on a ring of `count` evenly spaced compass
/// headings. Heading 0 points east (+x), headings advance counter-clockwise.
#[inline(always)]
pub fn ring_heading(index: usize, count: usize) -> f32 {
    index as f32 * TAU / count as f32
}

/// Unit (x, y) direction of `ring_heading(index, count)`.
#[inline(always)]
pub fn ring_direction(index: usize, count: usize) -> (f32, f32) {
    let (sin, cos) = fast_sin_cos(ring_heading(index, count));
    (cos, sin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn assert_close(angle: f32) {
        let (fast_sin, fast_cos) = fast_sin_cos(angle);
        assert!((fast_sin - angle.sin()).abs() < 0.01, "sin off at {angle}");
        assert!((fast_cos - angle.cos()).abs() < 0.01, "cos off at {angle}");
    }

    #[test]
    fn matches_std_on_cardinal_angles() {
        for angle in [0.0, PI / 4.0, PI / 2.0, PI, 1.5 * PI] {
            assert_close(angle);
        }
    }

    #[test]
    fn wraps_negative_and_large_angles() {
        assert_close(-PI / 2.0);
        assert_close(2.5 * PI);
        assert_close(10.0 * PI);
    }

    #[test]
    fn ring_of_sixteen_hits_compass_points() {
        let (ex, ey) = ring_direction(0, 16);
        assert!((ex - 1.0).abs() < 1e-6 && ey.abs() < 1e-6);
        let (nx, ny) = ring_direction(4, 16);
        assert!(nx.abs() < 1e-6 && (ny - 1.0).abs() < 1e-6);
        let (wx, _) = ring_direction(8, 16);
        assert!((wx + 1.0).abs() < 1e-6);
    }
}
