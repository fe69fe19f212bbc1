use std::f32::consts::PI;

/*
Waveshaping Curve
=================

Distortion here is table-driven: a fixed-resolution transfer curve is
computed once per "amount" setting, and every sample is shaped by looking
its value up in the table (with linear interpolation between entries).

The curve itself is the classic arctangent-flavored shaper

    f(x) = (3 + k) · x · 20° / (π + k·|x|)        x in [-1, 1]

where k is the drive amount. At k = 0 the curve is almost linear (clean);
as k grows the midsection steepens and the ends flatten, compressing peaks
and adding odd harmonics.

Recomputing the table only when the amount changes keeps the per-sample cost
at one lookup regardless of how expensive the transfer function is.
*/

/// Number of entries in the lookup curve.
pub const CURVE_RESOLUTION: usize = 256;

/// Compute the waveshaping transfer curve for a drive amount (0..=100).
pub fn make_curve(amount: f32) -> [f32; CURVE_RESOLUTION] {
    let k = amount.clamp(0.0, 100.0);
    let deg = PI / 180.0;

    let mut curve = [0.0f32; CURVE_RESOLUTION];
    for (i, entry) in curve.iter_mut().enumerate() {
        let x = (i as f32 * 2.0) / (CURVE_RESOLUTION - 1) as f32 - 1.0;
        *entry = ((3.0 + k) * x * 20.0 * deg) / (PI + k * x.abs());
    }
    curve
}

/// Shape one sample through the curve, interpolating between entries.
#[inline]
pub fn shape(curve: &[f32; CURVE_RESOLUTION], sample: f32) -> f32 {
    let x = sample.clamp(-1.0, 1.0);
    let position = (x + 1.0) * 0.5 * (CURVE_RESOLUTION - 1) as f32;
    let index = position.floor() as usize;
    let frac = position - index as f32;

    if index + 1 < CURVE_RESOLUTION {
        curve[index] * (1.0 - frac) + curve[index + 1] * frac
    } else {
        curve[CURVE_RESOLUTION - 1]
    }
}

/// Shape a whole buffer in place.
pub fn shape_buffer(curve: &[f32; CURVE_RESOLUTION], buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = shape(curve, *sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_is_odd_symmetric() {
        let curve = make_curve(50.0);
        for i in 0..CURVE_RESOLUTION / 2 {
            let left = curve[i];
            let right = curve[CURVE_RESOLUTION - 1 - i];
            assert!(
                (left + right).abs() < 1e-3,
                "curve not symmetric at {i}: {left} vs {right}"
            );
        }
    }

    #[test]
    fn curve_is_monotone() {
        for amount in [0.0, 25.0, 100.0] {
            let curve = make_curve(amount);
            for pair in curve.windows(2) {
                assert!(pair[1] >= pair[0], "amount {amount} produced a fold");
            }
        }
    }

    #[test]
    fn more_drive_steepens_the_middle() {
        let clean = make_curve(0.0);
        let driven = make_curve(80.0);

        // Slope near zero crossing.
        let mid = CURVE_RESOLUTION / 2;
        let clean_slope = clean[mid + 1] - clean[mid];
        let driven_slope = driven[mid + 1] - driven[mid];
        assert!(driven_slope > clean_slope * 2.0);
    }

    #[test]
    fn shaping_clamps_out_of_range_input() {
        let curve = make_curve(40.0);
        assert_eq!(shape(&curve, 5.0), shape(&curve, 1.0));
        assert_eq!(shape(&curve, -5.0), shape(&curve, -1.0));
    }
}
