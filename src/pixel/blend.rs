//! Alpha-compositing a front pixel over a back pixel.

use super::Pixel;

/// Scales a byte-valued alpha fraction `a` (0.0..=1.0) by an optional extra
/// byte factor, the way `front_alpha`/`back_alpha` scale `c.alpha` before
/// compositing.
fn scale_alpha(a: f64, extra: Option<u8>) -> f64 {
    match extra {
        Some(byte) => a * f64::from(byte) / 255.0,
        None => a,
    }
}

/// Composites `front` over `back`, optionally scaling either side's alpha by
/// an extra byte factor first.
///
/// `A' = 1 - (1-a2)(1-a1)`; RGB channels are alpha-weighted and normalized by
/// `A'`. When `A'` is zero the result is fully transparent with zeroed
/// channels rather than dividing by zero.
#[must_use]
pub fn blend(back: Pixel, front: Pixel, front_alpha: Option<u8>, back_alpha: Option<u8>) -> Pixel {
    let a1 = scale_alpha(f64::from(back.alpha) / 255.0, back_alpha);
    let a2 = scale_alpha(f64::from(front.alpha) / 255.0, front_alpha);

    let out_a = 1.0 - (1.0 - a2) * (1.0 - a1);
    if out_a <= 0.0 {
        return Pixel { red: 0, green: 0, blue: 0, alpha: 0 };
    }

    let blend_channel = |c1: u8, c2: u8| -> u8 {
        let v = (f64::from(c2) * a2 + f64::from(c1) * a1 * (1.0 - a2)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };

    Pixel {
        red: blend_channel(back.red, front.red),
        green: blend_channel(back.green, front.green),
        blue: blend_channel(back.blue, front.blue),
        alpha: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
