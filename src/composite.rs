//! Compositing of raster passes onto an accumulated backdrop.
//!
//! Normal-mode compositing is integer premultiplied source-over. The
//! non-normal blend modes (overlay, multiply, softlight) need the backdrop
//! unpremultiplied for their separable mix functions, so they run through a
//! float path per pixel.

use crate::{
    error::{VeneerError, VeneerResult},
    model::BlendMode,
};

pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over with an extra source opacity.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = mul_div255(u16::from(dst[3]), inv).saturating_add(sa);

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite `src` onto `dst` pixel by pixel with a blend mode and opacity.
///
/// Both buffers are premultiplied RGBA8 of equal length.
pub fn blend_over_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
) -> VeneerResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VeneerError::validation(
            "blend_over_in_place expects equal-length rgba8 buffers",
        ));
    }

    match mode {
        BlendMode::Normal => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                d.copy_from_slice(&out);
            }
        }
        _ => {
            let mix = match mode {
                BlendMode::Overlay => overlay,
                BlendMode::Multiply => multiply,
                BlendMode::SoftLight => soft_light,
                BlendMode::Normal => unreachable!(),
            };
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let out = mix_pixel([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity, mix);
                d.copy_from_slice(&out);
            }
        }
    }
    Ok(())
}

/// Full blend-and-composite for one pixel:
///
/// co = as·(1−ab)·Cs + as·ab·B(Cb, Cs) + (1−as)·ab·Cb, ao = as + ab·(1−as)
fn mix_pixel(
    dst: PremulRgba8,
    src: PremulRgba8,
    opacity: f32,
    mix: fn(f32, f32) -> f32,
) -> PremulRgba8 {
    let sa = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let ba = dst[3] as f32 / 255.0;

    // Unpremultiply both sides for the mix function.
    let unpremul = |px: PremulRgba8, a: f32, i: usize| {
        if a > 0.0 {
            (px[i] as f32 / 255.0 / (px[3] as f32 / 255.0)).min(1.0)
        } else {
            0.0
        }
    };

    let ao = sa + ba * (1.0 - sa);
    let mut out = [0u8; 4];
    out[3] = ((ao * 255.0).round()).clamp(0.0, 255.0) as u8;

    for i in 0..3 {
        let cs = unpremul(src, src[3] as f32 / 255.0, i);
        let cb = unpremul(dst, ba, i);
        let co = sa * (1.0 - ba) * cs + sa * ba * mix(cb, cs) + (1.0 - sa) * ba * cb;
        out[i] = ((co * 255.0).round()).clamp(0.0, 255.0) as u8;
    }
    out
}

fn multiply(b: f32, s: f32) -> f32 {
    b * s
}

fn overlay(b: f32, s: f32) -> f32 {
    if b <= 0.5 {
        2.0 * b * s
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - s)
    }
}

fn soft_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.sqrt()
        };
        b + (2.0 * s - 1.0) * (d - b)
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
