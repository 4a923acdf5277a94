//! Effect application helpers shared by the rasterizer: gradient ramp
//! generation and alignment-aware stroking on a `vello_cpu` context.

use crate::{
    color::Rgba,
    error::{VeneerError, VeneerResult},
    program::StrokeAlign,
};

/// Premultiplied RGBA8 row colors for a vertical multi-stop gradient.
///
/// Positions outside the stop range clamp to the end colors; between stops
/// the straight-alpha channels interpolate linearly and are premultiplied
/// afterwards. Callers guarantee stops are validated and non-empty.
pub fn gradient_ramp(stops: &[(f64, Rgba)], height: u32) -> Vec<[u8; 4]> {
    let h1 = (height.max(1) - 1) as f64;
    (0..height.max(1))
        .map(|y| {
            let t = if h1 <= 0.0 { 0.0 } else { y as f64 / h1 };
            premul_bytes(sample_stops(stops, t))
        })
        .collect()
}

fn sample_stops(stops: &[(f64, Rgba)], t: f64) -> Rgba {
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let span = p1 - p0;
            let f = if span <= 0.0 { 1.0 } else { (t - p0) / span };
            return Rgba {
                r: c0.r + (c1.r - c0.r) * f,
                g: c0.g + (c1.g - c0.g) * f,
                b: c0.b + (c1.b - c0.b) * f,
                a: c0.a + (c1.a - c0.a) * f,
            };
        }
    }
    last.1
}

fn premul_bytes(c: Rgba) -> [u8; 4] {
    let a = c.a.clamp(0.0, 1.0);
    let to = |x: f64| (x.clamp(0.0, 1.0) * a * 255.0).round() as u8;
    [to(c.r), to(c.g), to(c.b), (a * 255.0).round() as u8]
}

/// Stroke `path` on one side of its outline.
///
/// The stroke runs at double width under a clip: clipped to the interior for
/// an inner stroke, to the exterior (even-odd against an enclosing rect) for
/// an outer stroke, so exactly `width` points of paint survive on the wanted
/// side.
pub fn stroke_path_aligned(
    ctx: &mut vello_cpu::RenderContext,
    path: &vello_cpu::kurbo::BezPath,
    align: StrokeAlign,
    width: f64,
    bounds: vello_cpu::kurbo::Rect,
) -> VeneerResult<()> {
    if !width.is_finite() || width <= 0.0 {
        return Err(VeneerError::validation("stroke width must be finite and > 0"));
    }

    let clip = match align {
        StrokeAlign::Inner => path.clone(),
        StrokeAlign::Outer => {
            // Shape plus an enclosing rect; even-odd keeps the outside.
            let mut outside = vello_cpu::kurbo::BezPath::new();
            let pad = width * 2.0 + 2.0;
            let enclosing = bounds.inflate(pad, pad);
            outside.move_to((enclosing.x0, enclosing.y0));
            outside.line_to((enclosing.x1, enclosing.y0));
            outside.line_to((enclosing.x1, enclosing.y1));
            outside.line_to((enclosing.x0, enclosing.y1));
            outside.close_path();
            outside.extend(path.iter());
            outside
        }
    };

    match align {
        StrokeAlign::Inner => ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero),
        StrokeAlign::Outer => ctx.set_fill_rule(vello_cpu::peniko::Fill::EvenOdd),
    }
    ctx.push_clip_layer(&clip);
    ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero);
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width * 2.0));
    ctx.stroke_path(path);
    ctx.pop_layer();
    Ok(())
}
