//! Rasterization of a compiled [`RenderableUnit`] at a pixel size.
//!
//! Every draw op renders into a transparent scratch surface via `vello_cpu`
//! and is then composited onto the accumulated result with its own alpha and
//! blend mode, so non-normal blend modes see the real backdrop. Shadow ops
//! add a gaussian blur pass between the scratch render and the composite;
//! inner shadows are additionally masked by the shape's own coverage.

use kurbo::{Affine, Rect, Shape};
use tracing::debug;

use crate::{
    blur::blur_shadow,
    color::Rgba,
    composite::{blend_over_in_place, over},
    effects::{gradient_ramp, stroke_path_aligned},
    error::{VeneerError, VeneerResult},
    model::{BlendMode, Insets, VAlign},
    program::{Brush, ButtonState, DrawOp, RenderableUnit, ShadowSpec, TextSpec},
    text::TextEngine,
};

/// Rasterized output: premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl RasterImage {
    /// Unpremultiplied copy of the pixels.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 || a == 255 {
                continue;
            }
            for c in px.iter_mut().take(3) {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// PNG-encode the image (straight alpha, RGBA8).
    pub fn encode_png(&self) -> VeneerResult<Vec<u8>> {
        let straight = self.to_straight_rgba();
        let mut out = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut out);
        image::ImageEncoder::write_image(
            encoder,
            &straight,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| VeneerError::validation(format!("png encode failed: {e}")))?;
        Ok(out)
    }
}

/// Render a unit tree to `width`x`height` pixels.
///
/// The unit's natural size is mapped onto the requested size with a uniform
/// per-axis scale; a zero natural extent renders at identity scale.
pub fn render(
    unit: &RenderableUnit,
    width: u32,
    height: u32,
    text: &mut TextEngine,
) -> VeneerResult<RasterImage> {
    surface_dims(width, height)?;

    let natural = unit.natural_size();
    let sx = if natural.width > 0.0 {
        width as f64 / natural.width
    } else {
        1.0
    };
    let sy = if natural.height > 0.0 {
        height as f64 / natural.height
    } else {
        1.0
    };
    let transform = Affine::scale_non_uniform(sx, sy);

    debug!(width, height, sx, sy, "rasterizing unit");

    let mut dst = vec![0u8; (width as usize) * (height as usize) * 4];
    render_unit(unit, transform, 1.0, &mut dst, width, height, text)?;
    Ok(RasterImage {
        width,
        height,
        rgba8_premul: dst,
    })
}

fn surface_dims(width: u32, height: u32) -> VeneerResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(VeneerError::validation("raster size must be non-zero"));
    }
    let w = u16::try_from(width)
        .map_err(|_| VeneerError::validation("raster width exceeds u16"))?;
    let h = u16::try_from(height)
        .map_err(|_| VeneerError::validation("raster height exceeds u16"))?;
    Ok((w, h))
}

fn render_unit(
    unit: &RenderableUnit,
    transform: Affine,
    alpha: f64,
    dst: &mut [u8],
    width: u32,
    height: u32,
    text: &mut TextEngine,
) -> VeneerResult<()> {
    let alpha = alpha * unit.alpha.unwrap_or(1.0).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return Ok(());
    }

    if unit.button.is_some() {
        render_button(unit, transform, alpha, dst, width, height, text)?;
    }

    for op in &unit.ops {
        render_op(op, transform, alpha, dst, width, height, text)?;
    }

    for child in &unit.children {
        let t = transform * Affine::translate(child.frame.origin().to_vec2());
        render_unit(child, t, alpha, dst, width, height, text)?;
    }

    Ok(())
}

fn render_button(
    unit: &RenderableUnit,
    transform: Affine,
    alpha: f64,
    dst: &mut [u8],
    width: u32,
    height: u32,
    text: &mut TextEngine,
) -> VeneerResult<()> {
    let faces = unit.button.as_ref().expect("caller checked");
    let Some(face) = faces.face(ButtonState::Normal) else {
        return Ok(());
    };

    let local = unit.frame.with_origin((0.0, 0.0));
    let device = transform.transform_rect_bbox(local);
    let natural = face.natural_size();
    let dev_w = device.width().round().max(0.0) as u32;
    let dev_h = device.height().round().max(0.0) as u32;
    let nat_w = natural.width.round().max(0.0) as u32;
    let nat_h = natural.height.round().max(0.0) as u32;

    let stretched = faces.stretchable_edges.filter(|_| {
        nat_w > 0 && nat_h > 0 && dev_w > 0 && dev_h > 0 && (dev_w, dev_h) != (nat_w, nat_h)
    });

    match stretched {
        Some(edges) => {
            // Materialize the face at its natural size, then 9-slice scale.
            let nat = render(face, nat_w, nat_h, text)?;
            let sliced = nine_slice(&nat, edges, dev_w, dev_h);
            blit(
                dst,
                width,
                height,
                &sliced,
                device.x0.round() as i64,
                device.y0.round() as i64,
                alpha as f32,
            );
        }
        None => render_unit(face, transform, alpha, dst, width, height, text)?,
    }

    if let Some(img) = &faces.content_image {
        let insets = faces
            .content_image_insets
            .or(faces.content_insets)
            .unwrap_or_default();
        let t = transform * Affine::translate((insets.left, insets.top));
        render_unit(img, t, alpha, dst, width, height, text)?;
    }

    Ok(())
}

/// Scale a raster by stretching the middle regions and keeping the corner
/// regions defined by `edges` at their source size.
fn nine_slice(src: &RasterImage, edges: Insets, out_w: u32, out_h: u32) -> RasterImage {
    let map_axis = |o: u32, out_len: u32, src_len: u32, lo: f64, hi: f64| -> u32 {
        let lo = (lo.max(0.0).round() as u32).min(src_len.saturating_sub(1));
        let hi = (hi.max(0.0).round() as u32).min(src_len.saturating_sub(1));
        let keep_tail = hi;
        if o < lo {
            return o.min(src_len - 1);
        }
        if o >= out_len.saturating_sub(keep_tail) {
            return src_len - (out_len - o);
        }
        // Middle band: linear map between the fixed ends.
        let out_mid = out_len.saturating_sub(lo + keep_tail).max(1);
        let src_mid = src_len.saturating_sub(lo + keep_tail).max(1);
        lo + ((o - lo) as u64 * src_mid as u64 / out_mid as u64) as u32
    };

    let mut out = vec![0u8; (out_w as usize) * (out_h as usize) * 4];
    for y in 0..out_h {
        let sy = map_axis(y, out_h, src.height, edges.top, edges.bottom);
        for x in 0..out_w {
            let sx = map_axis(x, out_w, src.width, edges.left, edges.right);
            let si = ((sy * src.width + sx) as usize) * 4;
            let di = ((y * out_w + x) as usize) * 4;
            out[di..di + 4].copy_from_slice(&src.rgba8_premul[si..si + 4]);
        }
    }
    RasterImage {
        width: out_w,
        height: out_h,
        rgba8_premul: out,
    }
}

/// Composite a raster onto `dst` at an integer offset.
fn blit(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &RasterImage,
    at_x: i64,
    at_y: i64,
    opacity: f32,
) {
    for sy in 0..src.height as i64 {
        let dy = at_y + sy;
        if dy < 0 || dy >= dst_h as i64 {
            continue;
        }
        for sx in 0..src.width as i64 {
            let dx = at_x + sx;
            if dx < 0 || dx >= dst_w as i64 {
                continue;
            }
            let si = ((sy as u32 * src.width + sx as u32) as usize) * 4;
            let di = ((dy as u32 * dst_w + dx as u32) as usize) * 4;
            let s = [
                src.rgba8_premul[si],
                src.rgba8_premul[si + 1],
                src.rgba8_premul[si + 2],
                src.rgba8_premul[si + 3],
            ];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, opacity));
        }
    }
}

fn render_op(
    op: &DrawOp,
    transform: Affine,
    alpha: f64,
    dst: &mut [u8],
    width: u32,
    height: u32,
    text: &mut TextEngine,
) -> VeneerResult<()> {
    match op {
        DrawOp::Fill {
            path,
            brush,
            alpha: op_alpha,
            blend,
        } => {
            let scratch = match brush {
                Brush::Solid(color) => fill_pass(path, transform, *color, width, height)?,
                Brush::LinearGradient { stops } => {
                    let coverage =
                        fill_pass(path, transform, Rgba::rgba(1.0, 1.0, 1.0, 1.0), width, height)?;
                    let span = transform.transform_rect_bbox(path.bounding_box());
                    gradient_over_coverage(&coverage, stops, span, width, height)
                }
            };
            blend_over_in_place(dst, &scratch, (alpha * op_alpha) as f32, *blend)
        }
        DrawOp::Stroke {
            path,
            align,
            width: stroke_width,
            color,
            alpha: op_alpha,
            blend,
        } => {
            let scale = scale_factor(transform);
            let scratch = stroke_pass(
                path,
                transform,
                *align,
                *stroke_width * scale,
                *color,
                width,
                height,
            )?;
            blend_over_in_place(dst, &scratch, (alpha * op_alpha) as f32, *blend)
        }
        DrawOp::DropShadow { path, shadow } => {
            let offset = transform * Affine::translate(shadow.offset);
            let silhouette = fill_pass(path, offset, shadow.color, width, height)?;
            let blurred = blur_shadow(
                &silhouette,
                width,
                height,
                shadow.blur * scale_factor(transform),
            )?;
            blend_over_in_place(dst, &blurred, (alpha * shadow.alpha) as f32, BlendMode::Normal)
        }
        DrawOp::InnerShadow { path, shadow } => {
            let coverage =
                fill_pass(path, transform, Rgba::rgba(1.0, 1.0, 1.0, 1.0), width, height)?;
            let offset = transform * Affine::translate(shadow.offset);
            let inverse = inverse_fill_pass(path, offset, shadow.color, width, height)?;
            let mut blurred = blur_shadow(
                &inverse,
                width,
                height,
                shadow.blur * scale_factor(transform),
            )?;
            mask_by_coverage(&mut blurred, &coverage);
            blend_over_in_place(dst, &blurred, (alpha * shadow.alpha) as f32, BlendMode::Normal)
        }
        DrawOp::Text {
            frame,
            spec,
            brush,
            shadow,
            alpha: op_alpha,
        } => render_text_op(
            frame, spec, brush, shadow, transform, alpha * op_alpha, dst, width, height, text,
        ),
    }
}

/// Geometric mean of the axis scales, used to carry point-valued widths and
/// blurs into device pixels.
fn scale_factor(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt().max(f64::MIN_POSITIVE)
}

fn new_context(width: u32, height: u32) -> VeneerResult<vello_cpu::RenderContext> {
    let (w, h) = surface_dims(width, height)?;
    Ok(vello_cpu::RenderContext::new(w, h))
}

fn finish_context(
    mut ctx: vello_cpu::RenderContext,
    width: u32,
    height: u32,
) -> VeneerResult<Vec<u8>> {
    let (w, h) = surface_dims(width, height)?;
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap.data_as_u8_slice().to_vec())
}

fn fill_pass(
    path: &kurbo::BezPath,
    transform: Affine,
    color: Rgba,
    width: u32,
    height: u32,
) -> VeneerResult<Vec<u8>> {
    let mut ctx = new_context(width, height)?;
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(color_to_cpu(color));
    ctx.fill_path(&bezpath_to_cpu(path));
    finish_context(ctx, width, height)
}

/// Fill everything except the path's interior (even-odd against a rect that
/// covers the whole surface with margin).
fn inverse_fill_pass(
    path: &kurbo::BezPath,
    transform: Affine,
    color: Rgba,
    width: u32,
    height: u32,
) -> VeneerResult<Vec<u8>> {
    let device_bounds = Rect::new(-1.0, -1.0, width as f64 + 1.0, height as f64 + 1.0);
    let local_bounds = transform.inverse().transform_rect_bbox(device_bounds);

    let mut inverse = kurbo::BezPath::new();
    inverse.move_to((local_bounds.x0, local_bounds.y0));
    inverse.line_to((local_bounds.x1, local_bounds.y0));
    inverse.line_to((local_bounds.x1, local_bounds.y1));
    inverse.line_to((local_bounds.x0, local_bounds.y1));
    inverse.close_path();
    inverse.extend(path.iter());

    let mut ctx = new_context(width, height)?;
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_fill_rule(vello_cpu::peniko::Fill::EvenOdd);
    ctx.set_paint(color_to_cpu(color));
    ctx.fill_path(&bezpath_to_cpu(&inverse));
    finish_context(ctx, width, height)
}

fn stroke_pass(
    path: &kurbo::BezPath,
    transform: Affine,
    align: crate::program::StrokeAlign,
    device_width: f64,
    color: Rgba,
    width: u32,
    height: u32,
) -> VeneerResult<Vec<u8>> {
    let mut ctx = new_context(width, height)?;
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(color_to_cpu(color));
    let cpu_path = bezpath_to_cpu(path);
    // Width is already in device pixels; undo the transform's scale so the
    // stroked width comes out right under set_transform.
    let local_width = device_width / scale_factor(transform);
    let bounds = path.bounding_box();
    stroke_path_aligned(
        &mut ctx,
        &cpu_path,
        align,
        local_width,
        rect_to_cpu(bounds),
    )?;
    finish_context(ctx, width, height)
}

/// Replace coverage-weighted pixels with gradient colors: each destination
/// pixel takes the ramp color for its row, scaled by the coverage alpha.
fn gradient_over_coverage(
    coverage: &[u8],
    stops: &[(f64, Rgba)],
    span: Rect,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let span_h = (span.height().round().max(1.0)) as u32;
    let ramp = gradient_ramp(stops, span_h);
    let mut out = vec![0u8; coverage.len()];

    for y in 0..height {
        let rel = y as f64 - span.y0;
        let idx = rel.clamp(0.0, (span_h - 1) as f64) as usize;
        let row = ramp[idx.min(ramp.len() - 1)];
        for x in 0..width {
            let i = ((y * width + x) as usize) * 4;
            let cov = coverage[i + 3] as u16;
            if cov == 0 {
                continue;
            }
            for c in 0..4 {
                out[i + c] = ((u16::from(row[c]) * cov + 127) / 255) as u8;
            }
        }
    }
    out
}

/// Multiply `src` by the alpha channel of `mask`, in place.
fn mask_by_coverage(src: &mut [u8], mask: &[u8]) {
    for (s, m) in src.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let a = u16::from(m[3]);
        if a == 255 {
            continue;
        }
        for c in s.iter_mut() {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_text_op(
    frame: &Rect,
    spec: &TextSpec,
    brush: &Brush,
    shadow: &Option<ShadowSpec>,
    transform: Affine,
    alpha: f64,
    dst: &mut [u8],
    width: u32,
    height: u32,
    text: &mut TextEngine,
) -> VeneerResult<()> {
    let label = text.layout_label(spec, frame.width())?;

    let layout_h = f64::from(label.layout.height());
    let dy = match spec.align.vertical {
        VAlign::Top => 0.0,
        VAlign::Middle => ((frame.height() - layout_h) / 2.0).max(0.0),
        VAlign::Bottom => (frame.height() - layout_h).max(0.0),
    };
    let glyph_transform = transform * Affine::translate((0.0, dy));

    let glyph_pass = |color: Rgba, t: Affine| -> VeneerResult<Vec<u8>> {
        let mut ctx = new_context(width, height)?;
        ctx.set_transform(affine_to_cpu(t));
        ctx.set_paint(color_to_cpu(color));
        for line in label.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&label.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        finish_context(ctx, width, height)
    };

    if let Some(shadow) = shadow {
        let t = glyph_transform * Affine::translate(shadow.offset);
        let silhouette = glyph_pass(shadow.color, t)?;
        let blurred = blur_shadow(
            &silhouette,
            width,
            height,
            shadow.blur * scale_factor(transform),
        )?;
        blend_over_in_place(dst, &blurred, (alpha * shadow.alpha) as f32, BlendMode::Normal)?;
    }

    let scratch = match brush {
        Brush::Solid(color) => glyph_pass(*color, glyph_transform)?,
        Brush::LinearGradient { stops } => {
            let coverage = glyph_pass(Rgba::rgba(1.0, 1.0, 1.0, 1.0), glyph_transform)?;
            let span = transform.transform_rect_bbox(*frame);
            gradient_over_coverage(&coverage, stops, span, width, height)
        }
    };
    blend_over_in_place(dst, &scratch, alpha as f32, BlendMode::Normal)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn color_to_cpu(c: Rgba) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use serde_json::json;

    fn render_desc(desc: serde_json::Value, w: u32, h: u32) -> RasterImage {
        let out = compile(&desc).unwrap();
        let mut text = TextEngine::new();
        render(&out.unit, w, h, &mut text).unwrap()
    }

    fn px(img: &RasterImage, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * img.width + x) as usize) * 4;
        img.rgba8_premul[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn solid_rectangle_fills_its_frame() {
        let img = render_desc(
            json!({
                "type": "rectangle",
                "origin": {"x": 0, "y": 0},
                "size": {"width": 8, "height": 8},
                "color": "#FF0000"
            }),
            8,
            8,
        );
        let center = px(&img, 4, 4);
        assert_eq!(center[3], 255);
        assert!(center[0] > 200);
        assert_eq!(center[1], 0);
    }

    #[test]
    fn container_children_render_at_their_origins() {
        let img = render_desc(
            json!({
                "type": "rectangle",
                "is-container": true,
                "origin": {"x": 0, "y": 0},
                "size": {"width": 16, "height": 16},
                "subviews": [
                    {"type": "rectangle", "origin": {"x": 0, "y": 0},
                     "size": {"width": 4, "height": 4}, "color": "#FF0000"},
                    {"type": "rectangle", "origin": {"x": 12, "y": 12},
                     "size": {"width": 4, "height": 4}, "color": "#00FF00"}
                ]
            }),
            16,
            16,
        );
        assert!(px(&img, 2, 2)[0] > 200);
        assert!(px(&img, 14, 14)[1] > 200);
        // Middle stays empty.
        assert_eq!(px(&img, 8, 8)[3], 0);
    }

    #[test]
    fn gradient_fill_runs_light_to_dark_down_the_shape() {
        let img = render_desc(
            json!({
                "type": "rectangle",
                "origin": {"x": 0, "y": 0},
                "size": {"width": 8, "height": 32},
                "gradient-fill": {
                    "gradient-colors": ["#FFFFFF", "#000000"],
                    "gradient-positions": [0.0, 1.0]
                }
            }),
            8,
            32,
        );
        let top = px(&img, 4, 1);
        let bottom = px(&img, 4, 30);
        assert!(top[0] > 200, "top row should be near white, got {top:?}");
        assert!(bottom[0] < 60, "bottom row should be near black, got {bottom:?}");
        assert_eq!(top[3], 255);
        assert_eq!(bottom[3], 255);
    }

    #[test]
    fn node_alpha_scales_composited_output() {
        let img = render_desc(
            json!({
                "type": "rectangle",
                "origin": {"x": 0, "y": 0},
                "size": {"width": 4, "height": 4},
                "alpha": 0.5,
                "color": "#FFFFFF"
            }),
            4,
            4,
        );
        let c = px(&img, 2, 2);
        assert!((c[3] as i32 - 128).abs() <= 2, "alpha was {}", c[3]);
    }

    #[test]
    fn drop_shadow_paints_outside_the_shape() {
        let img = render_desc(
            json!({
                "type": "rectangle",
                "origin": {"x": 0, "y": 0},
                "size": {"width": 16, "height": 16},
                "is-container": true,
                "subviews": [{
                    "type": "rectangle",
                    "origin": {"x": 4, "y": 4},
                    "size": {"width": 6, "height": 6},
                    "color": "#FFF",
                    "drop-shadow": {"offset": {"x": 3, "y": 3}, "blur": 1}
                }]
            }),
            16,
            16,
        );
        // Below-right of the shape the shadow shows through.
        assert!(px(&img, 11, 11)[3] > 0);
        // Far corner stays clear.
        assert_eq!(px(&img, 0, 15)[3], 0);
    }

    #[test]
    fn nine_slice_keeps_corners_and_stretches_middle() {
        // 4x4 source with distinct corner pixels, insets of 1 on every side.
        let mut bytes = vec![0u8; 4 * 4 * 4];
        let set = |b: &mut Vec<u8>, x: u32, y: u32, v: [u8; 4]| {
            let i = ((y * 4 + x) as usize) * 4;
            b[i..i + 4].copy_from_slice(&v);
        };
        set(&mut bytes, 0, 0, [255, 0, 0, 255]);
        set(&mut bytes, 3, 0, [0, 255, 0, 255]);
        set(&mut bytes, 0, 3, [0, 0, 255, 255]);
        set(&mut bytes, 3, 3, [255, 255, 0, 255]);
        let src = RasterImage {
            width: 4,
            height: 4,
            rgba8_premul: bytes,
        };

        let edges = Insets {
            top: 1.0,
            left: 1.0,
            bottom: 1.0,
            right: 1.0,
        };
        let out = nine_slice(&src, edges, 8, 8);
        assert_eq!(px(&out, 0, 0), [255, 0, 0, 255]);
        assert_eq!(px(&out, 7, 0), [0, 255, 0, 255]);
        assert_eq!(px(&out, 0, 7), [0, 0, 255, 255]);
        assert_eq!(px(&out, 7, 7), [255, 255, 0, 255]);
    }

    #[test]
    fn zero_size_raster_is_rejected() {
        let out = compile(&json!({
            "type": "rectangle",
            "origin": {"x": 0, "y": 0},
            "size": {"width": 4, "height": 4},
            "color": "#FFF"
        }))
        .unwrap();
        let mut text = TextEngine::new();
        assert!(render(&out.unit, 0, 4, &mut text).is_err());
    }

    #[test]
    fn straight_rgba_round_trips_premultiplication() {
        let img = RasterImage {
            width: 1,
            height: 1,
            rgba8_premul: vec![128, 64, 0, 128],
        };
        let straight = img.to_straight_rgba();
        assert_eq!(straight[3], 128);
        assert!((straight[0] as i32 - 255).abs() <= 1);
        assert!((straight[1] as i32 - 128).abs() <= 2);
    }
}
