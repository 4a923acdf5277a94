use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::{Arc, BezPath, Point, Rect, Shape, Size, Vec2};

/// Bounding box of a shape's drop shadow: the rect grows by `blur` on every
/// side and the origin additionally moves by the shadow offset.
pub fn shadow_bounds(rect: Rect, offset: Vec2, blur: f64) -> Rect {
    Rect::from_origin_size(
        Point::new(rect.x0 + offset.x - blur, rect.y0 + offset.y - blur),
        Size::new(rect.width() + 2.0 * blur, rect.height() + 2.0 * blur),
    )
}

/// Bounding box of a stroke that extends `width` past the shape's logical
/// bounds on every side. Used as the invalidation/redraw rect.
pub fn stroke_bounds(rect: Rect, width: f64) -> Rect {
    Rect::from_origin_size(
        Point::new(rect.x0 - width, rect.y0 - width),
        Size::new(rect.width() + 2.0 * width, rect.height() + 2.0 * width),
    )
}

/// Clamp each corner radius against the target size.
///
/// Radii are in clockwise order starting at the top-right:
/// `[top-right, bottom-right, bottom-left, top-left]`. Each is limited to
/// `floor(width/2)` and `floor(height/2)`; oversized values are clamped,
/// never rejected.
pub fn balance_corner_radii(radii: &mut [f64; 4], size: Size) {
    let half_width = (size.width / 2.0).floor();
    let half_height = (size.height / 2.0).floor();
    for r in radii.iter_mut() {
        *r = r.clamp(0.0, half_width.min(half_height));
    }
}

/// Build a closed clockwise rounded-rectangle path for 4 independent radii.
///
/// The path starts on the top edge just right of the top-left corner and
/// proceeds clockwise in screen coordinates (Y down): top edge, top-right
/// arc, right edge, bottom-right arc, bottom edge, bottom-left arc, left
/// edge, top-left arc, close. Callers are expected to have balanced the
/// radii against the rect first.
pub fn rounded_rect_path(radii: [f64; 4], rect: Rect) -> BezPath {
    let [tr, br, bl, tl] = radii;
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);

    let mut path = BezPath::new();
    path.move_to((x0 + tl, y0));

    path.line_to((x1 - tr, y0));
    append_corner_arc(&mut path, Point::new(x1 - tr, y0 + tr), tr, -FRAC_PI_2);

    path.line_to((x1, y1 - br));
    append_corner_arc(&mut path, Point::new(x1 - br, y1 - br), br, 0.0);

    path.line_to((x0 + bl, y1));
    append_corner_arc(&mut path, Point::new(x0 + bl, y1 - bl), bl, FRAC_PI_2);

    path.line_to((x0, y0 + tl));
    append_corner_arc(&mut path, Point::new(x0 + tl, y0 + tl), tl, PI);

    path.close_path();
    path
}

/// Ellipse inscribed in `rect`, as a bezier path.
pub fn ellipse_path(rect: Rect) -> BezPath {
    kurbo::Ellipse::from_rect(rect).to_path(1e-3)
}

fn append_corner_arc(path: &mut BezPath, center: Point, radius: f64, start_angle: f64) {
    if radius <= 0.0 {
        return;
    }
    let arc = Arc::new(
        center,
        Vec2::new(radius, radius),
        start_angle,
        FRAC_PI_2,
        0.0,
    );
    for el in arc.append_iter(1e-3) {
        path.push(el);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_bounds_contains_rect_for_nonnegative_blur() {
        let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
        for &(ox, oy, blur) in &[(0.0, 0.0, 0.0), (3.0, -2.0, 4.0), (-5.0, 5.0, 6.0)] {
            let sb = shadow_bounds(rect, Vec2::new(ox, oy), blur);
            assert_eq!(sb.width(), rect.width() + 2.0 * blur);
            assert_eq!(sb.height(), rect.height() + 2.0 * blur);
            assert_eq!(sb.x0, rect.x0 + ox - blur);
            assert_eq!(sb.y0, rect.y0 + oy - blur);
            // The union of the shape rect and its shadow rect never exceeds
            // the shadow rect translated back over the shape plus blur.
            if ox.abs() <= blur && oy.abs() <= blur {
                assert!(sb.union(rect) == sb);
            }
        }
    }

    #[test]
    fn stroke_bounds_grows_symmetrically() {
        let rect = Rect::new(0.0, 0.0, 40.0, 30.0);
        let sb = stroke_bounds(rect, 2.5);
        assert_eq!(sb.x0, -2.5);
        assert_eq!(sb.y0, -2.5);
        assert_eq!(sb.width(), 45.0);
        assert_eq!(sb.height(), 35.0);
    }

    #[test]
    fn radii_clamp_to_half_of_min_side() {
        let mut radii = [60.0, 10.0, 0.0, 100.0];
        balance_corner_radii(&mut radii, Size::new(100.0, 50.0));
        assert_eq!(radii, [25.0, 10.0, 0.0, 25.0]);
    }

    #[test]
    fn valid_radii_are_unchanged() {
        let mut radii = [5.0, 6.0, 7.0, 8.0];
        balance_corner_radii(&mut radii, Size::new(100.0, 50.0));
        assert_eq!(radii, [5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn radii_clamping_uses_floor_of_half_sides() {
        let mut radii = [50.0; 4];
        balance_corner_radii(&mut radii, Size::new(31.0, 99.0));
        assert_eq!(radii, [15.0; 4]);
    }

    #[test]
    fn rounded_path_is_closed_and_stays_inside_rect() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let path = rounded_rect_path([25.0; 4], rect);
        let bbox = path.bounding_box();
        assert!(bbox.x0 >= rect.x0 - 1e-6 && bbox.x1 <= rect.x1 + 1e-6);
        assert!(bbox.y0 >= rect.y0 - 1e-6 && bbox.y1 <= rect.y1 + 1e-6);
        assert!(matches!(
            path.elements().last(),
            Some(kurbo::PathEl::ClosePath)
        ));
    }

    #[test]
    fn zero_radii_degrade_to_plain_rect() {
        let rect = Rect::new(0.0, 0.0, 20.0, 10.0);
        let path = rounded_rect_path([0.0; 4], rect);
        // Only move/line/close, no curves.
        assert!(
            path.elements()
                .iter()
                .all(|el| !matches!(el, kurbo::PathEl::CurveTo(..)))
        );
        assert_eq!(path.bounding_box(), rect);
    }
}
