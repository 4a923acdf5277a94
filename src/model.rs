use serde::Deserialize;

use crate::{
    color::Rgba,
    error::{VeneerError, VeneerResult},
};

/// Node type tags recognized in a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Rectangle,
    Ellipse,
    Path,
    Label,
    Button,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> VeneerResult<Self> {
        match tag {
            "rectangle" => Ok(Self::Rectangle),
            "ellipse" => Ok(Self::Ellipse),
            "path" => Ok(Self::Path),
            "label" => Ok(Self::Label),
            "button" => Ok(Self::Button),
            other => Err(VeneerError::unknown_type(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Vec2 {
    fn from(p: Point) -> Self {
        kurbo::Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl From<Extent> for kurbo::Size {
    fn from(s: Extent) -> Self {
        kurbo::Size::new(s.width, s.height)
    }
}

/// Blend modes supported by effect bundles.
///
/// Unrecognized mode strings fall back to `Normal`, matching the engine this
/// vocabulary comes from; a blend mode is a presentation hint, not a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Overlay,
    Multiply,
    SoftLight,
}

impl<'de> Deserialize<'de> for BlendMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "overlay" => Self::Overlay,
            "multiply" => Self::Multiply,
            "softlight" => Self::SoftLight,
            _ => Self::Normal,
        })
    }
}

/// Corner radii in clockwise order starting top-right.
///
/// Deserializes from a scalar (all corners) or a 1-4 element array; arrays
/// shorter than 4 cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRadii(pub [f64; 4]);

impl<'de> Deserialize<'de> for CornerRadii {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Scalar(f64),
            List(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Scalar(r) => Ok(Self([r; 4])),
            Repr::List(v) => {
                if v.is_empty() || v.len() > 4 {
                    return Err(serde::de::Error::custom(
                        "corner-radius array must have 1-4 values",
                    ));
                }
                Ok(Self(std::array::from_fn(|i| v[i % v.len()])))
            }
        }
    }
}

/// Edge insets, `[top, left, bottom, right]` or a single value for all sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl<'de> Deserialize<'de> for Insets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Scalar(f64),
            List(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Scalar(v) => Ok(Self {
                top: v,
                left: v,
                bottom: v,
                right: v,
            }),
            Repr::List(v) if v.len() == 4 => Ok(Self {
                top: v[0],
                left: v[1],
                bottom: v[2],
                right: v[3],
            }),
            Repr::List(_) => Err(serde::de::Error::custom(
                "insets must be a single value or a 4-value array",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Label alignment, parsed from a string of whitespace-separated tokens
/// such as `"center"`, `"left top"` or `"right bottom"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentAlign {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl<'de> Deserialize<'de> for ContentAlign {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut out = Self::default();
        for token in s.split_whitespace() {
            match token {
                "left" => out.horizontal = HAlign::Left,
                "center" => out.horizontal = HAlign::Center,
                "right" => out.horizontal = HAlign::Right,
                "top" => out.vertical = VAlign::Top,
                "middle" => out.vertical = VAlign::Middle,
                "bottom" => out.vertical = VAlign::Bottom,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown content-align token \"{other}\""
                    )));
                }
            }
        }
        Ok(out)
    }
}

/// Font weight, numeric (1-1000) or a named weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontWeight(pub f32);

impl Default for FontWeight {
    fn default() -> Self {
        Self(400.0)
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(w) => Ok(Self(w.clamp(1.0, 1000.0))),
            Repr::Name(name) => match name.as_str() {
                "light" => Ok(Self(300.0)),
                "normal" | "regular" => Ok(Self(400.0)),
                "medium" => Ok(Self(500.0)),
                "semibold" => Ok(Self(600.0)),
                "bold" => Ok(Self(700.0)),
                "heavy" | "black" => Ok(Self(900.0)),
                other => Err(serde::de::Error::custom(format!(
                    "unknown font-weight \"{other}\""
                ))),
            },
        }
    }
}

/// Stroke option bundle (`inner-stroke` / `outer-stroke`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StrokeOptions {
    pub color: Option<Rgba>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
    pub blend_mode: Option<BlendMode>,
}

impl StrokeOptions {
    /// Width is the one stroke parameter without a sensible default.
    pub fn required_width(&self) -> VeneerResult<f64> {
        self.width
            .ok_or_else(|| VeneerError::missing_option("stroke width"))
    }
}

/// Shadow option bundle (`drop-shadow` / `inner-shadow` / `content-shadow`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ShadowOptions {
    pub offset: Option<Point>,
    pub blur: Option<f64>,
    pub alpha: Option<f64>,
    pub color: Option<Rgba>,
}

impl ShadowOptions {
    pub fn required_offset(&self) -> VeneerResult<Point> {
        self.offset
            .ok_or_else(|| VeneerError::missing_option("shadow offset"))
    }
}

/// Linear gradient option bundle (`gradient-fill` / `content-gradient-fill`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GradientOptions {
    pub gradient_colors: Vec<Rgba>,
    pub gradient_positions: Vec<f64>,
    pub alpha: Option<f64>,
    pub blend_mode: Option<BlendMode>,
}

impl GradientOptions {
    /// Validate the parallel stop arrays once, at compile time.
    ///
    /// Mismatched array lengths are a hard error, as is a non-monotone or
    /// out-of-range position list.
    pub fn validate(&self) -> VeneerResult<()> {
        if self.gradient_colors.is_empty() {
            return Err(VeneerError::invalid_gradient(
                "gradient-colors must be non-empty",
            ));
        }
        if self.gradient_colors.len() != self.gradient_positions.len() {
            return Err(VeneerError::invalid_gradient(format!(
                "gradient-colors has {} entries but gradient-positions has {}",
                self.gradient_colors.len(),
                self.gradient_positions.len()
            )));
        }
        let mut prev = 0.0f64;
        for &p in &self.gradient_positions {
            if !(0.0..=1.0).contains(&p) {
                return Err(VeneerError::invalid_gradient(format!(
                    "gradient position {p} is outside [0,1]"
                )));
            }
            if p < prev {
                return Err(VeneerError::invalid_gradient(
                    "gradient-positions must be non-decreasing",
                ));
            }
            prev = p;
        }
        Ok(())
    }

    pub fn stops(&self) -> impl Iterator<Item = (f64, Rgba)> + '_ {
        self.gradient_positions
            .iter()
            .copied()
            .zip(self.gradient_colors.iter().copied())
    }
}

/// One description node, decoded from its generic JSON object.
///
/// Children (`subviews`) and button state views stay as raw JSON values so
/// that a malformed child fails on its own without poisoning its siblings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NodeDesc {
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    pub title: Option<String>,
    pub origin: Option<Point>,
    pub size: Option<Extent>,
    pub alpha: Option<f64>,
    pub color: Option<Rgba>,
    pub corner_radius: Option<CornerRadii>,
    pub inner_stroke: Option<StrokeOptions>,
    pub outer_stroke: Option<StrokeOptions>,
    pub gradient_fill: Option<GradientOptions>,
    pub drop_shadow: Option<ShadowOptions>,
    pub inner_shadow: Option<ShadowOptions>,
    pub bind_to: Option<String>,
    pub is_container: bool,
    pub subviews: Vec<serde_json::Value>,

    // Label content.
    pub content_string: Option<String>,
    pub content_color: Option<Rgba>,
    pub content_gradient_fill: Option<GradientOptions>,
    pub content_shadow: Option<ShadowOptions>,
    pub content_align: Option<ContentAlign>,
    pub font_size: Option<f64>,
    pub font_name: Option<String>,
    pub font_weight: Option<FontWeight>,

    // Path outline (SVG-style command string).
    pub description: Option<String>,

    // Button state views and layout metrics.
    pub normal_state: Option<serde_json::Value>,
    pub highlighted_state: Option<serde_json::Value>,
    pub selected_state: Option<serde_json::Value>,
    pub highlighted_selected_state: Option<serde_json::Value>,
    pub disabled_state: Option<serde_json::Value>,
    pub stretchable_edges: Option<Insets>,
    pub content_image: Option<serde_json::Value>,
    pub content_insets: Option<Insets>,
    pub content_image_insets: Option<Insets>,
}

impl NodeDesc {
    pub fn from_value(value: &serde_json::Value) -> VeneerResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| VeneerError::validation(format!("malformed description node: {e}")))
    }

    pub fn kind(&self) -> VeneerResult<NodeKind> {
        match &self.type_tag {
            Some(tag) => NodeKind::from_tag(tag),
            None => Err(VeneerError::unknown_type("(missing type key)")),
        }
    }

    /// Frame from `origin` + `size`. Both are required for drawn shapes;
    /// containers fall back to a zero origin and zero size.
    pub fn frame(&self, container: bool) -> VeneerResult<kurbo::Rect> {
        match (self.origin, self.size) {
            (Some(origin), Some(size)) => Ok(kurbo::Rect::from_origin_size(
                kurbo::Point::from(origin),
                kurbo::Size::from(size),
            )),
            (origin, size) if container => {
                let origin = origin.unwrap_or_default();
                let size = size.unwrap_or_default();
                Ok(kurbo::Rect::from_origin_size(
                    kurbo::Point::from(origin),
                    kurbo::Size::from(size),
                ))
            }
            (None, _) => Err(VeneerError::missing_geometry(format!(
                "{} node is missing 'origin'",
                self.type_tag.as_deref().unwrap_or("untyped")
            ))),
            (_, None) => Err(VeneerError::missing_geometry(format!(
                "{} node is missing 'size'",
                self.type_tag.as_deref().unwrap_or("untyped")
            ))),
        }
    }

    /// True when any shape drawing bundle is present. Containers with
    /// drawing bundles are ignored with a warning, never drawn.
    pub fn has_drawing_options(&self) -> bool {
        self.color.is_some()
            || self.corner_radius.is_some()
            || self.inner_stroke.is_some()
            || self.outer_stroke.is_some()
            || self.gradient_fill.is_some()
            || self.drop_shadow.is_some()
            || self.inner_shadow.is_some()
    }
}
