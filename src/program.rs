//! The compiled drawing program.
//!
//! Compilation turns a description subtree into a [`RenderableUnit`]: an
//! ordered list of backend-agnostic [`DrawOp`]s plus child units layered on
//! top. The rasterizer interprets the program against a pixel surface; the
//! program itself never touches a rendering backend, which is what makes it
//! cacheable and cheaply cloneable for checkouts.

use std::collections::BTreeMap;

use kurbo::{BezPath, Rect, Vec2};

use crate::{
    color::Rgba,
    model::{BlendMode, ContentAlign, FontWeight, Insets},
};

/// Binding name to child-index path into the unit tree.
///
/// A path of `[2, 0]` names the first child of the third child of the root.
/// Paths are valid for the lifetime of the checkout they came with.
pub type BindingsMap = BTreeMap<String, Vec<usize>>;

/// Paint source for fills, strokes and glyphs.
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    Solid(Rgba),
    /// Vertical linear gradient across the op's bounds; stops are
    /// `(position, color)` with positions non-decreasing in [0,1].
    LinearGradient { stops: Vec<(f64, Rgba)> },
}

/// Which side of the path outline a stroke occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeAlign {
    Inner,
    Outer,
}

/// Shadow parameters shared by drop, inner and text shadows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSpec {
    pub offset: Vec2,
    pub blur: f64,
    pub color: Rgba,
    pub alpha: f64,
}

/// Text run parameters for a label op.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpec {
    pub content: String,
    pub font_name: Option<String>,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub align: ContentAlign,
}

/// One drawing step. Ops execute in order; each op composites onto the
/// accumulated result with its own alpha and blend mode.
#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Blurred offset silhouette of `path`, painted behind the shape.
    DropShadow { path: BezPath, shadow: ShadowSpec },
    Fill {
        path: BezPath,
        brush: Brush,
        alpha: f64,
        blend: BlendMode,
    },
    /// Blurred inverted silhouette clipped to the shape interior.
    InnerShadow { path: BezPath, shadow: ShadowSpec },
    Stroke {
        path: BezPath,
        align: StrokeAlign,
        width: f64,
        color: Rgba,
        alpha: f64,
        blend: BlendMode,
    },
    Text {
        frame: Rect,
        spec: TextSpec,
        brush: Brush,
        shadow: Option<ShadowSpec>,
        alpha: f64,
    },
}

/// Per-state faces of a button node. Each face is a full compiled unit;
/// missing states simply have no face. The highlighted-selected state falls
/// back to highlighted at lookup time.
#[derive(Clone, Debug, Default)]
pub struct ButtonFaces {
    pub normal: Option<Box<RenderableUnit>>,
    pub highlighted: Option<Box<RenderableUnit>>,
    pub selected: Option<Box<RenderableUnit>>,
    pub highlighted_selected: Option<Box<RenderableUnit>>,
    pub disabled: Option<Box<RenderableUnit>>,
    pub stretchable_edges: Option<Insets>,
    pub content_image: Option<Box<RenderableUnit>>,
    pub content_insets: Option<Insets>,
    pub content_image_insets: Option<Insets>,
}

/// Button interaction states addressable on a compiled button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Normal,
    Highlighted,
    Selected,
    HighlightedSelected,
    Disabled,
}

impl ButtonFaces {
    /// Face for a state, with the highlighted-selected fallback.
    pub fn face(&self, state: ButtonState) -> Option<&RenderableUnit> {
        let slot = match state {
            ButtonState::Normal => &self.normal,
            ButtonState::Highlighted => &self.highlighted,
            ButtonState::Selected => &self.selected,
            ButtonState::HighlightedSelected => {
                if self.highlighted_selected.is_some() {
                    &self.highlighted_selected
                } else {
                    &self.highlighted
                }
            }
            ButtonState::Disabled => &self.disabled,
        };
        slot.as_deref()
    }
}

/// A compiled node: its frame in parent coordinates, its own draw ops, and
/// child units layered on top in description order.
#[derive(Clone, Debug, Default)]
pub struct RenderableUnit {
    pub title: Option<String>,
    pub frame: Rect,
    pub alpha: Option<f64>,
    pub ops: Vec<DrawOp>,
    pub children: Vec<RenderableUnit>,
    pub button: Option<ButtonFaces>,
}

impl RenderableUnit {
    /// The size the unit was authored at.
    pub fn natural_size(&self) -> kurbo::Size {
        self.frame.size()
    }

    /// Resolve a binding path produced at compile time.
    pub fn at_path(&self, path: &[usize]) -> Option<&RenderableUnit> {
        let mut unit = self;
        for &idx in path {
            unit = unit.children.get(idx)?;
        }
        Some(unit)
    }

    /// Mutable binding resolution, for callers restyling a checkout.
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut RenderableUnit> {
        let mut unit = self;
        for &idx in path {
            unit = unit.children.get_mut(idx)?;
        }
        Some(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> RenderableUnit {
        RenderableUnit {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn binding_paths_walk_child_indices() {
        let mut root = titled("root");
        let mut mid = titled("mid");
        mid.children.push(titled("leaf"));
        root.children.push(titled("first"));
        root.children.push(mid);

        assert_eq!(root.at_path(&[]).unwrap().title.as_deref(), Some("root"));
        assert_eq!(
            root.at_path(&[1, 0]).unwrap().title.as_deref(),
            Some("leaf")
        );
        assert!(root.at_path(&[2]).is_none());
        assert!(root.at_path(&[1, 0, 0]).is_none());
    }

    #[test]
    fn highlighted_selected_falls_back_to_highlighted() {
        let mut faces = ButtonFaces {
            highlighted: Some(Box::new(titled("hl"))),
            ..Default::default()
        };
        assert_eq!(
            faces
                .face(ButtonState::HighlightedSelected)
                .unwrap()
                .title
                .as_deref(),
            Some("hl")
        );

        faces.highlighted_selected = Some(Box::new(titled("hlsel")));
        assert_eq!(
            faces
                .face(ButtonState::HighlightedSelected)
                .unwrap()
                .title
                .as_deref(),
            Some("hlsel")
        );
        assert!(faces.face(ButtonState::Disabled).is_none());
    }
}
