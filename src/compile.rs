//! Recursive descent from a JSON description to a [`RenderableUnit`].
//!
//! Failure policy: a problem inside a node aborts only that node's subtree.
//! The parent records a diagnostic naming the node path and keeps compiling
//! the remaining siblings. Only a failure of the root node is an error at
//! the `compile` entry point.

use kurbo::{BezPath, Rect, Shape, Vec2};
use tracing::{debug, warn};

use crate::{
    color::Rgba,
    error::{VeneerError, VeneerResult},
    geometry::{balance_corner_radii, ellipse_path, rounded_rect_path},
    model::{GradientOptions, NodeDesc, NodeKind, ShadowOptions, StrokeOptions},
    program::{
        BindingsMap, Brush, ButtonFaces, DrawOp, RenderableUnit, ShadowSpec, StrokeAlign, TextSpec,
    },
};

/// One recoverable compile problem, scoped to the subtree at `path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable node path, e.g. `root/subviews[1]/subviews[0]`.
    pub path: String,
    pub message: String,
}

/// Result of compiling one description.
#[derive(Clone, Debug, Default)]
pub struct CompileOutput {
    pub unit: RenderableUnit,
    pub bindings: BindingsMap,
    pub diagnostics: Vec<Diagnostic>,
}

/// Hook for compiling nested sub-descriptions (button state views) through
/// an outer cache instead of inline.
pub trait StateResolver {
    fn compile_state(&mut self, value: &serde_json::Value) -> VeneerResult<CompileOutput>;
}

/// Compile without an outer cache: states compile inline.
pub fn compile(value: &serde_json::Value) -> VeneerResult<CompileOutput> {
    NodeCompiler::new(None).compile_root(value)
}

/// Compile with button state views resolved through `resolver`.
pub fn compile_with_resolver(
    value: &serde_json::Value,
    resolver: &mut dyn StateResolver,
) -> VeneerResult<CompileOutput> {
    NodeCompiler::new(Some(resolver)).compile_root(value)
}

struct NodeCompiler<'a> {
    resolver: Option<&'a mut dyn StateResolver>,
    bindings: BindingsMap,
    diagnostics: Vec<Diagnostic>,
    index_path: Vec<usize>,
}

impl<'a> NodeCompiler<'a> {
    fn new(resolver: Option<&'a mut dyn StateResolver>) -> Self {
        Self {
            resolver,
            bindings: BindingsMap::new(),
            diagnostics: Vec::new(),
            index_path: Vec::new(),
        }
    }

    fn compile_root(mut self, value: &serde_json::Value) -> VeneerResult<CompileOutput> {
        let unit = self.compile_node(value)?;
        debug!(
            children = unit.children.len(),
            ops = unit.ops.len(),
            diagnostics = self.diagnostics.len(),
            "compiled description"
        );
        Ok(CompileOutput {
            unit,
            bindings: self.bindings,
            diagnostics: self.diagnostics,
        })
    }

    fn path_string(&self) -> String {
        let mut s = String::from("root");
        for idx in &self.index_path {
            s.push_str(&format!("/subviews[{idx}]"));
        }
        s
    }

    fn diagnose(&mut self, message: String) {
        let path = self.path_string();
        warn!(%path, %message, "dropping description subtree");
        self.diagnostics.push(Diagnostic { path, message });
    }

    fn compile_node(&mut self, value: &serde_json::Value) -> VeneerResult<RenderableUnit> {
        let desc = NodeDesc::from_value(value)?;
        let kind = desc.kind()?;

        // The container flag only applies to rectangles; on any other kind it
        // is ignored and the node compiles with its normal semantics.
        let container = desc.is_container && matches!(kind, NodeKind::Rectangle);
        if desc.is_container && !container {
            self.diagnose("is-container is only valid on rectangle nodes; ignored".to_string());
        }

        let mut unit = RenderableUnit {
            title: desc.title.clone(),
            frame: desc.frame(container)?,
            alpha: desc.alpha,
            ..Default::default()
        };

        if let Some(name) = &desc.bind_to {
            self.bindings.insert(name.clone(), self.index_path.clone());
        }

        if container {
            if desc.has_drawing_options() {
                self.diagnose("container node carries drawing options; ignored".to_string());
            }
        } else {
            match kind {
                NodeKind::Rectangle => {
                    let path = self.rectangle_path(&desc, unit.frame)?;
                    self.shape_ops(&desc, path, &mut unit)?;
                }
                NodeKind::Ellipse => {
                    let local = unit.frame.with_origin((0.0, 0.0));
                    self.shape_ops(&desc, ellipse_path(local), &mut unit)?;
                }
                NodeKind::Path => {
                    let path = parse_path_description(&desc)?;
                    self.shape_ops(&desc, path, &mut unit)?;
                }
                NodeKind::Label => {
                    self.label_ops(&desc, &mut unit)?;
                }
                NodeKind::Button => {
                    unit.button = Some(self.button_faces(&desc)?);
                }
            }
        }

        for (idx, sub) in desc.subviews.iter().enumerate() {
            self.index_path.push(idx);
            match self.compile_node(sub) {
                Ok(child) => unit.children.push(child),
                Err(e) => self.diagnose(e.to_string()),
            }
            self.index_path.pop();
        }

        Ok(unit)
    }

    fn rectangle_path(&self, desc: &NodeDesc, frame: Rect) -> VeneerResult<BezPath> {
        let local = frame.with_origin((0.0, 0.0));
        match desc.corner_radius {
            Some(radii) => {
                let mut radii = radii.0;
                balance_corner_radii(&mut radii, local.size());
                Ok(rounded_rect_path(radii, local))
            }
            None => Ok(local.to_path(1e-3)),
        }
    }

    /// Emit the fixed effect order for a filled shape:
    /// drop-shadow, base fill, gradient fill, inner shadow, outer stroke,
    /// inner stroke.
    fn shape_ops(
        &mut self,
        desc: &NodeDesc,
        path: BezPath,
        unit: &mut RenderableUnit,
    ) -> VeneerResult<()> {
        if let Some(opts) = &desc.drop_shadow {
            unit.ops.push(DrawOp::DropShadow {
                path: path.clone(),
                shadow: shadow_spec(opts)?,
            });
        }

        if let Some(color) = desc.color {
            unit.ops.push(DrawOp::Fill {
                path: path.clone(),
                brush: Brush::Solid(color),
                alpha: 1.0,
                blend: Default::default(),
            });
        }

        if let Some(opts) = &desc.gradient_fill {
            opts.validate()?;
            unit.ops.push(DrawOp::Fill {
                path: path.clone(),
                brush: gradient_brush(opts),
                alpha: opts.alpha.unwrap_or(1.0),
                blend: opts.blend_mode.unwrap_or_default(),
            });
        }

        if let Some(opts) = &desc.inner_shadow {
            unit.ops.push(DrawOp::InnerShadow {
                path: path.clone(),
                shadow: shadow_spec(opts)?,
            });
        }

        if let Some(opts) = &desc.outer_stroke {
            unit.ops.push(stroke_op(opts, path.clone(), StrokeAlign::Outer)?);
        }

        if let Some(opts) = &desc.inner_stroke {
            unit.ops.push(stroke_op(opts, path, StrokeAlign::Inner)?);
        }

        Ok(())
    }

    fn label_ops(&mut self, desc: &NodeDesc, unit: &mut RenderableUnit) -> VeneerResult<()> {
        let content = desc
            .content_string
            .clone()
            .ok_or_else(|| VeneerError::missing_option("label content-string"))?;

        let brush = match &desc.content_gradient_fill {
            Some(opts) => {
                opts.validate()?;
                gradient_brush(opts)
            }
            None => Brush::Solid(desc.content_color.unwrap_or(Rgba::BLACK)),
        };

        let shadow = match &desc.content_shadow {
            Some(opts) => Some(shadow_spec(opts)?),
            None => None,
        };

        unit.ops.push(DrawOp::Text {
            frame: unit.frame.with_origin((0.0, 0.0)),
            spec: TextSpec {
                content,
                font_name: desc.font_name.clone(),
                font_size: desc.font_size.unwrap_or(12.0),
                font_weight: desc.font_weight.unwrap_or_default(),
                align: desc.content_align.unwrap_or_default(),
            },
            brush,
            shadow,
            alpha: 1.0,
        });
        Ok(())
    }

    fn button_faces(&mut self, desc: &NodeDesc) -> VeneerResult<ButtonFaces> {
        let mut faces = ButtonFaces {
            stretchable_edges: desc.stretchable_edges,
            content_insets: desc.content_insets,
            content_image_insets: desc.content_image_insets,
            ..Default::default()
        };

        let states = [
            ("normal-state", &desc.normal_state),
            ("highlighted-state", &desc.highlighted_state),
            ("selected-state", &desc.selected_state),
            ("highlighted-selected-state", &desc.highlighted_selected_state),
            ("disabled-state", &desc.disabled_state),
            ("content-image", &desc.content_image),
        ];

        for (key, value) in states {
            let Some(value) = value else { continue };
            match self.compile_sub_description(value) {
                Ok(unit) => {
                    let boxed = Some(Box::new(unit));
                    match key {
                        "normal-state" => faces.normal = boxed,
                        "highlighted-state" => faces.highlighted = boxed,
                        "selected-state" => faces.selected = boxed,
                        "highlighted-selected-state" => faces.highlighted_selected = boxed,
                        "disabled-state" => faces.disabled = boxed,
                        "content-image" => faces.content_image = boxed,
                        _ => unreachable!(),
                    }
                }
                Err(e) => self.diagnose(format!("{key}: {e}")),
            }
        }

        Ok(faces)
    }

    /// A button state view is a complete description of its own; it goes
    /// through the resolver so repeated states share compiled templates.
    fn compile_sub_description(
        &mut self,
        value: &serde_json::Value,
    ) -> VeneerResult<RenderableUnit> {
        match self.resolver.as_deref_mut() {
            Some(resolver) => {
                let out = resolver.compile_state(value)?;
                let prefix = self.path_string();
                self.diagnostics.extend(out.diagnostics.into_iter().map(|d| Diagnostic {
                    path: format!("{prefix}/{}", d.path),
                    message: d.message,
                }));
                Ok(out.unit)
            }
            None => {
                let out = compile(value)?;
                let prefix = self.path_string();
                self.diagnostics.extend(out.diagnostics.into_iter().map(|d| Diagnostic {
                    path: format!("{prefix}/{}", d.path),
                    message: d.message,
                }));
                Ok(out.unit)
            }
        }
    }
}

fn parse_path_description(desc: &NodeDesc) -> VeneerResult<BezPath> {
    let d = desc
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if d.is_empty() {
        return Err(VeneerError::missing_geometry(
            "path node needs a non-empty 'description'",
        ));
    }
    BezPath::from_svg(d)
        .map_err(|e| VeneerError::validation(format!("invalid path description: {e}")))
}

fn shadow_spec(opts: &ShadowOptions) -> VeneerResult<ShadowSpec> {
    let offset = opts.required_offset()?;
    Ok(ShadowSpec {
        offset: Vec2::from(offset),
        blur: opts.blur.unwrap_or(0.0).max(0.0),
        color: opts.color.unwrap_or(Rgba::BLACK),
        alpha: opts.alpha.unwrap_or(1.0).clamp(0.0, 1.0),
    })
}

fn stroke_op(opts: &StrokeOptions, path: BezPath, align: StrokeAlign) -> VeneerResult<DrawOp> {
    Ok(DrawOp::Stroke {
        path,
        align,
        width: opts.required_width()?,
        color: opts.color.unwrap_or(Rgba::BLACK),
        alpha: opts.alpha.unwrap_or(1.0).clamp(0.0, 1.0),
        blend: opts.blend_mode.unwrap_or_default(),
    })
}

fn gradient_brush(opts: &GradientOptions) -> Brush {
    Brush::LinearGradient {
        stops: opts.stops().collect(),
    }
}
