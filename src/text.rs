//! Label shaping and layout via Parley.
//!
//! Fonts are registered from caller-provided bytes; a label names a family
//! with `font-name` or falls back to the first registered family. The layout
//! carries positioned glyph runs that the rasterizer paints with the op's
//! brush, so the brush type stored in the layout itself is inert.

use crate::{
    error::{VeneerError, VeneerResult},
    model::{ContentAlign, HAlign},
    program::TextSpec,
};

/// Placeholder brush for Parley styling; paint comes from the draw op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

struct RegisteredFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Positioned glyph layout for one label, plus the font to draw it with.
pub struct LabelLayout {
    pub layout: parley::Layout<TextBrushRgba8>,
    pub font: vello_cpu::peniko::FontData,
}

/// Stateful shaping engine wrapping Parley's font and layout contexts.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    fonts: Vec<RegisteredFont>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: Vec::new(),
        }
    }

    /// Register a font from raw bytes; returns the primary family name.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> VeneerResult<String> {
        let blob = parley::fontique::Blob::from(font_bytes.clone());
        let families = self.font_ctx.collection.register_fonts(blob, None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| VeneerError::validation("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VeneerError::validation("registered font family has no name"))?
            .to_string();

        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        self.fonts.push(RegisteredFont {
            family: family.clone(),
            data,
        });
        Ok(family)
    }

    /// Shape and lay out a label inside a frame of `max_width` points.
    pub fn layout_label(&mut self, spec: &TextSpec, max_width: f64) -> VeneerResult<LabelLayout> {
        let size = spec.font_size;
        if !size.is_finite() || size <= 0.0 {
            return Err(VeneerError::validation("font-size must be finite and > 0"));
        }

        let font = match &spec.font_name {
            Some(name) => self
                .fonts
                .iter()
                .find(|f| f.family.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    VeneerError::validation(format!("font family \"{name}\" is not registered"))
                })?,
            None => self
                .fonts
                .first()
                .ok_or_else(|| VeneerError::validation("no fonts registered"))?,
        };
        let family = font.family.clone();
        let font_data = font.data.clone();

        let mut builder =
            self.layout_ctx
                .ranged_builder(&mut self.font_ctx, &spec.content, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size as f32));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(spec.font_weight.0),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(
            TextBrushRgba8::default(),
        ));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(&spec.content);
        layout.break_all_lines(Some(max_width as f32));
        layout.align(
            Some(max_width as f32),
            horizontal_alignment(spec.align),
            parley::AlignmentOptions::default(),
        );

        Ok(LabelLayout {
            layout,
            font: font_data,
        })
    }
}

fn horizontal_alignment(align: ContentAlign) -> parley::Alignment {
    match align.horizontal {
        HAlign::Left => parley::Alignment::Start,
        HAlign::Center => parley::Alignment::Center,
        HAlign::Right => parley::Alignment::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontWeight;

    fn spec(content: &str, size: f64) -> TextSpec {
        TextSpec {
            content: content.to_string(),
            font_name: None,
            font_size: size,
            font_weight: FontWeight::default(),
            align: ContentAlign::default(),
        }
    }

    #[test]
    fn layout_without_registered_fonts_is_an_error() {
        let mut engine = TextEngine::new();
        assert!(engine.layout_label(&spec("hello", 14.0), 100.0).is_err());
    }

    #[test]
    fn nonpositive_font_size_is_rejected() {
        let mut engine = TextEngine::new();
        assert!(engine.layout_label(&spec("hello", 0.0), 100.0).is_err());
        assert!(engine.layout_label(&spec("hello", f64::NAN), 100.0).is_err());
    }

    #[test]
    fn garbage_font_bytes_register_nothing() {
        let mut engine = TextEngine::new();
        assert!(engine.register_font(vec![0u8; 16]).is_err());
    }

    #[test]
    fn halign_maps_onto_parley_alignment() {
        let mut a = ContentAlign::default();
        a.horizontal = HAlign::Left;
        assert!(matches!(horizontal_alignment(a), parley::Alignment::Start));
        a.horizontal = HAlign::Center;
        assert!(matches!(horizontal_alignment(a), parley::Alignment::Center));
        a.horizontal = HAlign::Right;
        assert!(matches!(horizontal_alignment(a), parley::Alignment::End));
    }

    #[test]
    fn unknown_family_name_is_an_error() {
        let mut engine = TextEngine::new();
        let mut s = spec("hi", 12.0);
        s.font_name = Some("NoSuchFamily".to_string());
        assert!(engine.layout_label(&s, 50.0).is_err());
    }
}
