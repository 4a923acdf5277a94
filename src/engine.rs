//! The render driver: one engine instance owns the cache tiers and the text
//! engine. There is no global state; embedders construct as many engines as
//! they need and drop them freely.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{
    cache::{CacheConfig, CacheLayer, Template},
    compile::{self, CompileOutput, Diagnostic, StateResolver},
    error::{VeneerError, VeneerResult},
    fingerprint::Fingerprint,
    program::{BindingsMap, RenderableUnit},
    raster::{self, RasterImage},
    text::TextEngine,
};

/// Engine construction parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
}

/// Caller-owned deep copy of a compiled template.
///
/// Mutating a checkout never affects the cache or other callers; binding
/// paths stay valid for as long as the checkout is alive.
#[derive(Clone, Debug)]
pub struct Checkout {
    pub unit: RenderableUnit,
    pub bindings: BindingsMap,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Engine {
    cache: CacheLayer,
    text: Mutex<TextEngine>,
}

/// Routes button state sub-descriptions through tier 2, so two buttons
/// sharing a state description share one compiled template.
struct CachingStateResolver<'a> {
    engine: &'a Engine,
}

impl StateResolver for CachingStateResolver<'_> {
    fn compile_state(&mut self, value: &serde_json::Value) -> VeneerResult<CompileOutput> {
        let template = self.engine.template_for(value)?;
        Ok(CompileOutput {
            unit: template.unit.clone(),
            bindings: template.bindings.clone(),
            diagnostics: template.diagnostics.clone(),
        })
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: CacheLayer::new(config.cache),
            text: Mutex::new(TextEngine::new()),
        }
    }

    /// Register a font for label shaping; returns the family name.
    pub fn register_font(&self, font_bytes: Vec<u8>) -> VeneerResult<String> {
        self.text.lock().unwrap().register_font(font_bytes)
    }

    /// Tier 1: store a parsed description tree under a source key.
    pub fn insert_document(&self, key: impl Into<String>, value: serde_json::Value) {
        self.cache.insert_document(key, Arc::new(value));
    }

    /// Parse and store a JSON source string under a key.
    pub fn insert_document_source(&self, key: impl Into<String>, source: &str) -> VeneerResult<()> {
        let value: serde_json::Value = serde_json::from_str(source)
            .map_err(|e| VeneerError::validation(format!("description is not valid JSON: {e}")))?;
        self.insert_document(key, value);
        Ok(())
    }

    pub fn document(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.cache.document(key)
    }

    /// Tier 2: resolve (or compile) the shared template for a description.
    pub fn template_for(&self, value: &serde_json::Value) -> VeneerResult<Arc<Template>> {
        self.cache.template_for(value, || {
            let mut resolver = CachingStateResolver { engine: self };
            compile::compile_with_resolver(value, &mut resolver)
        })
    }

    /// Compile-and-clone: the returned checkout is the caller's to mutate.
    pub fn checkout(&self, value: &serde_json::Value) -> VeneerResult<Checkout> {
        let template = self.template_for(value)?;
        Ok(Checkout {
            unit: template.unit.clone(),
            bindings: template.bindings.clone(),
            diagnostics: template.diagnostics.clone(),
        })
    }

    /// Tier 3: rasterize a description at a pixel size, caching the result
    /// under (structural fingerprint, size).
    pub fn render_image(
        &self,
        value: &serde_json::Value,
        width: u32,
        height: u32,
    ) -> VeneerResult<Arc<RasterImage>> {
        let fp = Fingerprint::of(value);
        if let Some(image) = self.cache.image(fp, width, height, value) {
            debug!(%fp, width, height, "image cache hit");
            return Ok(image);
        }

        let template = self.template_for(value)?;
        let image = {
            let mut text = self.text.lock().unwrap();
            Arc::new(raster::render(&template.unit, width, height, &mut text)?)
        };
        self.cache
            .insert_image(fp, width, height, Arc::new(value.clone()), image.clone());
        Ok(image)
    }

    /// Tier 1 to 2 to 3 chain from a stored source key.
    pub fn render_image_for_source(
        &self,
        key: &str,
        width: u32,
        height: u32,
    ) -> VeneerResult<Arc<RasterImage>> {
        let value = self
            .cache
            .document(key)
            .ok_or_else(|| VeneerError::validation(format!("no document under key \"{key}\"")))?;
        self.render_image(&value, width, height)
    }

    /// Drop all cached state; appropriate for host memory-pressure hooks.
    pub fn flush(&self) {
        self.cache.flush();
    }
}
