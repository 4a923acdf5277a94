//! The three cache tiers: parsed documents, compiled templates, rasterized
//! images. Each tier is an LRU map behind its own mutex.
//!
//! Tier 2 additionally coalesces concurrent compilations of the same
//! description: the first requester for a fingerprint compiles outside the
//! map lock and publishes into a per-key slot; late arrivals block on the
//! slot instead of recompiling. Fingerprints are verified against the full
//! source on every hit, so a hash collision degrades to an uncached compile
//! rather than a wrong template.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};

use tracing::{debug, error};

use crate::{
    compile::{CompileOutput, Diagnostic},
    error::{VeneerError, VeneerResult},
    fingerprint::Fingerprint,
    program::{BindingsMap, RenderableUnit},
    raster::RasterImage,
};

/// Compiled template stored in tier 2. The source value rides along for
/// full-content verification on hit.
#[derive(Clone, Debug)]
pub struct Template {
    pub unit: RenderableUnit,
    pub bindings: BindingsMap,
    pub diagnostics: Vec<Diagnostic>,
    pub source: serde_json::Value,
}

impl Template {
    fn new(out: CompileOutput, source: serde_json::Value) -> Self {
        Self {
            unit: out.unit,
            bindings: out.bindings,
            diagnostics: out.diagnostics,
            source,
        }
    }
}

/// Bounded LRU map. A capacity of zero disables storage entirely.
struct Lru<K: Eq + Hash + Clone, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> Lru<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.map.get(key)
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.map.insert(key.clone(), value).is_none() {
            self.order.push_back(key.clone());
        } else {
            self.touch(&key);
        }
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// One in-flight compilation; waiters block on the slot's condvar.
/// Errors are carried as messages so every waiter can receive one.
struct InflightSlot {
    done: Mutex<Option<Result<Arc<Template>, String>>>,
    cv: Condvar,
}

struct TemplateTier {
    lru: Lru<Fingerprint, Arc<Template>>,
    inflight: HashMap<Fingerprint, Arc<InflightSlot>>,
    generation: u64,
}

/// Tier-3 entry. As in tier 2, the source rides along so a hit can be
/// verified by full content comparison, not fingerprint equality alone.
struct ImageEntry {
    source: Arc<serde_json::Value>,
    image: Arc<RasterImage>,
}

/// Per-tier capacities. Zero disables a tier.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    pub document_capacity: usize,
    pub template_capacity: usize,
    pub image_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            document_capacity: 64,
            template_capacity: 256,
            image_capacity: 128,
        }
    }
}

pub struct CacheLayer {
    documents: Mutex<Lru<String, Arc<serde_json::Value>>>,
    templates: Mutex<TemplateTier>,
    images: Mutex<Lru<(Fingerprint, u32, u32), ImageEntry>>,
}

impl CacheLayer {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            documents: Mutex::new(Lru::new(config.document_capacity)),
            templates: Mutex::new(TemplateTier {
                lru: Lru::new(config.template_capacity),
                inflight: HashMap::new(),
                generation: 0,
            }),
            images: Mutex::new(Lru::new(config.image_capacity)),
        }
    }

    // Tier 1.

    pub fn insert_document(&self, key: impl Into<String>, value: Arc<serde_json::Value>) {
        self.documents.lock().unwrap().insert(key.into(), value);
    }

    pub fn document(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.documents.lock().unwrap().get(&key.to_string()).cloned()
    }

    // Tier 2.

    /// Resolve a compiled template for `value`, compiling at most once per
    /// fingerprint no matter how many threads arrive at the same time.
    pub fn template_for<F>(
        &self,
        value: &serde_json::Value,
        compile_fn: F,
    ) -> VeneerResult<Arc<Template>>
    where
        F: FnOnce() -> VeneerResult<CompileOutput>,
    {
        let fp = Fingerprint::of(value);

        let (slot, generation) = {
            let mut tier = self.templates.lock().unwrap();
            if let Some(t) = tier.lru.get(&fp) {
                if t.source == *value {
                    debug!(%fp, "template cache hit");
                    return Ok(t.clone());
                }
                // Structural hash collision: never serve the wrong template.
                error!(%fp, "fingerprint collision between distinct descriptions");
                debug_assert!(false, "fingerprint collision for {fp}");
                drop(tier);
                let out = compile_fn()?;
                return Ok(Arc::new(Template::new(out, value.clone())));
            }

            if let Some(slot) = tier.inflight.get(&fp) {
                let slot = slot.clone();
                drop(tier);
                let mut done = slot.done.lock().unwrap();
                while done.is_none() {
                    done = slot.cv.wait(done).unwrap();
                }
                return match done.as_ref().unwrap() {
                    Ok(t) => {
                        debug!(%fp, "template resolved by concurrent compile");
                        Ok(t.clone())
                    }
                    Err(msg) => Err(VeneerError::validation(msg.clone())),
                };
            }

            let slot = Arc::new(InflightSlot {
                done: Mutex::new(None),
                cv: Condvar::new(),
            });
            tier.inflight.insert(fp, slot.clone());
            (slot, tier.generation)
        };

        debug!(%fp, "template cache miss, compiling");
        let result = compile_fn().map(|out| Arc::new(Template::new(out, value.clone())));

        {
            let mut tier = self.templates.lock().unwrap();
            tier.inflight.remove(&fp);
            if let Ok(template) = &result {
                // A flush during compilation bumped the generation; the
                // result still satisfies waiters but is not re-cached.
                if tier.generation == generation {
                    tier.lru.insert(fp, template.clone());
                }
            }
        }

        let published = match &result {
            Ok(t) => Ok(t.clone()),
            Err(e) => Err(e.to_string()),
        };
        *slot.done.lock().unwrap() = Some(published);
        slot.cv.notify_all();

        result
    }

    pub fn template_count(&self) -> usize {
        self.templates.lock().unwrap().lru.len()
    }

    // Tier 3.

    pub fn image(
        &self,
        fp: Fingerprint,
        width: u32,
        height: u32,
        source: &serde_json::Value,
    ) -> Option<Arc<RasterImage>> {
        let mut images = self.images.lock().unwrap();
        let entry = images.get(&(fp, width, height))?;
        if *entry.source != *source {
            // Structural hash collision: never serve the wrong image.
            error!(%fp, "fingerprint collision between distinct descriptions");
            return None;
        }
        Some(entry.image.clone())
    }

    pub fn insert_image(
        &self,
        fp: Fingerprint,
        width: u32,
        height: u32,
        source: Arc<serde_json::Value>,
        image: Arc<RasterImage>,
    ) {
        self.images
            .lock()
            .unwrap()
            .insert((fp, width, height), ImageEntry { source, image });
    }

    /// Drop every tier immediately. In-flight compilations still complete
    /// into their slots so waiters succeed, but are not re-inserted.
    pub fn flush(&self) {
        self.documents.lock().unwrap().clear();
        {
            let mut tier = self.templates.lock().unwrap();
            tier.lru.clear();
            tier.generation += 1;
        }
        self.images.lock().unwrap().clear();
        debug!("caches flushed");
    }
}
