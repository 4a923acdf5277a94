#![forbid(unsafe_code)]

//! `veneer` compiles declarative JSON view-tree descriptions (shapes, labels,
//! buttons, nested containers) into backend-agnostic drawing programs and
//! rasterizes them to RGBA images, with a three-tier cache in front of
//! parsing, compilation and rasterization.

pub mod blur;
pub mod cache;
pub mod color;
pub mod compile;
pub mod composite;
pub mod effects;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod model;
pub mod program;
pub mod raster;
pub mod text;

pub use cache::{CacheConfig, Template};
pub use color::{Rgba, parse_web_color};
pub use compile::{CompileOutput, Diagnostic, compile};
pub use engine::{Checkout, Engine, EngineConfig};
pub use error::{VeneerError, VeneerResult};
pub use fingerprint::Fingerprint;
pub use model::{BlendMode, ContentAlign, CornerRadii, Insets, NodeKind};
pub use program::{BindingsMap, Brush, ButtonState, DrawOp, RenderableUnit};
pub use raster::RasterImage;
