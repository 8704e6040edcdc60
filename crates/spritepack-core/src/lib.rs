//! Core library for packing sprite sheets into texture atlases.
//!
//! - Pipeline: `pack_sprites` prepares (trim + divisor alignment),
//!   deduplicates, packs (max-rects, best short side fit, multi-sheet),
//!   finalizes rects/pivots and assembles `PackedTexture`s.
//! - Compositing: `compose_texture` renders one sheet, extrusion, polygon
//!   masks and alpha post-processing included.
//! - Description: `build_description` emits the JSON document consumed by
//!   templates and tooling.
//!
//! Quick example:
//! ```ignore
//! use spritepack_core::prelude::*;
//! use std::sync::Arc;
//! # fn main() -> spritepack_core::Result<()> {
//! let source = Arc::new(SourceImage {
//!     path: String::new(),
//!     filename: "items.png".into(),
//!     image: image::open("items.png")?.to_rgba8(),
//! });
//! let texture = Arc::new(TextureConfig::default());
//! let mut sprites = vec![Sprite::new(0, source, texture)];
//! let textures = pack_sprites(&mut sprites)?;
//! for texture in &textures {
//!     let sheet = compose_texture(texture, &sprites, false);
//!     sheet.save(&texture.filename)?;
//! }
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod describe;
pub mod error;
pub mod filename_sequence;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod raster;

pub use compositing::*;
pub use config::*;
pub use describe::*;
pub use error::*;
pub use filename_sequence::*;
pub use geometry::*;
pub use model::*;
pub use pipeline::*;
pub use raster::*;

/// Convenience prelude for common types and functions.
pub mod prelude {
    pub use crate::compositing::compose_texture;
    pub use crate::config::{Alpha, Pivot, PivotX, PivotY, TextureConfig, Trim};
    pub use crate::describe::build_description;
    pub use crate::error::{Result, SpritePackError};
    pub use crate::filename_sequence::FilenameSequence;
    pub use crate::geometry::{Point, PointF, Rect, Size};
    pub use crate::model::{PackedTexture, SourceImage, Sprite};
    pub use crate::pipeline::pack_sprites;
}
