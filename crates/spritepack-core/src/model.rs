use crate::config::{Pivot, TextureConfig, Trim};
use crate::geometry::{PointF, Rect, Size};
use image::RgbaImage;
use std::ops::Range;
use std::sync::Arc;

/// A decoded source image plus where it came from.
#[derive(Debug)]
pub struct SourceImage {
    /// Directory component, as given in the input description.
    pub path: String,
    /// Filename component.
    pub filename: String,
    pub image: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> i32 {
        self.image.width() as i32
    }
    pub fn height(&self) -> i32 {
        self.image.height() as i32
    }
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }
}

/// One source-image region and its metadata, placed in exactly one output
/// texture.
///
/// Input fields are set by the parser; `trimmed_source_rect` and the divisor
/// margins by the preparer; `trimmed_rect`, `rotated` and `texture_index` by
/// the packer; `rect` and the pivot points by the finalizer. After that the
/// sprite is read-only.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub index: i32,
    /// May be empty; diagnostics fall back to a generated id.
    pub id: String,
    pub source: Arc<SourceImage>,
    pub source_rect: Rect,
    pub texture: Arc<TextureConfig>,

    pub trim: Trim,
    pub trim_threshold: u8,
    pub trim_margin: i32,
    /// Packed width/height must be multiples of these; `>= 1`.
    pub common_divisor: Size,
    /// Pixels of edge replication around the packed region.
    pub extrude: i32,
    pub pivot: Pivot,
    pub pivot_point: PointF,
    pub integral_pivot_point: bool,
    /// Ordered `(key, value)` pairs; values may be empty.
    pub tags: Vec<(String, String)>,
    /// Optional convex or concave outline, sprite-local coordinates.
    pub vertices: Vec<PointF>,

    pub trimmed_source_rect: Rect,
    pub common_divisor_margin: Size,
    pub common_divisor_offset: Size,
    pub trimmed_rect: Rect,
    pub rect: Rect,
    pub rotated: bool,
    /// 0-based sheet ordinal within the sprite's texture family.
    pub texture_index: usize,
    pub trimmed_pivot_point: PointF,
}

impl Sprite {
    pub fn new(index: i32, source: Arc<SourceImage>, texture: Arc<TextureConfig>) -> Sprite {
        let source_rect = source.bounds();
        Sprite {
            index,
            id: String::new(),
            source,
            source_rect,
            texture,
            trim: Trim::default(),
            trim_threshold: 0,
            trim_margin: 0,
            common_divisor: Size { x: 1, y: 1 },
            extrude: 0,
            pivot: Pivot::default(),
            pivot_point: PointF::default(),
            integral_pivot_point: false,
            tags: Vec::new(),
            vertices: Vec::new(),
            trimmed_source_rect: Rect::default(),
            common_divisor_margin: Size::default(),
            common_divisor_offset: Size::default(),
            trimmed_rect: Rect::default(),
            rect: Rect::default(),
            rotated: false,
            texture_index: 0,
            trimmed_pivot_point: PointF::default(),
        }
    }

    /// Stable identifier for diagnostics: the id, or `sprite_<index>`.
    pub fn id_or_default(&self) -> String {
        if self.id.is_empty() {
            format!("sprite_{}", self.index)
        } else {
            self.id.clone()
        }
    }
}

/// One concrete output sheet: final dimensions plus a view over the packed
/// sprites it contains.
///
/// The view is a range into the sprite container the pipeline was handed;
/// it must not outlive that container and never copies sprite data.
#[derive(Debug, Clone)]
pub struct PackedTexture {
    pub path: String,
    pub filename: String,
    pub width: i32,
    pub height: i32,
    pub sprite_range: Range<usize>,
    pub alpha: crate::config::Alpha,
    pub colorkey: Option<[u8; 4]>,
}

impl PackedTexture {
    /// The sprites placed on this sheet.
    pub fn sprites<'a>(&self, all: &'a [Sprite]) -> &'a [Sprite] {
        &all[self.sprite_range.clone()]
    }
}
