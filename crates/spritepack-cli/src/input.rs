//! The input description: a YAML/JSON document naming source sheets, the
//! sprites on them and the textures they pack into.

use anyhow::{bail, Context};
use image::ImageReader;
use serde::Deserialize;
use spritepack_core::{
    find_islands, used_bounds, FilenameSequence, Pivot, PivotX, PivotY, PointF, Rect, Size,
    SourceImage, Sprite, TextureConfig, Trim,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Texture settings; any field left out falls back to the document-level
/// defaults, then to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TextureSpec {
    pub filename: Option<String>,
    pub path: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub border_padding: Option<i32>,
    pub shape_padding: Option<i32>,
    /// Shorthand setting both border and shape padding.
    pub padding: Option<i32>,
    pub power_of_two: Option<bool>,
    pub allow_rotate: Option<bool>,
    pub deduplicate: Option<bool>,
    pub alpha: Option<String>,
    pub colorkey: Option<[u8; 4]>,
}

impl TextureSpec {
    fn merge(&self, defaults: &TextureSpec) -> TextureSpec {
        macro_rules! pick {
            ($field:ident) => {
                self.$field.clone().or_else(|| defaults.$field.clone())
            };
        }
        TextureSpec {
            filename: pick!(filename),
            path: pick!(path),
            width: pick!(width),
            height: pick!(height),
            max_width: pick!(max_width),
            max_height: pick!(max_height),
            border_padding: pick!(border_padding),
            shape_padding: pick!(shape_padding),
            padding: pick!(padding),
            power_of_two: pick!(power_of_two),
            allow_rotate: pick!(allow_rotate),
            deduplicate: pick!(deduplicate),
            alpha: pick!(alpha),
            colorkey: pick!(colorkey),
        }
    }

    fn into_config(self) -> anyhow::Result<TextureConfig> {
        let defaults = TextureConfig::default();
        let filename = match &self.filename {
            Some(pattern) => FilenameSequence::parse(pattern)
                .with_context(|| format!("invalid filename sequence '{pattern}'"))?,
            None => defaults.filename.clone(),
        };
        let alpha = match &self.alpha {
            Some(name) => name
                .parse()
                .ok()
                .with_context(|| format!("unknown alpha mode '{name}'"))?,
            None => defaults.alpha,
        };
        Ok(TextureConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            max_width: self.max_width.unwrap_or(defaults.max_width),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            border_padding: self
                .border_padding
                .or(self.padding)
                .unwrap_or(defaults.border_padding),
            shape_padding: self
                .shape_padding
                .or(self.padding)
                .unwrap_or(defaults.shape_padding),
            power_of_two: self.power_of_two.unwrap_or(defaults.power_of_two),
            allow_rotate: self.allow_rotate.unwrap_or(defaults.allow_rotate),
            deduplicate: self.deduplicate.unwrap_or(defaults.deduplicate),
            alpha,
            colorkey: self.colorkey,
            filename,
            path: self.path.unwrap_or(defaults.path),
        })
    }
}

/// One pivot axis: a named anchor or a custom coordinate.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PivotValue {
    Named(String),
    Coord(f32),
}

/// Either a single divisor for both axes or one per axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DivisorSpec {
    Uniform(i32),
    PerAxis([i32; 2]),
}

/// Sprite settings, also usable as sheet-level defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpriteSettings {
    pub trim: Option<String>,
    pub trim_threshold: Option<u8>,
    pub trim_margin: Option<i32>,
    pub common_divisor: Option<DivisorSpec>,
    pub extrude: Option<i32>,
    pub pivot: Option<[PivotValue; 2]>,
    pub integral_pivot: Option<bool>,
    /// `"key"` or `"key=value"` entries, in order.
    pub tags: Option<Vec<String>>,
}

impl SpriteSettings {
    fn merge(&self, defaults: &SpriteSettings) -> SpriteSettings {
        SpriteSettings {
            trim: self.trim.clone().or_else(|| defaults.trim.clone()),
            trim_threshold: self.trim_threshold.or(defaults.trim_threshold),
            trim_margin: self.trim_margin.or(defaults.trim_margin),
            common_divisor: self
                .common_divisor
                .clone()
                .or_else(|| defaults.common_divisor.clone()),
            extrude: self.extrude.or(defaults.extrude),
            pivot: self.pivot.clone().or_else(|| defaults.pivot.clone()),
            integral_pivot: self.integral_pivot.or(defaults.integral_pivot),
            tags: self.tags.clone().or_else(|| defaults.tags.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpriteSpec {
    pub id: Option<String>,
    /// Source region `[x, y, w, h]`; defaults to the next grid cell, or the
    /// whole sheet.
    pub rect: Option<[i32; 4]>,
    pub vertices: Option<Vec<[f32; 2]>>,
    #[serde(flatten)]
    pub settings: SpriteSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SheetSpec {
    /// Source image path, relative to the description file.
    pub input: String,
    /// Filename of the texture family this sheet packs into; defaults to
    /// the first (or implicit) texture.
    pub texture: Option<String>,
    /// Cell size for grid-aligned sheets.
    pub grid: Option<[i32; 2]>,
    #[serde(flatten)]
    pub defaults: SpriteSettings,
    #[serde(default)]
    pub sprites: Vec<SpriteSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputDoc {
    /// Document-level texture defaults.
    #[serde(flatten)]
    pub texture_defaults: TextureSpec,
    #[serde(default)]
    pub textures: Vec<TextureSpec>,
    #[serde(default)]
    pub sheets: Vec<SheetSpec>,
}

fn parse_pivot(spec: &Option<[PivotValue; 2]>) -> anyhow::Result<(Pivot, PointF)> {
    let mut pivot = Pivot::default();
    let mut point = PointF::default();
    let Some([px, py]) = spec else {
        return Ok((pivot, point));
    };
    match px {
        PivotValue::Named(name) => {
            pivot.x = name
                .parse()
                .ok()
                .with_context(|| format!("unknown pivot anchor '{name}'"))?;
        }
        PivotValue::Coord(x) => {
            pivot.x = PivotX::Custom;
            point.x = *x;
        }
    }
    match py {
        PivotValue::Named(name) => {
            pivot.y = name
                .parse()
                .ok()
                .with_context(|| format!("unknown pivot anchor '{name}'"))?;
        }
        PivotValue::Coord(y) => {
            pivot.y = PivotY::Custom;
            point.y = *y;
        }
    }
    Ok((pivot, point))
}

fn parse_tags(spec: &Option<Vec<String>>) -> Vec<(String, String)> {
    spec.iter()
        .flatten()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (entry.clone(), String::new()),
        })
        .collect()
}

fn apply_settings(sprite: &mut Sprite, settings: &SpriteSettings) -> anyhow::Result<()> {
    if let Some(mode) = &settings.trim {
        sprite.trim = mode
            .parse::<Trim>()
            .ok()
            .with_context(|| format!("unknown trim mode '{mode}'"))?;
    }
    if let Some(threshold) = settings.trim_threshold {
        sprite.trim_threshold = threshold;
    }
    if let Some(margin) = settings.trim_margin {
        sprite.trim_margin = margin;
    }
    if let Some(divisor) = &settings.common_divisor {
        let (x, y) = match divisor {
            DivisorSpec::Uniform(d) => (*d, *d),
            DivisorSpec::PerAxis([x, y]) => (*x, *y),
        };
        if x < 1 || y < 1 {
            bail!("common-divisor must be at least 1");
        }
        sprite.common_divisor = Size { x, y };
    }
    if let Some(extrude) = settings.extrude {
        sprite.extrude = extrude;
    }
    let (pivot, point) = parse_pivot(&settings.pivot)?;
    if settings.pivot.is_some() {
        sprite.pivot = pivot;
        sprite.pivot_point = point;
    }
    if let Some(integral) = settings.integral_pivot {
        sprite.integral_pivot_point = integral;
    }
    if settings.tags.is_some() {
        sprite.tags = parse_tags(&settings.tags);
    }
    Ok(())
}

fn grid_cells(source: &SourceImage, cell: [i32; 2]) -> Vec<Rect> {
    let mut cells = Vec::new();
    let [cw, ch] = cell;
    if cw <= 0 || ch <= 0 {
        return cells;
    }
    let mut y = 0;
    while y + ch <= source.height() {
        let mut x = 0;
        while x + cw <= source.width() {
            cells.push(Rect::new(x, y, cw, ch));
            x += cw;
        }
        y += ch;
    }
    cells
}

/// Builds the sprite list for one sheet entry.
fn build_sheet_sprites(
    sheet: &SheetSpec,
    source: Arc<SourceImage>,
    texture: Arc<TextureConfig>,
    next_index: &mut i32,
    autocomplete: bool,
) -> anyhow::Result<Vec<Sprite>> {
    let mut sprites = Vec::new();
    let new_sprite = |rect: Rect,
                          spec: Option<&SpriteSpec>,
                          next_index: &mut i32|
     -> anyhow::Result<Sprite> {
        let mut sprite = Sprite::new(*next_index, source.clone(), texture.clone());
        *next_index += 1;
        sprite.source_rect = rect;
        let settings = match spec {
            Some(spec) => spec.settings.merge(&sheet.defaults),
            None => sheet.defaults.clone(),
        };
        apply_settings(&mut sprite, &settings)?;
        if let Some(spec) = spec {
            if let Some(id) = &spec.id {
                sprite.id = id.clone();
            }
            if let Some(vertices) = &spec.vertices {
                sprite.vertices = vertices
                    .iter()
                    .map(|&[x, y]| PointF { x, y })
                    .collect();
            }
        }
        Ok(sprite)
    };

    if !sheet.sprites.is_empty() {
        let cells = sheet.grid.map(|cell| grid_cells(&source, cell));
        for (ordinal, spec) in sheet.sprites.iter().enumerate() {
            let rect = match (spec.rect, &cells) {
                (Some([x, y, w, h]), _) => Rect::new(x, y, w, h),
                (None, Some(cells)) => *cells.get(ordinal).with_context(|| {
                    format!("sheet '{}': sprite {} has no grid cell", sheet.input, ordinal)
                })?,
                (None, None) => source.bounds(),
            };
            if !source.bounds().contains_rect(&rect) {
                bail!(
                    "sheet '{}': sprite rect {:?} exceeds the image bounds",
                    sheet.input,
                    rect
                );
            }
            sprites.push(new_sprite(rect, Some(spec), next_index)?);
        }
        return Ok(sprites);
    }

    if autocomplete {
        let rects = match sheet.grid {
            Some(cell) => grid_cells(&source, cell)
                .into_iter()
                .filter(|cell| !used_bounds(&source.image, *cell, 0).is_empty())
                .collect(),
            None => find_islands(&source.image, source.bounds(), 0),
        };
        debug!(sheet = %sheet.input, sprites = rects.len(), "autocompleted");
        for rect in rects {
            sprites.push(new_sprite(rect, None, next_index)?);
        }
        return Ok(sprites);
    }

    // no sprite list and no autocompletion: the whole sheet is one sprite
    sprites.push(new_sprite(source.bounds(), None, next_index)?);
    Ok(sprites)
}

/// Parses a description document and loads every referenced image.
/// Returns the sprite list, ready for packing.
pub fn build_sprites(
    doc: &InputDoc,
    base_dir: &Path,
    autocomplete: bool,
) -> anyhow::Result<Vec<Sprite>> {
    let mut textures: Vec<Arc<TextureConfig>> = Vec::new();
    for spec in &doc.textures {
        let merged = spec.merge(&doc.texture_defaults);
        textures.push(Arc::new(merged.into_config()?));
    }
    if textures.is_empty() {
        textures.push(Arc::new(doc.texture_defaults.clone().into_config()?));
    }

    let find_texture = |name: &Option<String>| -> anyhow::Result<Arc<TextureConfig>> {
        match name {
            None => Ok(textures[0].clone()),
            Some(name) => textures
                .iter()
                .find(|t| t.filename.to_string() == *name || t.filename.first_filename() == *name)
                .cloned()
                .with_context(|| format!("unknown texture '{name}'")),
        }
    };

    let mut sprites = Vec::new();
    let mut next_index = 0;
    for sheet in &doc.sheets {
        let path = base_dir.join(&sheet.input);
        let image = ImageReader::open(&path)
            .with_context(|| format!("open {}", path.display()))?
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("decode {}", path.display()))?
            .to_rgba8();
        let source = Arc::new(SourceImage {
            path: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filename: path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| sheet.input.clone()),
            image,
        });
        let texture = find_texture(&sheet.texture)?;
        sprites.extend(build_sheet_sprites(
            sheet,
            source,
            texture,
            &mut next_index,
            autocomplete,
        )?);
    }
    Ok(sprites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_parses_with_defaults_and_overrides() {
        let doc: InputDoc = serde_yaml::from_str(
            r#"
            max-width: 128
            deduplicate: true
            textures:
              - filename: "atlas{0-9}.png"
                padding: 2
            sheets:
              - input: Items.png
                grid: [16, 16]
                trim: none
                sprites:
                  - id: sword
                  - id: shield
                    pivot: [center, middle]
                    tags: ["weapon", "tier=2"]
            "#,
        )
        .unwrap();
        assert_eq!(doc.texture_defaults.max_width, Some(128));
        assert_eq!(doc.textures.len(), 1);
        assert_eq!(doc.sheets.len(), 1);
        assert_eq!(doc.sheets[0].sprites.len(), 2);

        let merged = doc.textures[0].merge(&doc.texture_defaults);
        let config = merged.into_config().unwrap();
        assert_eq!(config.max_width, 128);
        assert!(config.deduplicate);
        // the padding shorthand sets both paddings
        assert_eq!(config.border_padding, 2);
        assert_eq!(config.shape_padding, 2);
        assert_eq!(config.filename.count(), 10);
    }

    #[test]
    fn explicit_paddings_beat_the_shorthand() {
        let spec = TextureSpec {
            padding: Some(4),
            border_padding: Some(1),
            ..Default::default()
        };
        let config = spec.into_config().unwrap();
        assert_eq!(config.border_padding, 1);
        assert_eq!(config.shape_padding, 4);
    }

    #[test]
    fn tags_split_on_equals() {
        let tags = parse_tags(&Some(vec!["anim".into(), "frame=3".into()]));
        assert_eq!(
            tags,
            vec![
                ("anim".to_string(), String::new()),
                ("frame".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn pivots_parse_named_and_custom() {
        let (pivot, _) = parse_pivot(&Some([
            PivotValue::Named("center".into()),
            PivotValue::Named("bottom".into()),
        ]))
        .unwrap();
        assert_eq!(pivot.x, PivotX::Center);
        assert_eq!(pivot.y, PivotY::Bottom);

        let (pivot, point) = parse_pivot(&Some([
            PivotValue::Coord(3.5),
            PivotValue::Named("top".into()),
        ]))
        .unwrap();
        assert_eq!(pivot.x, PivotX::Custom);
        assert_eq!(point.x, 3.5);
        assert_eq!(pivot.y, PivotY::Top);

        assert!(parse_pivot(&Some([
            PivotValue::Named("sideways".into()),
            PivotValue::Named("top".into()),
        ]))
        .is_err());
    }

    #[test]
    fn grid_cells_cover_whole_rows() {
        let source = SourceImage {
            path: String::new(),
            filename: "grid.png".into(),
            image: image::RgbaImage::new(40, 20),
        };
        let cells = grid_cells(&source, [16, 16]);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0], Rect::new(0, 0, 16, 16));
        assert_eq!(cells[1], Rect::new(16, 0, 16, 16));
    }
}
