//! The packing pipeline: prepare, deduplicate, pack, finalize, assemble.
//!
//! [`pack_sprites`] drives the whole thing. Sprites are mutated in place,
//! phase by phase, and finally reordered by texture so every
//! [`PackedTexture`] can view a contiguous run of the container.

use crate::config::{PivotX, PivotY, TextureConfig, Trim};
use crate::error::{Result, SpritePackError};
use crate::geometry::{ceil_to_multiple, ceil_to_pot, floor_to_pot, Point, Rect, Size};
use crate::model::{PackedTexture, Sprite};
use crate::packer::{pack, PackParams, PackRect};
use crate::raster::{regions_identical, used_bounds};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Effective bound for one axis: `size` wins over `max_size`, zero means
/// unset, unset everything means unbounded.
fn effective_size(size: i32, max_size: i32, power_of_two: bool) -> i32 {
    let size = if power_of_two && size > 0 {
        ceil_to_pot(size)
    } else {
        size
    };
    let max_size = if power_of_two && max_size > 0 {
        floor_to_pot(max_size)
    } else {
        max_size
    };
    match (size > 0, max_size > 0) {
        (true, true) => size.min(max_size),
        (true, false) => size,
        (false, true) => max_size,
        (false, false) => i32::MAX,
    }
}

/// Full packing size of a prepared sprite: trimmed bounds plus divisor
/// margin plus extrusion on both sides.
fn sprite_size(sprite: &Sprite) -> Size {
    Size {
        x: sprite.trimmed_source_rect.w + sprite.common_divisor_margin.x + sprite.extrude * 2,
        y: sprite.trimmed_source_rect.h + sprite.common_divisor_margin.y + sprite.extrude * 2,
    }
}

/// Offset from a placement corner to the sprite's trimmed content.
fn sprite_indent(sprite: &Sprite) -> Size {
    Size {
        x: sprite.common_divisor_offset.x + sprite.extrude,
        y: sprite.common_divisor_offset.y + sprite.extrude,
    }
}

/// Bottom-right corner of a sprite's footprint on its sheet, margins and
/// extrusion included.
fn sprite_right_bottom(sprite: &Sprite) -> Point {
    let w = if sprite.rotated {
        sprite.trimmed_rect.h
    } else {
        sprite.trimmed_rect.w
    };
    let h = if sprite.rotated {
        sprite.trimmed_rect.w
    } else {
        sprite.trimmed_rect.h
    };
    Point {
        x: sprite.trimmed_rect.x + w + sprite.common_divisor_margin.x
            - sprite.common_divisor_offset.x
            + sprite.extrude,
        y: sprite.trimmed_rect.y + h + sprite.common_divisor_margin.y
            - sprite.common_divisor_offset.y
            + sprite.extrude,
    }
}

fn fits_in_texture(sprite: &Sprite, max_width: i32, max_height: i32, allow_rotate: bool) -> bool {
    let size = sprite_size(sprite);
    (size.x <= max_width && size.y <= max_height)
        || (allow_rotate && size.x <= max_height && size.y <= max_width)
}

/// Populates `trimmed_source_rect` and the divisor margins. Never fails; a
/// fully transparent sprite becomes zero-sized.
fn prepare_sprites(sprites: &mut [Sprite]) {
    for sprite in sprites.iter_mut() {
        sprite.trimmed_source_rect = if sprite.trim != Trim::None {
            let mut bounds = used_bounds(
                &sprite.source.image,
                sprite.source_rect,
                sprite.trim_threshold,
            );
            if sprite.trim_margin > 0 && !bounds.is_empty() {
                bounds = bounds.expand(sprite.trim_margin).intersect(&sprite.source_rect);
            }
            bounds
        } else {
            sprite.source_rect
        };

        sprite.common_divisor_margin = Size {
            x: ceil_to_multiple(sprite.trimmed_source_rect.w, sprite.common_divisor.x)
                - sprite.trimmed_source_rect.w,
            y: ceil_to_multiple(sprite.trimmed_source_rect.h, sprite.common_divisor.y)
                - sprite.trimmed_source_rect.h,
        };
        sprite.common_divisor_offset = Size {
            x: sprite.common_divisor_margin.x / 2,
            y: sprite.common_divisor_margin.y / 2,
        };
    }
}

/// Reconstructs each sprite's untrimmed `rect` and resolves the pivot.
fn complete_sprite_info(sprites: &mut [Sprite]) {
    for sprite in sprites.iter_mut() {
        sprite.rect = if sprite.trim == Trim::Crop {
            sprite.trimmed_rect
        } else {
            Rect::new(
                sprite.trimmed_rect.x - (sprite.trimmed_source_rect.x - sprite.source_rect.x),
                sprite.trimmed_rect.y - (sprite.trimmed_source_rect.y - sprite.source_rect.y),
                sprite.source_rect.w,
                sprite.source_rect.h,
            )
        };

        sprite.rect.x -= sprite.common_divisor_offset.x;
        sprite.rect.y -= sprite.common_divisor_offset.y;
        sprite.rect.w += sprite.common_divisor_margin.x;
        sprite.rect.h += sprite.common_divisor_margin.y;

        let mut pivot = sprite.pivot_point;
        match sprite.pivot.x {
            PivotX::Left => pivot.x = 0.0,
            PivotX::Center => pivot.x = sprite.rect.w as f32 / 2.0,
            PivotX::Right => pivot.x = sprite.rect.w as f32,
            PivotX::Custom => {}
        }
        match sprite.pivot.y {
            PivotY::Top => pivot.y = 0.0,
            PivotY::Middle => pivot.y = sprite.rect.h as f32 / 2.0,
            PivotY::Bottom => pivot.y = sprite.rect.h as f32,
            PivotY::Custom => {}
        }
        if sprite.integral_pivot_point {
            pivot.x = pivot.x.floor();
            pivot.y = pivot.y.floor();
        }
        sprite.pivot_point = pivot;
        sprite.trimmed_pivot_point.x =
            pivot.x + (sprite.rect.x - sprite.trimmed_rect.x) as f32;
        sprite.trimmed_pivot_point.y =
            pivot.y + (sprite.rect.y - sprite.trimmed_rect.y) as f32;
    }
}

/// Index of the first earlier non-duplicate sprite with byte-identical
/// trimmed pixels, if any.
fn find_duplicate(sprites: &[Sprite], i: usize, is_duplicate: &[bool]) -> Option<usize> {
    let identical = |j: usize| {
        !is_duplicate[j]
            && regions_identical(
                &sprites[i].source.image,
                &sprites[i].trimmed_source_rect,
                &sprites[j].source.image,
                &sprites[j].trimmed_source_rect,
            )
    };
    #[cfg(feature = "parallel")]
    {
        (0..i).into_par_iter().find_first(|&j| identical(j))
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..i).find(|&j| identical(j))
    }
}

fn pack_sprite_texture(
    texture: &TextureConfig,
    sprites: &mut [Sprite],
    base_index: usize,
    packed_textures: &mut Vec<PackedTexture>,
) -> Result<()> {
    let pack_width = effective_size(texture.width, texture.max_width, texture.power_of_two);
    let pack_height = effective_size(texture.height, texture.max_height, texture.power_of_two);
    let inner_width = pack_width.saturating_sub(texture.border_padding * 2);
    let inner_height = pack_height.saturating_sub(texture.border_padding * 2);

    for sprite in sprites.iter() {
        if !fits_in_texture(sprite, inner_width, inner_height, texture.allow_rotate) {
            return Err(SpritePackError::SpriteDoesNotFit {
                id: sprite.id_or_default(),
                texture: texture.filename.to_string(),
            });
        }
    }

    // deduplicate, then collect the rectangles that actually get packed
    let mut duplicates: Vec<(usize, usize)> = Vec::new();
    let mut is_duplicate = vec![false; sprites.len()];
    let mut rects: Vec<PackRect> = Vec::new();
    for i in 0..sprites.len() {
        if texture.deduplicate {
            if let Some(j) = find_duplicate(sprites, i, &is_duplicate) {
                duplicates.push((i, j));
                is_duplicate[i] = true;
                continue;
            }
        }
        // only pad the axes the sprite does not already span; a sprite
        // filling a whole row or column would otherwise waste a lane
        let mut size = sprite_size(&sprites[i]);
        if size.x < inner_width {
            size.x += texture.shape_padding;
        }
        if size.y < inner_height {
            size.y += texture.shape_padding;
        }
        rects.push(PackRect {
            id: i,
            w: size.x,
            h: size.y,
        });
    }

    let params = PackParams {
        power_of_two: texture.power_of_two,
        allow_rotate: texture.allow_rotate,
        border_padding: texture.border_padding,
        max_width: pack_width,
        max_height: pack_height,
        can_grow: pack_width > texture.width,
    };
    let sheets = pack(&params, rects)?;
    debug!(
        texture = %texture.filename,
        sheets = sheets.len(),
        sprites = sprites.len(),
        duplicates = duplicates.len(),
        "packed"
    );

    if sheets.len() > texture.filename.count() {
        return Err(SpritePackError::SheetLimitExceeded {
            texture: texture.filename.to_string(),
            sheets: sheets.len(),
            allowed: texture.filename.count(),
        });
    }

    for (texture_index, sheet) in sheets.iter().enumerate() {
        for placement in &sheet.placements {
            let sprite = &mut sprites[placement.id];
            let indent = sprite_indent(sprite);
            sprite.rotated = placement.rotated;
            sprite.texture_index = texture_index;
            sprite.trimmed_rect = Rect::new(
                placement.x + indent.x - texture.border_padding,
                placement.y + indent.y - texture.border_padding,
                sprite.trimmed_source_rect.w,
                sprite.trimmed_source_rect.h,
            );
        }
    }

    for &(i, j) in &duplicates {
        sprites[i].rotated = sprites[j].rotated;
        sprites[i].texture_index = sprites[j].texture_index;
        sprites[i].trimmed_rect = sprites[j].trimmed_rect;
    }

    complete_sprite_info(sprites);

    // group sheets: stable sort keeps input order within a sheet
    sprites.sort_by_key(|s| s.texture_index);

    let mut run_start = 0;
    while run_start < sprites.len() {
        let sheet_index = sprites[run_start].texture_index;
        let mut run_end = run_start;
        while run_end < sprites.len() && sprites[run_end].texture_index == sheet_index {
            run_end += 1;
        }

        let mut width = texture.width;
        let mut height = texture.height;
        for sprite in &sprites[run_start..run_end] {
            let corner = sprite_right_bottom(sprite);
            width = width.max(corner.x + texture.border_padding);
            height = height.max(corner.y + texture.border_padding);
        }
        if texture.power_of_two {
            width = ceil_to_pot(width);
            height = ceil_to_pot(height);
        }

        packed_textures.push(PackedTexture {
            path: texture.path.clone(),
            filename: texture.filename.get_nth_filename(sheet_index),
            width,
            height,
            sprite_range: base_index + run_start..base_index + run_end,
            alpha: texture.alpha,
            colorkey: texture.colorkey,
        });
        run_start = run_end;
    }
    Ok(())
}

/// Packs all sprites, grouped by their texture family, and returns one
/// [`PackedTexture`] per output sheet.
///
/// On return the sprite container is reordered by texture family and sheet
/// ordinal; every `PackedTexture` views a contiguous run of it.
pub fn pack_sprites(sprites: &mut Vec<Sprite>) -> Result<Vec<PackedTexture>> {
    let mut packed_textures = Vec::new();
    if sprites.is_empty() {
        return Ok(packed_textures);
    }

    prepare_sprites(sprites);

    // group sprites by texture family
    sprites.sort_by(|a, b| a.texture.filename.cmp(&b.texture.filename));

    let mut begin = 0;
    while begin < sprites.len() {
        let texture = sprites[begin].texture.clone();
        let mut end = begin;
        while end < sprites.len() && sprites[end].texture.filename == texture.filename {
            end += 1;
        }
        texture.validate()?;
        pack_sprite_texture(&texture, &mut sprites[begin..end], begin, &mut packed_textures)?;
        begin = end;
    }
    Ok(packed_textures)
}
