//! Blitting sprites onto output sheets, edge extrusion and debug drawing.

use crate::config::Alpha;
use crate::geometry::{PointF, Rect};
use crate::model::{PackedTexture, Sprite};
use crate::raster;
use image::{Rgba, RgbaImage};

/// Even-odd point-in-polygon test, `points` in the same space as `(x, y)`.
fn in_polygon(points: &[PointF], x: f32, y: f32) -> bool {
    let mut inside = false;
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (a.y > y) != (b.y > y) {
            let t = (y - a.y) / (b.y - a.y);
            if x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
    }
    inside
}

fn put_checked(canvas: &mut RgbaImage, x: i32, y: i32, px: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, px);
    }
}

/// Copies `src_rect` of `src` to `(dx, dy)` in `canvas`. When `mask` is
/// non-empty only pixels inside the polygon are copied; points are local to
/// `src_rect`'s origin.
pub fn copy_rect(
    src: &RgbaImage,
    src_rect: Rect,
    canvas: &mut RgbaImage,
    dx: i32,
    dy: i32,
    mask: &[PointF],
) {
    for yy in 0..src_rect.h {
        for xx in 0..src_rect.w {
            if !mask.is_empty() && !in_polygon(mask, xx as f32 + 0.5, yy as f32 + 0.5) {
                continue;
            }
            let px = *src.get_pixel((src_rect.x + xx) as u32, (src_rect.y + yy) as u32);
            put_checked(canvas, dx + xx, dy + yy, px);
        }
    }
}

/// Like [`copy_rect`] but rotated 90 degrees clockwise; the destination
/// covers `(src_rect.h, src_rect.w)` pixels. The mask rotates in lockstep
/// because it is tested in source space.
pub fn copy_rect_rotated_cw(
    src: &RgbaImage,
    src_rect: Rect,
    canvas: &mut RgbaImage,
    dx: i32,
    dy: i32,
    mask: &[PointF],
) {
    for yy in 0..src_rect.w {
        for xx in 0..src_rect.h {
            // destination (xx, yy) reads source column-major, bottom-up
            let sx = yy;
            let sy = src_rect.h - 1 - xx;
            if !mask.is_empty() && !in_polygon(mask, sx as f32 + 0.5, sy as f32 + 0.5) {
                continue;
            }
            let px = *src.get_pixel((src_rect.x + sx) as u32, (src_rect.y + sy) as u32);
            put_checked(canvas, dx + xx, dy + yy, px);
        }
    }
}

/// Replicates the inner edge pixels of `rect` onto its border, one pixel
/// outward, on the flagged sides only. `rect` is the already-expanded ring;
/// corners fill when both adjacent sides are flagged.
pub fn extrude_rect(
    canvas: &mut RgbaImage,
    rect: Rect,
    left: bool,
    top: bool,
    right: bool,
    bottom: bool,
) {
    let get = |canvas: &RgbaImage, x: i32, y: i32| -> Option<Rgba<u8>> {
        if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
            Some(*canvas.get_pixel(x as u32, y as u32))
        } else {
            None
        }
    };

    if top {
        for x in rect.x + 1..rect.right() - 1 {
            if let Some(px) = get(canvas, x, rect.y + 1) {
                put_checked(canvas, x, rect.y, px);
            }
        }
    }
    if bottom {
        for x in rect.x + 1..rect.right() - 1 {
            if let Some(px) = get(canvas, x, rect.bottom() - 2) {
                put_checked(canvas, x, rect.bottom() - 1, px);
            }
        }
    }
    if left {
        for y in rect.y + 1..rect.bottom() - 1 {
            if let Some(px) = get(canvas, rect.x + 1, y) {
                put_checked(canvas, rect.x, y, px);
            }
        }
    }
    if right {
        for y in rect.y + 1..rect.bottom() - 1 {
            if let Some(px) = get(canvas, rect.right() - 2, y) {
                put_checked(canvas, rect.right() - 1, y, px);
            }
        }
    }
    let corners = [
        (left && top, rect.x, rect.y, rect.x + 1, rect.y + 1),
        (right && top, rect.right() - 1, rect.y, rect.right() - 2, rect.y + 1),
        (left && bottom, rect.x, rect.bottom() - 1, rect.x + 1, rect.bottom() - 2),
        (
            right && bottom,
            rect.right() - 1,
            rect.bottom() - 1,
            rect.right() - 2,
            rect.bottom() - 2,
        ),
    ];
    for (flagged, cx, cy, ix, iy) in corners {
        if flagged {
            if let Some(px) = get(canvas, ix, iy) {
                put_checked(canvas, cx, cy, px);
            }
        }
    }
}

fn blend(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let dst = *canvas.get_pixel(x as u32, y as u32);
    let a = color[3] as u16;
    let mix = |s: u8, d: u8| (((s as u16) * a + (d as u16) * (255 - a)) / 255) as u8;
    let out = Rgba([
        mix(color[0], dst[0]),
        mix(color[1], dst[1]),
        mix(color[2], dst[2]),
        dst[3].max(color[3]),
    ]);
    canvas.put_pixel(x as u32, y as u32, out);
}

/// Outlined rectangle for debug overlays, alpha-blended.
pub fn draw_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    if rect.is_empty() {
        return;
    }
    for x in rect.x..rect.right() {
        blend(canvas, x, rect.y, color);
        if rect.h > 1 {
            blend(canvas, x, rect.bottom() - 1, color);
        }
    }
    for y in rect.y + 1..rect.bottom() - 1 {
        blend(canvas, rect.x, y, color);
        if rect.w > 1 {
            blend(canvas, rect.right() - 1, y, color);
        }
    }
}

/// Bresenham line for debug overlays, alpha-blended.
pub fn draw_line(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        blend(canvas, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = err * 2;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn copy_sprite(canvas: &mut RgbaImage, sprite: &Sprite) {
    let src = &sprite.source.image;
    let src_rect = sprite.trimmed_source_rect;
    if sprite.rotated {
        copy_rect_rotated_cw(
            src,
            src_rect,
            canvas,
            sprite.trimmed_rect.x,
            sprite.trimmed_rect.y,
            &sprite.vertices,
        );
    } else {
        copy_rect(
            src,
            src_rect,
            canvas,
            sprite.trimmed_rect.x,
            sprite.trimmed_rect.y,
            &sprite.vertices,
        );
    }

    if sprite.extrude > 0 {
        // replicate only the edges where the trimmed region still touches
        // the source region, i.e. where real content meets the border
        let left = sprite.source_rect.x == src_rect.x;
        let top = sprite.source_rect.y == src_rect.y;
        let right = sprite.source_rect.right() == src_rect.right();
        let bottom = sprite.source_rect.bottom() == src_rect.bottom();
        if left || top || right || bottom {
            let mut rect = sprite.trimmed_rect;
            if sprite.rotated {
                std::mem::swap(&mut rect.w, &mut rect.h);
            }
            for _ in 0..sprite.extrude {
                rect = rect.expand(1);
                extrude_rect(canvas, rect, left, top, right, bottom);
            }
        }
    }
}

fn process_alpha(canvas: &mut RgbaImage, texture: &PackedTexture) {
    match texture.alpha {
        Alpha::Keep => {}
        Alpha::Clear => raster::clear_alpha(canvas),
        Alpha::Bleed => raster::bleed_alpha(canvas),
        Alpha::Premultiply => raster::premultiply_alpha(canvas),
        Alpha::Colorkey => {
            if let Some(key) = texture.colorkey {
                raster::make_opaque(canvas, key);
            }
        }
    }
}

fn draw_debug_info(canvas: &mut RgbaImage, sprite: &Sprite) {
    let mut rect = sprite.rect;
    let mut trimmed_rect = sprite.trimmed_rect;
    let mut pivot_point = sprite.pivot_point;
    if sprite.rotated {
        std::mem::swap(&mut rect.w, &mut rect.h);
        std::mem::swap(&mut trimmed_rect.w, &mut trimmed_rect.h);
        std::mem::swap(&mut pivot_point.x, &mut pivot_point.y);
        pivot_point.x = (rect.w - 1) as f32 - pivot_point.x;
    }
    let pivot_rect = Rect::new(
        rect.x + (pivot_point.x - 0.25) as i32,
        rect.y + (pivot_point.y - 0.25) as i32,
        if pivot_point.x == pivot_point.x.floor() { 2 } else { 1 },
        if pivot_point.y == pivot_point.y.floor() { 2 } else { 1 },
    );
    draw_rect(canvas, rect, Rgba([255, 0, 255, 128]));
    draw_rect(canvas, trimmed_rect, Rgba([255, 255, 0, 128]));
    draw_rect(canvas, pivot_rect, Rgba([255, 0, 0, 255]));

    if !sprite.vertices.is_empty() {
        let x = sprite.trimmed_rect.x as f32;
        let y = sprite.trimmed_rect.y as f32;
        for i in 0..sprite.vertices.len() {
            let v0 = sprite.vertices[i];
            let v1 = sprite.vertices[(i + 1) % sprite.vertices.len()];
            draw_line(
                canvas,
                (x + v0.x) as i32,
                (y + v0.y) as i32,
                (x + v1.x) as i32,
                (y + v1.y) as i32,
                Rgba([0, 255, 255, 128]),
            );
        }
    }
}

/// Renders one output sheet: a transparent canvas with every sprite copied
/// in, the texture's alpha mode applied, and optional per-sprite overlays.
pub fn compose_texture(
    texture: &PackedTexture,
    sprites: &[Sprite],
    debug: bool,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(texture.width as u32, texture.height as u32);
    for sprite in texture.sprites(sprites) {
        copy_sprite(&mut canvas, sprite);
    }

    process_alpha(&mut canvas, texture);

    if debug {
        for sprite in texture.sprites(sprites) {
            draw_debug_info(&mut canvas, sprite);
        }
    }
    canvas
}
