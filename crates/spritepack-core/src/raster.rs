//! Pixel-level queries and alpha post-processing over RGBA rasters.

use crate::geometry::Rect;
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;

fn clamp_to_image(img: &RgbaImage, rect: &Rect) -> Rect {
    rect.intersect(&Rect::new(0, 0, img.width() as i32, img.height() as i32))
}

/// Tight bounding box of pixels within `rect` whose alpha exceeds
/// `threshold`. When no pixel qualifies the result is an empty rect at
/// `rect`'s origin.
pub fn used_bounds(img: &RgbaImage, rect: Rect, threshold: u8) -> Rect {
    let rect = clamp_to_image(img, &rect);
    let mut x1 = i32::MAX;
    let mut y1 = i32::MAX;
    let mut x2 = i32::MIN;
    let mut y2 = i32::MIN;
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            if img.get_pixel(x as u32, y as u32)[3] > threshold {
                x1 = x1.min(x);
                y1 = y1.min(y);
                x2 = x2.max(x);
                y2 = y2.max(y);
            }
        }
    }
    if x1 > x2 {
        return Rect::new(rect.x, rect.y, 0, 0);
    }
    Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1)
}

/// Byte-exact RGBA equality of two image regions. Differing sizes are never
/// identical.
pub fn regions_identical(a: &RgbaImage, ra: &Rect, b: &RgbaImage, rb: &Rect) -> bool {
    if ra.w != rb.w || ra.h != rb.h {
        return false;
    }
    if ra.is_empty() {
        return true;
    }
    for y in 0..ra.h {
        for x in 0..ra.w {
            let pa = a.get_pixel((ra.x + x) as u32, (ra.y + y) as u32);
            let pb = b.get_pixel((rb.x + x) as u32, (rb.y + y) as u32);
            if pa != pb {
                return false;
            }
        }
    }
    true
}

/// Bounding boxes of 8-connected components of pixels with alpha above
/// `threshold`, in row-major order of first appearance. Overlapping boxes
/// are merged.
pub fn find_islands(img: &RgbaImage, rect: Rect, threshold: u8) -> Vec<Rect> {
    let rect = clamp_to_image(img, &rect);
    if rect.is_empty() {
        return Vec::new();
    }
    let w = rect.w as usize;
    let mut visited = vec![false; w * rect.h as usize];
    let mut islands: Vec<Rect> = Vec::new();

    let used = |x: i32, y: i32| img.get_pixel(x as u32, y as u32)[3] > threshold;

    for sy in rect.y..rect.bottom() {
        for sx in rect.x..rect.right() {
            let idx = (sy - rect.y) as usize * w + (sx - rect.x) as usize;
            if visited[idx] || !used(sx, sy) {
                continue;
            }
            let mut queue = VecDeque::new();
            queue.push_back((sx, sy));
            visited[idx] = true;
            let mut bounds = Rect::new(sx, sy, 1, 1);
            while let Some((x, y)) = queue.pop_front() {
                let x1 = bounds.x.min(x);
                let y1 = bounds.y.min(y);
                let x2 = bounds.right().max(x + 1);
                let y2 = bounds.bottom().max(y + 1);
                bounds = Rect::new(x1, y1, x2 - x1, y2 - y1);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, ny) = (x + dx, y + dy);
                        if nx < rect.x || ny < rect.y || nx >= rect.right() || ny >= rect.bottom()
                        {
                            continue;
                        }
                        let nidx = (ny - rect.y) as usize * w + (nx - rect.x) as usize;
                        if !visited[nidx] && used(nx, ny) {
                            visited[nidx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
            islands.push(bounds);
        }
    }

    // merge boxes that ended up overlapping
    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..islands.len() {
            for j in i + 1..islands.len() {
                if islands[i].intersects(&islands[j]) {
                    let a = islands[i];
                    let b = islands.remove(j);
                    let x1 = a.x.min(b.x);
                    let y1 = a.y.min(b.y);
                    let x2 = a.right().max(b.right());
                    let y2 = a.bottom().max(b.bottom());
                    islands[i] = Rect::new(x1, y1, x2 - x1, y2 - y1);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
    islands.sort_by_key(|r| (r.y, r.x));
    islands
}

/// Zeroes out the color of fully transparent pixels.
pub fn clear_alpha(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        if px[3] == 0 {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}

/// Floods the color of opaque pixels into transparent neighbors, breadth
/// first, so bilinear sampling at sprite edges does not pick up black.
/// Alpha values are left untouched.
pub fn bleed_alpha(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let mut colored = vec![false; (w * h) as usize];
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
    for y in 0..h {
        for x in 0..w {
            if img.get_pixel(x, y)[3] != 0 {
                colored[(y * w + x) as usize] = true;
                queue.push_back((x, y));
            }
        }
    }
    while let Some((x, y)) = queue.pop_front() {
        let Rgba([r, g, b, _]) = *img.get_pixel(x, y);
        for (dx, dy) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            let idx = (ny * w + nx) as usize;
            if !colored[idx] {
                colored[idx] = true;
                let a = img.get_pixel(nx, ny)[3];
                img.put_pixel(nx, ny, Rgba([r, g, b, a]));
                queue.push_back((nx, ny));
            }
        }
    }
}

/// Multiplies each pixel's color by its alpha.
pub fn premultiply_alpha(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u16;
        px[0] = ((px[0] as u16 * a) / 255) as u8;
        px[1] = ((px[1] as u16 * a) / 255) as u8;
        px[2] = ((px[2] as u16 * a) / 255) as u8;
    }
}

/// Replaces fully transparent pixels with `colorkey` and makes the whole
/// image opaque.
pub fn make_opaque(img: &mut RgbaImage, colorkey: [u8; 4]) {
    for px in img.pixels_mut() {
        if px[3] == 0 {
            *px = Rgba([colorkey[0], colorkey[1], colorkey[2], 255]);
        } else {
            px[3] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with(pixels: &[(u32, u32, [u8; 4])], w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::new(w, h);
        for &(x, y, c) in pixels {
            img.put_pixel(x, y, Rgba(c));
        }
        img
    }

    #[test]
    fn used_bounds_tight() {
        let img = image_with(
            &[(2, 1, [255, 0, 0, 255]), (5, 4, [0, 255, 0, 255])],
            8,
            8,
        );
        let b = used_bounds(&img, Rect::new(0, 0, 8, 8), 0);
        assert_eq!(b, Rect::new(2, 1, 4, 4));
    }

    #[test]
    fn used_bounds_empty_at_origin() {
        let img = RgbaImage::new(8, 8);
        let b = used_bounds(&img, Rect::new(2, 3, 4, 4), 0);
        assert_eq!(b, Rect::new(2, 3, 0, 0));
        assert!(b.is_empty());
    }

    #[test]
    fn used_bounds_respects_threshold() {
        let img = image_with(&[(1, 1, [0, 0, 0, 10]), (2, 2, [0, 0, 0, 200])], 4, 4);
        let b = used_bounds(&img, Rect::new(0, 0, 4, 4), 100);
        assert_eq!(b, Rect::new(2, 2, 1, 1));
    }

    #[test]
    fn identical_regions() {
        let a = image_with(&[(0, 0, [1, 2, 3, 4]), (1, 0, [5, 6, 7, 8])], 4, 4);
        let b = image_with(&[(2, 2, [1, 2, 3, 4]), (3, 2, [5, 6, 7, 8])], 4, 4);
        assert!(regions_identical(
            &a,
            &Rect::new(0, 0, 2, 1),
            &b,
            &Rect::new(2, 2, 2, 1)
        ));
        assert!(!regions_identical(
            &a,
            &Rect::new(0, 0, 2, 1),
            &b,
            &Rect::new(2, 2, 1, 1)
        ));
        assert!(!regions_identical(
            &a,
            &Rect::new(0, 0, 2, 1),
            &b,
            &Rect::new(1, 2, 2, 1)
        ));
    }

    #[test]
    fn islands_detected_and_ordered() {
        let img = image_with(
            &[
                (1, 1, [255, 255, 255, 255]),
                (2, 2, [255, 255, 255, 255]), // diagonal, same island
                (6, 1, [255, 255, 255, 255]),
                (1, 6, [255, 255, 255, 255]),
            ],
            8,
            8,
        );
        let islands = find_islands(&img, Rect::new(0, 0, 8, 8), 0);
        assert_eq!(islands.len(), 3);
        assert_eq!(islands[0], Rect::new(1, 1, 2, 2));
        assert_eq!(islands[1], Rect::new(6, 1, 1, 1));
        assert_eq!(islands[2], Rect::new(1, 6, 1, 1));
    }

    #[test]
    fn bleed_fills_transparent_neighbors() {
        let mut img = image_with(&[(1, 1, [200, 100, 50, 255])], 3, 3);
        bleed_alpha(&mut img);
        let p = img.get_pixel(0, 0);
        assert_eq!((p[0], p[1], p[2]), (200, 100, 50));
        assert_eq!(p[3], 0);
    }

    #[test]
    fn colorkey_makes_opaque() {
        let mut img = image_with(&[(0, 0, [10, 20, 30, 128])], 2, 1);
        make_opaque(&mut img, [255, 0, 255, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 255, 255]);
    }
}
