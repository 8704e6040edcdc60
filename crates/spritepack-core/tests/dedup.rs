use image::{Rgba, RgbaImage};
use spritepack_core::prelude::*;
use std::sync::Arc;

/// A 4-cell sheet (16x16 cells); cells 0 and 2 carry identical pixels.
fn sheet_with_duplicates() -> Arc<SourceImage> {
    let mut image = RgbaImage::new(64, 16);
    let fill = |image: &mut RgbaImage, cell: u32, color: [u8; 4]| {
        for y in 2..14 {
            for x in 2..14 {
                image.put_pixel(cell * 16 + x, y, Rgba(color));
            }
        }
    };
    fill(&mut image, 0, [255, 0, 0, 255]);
    fill(&mut image, 1, [0, 255, 0, 255]);
    fill(&mut image, 2, [255, 0, 0, 255]);
    fill(&mut image, 3, [0, 0, 255, 255]);
    Arc::new(SourceImage {
        path: String::new(),
        filename: "cells.png".into(),
        image,
    })
}

fn cell_sprites(source: &Arc<SourceImage>, texture: &Arc<TextureConfig>) -> Vec<Sprite> {
    (0..4)
        .map(|i| {
            let mut sprite = Sprite::new(i, source.clone(), texture.clone());
            sprite.source_rect = Rect::new(i * 16, 0, 16, 16);
            sprite
        })
        .collect()
}

fn by_index(sprites: &[Sprite], index: i32) -> &Sprite {
    sprites.iter().find(|s| s.index == index).unwrap()
}

#[test]
fn identical_sprites_collapse_to_one_rect() {
    let source = sheet_with_duplicates();
    let texture = Arc::new(TextureConfig {
        deduplicate: true,
        ..Default::default()
    });
    let mut sprites = cell_sprites(&source, &texture);
    pack_sprites(&mut sprites).expect("pack");

    let primary = by_index(&sprites, 0);
    let duplicate = by_index(&sprites, 2);
    assert_eq!(duplicate.trimmed_rect, primary.trimmed_rect);
    assert_eq!(duplicate.rotated, primary.rotated);
    assert_eq!(duplicate.texture_index, primary.texture_index);

    // the distinct sprites keep distinct placements
    let b = by_index(&sprites, 1);
    let d = by_index(&sprites, 3);
    assert_ne!(b.trimmed_rect, primary.trimmed_rect);
    assert_ne!(d.trimmed_rect, primary.trimmed_rect);
    assert_ne!(b.trimmed_rect, d.trimmed_rect);
}

#[test]
fn dedup_only_when_requested() {
    let source = sheet_with_duplicates();
    let texture = Arc::new(TextureConfig::default());
    let mut sprites = cell_sprites(&source, &texture);
    pack_sprites(&mut sprites).expect("pack");

    let rects: Vec<Rect> = sprites.iter().map(|s| s.trimmed_rect).collect();
    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            assert!(!rects[i].intersects(&rects[j]));
        }
    }
}

#[test]
fn dedup_compares_trimmed_pixels_not_cells() {
    // same glyph drawn at different offsets inside the cell still matches
    // once trimmed
    let mut image = RgbaImage::new(32, 16);
    for (cell, off) in [(0u32, 1u32), (1, 5)] {
        for y in 0..4 {
            for x in 0..4 {
                image.put_pixel(cell * 16 + off + x, 3 + y, Rgba([9, 9, 9, 255]));
            }
        }
    }
    let source = Arc::new(SourceImage {
        path: String::new(),
        filename: "offset.png".into(),
        image,
    });
    let texture = Arc::new(TextureConfig {
        deduplicate: true,
        ..Default::default()
    });
    let mut sprites: Vec<Sprite> = (0..2)
        .map(|i| {
            let mut sprite = Sprite::new(i, source.clone(), texture.clone());
            sprite.source_rect = Rect::new(i * 16, 0, 16, 16);
            sprite
        })
        .collect();
    pack_sprites(&mut sprites).expect("pack");
    assert_eq!(
        by_index(&sprites, 0).trimmed_rect,
        by_index(&sprites, 1).trimmed_rect
    );
}
