use image::{Rgba, RgbaImage};
use spritepack_core::prelude::*;
use std::sync::Arc;

fn opaque_source(name: &str, w: u32, h: u32) -> Arc<SourceImage> {
    let mut image = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            image.put_pixel(x, y, Rgba([x as u8, y as u8, 1, 255]));
        }
    }
    Arc::new(SourceImage {
        path: "assets".into(),
        filename: name.into(),
        image,
    })
}

#[test]
fn document_lists_sprites_tags_and_textures() {
    let sheet = opaque_source("cells.png", 32, 16);
    let texture = Arc::new(TextureConfig::default());
    let mut sprites: Vec<Sprite> = (0..2)
        .map(|i| {
            let mut sprite = Sprite::new(i, sheet.clone(), texture.clone());
            sprite.source_rect = Rect::new(i * 16, 0, 16, 16);
            sprite.id = if i == 0 { "hero".into() } else { String::new() };
            sprite.tags = if i == 0 {
                vec![("group".into(), String::new()), ("level".into(), "1".into())]
            } else {
                vec![("group".into(), String::new())]
            };
            sprite
        })
        .collect();
    let textures = pack_sprites(&mut sprites).expect("pack");
    let doc = build_description(&sprites, &textures);

    let json_sprites = doc["sprites"].as_array().unwrap();
    assert_eq!(json_sprites.len(), 2);
    let first = &json_sprites[0];
    assert_eq!(first["id"], "hero");
    assert_eq!(first["sourceFilename"], "cells.png");
    assert_eq!(first["sourcePath"], "assets");
    assert_eq!(first["filename"], "sheet0.png");
    assert_eq!(first["rotated"], false);
    assert!(first["rect"]["w"].is_i64());
    assert_eq!(first["tags"]["level"], "1");

    let tags = doc["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["key"], "group");
    assert!(tags[0].get("value").is_none());
    assert_eq!(tags[0]["sprites"].as_array().unwrap().len(), 2);
    assert_eq!(tags[1]["key"], "level");
    assert_eq!(tags[1]["value"], "1");
    assert_eq!(tags[1]["sprites"].as_array().unwrap().len(), 1);

    let json_textures = doc["textures"].as_array().unwrap();
    assert_eq!(json_textures.len(), 1);
    assert_eq!(json_textures[0]["filename"], "sheet0.png");
    assert_eq!(json_textures[0]["sprites"].as_array().unwrap().len(), 2);
    assert_eq!(json_textures[0]["width"], textures[0].width);
}

#[test]
fn source_sprite_index_only_for_sub_rect_sprites() {
    let sheet = opaque_source("cells.png", 32, 16);
    let whole = opaque_source("single.png", 16, 16);
    let texture = Arc::new(TextureConfig::default());
    let mut sprites: Vec<Sprite> = (0..2)
        .map(|i| {
            let mut sprite = Sprite::new(i, sheet.clone(), texture.clone());
            sprite.source_rect = Rect::new(i * 16, 0, 16, 16);
            sprite
        })
        .collect();
    sprites.push(Sprite::new(2, whole, texture));
    let textures = pack_sprites(&mut sprites).expect("pack");
    let doc = build_description(&sprites, &textures);

    for sprite in doc["sprites"].as_array().unwrap() {
        if sprite["sourceFilename"] == "single.png" {
            assert!(sprite.get("sourceSpriteIndex").is_none());
        } else {
            assert!(sprite.get("sourceSpriteIndex").is_some());
        }
    }
    // the sub-rect sprites count up within their output texture
    let indices: Vec<i64> = doc["sprites"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["sourceFilename"] == "cells.png")
        .map(|s| s["sourceSpriteIndex"].as_i64().unwrap())
        .collect();
    let mut sorted = indices.clone();
    sorted.sort();
    assert!(sorted.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn vertices_serialize_when_present() {
    let source = opaque_source("poly.png", 8, 8);
    let texture = Arc::new(TextureConfig::default());
    let mut sprites = vec![Sprite::new(0, source, texture)];
    sprites[0].vertices = vec![
        PointF { x: 0.0, y: 0.0 },
        PointF { x: 8.0, y: 0.0 },
        PointF { x: 4.0, y: 8.0 },
    ];
    let textures = pack_sprites(&mut sprites).expect("pack");
    let doc = build_description(&sprites, &textures);

    let sprite = &doc["sprites"][0];
    let vertices = sprite["vertices"].as_array().unwrap();
    assert_eq!(vertices.len(), 3);
    assert_eq!(vertices[1]["x"], 8.0);
}
