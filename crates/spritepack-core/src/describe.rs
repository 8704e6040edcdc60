//! The structured description of a packing result.
//!
//! [`build_description`] produces the JSON document with top-level
//! `sprites`, `tags` and `textures` arrays; a template engine may render it
//! into any textual format.

use crate::geometry::{PointF, Rect};
use crate::model::{PackedTexture, Sprite};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn json_rect(rect: &Rect) -> Value {
    json!({"x": rect.x, "y": rect.y, "w": rect.w, "h": rect.h})
}

fn json_point(point: &PointF) -> Value {
    json!({"x": point.x, "y": point.y})
}

/// Fallback id for sprites without one.
pub fn generate_sprite_id(index: i32) -> String {
    format!("sprite_{index}")
}

/// Strips the last extension, if any.
pub fn remove_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(dot) => filename[..dot].to_string(),
        None => filename.to_string(),
    }
}

/// Builds the description document over the final sprite container and the
/// packed textures it was assembled into.
pub fn build_description(sprites: &[Sprite], textures: &[PackedTexture]) -> Value {
    let mut json_sprites: Vec<Value> = Vec::new();
    let mut tags: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
    let mut texture_sprites: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for sprite in sprites {
        let texture_filename = sprite
            .texture
            .filename
            .get_nth_filename(sprite.texture_index);

        let mut obj = Map::new();
        obj.insert("index".into(), json!(sprite.index));
        obj.insert("id".into(), json!(sprite.id));
        obj.insert("rect".into(), json_rect(&sprite.rect));
        obj.insert("trimmedRect".into(), json_rect(&sprite.trimmed_rect));
        obj.insert("sourceFilename".into(), json!(sprite.source.filename));
        obj.insert("sourcePath".into(), json!(sprite.source.path));
        obj.insert("sourceRect".into(), json_rect(&sprite.source_rect));
        // sprites cut from a larger sheet get their ordinal within the
        // output texture; whole-image sprites are unambiguous without it
        if sprite.source.width() != sprite.source_rect.w
            || sprite.source.height() != sprite.source_rect.h
        {
            let ordinal = texture_sprites
                .get(&texture_filename)
                .map_or(0, |list| list.len());
            obj.insert("sourceSpriteIndex".into(), json!(ordinal));
        }
        obj.insert(
            "trimmedSourceRect".into(),
            json_rect(&sprite.trimmed_source_rect),
        );
        obj.insert("pivot".into(), json_point(&sprite.pivot_point));
        obj.insert("filename".into(), json!(texture_filename));
        obj.insert("rotated".into(), json!(sprite.rotated));
        let mut tag_obj = Map::new();
        for (key, value) in &sprite.tags {
            tag_obj.insert(key.clone(), json!(value));
        }
        obj.insert("tags".into(), Value::Object(tag_obj));
        if !sprite.vertices.is_empty() {
            let points: Vec<Value> = sprite.vertices.iter().map(json_point).collect();
            obj.insert("vertices".into(), Value::Array(points));
        }

        let index = json_sprites.len();
        json_sprites.push(Value::Object(obj));
        for (key, value) in &sprite.tags {
            tags.entry((key.clone(), value.clone()))
                .or_default()
                .push(index);
        }
        texture_sprites.entry(texture_filename).or_default().push(index);
    }

    let json_tags: Vec<Value> = tags
        .into_iter()
        .map(|((key, value), indices)| {
            let mut obj = Map::new();
            obj.insert("key".into(), json!(key));
            if !value.is_empty() {
                obj.insert("value".into(), json!(value));
            }
            let inlined: Vec<Value> =
                indices.iter().map(|&i| json_sprites[i].clone()).collect();
            obj.insert("sprites".into(), Value::Array(inlined));
            Value::Object(obj)
        })
        .collect();

    let json_textures: Vec<Value> = textures
        .iter()
        .map(|texture| {
            let inlined: Vec<Value> = texture_sprites
                .get(&texture.filename)
                .map(|indices| indices.iter().map(|&i| json_sprites[i].clone()).collect())
                .unwrap_or_default();
            json!({
                "filename": texture.filename,
                "width": texture.width,
                "height": texture.height,
                "sprites": inlined,
            })
        })
        .collect();

    json!({
        "sprites": json_sprites,
        "tags": json_tags,
        "textures": json_textures,
    })
}
