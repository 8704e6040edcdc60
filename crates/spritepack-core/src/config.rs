use crate::filename_sequence::FilenameSequence;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Trim modes for a sprite's effective region.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trim {
    /// Keep the full source rect.
    None,
    /// Shrink the packed region to the alpha bounds; the logical rect keeps
    /// the untrimmed size.
    #[default]
    Trim,
    /// Shrink the packed region and the logical rect to the alpha bounds.
    Crop,
}

impl FromStr for Trim {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "trim" => Ok(Self::Trim),
            "crop" => Ok(Self::Crop),
            _ => Err(()),
        }
    }
}

/// Horizontal pivot anchors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PivotX {
    #[default]
    Left,
    Center,
    Right,
    Custom,
}

/// Vertical pivot anchors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PivotY {
    #[default]
    Top,
    Middle,
    Bottom,
    Custom,
}

impl FromStr for PivotX {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

impl FromStr for PivotY {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "middle" => Ok(Self::Middle),
            "bottom" => Ok(Self::Bottom),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

/// Per-sprite anchor, one enum per axis.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pivot {
    pub x: PivotX,
    pub y: PivotY,
}

/// Alpha post-processing applied to a composed texture.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alpha {
    #[default]
    Keep,
    /// Zero out the color of fully transparent pixels.
    Clear,
    /// Flood opaque colors into transparent pixels to avoid sampling halos.
    Bleed,
    Premultiply,
    /// Replace transparency with the colorkey color and drop the channel.
    Colorkey,
}

impl FromStr for Alpha {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "clear" => Ok(Self::Clear),
            "bleed" => Ok(Self::Bleed),
            "premultiply" => Ok(Self::Premultiply),
            "colorkey" => Ok(Self::Colorkey),
            _ => Err(()),
        }
    }
}

/// Output atlas family configuration, shared by many sprites.
///
/// `width`/`height` fix the sheet size exactly; `max_width`/`max_height`
/// bound a growable sheet. Zero means unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextureConfig {
    pub width: i32,
    pub height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Unusable margin inside the sheet perimeter.
    pub border_padding: i32,
    /// Spacing between neighboring sprites.
    pub shape_padding: i32,
    pub power_of_two: bool,
    pub allow_rotate: bool,
    pub deduplicate: bool,
    pub alpha: Alpha,
    pub colorkey: Option<[u8; 4]>,
    /// Output filename family; its count bounds the number of sheets.
    pub filename: FilenameSequence,
    /// Directory the sheets are written to.
    pub path: String,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            max_width: 0,
            max_height: 0,
            border_padding: 0,
            shape_padding: 0,
            power_of_two: false,
            allow_rotate: false,
            deduplicate: false,
            alpha: Alpha::Keep,
            colorkey: None,
            filename: FilenameSequence::parse("sheet{0-}.png").unwrap(),
            path: String::new(),
        }
    }
}

impl TextureConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpritePackError;

        for (name, v) in [
            ("width", self.width),
            ("height", self.height),
            ("max-width", self.max_width),
            ("max-height", self.max_height),
            ("border-padding", self.border_padding),
            ("shape-padding", self.shape_padding),
        ] {
            if v < 0 {
                return Err(SpritePackError::InvalidConfig(format!(
                    "texture '{}': {} must not be negative",
                    self.filename, name
                )));
            }
        }

        let total_border = self.border_padding * 2;
        for (name, size, max) in [
            ("width", self.width, self.max_width),
            ("height", self.height, self.max_height),
        ] {
            for bound in [size, max] {
                if bound > 0 && total_border >= bound {
                    return Err(SpritePackError::InvalidConfig(format!(
                        "texture '{}': border-padding ({}) leaves no usable {}",
                        self.filename, self.border_padding, name
                    )));
                }
            }
        }

        if self.alpha == Alpha::Colorkey && self.colorkey.is_none() {
            return Err(SpritePackError::InvalidConfig(format!(
                "texture '{}': alpha mode 'colorkey' requires a colorkey",
                self.filename
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(TextureConfig::default().validate().is_ok());
    }

    #[test]
    fn border_padding_must_leave_space() {
        let cfg = TextureConfig {
            max_width: 16,
            max_height: 16,
            border_padding: 8,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn colorkey_mode_requires_color() {
        let cfg = TextureConfig {
            alpha: Alpha::Colorkey,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
