use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpritePackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sprite '{id}' can not fit in texture '{texture}'")]
    SpriteDoesNotFit { id: String, texture: String },

    #[error("not all sprites fit on texture '{texture}' ({sheets} sheets needed, {allowed} allowed)")]
    SheetLimitExceeded {
        texture: String,
        sheets: usize,
        allowed: usize,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("internal packer error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SpritePackError>;
