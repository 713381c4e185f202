//! Save the active rendering as a PNG file.

use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::catalog::{SelectionKey, SpaceVariant, StyleVariant};
use crate::generation::GeneratedImage;
use crate::session::SessionController;

/// Tag prefixed to every exported file name.
pub const PROJECT_TAG: &str = "MSpace";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rendering cached for {0}")]
    NothingToExport(SelectionKey),

    #[error("image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("could not convert image to PNG: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
}

/// `MSpace_{space}_{style}_{unix millis}.png`
pub fn export_file_name(space: &SpaceVariant, style: &StyleVariant, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{}.png",
        PROJECT_TAG,
        space.name,
        style.name,
        at.timestamp_millis()
    )
}

/// Write `image` to `path` as PNG, re-encoding other formats.
pub fn write_png(image: &GeneratedImage, path: &Path) -> Result<(), ExportError> {
    let bytes = image.decode()?;

    if bytes.starts_with(PNG_SIGNATURE) {
        fs::write(path, &bytes)?;
    } else {
        image::load_from_memory(&bytes)?.save_with_format(path, ImageFormat::Png)?;
    }

    Ok(())
}

/// Export the cached rendering for the controller's active selection into `dir`.
pub fn export_current(
    controller: &SessionController,
    dir: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let (space, style) = controller.selection();
    let key = SelectionKey::new(space, style);
    let image = controller
        .image_for(&key)
        .ok_or_else(|| ExportError::NothingToExport(key.clone()))?;

    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(space, style, at));
    write_png(&image, &path)?;

    info!("Exported {} to {}", key, path.display());
    Ok(path)
}
