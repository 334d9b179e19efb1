use std::{fs, path::Path};

use eframe::egui::ColorImage;

use crate::{
    config::IconPaths,
    error::{Result, WidgetError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Play,
    Pause,
    Previous,
    Next,
    Playlist,
    Album,
}

impl Icon {
    pub const ALL: [Icon; 6] = [
        Icon::Play,
        Icon::Pause,
        Icon::Previous,
        Icon::Next,
        Icon::Playlist,
        Icon::Album,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Icon::Play => "play",
            Icon::Pause => "pause",
            Icon::Previous => "prev",
            Icon::Next => "next",
            Icon::Playlist => "playlist",
            Icon::Album => "album",
        }
    }
}

/// Decoded replacement images for the built-in glyphs. Missing entries fall
/// back to vector drawing.
#[derive(Debug, Clone, Default)]
pub struct IconSet {
    images: Vec<(Icon, ColorImage)>,
}

impl IconSet {
    pub fn load(paths: &IconPaths) -> Result<Self> {
        let mut images = Vec::new();
        for ((key, path), icon) in paths.entries().into_iter().zip(Icon::ALL) {
            debug_assert_eq!(key, icon.key());
            let Some(path) = path else {
                continue;
            };
            images.push((icon, load_icon(key, path)?));
        }
        if !images.is_empty() {
            tracing::debug!(count = images.len(), "loaded icon images");
        }
        Ok(Self { images })
    }

    pub fn get(&self, icon: Icon) -> Option<&ColorImage> {
        self.images
            .iter()
            .find(|(entry, _)| *entry == icon)
            .map(|(_, image)| image)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn load_icon(key: &'static str, path: &Path) -> Result<ColorImage> {
    let bytes = fs::read(path).map_err(|source| WidgetError::MissingAsset {
        key,
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes).map_err(|reason| WidgetError::UndecodableAsset {
        key,
        path: path.to_path_buf(),
        reason,
    })
}

pub fn decode_image(bytes: &[u8]) -> std::result::Result<ColorImage, String> {
    let image = image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image: {e}"))?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}

pub fn decode_album_cover(bytes: &[u8]) -> Option<ColorImage> {
    decode_image(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, path::PathBuf};
    use tempfile::NamedTempFile;

    fn temp_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn png_bytes() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decode_fails_on_garbage_input() {
        assert!(decode_image(&[0u8, 1, 2, 3]).is_err());
        assert!(decode_album_cover(&[0u8, 1, 2, 3]).is_none());
    }

    #[test]
    fn decodes_png() {
        let image = decode_image(&png_bytes()).unwrap();
        assert_eq!(image.size, [3, 2]);
    }

    #[test]
    fn empty_paths_load_nothing() {
        let icons = IconSet::load(&IconPaths::default()).unwrap();
        assert!(icons.is_empty());
        assert!(icons.get(Icon::Play).is_none());
    }

    #[test]
    fn missing_and_broken_assets_are_reported() {
        let paths = IconPaths {
            play: Some(PathBuf::from("/definitely/not/here.png")),
            ..IconPaths::default()
        };
        assert!(matches!(
            IconSet::load(&paths),
            Err(WidgetError::MissingAsset { key: "play", .. })
        ));

        let broken = temp_file(b"not an image");
        let paths = IconPaths {
            next: Some(broken.path().to_path_buf()),
            ..IconPaths::default()
        };
        assert!(matches!(
            IconSet::load(&paths),
            Err(WidgetError::UndecodableAsset { key: "next", .. })
        ));
    }

    #[test]
    fn loads_configured_icons() {
        let file = temp_file(&png_bytes());
        let paths = IconPaths {
            album: Some(file.path().to_path_buf()),
            ..IconPaths::default()
        };
        let icons = IconSet::load(&paths).unwrap();
        assert_eq!(icons.get(Icon::Album).map(|image| image.size), Some([3, 2]));
        assert!(icons.get(Icon::Pause).is_none());
    }
}
