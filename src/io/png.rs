use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::error::Result;

/// Nom de fichier horodaté pour une capture : `julia_<secondes>.png`.
pub fn screenshot_path(dir: &Path, now: SystemTime) -> PathBuf {
    let timestamp = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    dir.join(format!("julia_{}.png", timestamp))
}

/// Enregistre l'image relue du GPU au format PNG.
pub fn save_png(img: &RgbaImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    // Avec image 0.25, save() détecte automatiquement le format depuis l'extension
    img.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_screenshot_path() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let path = screenshot_path(Path::new("captures"), now);
        assert_eq!(path, Path::new("captures").join("julia_1700000000.png"));
    }

    #[test]
    fn test_save_png_roundtrip() {
        let dir = std::env::temp_dir().join(format!("julia-viewer-test-{}", std::process::id()));
        let path = dir.join("shot.png");
        let img = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));

        save_png(&img, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(2, 1), &image::Rgba([10, 20, 30, 255]));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
