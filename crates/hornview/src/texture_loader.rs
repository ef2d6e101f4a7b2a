//! Decoding texture images off the render thread.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use image::RgbaImage;

use crate::error::Result;

/// Outcome of one background decode.
#[derive(Debug)]
pub struct TextureLoad {
    pub path: PathBuf,
    /// The decoded image, or the decode error rendered as text.
    pub result: std::result::Result<RgbaImage, String>,
}

/// Decodes an image file into RGBA8.
pub fn load_texture(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    log::debug!(
        "decoded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Decodes `path` on a worker thread and hands the outcome to `deliver`.
///
/// `deliver` runs exactly once, on the worker thread.
pub fn spawn_texture_load<F>(path: impl Into<PathBuf>, deliver: F) -> JoinHandle<()>
where
    F: FnOnce(TextureLoad) + Send + 'static,
{
    let path = path.into();
    std::thread::spawn(move || {
        let result = load_texture(&path).map_err(|e| e.to_string());
        deliver(TextureLoad { path, result });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::mpsc;

    #[test]
    fn test_load_delivers_decoded_image() {
        let path = std::env::temp_dir().join(format!("hornview_tex_{}.png", std::process::id()));
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 1, Rgba([200, 100, 50, 255]));
        img.save(&path).unwrap();

        let (tx, rx) = mpsc::channel();
        spawn_texture_load(path.clone(), move |load| tx.send(load).unwrap())
            .join()
            .unwrap();

        let load = rx.recv().unwrap();
        assert_eq!(load.path, path);
        let decoded = load.result.unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [200, 100, 50, 255]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_delivers_error() {
        let (tx, rx) = mpsc::channel();
        spawn_texture_load("/nonexistent/hornview/texture.png", move |load| {
            tx.send(load).unwrap();
        })
        .join()
        .unwrap();

        assert!(rx.recv().unwrap().result.is_err());
    }
}
