use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::{Frame, FrameError};
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_reader::FrameReader;

/// True when `path` has one of the supported image extensions.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads a single image, or every image in a directory sorted by file
/// name, using the `image` crate.
///
/// Frames are decoded lazily. Every frame must match the dimensions of
/// the first one.
pub struct ImageSequenceReader {
    paths: Vec<PathBuf>,
    metadata: Option<SequenceMetadata>,
}

impl ImageSequenceReader {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            metadata: None,
        }
    }

    fn list_images(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        if path.is_dir() {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_path(p))
                .collect();
            paths.sort();
            if paths.is_empty() {
                return Err(format!("No images found in {}", path.display()).into());
            }
            Ok(paths)
        } else if path.is_file() {
            Ok(vec![path.to_path_buf()])
        } else {
            Err(format!("Input not found: {}", path.display()).into())
        }
    }
}

impl Default for ImageSequenceReader {
    fn default() -> Self {
        Self::new()
    }
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::try_new(img.into_raw(), width, height, 3, index)?)
}

impl FrameReader for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<SequenceMetadata, Box<dyn std::error::Error>> {
        let paths = Self::list_images(path)?;
        let (width, height) = image::image_dimensions(&paths[0])?;

        let metadata = SequenceMetadata {
            width,
            height,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        log::info!(
            "Opened {} ({} frame(s), {}x{})",
            path.display(),
            metadata.total_frames,
            width,
            height
        );
        self.paths = paths;
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(metadata) = self.metadata.as_ref() else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        };
        let (width, height) = (metadata.width, metadata.height);

        Box::new(self.paths.iter().enumerate().map(move |(index, path)| {
            let frame = load_frame(path, index)?;
            if frame.width() != width || frame.height() != height {
                return Err(Box::new(FrameError::Dimensions {
                    expected_w: width,
                    expected_h: height,
                    actual_w: frame.width(),
                    actual_h: frame.height(),
                }) as Box<dyn std::error::Error>);
            }
            Ok(frame)
        }))
    }

    fn close(&mut self) {
        self.paths.clear();
        self.metadata = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(path).unwrap();
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a/b.PNG")));
        assert!(is_image_path(Path::new("x.jpeg")));
        assert!(!is_image_path(Path::new("clip.mp4")));
        assert!(!is_image_path(Path::new("frames")));
    }

    #[test]
    fn test_single_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");
        write_image(&path, 100, 80, [50, 100, 200]);

        let mut reader = ImageSequenceReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (100, 80));
        assert!(meta.is_single_image());
        assert_eq!(meta.source_path, Some(path));

        let frames: Vec<_> = reader.frames().collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channels(), 3);
        assert_eq!(&frames[0].data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_directory_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("b.png"), 8, 8, [2, 2, 2]);
        write_image(&dir.path().join("a.png"), 8, 8, [1, 1, 1]);
        write_image(&dir.path().join("c.png"), 8, 8, [3, 3, 3]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut reader = ImageSequenceReader::new();
        let meta = reader.open(dir.path()).unwrap();
        assert_eq!(meta.total_frames, 3);

        let frames: Vec<Frame> = reader.frames().collect::<Result<_, _>>().unwrap();
        let firsts: Vec<u8> = frames.iter().map(|f| f.data()[0]).collect();
        let indices: Vec<usize> = frames.iter().map(|f| f.index()).collect();
        assert_eq!(firsts, vec![1, 2, 3]);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("a.png"), 8, 8, [0, 0, 0]);
        write_image(&dir.path().join("b.png"), 16, 8, [0, 0, 0]);

        let mut reader = ImageSequenceReader::new();
        reader.open(dir.path()).unwrap();
        let results: Vec<_> = reader.frames().collect();
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(err.downcast_ref::<FrameError>().is_some());
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(dir.path()).is_err());
    }

    #[test]
    fn test_open_nonexistent_raises() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(Path::new("/nonexistent/test.png")).is_err());
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");
        write_image(&path, 4, 4, [0, 0, 0]);
        let mut reader = ImageSequenceReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
        assert!(reader.frames().next().unwrap().is_err());
    }
}
