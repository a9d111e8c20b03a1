use std::path::{Path, PathBuf};

use super::image_sequence_reader::is_image_path;
use crate::shared::frame::Frame;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_writer::FrameWriter;

enum Target {
    /// One image file; only a single frame may be written.
    File { path: PathBuf, written: bool },
    /// A directory of `frame_NNNNNN.png` files named by frame index.
    Directory(PathBuf),
}

/// Writes frames as image files using the `image` crate.
///
/// An output path with an image extension receives exactly one frame;
/// any other path is treated as a directory of numbered PNGs.
pub struct ImageSequenceWriter {
    target: Option<Target>,
    frames_written: usize,
}

impl ImageSequenceWriter {
    pub fn new() -> Self {
        Self {
            target: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn frame_file_name(index: usize) -> String {
        format!("frame_{index:06}.png")
    }
}

impl Default for ImageSequenceWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn save_frame(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    frame.validate_rgb()?;
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from frame data")?;
    img.save(path)?;
    Ok(())
}

impl FrameWriter for ImageSequenceWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &SequenceMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = if is_image_path(path) {
            if !metadata.is_single_image() {
                return Err(format!(
                    "Output {} is a single image but the input has {} frames",
                    path.display(),
                    metadata.total_frames
                )
                .into());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Target::File {
                path: path.to_path_buf(),
                written: false,
            }
        } else {
            std::fs::create_dir_all(path)?;
            Target::Directory(path.to_path_buf())
        };
        self.target = Some(target);
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        match self.target.as_mut() {
            None => return Err("ImageSequenceWriter: not opened".into()),
            Some(Target::File { path, written }) => {
                if *written {
                    return Err(format!(
                        "Output {} already holds a frame",
                        path.display()
                    )
                    .into());
                }
                save_frame(path, frame)?;
                *written = true;
            }
            Some(Target::Directory(dir)) => {
                save_frame(&dir.join(Self::frame_file_name(frame.index())), frame)?;
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(target) = self.target.take() {
            let location = match &target {
                Target::File { path, .. } | Target::Directory(path) => path.display().to_string(),
            };
            log::debug!("Wrote {} frame(s) to {location}", self.frames_written);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Frame {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height, 3, index)
    }

    fn metadata(total_frames: usize) -> SequenceMetadata {
        SequenceMetadata {
            width: 10,
            height: 8,
            total_frames,
            source_path: None,
        }
    }

    #[test]
    fn test_single_image_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut writer = ImageSequenceWriter::new();
        writer.open(&path, &metadata(1)).unwrap();
        writer.write(&make_frame(10, 8, [50, 100, 200], 0)).unwrap();
        writer.close().unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (10, 8));
        assert_eq!(img.get_pixel(3, 3).0, [50, 100, 200]);
    }

    #[test]
    fn test_single_image_rejects_second_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::new();
        writer.open(&dir.path().join("out.png"), &metadata(1)).unwrap();
        writer.write(&make_frame(10, 8, [0, 0, 0], 0)).unwrap();
        assert!(writer.write(&make_frame(10, 8, [0, 0, 0], 1)).is_err());
    }

    #[test]
    fn test_single_image_output_rejects_sequence_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::new();
        assert!(writer.open(&dir.path().join("out.png"), &metadata(3)).is_err());
    }

    #[test]
    fn test_directory_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        let mut writer = ImageSequenceWriter::new();
        writer.open(&out, &metadata(2)).unwrap();
        writer.write(&make_frame(10, 8, [1, 1, 1], 0)).unwrap();
        writer.write(&make_frame(10, 8, [2, 2, 2], 1)).unwrap();
        assert_eq!(writer.frames_written(), 2);
        writer.close().unwrap();

        assert!(out.join("frame_000000.png").exists());
        let second = image::open(out.join("frame_000001.png")).unwrap().to_rgb8();
        assert_eq!(second.get_pixel(0, 0).0, [2, 2, 2]);
    }

    #[test]
    fn test_write_without_open_is_error() {
        let mut writer = ImageSequenceWriter::new();
        assert!(writer.write(&make_frame(2, 2, [0, 0, 0], 0)).is_err());
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(ImageSequenceWriter::frame_file_name(42), "frame_000042.png");
    }
}
