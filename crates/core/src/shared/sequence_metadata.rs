use std::path::PathBuf;

/// Dimensions and length of a frame source.
///
/// A single still image is a one-frame sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceMetadata {
    pub width: u32,
    pub height: u32,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl SequenceMetadata {
    pub fn is_single_image(&self) -> bool {
        self.total_frames == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = SequenceMetadata {
            width: 1280,
            height: 720,
            total_frames: 50,
            source_path: Some(PathBuf::from("/tmp/frames")),
        };
        assert_eq!(meta.width, 1280);
        assert_eq!(meta.height, 720);
        assert_eq!(meta.total_frames, 50);
        assert!(!meta.is_single_image());
    }

    #[test]
    fn test_single_image() {
        let meta = SequenceMetadata {
            width: 64,
            height: 64,
            total_frames: 1,
            source_path: None,
        };
        assert!(meta.is_single_image());
    }
}
