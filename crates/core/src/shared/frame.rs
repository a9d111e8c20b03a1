use ndarray::{ArrayView3, ArrayViewMut3};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("expected {expected} channels, got {actual}")]
    Channels { expected: u8, actual: u8 },
    #[error("data length {actual} does not match {width}x{height}x{channels}")]
    DataLength {
        actual: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error("frame is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    Dimensions {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },
    #[error("frame has zero area")]
    Empty,
}

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Checked constructor for data arriving from outside the crate.
    pub fn try_new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
    ) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(FrameError::DataLength {
                actual: data.len(),
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            index,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Rejects anything the detector cannot consume: non-RGB layouts,
    /// zero-area frames and buffers whose length disagrees with the header.
    pub fn validate_rgb(&self) -> Result<(), FrameError> {
        if self.channels != 3 {
            return Err(FrameError::Channels {
                expected: 3,
                actual: self.channels,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::Empty);
        }
        let expected = (self.width as usize) * (self.height as usize) * 3;
        if self.data.len() != expected {
            return Err(FrameError::DataLength {
                actual: self.data.len(),
                width: self.width,
                height: self.height,
                channels: self.channels,
            });
        }
        Ok(())
    }

    pub fn ensure_dimensions(&self, width: u32, height: u32) -> Result<(), FrameError> {
        if self.width != width || self.height != height {
            return Err(FrameError::Dimensions {
                expected_w: width,
                expected_h: height,
                actual_w: self.width,
                actual_h: self.height,
            });
        }
        Ok(())
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_try_new_rejects_short_buffer() {
        let err = Frame::try_new(vec![0u8; 10], 2, 2, 3, 0).unwrap_err();
        assert!(matches!(err, FrameError::DataLength { actual: 10, .. }));
    }

    #[test]
    fn test_validate_rgb_accepts_three_channels() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        assert!(frame.validate_rgb().is_ok());
    }

    #[test]
    fn test_validate_rgb_rejects_grayscale() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, 1, 0);
        assert_eq!(
            frame.validate_rgb(),
            Err(FrameError::Channels {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_validate_rgb_rejects_empty() {
        let frame = Frame::new(Vec::new(), 0, 4, 3, 0);
        assert_eq!(frame.validate_rgb(), Err(FrameError::Empty));
    }

    #[test]
    fn test_ensure_dimensions_mismatch() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        assert!(frame.ensure_dimensions(2, 2).is_ok());
        assert!(matches!(
            frame.ensure_dimensions(4, 2),
            Err(FrameError::Dimensions { expected_w: 4, .. })
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let data = vec![100u8; 12];
        let frame = Frame::new(data, 2, 2, 3, 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128;
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }
}
