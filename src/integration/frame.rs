//! BGR frame buffer handed to detectors and the light classifier.

use ndarray::{Array3, ArrayView3};

use crate::error::AgentError;

/// One video frame as an `(height, width, 3)` BGR pixel array.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    /// Wrap an existing pixel array. The last axis must hold three channels.
    pub fn new(pixels: Array3<u8>) -> Result<Self, AgentError> {
        let (height, width, channels) = pixels.dim();
        if channels != 3 {
            return Err(AgentError::InvalidFrame(format!(
                "expected 3 channels, got {channels}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(AgentError::InvalidGeometry {
                width: width as u32,
                height: height as u32,
            });
        }
        Ok(Self { pixels })
    }

    /// Build a frame from packed row-major BGR bytes.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AgentError> {
        let shape = (height as usize, width as usize, 3);
        let pixels = Array3::from_shape_vec(shape, data)
            .map_err(|e| AgentError::InvalidFrame(e.to_string()))?;
        Self::new(pixels)
    }

    /// A frame filled with one BGR colour.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Result<Self, AgentError> {
        let shape = (height as usize, width as usize, 3);
        let pixels = Array3::from_shape_fn(shape, |(_, _, c)| bgr[c]);
        Self::new(pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    pub fn pixels_mut(&mut self) -> &mut Array3<u8> {
        &mut self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bgr_shape() {
        let frame = Frame::from_bgr(4, 2, vec![0; 24]).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert!(Frame::from_bgr(4, 2, vec![0; 23]).is_err());
    }

    #[test]
    fn test_rejects_empty_and_wrong_channels() {
        assert!(matches!(
            Frame::new(Array3::zeros((0, 4, 3))),
            Err(AgentError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            Frame::new(Array3::zeros((2, 2, 4))),
            Err(AgentError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_filled() {
        let frame = Frame::filled(3, 3, [1, 2, 3]).unwrap();
        assert_eq!(frame.pixels()[[2, 1, 2]], 3);
    }
}
