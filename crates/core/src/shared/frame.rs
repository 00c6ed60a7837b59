use ndarray::{s, ArrayView3, ArrayViewMut3};

use crate::shared::bounding_box::PixelRect;

/// A decoded video frame: contiguous RGB bytes in row-major order.
///
/// `index` is the 0-based decode position within its video.
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

    pub fn data(&self) -> &[u8] {
        &self.data
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

    /// 1-based position in decode order, the numbering used for sampling
    /// and for reporting where a person was first seen.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `rect` into a new frame.
    ///
    /// The rectangle is clamped to the frame first, so an out-of-bounds or
    /// inverted rectangle produces an empty (0-sized) crop rather than a panic.
    pub fn crop(&self, rect: &PixelRect) -> Frame {
        let clamped = rect.clamp_to(self.width, self.height);
        let (x1, y1) = (clamped.x1 as usize, clamped.y1 as usize);
        let (x2, y2) = (clamped.x2 as usize, clamped.y2 as usize);

        let view = self.as_ndarray();
        let data: Vec<u8> = view.slice(s![y1..y2, x1..x2, ..]).iter().copied().collect();

        Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        )
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
