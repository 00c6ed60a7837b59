use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// JPEG quality used for evidence crops.
pub const JPEG_QUALITY: u8 = 95;

/// Writes frames as JPEG files with the `image` crate.
///
/// Frames with a fourth channel are written without it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rgb = to_rgb(frame)?;
        let file = std::fs::File::create(path)?;
        let mut out = std::io::BufWriter::new(file);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)?;
        Ok(())
    }
}

fn to_rgb(frame: &Frame) -> Result<image::RgbImage, Box<dyn std::error::Error>> {
    let data = match frame.channels() {
        3 => frame.data().to_vec(),
        4 => frame
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        n => return Err(format!("Unsupported channel count for JPEG: {n}").into()),
    };
    image::RgbImage::from_raw(frame.width(), frame.height(), data)
        .ok_or_else(|| "Failed to create image from frame data".into())
}
