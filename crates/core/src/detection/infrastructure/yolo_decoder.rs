//! Pre- and post-processing for anchor-free YOLO detection heads
//! (v8/v11 layout: `[cx, cy, w, h, class_0 .. class_n]` per candidate).
use crate::shared::frame::Frame;

use super::math::nms_by_class;

/// Fallback model input resolution when the model doesn't specify dimensions.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
pub const NMS_IOU_THRESH: f64 = 0.45;

const BOX_FIELDS: usize = 4;

/// A decoded detection in original frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub class_id: u32,
}

/// Letterbox geometry needed to map model coordinates back to the frame.
#[derive(Clone, Copy, Debug)]
pub struct Letterbox {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
}

/// Reads the square input size from an NCHW model input, if static.
pub fn model_input_size(session: &ort::session::Session) -> u32 {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

/// Letterbox-resize a frame to `target_size` × `target_size`, normalized
/// NCHW float32 with YOLO's 114 gray padding.
pub fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, Letterbox { scale, pad_x, pad_y })
}

/// Decodes a raw YOLO output tensor into NMS-filtered detections.
///
/// Accepts both `[1, features, candidates]` (the usual export) and
/// `[1, candidates, features]`. Candidates scoring below `min_confidence`
/// are dropped before NMS.
pub fn decode(
    data: &[f32],
    shape: &[usize],
    letterbox: Letterbox,
    frame_w: u32,
    frame_h: u32,
    min_confidence: f64,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_candidates, num_features) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_features <= BOX_FIELDS {
        return Err(format!("YOLO output has no class scores: {shape:?}").into());
    }
    if data.len() < num_candidates * num_features {
        return Err("YOLO output shorter than its shape".into());
    }

    let feature = |cand: usize, f: usize| -> f32 {
        if transposed {
            data[f * num_candidates + cand]
        } else {
            data[cand * num_features + f]
        }
    };

    let max_x = frame_w as f64;
    let max_y = frame_h as f64;
    let mut candidates = Vec::new();
    for cand in 0..num_candidates {
        let (class_id, score) = (BOX_FIELDS..num_features)
            .map(|f| (f - BOX_FIELDS, feature(cand, f)))
            .fold((0usize, f32::MIN), |best, x| if x.1 > best.1 { x } else { best });

        let confidence = score as f64;
        if confidence < min_confidence {
            continue;
        }

        let cx = feature(cand, 0) as f64;
        let cy = feature(cand, 1) as f64;
        let w = feature(cand, 2) as f64;
        let h = feature(cand, 3) as f64;

        let unpad_x = |v: f64| ((v - letterbox.pad_x as f64) / letterbox.scale).clamp(0.0, max_x);
        let unpad_y = |v: f64| ((v - letterbox.pad_y as f64) / letterbox.scale).clamp(0.0, max_y);

        let bbox = [
            unpad_x(cx - w / 2.0),
            unpad_y(cy - h / 2.0),
            unpad_x(cx + w / 2.0),
            unpad_y(cy + h / 2.0),
        ];
        candidates.push((bbox, confidence, class_id as u32));
    }

    Ok(nms_by_class(&candidates, NMS_IOU_THRESH)
        .into_iter()
        .map(|i| {
            let (bbox, confidence, class_id) = candidates[i];
            RawDetection {
                bbox,
                confidence,
                class_id,
            }
        })
        .collect())
}
