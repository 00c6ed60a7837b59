//! Box geometry shared by the YOLO decoders and the tracker.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy class-aware NMS over `(bbox, score, class_id)` triples.
///
/// Returns indices of kept boxes in descending score order. Boxes of
/// different classes never suppress each other.
pub fn nms_by_class(boxes: &[([f64; 4], f64, u32)], iou_thresh: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        boxes[b]
            .1
            .partial_cmp(&boxes[a].1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<usize> = Vec::new();
    for idx in order {
        let (bbox, _, class_id) = &boxes[idx];
        let suppressed = keep.iter().any(|&k| {
            let (kept_bbox, _, kept_class) = &boxes[k];
            kept_class == class_id && bbox_iou(kept_bbox, bbox) > iou_thresh
        });
        if !suppressed {
            keep.push(idx);
        }
    }
    keep
}
