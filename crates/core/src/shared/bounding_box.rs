use serde::{Deserialize, Serialize};

/// Detector output box in frame coordinates, `[x1, y1, x2, y2]` corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    /// Truncates each corner toward zero, matching how integer pixel
    /// coordinates are taken from float detector output.
    pub fn to_pixels(self) -> PixelRect {
        PixelRect::new(
            self.x1 as i32,
            self.y1 as i32,
            self.x2 as i32,
            self.y2 as i32,
        )
    }
}

/// Integer pixel rectangle; the half-open span `[x1, x2) × [y1, y2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    /// Clamps to `[0, width] × [0, height]`. An inverted span collapses to
    /// zero size at its clamped start.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        let w = width as i32;
        let h = height as i32;
        let x1 = self.x1.clamp(0, w);
        let y1 = self.y1.clamp(0, h);
        let x2 = self.x2.clamp(0, w).max(x1);
        let y2 = self.y2.clamp(0, h).max(y1);
        PixelRect { x1, y1, x2, y2 }
    }
}
