use serde::{Deserialize, Serialize};
use slate_core::{BoundingBox, Point};

/// The camera-visible region of the canvas.
///
/// `x`/`y` is the top-left corner and `width`/`height` the extent, all in
/// world coordinates. `scale` is the zoom factor (1.0 = 100%). The camera
/// controller owns and mutates this; the render pipeline only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f64>,
}

impl Viewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64, scale: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale,
            min_scale: None,
            max_scale: None,
        }
    }

    /// Build a viewport from a screen-sized canvas: the world extent is the
    /// canvas size divided by the zoom factor.
    pub fn from_screen(x: f64, y: f64, canvas_width: f64, canvas_height: f64, scale: f64) -> Self {
        let zoom = if scale > 0.0 { scale } else { 1.0 };
        Self::new(x, y, canvas_width / zoom, canvas_height / zoom, scale)
    }

    pub fn with_scale_limits(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = Some(min_scale);
        self.max_scale = Some(max_scale);
        self
    }

    /// Zoom factor clamped to the optional limits.
    pub fn clamped_scale(&self) -> f64 {
        let mut scale = self.scale;
        if let Some(min) = self.min_scale {
            scale = scale.max(min);
        }
        if let Some(max) = self.max_scale {
            scale = scale.min(max);
        }
        scale
    }

    /// Visible rectangle in world coordinates.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    /// Visible rectangle grown by `padding` on every side.
    pub fn padded_bounds(&self, padding: f64) -> BoundingBox {
        self.bounds().expand(padding)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.scale.is_finite()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1000.0, 1000.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bounds() {
        let vp = Viewport::new(0.0, 0.0, 1000.0, 1000.0, 1.0);
        let padded = vp.padded_bounds(200.0);
        assert_eq!(padded, BoundingBox::new(-200.0, -200.0, 1400.0, 1400.0));
        assert_eq!(vp.center(), Point::new(500.0, 500.0));
    }

    #[test]
    fn test_from_screen_divides_by_zoom() {
        let vp = Viewport::from_screen(10.0, 20.0, 800.0, 600.0, 2.0);
        assert_eq!(vp.width, 400.0);
        assert_eq!(vp.height, 300.0);
    }

    #[test]
    fn test_clamped_scale() {
        let vp = Viewport::new(0.0, 0.0, 10.0, 10.0, 0.01).with_scale_limits(0.05, 8.0);
        assert_eq!(vp.clamped_scale(), 0.05);
        let vp = Viewport { scale: 20.0, ..vp };
        assert_eq!(vp.clamped_scale(), 8.0);
    }

    #[test]
    fn test_json_shape() {
        let vp: Viewport =
            serde_json::from_str(r#"{"x":0,"y":0,"width":1000,"height":1000,"scale":1}"#).unwrap();
        assert_eq!(vp, Viewport::default());
    }
}
