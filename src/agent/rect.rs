/// Axis-aligned bounding box in pixel coordinates, y increasing downward.
///
/// Stored as TLWH (top-left x, top-left y, width, height); detectors usually
/// report TLBR, see [`Rect::from_tlbr`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Bottom edge y. Lower on screen means closer under a flat-road view.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when every coordinate is finite and the box is not inverted.
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_center_and_bottom() {
        let rect = Rect::from_tlbr(280.0, 380.0, 360.0, 460.0);
        assert_eq!(rect.center(), (320.0, 420.0));
        assert_eq!(rect.bottom(), 460.0);
        assert_eq!(rect.area(), 6400.0);
    }

    #[test]
    fn test_well_formed() {
        assert!(Rect::from_tlbr(0.0, 0.0, 0.0, 0.0).is_well_formed());
        assert!(!Rect::from_tlbr(50.0, 0.0, 10.0, 10.0).is_well_formed());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, f32::INFINITY, 1.0).is_well_formed());
    }
}
