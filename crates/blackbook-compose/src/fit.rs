//! Media fitter: scale pixel dimensions into a bounding box in inches

use blackbook_ooxml::inches_to_emu;
use serde::{Deserialize, Serialize};

/// Bounding box for embedded pictures, in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBox {
    pub max_width_in: f64,
    pub max_height_in: f64,
}

impl Default for ImageBox {
    fn default() -> Self {
        Self {
            max_width_in: 6.2,
            max_height_in: 8.0,
        }
    }
}

/// Fitted display size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FittedSize {
    /// Width in EMUs
    pub fn width_emu(&self) -> i64 {
        inches_to_emu(self.width_in)
    }

    /// Height in EMUs
    pub fn height_emu(&self) -> i64 {
        inches_to_emu(self.height_in)
    }
}

impl ImageBox {
    /// Fit a `width_px` x `height_px` picture.
    ///
    /// Starts at full box width; if the resulting height overflows, clamps
    /// height instead. Degenerate sizes fill the box.
    pub fn fit(&self, width_px: u32, height_px: u32) -> FittedSize {
        if width_px == 0 || height_px == 0 {
            return FittedSize {
                width_in: self.max_width_in,
                height_in: self.max_height_in,
            };
        }

        let aspect = f64::from(width_px) / f64::from(height_px);
        let mut width_in = self.max_width_in;
        let mut height_in = width_in / aspect;
        if height_in > self.max_height_in {
            height_in = self.max_height_in;
            width_in = (height_in * aspect).min(self.max_width_in);
        }
        FittedSize {
            width_in,
            height_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_landscape_fills_width() {
        let size = ImageBox::default().fit(1600, 900);
        assert!(close(size.width_in, 6.2));
        assert!(close(size.height_in, 3.4875));
    }

    #[test]
    fn test_portrait_clamped_by_height() {
        let size = ImageBox::default().fit(900, 1600);
        assert!(close(size.width_in, 4.5));
        assert!(close(size.height_in, 8.0));
    }

    #[test]
    fn test_degenerate_fills_box() {
        let size = ImageBox::default().fit(0, 500);
        assert_eq!((size.width_in, size.height_in), (6.2, 8.0));
        let size = ImageBox::default().fit(500, 0);
        assert_eq!((size.width_in, size.height_in), (6.2, 8.0));
    }

    #[test]
    fn test_never_exceeds_box() {
        let bounds = ImageBox {
            max_width_in: 3.0,
            max_height_in: 2.0,
        };
        for (w, h) in [(1, 1), (1, 10000), (10000, 1), (333, 777), (1920, 1080), (7, 3)] {
            let size = bounds.fit(w, h);
            assert!(size.width_in <= 3.0 + 1e-9, "{w}x{h}");
            assert!(size.height_in <= 2.0 + 1e-9, "{w}x{h}");
        }
    }

    #[test]
    fn test_emu_conversion() {
        let size = ImageBox::default().fit(1600, 900);
        assert_eq!(size.width_emu(), 5669280);
        assert_eq!(size.height_emu(), 3188970);
    }
}
