use std::fmt;

/// Resolution of an image or camera stream (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    ///
    /// # Panics
    ///
    /// Panics when `width` or `height` are zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width != 0 && height != 0,
            "attempted to create a resolution of {width}x{height}",
        );
        Self { width, height }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Aspect ratio of an image, stored as a reduced fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// Creates the aspect ratio `width:height`, reducing the fraction.
    ///
    /// # Panics
    ///
    /// Panics when `width` or `height` are zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width != 0 && height != 0,
            "attempted to create an aspect ratio of {width}:{height}",
        );
        let g = gcd(width, height);
        Self {
            width: width / g,
            height: height / g,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(4, 2), 2);
        assert_eq!(gcd(2, 4), 2);
        assert_eq!(gcd(9, 6), 3);
        assert_eq!(gcd(7, 13), 1);
    }

    #[test]
    fn aspect_ratio_reduces() {
        assert_eq!(Resolution::new(640, 480).aspect_ratio(), AspectRatio::new(4, 3));
        assert_eq!(AspectRatio::new(1920, 1080), AspectRatio::new(16, 9));
        assert_eq!(AspectRatio::new(16, 9).to_string(), "16:9");
    }
}
