//! Decoded pixels and frames.

use std::fmt::{Display, Formatter};

/// One decoded pixel. Red comes from channel 2, green from channel 1 and
/// blue from channel 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Geometry of a frame closed by a vertical sync rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBoundary {
    /// Frame counter value after the edge.
    pub index: usize,
    /// Declared line width (active dots).
    pub width: usize,
    /// Active lines seen since the previous edge.
    pub height: usize,
    /// The frame started before the first observed vertical sync.
    pub partial: bool,
}

/// A frame buffer handed out by the validator.
///
/// Pixels are in raster order. `pixels.len()` equals `width * height` unless
/// the stream was noncompliant, see [`Frame::is_complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>,
}

impl Frame {
    /// A geometry whose pixel count overflows `usize` is never complete.
    pub fn is_complete(&self) -> bool {
        self.width.checked_mul(self.height) == Some(self.pixels.len())
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Returns the row `y`, or `None` past the last complete row.
    pub fn row(&self, y: usize) -> Option<&[Pixel]> {
        let start = y.checked_mul(self.width)?;
        self.pixels.get(start..start.checked_add(self.width)?)
    }

    /// Packed RGB bytes in raster order.
    pub fn rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_bytes()).collect()
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {} {}x{}", self.index, self.width, self.height)
    }
}

#[test]
fn frame_rows() {
    let frame = Frame {
        index: 3,
        width: 2,
        height: 2,
        pixels: vec![
            Pixel::new(1, 2, 3),
            Pixel::new(4, 5, 6),
            Pixel::new(7, 8, 9),
            Pixel::new(10, 11, 12),
        ],
    };

    assert!(frame.is_complete());
    assert_eq!(frame.row(1).unwrap(), &frame.pixels[2..]);
    assert_eq!(frame.row(2), None);
    assert_eq!(&frame.rgb_bytes()[..6], &[1, 2, 3, 4, 5, 6]);
    assert_eq!(format!("{frame}"), "Frame 3 2x2");
}

#[test]
fn frame_overflowing_geometry() {
    let frame = Frame {
        index: 1,
        width: usize::MAX,
        height: 2,
        pixels: vec![Pixel::default(); 3],
    };

    assert!(!frame.is_complete());
    assert_eq!(frame.row(0), None);
    assert_eq!(frame.row(1), None);
}
