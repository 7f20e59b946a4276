//! Raster buffers.
//!
//! `Raster<T>` owns a contiguous, row-major, channel-interleaved buffer. The
//! buffer length always equals `width * height * channels`; constructors
//! reject anything else, and every operation that produces a new raster goes
//! through the same checks.

use crate::util::{RasterError, RasterResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Number of interleaved channels per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channels {
    /// Single intensity channel.
    Gray,
    /// Three color channels in R, G, B order (or B, G, R after a swap).
    Rgb,
}

impl Channels {
    /// Returns the channel count.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }

    /// Maps a channel count to a layout.
    pub fn from_count(count: usize) -> RasterResult<Self> {
        match count {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            _ => Err(RasterError::InvalidInput {
                reason: "channel count must be 1 or 3",
            }),
        }
    }
}

/// Axis-aligned pixel rectangle; `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    /// Returns true when `(px, py)` lies inside the rectangle.
    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

/// Storage element type of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    U8,
    F32,
}

/// Element types a raster can hold.
pub trait Sample: Copy + Default + PartialOrd + Send + Sync + 'static {
    /// Element type tag.
    const ELEMENT: ElementType;

    /// Widens the element for arithmetic.
    fn to_f32(self) -> f32;

    /// Narrows an arithmetic result back to the element type.
    ///
    /// `u8` rounds and saturates; `f32` is the identity.
    fn from_f32(value: f32) -> Self;
}

impl Sample for u8 {
    const ELEMENT: ElementType = ElementType::U8;

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        crate::util::math::saturate_u8(value)
    }
}

impl Sample for f32 {
    const ELEMENT: ElementType = ElementType::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

/// Owned raster with explicit dimensions and channel layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    channels: Channels,
}

/// 8-bit raster, the format exchanged with collaborators.
pub type RasterU8 = Raster<u8>;
/// Floating-point raster used for signed or fractional intermediates.
pub type RasterF32 = Raster<f32>;

impl<T: Sample> Raster<T> {
    /// Wraps an existing buffer after validating its length.
    pub fn new(data: Vec<T>, width: usize, height: usize, channels: Channels) -> RasterResult<Self> {
        let needed = required_len(width, height, channels)?;
        if data.len() != needed {
            return Err(RasterError::InvalidInput {
                reason: "buffer length does not match width * height * channels",
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates a single-channel raster.
    pub fn gray(data: Vec<T>, width: usize, height: usize) -> RasterResult<Self> {
        Self::new(data, width, height, Channels::Gray)
    }

    /// Creates an interleaved three-channel raster.
    pub fn rgb(data: Vec<T>, width: usize, height: usize) -> RasterResult<Self> {
        Self::new(data, width, height, Channels::Rgb)
    }

    /// Creates a raster with every element set to `value`.
    pub fn filled(width: usize, height: usize, channels: Channels, value: T) -> RasterResult<Self> {
        let needed = required_len(width, height, channels)?;
        Ok(Self {
            data: vec![value; needed],
            width,
            height,
            channels,
        })
    }

    /// Builds a raster whose dimensions are already known to be valid.
    pub(crate) fn from_parts(data: Vec<T>, width: usize, height: usize, channels: Channels) -> Self {
        debug_assert_eq!(data.len(), width * height * channels.count());
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns the storage element type.
    pub fn element_type(&self) -> ElementType {
        T::ELEMENT
    }

    /// Returns the number of elements in one row.
    pub fn row_len(&self) -> usize {
        self.width * self.channels.count()
    }

    /// Returns the backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the raster and returns its buffer.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Returns the interleaved elements of row `y`.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let len = self.row_len();
        let start = y * len;
        self.data.get(start..start + len)
    }

    /// Returns channel `c` of the pixel at `(x, y)`.
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<T> {
        let cn = self.channels.count();
        if x >= self.width || y >= self.height || c >= cn {
            return None;
        }
        self.data.get((y * self.width + x) * cn + c).copied()
    }

    /// Returns all channels of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let cn = self.channels.count();
        let start = (y * self.width + x) * cn;
        self.data.get(start..start + cn)
    }

    /// Element-wise conversion to another raster with the same dimensions.
    pub fn map<U: Sample>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster::from_parts(
            self.data.iter().map(|&v| f(v)).collect(),
            self.width,
            self.height,
            self.channels,
        )
    }

    /// Widens every element to `f32`.
    pub fn to_f32(&self) -> RasterF32 {
        self.map(Sample::to_f32)
    }

    /// Returns a raster with the same dimensions and layout, filled with zero.
    pub(crate) fn zeros_like<U: Sample>(&self) -> Raster<U> {
        Raster::from_parts(
            vec![U::default(); self.data.len()],
            self.width,
            self.height,
            self.channels,
        )
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub(crate) fn ensure_gray(&self, name: &'static str) -> RasterResult<()> {
        if self.channels != Channels::Gray {
            return Err(RasterError::unsupported(name, "expected a single-channel raster"));
        }
        Ok(())
    }
}

impl RasterF32 {
    /// Narrows to 8 bits with rounding and saturation.
    pub fn to_u8_saturating(&self) -> RasterU8 {
        self.map(u8::from_f32)
    }
}

fn required_len(width: usize, height: usize, channels: Channels) -> RasterResult<usize> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidInput {
            reason: "raster dimensions must be positive",
        });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels.count()))
        .ok_or(RasterError::InvalidInput {
            reason: "raster dimensions overflow",
        })
}
