//! Image manipulation and color types.
//!
//! [`Image`] owns an RGBA bitmap; [`ImageView`] and [`ImageViewMut`] borrow an axis-aligned
//! rectangular portion of one. Views may extend past the underlying image: reads outside of it
//! yield transparent black, writes are ignored.

pub mod draw;
mod jpeg;
mod resolution;

use std::fmt;

use embedded_graphics::{
    pixelcolor::{
        raw::{RawData, RawU32},
        PixelColor,
    },
    prelude::{OriginDimensions, Size},
    Pixel,
};
use image::{Rgba, RgbaImage};

pub use resolution::{AspectRatio, Resolution};

use crate::rect::Rect;

/// An 8-bit sRGB image with alpha channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    buf: RgbaImage,
}

impl Image {
    /// Decodes a JFIF JPEG or Motion JPEG frame.
    pub fn decode_jpeg(data: &[u8]) -> anyhow::Result<Self> {
        jpeg::decode_jpeg(data)
    }

    /// Creates an empty (transparent black) image of a given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: RgbaImage::new(width, height),
        }
    }

    /// Creates an image from raw, tightly packed RGBA8 data.
    ///
    /// # Panics
    ///
    /// Panics when `data` does not have exactly `res.width() * res.height() * 4` bytes.
    pub fn from_rgba8(res: Resolution, data: &[u8]) -> Self {
        let expected = res.width() as usize * res.height() as usize * 4;
        assert_eq!(data.len(), expected, "image data size mismatch");
        Self {
            buf: RgbaImage::from_raw(res.width(), res.height(), data.to_vec())
                .expect("failed to create image buffer"),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns a [`Rect`] covering the whole image area.
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0.0, 0.0, self.width() as f32, self.height() as f32)
    }

    /// Returns the raw, tightly packed RGBA8 pixel data.
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    /// Creates an immutable view into the area of `self` covered by `rect`.
    pub fn view(&self, rect: Rect) -> ImageView<'_> {
        ImageView {
            image: self,
            data: ViewData::from_rect(rect),
        }
    }

    /// Creates a mutable view into the area of `self` covered by `rect`.
    pub fn view_mut(&mut self, rect: Rect) -> ImageViewMut<'_> {
        ImageViewMut {
            data: ViewData::from_rect(rect),
            image: self,
        }
    }

    /// Returns the color of the pixel at the given coordinates.
    ///
    /// Out-of-bounds accesses return transparent black.
    pub fn get(&self, x: u32, y: u32) -> Color {
        if x >= self.width() || y >= self.height() {
            return Color::NONE;
        }
        let Rgba([r, g, b, a]) = *self.buf.get_pixel(x, y);
        Color::rgba8(r, g, b, a)
    }

    fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width() && y < self.height() {
            self.buf
                .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), color.a()]));
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image @ {}", self.resolution())
    }
}

/// The rectangle a view covers, in (rounded) pixel coordinates of the underlying image.
#[derive(Debug, Clone, Copy)]
struct ViewData {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

impl ViewData {
    fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x().round() as i64,
            y: rect.y().round() as i64,
            width: rect.width().round() as u32,
            height: rect.height().round() as u32,
        }
    }

    /// Restricts `self` to the part of it covered by `rect` (in view coordinates).
    fn subview(&self, rect: Rect) -> Self {
        let sub = Self::from_rect(rect);
        Self {
            x: self.x + sub.x,
            y: self.y + sub.y,
            width: sub.width,
            height: sub.height,
        }
    }

    /// Maps view coordinates to coordinates of the underlying image.
    ///
    /// Returns [`None`] when the resulting position lies outside of the image.
    fn image_coord(&self, image: &Image, x: u32, y: u32) -> Option<(u32, u32)> {
        let ix = self.x + i64::from(x);
        let iy = self.y + i64::from(y);
        if ix < 0 || iy < 0 || ix >= i64::from(image.width()) || iy >= i64::from(image.height()) {
            return None;
        }
        Some((ix as u32, iy as u32))
    }
}

/// An immutable, axis-aligned view into an [`Image`].
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    image: &'a Image,
    data: ViewData,
}

impl<'a> ImageView<'a> {
    #[inline]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns the color of a pixel in view coordinates.
    ///
    /// Parts of the view outside of the underlying image read as transparent black.
    pub fn get(&self, x: u32, y: u32) -> Color {
        match self.data.image_coord(self.image, x, y) {
            Some((ix, iy)) => self.image.get(ix, iy),
            None => Color::NONE,
        }
    }

    /// Creates a view into an area of this view.
    pub fn view(&self, rect: Rect) -> ImageView<'a> {
        ImageView {
            image: self.image,
            data: self.data.subview(rect),
        }
    }

    /// Copies the viewed pixels into a new [`Image`].
    pub fn to_image(&self) -> Image {
        let mut out = Image::new(self.width(), self.height());
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.set(x, y, self.get(x, y));
            }
        }
        out
    }
}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageView @ {}", self.resolution())
    }
}

/// A mutable, axis-aligned view into an [`Image`].
pub struct ImageViewMut<'a> {
    image: &'a mut Image,
    data: ViewData,
}

impl<'a> ImageViewMut<'a> {
    #[inline]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        match self.data.image_coord(self.image, x, y) {
            Some((ix, iy)) => self.image.get(ix, iy),
            None => Color::NONE,
        }
    }

    /// Sets a pixel in view coordinates. Writes outside of the underlying image are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some((ix, iy)) = self.data.image_coord(self.image, x, y) {
            self.image.set(ix, iy, color);
        }
    }

    pub fn reborrow(&mut self) -> ImageViewMut<'_> {
        ImageViewMut {
            image: self.image,
            data: self.data,
        }
    }
}

impl fmt::Debug for ImageViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageViewMut @ {}", self.resolution())
    }
}

/// Types that can be treated as read-only views of image data.
pub trait AsImageView {
    fn as_view(&self) -> ImageView<'_>;
}

/// Types that can be treated as mutable views of image data.
pub trait AsImageViewMut: AsImageView {
    fn as_view_mut(&mut self) -> ImageViewMut<'_>;
}

impl AsImageView for Image {
    fn as_view(&self) -> ImageView<'_> {
        self.view(self.rect())
    }
}

impl AsImageViewMut for Image {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        self.view_mut(self.rect())
    }
}

impl AsImageView for ImageView<'_> {
    fn as_view(&self) -> ImageView<'_> {
        *self
    }
}

impl AsImageView for ImageViewMut<'_> {
    fn as_view(&self) -> ImageView<'_> {
        ImageView {
            image: self.image,
            data: self.data,
        }
    }
}

impl AsImageViewMut for ImageViewMut<'_> {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        self.reborrow()
    }
}

impl<V: AsImageView> AsImageView for &V {
    fn as_view(&self) -> ImageView<'_> {
        (*self).as_view()
    }
}

impl<V: AsImageView> AsImageView for &mut V {
    fn as_view(&self) -> ImageView<'_> {
        (**self).as_view()
    }
}

impl<V: AsImageViewMut> AsImageViewMut for &mut V {
    fn as_view_mut(&mut self) -> ImageViewMut<'_> {
        (*self).as_view_mut()
    }
}

/// An 8-bit RGBA color, stored as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(u32);

impl Color {
    pub const NONE: Self = Self(0x00000000);
    pub const BLACK: Self = Self(0x000000ff);
    pub const WHITE: Self = Self(0xffffffff);
    pub const RED: Self = Self(0xff0000ff);
    pub const GREEN: Self = Self(0x00ff00ff);
    pub const BLUE: Self = Self(0x0000ffff);
    pub const YELLOW: Self = Self(0xffff00ff);

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba8(r, g, b, 0xff)
    }

    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    pub const fn r(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn g(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn b(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn a(&self) -> u8 {
        self.0 as u8
    }

    /// Returns the RGBA channel values in order.
    pub const fn channels(&self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }
}

impl PixelColor for Color {
    type Raw = RawU32;
}

impl From<RawU32> for Color {
    fn from(raw: RawU32) -> Self {
        Self(raw.into_inner())
    }
}

impl OriginDimensions for ImageViewMut<'_> {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl embedded_graphics::draw_target::DrawTarget for ImageViewMut<'_> {
    type Color = Color;
    type Error = std::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_reads_and_oob() {
        let mut image = Image::new(4, 4);
        image.set(1, 1, Color::RED);

        let view = image.view(Rect::from_top_left(1.0, 1.0, 2.0, 2.0));
        assert_eq!(view.get(0, 0), Color::RED);
        assert_eq!(view.get(1, 1), Color::NONE);

        // A view reaching past the image edge reads transparent black there.
        let view = image.view(Rect::from_top_left(3.0, 3.0, 4.0, 4.0));
        assert_eq!(view.get(2, 2), Color::NONE);
    }

    #[test]
    fn view_mut_ignores_oob_writes() {
        let mut image = Image::new(2, 2);
        let mut view = image.view_mut(Rect::from_top_left(1.0, 1.0, 4.0, 4.0));
        view.set(0, 0, Color::GREEN);
        view.set(3, 3, Color::GREEN); // outside of the image, ignored
        assert_eq!(image.get(1, 1), Color::GREEN);
        assert_eq!(image.get(0, 0), Color::NONE);
    }

    #[test]
    fn subview_offsets_compose() {
        let mut image = Image::new(8, 8);
        image.set(5, 5, Color::BLUE);
        let outer = image.view(Rect::from_top_left(2.0, 2.0, 6.0, 6.0));
        let inner = outer.view(Rect::from_top_left(3.0, 3.0, 2.0, 2.0));
        assert_eq!(inner.get(0, 0), Color::BLUE);
    }

    #[test]
    fn color_channels() {
        let color = Color::rgba8(1, 2, 3, 4);
        assert_eq!(color.r(), 1);
        assert_eq!(color.g(), 2);
        assert_eq!(color.b(), 3);
        assert_eq!(color.a(), 4);
    }
}
