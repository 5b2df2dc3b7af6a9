//! Drawing overlays onto images.
//!
//! The functions in this module return a guard object that performs the drawing operation when
//! dropped. The guards have builder methods to customize colors and other properties.

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::rect::Rect;

use super::{AsImageViewMut, Color, ImageViewMut};

/// Draws the outline of a rectangle.
pub fn rect<I: AsImageViewMut>(image: &mut I, rect: Rect) -> DrawRect<'_> {
    DrawRect {
        target: image.as_view_mut(),
        rect,
        color: Color::RED,
        stroke_width: 1,
    }
}

/// Draws a filled circular marker centered at a point.
pub fn marker<I: AsImageViewMut>(image: &mut I, x: i32, y: i32) -> DrawMarker<'_> {
    DrawMarker {
        target: image.as_view_mut(),
        x,
        y,
        color: Color::RED,
        diameter: 5,
    }
}

/// Draws a line between two points.
pub fn line<I: AsImageViewMut>(image: &mut I, x1: i32, y1: i32, x2: i32, y2: i32) -> DrawLine<'_> {
    DrawLine {
        target: image.as_view_mut(),
        start: Point::new(x1, y1),
        end: Point::new(x2, y2),
        color: Color::BLUE,
        stroke_width: 1,
    }
}

/// Draws a text string. By default the text is centered on the given point.
pub fn text<'a, I: AsImageViewMut>(image: &'a mut I, x: i32, y: i32, text: &str) -> DrawText<'a> {
    DrawText {
        target: image.as_view_mut(),
        x,
        y,
        text: text.to_string(),
        color: Color::RED,
        alignment: Alignment::Center,
    }
}

/// Guard returned by [`rect`].
pub struct DrawRect<'a> {
    target: ImageViewMut<'a>,
    rect: Rect,
    color: Color,
    stroke_width: u32,
}

impl DrawRect<'_> {
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawRect<'_> {
    fn drop(&mut self) {
        let top_left = Point::new(self.rect.x().round() as i32, self.rect.y().round() as i32);
        let size = Size::new(
            self.rect.width().round() as u32,
            self.rect.height().round() as u32,
        );
        let _ = Rectangle::new(top_left, size)
            .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
            .draw(&mut self.target);
    }
}

/// Guard returned by [`marker`].
pub struct DrawMarker<'a> {
    target: ImageViewMut<'a>,
    x: i32,
    y: i32,
    color: Color,
    diameter: u32,
}

impl DrawMarker<'_> {
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }
}

impl Drop for DrawMarker<'_> {
    fn drop(&mut self) {
        let _ = Circle::with_center(Point::new(self.x, self.y), self.diameter)
            .into_styled(PrimitiveStyle::with_fill(self.color))
            .draw(&mut self.target);
    }
}

/// Guard returned by [`line`].
pub struct DrawLine<'a> {
    target: ImageViewMut<'a>,
    start: Point,
    end: Point,
    color: Color,
    stroke_width: u32,
}

impl DrawLine<'_> {
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawLine<'_> {
    fn drop(&mut self) {
        let _ = Line::new(self.start, self.end)
            .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
            .draw(&mut self.target);
    }
}

/// Guard returned by [`text`].
pub struct DrawText<'a> {
    target: ImageViewMut<'a>,
    x: i32,
    y: i32,
    text: String,
    color: Color,
    alignment: Alignment,
}

impl DrawText<'_> {
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Aligns the left edge of the text with the given point.
    pub fn align_left(&mut self) -> &mut Self {
        self.alignment = Alignment::Left;
        self
    }
}

impl Drop for DrawText<'_> {
    fn drop(&mut self) {
        let style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Middle)
            .build();
        let _ = Text::with_text_style(
            &self.text,
            Point::new(self.x, self.y),
            MonoTextStyle::new(&FONT_6X10, self.color),
            style,
        )
        .draw(&mut self.target);
    }
}

#[cfg(test)]
mod tests {
    use crate::image::Image;

    use super::*;

    #[test]
    fn marker_fills_center() {
        let mut image = Image::new(9, 9);
        marker(&mut image, 4, 4).color(Color::GREEN);
        assert_eq!(image.get(4, 4), Color::GREEN);
        assert_eq!(image.get(0, 0), Color::NONE);
    }

    #[test]
    fn line_endpoints() {
        let mut image = Image::new(8, 8);
        line(&mut image, 1, 1, 6, 6).color(Color::WHITE);
        assert_eq!(image.get(1, 1), Color::WHITE);
        assert_eq!(image.get(6, 6), Color::WHITE);
        assert_eq!(image.get(7, 0), Color::NONE);
    }

    #[test]
    fn rect_strokes_edges_only() {
        let mut image = Image::new(8, 8);
        rect(&mut image, Rect::from_top_left(1.0, 1.0, 6.0, 6.0)).color(Color::RED);
        assert_eq!(image.get(1, 1), Color::RED);
        assert_eq!(image.get(3, 3), Color::NONE);
    }
}
