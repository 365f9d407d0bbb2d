//! Drawing surface capability and primitive helpers.
//!
//! The panel driver is an external collaborator. Anything that implements an
//! embedded-graphics `DrawTarget<Color = BinaryColor>` and can push a finished
//! frame to the glass implements [`Surface`]. The helpers below are the small
//! vocabulary the states draw with.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

/// A monochrome display the states render onto.
pub trait Surface: DrawTarget<Color = BinaryColor> {
    /// Push everything drawn since the last call to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;

    /// Whether a panel answered on the bus. Checked once at startup.
    fn probe(&mut self) -> bool {
        true
    }
}

/// Width and height of the drawable area.
pub fn surface_size<D: DrawTarget<Color = BinaryColor>>(display: &D) -> Size {
    display.bounding_box().size
}

/// Blank the whole surface.
pub fn clear<D: DrawTarget<Color = BinaryColor>>(display: &mut D) -> Result<(), D::Error> {
    display.clear(BinaryColor::Off)
}

/// Draw `text` with its top-left corner at `top_left`.
///
/// Inverted text is drawn in background ink, for use on top of a filled bar.
pub fn draw_text<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    text: &str,
    top_left: Point,
    font: &MonoFont<'_>,
    invert: bool,
) -> Result<(), D::Error> {
    let ink = if invert {
        BinaryColor::Off
    } else {
        BinaryColor::On
    };
    let style = MonoTextStyleBuilder::new()
        .font(font)
        .text_color(ink)
        .build();
    Text::with_baseline(text, top_left, style, Baseline::Top).draw(display)?;
    Ok(())
}

/// Outline a rectangle with a 1 px stroke.
pub fn draw_rect<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    area: Rectangle,
) -> Result<(), D::Error> {
    area.into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)
}

/// Fill a rectangle with `color`.
pub fn fill_rect<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    area: Rectangle,
    color: BinaryColor,
) -> Result<(), D::Error> {
    display.fill_solid(&area, color)
}

/// Set a single pixel.
pub fn draw_pixel<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    point: Point,
) -> Result<(), D::Error> {
    Pixel(point, BinaryColor::On).draw(display)
}

/// Rendered width of `text` in `font`, in pixels.
pub fn text_width(text: &str, font: &MonoFont<'_>) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * font.character_size.width + (chars - 1) * font.character_spacing
}
