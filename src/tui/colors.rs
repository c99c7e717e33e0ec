//! Color constants and conversions for the terminal user interface.

use ratatui::style::Color;

use crate::registry::DEFAULT_TAG_COLOR;

/// Highlight for the active form field and headers.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Background of destructive confirmations.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Focus card tint for priority 8 and up.
pub const FOCUS_RED: Color = Color::Rgb(254, 202, 202);
/// Focus card tint for priority 5 to 7.
pub const FOCUS_YELLOW: Color = Color::Rgb(255, 201, 0);
/// Focus card tint below priority 5.
pub const FOCUS_MINT: Color = Color::Rgb(144, 224, 239);
/// Dark text for light backgrounds.
pub const INK: Color = Color::Rgb(20, 20, 20);

/// Parse `#rrggbb` (or `#rgb`) into a terminal color.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#')?;
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Terminal color for a stored tag color, falling back to the default pink.
pub fn tag_color(hex: &str) -> Color {
    parse_hex(hex)
        .or_else(|| parse_hex(DEFAULT_TAG_COLOR))
        .unwrap_or(Color::Magenta)
}

/// Background of a focus card.
pub fn focus_tint(priority: u8) -> Color {
    match priority {
        8.. => FOCUS_RED,
        5..=7 => FOCUS_YELLOW,
        _ => FOCUS_MINT,
    }
}

/// Black or white, whichever reads better on `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        Color::Rgb(r, g, b) => {
            let luma = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
            if luma > 128_000 {
                INK
            } else {
                Color::White
            }
        }
        _ => Color::White,
    }
}
