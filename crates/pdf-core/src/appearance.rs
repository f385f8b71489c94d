//! Text field appearance streams
//!
//! Filled values are drawn with the base-14 Helvetica font so the output
//! needs no embedded font program. Widths come from the Helvetica AFM.

use crate::Align;

/// Resource name used for Helvetica inside appearance streams
pub const APPEARANCE_FONT: &str = "Helv";

/// Font size used when `/DA` asks for auto sizing (0) and nothing fits better
const DEFAULT_FONT_SIZE: f64 = 10.0;

/// Inner padding between the widget border and the text
const PADDING: f64 = 2.0;

/// Helvetica advance widths for 0x20..=0x7E, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

/// Width of a string in points when set in Helvetica
pub fn helvetica_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize] as u32,
            _ => 556,
        })
        .sum();
    units as f64 * font_size / 1000.0
}

/// Everything needed to draw one widget's value
#[derive(Debug, Clone, PartialEq)]
pub struct TextAppearance {
    /// Widget width in points
    pub width: f64,
    /// Widget height in points
    pub height: f64,
    /// Font size from `/DA` (0 = auto)
    pub font_size: f64,
    /// Fill color from `/DA` (gray or RGB, 0.0 - 1.0)
    pub color: [f64; 3],
    /// Quadding
    pub align: Align,
    /// Cell count for comb fields
    pub comb: Option<usize>,
}

impl TextAppearance {
    /// Appearance for a widget rectangle with default styling
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            font_size: 0.0,
            color: [0.0, 0.0, 0.0],
            align: Align::Left,
            comb: None,
        }
    }

    /// Apply the font size and color of a default appearance string
    ///
    /// Understands the `Tf`, `g` and `rg` operators, e.g. `/Helv 9 Tf 0 g`.
    pub fn with_default_appearance(mut self, da: &str) -> Self {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        for (i, token) in tokens.iter().enumerate() {
            let operand = |back: usize| -> Option<f64> {
                i.checked_sub(back)
                    .and_then(|j| tokens.get(j))
                    .and_then(|t| t.parse().ok())
            };
            match *token {
                "Tf" => {
                    if let Some(size) = operand(1) {
                        self.font_size = size;
                    }
                }
                "g" => {
                    if let Some(gray) = operand(1) {
                        self.color = [gray, gray, gray];
                    }
                }
                "rg" => {
                    if let (Some(r), Some(g), Some(b)) = (operand(3), operand(2), operand(1)) {
                        self.color = [r, g, b];
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// Font size actually used for `text`
    ///
    /// Auto size fits the height, then shrinks until the text fits the width.
    pub fn effective_font_size(&self, text: &str) -> f64 {
        if self.font_size > 0.0 {
            return self.font_size;
        }
        let mut size = ((self.height - 2.0 * PADDING) * 0.8).clamp(4.0, 12.0);
        if self.height <= 0.0 {
            size = DEFAULT_FONT_SIZE;
        }
        let available = self.width - 2.0 * PADDING;
        let width = match self.comb {
            Some(cells) if cells > 0 => {
                let widest = text
                    .chars()
                    .map(|c| helvetica_width(&c.to_string(), size))
                    .fold(0.0, f64::max);
                widest * cells as f64
            }
            _ => helvetica_width(text, size),
        };
        if width > available && width > 0.0 && available > 0.0 {
            size = (size * available / width).max(4.0);
        }
        size
    }

    /// Generate the content stream for `text`
    ///
    /// The stream is wrapped in `/Tx BMC ... EMC` and clipped to the widget.
    pub fn content(&self, text: &str) -> Vec<u8> {
        let size = self.effective_font_size(text);
        let baseline = ((self.height - size * 0.72) / 2.0).max(0.0);
        let [r, g, b] = self.color;

        let mut ops = Vec::new();
        ops.extend_from_slice(b"/Tx BMC\nq\n");
        ops.extend_from_slice(
            format!(
                "{} {} {} {} re W n\n",
                fmt(1.0),
                fmt(1.0),
                fmt(self.width - 2.0),
                fmt(self.height - 2.0)
            )
            .as_bytes(),
        );
        ops.extend_from_slice(b"BT\n");
        ops.extend_from_slice(format!("/{APPEARANCE_FONT} {} Tf\n", fmt(size)).as_bytes());
        ops.extend_from_slice(format!("{} {} {} rg\n", fmt(r), fmt(g), fmt(b)).as_bytes());

        match self.comb {
            Some(cells) if cells > 0 => {
                let cell = self.width / cells as f64;
                let mut previous = 0.0;
                for (i, ch) in text.chars().take(cells).enumerate() {
                    let glyph = ch.to_string();
                    let x = i as f64 * cell + (cell - helvetica_width(&glyph, size)) / 2.0;
                    let y = if i == 0 { baseline } else { 0.0 };
                    ops.extend_from_slice(format!("{} {} Td\n", fmt(x - previous), fmt(y)).as_bytes());
                    push_shown_text(&mut ops, &glyph);
                    previous = x;
                }
            }
            _ => {
                let text_width = helvetica_width(text, size);
                let x = match self.align {
                    Align::Left => PADDING,
                    Align::Center => (self.width - text_width) / 2.0,
                    Align::Right => self.width - PADDING - text_width,
                };
                ops.extend_from_slice(format!("{} {} Td\n", fmt(x), fmt(baseline)).as_bytes());
                push_shown_text(&mut ops, text);
            }
        }

        ops.extend_from_slice(b"ET\nQ\nEMC\n");
        ops
    }
}

/// Append `(text) Tj`, encoding to WinAnsi and escaping delimiters
fn push_shown_text(ops: &mut Vec<u8>, text: &str) {
    ops.push(b'(');
    for byte in encode_win_ansi(text) {
        if matches!(byte, b'(' | b')' | b'\\') {
            ops.push(b'\\');
        }
        ops.push(byte);
    }
    ops.extend_from_slice(b") Tj\n");
}

/// Encode to WinAnsiEncoding; characters outside it become `?`
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            0x20AC => 0x80,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            _ => b'?',
        })
        .collect()
}

/// Format a number compactly for content streams
fn fmt(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
