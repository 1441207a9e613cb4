//! Standard-14 Helvetica metrics and WinAnsi text encoding.

use std::borrow::Cow;

/// Built-in fonts referenced from the page resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
}

impl Font {
    pub(crate) fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    pub(crate) fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &HELVETICA,
            Self::Bold => &HELVETICA_BOLD,
        }
    }

    fn fallback_width(self) -> u16 {
        match self {
            Self::Regular => 556,
            Self::Bold => 611,
        }
    }
}

// Glyph widths for U+0020..=U+007E, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const ELLIPSIS: char = '\u{2026}';

fn char_width(font: Font, ch: char) -> u16 {
    match ch {
        ' '..='~' => font.widths()[ch as usize - 0x20],
        ELLIPSIS => 1000,
        _ => font.fallback_width(),
    }
}

/// Rendered width of `text` in points.
pub(crate) fn text_width(font: Font, size: f32, text: &str) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(font, ch))).sum();
    units as f32 * size / 1000.0
}

/// `text` unchanged when it fits `max_width`, otherwise the longest prefix
/// that fits together with a trailing ellipsis.
pub(crate) fn fit_width(font: Font, size: f32, text: &str, max_width: f32) -> Cow<'_, str> {
    if text_width(font, size, text) <= max_width {
        return Cow::Borrowed(text);
    }
    let budget = max_width - text_width(font, size, "\u{2026}");
    let mut used = 0.0;
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let w = f32::from(char_width(font, ch)) * size / 1000.0;
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + ch.len_utf8();
    }
    Cow::Owned(format!("{}{ELLIPSIS}", text[..end].trim_end()))
}

/// Greedy word wrap of `text` into lines no wider than `max_width`.
///
/// Words wider than a whole line are split between characters, so no text
/// is dropped. Always yields at least one (possibly empty) line.
pub(crate) fn wrap_text(font: Font, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let space = text_width(font, size, " ");
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0.0;

    for word in text.split_whitespace() {
        let width = text_width(font, size, word);
        let needed = if current.is_empty() { width } else { used + space + width };
        if needed <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            used = needed;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            used = 0.0;
        }
        if width <= max_width {
            current.push_str(word);
            used = width;
            continue;
        }
        for ch in word.chars() {
            let w = f32::from(char_width(font, ch)) * size / 1000.0;
            if !current.is_empty() && used + w > max_width {
                lines.push(std::mem::take(&mut current));
                used = 0.0;
            }
            current.push(ch);
            used += w;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode to WinAnsi (CP-1252). Characters outside it become `?`.
pub(crate) fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' | '\u{a0}'..='\u{ff}' => ch as u8,
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            _ => b'?',
        })
        .collect()
}
