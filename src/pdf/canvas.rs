use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

use super::font::{Font, text_width, win_ansi};
use crate::core::InvoiceError;

/// Device RGB colour, components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub(crate) const fn hex(value: u32) -> Self {
        Self(
            ((value >> 16) & 0xff) as f32 / 255.0,
            ((value >> 8) & 0xff) as f32 / 255.0,
            (value & 0xff) as f32 / 255.0,
        )
    }

    fn operands(self) -> Vec<Object> {
        vec![Object::Real(self.0), Object::Real(self.1), Object::Real(self.2)]
    }
}

pub(crate) const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
pub(crate) const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
pub(crate) const GRAY: Rgb = Rgb(0.5, 0.5, 0.5);

/// Content operations of one page.
#[derive(Default)]
pub(crate) struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Left-aligned text with its baseline at `y`.
    pub(crate) fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), Object::Real(size)],
        ));
        self.ops.push(Operation::new("rg", color.operands()));
        self.ops
            .push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Text ending at `right`.
    pub(crate) fn text_right(&mut self, right: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let x = right - text_width(font, size, text);
        self.text(x, y, font, size, color, text);
    }

    /// Text centred on `center`.
    pub(crate) fn text_centered(&mut self, center: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let x = center - text_width(font, size, text) / 2.0;
        self.text(x, y, font, size, color, text);
    }

    pub(crate) fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("rg", color.operands()));
        self.ops.push(Operation::new(
            "re",
            vec![Object::Real(x), Object::Real(y), Object::Real(w), Object::Real(h)],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub(crate) fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb, line_width: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("RG", color.operands()));
        self.ops
            .push(Operation::new("w", vec![Object::Real(line_width)]));
        self.ops.push(Operation::new(
            "re",
            vec![Object::Real(x), Object::Real(y), Object::Real(w), Object::Real(h)],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Paint the image XObject `name` into the given box.
    pub(crate) fn image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(w),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(h),
                Object::Real(x),
                Object::Real(y),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub(crate) fn encode(self) -> Result<Vec<u8>, InvoiceError> {
        Content {
            operations: self.ops,
        }
        .encode()
        .map_err(|e| InvoiceError::Pdf(format!("content stream encoding failed: {e}")))
    }
}
