//! Page flow and the fixed tax-invoice sections.

use super::canvas::{BLACK, Canvas, GRAY, Rgb, WHITE};
use super::font::{Font, fit_width, wrap_text};
use crate::core::calc::numbered_lines;
use crate::core::format::{amount_2dp, money, percent_whole};
use crate::core::{BankDetails, DocumentSettings, Invoice, InvoiceAmounts};

pub(crate) const PAGE_WIDTH: f32 = 595.28;
pub(crate) const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 36.0;
const LEFT: f32 = MARGIN;
const RIGHT: f32 = PAGE_WIDTH - MARGIN;
const CONTENT_WIDTH: f32 = RIGHT - LEFT;
const TOP: f32 = PAGE_HEIGHT - MARGIN;
const BOTTOM: f32 = MARGIN;

const PRIMARY: Rgb = Rgb::hex(0x1a365d);
const ACCENT: Rgb = Rgb::hex(0x2b6cb0);
const BORDER: Rgb = Rgb::hex(0xe2e8f0);
const LIGHT_BG: Rgb = Rgb::hex(0xf7fafc);

const BODY: f32 = 9.0;
const LEADING: f32 = 11.0;
const SECTION_TITLE: f32 = 10.0;
const PAD: f32 = 8.0;

/// Name of the barcode XObject in the page resources.
pub(crate) const QR_IMAGE_NAME: &str = "Qr1";

/// Column headers and widths of the line table. Widths sum to the content width.
const COLUMNS: [(&str, f32); 6] = [
    ("Description", 209.28),
    ("Unit Price", 70.0),
    ("Qty", 52.0),
    ("VAT %", 52.0),
    ("VAT Amount", 70.0),
    ("Total", 70.0),
];
const HEADER_ROW: f32 = 20.0;
const ROW: f32 = 18.0;

/// Everything the sections print, resolved once.
pub(crate) struct Sheet<'a> {
    pub invoice: &'a Invoice,
    pub settings: &'a DocumentSettings,
    pub amounts: InvoiceAmounts,
    pub bank: BankDetails,
}

/// Vertical flow over A4 pages.
pub(crate) struct Layout {
    done: Vec<Canvas>,
    page: Canvas,
    y: f32,
}

impl Layout {
    pub(crate) fn new() -> Self {
        Self {
            done: Vec::new(),
            page: Canvas::new(),
            y: TOP,
        }
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height >= BOTTOM || self.y == TOP {
            return false;
        }
        self.break_page();
        true
    }

    fn break_page(&mut self) {
        let full = std::mem::take(&mut self.page);
        self.done.push(full);
        self.y = TOP;
    }

    /// Text lines a table row can hold between the cursor and the bottom margin.
    fn row_lines_fitting(&self) -> usize {
        let spare = self.y - BOTTOM - ROW;
        if spare < 0.0 { 1 } else { (spare / LEADING) as usize + 1 }
    }

    pub(crate) fn finish(mut self) -> Vec<Canvas> {
        self.done.push(self.page);
        self.done
    }
}

fn line(canvas: &mut Canvas, x: f32, y: f32, font: Font, text: &str, max_width: f32) {
    canvas.text(x, y, font, BODY, BLACK, &fit_width(font, BODY, text, max_width));
}

/// Wrap each entry to `max_width`; an empty entry keeps its blank line.
fn wrap_rows(rows: &[(Font, String)], max_width: f32) -> Vec<(Font, String)> {
    rows.iter()
        .flat_map(|(font, text)| {
            wrap_text(*font, BODY, text, max_width)
                .into_iter()
                .map(move |l| (*font, l))
        })
        .collect()
}

fn row_height(lines: usize) -> f32 {
    ROW + lines.saturating_sub(1) as f32 * LEADING
}

pub(crate) fn header(layout: &mut Layout, sheet: &Sheet<'_>) {
    let invoice = sheet.invoice;
    let issuer = &invoice.issuer;
    let top = layout.y;
    let page = &mut layout.page;

    let left_width = 320.0;
    let mut y = top - 12.0;
    for (i, name) in wrap_text(Font::Bold, 12.0, &issuer.name, left_width).iter().enumerate() {
        if i > 0 {
            y -= 14.0;
        }
        page.text(LEFT, y, Font::Bold, 12.0, PRIMARY, name);
    }
    y -= 14.0 - LEADING;
    let details = [
        (Font::Regular, format!("TRN: {}", issuer.trn())),
        (Font::Regular, format!("Emirate: {}", issuer.region().display_name())),
        (Font::Regular, format!("Phone: {}", issuer.phone())),
    ];
    for (font, text) in wrap_rows(&details, left_width) {
        y -= LEADING;
        page.text(LEFT, y, font, BODY, BLACK, &text);
    }
    let left_bottom = y - 8.0;

    let box_width = 194.0;
    let x = RIGHT - box_width;
    let value_x = x + 92.0;
    let rows = [
        ("Invoice #", invoice.number.clone()),
        ("Date", invoice.issue_date.format("%d %b %Y").to_string()),
        ("Place of Supply", invoice.place_of_supply.display_name().to_string()),
    ];
    let mut y = top - 42.0;
    for (label, value) in &rows {
        page.text(x + PAD, y, Font::Bold, BODY, BLACK, label);
        let wrapped = wrap_text(Font::Bold, BODY, value, RIGHT - PAD - value_x);
        for (i, text) in wrapped.iter().enumerate() {
            page.text(value_x, y - i as f32 * LEADING, Font::Bold, BODY, BLACK, text);
        }
        y -= 14.0 + (wrapped.len() - 1) as f32 * LEADING;
    }
    let box_height = (top - y).max(84.0);
    page.fill_rect(x, top - 26.0, box_width, 26.0, LIGHT_BG);
    page.stroke_rect(x, top - box_height, box_width, box_height, ACCENT, 1.0);
    page.text(x + PAD, top - 18.0, Font::Bold, 14.0, ACCENT, "TAX INVOICE");

    layout.y = (top - box_height).min(left_bottom) - 20.0;
}

pub(crate) fn parties(layout: &mut Layout, sheet: &Sheet<'_>) {
    let invoice = sheet.invoice;
    let client = &invoice.counterparty;
    let gap = 13.0;
    let box_width = (CONTENT_WIDTH - gap) / 2.0;

    let bill_to = [
        (Font::Bold, client.name.clone()),
        (Font::Regular, format!("TRN: {}", client.trn())),
        // the client block shows the place of supply, not a postal region
        (Font::Regular, format!("Emirate: {}", invoice.place_of_supply.display_name())),
        (Font::Regular, format!("Phone: {}", client.phone())),
        (Font::Regular, format!("Email: {}", client.email())),
    ];
    let payment = [
        (Font::Bold, format!("Bank: {}", sheet.bank.bank_name)),
        (Font::Regular, format!("Account: {}", sheet.bank.account_number)),
        (Font::Regular, format!("IBAN: {}", sheet.bank.iban)),
        (Font::Regular, String::new()),
        (Font::Regular, sheet.settings.payment_instruction.clone()),
    ];
    let columns = [
        (LEFT, "BILL TO", wrap_rows(&bill_to, box_width - 2.0 * PAD)),
        (LEFT + box_width + gap, "PAYMENT DETAILS", wrap_rows(&payment, box_width - 2.0 * PAD)),
    ];
    let most = columns.iter().map(|(_, _, rows)| rows.len()).max().unwrap_or(1);
    let box_height = (48.0 + most.saturating_sub(1) as f32 * 13.0).max(100.0);

    layout.ensure(box_height);
    let top = layout.y;
    let page = &mut layout.page;
    for (x, title, rows) in &columns {
        page.stroke_rect(*x, top - box_height, box_width, box_height, BORDER, 1.0);
        page.text(x + PAD, top - 18.0, Font::Bold, SECTION_TITLE, PRIMARY, title);
        for (i, (font, text)) in rows.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            page.text(x + PAD, top - 36.0 - i as f32 * 13.0, *font, BODY, BLACK, text);
        }
    }

    layout.y = top - box_height - 15.0;
}

fn table_header(layout: &mut Layout) {
    let top = layout.y;
    let page = &mut layout.page;
    page.fill_rect(LEFT, top - HEADER_ROW, CONTENT_WIDTH, HEADER_ROW, ACCENT);
    let mut x = LEFT;
    for (label, width) in COLUMNS {
        page.stroke_rect(x, top - HEADER_ROW, width, HEADER_ROW, BORDER, 0.5);
        page.text_centered(x + width / 2.0, top - 13.5, Font::Bold, BODY, WHITE, label);
        x += width;
    }
    layout.y = top - HEADER_ROW;
}

/// Draws lines `start..start + count` of every cell as one row.
fn table_row(layout: &mut Layout, cells: &[Vec<String>], start: usize, count: usize) {
    let top = layout.y;
    let height = row_height(count);
    let page = &mut layout.page;
    let mut x = LEFT;
    for (i, ((_, width), lines)) in COLUMNS.iter().zip(cells).enumerate() {
        page.stroke_rect(x, top - height, *width, height, BORDER, 0.5);
        for (j, text) in lines.iter().skip(start).take(count).enumerate() {
            let baseline = top - 12.5 - j as f32 * LEADING;
            if i == 0 {
                page.text(x + 4.0, baseline, Font::Regular, BODY, BLACK, text);
            } else {
                page.text_centered(x + width / 2.0, baseline, Font::Regular, BODY, BLACK, text);
            }
        }
        x += width;
    }
    layout.y = top - height;
}

/// Line table; continues on new pages with the header row repeated.
///
/// Cells wrap onto as many lines as they need. A row moves to the next page
/// whole when it fits there, otherwise it is split at the bottom margin.
pub(crate) fn line_table(layout: &mut Layout, sheet: &Sheet<'_>) {
    let currency = sheet.settings.currency_code.as_str();
    let fresh_page = TOP - HEADER_ROW - BOTTOM;
    layout.ensure(HEADER_ROW + ROW);
    table_header(layout);

    for (_, item, amounts) in numbered_lines(sheet.invoice.lines()) {
        let texts = [
            item.description.clone(),
            money(currency, item.unit_price),
            amount_2dp(item.quantity),
            percent_whole(item.vat_rate),
            money(currency, amounts.vat),
            money(currency, amounts.gross),
        ];
        let cells: Vec<Vec<String>> = COLUMNS
            .iter()
            .zip(&texts)
            .map(|((_, width), text)| wrap_text(Font::Regular, BODY, text, width - 8.0))
            .collect();
        let total = cells.iter().map(Vec::len).max().unwrap_or(1);

        let mut start = 0;
        while start < total {
            let height = row_height(total - start);
            let fits_here = layout.y - height >= BOTTOM;
            let no_room = layout.y - BOTTOM < ROW;
            if !fits_here && (height <= fresh_page || no_room) {
                layout.break_page();
                table_header(layout);
            }
            let count = (total - start).min(layout.row_lines_fitting());
            table_row(layout, &cells, start, count);
            start += count;
        }
    }

    layout.y -= 12.0;
}

pub(crate) fn totals(layout: &mut Layout, sheet: &Sheet<'_>) {
    let currency = sheet.settings.currency_code.as_str();
    let amounts = &sheet.amounts;
    let rows = [
        ("Subtotal:", amounts.subtotal, Font::Regular),
        ("VAT Total:", amounts.total_vat, Font::Regular),
        ("GRAND TOTAL:", amounts.grand_total, Font::Bold),
    ];
    let height = rows.len() as f32 * 16.0;
    layout.ensure(height);

    let top = layout.y;
    let label_right = RIGHT - 96.0;
    for (i, (label, value, font)) in rows.iter().enumerate() {
        let y = top - 12.0 - i as f32 * 16.0;
        layout.page.text_right(label_right, y, *font, 10.0, BLACK, label);
        layout
            .page
            .text_right(RIGHT, y, *font, 10.0, BLACK, &money(currency, *value));
    }
    layout.y = top - height - 15.0;
}

pub(crate) fn notes(layout: &mut Layout, sheet: &Sheet<'_>) {
    let lines = wrap_text(Font::Regular, BODY, &sheet.settings.notes, CONTENT_WIDTH - 2.0 * PAD);
    let height = 44.0 + (lines.len() - 1) as f32 * LEADING;
    layout.ensure(height);
    let top = layout.y;
    let page = &mut layout.page;
    page.stroke_rect(LEFT, top - height, CONTENT_WIDTH, height, BORDER, 1.0);
    page.text(LEFT + PAD, top - 16.0, Font::Bold, SECTION_TITLE, PRIMARY, "Notes");
    for (i, text) in lines.iter().enumerate() {
        page.text(LEFT + PAD, top - 32.0 - i as f32 * LEADING, Font::Regular, BODY, BLACK, text);
    }
    layout.y = top - height - 12.0;
}

/// `qr_size` is the printed side length of the barcode in points.
pub(crate) fn qr_block(layout: &mut Layout, sheet: &Sheet<'_>, qr_size: f32) {
    let height = 100.0;
    layout.ensure(height);
    let top = layout.y;
    let page = &mut layout.page;
    page.stroke_rect(LEFT, top - height, CONTENT_WIDTH, height, BORDER, 1.0);

    page.text(LEFT + PAD, top - 16.0, Font::Bold, SECTION_TITLE, PRIMARY, "Scan to Verify");
    page.image(QR_IMAGE_NAME, LEFT + 20.0, top - 24.0 - qr_size, qr_size, qr_size);

    let x = LEFT + 116.0;
    let width = RIGHT - PAD - x;
    page.text(x, top - 16.0, Font::Bold, SECTION_TITLE, PRIMARY, "Invoice UUID:");
    line(page, x, top - 30.0, Font::Regular, &sheet.invoice.uuid.hyphenated().to_string(), width);
    line(page, x, top - 50.0, Font::Regular, &sheet.settings.compliance_caption, width);

    layout.y = top - height - 15.0;
}

pub(crate) fn footer(layout: &mut Layout, sheet: &Sheet<'_>) {
    layout.ensure(24.0);
    let top = layout.y;
    let center = LEFT + CONTENT_WIDTH / 2.0;
    for (i, text) in [&sheet.settings.footer_disclaimer, &sheet.settings.footer_powered_by]
        .into_iter()
        .enumerate()
    {
        let text = fit_width(Font::Regular, 8.0, text, CONTENT_WIDTH);
        layout
            .page
            .text_centered(center, top - 10.0 - i as f32 * 10.0, Font::Regular, 8.0, GRAY, &text);
    }
    layout.y = top - 24.0;
}
