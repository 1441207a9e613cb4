//! Tax-invoice PDF rendering.
//!
//! Pages are A4 with the built-in Helvetica fonts, so no font files are
//! embedded. Section order on the page:
//!
//! 1. issuer header and the boxed "TAX INVOICE" panel
//! 2. bill-to and payment-details boxes
//! 3. line table (header row repeated on continuation pages)
//! 4. right-aligned totals
//! 5. notes
//! 6. barcode with the invoice UUID
//! 7. footer
//!
//! All monetary figures come from the invoice lines, not from the totals
//! cached on the record.

mod canvas;
mod font;
mod layout;

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::core::*;
use crate::qr::FatooraFields;
use crate::qr::encode_tlv;
use crate::qr::image::{QrBitmap, render_luma};
use layout::{Layout, PAGE_HEIGHT, PAGE_WIDTH, QR_IMAGE_NAME, Sheet};

/// Printed side length of the barcode, in points.
const QR_SIZE: f32 = 65.0;

/// Render the tax-invoice PDF.
///
/// Fails when the Fatoora payload cannot be encoded (for instance a seller
/// name longer than 255 bytes) rather than printing an invalid barcode.
pub fn to_pdf(invoice: &Invoice, settings: &DocumentSettings) -> Result<Vec<u8>, InvoiceError> {
    let amounts = invoice.amounts();
    let tlv = encode_tlv(&FatooraFields::with_amounts(invoice, &amounts))?;
    let bitmap = render_luma(&tlv)?;

    let (bank, bank_source) = resolve_bank_details(invoice, settings);
    tracing::debug!(invoice = %invoice.number, source = ?bank_source, "bank details resolved");

    let sheet = Sheet {
        invoice,
        settings,
        amounts,
        bank,
    };
    let mut flow = Layout::new();
    layout::header(&mut flow, &sheet);
    layout::parties(&mut flow, &sheet);
    layout::line_table(&mut flow, &sheet);
    layout::totals(&mut flow, &sheet);
    layout::notes(&mut flow, &sheet);
    layout::qr_block(&mut flow, &sheet, QR_SIZE);
    layout::footer(&mut flow, &sheet);

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(font::Font::Regular));
    let bold_id = doc.add_object(font_dictionary(font::Font::Bold));
    let image_id = doc.add_object(image_stream(&bitmap));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            font::Font::Regular.resource_name() => Object::Reference(regular_id),
            font::Font::Bold.resource_name() => Object::Reference(bold_id),
        },
        "XObject" => dictionary! {
            QR_IMAGE_NAME => Object::Reference(image_id),
        },
    });

    let mut kids = Vec::new();
    for canvas in flow.finish() {
        let content_id = doc.add_object(Stream::new(dictionary! {}, canvas.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }
    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(format!("Tax Invoice {}", invoice.number)),
        "Producer" => Object::string_literal(settings.producer.as_str()),
        "CreationDate" => Object::string_literal(invoice.created_at.format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| InvoiceError::Pdf(format!("failed to save PDF: {e}")))?;

    tracing::debug!(
        invoice = %invoice.number,
        pages = page_count,
        bytes = output.len(),
        "invoice PDF generated"
    );
    Ok(output)
}

fn font_dictionary(font: font::Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn image_stream(bitmap: &QrBitmap) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => bitmap.width() as i64,
            "Height" => bitmap.height() as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        bitmap.as_raw().clone(),
    )
}
