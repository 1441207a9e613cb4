use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;

use super::xml_writer::{XmlResult, XmlWriter};
use super::{QR_DOCUMENT_ID, SIGNATURE_ID, ubl_ns};
use crate::core::calc::numbered_lines;
use crate::core::format::percent_2dp;
use crate::core::*;
use crate::qr::FatooraFields;
use crate::qr::image::fatoora_png;

/// Party data as written into a UBL party block.
struct PartyView<'a> {
    trn: &'a str,
    name: &'a str,
    street: &'a str,
    region: &'a Emirate,
    email: Option<&'a str>,
    phone: Option<&'a str>,
}

/// Generate a UBL 2.1 Invoice document from an invoice.
///
/// Every amount is derived from the invoice lines; totals cached on the
/// record are not consulted. When the barcode attachment cannot be produced
/// the `AdditionalDocumentReference` is left out and a warning is logged.
pub fn to_ubl_xml(invoice: &Invoice, settings: &DocumentSettings) -> XmlResult {
    let amounts = invoice.amounts();
    let currency = settings.currency_code.as_str();
    let mut w = XmlWriter::new()?;

    w.start_element_with_attrs(
        "Invoice",
        &[
            ("xmlns", ubl_ns::INVOICE),
            ("xmlns:cac", ubl_ns::CAC),
            ("xmlns:cbc", ubl_ns::CBC),
            ("xmlns:ext", ubl_ns::EXT),
        ],
    )?;

    w.text_element("cbc:CustomizationID", &settings.customization_id)?;
    w.text_element("cbc:ProfileID", &settings.profile_id)?;
    w.text_element("cbc:ID", &invoice.number)?;
    w.text_element("cbc:UUID", &invoice.uuid.hyphenated().to_string())?;
    w.text_element("cbc:IssueDate", &invoice.issue_date.format("%Y-%m-%d").to_string())?;
    if let Some(time) = &invoice.issue_time {
        w.text_element("cbc:IssueTime", &time.format("%H:%M:%S").to_string())?;
    }
    if let Some(due) = &invoice.due_date {
        w.text_element("cbc:DueDate", &due.format("%Y-%m-%d").to_string())?;
    }
    w.text_element("cbc:InvoiceTypeCode", &settings.invoice_type_code)?;
    w.text_element("cbc:DocumentCurrencyCode", currency)?;

    if let Some(order) = &invoice.order_reference {
        w.start_element("cac:OrderReference")?;
        w.text_element("cbc:ID", order)?;
        w.end_element("cac:OrderReference")?;
    }

    let issuer = &invoice.issuer;
    let issuer_region = issuer.region();
    write_party(
        &mut w,
        "cac:AccountingSupplierParty",
        &PartyView {
            trn: issuer.trn(),
            name: &issuer.name,
            street: issuer.address(),
            region: &issuer_region,
            email: issuer.email.as_deref(),
            phone: issuer.phone.as_deref(),
        },
        settings,
    )?;

    // the customer's postal region is the place of supply
    let client = &invoice.counterparty;
    write_party(
        &mut w,
        "cac:AccountingCustomerParty",
        &PartyView {
            trn: client.trn(),
            name: &client.name,
            street: client.address(),
            region: &invoice.place_of_supply,
            email: client.email.as_deref(),
            phone: client.phone.as_deref(),
        },
        settings,
    )?;

    w.start_element("cac:PaymentMeans")?;
    w.text_element("cbc:PaymentMeansCode", &settings.payment_means_code)?;
    w.end_element("cac:PaymentMeans")?;

    let terms = invoice
        .due_date
        .map(|due| format!("Due on {}", due.format("%Y-%m-%d")))
        .unwrap_or_default();
    w.start_element("cac:PaymentTerms")?;
    w.text_element("cbc:Note", &terms)?;
    w.end_element("cac:PaymentTerms")?;

    let document_rate = invoice
        .lines()
        .first()
        .map_or(settings.default_vat_rate, |line| line.vat_rate);
    write_tax_total(&mut w, amounts.subtotal, amounts.total_vat, document_rate, settings)?;

    for (idx, line, line_amounts) in numbered_lines(invoice.lines()) {
        w.start_element("cac:InvoiceLine")?;
        w.text_element("cbc:ID", &idx.to_string())?;
        w.quantity_element("cbc:InvoicedQuantity", line.quantity, &settings.unit_code)?;
        w.amount_element("cbc:LineExtensionAmount", line_amounts.net, currency)?;

        w.start_element("cac:Item")?;
        w.text_element("cbc:Description", &line.description)?;
        w.end_element("cac:Item")?;

        w.start_element("cac:Price")?;
        w.amount_element("cbc:PriceAmount", line.unit_price, currency)?;
        w.end_element("cac:Price")?;

        write_tax_total(&mut w, line_amounts.net, line_amounts.vat, line.vat_rate, settings)?;
        w.end_element("cac:InvoiceLine")?;
    }

    w.start_element("cac:LegalMonetaryTotal")?;
    w.amount_element("cbc:LineExtensionAmount", amounts.subtotal, currency)?;
    w.amount_element("cbc:TaxExclusiveAmount", amounts.subtotal, currency)?;
    w.amount_element("cbc:TaxInclusiveAmount", amounts.grand_total, currency)?;
    w.amount_element("cbc:PayableAmount", amounts.grand_total, currency)?;
    w.end_element("cac:LegalMonetaryTotal")?;

    match qr_attachment(invoice, &amounts) {
        Ok(png_b64) => {
            w.start_element("cac:AdditionalDocumentReference")?;
            w.text_element("cbc:ID", QR_DOCUMENT_ID)?;
            w.start_element("cac:Attachment")?;
            w.text_element_with_attrs(
                "cbc:EmbeddedDocumentBinaryObject",
                &png_b64,
                &[("mimeCode", "image/png"), ("encodingCode", "Base64")],
            )?;
            w.end_element("cac:Attachment")?;
            w.end_element("cac:AdditionalDocumentReference")?;
        }
        Err(e) => {
            tracing::warn!(
                invoice = %invoice.number,
                uuid = %invoice.uuid,
                error = %e,
                "QR attachment omitted from UBL invoice"
            );
        }
    }

    write_signature_extension(&mut w, invoice)?;

    w.end_element("Invoice")?;
    let xml = w.into_string()?;
    tracing::debug!(invoice = %invoice.number, bytes = xml.len(), "UBL invoice generated");
    Ok(xml)
}

/// Base64 PNG of the invoice's Fatoora barcode.
pub fn qr_attachment(invoice: &Invoice, amounts: &InvoiceAmounts) -> Result<String, QrError> {
    let png = fatoora_png(&FatooraFields::with_amounts(invoice, amounts))?;
    Ok(STANDARD.encode(png))
}

fn write_party(
    w: &mut XmlWriter,
    wrapper: &str,
    party: &PartyView<'_>,
    settings: &DocumentSettings,
) -> Result<(), InvoiceError> {
    w.start_element(wrapper)?;
    w.start_element("cac:Party")?;

    w.start_element("cac:PartyIdentification")?;
    w.text_element("cbc:ID", party.trn)?;
    w.end_element("cac:PartyIdentification")?;

    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", party.name)?;
    w.end_element("cac:PartyName")?;

    w.start_element("cac:PostalAddress")?;
    w.text_element("cbc:StreetName", party.street)?;
    w.text_element("cbc:CityName", party.region.display_name())?;
    w.text_element("cbc:CountrySubentityCode", &party.region.subentity_code())?;
    w.start_element("cac:Country")?;
    w.text_element("cbc:IdentificationCode", &settings.country_code)?;
    w.end_element("cac:Country")?;
    w.end_element("cac:PostalAddress")?;

    let email = party.email.filter(|v| !v.trim().is_empty());
    let phone = party.phone.filter(|v| !v.trim().is_empty());
    if email.is_some() || phone.is_some() {
        w.start_element("cac:Contact")?;
        if let Some(email) = email {
            w.text_element("cbc:ElectronicMail", email)?;
        }
        if let Some(phone) = phone {
            w.text_element("cbc:Telephone", phone)?;
        }
        w.end_element("cac:Contact")?;
    }

    w.end_element("cac:Party")?;
    w.end_element(wrapper)?;
    Ok(())
}

fn write_tax_total(
    w: &mut XmlWriter,
    taxable: Decimal,
    tax: Decimal,
    rate: Decimal,
    settings: &DocumentSettings,
) -> Result<(), InvoiceError> {
    let currency = settings.currency_code.as_str();
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", tax, currency)?;
    w.start_element("cac:TaxSubtotal")?;
    w.amount_element("cbc:TaxableAmount", taxable, currency)?;
    w.amount_element("cbc:TaxAmount", tax, currency)?;
    w.start_element("cac:TaxCategory")?;
    w.text_element("cbc:ID", &settings.tax_category)?;
    w.text_element("cbc:Percent", &percent_2dp(rate))?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:ID", &settings.tax_scheme)?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:TaxCategory")?;
    w.end_element("cac:TaxSubtotal")?;
    w.end_element("cac:TaxTotal")?;
    Ok(())
}

/// Placeholder signature metadata keyed by the invoice UUID.
fn write_signature_extension(w: &mut XmlWriter, invoice: &Invoice) -> Result<(), InvoiceError> {
    w.start_element("ext:UBLExtensions")?;
    w.start_element("ext:UBLExtension")?;
    w.start_element("ext:ExtensionContent")?;
    w.start_element("cac:Signature")?;
    w.text_element("cbc:ID", SIGNATURE_ID)?;
    w.start_element("cac:SignatoryParty")?;
    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", &invoice.issuer.name)?;
    w.end_element("cac:PartyName")?;
    w.end_element("cac:SignatoryParty")?;
    w.start_element("cac:DigitalSignatureAttachment")?;
    w.start_element("cac:ExternalReference")?;
    w.text_element("cbc:URI", &format!("cid:signature_{}", invoice.uuid.hyphenated()))?;
    w.end_element("cac:ExternalReference")?;
    w.end_element("cac:DigitalSignatureAttachment")?;
    w.end_element("cac:Signature")?;
    w.end_element("ext:ExtensionContent")?;
    w.end_element("ext:UBLExtension")?;
    w.end_element("ext:UBLExtensions")?;
    Ok(())
}
