//! JSON export of an invoice.
//!
//! Shape: `{"Invoice": {"Company", "Client", "InvoiceDetails", "LineItems",
//! "Totals"}}`. Missing text fields read `"N/A"`; amounts are two-decimal
//! strings computed from the lines.

use serde::Serialize;

use crate::core::calc::numbered_lines;
use crate::core::format::amount_2dp;
use crate::core::{DocumentSettings, Invoice, InvoiceError};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Export<'a> {
    invoice: InvoiceExport<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InvoiceExport<'a> {
    company: Company<'a>,
    client: Client<'a>,
    invoice_details: Details<'a>,
    line_items: Vec<LineItem<'a>>,
    totals: Totals,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Company<'a> {
    name: &'a str,
    #[serde(rename = "TRN")]
    trn: &'a str,
    address: &'a str,
    phone: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Client<'a> {
    name: &'a str,
    #[serde(rename = "TRN")]
    trn: &'a str,
    address: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Details<'a> {
    invoice_number: &'a str,
    issue_date: String,
    due_date: String,
    status: &'static str,
    #[serde(rename = "UUID")]
    uuid: String,
    place_of_supply: &'a str,
    currency: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LineItem<'a> {
    description: &'a str,
    quantity: String,
    unit_price: String,
    #[serde(rename = "VATRate")]
    vat_rate: String,
    #[serde(rename = "VATAmount")]
    vat_amount: String,
    total: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Totals {
    subtotal: String,
    #[serde(rename = "VATAmount")]
    vat_amount: String,
    grand_total: String,
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { NOT_AVAILABLE } else { value }
}

/// Pretty-printed JSON export of `invoice`.
pub fn to_json(invoice: &Invoice, settings: &DocumentSettings) -> Result<String, InvoiceError> {
    let amounts = invoice.amounts();
    let issuer = &invoice.issuer;
    let client = &invoice.counterparty;

    let line_items = numbered_lines(invoice.lines())
        .map(|(_, line, la)| LineItem {
            description: if line.description.trim().is_empty() {
                "No description"
            } else {
                &line.description
            },
            quantity: amount_2dp(line.quantity),
            unit_price: amount_2dp(line.unit_price),
            vat_rate: line.vat_rate.normalize().to_string(),
            vat_amount: amount_2dp(la.vat),
            total: amount_2dp(la.gross),
        })
        .collect();

    let export = Export {
        invoice: InvoiceExport {
            company: Company {
                name: or_na(&issuer.name),
                trn: or_na(issuer.trn()),
                address: or_na(issuer.address()),
                phone: or_na(issuer.phone()),
            },
            client: Client {
                name: or_na(&client.name),
                trn: or_na(client.trn()),
                address: or_na(client.address()),
                email: or_na(client.email()),
            },
            invoice_details: Details {
                invoice_number: or_na(&invoice.number),
                issue_date: invoice.issue_date.format("%Y-%m-%d").to_string(),
                due_date: invoice
                    .due_date
                    .map_or_else(|| NOT_AVAILABLE.to_string(), |d| d.format("%Y-%m-%d").to_string()),
                status: invoice.status.code(),
                uuid: invoice.uuid.hyphenated().to_string(),
                place_of_supply: invoice.place_of_supply.display_name(),
                currency: &settings.currency_code,
            },
            line_items,
            totals: Totals {
                subtotal: amount_2dp(amounts.subtotal),
                vat_amount: amount_2dp(amounts.total_vat),
                grand_total: amount_2dp(amounts.grand_total),
            },
        },
    };

    serde_json::to_string_pretty(&export).map_err(|e| InvoiceError::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn sample() -> Invoice {
        InvoiceBuilder::new(2, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .number("INV-0002-0009")
            .issuer(IssuerBuilder::new("Acme Trading LLC").trn("100000000000003").build())
            .counterparty(CounterpartyBuilder::new("Client FZE").build())
            .add_line(InvoiceLine::new("Consulting", dec!(3), dec!(99.99)))
            .add_line(InvoiceLine::new("", dec!(1), dec!(10)).vat_rate(dec!(0)))
            .build()
            .unwrap()
    }

    #[test]
    fn export_shape() {
        let json = to_json(&sample(), &DocumentSettings::default()).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();
        let inv = &v["Invoice"];

        assert_eq!(inv["Company"]["Name"], "Acme Trading LLC");
        assert_eq!(inv["Company"]["Phone"], "N/A");
        assert_eq!(inv["Client"]["TRN"], "N/A");
        assert_eq!(inv["InvoiceDetails"]["InvoiceNumber"], "INV-0002-0009");
        assert_eq!(inv["InvoiceDetails"]["DueDate"], "N/A");
        assert_eq!(inv["InvoiceDetails"]["Status"], "DRAFT");

        let items = inv["LineItems"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["VATAmount"], "15.00");
        assert_eq!(items[0]["Total"], "314.97");
        assert_eq!(items[1]["Description"], "No description");
        assert_eq!(items[1]["VATRate"], "0");

        // 299.97 + 10 net, 14.9985 VAT
        assert_eq!(inv["Totals"]["Subtotal"], "309.97");
        assert_eq!(inv["Totals"]["VATAmount"], "15.00");
        assert_eq!(inv["Totals"]["GrandTotal"], "324.97");
    }
}
