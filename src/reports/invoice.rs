use std::fmt::Write;

use rust_decimal::Decimal;

use crate::domain::{display_date, Order, OrderItems, StoreIdentity};

/// Orders with a subtotal strictly above this ship free.
pub const FREE_DELIVERY_ABOVE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const FLAT_DELIVERY_CHARGE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

pub fn delivery_charge(subtotal: Decimal) -> Decimal {
    if subtotal > FREE_DELIVERY_ABOVE {
        Decimal::ZERO
    } else {
        FLAT_DELIVERY_CHARGE
    }
}

pub fn grand_total(subtotal: Decimal) -> Decimal {
    subtotal + delivery_charge(subtotal)
}

const STYLE: &str = "body { font-family: Arial, sans-serif; padding: 20px; max-width: 800px; margin: 0 auto; }
.header { text-align: center; margin-bottom: 30px; border-bottom: 2px solid #000; padding-bottom: 20px; }
.section { margin-bottom: 25px; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
th { background: #f5f5f5; font-weight: 600; }
.total-row { font-weight: bold; background: #f8f9fa; }
.footer { margin-top: 50px; text-align: center; font-size: 14px; color: #666; }
.status-badge { padding: 5px 10px; border-radius: 4px; font-size: 12px; font-weight: 600; display: inline-block; }
.status-pending { background: #fff3cd; color: #856404; }
.status-processing { background: #cce5ff; color: #004085; }
.status-out-for-delivery { background: #d1ecf1; color: #0c5460; }
.status-delivered { background: #d4edda; color: #155724; }
.status-cancelled { background: #f8d7da; color: #721c24; }";

/// Standalone printable HTML invoice for one order.
pub fn render_invoice(order: &Order, store: &StoreIdentity) -> String {
    let number = escape(&order.display_number());
    let date = order
        .date
        .clone()
        .unwrap_or_else(|| display_date(order.created_millis()));
    let store_name = escape(&store.name);
    let store_phone = escape(&store.phone);
    let subtotal = order.total;

    let mut html = String::with_capacity(4096);
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Invoice {number}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n\
<div class=\"header\">\n<h1>{store_name}</h1>\n<p>{address}</p>\n<p>Phone: {store_phone}</p>\n<h2>INVOICE</h2>\n</div>\n\
<div class=\"section\">\n<table>\n\
<tr><td><strong>Invoice Number:</strong></td><td>{number}</td><td><strong>Invoice Date:</strong></td><td>{date}</td></tr>\n\
<tr><td><strong>Status:</strong></td><td><span class=\"status-badge {badge}\">{status}</span></td>\
<td><strong>Payment Method:</strong></td><td>{payment}</td></tr>\n</table>\n</div>\n\
<div class=\"section\">\n<h3>Bill To:</h3>\n<p><strong>{customer}</strong></p>\n<p>Phone: {phone}</p>\n<p>Email: {email}</p>\n<p>Address: {delivery}</p>\n</div>\n\
<div class=\"section\">\n<h3>Order Details</h3>\n<table>\n<tr><th>Item</th><th>Quantity</th><th>Unit Price</th><th>Total</th></tr>\n",
        address = escape(&store.address),
        date = escape(&date),
        badge = order.status.css_class(),
        status = order.status,
        payment = escape(order.payment_method.as_deref().unwrap_or(DEFAULT_PAYMENT_METHOD)),
        customer = escape(order.customer_name.as_deref().unwrap_or("Customer")),
        phone = escape(order.customer_phone.as_deref().unwrap_or("N/A")),
        email = escape(order.customer_email.as_deref().unwrap_or("N/A")),
        delivery = order
            .delivery_address
            .as_deref()
            .map(|address| escape(address).replace("\r\n", "<br>").replace('\n', "<br>"))
            .unwrap_or_else(|| "N/A".to_string()),
    );

    match &order.items {
        OrderItems::Lines(lines) => {
            for line in lines {
                item_row(&mut html, &line.name, line.quantity, line.price, line.line_total());
            }
        }
        OrderItems::Description(text) => item_row(&mut html, text, 1, subtotal, subtotal),
    }

    for (label, amount) in [
        ("Subtotal", subtotal),
        ("Delivery Charge", delivery_charge(subtotal)),
        ("Grand Total", grand_total(subtotal)),
    ] {
        let _ = writeln!(
            html,
            "<tr class=\"total-row\"><td colspan=\"3\" style=\"text-align: right;\">{label}:</td><td>₹{amount:.2}</td></tr>"
        );
    }

    let _ = write!(
        html,
        "</table>\n</div>\n<div class=\"footer\">\n<p>Thank you for your business!</p>\n\
<p>{store_name} - 20 Minute Delivery Guarantee</p>\n<p>For any queries, contact: {store_phone}</p>\n</div>\n</body>\n</html>\n"
    );
    html
}

fn item_row(html: &mut String, name: &str, quantity: u32, unit: Decimal, total: Decimal) {
    let _ = writeln!(
        html,
        "<tr><td>{}</td><td>{quantity}</td><td>₹{unit:.2}</td><td>₹{total:.2}</td></tr>",
        escape(name)
    );
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
