use crate::domain::Order;
use crate::orders::is_synced;

pub const CSV_HEADER: &str = "Order ID,Order Number,Customer Name,Phone,Email,Address,Items,Total,Status,Date,Payment Method,Sync Status";

/// One header line plus one fully quoted line per order. The sync column compares
/// each order against the user-submitted collection.
pub fn export_csv(orders: &[Order], submitted: &[Order]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + orders.len() * 128);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for order in orders {
        let address = order
            .delivery_address
            .as_deref()
            .unwrap_or_default()
            .replace("\r\n", ", ")
            .replace('\n', ", ");
        let sync = if is_synced(order, submitted) {
            "Synced"
        } else {
            "Not Synced"
        };
        let fields = [
            order.id.to_string(),
            order.order_number.clone().unwrap_or_default(),
            order.customer_name.clone().unwrap_or_default(),
            order.customer_phone.clone().unwrap_or_default(),
            order.customer_email.clone().unwrap_or_default(),
            address,
            order.items.summary(),
            order.total.to_string(),
            order.status.to_string(),
            order.date.clone().unwrap_or_default(),
            order.payment_method.clone().unwrap_or_default(),
            sync.to_string(),
        ];
        let line: Vec<String> = fields.iter().map(|field| quote(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineItem, OrderId, OrderItems, OrderStatus};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn two_orders_make_three_lines() {
        let orders = vec![
            Order::new(OrderId(1), "A1", OrderStatus::Pending, Decimal::from_str("10.50").unwrap()),
            Order::new(OrderId(2), "A2", OrderStatus::Delivered, Decimal::from(5)),
        ];
        let csv = export_csv(&orders, &orders[..1]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            r#""1","A1","","","","","","10.50","Pending","","","Synced""#
        );
        assert_eq!(
            lines[2],
            r#""2","A2","","","","","","5","Delivered","","","Not Synced""#
        );
    }

    #[test]
    fn quotes_doubled_and_address_flattened() {
        let mut order = Order::new(OrderId(7), "A7", OrderStatus::Processing, Decimal::from(20))
            .with_customer("Ravi \"RK\" Kumar", "555")
            .with_items(OrderItems::Lines(vec![
                LineItem::new("Milk", 2, Decimal::from(5)),
                LineItem::new("Bread", 1, Decimal::from(10)),
            ]));
        order.delivery_address = Some("Flat 4\r\nMG Road\nBengaluru".to_string());

        let csv = export_csv(&[order], &[]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(r#""Ravi ""RK"" Kumar""#));
        assert!(row.contains(r#""Flat 4, MG Road, Bengaluru""#));
        assert!(row.contains(r#""Milk x2; Bread x1""#));
    }

    #[test]
    fn legacy_text_items_pass_through() {
        let order = Order::new(OrderId(9), "A9", OrderStatus::Pending, Decimal::from(3))
            .with_items(OrderItems::Description("2kg rice".to_string()));
        assert!(export_csv(&[order], &[]).contains(r#""2kg rice""#));
    }
}
