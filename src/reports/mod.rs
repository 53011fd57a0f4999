//! Read models over the canonical order set: filtering, headline statistics, CSV
//! export and printable invoices.

pub mod csv;
pub mod filter;
pub mod invoice;
pub mod stats;

pub use csv::{export_csv, CSV_HEADER};
pub use filter::{OrderFilter, TimeWindow};
pub use invoice::{delivery_charge, grand_total, render_invoice};
pub use stats::OrderStats;
