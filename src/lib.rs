#![doc = include_str!("../README.md")]

mod brl;
mod chart;
mod error;
mod insights;
mod mail;
mod pdf;
mod table;

pub use brl::{Brl, ParseBrlError};
pub use chart::render_channel_chart;
pub use error::PipelineError;
pub use insights::Insights;
pub use mail::{send_report, Credentials};
pub use pdf::compose_report;
pub use table::{SalesRecord, SalesTable};
