//! Core traits for the breakout scanner.

mod http;
mod indicator;
mod price_source;

pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use indicator::Indicator;
pub use price_source::PriceSource;
