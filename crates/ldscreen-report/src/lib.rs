//! ldscreen-report: Renders screening reports for download.

pub mod html;

pub use html::{generate_html, write_html_report};
