//! Report rendering.

pub mod generator;
pub mod html;

pub use generator::{generate_json_report, generate_markdown_report};
pub use html::generate_html_report;
