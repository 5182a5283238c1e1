use prometheus::{Encoder, Registry, TextEncoder};

/// `Content-Type` of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Render a registry in text exposition format. Encoding failures yield an
/// empty body rather than an error for the scrape.
pub fn render_metrics(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    if TextEncoder::new().encode(&registry.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
