//! Page handlers

pub mod pages;
pub mod preview;

use crate::components::escape_html;

/// Wrap rendered content in a complete HTML document
pub(crate) fn render_document(
    title: &str,
    lang: Option<&str>,
    body: &str,
    refresh_timeout_ms: Option<u64>,
) -> String {
    let refresh = refresh_timeout_ms
        .map(|ms| format!(" data-refresh-timeout=\"{}\"", ms))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"{}\"><head><meta charset=\"utf-8\"><title>{}</title></head><body{}>{}</body></html>",
        escape_html(lang.unwrap_or("en")),
        escape_html(title),
        refresh,
        body
    )
}
