//! Shared page chrome and small formatting helpers for the templates.

use chrono::NaiveDate;

use super::html::escape;

pub(crate) const NOT_AVAILABLE: &str = "N/A";

const STYLE: &str = "body{font-family:Arial,Helvetica,sans-serif;color:#222;}\
table{border-collapse:collapse;margin:8px 0;}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left;}\
.footer{color:#888;font-size:12px;margin-top:24px;}";

/// Wrap a body fragment into a complete HTML document.
pub(crate) fn document(heading: &str, body: &str) -> String {
    let heading = escape(heading);
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{heading}</title>\
         <style>{STYLE}</style></head>\n<body>\n<h1>{heading}</h1>\n{body}\n\
         <p class=\"footer\">This message was sent automatically by the HR notification service.</p>\n\
         </body></html>"
    )
}

/// Escaped value or the `N/A` placeholder.
pub(crate) fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => escape(v),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub(crate) fn date_or_na(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub(crate) fn number_or_na(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Two-column label/value table. Values must already be escaped.
pub(crate) fn fields_table(rows: &[(&str, String)]) -> String {
    let mut out = String::from("<table>\n");
    for (label, value) in rows {
        out.push_str(&format!("<tr><th>{}</th><td>{value}</td></tr>\n", escape(label)));
    }
    out.push_str("</table>");
    out
}

/// Trimmed, non-empty string field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
