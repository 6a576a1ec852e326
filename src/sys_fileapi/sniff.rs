//! Content-type detection from leading bytes, never from client headers.

use infer::MatcherType;

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Classify a byte prefix into a MIME type.
///
/// Names follow the WHATWG sniffing table (`application/x-gzip`,
/// `audio/wave`, `font/ttf`, ...). Byte-order marks decide the text charset
/// and any ZIP container, including OOXML and EPUB, is `application/zip`.
/// Other magic-number matches keep the name `infer` gives them, so allow-list
/// entries for those must use that exact name. Data with no binary control
/// bytes falls back to `text/plain; charset=utf-8`, everything else to
/// `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> String {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if data.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be".to_string();
    }
    if data.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le".to_string();
    }
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TEXT_PLAIN_UTF8.to_string();
    }
    if data.starts_with(b"PK\x03\x04") {
        return "application/zip".to_string();
    }

    if let Some(name) = infer::get(data).and_then(standard_name) {
        return name;
    }

    if data.iter().any(|b| is_binary_byte(*b)) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_PLAIN_UTF8.to_string()
    }
}

/// Rename an `infer` match to its sniffing-table name. Text matches the
/// table has no entry for (shell scripts) return `None` and fall through.
fn standard_name(kind: infer::Type) -> Option<String> {
    if matches!(kind.matcher_type(), MatcherType::Text) {
        return match kind.mime_type() {
            "text/html" | "text/xml" => Some(format!("{}; charset=utf-8", kind.mime_type())),
            _ => None,
        };
    }

    let name = match kind.mime_type() {
        "application/gzip" => "application/x-gzip",
        "application/vnd.rar" | "application/x-rar" => "application/x-rar-compressed",
        "audio/x-wav" | "audio/wav" => "audio/wave",
        "audio/x-aiff" => "audio/aiff",
        "audio/ogg" | "video/ogg" => "application/ogg",
        "video/x-msvideo" => "video/avi",
        "image/vnd.microsoft.icon" => "image/x-icon",
        "application/font-woff" | "application/font-sfnt" => {
            return Some(format!("font/{}", kind.extension()));
        }
        other => other,
    };
    Some(name.to_string())
}

/// Control bytes that never show up in text files.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Check a sniffed type against an allow-list.
///
/// An empty list allows everything. Otherwise the whole value must match one
/// entry, ignoring ASCII case; parameters such as a charset are part of the value.
pub fn is_allowed(content_type: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a.eq_ignore_ascii_case(content_type))
}
