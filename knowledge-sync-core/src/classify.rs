//! Content classification: file extension → MIME type and transfer encoding.

use std::path::Path;

use crate::contract::{ClassifiedContent, Payload};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// How the fetched bytes are carried in the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Text,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentType {
    pub mime_type: &'static str,
    pub transfer: Transfer,
}

/// Classify a path by its extension (case-insensitive).
///
/// Total: unknown or missing extensions map to [`DEFAULT_MIME_TYPE`] with
/// binary transfer.
pub fn classify(path: &str) -> ContentType {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let (mime_type, transfer) = match extension.as_deref() {
        Some("md") | Some("markdown") => ("text/markdown", Transfer::Text),
        Some("txt") => ("text/plain", Transfer::Text),
        Some("json") => ("application/json", Transfer::Text),
        Some("html") | Some("htm") => ("text/html", Transfer::Text),
        Some("pdf") => ("application/pdf", Transfer::Binary),
        Some("doc") => ("application/msword", Transfer::Binary),
        Some("docx") => (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Transfer::Binary,
        ),
        Some("xls") => ("application/vnd.ms-excel", Transfer::Binary),
        Some("xlsx") => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Transfer::Binary,
        ),
        Some("ppt") => ("application/vnd.ms-powerpoint", Transfer::Binary),
        Some("pptx") => (
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Transfer::Binary,
        ),
        Some("jpg") | Some("jpeg") => ("image/jpeg", Transfer::Binary),
        Some("png") => ("image/png", Transfer::Binary),
        Some("gif") => ("image/gif", Transfer::Binary),
        _ => (DEFAULT_MIME_TYPE, Transfer::Binary),
    };

    ContentType {
        mime_type,
        transfer,
    }
}

/// Classify `path` and wrap the fetched bytes in the matching payload.
///
/// Text payloads are decoded as UTF-8; invalid sequences are replaced rather
/// than rejected.
pub fn classify_content(path: &str, bytes: Vec<u8>) -> ClassifiedContent {
    let content_type = classify(path);
    let payload = match content_type.transfer {
        Transfer::Text => match String::from_utf8(bytes) {
            Ok(text) => Payload::Text(text),
            Err(e) => {
                tracing::warn!(path, "[SYNC][UPLOAD] Text file is not valid UTF-8, decoding lossily");
                Payload::Text(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        },
        Transfer::Binary => Payload::Binary(bytes),
    };

    ClassifiedContent {
        mime_type: content_type.mime_type,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extensions_use_text_transfer() {
        for (path, mime) in [
            ("notes/readme.md", "text/markdown"),
            ("a.markdown", "text/markdown"),
            ("a.txt", "text/plain"),
            ("data/config.json", "application/json"),
            ("site/index.html", "text/html"),
        ] {
            let ct = classify(path);
            assert_eq!(ct.mime_type, mime, "mime for {path}");
            assert_eq!(ct.transfer, Transfer::Text, "transfer for {path}");
        }
    }

    #[test]
    fn office_and_image_extensions_use_binary_transfer() {
        for path in [
            "a.pdf", "a.doc", "a.docx", "a.xls", "a.xlsx", "a.ppt", "a.pptx", "a.jpg", "a.jpeg",
            "a.png", "a.gif",
        ] {
            let ct = classify(path);
            assert_eq!(ct.transfer, Transfer::Binary, "transfer for {path}");
            assert_ne!(ct.mime_type, DEFAULT_MIME_TYPE, "mime for {path}");
        }
    }

    #[test]
    fn extension_matching_ignores_case() {
        assert_eq!(classify("REPORT.PDF").mime_type, "application/pdf");
        assert_eq!(classify("Photo.JpG").mime_type, "image/jpeg");
    }

    #[test]
    fn unknown_or_missing_extension_defaults_to_binary() {
        for path in ["archive.tar.zst", "Makefile", "", ".env", "trailing.", "dir.v2/file"] {
            let ct = classify(path);
            assert_eq!(ct.mime_type, DEFAULT_MIME_TYPE, "mime for {path:?}");
            assert_eq!(ct.transfer, Transfer::Binary);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        assert_eq!(classify("x/y/z.docx"), classify("x/y/z.docx"));
    }

    #[test]
    fn invalid_utf8_text_is_decoded_lossily() {
        let content = classify_content("broken.txt", vec![b'o', b'k', 0xFF]);
        assert_eq!(content.payload, Payload::Text("ok\u{FFFD}".to_string()));
    }

    #[test]
    fn binary_payload_keeps_bytes_untouched() {
        let bytes = vec![0x25, 0x50, 0x44, 0x46, 0xFF];
        let content = classify_content("scan.pdf", bytes.clone());
        assert_eq!(content.mime_type, "application/pdf");
        assert_eq!(content.payload, Payload::Binary(bytes));
    }
}
