//! Size-bounded multipart parsing. No hyper types here.
//!
//! Every file part is spooled to an anonymous temp file while the stream is
//! read, so the whole-body ceiling is enforced before any destination file is
//! created.

use std::error::Error as StdError;
use std::io::SeekFrom;

use bytes::Bytes;
use futures::Stream;
use multer::{Constraints, Field, Multipart, SizeLimit};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::error::{ToolkitError, ToolkitResult};

/// A file part copied out of the request body, rewound to its first byte.
#[derive(Debug)]
pub struct SpooledFile {
    pub field_name: String,
    pub file_name: String,
    pub size: u64,
    pub(crate) file: File,
}

/// Parsed multipart body: file parts in the order they were sent.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub files: Vec<SpooledFile>,
}

/// Boundary of a `multipart/form-data` content type header.
pub fn parse_boundary(content_type: Option<&str>) -> ToolkitResult<String> {
    let content_type = content_type
        .ok_or_else(|| ToolkitError::MalformedMultipart("missing Content-Type".to_string()))?;
    multer::parse_boundary(content_type)
        .map_err(|e| ToolkitError::MalformedMultipart(format!("bad boundary: {e}")))
}

/// Read a whole multipart stream, failing with `PayloadTooLarge` once more
/// than `max_bytes` have been received. Parts without a filename are skipped.
pub async fn parse_multipart<S, O, E>(
    stream: S,
    boundary: impl Into<String>,
    max_bytes: u64,
) -> ToolkitResult<MultipartForm>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn StdError + Send + Sync>> + 'static,
{
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(max_bytes));
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(map_multer_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field.file_name().filter(|n| !n.is_empty()).map(str::to_string) {
            Some(file_name) => {
                let (file, size) = spool_field(field).await?;
                form.files.push(SpooledFile {
                    field_name,
                    file_name,
                    size,
                    file,
                });
            }
            // non-file parts are dropped unread; their bytes still count toward the ceiling
            None => tracing::debug!(field = %field_name, "Skipping non-file form part"),
        }
    }

    Ok(form)
}

async fn spool_field(mut field: Field<'static>) -> ToolkitResult<(File, u64)> {
    let mut file = File::from_std(tempfile::tempfile()?);
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(map_multer_error)? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok((file, size))
}

fn map_multer_error(err: multer::Error) -> ToolkitError {
    match err {
        multer::Error::StreamSizeExceeded { limit } => ToolkitError::PayloadTooLarge { limit },
        multer::Error::FieldSizeExceeded { limit, .. } => ToolkitError::PayloadTooLarge { limit },
        other => ToolkitError::MalformedMultipart(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tokio::io::AsyncReadExt;

    const BOUNDARY: &str = "X-TOOLKIT-BOUNDARY";

    fn body_stream(body: Vec<u8>) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        // two chunks so parts straddle reads
        let mut head = Bytes::from(body);
        let tail = head.split_off(head.len() / 2);
        futures::stream::iter(vec![Ok(head), Ok(tail)])
    }

    fn build_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_parse_files_skips_text_parts() {
        let body = build_body(&[
            ("file", Some("a.txt"), &b"first"[..]),
            ("title", None, &b"hello"[..]),
            ("file", Some("b.txt"), &b"second file"[..]),
        ]);

        let mut form = parse_multipart(body_stream(body), BOUNDARY, 1024).await.unwrap();

        assert_eq!(form.files.len(), 2);
        assert_eq!(form.files[0].file_name, "a.txt");
        assert_eq!(form.files[0].size, 5);
        assert_eq!(form.files[1].file_name, "b.txt");
        assert!(form.files.iter().all(|f| f.field_name == "file"));

        let mut contents = String::new();
        form.files[1].file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "second file");
    }

    #[tokio::test]
    async fn test_parse_size_limit() {
        let body = build_body(&[("file", Some("big.bin"), &[b'x'; 4096][..])]);
        let result = parse_multipart(body_stream(body), BOUNDARY, 512).await;
        assert!(matches!(
            result,
            Err(ToolkitError::PayloadTooLarge { limit: 512 })
        ));
    }

    #[tokio::test]
    async fn test_parse_empty_form() {
        let body = format!("--{BOUNDARY}--\r\n").into_bytes();
        let form = parse_multipart(body_stream(body), BOUNDARY, 1024).await.unwrap();
        assert!(form.files.is_empty());
    }

    #[test]
    fn test_parse_boundary() {
        assert_eq!(
            parse_boundary(Some("multipart/form-data; boundary=abc")).unwrap(),
            "abc"
        );
        assert!(matches!(
            parse_boundary(None),
            Err(ToolkitError::MalformedMultipart(_))
        ));
        assert!(matches!(
            parse_boundary(Some("application/json")),
            Err(ToolkitError::MalformedMultipart(_))
        ));
    }
}
