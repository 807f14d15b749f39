use async_trait::async_trait;
use tracing::debug;

use super::StorageError;

/// Fewer non-whitespace characters than this means the document is
/// effectively empty (scanned image, blank template).
pub const MIN_TEXT_CHARS: usize = 50;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, data: Vec<u8>) -> Result<String, StorageError>;
}

/// Extracts text with `pdf-extract` on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, data: Vec<u8>) -> Result<String, StorageError> {
        let size = data.len();
        // pdf-extract can panic on malformed input; the join error catches it.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| StorageError::Extraction(format!("extractor aborted: {e}")))?
            .map_err(|e| StorageError::Extraction(e.to_string()))?;
        debug!("Extracted {} chars from {size}-byte PDF", text.len());
        Ok(text)
    }
}

/// Collapses whitespace and returns the text only if it has enough content
/// to evaluate.
pub fn usable_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let meaningful = collapsed.chars().filter(|c| !c.is_whitespace()).count();
    (meaningful >= MIN_TEXT_CHARS).then_some(collapsed)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use super::{StorageError, TextExtractor};

    /// Treats the file bytes as UTF-8 text; bytes starting with `CORRUPT`
    /// fail the way a broken PDF does.
    pub struct Utf8Extractor;

    #[async_trait]
    impl TextExtractor for Utf8Extractor {
        async fn extract_text(&self, data: Vec<u8>) -> Result<String, StorageError> {
            if data.starts_with(b"CORRUPT") {
                return Err(StorageError::Extraction("invalid xref table".to_string()));
            }
            String::from_utf8(data).map_err(|e| StorageError::Extraction(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_text_threshold() {
        assert!(usable_text("   \n\t  ").is_none());
        assert!(usable_text(&"a ".repeat(MIN_TEXT_CHARS - 1)).is_none());
        assert!(usable_text(&"a".repeat(MIN_TEXT_CHARS)).is_some());
    }

    #[test]
    fn test_usable_text_collapses_whitespace() {
        let raw = format!("Jane   Doe\n\n{}", "Rust ".repeat(20));
        let text = usable_text(&raw).unwrap();
        assert!(text.starts_with("Jane Doe Rust Rust"));
        assert!(!text.contains("  "));
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_extraction() {
        let result = PdfTextExtractor
            .extract_text(b"definitely not a pdf".to_vec())
            .await;
        assert!(matches!(result, Err(StorageError::Extraction(_))));
    }
}
