use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extracts plain text from a PDF. Never fails: a broken or slow PDF yields
/// an empty string and the upload proceeds with the file alone.
pub async fn extract_cv_text(pdf: Bytes) -> String {
    let task = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf));

    match tokio::time::timeout(EXTRACT_TIMEOUT, task).await {
        Ok(Ok(Ok(text))) => {
            let text = normalize_whitespace(&text);
            info!("PDF parsed, text length: {}", text.len());
            text
        }
        Ok(Ok(Err(e))) => {
            warn!("PDF parsing failed (non-fatal): {e}");
            String::new()
        }
        Ok(Err(e)) => {
            warn!("PDF parsing task panicked (non-fatal): {e}");
            String::new()
        }
        Err(_) => {
            warn!("PDF parsing timed out after {}s", EXTRACT_TIMEOUT.as_secs());
            String::new()
        }
    }
}

/// Collapses runs of blank lines and trims trailing spaces.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
