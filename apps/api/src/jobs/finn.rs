use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static FINN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{8,})").expect("valid Finn code regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinnCodeError {
    #[error("Må være en gyldig finn.no lenke")]
    NotFinnUrl,

    #[error("Klarte ikke finne Finn-kode i lenken")]
    NoCode,
}

/// Pulls the Finn code (first run of eight or more digits) out of a finn.no job URL.
pub fn extract_finn_code(url: &str) -> Result<&str, FinnCodeError> {
    if !url.contains("finn.no") {
        return Err(FinnCodeError::NotFinnUrl);
    }
    FINN_CODE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(FinnCodeError::NoCode)
}
