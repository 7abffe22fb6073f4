//! CV store: file storage, text extraction and the primary-CV transactions.

pub mod extract;
pub mod handlers;
pub mod repository;
pub mod storage;
