pub mod client;
pub mod models;

#[cfg(test)]
pub mod fake;

pub use client::{ExtractError, MediaExtractor, YtDlpClient};
pub use models::{ExtractedMedia, ExtractionJob, ExtractorConfig};
