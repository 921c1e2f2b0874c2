#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document processor: normalizes training material into chunk sequences.
//!
//! Every source kind — uploaded PDFs, fetched URLs, FAQ pairs, raw text —
//! is reduced to an ordered sequence of text chunks with stable metadata.
//! Chunking is deterministic: the same source always yields the same
//! chunk texts at the same indices, which keeps re-ingestion idempotent
//! at the vector layer.

pub mod chunk;
pub mod html;
pub mod pdf;
pub mod url;

use salescraft_models::TrainingKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chunk::ChunkingConfig;

/// Errors from document processing.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// An HTTP request to fetch a URL failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The source yielded no usable text.
    #[error("No extractable text in {source_ref}")]
    Empty {
        /// Human-readable source reference.
        source_ref: String,
    },
}

/// A question/answer pair for FAQ ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    /// The question.
    pub question: String,
    /// The answer.
    pub answer: String,
}

/// Training material handed to the processor.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// An uploaded PDF.
    Pdf {
        /// Original filename, used as the source reference.
        filename: String,
        /// Raw file bytes.
        bytes: Vec<u8>,
    },
    /// A single web page to fetch and extract.
    Url {
        /// The page URL.
        url: String,
    },
    /// Question/answer pairs; each pair becomes exactly one chunk.
    Faq {
        /// The pairs.
        items: Vec<FaqItem>,
    },
    /// Raw pasted text.
    Text {
        /// Label used as the source reference.
        label: String,
        /// The text.
        content: String,
    },
}

impl DocumentSource {
    /// The training kind this source maps to.
    #[must_use]
    pub const fn kind(&self) -> TrainingKind {
        match self {
            Self::Pdf { .. } => TrainingKind::Pdf,
            Self::Url { .. } => TrainingKind::Url,
            Self::Faq { .. } => TrainingKind::Faq,
            Self::Text { .. } => TrainingKind::Text,
        }
    }

    /// Human-readable source reference for metadata.
    #[must_use]
    pub fn source_ref(&self) -> String {
        match self {
            Self::Pdf { filename, .. } => filename.clone(),
            Self::Url { url } => url.clone(),
            Self::Faq { items } => format!("{} faq items", items.len()),
            Self::Text { label, .. } => label.clone(),
        }
    }
}

/// Metadata carried by every chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Kind of source the chunk came from.
    pub source_type: TrainingKind,
    /// Filename, URL, or label identifying the source.
    pub source_ref: String,
    /// Position within the source; deterministic across re-runs.
    pub chunk_index: u32,
}

/// One normalized retrieval chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// Source metadata.
    pub metadata: ChunkMetadata,
}

/// Processes a source into its ordered chunk sequence.
///
/// # Errors
///
/// Returns [`DocumentError`] if extraction fails or the source contains
/// no usable text.
pub async fn process(
    source: &DocumentSource,
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>, DocumentError> {
    let texts = match source {
        DocumentSource::Pdf { filename, bytes } => {
            let pages = pdf::extract_pages(bytes)?;
            if pages.is_empty() {
                return Err(DocumentError::Empty {
                    source_ref: filename.clone(),
                });
            }
            chunk::chunk_text(&pages.join("\n\n"), config)
        }
        DocumentSource::Url { url } => {
            let text = url::fetch_and_extract(url).await?;
            if text.trim().is_empty() {
                return Err(DocumentError::Empty {
                    source_ref: url.clone(),
                });
            }
            chunk::chunk_text(&text, config)
        }
        DocumentSource::Faq { items } => items
            .iter()
            .map(|item| format!("Q: {}\nA: {}", item.question.trim(), item.answer.trim()))
            .collect(),
        DocumentSource::Text { label, content } => {
            if content.trim().is_empty() {
                return Err(DocumentError::Empty {
                    source_ref: label.clone(),
                });
            }
            chunk::chunk_text(content, config)
        }
    };

    if texts.is_empty() {
        return Err(DocumentError::Empty {
            source_ref: source.source_ref(),
        });
    }

    let source_type = source.kind();
    let source_ref = source.source_ref();

    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let chunk_index = u32::try_from(i).unwrap_or(u32::MAX);
            Chunk {
                text,
                metadata: ChunkMetadata {
                    source_type,
                    source_ref: source_ref.clone(),
                    chunk_index,
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn faq_items_become_one_chunk_each() {
        let source = DocumentSource::Faq {
            items: vec![
                FaqItem {
                    question: "What is the refund window?".to_string(),
                    answer: "30 days from delivery.".to_string(),
                },
                FaqItem {
                    question: "Do you ship internationally?".to_string(),
                    answer: "Yes, to 40 countries.".to_string(),
                },
            ],
        };

        let chunks = process(&source, &ChunkingConfig::default()).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].text,
            "Q: What is the refund window?\nA: 30 days from delivery."
        );
        assert_eq!(chunks[0].metadata.chunk_index, 0);
        assert_eq!(chunks[1].metadata.chunk_index, 1);
        assert_eq!(chunks[0].metadata.source_type, TrainingKind::Faq);
    }

    #[tokio::test]
    async fn raw_text_chunks_deterministically() {
        let source = DocumentSource::Text {
            label: "notes".to_string(),
            content: "x".repeat(2500),
        };
        let config = ChunkingConfig::default();

        let first = process(&source, &config).await.unwrap();
        let second = process(&source, &config).await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.metadata.chunk_index, b.metadata.chunk_index);
        }
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let source = DocumentSource::Text {
            label: "empty".to_string(),
            content: "   ".to_string(),
        };
        let result = process(&source, &ChunkingConfig::default()).await;
        assert!(matches!(result, Err(DocumentError::Empty { .. })));
    }
}
