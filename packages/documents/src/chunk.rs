//! Overlapping character-window chunking.

/// Chunking parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters of overlap between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Splits text into overlapping character windows.
///
/// Windows advance by `chunk_size - overlap` characters, so consecutive
/// chunks share `overlap` characters of context. Operates on character
/// boundaries, never bytes, so multi-byte text cannot split mid-scalar.
/// Whitespace-only windows are dropped; indices of the surviving chunks
/// are assigned by the caller in order, keeping output deterministic for
/// a given input.
#[must_use]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = config.chunk_size.saturating_sub(config.overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            chunks.push(window);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("hello world", &ChunkingConfig::default());
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let config = ChunkingConfig {
            chunk_size: 10,
            overlap: 4,
        };
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, &config);

        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "ghijklmnop");
        // Each window starts 6 (= 10 - 4) characters after the previous.
        assert!(chunks[0].ends_with(&chunks[1][..4]));
    }

    #[test]
    fn covers_the_full_text() {
        let config = ChunkingConfig {
            chunk_size: 10,
            overlap: 4,
        };
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, &config);
        assert!(chunks.last().unwrap().ends_with('z'));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let config = ChunkingConfig {
            chunk_size: 5,
            overlap: 2,
        };
        let text = "héllo wörld ünïcode";
        let chunks = chunk_text(text, &config);
        // Reassembly would fail loudly if any chunk split a scalar.
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let config = ChunkingConfig {
            chunk_size: 5,
            overlap: 5,
        };
        let chunks = chunk_text("abcdefghij", &config);
        assert!(!chunks.is_empty());
    }
}
