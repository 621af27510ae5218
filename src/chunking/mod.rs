//! Transcript chunking for indexing and search.
//!
//! Splits a transcript into overlapping windows of sentences. Every sentence
//! gets one chunk centered on it (clamped at the start of the transcript), so
//! a transcript with `n` sentences always produces exactly `n` chunks.

/// Default number of neighboring sentences included on each side of a chunk.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// Sentence-window chunker.
///
/// Chunk `i` is the space-joined run of sentences `[i - window_size, i + window_size]`,
/// clamped to the transcript bounds. Chunking is deterministic and has no side
/// effects, so the same transcript can be re-chunked at search time and line up
/// with what was indexed.
#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    window_size: usize,
}

impl WindowChunker {
    /// Create a chunker with a custom window size.
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Split a transcript into overlapping sentence-window chunks.
    ///
    /// An empty transcript yields no chunks. A transcript with a single
    /// sentence and no terminal punctuation yields one chunk equal to that
    /// sentence.
    pub fn chunk(&self, transcript: &str) -> Vec<String> {
        let sentences = split_sentences(transcript);
        let n = sentences.len();

        (0..n)
            .map(|i| {
                let start = i.saturating_sub(self.window_size);
                let end = (i + self.window_size + 1).min(n);
                sentences[start..end].join(" ")
            })
            .collect()
    }

    /// The configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Split text into sentences.
///
/// A boundary is a `.` or `?` followed by whitespace, except when the period
/// belongs to an abbreviation: an uppercase-lowercase pair before the period
/// ("Mr.", "Dr.") or a dotted initialism ("U.S.", "e.g.") does not end a
/// sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        if !chars[i].is_whitespace() || i == 0 {
            continue;
        }
        let prev = chars[i - 1];
        if prev != '.' && prev != '?' {
            continue;
        }

        // "Mr. ", "Dr. " style abbreviations
        let abbreviation = prev == '.'
            && i >= 3
            && chars[i - 3].is_uppercase()
            && chars[i - 2].is_lowercase();

        // "U.S. ", "e.g. " style dotted initialisms
        let initialism = i >= 4
            && is_word_char(chars[i - 4])
            && chars[i - 3] == '.'
            && is_word_char(chars[i - 2]);

        if abbreviation || initialism {
            continue;
        }

        push_trimmed(&mut sentences, &chars[start..i]);
        start = i + 1;
    }

    push_trimmed(&mut sentences, &chars[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence: String = chars.iter().collect();
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_sentences() {
        let sentences = split_sentences("First one. Second one? Third one.");
        assert_eq!(sentences, vec!["First one.", "Second one?", "Third one."]);
    }

    #[test]
    fn test_split_preserves_abbreviations() {
        let sentences = split_sentences("Talk to Mr. Smith. He works in the U.S. today.");
        assert_eq!(
            sentences,
            vec!["Talk to Mr. Smith.", "He works in the U.S. today."]
        );
    }

    #[test]
    fn test_split_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_single_sentence_without_terminal_punctuation() {
        let chunker = WindowChunker::default();
        let chunks = chunker.chunk("just one fragment without an end");
        assert_eq!(chunks, vec!["just one fragment without an end"]);
    }

    #[test]
    fn test_chunk_count_matches_sentence_count() {
        let transcript = "One. Two. Three. Four. Five. Six. Seven.";
        let chunker = WindowChunker::default();
        let chunks = chunker.chunk(transcript);
        assert_eq!(chunks.len(), split_sentences(transcript).len());
        assert_eq!(chunks.len(), 7);
    }

    #[test]
    fn test_chunk_windows_are_clamped() {
        let chunker = WindowChunker::new(2);
        let chunks = chunker.chunk("A. B. C. D. E.");

        // Chunk 0 clamps left: sentences [0, 2].
        assert_eq!(chunks[0], "A. B. C.");
        // Chunk 2 is fully centered: sentences [0, 4].
        assert_eq!(chunks[2], "A. B. C. D. E.");
        // Chunk 4 clamps right: sentences [2, 4].
        assert_eq!(chunks[4], "C. D. E.");
    }

    #[test]
    fn test_chunk_empty_transcript() {
        let chunker = WindowChunker::default();
        assert!(chunker.chunk("").is_empty());
    }
}
