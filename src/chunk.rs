//! Fixed-width text chunker.
//!
//! Splits extracted document text into contiguous, non-overlapping segments
//! of at most `max_chars` characters so each generation request stays within
//! the service's input limits. Widths are counted in `char`s, never bytes,
//! so multi-byte text is never split inside a code point.

/// Split text into ordered chunks of at most `max_chars` characters.
///
/// Concatenating the result reproduces `text` exactly. Empty input yields no
/// chunks. A `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
