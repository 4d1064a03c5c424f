//! Splits paper text into bounded, overlapping chunks for the vector index.
//!
//! Lengths are measured in `char`s. Cut points prefer a sentence or line
//! boundary in the second half of the window; otherwise the window is cut hard.

/// Characters after which a chunk may end.
const BOUNDARIES: [char; 5] = ['.', '!', '?', '\n', '。'];

/// Split `text` into chunks of at most `chunk_size` chars, each starting
/// `overlap` chars before the previous one ended.
///
/// Whitespace-only input yields no chunks. `overlap` must be smaller than
/// `chunk_size`; larger values are clamped so the window always advances.
pub fn split_with_overlap(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }
    let overlap = overlap.min(chunk_size.saturating_sub(1));
    let chars: Vec<char> = text.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let cut = if end == chars.len() {
            end
        } else {
            find_cut_point(&chars, start, end).unwrap_or(end)
        };

        let chunk: String = chars[start..cut].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if cut == chars.len() {
            break;
        }
        // Always advance, even when the overlap would reach back past `start`.
        start = cut.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Longest prefix of `text` with at most `max_chars` chars.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Search backwards from `end` to the middle of the window for a boundary.
fn find_cut_point(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let min_search = start + (end - start) / 2;
    (min_search..end)
        .rev()
        .find(|&i| BOUNDARIES.contains(&chars[i]))
        .map(|i| i + 1)
}
