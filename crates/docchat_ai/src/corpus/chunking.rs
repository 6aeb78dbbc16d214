use super::store::normalize_text;

pub const DEFAULT_CHUNK_CHARS: usize = 300;
pub const DEFAULT_CHUNK_OVERLAP: usize = 30;

#[derive(Debug, Clone)]
pub struct ChunkDraft {
    pub ordinal: u32,
    pub text: String,
    pub char_count: u32,
}

/// Split text into windows of at most `max_chars` characters, each overlapping
/// its predecessor by `overlap` characters. Breaks prefer whitespace so words
/// stay intact; a window is only cut mid-word when it contains no whitespace
/// in its second half.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<ChunkDraft> {
    let normalized = normalize_text(text);
    let trimmed = normalized.trim();
    if trimmed.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let overlap = overlap.min(max_chars.saturating_sub(1));

    let mut out = Vec::new();
    let mut ordinal: u32 = 0;
    let mut start = 0usize;
    while start < chars.len() {
        let hard_end = (start + max_chars).min(chars.len());
        let mut end = hard_end;
        if hard_end < chars.len() {
            if let Some(ws) = (start..hard_end).rev().find(|&i| chars[i].is_whitespace()) {
                if ws > start + max_chars / 2 {
                    end = ws;
                }
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim().to_string();
        if !piece.is_empty() {
            out.push(ChunkDraft {
                ordinal,
                char_count: piece.chars().count() as u32,
                text: piece,
            });
            ordinal += 1;
        }

        if end >= chars.len() {
            break;
        }
        let next = end.saturating_sub(overlap);
        // The overlap must never stall the walk.
        start = if next > start { next } else { end };
    }

    out
}
