use crate::data::store::FileStore;
use crate::models::file_record::FileStatus;
use crate::models::search::{HighlightSegment, SearchMatch, SearchResultSet};

/// Case-insensitive substring search over every processed record.
///
/// Positions are character offsets. Scanning resumes one character after
/// each match start, so overlapping occurrences are all reported. A blank
/// query yields nothing.
pub fn search(store: &FileStore, query: &str, context_window: usize) -> Vec<SearchResultSet> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    store
        .iter()
        .filter(|record| record.status() == FileStatus::Processed)
        .filter_map(|record| {
            let text = record.extracted_text()?;
            let matches = find_matches(text, query, context_window);
            if matches.is_empty() {
                return None;
            }
            Some(SearchResultSet {
                file_id: record.id.clone(),
                file_name: record.name.clone(),
                matches,
            })
        })
        .collect()
}

pub fn find_matches(text: &str, query: &str, context_window: usize) -> Vec<SearchMatch> {
    let original: Vec<char> = text.chars().collect();
    let folded: Vec<char> = original.iter().map(|&c| fold(c)).collect();
    let needle: Vec<char> = query.chars().map(fold).collect();

    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(pos) = index_of(&folded, &needle, from) {
        let end = pos + needle.len();
        let context_start = pos.saturating_sub(context_window);
        let context_end = (end + context_window).min(original.len());
        matches.push(SearchMatch {
            matched_text: original[pos..end].iter().collect(),
            position: pos,
            context: original[context_start..context_end].iter().collect(),
        });
        from = pos + 1;
    }
    matches
}

/// Splits a snippet into plain and highlighted runs of `query`.
pub fn highlight_segments(context: &str, query: &str) -> Vec<HighlightSegment> {
    let original: Vec<char> = context.chars().collect();
    let needle: Vec<char> = query.chars().map(fold).collect();
    if needle.is_empty() {
        return vec![HighlightSegment {
            text: context.to_string(),
            highlighted: false,
        }];
    }
    let folded: Vec<char> = original.iter().map(|&c| fold(c)).collect();

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i + needle.len() <= folded.len() {
        if folded[i..i + needle.len()] == needle[..] {
            if plain_start < i {
                segments.push(segment(&original[plain_start..i], false));
            }
            segments.push(segment(&original[i..i + needle.len()], true));
            i += needle.len();
            plain_start = i;
        } else {
            i += 1;
        }
    }
    if plain_start < original.len() {
        segments.push(segment(&original[plain_start..], false));
    }
    segments
}

pub fn match_count_label(count: usize) -> String {
    if count == 1 {
        "Found 1 match".to_string()
    } else {
        format!("Found {count} matches")
    }
}

fn segment(chars: &[char], highlighted: bool) -> HighlightSegment {
    HighlightSegment {
        text: chars.iter().collect(),
        highlighted,
    }
}

// One char in, one char out, so offsets stay valid for the original text.
fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| offset + from)
}
