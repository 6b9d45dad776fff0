// src/pipeline/split.rs

//! Payload splitting for size-limited channels.
//!
//! Sections are packed greedily into batches. A section that does not fit
//! in an empty batch is split between lines, repeating its title at the
//! top of each continuation. Lines are never split; a single line longer
//! than a whole batch is truncated.

use crate::utils::truncate_to_bytes;

/// Joins sections within a batch.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Bytes kept free for the `[i/n]` header of split batches.
const HEADER_RESERVE: usize = 16;

/// A rendered section ready for packing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub title: String,
    pub lines: Vec<String>,
}

impl Block {
    pub fn text(&self) -> String {
        let mut text = self.title.clone();
        for line in &self.lines {
            push_line(&mut text, line);
        }
        text
    }
}

/// One request worth of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position
    pub index: usize,
    pub total: usize,
    pub text: String,
}

impl Batch {
    /// `[i/n]` marker, present only when the payload was split.
    pub fn header(&self) -> Option<String> {
        (self.total > 1).then(|| format!("[{}/{}]", self.index, self.total))
    }

    /// Text with the batch header prepended when split.
    pub fn labelled(&self) -> String {
        match self.header() {
            Some(header) => format!("{header}{SECTION_SEPARATOR}{}", self.text),
            None => self.text.clone(),
        }
    }
}

fn push_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}

fn joined_len(buffer: &str, separator: &str, next: &str) -> usize {
    if buffer.is_empty() {
        next.len()
    } else {
        buffer.len() + separator.len() + next.len()
    }
}

/// Pack blocks into batches of at most `max_bytes` (header included).
///
/// `None` puts everything into a single batch.
pub fn split(blocks: &[Block], max_bytes: Option<usize>) -> Vec<Batch> {
    let chunks = match max_bytes {
        None => {
            let all: Vec<String> = blocks.iter().map(Block::text).collect();
            if all.is_empty() {
                Vec::new()
            } else {
                vec![all.join(SECTION_SEPARATOR)]
            }
        }
        Some(max) => pack(blocks, max.saturating_sub(HEADER_RESERVE).max(1)),
    };

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| Batch {
            index: i + 1,
            total,
            text,
        })
        .collect()
}

fn pack(blocks: &[Block], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for block in blocks {
        let text = block.text();
        if joined_len(&current, SECTION_SEPARATOR, &text) <= budget {
            if !current.is_empty() {
                current.push_str(SECTION_SEPARATOR);
            }
            current.push_str(&text);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if text.len() <= budget {
            current = text;
            continue;
        }

        // Section alone is too big: split it between lines.
        let title = truncate_to_bytes(&block.title, budget / 2);
        let line_budget = budget.saturating_sub(title.len() + 1).max(1);
        let mut piece = title.clone();
        let mut has_lines = false;
        for line in &block.lines {
            let line = truncate_to_bytes(line, line_budget);
            if has_lines && joined_len(&piece, "\n", &line) > budget {
                chunks.push(std::mem::replace(&mut piece, title.clone()));
            }
            push_line(&mut piece, &line);
            has_lines = true;
        }
        current = piece;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
