//! Page bookkeeping for tabular reports. Units are millimetres.

use std::ops::Range;

/// Vertical geometry of a report page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    /// Running header: report title plus the table's column headings
    pub header_height: f32,
    pub footer_height: f32,
}

impl PageLayout {
    pub const A4_PORTRAIT: PageLayout = PageLayout {
        page_width: 210.0,
        page_height: 297.0,
        margin_top: 15.0,
        margin_bottom: 15.0,
        margin_left: 12.0,
        header_height: 26.0,
        footer_height: 10.0,
    };

    /// Height left for table rows on every page
    pub fn content_height(&self) -> f32 {
        (self.page_height - self.margin_top - self.margin_bottom - self.header_height - self.footer_height).max(0.0)
    }

    /// Distance from the top edge at which the first row starts
    pub fn content_top(&self) -> f32 {
        self.margin_top + self.header_height
    }
}

/// Split rows of the given heights into pages.
///
/// Rows are placed in order until the next one would overflow `content_height`. A row taller
/// than the content area is placed alone on its own page. At least one (possibly empty) page is
/// always returned.
pub fn paginate(row_heights: &[f32], content_height: f32) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut used = 0.0;

    for (i, &height) in row_heights.iter().enumerate() {
        if i > start && used + height > content_height {
            pages.push(start..i);
            start = i;
            used = 0.0;
        }
        used += height;
    }

    if start < row_heights.len() || pages.is_empty() {
        pages.push(start..row_heights.len());
    }
    pages
}

/// Footer text, 1-based
pub fn page_label(page: usize, total: usize) -> String {
    format!("Page {page} of {total}")
}

/// Greedy word wrap to at most `max_chars` per line; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
