//! Splitting long text into embed-sized pages and navigating between them.

/// Page size used for AI answers.
pub const TEXT_PAGE_SIZE: usize = 1500;

/// Page size used for lyrics.
pub const LINE_PAGE_SIZE: usize = 2000;

/// Split text into fixed-size chunks of at most `page_size` characters.
///
/// Always returns at least one page.
#[must_use]
pub fn paginate_text(text: &str, page_size: usize) -> Vec<String> {
    let page_size = page_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }

    chars
        .chunks(page_size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Split text into pages of whole lines, each at most `max_chars` characters.
///
/// Lines longer than a page are hard-split. Always returns at least one page.
#[must_use]
pub fn paginate_lines(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut pages = Vec::new();
    let mut page = String::new();
    let mut page_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if page_len + line_len + 1 > max_chars && page_len > 0 {
            pages.push(std::mem::take(&mut page));
            page_len = 0;
        }

        if line_len + 1 > max_chars {
            // One character of every chunk is reserved for the newline.
            let chunks = paginate_text(line, max_chars - 1);
            let last = chunks.len() - 1;
            for (i, chunk) in chunks.into_iter().enumerate() {
                if i < last {
                    pages.push(chunk);
                } else {
                    page_len = chunk.chars().count() + 1;
                    page = chunk;
                    page.push('\n');
                }
            }
            continue;
        }

        page.push_str(line);
        page.push('\n');
        page_len += line_len + 1;
    }

    if !page.is_empty() {
        pages.push(page);
    }
    if pages.is_empty() {
        pages.push(String::new());
    }
    pages
}

/// Cursor over a list of pages.
#[derive(Debug, Clone)]
pub struct Pager {
    pages: Vec<String>,
    index: usize,
    wrap: bool,
}

impl Pager {
    /// Create a pager starting on the first page.
    ///
    /// With `wrap`, moving past either end continues from the other end;
    /// otherwise navigation stops at the ends.
    #[must_use]
    pub fn new(pages: Vec<String>, wrap: bool) -> Self {
        let pages = if pages.is_empty() {
            vec![String::new()]
        } else {
            pages
        };
        Self {
            pages,
            index: 0,
            wrap,
        }
    }

    #[must_use]
    pub fn current(&self) -> &str {
        &self.pages[self.index]
    }

    /// 1-based position of the current page.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.wrap || self.index + 1 < self.pages.len()
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.wrap || self.index > 0
    }

    pub fn next_page(&mut self) -> &str {
        if self.index + 1 < self.pages.len() {
            self.index += 1;
        } else if self.wrap {
            self.index = 0;
        }
        self.current()
    }

    pub fn prev_page(&mut self) -> &str {
        if self.index > 0 {
            self.index -= 1;
        } else if self.wrap {
            self.index = self.pages.len() - 1;
        }
        self.current()
    }

    /// Swap in a new set of pages and return to the first one.
    pub fn replace(&mut self, pages: Vec<String>) {
        *self = Self::new(pages, self.wrap);
    }
}
