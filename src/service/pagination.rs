use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

/// Page number and size as requested, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Unparsable values fall back to page 1 / `default_size`.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>, default_size: usize, max_size: usize) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map(|p| p.max(1) as usize)
            .unwrap_or(1);
        let page_size = page_size
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(default_size)
            .clamp(1, max_size.max(1));
        PageRequest { page, page_size }
    }
}

/// Slices an already ordered sequence. The requested page is clamped into
/// `[1, total_pages]`, and an empty sequence is page 1 of 1.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page_number: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(page_size).max(1);
    let page_number = page_number.clamp(1, total_pages);
    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(total_count);
    Page {
        items: items[start..end].to_vec(),
        page_number,
        page_size,
        total_pages,
        total_count,
    }
}
