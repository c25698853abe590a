use serde::Serialize;

/// A requested page number, 1-based. Never an error: garbage means page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    number: i64,
}

impl PageRequest {
    pub fn first() -> Self {
        Self { number: 1 }
    }

    pub fn new(number: i64) -> Self {
        Self {
            number: number.max(1),
        }
    }

    /// Parse the raw `page` query value.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self::new)
            .unwrap_or_else(Self::first)
    }

    pub fn number(&self) -> i64 {
        self.number
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// The slice of a listing a page request resolves to once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub total_pages: i64,
    pub per_page: i64,
    pub count: i64,
}

impl PageWindow {
    /// Clamp `request` into `[1, last page]`. An empty listing still has one page.
    pub fn resolve(request: PageRequest, count: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let count = count.max(0);
        let total_pages = ((count + per_page - 1) / per_page).max(1);

        Self {
            number: request.number().clamp(1, total_pages),
            total_pages,
            per_page,
            count,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub total_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            count: window.count,
            has_next: window.number < window.total_pages,
            has_previous: window.number > 1,
        }
    }
}
