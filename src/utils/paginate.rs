use serde::Serialize;

/// Number of images per page on the list view.
pub const PAGE_SIZE: i64 = 8;

/// Why a requested page could not be served as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// The page parameter was absent or not an integer.
    NotAnInteger,
    /// The page number is below 1 or past the last page.
    Empty,
}

/// Splits a collection of `count` items into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

/// One resolved page of a [`Paginator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Total pages; an empty collection still has one (empty) first page.
    pub fn num_pages(&self) -> i64 {
        ((self.count + self.per_page - 1) / self.per_page).max(1)
    }

    /// Resolves a raw query value into a page.
    pub fn page(&self, raw: Option<&str>) -> Result<Page, PageError> {
        let number = raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(PageError::NotAnInteger)?;
        self.page_number(number)
    }

    pub fn page_number(&self, number: i64) -> Result<Page, PageError> {
        let num_pages = self.num_pages();
        if number < 1 || number > num_pages {
            return Err(PageError::Empty);
        }

        let offset = (number - 1) * self.per_page;
        Ok(Page {
            number,
            num_pages,
            offset,
            limit: self.per_page.min(self.count - offset).max(0),
            has_previous: number > 1,
            has_next: number < num_pages,
        })
    }

    pub fn first_page(&self) -> Page {
        self.page_number(1).unwrap_or_else(|_| self.empty_page())
    }

    pub fn last_page(&self) -> Page {
        self.page_number(self.num_pages())
            .unwrap_or_else(|_| self.empty_page())
    }

    // num_pages() >= 1, so this is never reached for pages 1..=num_pages
    fn empty_page(&self) -> Page {
        Page {
            number: 1,
            num_pages: 1,
            offset: 0,
            limit: 0,
            has_previous: false,
            has_next: false,
        }
    }
}
