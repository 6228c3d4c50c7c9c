use crate::classify::{classify, Caught, ErrorContext};

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Fixed parameters of one logical list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Narrative name, used as the path segment of the list endpoint.
    pub name: String,
    pub page_size: u32,
    /// Forwarded to the backend only when enabled.
    pub debug: bool,
}

impl ListQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            debug: false,
        }
    }
}

/// One page as returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// A parent record of a narrative, in server relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentItem {
    pub parent: String,
    pub matches: u32,
    pub score: Option<f64>,
    pub symbol: Option<String>,
    pub sources: Vec<String>,
    /// Link to the parent's market page.
    pub url: Option<String>,
    /// Last price in USD.
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
}

impl ParentItem {
    pub fn new(parent: impl Into<String>, matches: u32) -> Self {
        Self {
            parent: parent.into(),
            matches,
            score: None,
            symbol: None,
            sources: Vec::new(),
            url: None,
            price: None,
            market_cap: None,
        }
    }
}

/// Accumulated results of a cursor-paginated query.
///
/// Items are append-only. Once the cursor is exhausted the page never changes again.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    items: Vec<T>,
    cursor: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl<T> ListPage<T> {
    pub fn seeded(initial: Page<T>) -> Self {
        Self {
            items: initial.items,
            cursor: initial.next_cursor.filter(|cursor| !cursor.is_empty()),
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Claims the single in-flight slot and returns the cursor to request.
    ///
    /// Returns `None` when the list is exhausted or a fetch is already outstanding.
    pub fn begin_load(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.loading = true;
        Some(cursor)
    }

    pub fn apply_page(&mut self, page: Page<T>) {
        if !self.loading {
            return;
        }
        self.loading = false;
        self.items.extend(page.items);
        self.cursor = page.next_cursor.filter(|cursor| !cursor.is_empty());
        self.error = None;
    }

    /// Records a failed fetch. Items and cursor stay as they were so the
    /// same page can be requested again.
    pub fn apply_failure(&mut self, caught: &Caught) {
        if !self.loading {
            return;
        }
        self.loading = false;
        self.error = Some(classify(caught, ErrorContext::LoadingMore));
    }
}
