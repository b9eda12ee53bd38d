/// The slice of data visible on one page plus page metadata.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_items: usize,
}

/// Pagination metadata handed to views and to the page-change callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationState {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn state(&self) -> PaginationState {
        PaginationState {
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
            total_items: self.total_items,
        }
    }
}

impl PaginationState {
    /// Index of the first item on the current page within the full dataset.
    pub fn first_item(&self) -> usize {
        self.page * self.page_size
    }

    /// Index one past the last item on the current page.
    pub fn last_item(&self) -> usize {
        if self.page_size == 0 {
            return self.total_items;
        }
        std::cmp::min(self.first_item() + self.page_size, self.total_items)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count
    }
}

pub fn page_count(total_items: usize, page_size: usize) -> usize {
    if total_items == 0 {
        0
    } else if page_size == 0 {
        // Degenerate page size renders everything on a single page
        1
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Clamp a requested page to the valid range for the given data length.
pub fn clamp_page(requested_page: usize, total_items: usize, page_size: usize) -> usize {
    let count = page_count(total_items, page_size);
    std::cmp::min(requested_page, count.saturating_sub(1))
}

/// Slice `data` into the page `requested_page`. Out-of-range pages clamp to
/// the last valid page; the input is never modified.
pub fn paginate<T>(data: &[T], page_size: usize, requested_page: usize) -> Page<'_, T> {
    let total_items = data.len();
    let page = clamp_page(requested_page, total_items, page_size);
    let items = if page_size == 0 {
        data
    } else {
        let rbegin = page * page_size;
        let rend = std::cmp::min(rbegin + page_size, total_items);
        &data[rbegin..rend]
    };

    Page {
        items,
        page,
        page_count: page_count(total_items, page_size),
        page_size,
        total_items,
    }
}

/// Page that keeps the first visible row of the old layout on screen after
/// a page size change.
pub fn page_after_resize(
    page: usize,
    old_page_size: usize,
    new_page_size: usize,
    total_items: usize,
) -> usize {
    if new_page_size == 0 {
        return 0;
    }
    let first_visible = page * old_page_size;
    clamp_page(first_visible / new_page_size, total_items, new_page_size)
}
