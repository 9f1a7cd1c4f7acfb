use serde::Serialize;

const LEFT_EDGE: u64 = 2;
const LEFT_CURRENT: u64 = 2;
const RIGHT_CURRENT: u64 = 4;
const RIGHT_EDGE: u64 = 2;

/// Page numbers to link to, `None` marking a gap.
fn page_window(total_pages: u64, current_page: u64) -> Vec<Option<u64>> {
    if total_pages == 0 {
        return Vec::new();
    }

    let mut pages = Vec::new();

    let left_end = (1 + LEFT_EDGE).min(total_pages + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(LEFT_CURRENT));
    let mid_end = (current_page + RIGHT_CURRENT + 1).min(total_pages + 1);
    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(total_pages.saturating_sub(RIGHT_EDGE) + 1);
    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=total_pages).map(Some));

    pages
}

/// Pager shown under the result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub pages: Vec<Option<u64>>,
    pub page: u64,
    pub total_pages: u64,
    pub previous: Option<u64>,
    pub next: Option<u64>,
}

impl PageLinks {
    pub fn new(current_page: u64, total_pages: u64) -> Self {
        let page = current_page.max(1);

        Self {
            pages: page_window(total_pages, page),
            page,
            total_pages,
            previous: (page > 1).then(|| page - 1),
            next: (page < total_pages).then(|| page + 1),
        }
    }
}
