use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub(crate) struct PageInfo {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Slice one page out of an already filtered and sorted collection.
pub(crate) fn paginate<T>(items: Vec<T>, query: &PageQuery) -> (Vec<T>, PageInfo) {
    let page = query.page();
    let limit = query.limit();
    let total = items.len();
    let pages = total.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    let page_items = items
        .into_iter()
        .skip(start)
        .take(limit)
        .collect();

    (
        page_items,
        PageInfo {
            page,
            limit,
            total,
            pages,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: usize, limit: usize) -> PageQuery {
        PageQuery {
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[test]
    fn slices_requested_page() {
        let items: Vec<u32> = (1..=5).collect();
        let (page, info) = paginate(items, &query(2, 2));
        assert_eq!(page, vec![3, 4]);
        assert_eq!(
            info,
            PageInfo {
                page: 2,
                limit: 2,
                total: 5,
                pages: 3
            }
        );
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items: Vec<u32> = (1..=3).collect();
        let (page, info) = paginate(items, &query(5, 2));
        assert!(page.is_empty());
        assert_eq!(info.total, 3);
    }

    #[test]
    fn empty_collection_has_zero_pages() {
        let (page, info) = paginate(Vec::<u32>::new(), &query(1, 20));
        assert!(page.is_empty());
        assert_eq!(info.pages, 0);
    }

    #[test]
    fn defaults_and_clamps() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_LIMIT);

        let defaults = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.limit(), DEFAULT_LIMIT);
    }
}
