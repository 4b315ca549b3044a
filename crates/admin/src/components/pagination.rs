//! Pagination links for list pages.
//!
//! Links keep the page's current filters; only `page` changes.

use elegance_core::catalog::PageInfo;

/// A numbered page link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Prev/next and numbered links plus the "Showing x-y of z" counts.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub first_item: u64,
    pub last_item: u64,
    pub total: u64,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
}

impl Pagination {
    /// Build links for `path` with the given non-empty filter parameters.
    #[must_use]
    pub fn new(info: PageInfo, path: &str, params: &[(&str, &str)]) -> Self {
        let href = |page: u32| page_href(path, params, page);
        Self {
            first_item: info.first_item(),
            last_item: info.last_item(),
            total: info.total,
            prev: info.has_prev().then(|| href(info.page - 1)),
            next: info.has_next().then(|| href(info.page + 1)),
            pages: info
                .window()
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == info.page,
                })
                .collect(),
        }
    }

    /// Whether there is more than one page to link to.
    #[must_use]
    pub fn is_multi_page(&self) -> bool {
        self.pages.len() > 1
    }
}

/// URL of one page of a filtered list.
#[must_use]
pub fn page_href(path: &str, params: &[(&str, &str)], page: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter().filter(|(_, v)| !v.trim().is_empty()) {
        query.append_pair(key, value);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use elegance_core::catalog::Page;

    use super::*;

    #[test]
    fn test_links_keep_filters() {
        let info = Page::new(Some(2), 20).info(95);
        let pagination = Pagination::new(info, "/orders", &[("status", "pending"), ("search", "")]);

        assert_eq!(pagination.first_item, 21);
        assert_eq!(pagination.last_item, 40);
        assert_eq!(pagination.prev.as_deref(), Some("/orders?status=pending"));
        assert_eq!(pagination.next.as_deref(), Some("/orders?status=pending&page=3"));
        assert_eq!(
            pagination.pages.iter().map(|p| p.number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(pagination.pages.iter().any(|p| p.current && p.number == 2));
    }

    #[test]
    fn test_single_page() {
        let info = Page::new(None, 20).info(3);
        let pagination = Pagination::new(info, "/customers", &[]);
        assert!(!pagination.is_multi_page());
        assert!(pagination.prev.is_none());
        assert!(pagination.next.is_none());
    }

    #[test]
    fn test_page_past_the_end() {
        let info = Page::new(Some(u32::MAX), 20).info(95);
        let pagination = Pagination::new(info, "/orders", &[]);
        assert!(pagination.pages.is_empty());
        assert!(pagination.next.is_none());
        assert_eq!(
            pagination.prev,
            Some(format!("/orders?page={}", Page::MAX_PAGE - 1))
        );
    }

    #[test]
    fn test_blank_filters_are_dropped() {
        assert_eq!(page_href("/inventory", &[("search", ""), ("stock", "")], 1), "/inventory");
    }

    #[test]
    fn test_search_is_encoded() {
        assert_eq!(
            page_href("/products", &[("search", "black abaya")], 2),
            "/products?search=black+abaya&page=2"
        );
    }
}
