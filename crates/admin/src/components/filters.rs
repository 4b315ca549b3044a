//! Options for the `<select>` filters above list tables.

/// One `<option>` in a filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FilterOption {
    /// Create an option, selected when `value` equals `current`.
    #[must_use]
    pub fn new(value: &str, label: &str, current: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: value == current,
        }
    }

    /// Options for every item of a list, with `current` selected.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let statuses = FilterOption::list(OrderStatus::ALL, "shipped", |s| (s.as_str(), s.label()));
    /// ```
    #[must_use]
    pub fn list<T: Copy>(
        items: &[T],
        current: &str,
        parts: impl Fn(T) -> (&'static str, &'static str),
    ) -> Vec<Self> {
        items
            .iter()
            .map(|item| {
                let (value, label) = parts(*item);
                Self::new(value, label, current)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use elegance_core::OrderStatus;

    use super::*;

    #[test]
    fn test_list_marks_current() {
        let options = FilterOption::list(OrderStatus::ALL, "shipped", |s| (s.as_str(), s.label()));
        assert_eq!(options.len(), OrderStatus::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().map(|o| o.value.as_str()), Some("shipped"));
    }
}
