//! Product review statistics.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Lowest and highest star rating.
pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Count and share of reviews for one star value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarCount {
    pub stars: i16,
    pub count: u32,
    /// Whole percent of all reviews.
    pub percent: u32,
}

/// Aggregate of a product's approved ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    /// Mean rating to one decimal place; zero without reviews.
    pub average: Decimal,
    pub count: u32,
    /// Five stars first.
    pub breakdown: Vec<StarCount>,
}

impl RatingSummary {
    /// Summarize ratings. Values outside `1..=5` are ignored.
    #[must_use]
    pub fn from_ratings(ratings: &[i16]) -> Self {
        let valid: Vec<i16> = ratings
            .iter()
            .copied()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .collect();
        let count = u32::try_from(valid.len()).unwrap_or(u32::MAX);

        let average = if count == 0 {
            Decimal::ZERO
        } else {
            let sum: i64 = valid.iter().map(|r| i64::from(*r)).sum();
            (Decimal::from(sum) / Decimal::from(count))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        let breakdown = (MIN_RATING..=MAX_RATING)
            .rev()
            .map(|stars| {
                let n = u32::try_from(valid.iter().filter(|r| **r == stars).count()).unwrap_or(0);
                let percent = if count == 0 {
                    0
                } else {
                    (n * 100 + count / 2) / count
                };
                StarCount {
                    stars,
                    count: n,
                    percent,
                }
            })
            .collect();

        Self {
            average,
            count,
            breakdown,
        }
    }

    /// Average rounded to whole stars, for star icons.
    #[must_use]
    pub fn full_stars(&self) -> u32 {
        use rust_decimal::prelude::ToPrimitive;
        self.average
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }
}

/// Order of reviews on a product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl ReviewSort {
    pub const ALL: &'static [Self] = &[Self::Newest, Self::Oldest, Self::Highest, Self::Lowest];

    /// Parse a `review_sort` query value. Unknown values give newest first.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "oldest" => Self::Oldest,
            "highest" | "rating_desc" => Self::Highest,
            "lowest" | "rating_asc" => Self::Lowest,
            _ => Self::Newest,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Highest => "highest",
            Self::Lowest => "lowest",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest first",
            Self::Oldest => "Oldest first",
            Self::Highest => "Highest rated",
            Self::Lowest => "Lowest rated",
        }
    }

    /// `ORDER BY` clause for the `reviews` table. Ties go to the newer review.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::Oldest => "created_at ASC, id ASC",
            Self::Highest => "rating DESC, created_at DESC, id DESC",
            Self::Lowest => "rating ASC, created_at DESC, id DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, Decimal::ZERO);
        assert_eq!(summary.breakdown.len(), 5);
        assert!(summary.breakdown.iter().all(|s| s.percent == 0));
    }

    #[test]
    fn test_average_and_breakdown() {
        let summary = RatingSummary::from_ratings(&[5, 5, 4, 3]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.average, Decimal::new(43, 1));
        assert_eq!(summary.full_stars(), 4);

        let five = summary.breakdown.first().copied();
        assert_eq!(
            five,
            Some(StarCount {
                stars: 5,
                count: 2,
                percent: 50
            })
        );
        let one = summary.breakdown.last().copied();
        assert_eq!(one.map(|s| s.count), Some(0));
    }

    #[test]
    fn test_ignores_out_of_range() {
        let summary = RatingSummary::from_ratings(&[0, 6, 2]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, Decimal::from(2));
    }

    #[test]
    fn test_review_sort_parse() {
        assert_eq!(ReviewSort::parse("highest"), ReviewSort::Highest);
        assert_eq!(ReviewSort::parse(" lowest "), ReviewSort::Lowest);
        assert_eq!(ReviewSort::parse("oldest"), ReviewSort::Oldest);
        assert_eq!(ReviewSort::parse("rating; DROP TABLE reviews"), ReviewSort::Newest);
        assert_eq!(ReviewSort::parse(""), ReviewSort::default());

        for sort in ReviewSort::ALL {
            assert_eq!(ReviewSort::parse(sort.as_str()), *sort);
        }
        assert!(ReviewSort::Highest.sql().starts_with("rating DESC"));
    }
}
