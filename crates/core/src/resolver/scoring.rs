//! Free-text match scoring for order candidates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::parse_relative_date;
use crate::domain::order::Order;

/// Product-category vocabulary recognised in free-text queries.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "iphone",
    "macbook",
    "airpods",
    "ipad",
    "watch",
    "tv",
    "headphones",
    "laptop",
    "phone",
    "tablet",
    "console",
    "playstation",
    "xbox",
];

pub const DEFAULT_KEYWORD_WEIGHT: u32 = 2;
pub const DEFAULT_DATE_MATCH_WEIGHT: u32 = 3;
pub const DEFAULT_FUZZY_OVERLAP_WEIGHT: u32 = 1;
/// Query words must be strictly longer than this to take part in fuzzy overlap.
pub const DEFAULT_MIN_FUZZY_WORD_LEN: usize = 3;

/// Weights applied when scoring an order against a free-text query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Keyword (lowercase) to the weight added when both query and product name contain it.
    pub keywords: BTreeMap<String, u32>,
    pub date_match_weight: u32,
    pub fuzzy_overlap_weight: u32,
    pub min_fuzzy_word_len: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS
                .iter()
                .map(|keyword| ((*keyword).to_string(), DEFAULT_KEYWORD_WEIGHT))
                .collect(),
            date_match_weight: DEFAULT_DATE_MATCH_WEIGHT,
            fuzzy_overlap_weight: DEFAULT_FUZZY_OVERLAP_WEIGHT,
            min_fuzzy_word_len: DEFAULT_MIN_FUZZY_WORD_LEN,
        }
    }
}

/// A free-text query prepared once per resolution call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeTextQuery {
    text: String,
    parsed_date: Option<NaiveDate>,
}

impl FreeTextQuery {
    pub fn parse(raw: &str, today: NaiveDate) -> Self {
        let text = raw.trim().to_lowercase();
        let parsed_date = parse_relative_date(&text, today);
        Self { text, parsed_date }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.parsed_date
    }
}

/// Per-signal contributions to a candidate's score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub keyword: u32,
    pub date: u32,
    pub fuzzy: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.keyword.saturating_add(self.date).saturating_add(self.fuzzy)
    }
}

impl ScoringPolicy {
    pub fn score(&self, order: &Order, query: &FreeTextQuery) -> u32 {
        self.breakdown(order, query).total()
    }

    /// Evaluates every signal; none of them short-circuits the others.
    pub fn breakdown(&self, order: &Order, query: &FreeTextQuery) -> ScoreBreakdown {
        let product_name = order.product_name.to_lowercase();

        let keyword = self
            .keywords
            .iter()
            .filter(|(keyword, _)| {
                query.text.contains(keyword.as_str()) && product_name.contains(keyword.as_str())
            })
            .fold(0u32, |acc, (_, weight)| acc.saturating_add(*weight));

        let date = match query.parsed_date {
            Some(date) if date == order.order_date => self.date_match_weight,
            _ => 0,
        };

        let mut fuzzy = 0u32;
        for query_word in query.text.split_whitespace() {
            if query_word.chars().count() <= self.min_fuzzy_word_len {
                continue;
            }
            for product_word in product_name.split_whitespace() {
                if product_word.contains(query_word) || query_word.contains(product_word) {
                    fuzzy = fuzzy.saturating_add(self.fuzzy_overlap_weight);
                }
            }
        }

        ScoreBreakdown { keyword, date, fuzzy }
    }
}
