use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::resolver::{Resolution, ScoredCandidate};

pub const DEFAULT_DISPLAY_LIMIT: usize = 5;

/// Structured view of a [`Resolution`] for callers that present results.
///
/// Candidate lists are cut to the display limit here; `overflow` records how
/// many were left out so the caller can say so.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    pub candidates: Vec<CandidateSummary>,
    pub total: usize,
    pub overflow: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
    pub order_id: OrderId,
    pub product_name: String,
    pub status: OrderStatus,
    pub order_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReasonSummary {
    pub kind: &'static str,
    pub message: String,
}

impl CandidateSummary {
    fn from_order(order: &Order, match_score: Option<u32>) -> Self {
        Self {
            order_id: order.order_id.clone(),
            product_name: order.product_name.clone(),
            status: order.status,
            order_date: order.order_date,
            match_score,
        }
    }
}

impl From<&ScoredCandidate> for CandidateSummary {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self::from_order(&candidate.order, Some(candidate.match_score))
    }
}

impl ResolutionSummary {
    pub fn from_resolution(resolution: &Resolution, display_limit: usize) -> Self {
        let display_limit = display_limit.max(1);
        let outcome = resolution.outcome();

        match resolution {
            Resolution::Found(order) => Self {
                outcome,
                order: Some(order.clone()),
                candidates: Vec::new(),
                total: 1,
                overflow: 0,
                reason: None,
            },
            Resolution::Ambiguous(ranked) => {
                let candidates: Vec<CandidateSummary> =
                    ranked.iter().take(display_limit).map(CandidateSummary::from).collect();
                Self {
                    outcome,
                    order: None,
                    overflow: ranked.len() - candidates.len(),
                    total: ranked.len(),
                    candidates,
                    reason: None,
                }
            }
            Resolution::Recent { orders, total, .. } => {
                let candidates: Vec<CandidateSummary> = orders
                    .iter()
                    .take(display_limit)
                    .map(|order| CandidateSummary::from_order(order, None))
                    .collect();
                Self {
                    outcome,
                    order: None,
                    overflow: total.saturating_sub(candidates.len()),
                    total: *total,
                    candidates,
                    reason: None,
                }
            }
            Resolution::NotFound(reason) => Self {
                outcome,
                order: None,
                candidates: Vec::new(),
                total: 0,
                overflow: 0,
                reason: Some(ReasonSummary { kind: reason.kind(), message: reason.to_string() }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::Value;

    use super::ResolutionSummary;
    use crate::domain::customer::CustomerId;
    use crate::domain::order::{Order, OrderId, OrderStatus};
    use crate::resolver::{NotFoundReason, Resolution, ScoredCandidate};

    fn order(n: u32) -> Order {
        Order {
            order_id: OrderId(format!("ORD-{n}")),
            tracking_id: None,
            customer_id: CustomerId("CUST-1".to_string()),
            product_name: format!("Xbox Series {n}"),
            order_date: NaiveDate::from_ymd_opt(2024, 5, n).expect("valid date"),
            status: OrderStatus::Delivered,
            order_total: Decimal::new(49900, 2),
            estimated_delivery: None,
            shipping_address: None,
            items: Vec::new(),
        }
    }

    #[test]
    fn ambiguous_summary_caps_display_and_counts_overflow() {
        let ranked: Vec<ScoredCandidate> = (1..=7)
            .map(|n| ScoredCandidate { order: order(n), match_score: 10 - n })
            .collect();

        let summary = ResolutionSummary::from_resolution(&Resolution::Ambiguous(ranked), 5);

        assert_eq!(summary.outcome, "ambiguous");
        assert_eq!(summary.candidates.len(), 5);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.overflow, 2);
        assert_eq!(summary.candidates[0].match_score, Some(9));
        assert_eq!(summary.candidates[4].order_id.0, "ORD-5");
    }

    #[test]
    fn recent_summary_reports_untruncated_total() {
        let resolution = Resolution::Recent {
            customer_id: CustomerId("CUST-1".to_string()),
            orders: (1..=5).map(order).collect(),
            total: 9,
        };

        let summary = ResolutionSummary::from_resolution(&resolution, 5);

        assert_eq!(summary.candidates.len(), 5);
        assert_eq!(summary.overflow, 4);
        assert!(summary.candidates.iter().all(|candidate| candidate.match_score.is_none()));
    }

    #[test]
    fn found_summary_serializes_full_order() {
        let summary = ResolutionSummary::from_resolution(&Resolution::Found(order(3)), 5);

        let json = serde_json::to_value(&summary).expect("serialize summary");

        assert_eq!(json["outcome"], "found");
        assert_eq!(json["order"]["order_id"], "ORD-3");
        assert_eq!(json["order"]["status"], "delivered");
        assert_eq!(json["order"]["order_date"], "2024-05-03");
        assert_eq!(json["total"], 1);
        assert_eq!(json.get("reason"), None::<&Value>);
    }

    #[test]
    fn not_found_summary_carries_reason() {
        let resolution = Resolution::NotFound(NotFoundReason::InsufficientQuery);

        let json = serde_json::to_value(ResolutionSummary::from_resolution(&resolution, 5))
            .expect("serialize summary");

        assert_eq!(json["outcome"], "not_found");
        assert_eq!(json["reason"]["kind"], "insufficient_query");
        assert_eq!(json["reason"]["message"], "insufficient query information");
        assert_eq!(json["candidates"], Value::Array(Vec::new()));
    }
}
