//! Order resolution: turns partial identifying information into one order,
//! a ranked list of candidates, or a typed not-found outcome.
//!
//! Exact-key lookups are tried before free-text search. The resolver is
//! stateless; the store is passed to every call and only ever read.

pub mod scoring;
pub mod summary;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::customer::CustomerId;
use crate::domain::order::{Order, OrderId, TrackingId};
use crate::errors::StoreError;
use crate::store::OrderStore;

pub use scoring::{FreeTextQuery, ScoreBreakdown, ScoringPolicy};
pub use summary::{CandidateSummary, ResolutionSummary};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Identifying information supplied by the caller. Blank strings count as unset;
/// other values are looked up exactly as given, surrounding whitespace included.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub natural_query: Option<String>,
}

impl OrderQuery {
    pub fn by_order_id(order_id: impl Into<String>) -> Self {
        Self { order_id: Some(order_id.into()), ..Self::default() }
    }

    pub fn by_tracking_id(tracking_id: impl Into<String>) -> Self {
        Self { tracking_id: Some(tracking_id.into()), ..Self::default() }
    }

    pub fn by_customer_id(customer_id: impl Into<String>) -> Self {
        Self { customer_id: Some(customer_id.into()), ..Self::default() }
    }

    pub fn natural(natural_query: impl Into<String>) -> Self {
        Self { natural_query: Some(natural_query.into()), ..Self::default() }
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_natural_query(mut self, natural_query: impl Into<String>) -> Self {
        self.natural_query = Some(natural_query.into());
        self
    }

    fn order_id(&self) -> Option<OrderId> {
        present(&self.order_id).map(|value| OrderId(value.to_string()))
    }

    fn tracking_id(&self) -> Option<TrackingId> {
        present(&self.tracking_id).map(|value| TrackingId(value.to_string()))
    }

    fn customer_id(&self) -> Option<CustomerId> {
        present(&self.customer_id).map(|value| CustomerId(value.to_string()))
    }

    fn natural_query(&self) -> Option<&str> {
        present(&self.natural_query)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// An order paired with the score it earned during one free-text resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoredCandidate {
    pub order: Order,
    pub match_score: u32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotFoundReason {
    #[error("no such order_id `{0}`")]
    NoSuchOrderId(OrderId),
    #[error("no order found with tracking_id `{0}`")]
    NoSuchTrackingId(TrackingId),
    #[error("no orders found matching `{query}`")]
    NoMatches { query: String },
    #[error("no orders found for customer `{0}`")]
    NoCustomerOrders(CustomerId),
    #[error("insufficient query information")]
    InsufficientQuery,
    #[error("{lookup} lookup failed: {message}")]
    StoreUnavailable { lookup: Lookup, message: String },
}

impl NotFoundReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSuchOrderId(_) => "no_such_order_id",
            Self::NoSuchTrackingId(_) => "no_such_tracking_id",
            Self::NoMatches { .. } => "no_matches",
            Self::NoCustomerOrders(_) => "no_customer_orders",
            Self::InsufficientQuery => "insufficient_query",
            Self::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

/// The store access path a resolution branch used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    OrderId,
    TrackingId,
    CustomerId,
    FullScan,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::TrackingId => "tracking_id",
            Self::CustomerId => "customer_id",
            Self::FullScan => "full_scan",
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(Order),
    /// Every candidate that scored above zero, best first. Never truncated here.
    Ambiguous(Vec<ScoredCandidate>),
    /// Customer-only lookups: most recent orders first, capped at the recent limit.
    Recent { customer_id: CustomerId, orders: Vec<Order>, total: usize },
    NotFound(NotFoundReason),
}

impl Resolution {
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Ambiguous(_) => "ambiguous",
            Self::Recent { .. } => "recent",
            Self::NotFound(_) => "not_found",
        }
    }

    pub fn found(&self) -> Option<&Order> {
        match self {
            Self::Found(order) => Some(order),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderResolver {
    policy: ScoringPolicy,
    recent_limit: usize,
}

impl Default for OrderResolver {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

impl OrderResolver {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy, recent_limit: DEFAULT_RECENT_LIMIT }
    }

    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit.max(1);
        self
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub async fn resolve<S>(&self, store: &S, query: &OrderQuery, today: NaiveDate) -> Resolution
    where
        S: OrderStore + ?Sized,
    {
        if let Some(order_id) = query.order_id() {
            debug!(event_name = "resolver.branch", branch = "order_id", order_id = %order_id);
            return match store.get_by_id(&order_id).await {
                Ok(Some(order)) => Resolution::Found(order),
                Ok(None) => Resolution::NotFound(NotFoundReason::NoSuchOrderId(order_id)),
                Err(error) => store_unavailable(Lookup::OrderId, error),
            };
        }

        if let Some(tracking_id) = query.tracking_id() {
            debug!(
                event_name = "resolver.branch",
                branch = "tracking_id",
                tracking_id = %tracking_id
            );
            return match store.query_by_tracking_id(&tracking_id).await {
                Ok(orders) => match orders.into_iter().next() {
                    Some(order) => Resolution::Found(order),
                    None => Resolution::NotFound(NotFoundReason::NoSuchTrackingId(tracking_id)),
                },
                Err(error) => store_unavailable(Lookup::TrackingId, error),
            };
        }

        let customer_id = query.customer_id();

        if let Some(natural_query) = query.natural_query() {
            debug!(
                event_name = "resolver.branch",
                branch = "natural_query",
                customer_filter = customer_id.is_some()
            );
            return self.search(store, natural_query, customer_id.as_ref(), today).await;
        }

        if let Some(customer_id) = customer_id {
            debug!(
                event_name = "resolver.branch",
                branch = "customer_id",
                customer_id = %customer_id
            );
            return match store.query_by_customer_id(&customer_id).await {
                Ok(orders) if orders.is_empty() => {
                    Resolution::NotFound(NotFoundReason::NoCustomerOrders(customer_id))
                }
                Ok(mut orders) => {
                    let total = orders.len();
                    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
                    orders.truncate(self.recent_limit);
                    Resolution::Recent { customer_id, orders, total }
                }
                Err(error) => store_unavailable(Lookup::CustomerId, error),
            };
        }

        Resolution::NotFound(NotFoundReason::InsufficientQuery)
    }

    async fn search<S>(
        &self,
        store: &S,
        natural_query: &str,
        customer_id: Option<&CustomerId>,
        today: NaiveDate,
    ) -> Resolution
    where
        S: OrderStore + ?Sized,
    {
        let (lookup, candidates) = match customer_id {
            Some(customer_id) => {
                (Lookup::CustomerId, store.query_by_customer_id(customer_id).await)
            }
            None => (Lookup::FullScan, store.scan_all().await),
        };
        let candidates = match candidates {
            Ok(candidates) => candidates,
            Err(error) => return store_unavailable(lookup, error),
        };

        let query = FreeTextQuery::parse(natural_query, today);
        let scanned = candidates.len();
        let mut ranked = self.rank(candidates, &query);
        debug!(
            event_name = "resolver.search.ranked",
            lookup = %lookup,
            parsed_date = ?query.parsed_date(),
            scanned,
            matched = ranked.len()
        );

        match ranked.len() {
            0 => Resolution::NotFound(NotFoundReason::NoMatches {
                query: natural_query.to_string(),
            }),
            1 => Resolution::Found(ranked.remove(0).order),
            _ => Resolution::Ambiguous(ranked),
        }
    }

    /// Scores every candidate, drops zero scores and sorts best first. The sort
    /// is stable, so equal scores keep the store's order.
    pub fn rank(&self, candidates: Vec<Order>, query: &FreeTextQuery) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter_map(|order| {
                let match_score = self.policy.score(&order, query);
                (match_score > 0).then_some(ScoredCandidate { order, match_score })
            })
            .collect();
        ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        ranked
    }
}

fn store_unavailable(lookup: Lookup, error: StoreError) -> Resolution {
    warn!(
        event_name = "resolver.store_unavailable",
        lookup = %lookup,
        error_class = error.error_class(),
        error = %error,
        "order store lookup failed"
    );
    Resolution::NotFound(NotFoundReason::StoreUnavailable { lookup, message: error.to_string() })
}
