use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::info;

use ordertrack_core::resolver::summary::DEFAULT_DISPLAY_LIMIT;
use ordertrack_core::resolver::{OrderQuery, OrderResolver, ResolutionSummary};
use ordertrack_core::store::OrderStore;

use crate::tools::{Tool, ToolError};

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Looks up an order from `{order_id?, tracking_id?, customer_id?,
/// natural_query?}` and answers with a [`ResolutionSummary`].
pub struct TrackOrderTool {
    store: Arc<dyn OrderStore>,
    resolver: OrderResolver,
    display_limit: usize,
    clock: Clock,
}

impl TrackOrderTool {
    pub const NAME: &'static str = "track_order";

    pub fn new(store: Arc<dyn OrderStore>, resolver: OrderResolver) -> Self {
        Self {
            store,
            resolver,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    pub fn with_display_limit(mut self, display_limit: usize) -> Self {
        self.display_limit = display_limit.max(1);
        self
    }

    /// Replaces the local-date clock used to anchor relative date phrases.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }
}

#[async_trait]
impl Tool for TrackOrderTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let query: OrderQuery = serde_json::from_value(input).map_err(|error| {
            ToolError::InvalidInput { tool: Self::NAME, message: error.to_string() }
        })?;

        let today = (self.clock)();
        let resolution = self.resolver.resolve(self.store.as_ref(), &query, today).await;
        let summary = ResolutionSummary::from_resolution(&resolution, self.display_limit);
        info!(
            event_name = "agent.track_order.resolved",
            outcome = summary.outcome,
            total = summary.total,
            "order lookup resolved"
        );

        Ok(serde_json::to_value(summary)?)
    }
}
