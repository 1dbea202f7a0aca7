use async_trait::async_trait;

use crate::domain::customer::CustomerId;
use crate::domain::order::{Order, OrderId, TrackingId};
use crate::errors::StoreError;

/// Read access to the order records the resolver searches.
///
/// The tracking index is expected to be unique but is modelled as a sequence;
/// implementations return orders in their natural scan order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn query_by_tracking_id(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<Vec<Order>, StoreError>;

    async fn query_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Order>, StoreError>;

    async fn scan_all(&self) -> Result<Vec<Order>, StoreError>;
}
