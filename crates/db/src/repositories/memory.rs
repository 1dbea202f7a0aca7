use std::collections::HashMap;

use tokio::sync::RwLock;

use ordertrack_core::domain::customer::CustomerId;
use ordertrack_core::domain::order::{Order, OrderId, TrackingId};
use ordertrack_core::errors::StoreError;
use ordertrack_core::store::OrderStore;

use super::{OrderRepository, RepositoryError};

#[derive(Default)]
struct Orders {
    by_id: HashMap<String, Order>,
    insertion_order: Vec<String>,
}

impl Orders {
    fn upsert(&mut self, order: Order) {
        let key = order.order_id.0.clone();
        if self.by_id.insert(key.clone(), order).is_none() {
            self.insertion_order.push(key);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Order> {
        self.insertion_order.iter().filter_map(|key| self.by_id.get(key))
    }
}

/// Order store held entirely in memory.
///
/// Scans and filtered queries yield orders in first-insertion order; saving an
/// existing id replaces the record in place.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Orders>,
}

impl InMemoryOrderStore {
    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut state = Orders::default();
        for order in orders {
            state.upsert(order);
        }
        Self { orders: RwLock::new(state) }
    }

    pub async fn insert(&self, order: Order) {
        self.orders.write().await.upsert(order);
    }

    pub async fn extend(&self, orders: impl IntoIterator<Item = Order>) {
        let mut state = self.orders.write().await;
        for order in orders {
            state.upsert(order);
        }
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.insertion_order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_by_id(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.by_id.get(&id.0).cloned())
    }

    async fn query_by_tracking_id(&self, id: &TrackingId) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().filter(|order| order.tracking_id.as_ref() == Some(id)).cloned().collect())
    }

    async fn query_by_customer_id(&self, id: &CustomerId) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().filter(|order| &order.customer_id == id).cloned().collect())
    }

    async fn scan_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().cloned().collect())
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        self.insert(order).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use ordertrack_core::domain::customer::CustomerId;
    use ordertrack_core::domain::order::{Order, OrderId, OrderStatus, TrackingId};
    use ordertrack_core::store::OrderStore;

    use crate::repositories::{InMemoryOrderStore, OrderRepository};

    fn order(id: &str, customer: &str, tracking: Option<&str>) -> Order {
        Order {
            order_id: OrderId(id.to_string()),
            tracking_id: tracking.map(|value| TrackingId(value.to_string())),
            customer_id: CustomerId(customer.to_string()),
            product_name: "Kindle Paperwhite".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            status: OrderStatus::Shipped,
            order_total: Decimal::new(14999, 2),
            estimated_delivery: None,
            shipping_address: None,
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_order_store_round_trip() {
        let store = InMemoryOrderStore::default();
        let saved = order("ORD-1", "CUST-1", Some("TRK-1"));

        store.save(saved.clone()).await.expect("save order");
        let found = store.get_by_id(&saved.order_id).await.expect("find order");

        assert_eq!(found, Some(saved));
        assert_eq!(store.get_by_id(&OrderId("ORD-404".to_string())).await.expect("find"), None);
    }

    #[tokio::test]
    async fn scans_follow_first_insertion_order() {
        let store = InMemoryOrderStore::from_orders(vec![
            order("ORD-3", "CUST-1", None),
            order("ORD-1", "CUST-2", None),
            order("ORD-2", "CUST-1", None),
        ]);

        let mut replaced = order("ORD-3", "CUST-1", None);
        replaced.product_name = "Kindle Oasis".to_string();
        store.insert(replaced).await;

        let ids: Vec<String> = store
            .scan_all()
            .await
            .expect("scan")
            .into_iter()
            .map(|order| order.order_id.0)
            .collect();
        assert_eq!(ids, vec!["ORD-3", "ORD-1", "ORD-2"]);
        assert_eq!(store.len().await, 3);

        let first = store.get_by_id(&OrderId("ORD-3".to_string())).await.expect("find");
        assert_eq!(first.map(|order| order.product_name), Some("Kindle Oasis".to_string()));
    }

    #[tokio::test]
    async fn filtered_queries_match_exact_ids() {
        let store = InMemoryOrderStore::default();
        store
            .extend(vec![
                order("ORD-1", "CUST-1", Some("TRK-1")),
                order("ORD-2", "CUST-2", Some("TRK-2")),
                order("ORD-3", "CUST-1", None),
            ])
            .await;

        let tracked =
            store.query_by_tracking_id(&TrackingId("TRK-2".to_string())).await.expect("tracking");
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].order_id.0, "ORD-2");

        let customer =
            store.query_by_customer_id(&CustomerId("CUST-1".to_string())).await.expect("customer");
        assert_eq!(customer.len(), 2);

        let unknown =
            store.query_by_tracking_id(&TrackingId("trk-1".to_string())).await.expect("tracking");
        assert!(unknown.is_empty());
    }
}
