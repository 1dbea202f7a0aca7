use ordertrack_core::domain::order::Order;

use crate::connection::DbPool;
use crate::repositories::{OrderRepository, RepositoryError};

/// Canonical demo orders and the verification contract they must satisfy.
const SEED_ORDERS: &[SeedOrderContract] = &[
    SeedOrderContract {
        order_id: "ORD-2024-0001",
        customer_id: "CUST-001",
        status: "shipped",
        expected_item_count: 1,
        has_tracking: true,
        description: "iPhone shipped last Friday",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0002",
        customer_id: "CUST-001",
        status: "delivered",
        expected_item_count: 1,
        has_tracking: true,
        description: "AirPods delivered in May",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0003",
        customer_id: "CUST-001",
        status: "processing",
        expected_item_count: 2,
        has_tracking: false,
        description: "MacBook still processing, no tracking yet",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0004",
        customer_id: "CUST-002",
        status: "shipped",
        expected_item_count: 1,
        has_tracking: true,
        description: "Second iPhone on the same day for another customer",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0005",
        customer_id: "CUST-002",
        status: "delivered",
        expected_item_count: 1,
        has_tracking: true,
        description: "Headphones delivered without a stored address",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0006",
        customer_id: "CUST-003",
        status: "cancelled",
        expected_item_count: 0,
        has_tracking: false,
        description: "Cancelled console order",
    },
    SeedOrderContract {
        order_id: "ORD-2024-0007",
        customer_id: "CUST-003",
        status: "shipped",
        expected_item_count: 2,
        has_tracking: true,
        description: "Tablet with accessory in transit",
    },
];

/// Deterministic demo dataset covering every order status and the ambiguous
/// "iPhone" lookup across two customers.
pub struct DemoOrderDataset;

impl DemoOrderDataset {
    /// JSON fixture content for the demo orders.
    pub const JSON: &str = include_str!("../../../config/fixtures/demo_orders.json");

    pub fn orders() -> Result<Vec<Order>, RepositoryError> {
        serde_json::from_str(Self::JSON).map_err(|error| RepositoryError::Decode(error.to_string()))
    }

    /// Saves every demo order through `repository`. Re-loading replaces the
    /// records in place.
    pub async fn load(repository: &dyn OrderRepository) -> Result<SeedResult, RepositoryError> {
        let orders = Self::orders()?;
        let count = orders.len();
        for order in orders {
            repository.save(order).await?;
        }
        tracing::info!(event_name = "db.fixtures.demo_orders_loaded", orders = count);

        let orders_seeded = SEED_ORDERS
            .iter()
            .map(|order| OrderSeedInfo {
                order_id: order.order_id,
                customer_id: order.customer_id,
                description: order.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { orders_seeded })
    }

    /// Verify that seeded rows exist in the database and match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for order in SEED_ORDERS {
            let order_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM orders
                               WHERE order_id = ?1 AND customer_id = ?2 AND status = ?3)",
            )
            .bind(order.order_id)
            .bind(order.customer_id)
            .bind(order.status)
            .fetch_one(pool)
            .await?;
            checks.push((order.order_id.to_string(), order_ok == 1));

            let item_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM order_items WHERE order_id = ?1")
                    .bind(order.order_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((
                format!("{}:item-count", order.order_id),
                item_count == order.expected_item_count,
            ));

            let tracked: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM orders
                               WHERE order_id = ?1 AND tracking_id IS NOT NULL)",
            )
            .bind(order.order_id)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("{}:tracking-presence", order.order_id),
                (tracked == 1) == order.has_tracking,
            ));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove seeded orders from a test database. Items cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for order in SEED_ORDERS {
            sqlx::query("DELETE FROM orders WHERE order_id = ?1")
                .bind(order.order_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedOrderContract {
    order_id: &'static str,
    customer_id: &'static str,
    status: &'static str,
    expected_item_count: i64,
    has_tracking: bool,
    description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub orders_seeded: Vec<OrderSeedInfo>,
}

#[derive(Debug)]
pub struct OrderSeedInfo {
    pub order_id: &'static str,
    pub customer_id: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    /// `(label, passed)`; labels name the order, e.g. `ORD-2024-0003:item-count`.
    pub checks: Vec<(String, bool)>,
}
