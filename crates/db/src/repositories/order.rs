use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use ordertrack_core::domain::customer::CustomerId;
use ordertrack_core::domain::order::{
    Order, OrderId, OrderItem, OrderStatus, ShippingAddress, TrackingId,
};
use ordertrack_core::errors::StoreError;
use ordertrack_core::store::OrderStore;

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

const ORDER_COLUMNS: &str = "SELECT order_id, tracking_id, customer_id, product_name, order_date,
        status, order_total, estimated_delivery, shipping_address_json
 FROM orders";

pub struct SqlOrderStore {
    pool: DbPool,
}

impl SqlOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn fetch_orders(
        &self,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(ORDER_COLUMNS);
        if let Some((column, value)) = filter {
            builder.push(" WHERE ").push(column).push(" = ").push_bind(value.to_string());
        }
        builder.push(" ORDER BY rowid ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut orders = rows.iter().map(row_to_order).collect::<Result<Vec<_>, _>>()?;
        self.attach_items(&mut orders, filter).await?;
        Ok(orders)
    }

    /// Items are selected by re-applying the order filter in a subquery; at most
    /// one parameter is bound regardless of how many orders match.
    async fn attach_items(
        &self,
        orders: &mut [Order],
        filter: Option<(&str, &str)>,
    ) -> Result<(), RepositoryError> {
        if orders.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT order_id, product_id, quantity, price FROM order_items",
        );
        if let Some((column, value)) = filter {
            builder
                .push(" WHERE order_id IN (SELECT order_id FROM orders WHERE ")
                .push(column)
                .push(" = ")
                .push_bind(value.to_string())
                .push(")");
        }
        builder.push(" ORDER BY order_id ASC, position ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: String = decode(row, "order_id")?;
            items.entry(order_id).or_default().push(row_to_item(row)?);
        }

        for order in orders.iter_mut() {
            order.items = items.remove(&order.order_id.0).unwrap_or_default();
        }
        Ok(())
    }
}

fn decode<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

fn row_to_order(row: &SqliteRow) -> Result<Order, RepositoryError> {
    let order_id: String = decode(row, "order_id")?;
    let tracking_id: Option<String> = decode(row, "tracking_id")?;
    let customer_id: String = decode(row, "customer_id")?;
    let product_name: String = decode(row, "product_name")?;
    let order_date: String = decode(row, "order_date")?;
    let status: String = decode(row, "status")?;
    let order_total: String = decode(row, "order_total")?;
    let estimated_delivery: Option<String> = decode(row, "estimated_delivery")?;
    let address_json: Option<String> = decode(row, "shipping_address_json")?;

    let status =
        OrderStatus::from_str(&status).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let estimated_delivery = estimated_delivery
        .as_deref()
        .map(|value| parse_date("estimated_delivery", value))
        .transpose()?;
    let shipping_address = address_json
        .as_deref()
        .map(serde_json::from_str::<ShippingAddress>)
        .transpose()
        .map_err(|e| RepositoryError::Decode(format!("shipping_address_json: {e}")))?;

    Ok(Order {
        order_id: OrderId(order_id),
        tracking_id: tracking_id.map(TrackingId),
        customer_id: CustomerId(customer_id),
        product_name,
        order_date: parse_date("order_date", &order_date)?,
        status,
        order_total: parse_decimal("order_total", &order_total)?,
        estimated_delivery,
        shipping_address,
        items: Vec::new(),
    })
}

fn row_to_item(row: &SqliteRow) -> Result<OrderItem, RepositoryError> {
    let product_id: String = decode(row, "product_id")?;
    let quantity: i64 = decode(row, "quantity")?;
    let price: String = decode(row, "price")?;

    Ok(OrderItem {
        product_id,
        quantity: u32::try_from(quantity)
            .map_err(|_| RepositoryError::Decode(format!("quantity `{quantity}` out of range")))?,
        price: parse_decimal("price", &price)?,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderStore {
    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let address_json = order
            .shipping_address
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (order_id, tracking_id, customer_id, product_name, order_date,
                                 status, order_total, estimated_delivery, shipping_address_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(order_id) DO UPDATE SET
                 tracking_id = excluded.tracking_id,
                 customer_id = excluded.customer_id,
                 product_name = excluded.product_name,
                 order_date = excluded.order_date,
                 status = excluded.status,
                 order_total = excluded.order_total,
                 estimated_delivery = excluded.estimated_delivery,
                 shipping_address_json = excluded.shipping_address_json",
        )
        .bind(&order.order_id.0)
        .bind(order.tracking_id.as_ref().map(|id| id.0.as_str()))
        .bind(&order.customer_id.0)
        .bind(&order.product_name)
        .bind(order.order_date.format(DATE_FORMAT).to_string())
        .bind(order.status.as_str())
        .bind(order.order_total.to_string())
        .bind(order.estimated_delivery.map(|date| date.format(DATE_FORMAT).to_string()))
        .bind(address_json)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(&order.order_id.0)
            .execute(&mut *tx)
            .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, position, product_id, quantity, price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&order.order_id.0)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(i64::from(item.quantity))
            .bind(item.price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OrderStore for SqlOrderStore {
    async fn get_by_id(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut orders = self.fetch_orders(Some(("order_id", id.0.as_str()))).await?;
        Ok(if orders.is_empty() { None } else { Some(orders.swap_remove(0)) })
    }

    async fn query_by_tracking_id(&self, id: &TrackingId) -> Result<Vec<Order>, StoreError> {
        Ok(self.fetch_orders(Some(("tracking_id", id.0.as_str()))).await?)
    }

    async fn query_by_customer_id(&self, id: &CustomerId) -> Result<Vec<Order>, StoreError> {
        Ok(self.fetch_orders(Some(("customer_id", id.0.as_str()))).await?)
    }

    async fn scan_all(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.fetch_orders(None).await?)
    }
}
