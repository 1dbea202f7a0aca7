use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackingId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether an estimated delivery date is still meaningful for the order.
    pub fn has_pending_delivery(&self) -> bool {
        matches!(self, Self::Processing | Self::Shipped)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::UnknownOrderStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// An order record as owned by the external order-management system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    #[serde(default)]
    pub tracking_id: Option<TrackingId>,
    pub customer_id: CustomerId,
    pub product_name: String,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub order_total: Decimal,
    #[serde(default)]
    pub estimated_delivery: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{Order, OrderId, OrderStatus};
    use crate::domain::customer::CustomerId;
    use crate::errors::DomainError;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(OrderStatus::from_str(" Shipped ").expect("parse"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::from_str("CANCELLED").expect("parse"), OrderStatus::Cancelled);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let error = OrderStatus::from_str("lost").expect_err("lost is not a status");
        assert_eq!(error, DomainError::UnknownOrderStatus("lost".to_string()));
    }

    #[test]
    fn only_open_orders_have_pending_delivery() {
        assert!(OrderStatus::Processing.has_pending_delivery());
        assert!(OrderStatus::Shipped.has_pending_delivery());
        assert!(!OrderStatus::Delivered.has_pending_delivery());
        assert!(!OrderStatus::Cancelled.has_pending_delivery());
    }

    #[test]
    fn order_deserializes_with_optional_fields_missing() {
        let json = r#"{
            "order_id": "ORD-1",
            "customer_id": "CUST-1",
            "product_name": "AirPods Pro",
            "order_date": "2024-06-07",
            "status": "delivered",
            "order_total": "249.00"
        }"#;

        let order: Order = serde_json::from_str(json).expect("deserialize order");

        assert_eq!(order.order_id, OrderId("ORD-1".to_string()));
        assert_eq!(order.customer_id, CustomerId("CUST-1".to_string()));
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2024, 6, 7).expect("date"));
        assert_eq!(order.order_total, Decimal::new(24900, 2));
        assert!(order.tracking_id.is_none());
        assert!(order.shipping_address.is_none());
        assert!(order.items.is_empty());
    }
}
