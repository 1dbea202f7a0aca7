pub mod config;
pub mod dates;
pub mod domain;
pub mod errors;
pub mod resolver;
pub mod store;

pub use dates::parse_relative_date;
pub use domain::customer::CustomerId;
pub use domain::order::{Order, OrderId, OrderItem, OrderStatus, ShippingAddress, TrackingId};
pub use errors::{DomainError, StoreError};
pub use resolver::{
    NotFoundReason, OrderQuery, OrderResolver, Resolution, ResolutionSummary, ScoredCandidate,
    ScoringPolicy,
};
pub use store::OrderStore;
