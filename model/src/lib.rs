//! Contains the order types with serialization as expected by the storefront.
//!
//! This is in its own crate because the types are shared between the order
//! service and client tooling.

pub mod order;

pub use order::{
    LineItem, Order, OrderCreation, OrderNumber, OrderStatus, PaymentMethod, RedactedOrder,
};
