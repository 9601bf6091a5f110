//! Registry Module
//!
//! Owns every order and its SLA contract, one lock per order.

pub mod order;
pub mod orders;

pub use order::{Order, OrderDraft};
pub use orders::{OrderCell, OrderRegistry, OrderState};
