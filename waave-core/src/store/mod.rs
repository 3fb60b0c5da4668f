//! Order storage seam.
//!
//! The shop owns its orders; the gateway reads them and asks for
//! transitions through [`OrderStore`]. Both transition methods are
//! compare-and-transition: they refuse to touch an order that is already
//! completed and report whether anything was written.

mod memory;
mod postgres;

pub use memory::MemoryOrderStore;

use crate::entities::{Order, OrderStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Errors raised by an order store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Resolve an order by the key Waave echoes back as `reference_id`.
    async fn find_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError>;

    /// Record payment completion and attach `note`.
    ///
    /// Returns `false` without writing when the order is already completed.
    async fn complete_payment(&self, order_id: Uuid, note: &str) -> Result<bool, StoreError>;

    /// Move the order to `to` and attach `note`.
    ///
    /// Returns `false` without writing when the order is already completed.
    async fn transition(
        &self,
        order_id: Uuid,
        to: OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError>;
}
