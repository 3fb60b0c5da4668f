use super::{OrderStore, StoreError};
use crate::entities::{Order, OrderNote, OrderStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// In-process order store, used for embedding and tests.
///
/// All operations take one mutex, so every compare-and-transition is atomic.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    inner: Mutex<MemoryOrders>,
}

#[derive(Debug, Default)]
struct MemoryOrders {
    orders: HashMap<Uuid, Order>,
    keys: HashMap<String, Uuid>,
    notes: Vec<OrderNote>,
    payment_completions: HashMap<Uuid, u32>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryOrders> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an order.
    pub fn insert(&self, order: Order) {
        let mut inner = self.lock();
        inner.keys.insert(order.order_key.clone(), order.order_id);
        inner.orders.insert(order.order_id, order);
    }

    pub fn order(&self, order_id: Uuid) -> Option<Order> {
        self.lock().orders.get(&order_id).cloned()
    }

    /// Note bodies attached to an order, oldest first.
    pub fn notes(&self, order_id: Uuid) -> Vec<String> {
        self.lock()
            .notes
            .iter()
            .filter(|note| note.order_id == order_id)
            .map(|note| note.body.clone())
            .collect()
    }

    /// How many times payment completion was applied to an order.
    pub fn payment_completions(&self, order_id: Uuid) -> u32 {
        self.lock()
            .payment_completions
            .get(&order_id)
            .copied()
            .unwrap_or(0)
    }
}

impl MemoryOrders {
    fn add_note(&mut self, order_id: Uuid, body: &str) {
        let id = self.notes.len() as i64 + 1;
        self.notes.push(OrderNote {
            id,
            order_id,
            body: body.to_owned(),
            created_at: now(),
        });
    }
}

fn now() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .keys
            .get(reference_id)
            .and_then(|order_id| inner.orders.get(order_id))
            .cloned())
    }

    async fn complete_payment(&self, order_id: Uuid, note: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(order) = inner.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if order.status.is_terminal() {
            return Ok(false);
        }
        order.status = OrderStatus::Completed;
        order.paid_at = Some(now());
        *inner.payment_completions.entry(order_id).or_insert(0) += 1;
        inner.add_note(order_id, note);
        Ok(true)
    }

    async fn transition(
        &self,
        order_id: Uuid,
        to: OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(order) = inner.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if order.status.is_terminal() {
            return Ok(false);
        }
        order.status = to;
        inner.add_note(order_id, note);
        Ok(true)
    }
}
