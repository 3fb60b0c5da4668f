use super::{OrderStore, StoreError};
use crate::entities::{
    CompleteOrderPayment, GetOrderByKey, Order, OrderStatus, TransitionOrderStatus,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use uuid::Uuid;

#[async_trait]
impl OrderStore for DatabaseProcessor {
    async fn find_by_reference(&self, reference_id: &str) -> Result<Option<Order>, StoreError> {
        let order = self
            .process(GetOrderByKey {
                order_key: reference_id.to_owned(),
            })
            .await?;
        Ok(order)
    }

    async fn complete_payment(&self, order_id: Uuid, note: &str) -> Result<bool, StoreError> {
        let applied = self
            .process(CompleteOrderPayment {
                order_id,
                note: note.to_owned(),
            })
            .await?;
        Ok(applied)
    }

    async fn transition(
        &self,
        order_id: Uuid,
        to: OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError> {
        let applied = self
            .process(TransitionOrderStatus {
                order_id,
                to,
                note: note.to_owned(),
            })
            .await?;
        Ok(applied)
    }
}
