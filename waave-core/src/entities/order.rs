use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

/// An order owned by the shop. The gateway only reads it and requests
/// status transitions.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    pub order_id: Uuid,
    /// Opaque order key, sent to Waave as `reference_id`.
    pub order_key: String,
    pub total: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub return_url: String,
    pub cancel_url: String,
    pub paid_at: Option<time::PrimitiveDateTime>,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "kebab-case", type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    OnHold,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// No gateway transition leaves this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::OnHold => write!(f, "on-hold"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderNote {
    pub id: i64,
    pub order_id: Uuid,
    pub body: String,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
/// Look up an order by the key sent to Waave as `reference_id`.
pub struct GetOrderByKey {
    pub order_key: String,
}

impl Processor<GetOrderByKey> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByKey")]
    async fn process(&self, query: GetOrderByKey) -> Result<Option<Order>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, order_key, total, currency, status,
                   return_url, cancel_url, paid_at, created_at
            FROM orders
            WHERE order_key = $1
            "#,
        )
        .bind(query.order_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }
}

#[derive(Debug, Clone)]
/// Mark an order as paid and attach a note, unless it is already completed.
///
/// Returns `false` when the order was already completed (or does not
/// exist); nothing is written in that case.
pub struct CompleteOrderPayment {
    pub order_id: Uuid,
    pub note: String,
}

impl Processor<CompleteOrderPayment> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CompleteOrderPayment")]
    async fn process(&self, command: CompleteOrderPayment) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'completed', paid_at = (now() AT TIME ZONE 'utc')
            WHERE order_id = $1 AND status <> 'completed'
            "#,
        )
        .bind(command.order_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_note(&mut tx, command.order_id, &command.note).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
/// Move an order to `to` and attach a note, unless it is already completed.
pub struct TransitionOrderStatus {
    pub order_id: Uuid,
    pub to: OrderStatus,
    pub note: String,
}

impl Processor<TransitionOrderStatus> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:TransitionOrderStatus")]
    async fn process(&self, command: TransitionOrderStatus) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE order_id = $1 AND status <> 'completed'
            "#,
        )
        .bind(command.order_id)
        .bind(command.to)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_note(&mut tx, command.order_id, &command.note).await?;
        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_note(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: Uuid,
    body: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_notes (order_id, body) VALUES ($1, $2)")
        .bind(order_id)
        .bind(body)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_completed_is_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::OnHold.is_terminal());
        assert!(!OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_display_matches_database_labels() {
        assert_eq!(OrderStatus::OnHold.to_string(), "on-hold");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }
}
