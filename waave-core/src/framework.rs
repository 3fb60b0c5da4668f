use sqlx::PgPool;

/// Runs the Postgres-backed processors defined under [`crate::entities`].
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
