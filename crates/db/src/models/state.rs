#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StateRow {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}
