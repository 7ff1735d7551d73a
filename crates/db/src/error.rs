use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row for {key}: {reason}")]
    CorruptRow { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DbError>;
