//! Postgres adapters for the tenant data store.
//!
//! Tables (owned by the hosted backend, not migrated here):
//!
//! | table | columns read/written |
//! |-------|----------------------|
//! | `profiles` | `id`, `full_name`, `email`, `phone`, `avatar_url`, `role` |
//! | `condominio_acessos` | `id`, `condominio_id`, `user_id`, `status`, `colaborador_nome`, `nivel_acesso`, `created_at` |
//! | `condominios` | `id`, `sindico_id` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (undefined column) | `42703` | `MissingColumn` |
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Unavailable` |
//! | Decode / ColumnDecode | N/A | `Serialization` |
//! | Other | N/A | `Unavailable` |
//!
//! Queries are runtime-checked (`sqlx::query`), so the crate builds without a
//! live database.

use crate::store::StoreError;

pub mod access;
pub mod profiles;
pub mod tenants;

pub use access::PgAccessRecordStore;
pub use profiles::PgProfileStore;
pub use tenants::PgTenantDirectory;

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("42703") => StoreError::MissingColumn(msg),
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("decode error in {}: {}", operation, err))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
