//! MySQL access for zocalo.
//!
//! [`Db`] wraps an sqlx pool and exposes a small query API that speaks
//! JSON: parameters are [`serde_json::Value`]s and rows come back as JSON
//! objects. Every statement runs under the timeout from [`DbConfig`].
//!
//! Table and column names that get interpolated into SQL (by
//! [`Db::save`] and [`Db::update_item`]) must pass
//! [`sanitize_identifier`].
//!
//! ```no_run
//! # use zocalo_database::*;
//! # use serde_json::json;
//! # async fn example() -> DbResult<()> {
//! let db = Db::connect(&DbConfig::new("localhost", "tienda")).await?;
//! let activos = db
//!     .query("SELECT * FROM clientes WHERE estado = ?", &[json!("activo")])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod row;
pub mod statement;

pub use config::DbConfig;
pub use db::{Db, Transaction, TxFuture};
pub use error::{DbError, DbResult, DbResultExt};
pub use row::row_to_json;
pub use statement::sanitize_identifier;
