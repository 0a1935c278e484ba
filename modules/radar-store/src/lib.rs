pub mod alerts;
pub mod entities;
pub mod error;
pub mod events;
pub mod items;
pub mod migrate;
pub mod models;
pub mod pipeline_runs;
pub mod pool;
pub mod sources;
pub mod themes;

pub use error::{StoreError, StoreResult};
pub use models::{Entity, Item, Source, Theme};
pub use pool::{connect, connect_read_only};

pub use sqlx::PgPool;
