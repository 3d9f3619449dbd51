pub mod manager;
pub mod models;
pub mod orders;

pub use manager::DatabaseError;
pub use orders::{OrderStore, OrderWithReference, PgOrderStore};
