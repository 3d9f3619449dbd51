pub mod config;
pub mod database;
pub mod lifecycle;
pub mod notify;
pub mod sweep;

#[cfg(test)]
pub mod testing;
