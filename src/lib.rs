pub mod auction;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod store;
