pub mod bot_state;
pub mod database;
pub mod handlers;
pub mod models;
pub mod schedule;
