pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod models;
pub mod queue;
pub mod response;
pub mod routes;
pub mod schema;
pub mod state;
