mod generate;
mod handlers;
mod models;
mod rate_limit;
mod state;

pub use handlers::run_server;
