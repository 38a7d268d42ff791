mod http;
mod routes;
mod start;
mod trace;

pub use start::{ServerConfig, start_server};
