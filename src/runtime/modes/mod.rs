//! Mode routing
//!
//! - `serve`: HTTP server with the background refresh scheduler (default)
//! - `refresh`: one refresh cycle, then exit
//! - `lookup`: resolve one address and print JSON

pub mod lookup;
pub mod refresh;
pub mod server;

pub use lookup::run_lookup;
pub use refresh::run_refresh;
pub use server::run_server;
