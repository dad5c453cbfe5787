//! Request handler module
//!
//! Static file resolution (stage 1) and the routing pipeline that falls back
//! to the SPA entry document (stage 2).

pub mod router;
pub mod static_files;

pub use router::handle_request;
