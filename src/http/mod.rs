//! HTTP protocol layer module
//!
//! Protocol-level building blocks (cache policy, content types, compression,
//! ranges, response builders), decoupled from request routing.

pub mod cache;
pub mod compress;
pub mod mime;
pub mod range;
pub mod response;

pub use range::{parse_range_header, ByteRange};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_500_response, build_ok_response, build_options_response, build_partial_response,
    FileHeaders,
};
