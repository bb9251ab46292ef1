//! Path patterns, route identifiers and locations.
//!
//! ```rust
//! use trellis::urls::{codec, match_path};
//!
//! let params = match_path("/docs/[...slug]", "/docs/a/b").unwrap().unwrap();
//! assert_eq!(params.get_many("slug"), Some(&["a".to_string(), "b".to_string()][..]));
//! assert_eq!(codec::encode_route_path("/").unwrap(), "R/_root");
//! ```

pub use trellis_urls::*;
