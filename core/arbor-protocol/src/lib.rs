#![no_std] // Shared with the WASM build

extern crate alloc;

// Enable std if the feature is active (for std::error::Error impls)
#[cfg(any(feature = "std", test))]
extern crate std;

pub mod ids;

// Re-export core types for convenience
pub use ids::{IdParseError, TokenId, TokenKind};

pub mod model;
pub use model::*;
