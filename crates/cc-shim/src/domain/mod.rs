//! # Domain Layer
//!
//! Pure types with no I/O: the composite key codec, the page iterator, the
//! response value, transaction context and argument validation.

pub mod args;
pub mod composite_key;
pub mod context;
pub mod iterator;
pub mod response;

pub use composite_key::{
    create_composite_key, matches_partial_key, partial_key_range, split_composite_key,
    COMPOSITE_KEY_DELIMITER,
};
pub use context::{Invocation, InvocationMode, TransactionContext};
pub use iterator::{KeyValue, QueryPage, StateQueryIterator};
pub use response::{status, Response};
