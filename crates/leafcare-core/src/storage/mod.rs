//! Storage layer
//!
//! Handles persistence of one collection per JSON file.
//!
//! ## Architecture
//!
//! - **`CollectionFile`**: in-memory image of a collection file
//! - **`CollectionPersistence`**: atomic load/save of that image
//!
//! The in-memory collection is only replaced after the file write for a
//! mutation has completed.

pub mod error;
pub mod persistence;

pub use error::{StoreError, StoreResult};
pub use persistence::{CollectionFile, CollectionPersistence};
