//! LeafCare Core Library
//!
//! This crate provides the core functionality for LeafCare, a small
//! plant/pot-care service with user accounts, irrigation pots and plants.
//!
//! # Architecture
//!
//! - **DocumentStore**: one JSON file per collection, held in memory and
//!   rewritten atomically on every mutation
//! - **LeafCare**: the resource service (validation, authorization and
//!   uniqueness rules) composed on top of three stores
//!
//! # Quick Start
//!
//! ```text
//! let store = DocumentStore::open("pots.json").await?;
//!
//! // Insert a document; the store assigns its id
//! let pot = store.save(Document::new().with("code", "P-1")).await?;
//!
//! // Query documents
//! let pots = store.find_by(&Criteria::eq("code", "P-1")).await;
//! ```
//!
//! # Modules
//!
//! - `store`: Document store (main entry point for persistence)
//! - `document`: Documents and their ids
//! - `criteria`: Query criteria and matching
//! - `storage`: File persistence and storage errors
//! - `service`: User, pot and plant operations
//! - `models`: Records, views and pagination
//! - `auth`: Access tokens and password hashing
//! - `config`: Application configuration

pub mod auth;
pub mod config;
pub mod criteria;
pub mod document;
pub mod models;
pub mod service;
pub mod storage;
pub mod store;

pub use auth::{AuthError, Claims, JwtAuthority, TokenAuthority};
pub use config::Config;
pub use criteria::{Criteria, CriteriaError};
pub use document::{Document, DocumentId, DocumentIdError};
pub use models::{
    NewPot, NewUser, Page, PageRequest, Pagination, Plant, PlantFilter, Pot, PotSummary,
    PotUpdate, User, UserProfile, UserUpdate,
};
pub use service::{ApiError, ApiResult, LeafCare};
pub use storage::{CollectionPersistence, StoreError, StoreResult};
pub use store::DocumentStore;
