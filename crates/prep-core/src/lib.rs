//! prep-core - Core library for preptrack
//!
//! This crate contains the models, local store, remote client and the
//! offline-first sync engine shared by every preptrack front-end.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Bookmark, CompanyNote, Interview, Question, QuestionKind};
pub use services::{LocalDataStore, LocalStore};
pub use sync::{SyncBridge, SyncEngine, SyncError};
