//! Services shared by preptrack clients

mod local_store;

pub use local_store::{LocalDataStore, LocalStore, MutationObserver};
