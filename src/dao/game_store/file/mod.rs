//! JSON file backend: the whole lobby snapshot lives in a single document.

mod error;
mod store;

pub use store::FileGameStore;
