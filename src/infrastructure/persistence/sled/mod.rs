//! Sled 存储实现

mod library_store;

pub use library_store::{SledLibraryConfig, SledLibraryStore};
