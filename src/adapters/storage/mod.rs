//! Log storage adapters.

pub mod directory;

pub use directory::DirectoryLogStore;
