//! Creature image caching
//!
//! Provides a content-addressed on-disk cache for the images referenced by
//! stat blocks.

mod store;

pub use store::ImageCache;
