// ── Client-side caches ──

mod like_store;

pub use like_store::{LikeChange, LikeSnapshot, LikeStatus, LikeStore};
