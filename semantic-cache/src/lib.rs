//! # Semantic Cache
//!
//! Serves answers for queries that are worded differently but mean the same
//! thing as a query seen before. Queries are embedded, the nearest stored
//! query is found by squared euclidean distance, and anything within the
//! threshold is answered from the cache instead of the resolver.
//!
//! ## Features
//!
//! - **Similarity Lookup**: Flat exact nearest-neighbor index
//! - **Bounded Size**: Pluggable eviction, FIFO by default
//! - **Write-Through Persistence**: One JSON file, replaced atomically
//! - **Document Cache**: Exact-key cache for fetched pages
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SemanticCache                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  query ──► EmbeddingProvider ──► VectorIndex ──► hit? ──► answer│
//! │                                      │                          │
//! │                                      ▼ miss                     │
//! │                                  Resolver                       │
//! │                                      │                          │
//! │                                      ▼                          │
//! │              EvictionLedger ◄── insert ──► PersistentStore      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use semcache::{CacheConfig, SemanticCache, resolver_fn};
//! use semcache_embeddings::HashingProvider;
//!
//! let config = CacheConfig::new(768).with_store_path("semantic_cache.json");
//! let cache = SemanticCache::new(
//!     config,
//!     Arc::new(HashingProvider::new(768)),
//!     Arc::new(resolver_fn(|query: String| async move { answer(query).await })),
//! )
//! .await?;
//!
//! let answer = cache.ask("What is the capital of France?").await?;
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod entry;
pub mod error;
pub mod eviction;
pub mod index;
pub mod resolver;
pub mod store;

pub use cache::{CacheHit, CacheStats, Lookup, SemanticCache, SemanticCacheBuilder};
pub use config::{CacheConfig, DEFAULT_MAX_RESPONSES, DEFAULT_THRESHOLD, EvictionPolicyKind};
pub use document::DocumentCache;
pub use entry::CacheEntry;
pub use error::{CacheError, Result};
pub use eviction::{EvictionLedger, EvictionPolicy, FifoPolicy, UnboundedPolicy};
pub use index::{Neighbor, VectorIndex};
pub use resolver::{FnResolver, Resolver, resolver_fn};
pub use store::{FORMAT_VERSION, PersistentStore, StoreSnapshot};
