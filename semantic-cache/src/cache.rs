//! The semantic cache.
//!
//! A lookup embeds the query and asks the vector index for the nearest
//! stored query. If it lies within the threshold the stored answer is a
//! hit; otherwise the resolver is consulted and its answer inserted,
//! evicted down to capacity and written through to disk.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use semcache_embeddings::{Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRequest};

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};
use crate::eviction::{EvictionLedger, EvictionPolicy};
use crate::index::{Neighbor, VectorIndex};
use crate::resolver::Resolver;
use crate::store::{PersistentStore, StoreSnapshot};

/// A cached answer served for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    /// The stored answer.
    pub answer: String,

    /// The previously seen query that matched.
    pub matched_query: String,

    /// Sequence id of the matched entry.
    pub sequence_id: u64,

    /// Squared euclidean distance between the two queries' embeddings.
    pub distance: f32,
}

/// Outcome of [`SemanticCache::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A stored query was close enough.
    Hit(CacheHit),
    /// Nothing within the threshold.
    Miss,
}

impl Lookup {
    /// Check if this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// The cached answer, if any.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Lookup::Hit(hit) => Some(&hit.answer),
            Lookup::Miss => None,
        }
    }
}

/// Statistics about the semantic cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of entries currently cached.
    pub entries: usize,

    /// Capacity enforced by the eviction policy.
    pub capacity: Option<usize>,

    /// Name of the eviction policy.
    pub policy: String,

    /// Lookups answered from the cache.
    pub hits: u64,

    /// Lookups that found nothing close enough.
    pub misses: u64,

    /// Entries inserted.
    pub inserts: u64,

    /// Entries evicted.
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

/// An insertion worked out against the current state but not yet applied.
#[derive(Debug)]
struct StagedInsert {
    entry: CacheEntry,
    ledger: EvictionLedger,
    victims: Vec<u64>,
    /// Index over the survivors; only built when something is evicted.
    rebuilt: Option<VectorIndex>,
}

/// Index, ledger and entries, kept in lockstep.
///
/// Row `i` of the index is `entries[i]`, and the ledger tracks exactly the
/// sequence ids in `entries`.
#[derive(Debug)]
struct CacheState {
    index: VectorIndex,
    ledger: EvictionLedger,
    entries: Vec<CacheEntry>,
    next_sequence_id: u64,
}

impl CacheState {
    fn new(dimension: usize, ledger: EvictionLedger) -> Self {
        Self {
            index: VectorIndex::new(dimension),
            ledger,
            entries: Vec::new(),
            next_sequence_id: 0,
        }
    }

    fn restore(
        dimension: usize,
        mut ledger: EvictionLedger,
        snapshot: StoreSnapshot,
    ) -> Result<Self> {
        if snapshot.dimension != dimension {
            return Err(CacheError::DimensionMismatch {
                expected: dimension,
                actual: snapshot.dimension,
            });
        }

        let index = VectorIndex::rebuild(
            dimension,
            snapshot.entries.iter().map(|e| e.embedding.as_slice()),
        )?;

        ledger.clear();
        for entry in &snapshot.entries {
            ledger.record(entry.sequence_id);
        }

        Ok(Self {
            index,
            ledger,
            entries: snapshot.entries,
            next_sequence_id: snapshot.next_sequence_id,
        })
    }

    fn nearest(&self, embedding: &[f32]) -> Result<Option<(Neighbor, &CacheEntry)>> {
        let neighbor = self.index.search(embedding, 1)?.into_iter().next();
        Ok(neighbor.and_then(|n| self.entries.get(n.row_id).map(|entry| (n, entry))))
    }

    /// Entries that remain once `entry` is added and `victims` are gone,
    /// in sequence order.
    fn survivors<'a>(
        entries: &'a [CacheEntry],
        entry: &'a CacheEntry,
        victims: &'a [u64],
    ) -> impl Iterator<Item = &'a CacheEntry> + 'a {
        entries
            .iter()
            .chain(std::iter::once(entry))
            .filter(move |e| !victims.contains(&e.sequence_id))
    }

    /// Plan an insertion without touching the live state.
    ///
    /// Only the ledger is copied; the index is rebuilt over survivors when
    /// the insertion evicts something.
    fn stage(
        &self,
        query_text: &str,
        embedding: Embedding,
        answer: String,
    ) -> Result<StagedInsert> {
        let dimension = self.index.dimension();
        if embedding.len() != dimension {
            return Err(CacheError::DimensionMismatch {
                expected: dimension,
                actual: embedding.len(),
            });
        }

        let entry = CacheEntry::new(self.next_sequence_id, query_text, embedding, answer);
        let mut ledger = self.ledger.clone();
        ledger.record(entry.sequence_id);
        let victims = ledger.evict();

        let rebuilt = if victims.is_empty() {
            None
        } else {
            let survivors = Self::survivors(&self.entries, &entry, &victims);
            Some(VectorIndex::rebuild(
                dimension,
                survivors.map(|e| e.embedding.as_slice()),
            )?)
        };

        Ok(StagedInsert {
            entry,
            ledger,
            victims,
            rebuilt,
        })
    }

    /// Apply a staged insertion, returning the evicted sequence ids.
    fn apply(&mut self, staged: StagedInsert) -> Result<Vec<u64>> {
        let StagedInsert {
            entry,
            ledger,
            victims,
            rebuilt,
        } = staged;

        self.ledger = ledger;
        self.next_sequence_id = entry.sequence_id + 1;

        match rebuilt {
            Some(index) => {
                self.entries.retain(|e| !victims.contains(&e.sequence_id));
                if !victims.contains(&entry.sequence_id) {
                    self.entries.push(entry);
                }
                self.index = index;
            }
            None => {
                // Length was checked in `stage`.
                self.index.add(&entry.embedding)?;
                self.entries.push(entry);
            }
        }

        Ok(victims)
    }

    /// Drop whatever the ledger picks and rebuild the index from survivors.
    fn evict(&mut self) -> Result<Vec<u64>> {
        let victims = self.ledger.evict();
        if victims.is_empty() {
            return Ok(victims);
        }

        let doomed: HashSet<u64> = victims.iter().copied().collect();
        self.entries.retain(|e| !doomed.contains(&e.sequence_id));
        self.index = VectorIndex::rebuild(
            self.index.dimension(),
            self.entries.iter().map(|e| e.embedding.as_slice()),
        )?;

        Ok(victims)
    }

    fn clear(&mut self) {
        self.index = VectorIndex::new(self.index.dimension());
        self.ledger.clear();
        self.entries.clear();
    }
}

/// Similarity-based answer cache in front of an expensive resolver.
///
/// Lookups share a read lock; insertion, eviction and persistence hold the
/// write lock. An insertion is staged first (new entry, updated ledger, and
/// a rebuilt index if anything is evicted), written to the store, and only
/// then applied, so a reader never sees a half-rebuilt index and a failed
/// write changes nothing.
pub struct SemanticCache {
    /// Configuration.
    config: CacheConfig,

    /// Turns queries into vectors.
    embedder: Arc<dyn EmbeddingProvider>,

    /// Answers queries the cache cannot.
    resolver: Arc<dyn Resolver>,

    /// Write-through store, if persistence is configured.
    store: Option<PersistentStore>,

    /// Index, ledger and entries.
    state: RwLock<CacheState>,

    /// Usage counters.
    counters: Counters,
}

impl SemanticCache {
    /// Create a new semantic cache builder.
    pub fn builder(
        embedder: Arc<dyn EmbeddingProvider>,
        resolver: Arc<dyn Resolver>,
    ) -> SemanticCacheBuilder {
        SemanticCacheBuilder::new(embedder, resolver)
    }

    /// Create a cache, loading any existing store at the configured path.
    ///
    /// Fails if the configuration is invalid, the store is corrupt, or the
    /// store was written with a different dimension.
    pub async fn new(
        config: CacheConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        resolver: Arc<dyn Resolver>,
    ) -> Result<Self> {
        Self::open(config, embedder, resolver, None).await
    }

    async fn open(
        config: CacheConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        resolver: Arc<dyn Resolver>,
        policy: Option<Box<dyn EvictionPolicy>>,
    ) -> Result<Self> {
        config.validate()?;

        let ledger = match policy {
            Some(policy) => EvictionLedger::new(policy, config.capacity()),
            None => EvictionLedger::from_kind(config.eviction_policy, config.capacity()),
        };

        if !embedder.is_available() {
            warn!("Embedding provider {} reports itself unavailable", embedder.name());
        }
        debug!(
            "Embedding with {} ({}), default dimension {}",
            embedder.name(),
            embedder.default_model(),
            embedder.default_dimension()
        );

        let store = config.store_path.as_ref().map(PersistentStore::new);
        let snapshot = match &store {
            Some(store) => store.load().await?,
            None => None,
        };

        let mut state = match snapshot {
            Some(snapshot) => CacheState::restore(config.dimension, ledger, snapshot)?,
            None => CacheState::new(config.dimension, ledger),
        };

        let trimmed = state.evict()?;
        if !trimmed.is_empty() {
            warn!(
                "Store held more entries than the configured capacity, evicted {}",
                trimmed.len()
            );
            if let Some(store) = &store {
                store
                    .save(config.dimension, state.next_sequence_id, &state.entries)
                    .await?;
            }
        }

        info!(
            "Semantic cache ready: {} entries, dimension {}, threshold {}, policy {}",
            state.entries.len(),
            config.dimension,
            config.threshold,
            state.ledger.policy_name()
        );

        Ok(Self {
            config,
            embedder,
            resolver,
            store,
            state: RwLock::new(state),
            counters: Counters::default(),
        })
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest::new(text).with_dimensions(self.config.dimension);
        let response = self.embedder.embed(request).await?;
        let embedding = response.embedding;

        if embedding.len() != self.config.dimension {
            return Err(CacheError::DimensionMismatch {
                expected: self.config.dimension,
                actual: embedding.len(),
            });
        }

        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::InvalidResponse(
                "embedding contains non-finite values".to_string(),
            )
            .into());
        }

        Ok(embedding)
    }

    async fn lookup_embedding(&self, query_text: &str, embedding: &[f32]) -> Result<Lookup> {
        let outcome = {
            let state = self.state.read().await;
            match state.nearest(embedding)? {
                Some((neighbor, entry)) if neighbor.distance <= self.config.threshold => {
                    debug!(
                        "Cache hit for {query_text:?}: row {} (sequence {}) at distance {:.3}",
                        neighbor.row_id, entry.sequence_id, neighbor.distance
                    );
                    Lookup::Hit(CacheHit {
                        answer: entry.answer.clone(),
                        matched_query: entry.query_text.clone(),
                        sequence_id: entry.sequence_id,
                        distance: neighbor.distance,
                    })
                }
                Some((neighbor, _)) => {
                    debug!(
                        "Cache miss for {query_text:?}: nearest distance {:.3} above {}",
                        neighbor.distance, self.config.threshold
                    );
                    Lookup::Miss
                }
                None => {
                    debug!("Cache miss for {query_text:?}: cache is empty");
                    Lookup::Miss
                }
            }
        };

        match &outcome {
            Lookup::Hit(hit) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                let mut state = self.state.write().await;
                if state.ledger.tracks_access() {
                    state.ledger.touch(hit.sequence_id);
                }
            }
            Lookup::Miss => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(outcome)
    }

    /// Look up a query without resolving on a miss.
    pub async fn lookup(&self, query_text: &str) -> Result<Lookup> {
        let embedding = self.embed(query_text).await?;
        self.lookup_embedding(query_text, &embedding).await
    }

    async fn resolve(&self, query_text: &str) -> Result<String> {
        let answer = self
            .resolver
            .resolve(query_text)
            .await
            .map_err(|e| CacheError::ResolverFailure(e.into()))?;

        if answer.trim().is_empty() {
            return Err(CacheError::ResolverFailure(
                "resolver returned an empty answer".into(),
            ));
        }

        Ok(answer)
    }

    /// Stage an insertion, persist the resulting contents, then apply it.
    async fn commit(
        &self,
        query_text: &str,
        embedding: Embedding,
        answer: String,
    ) -> Result<u64> {
        let mut state = self.state.write().await;

        let staged = state.stage(query_text, embedding, answer)?;
        let sequence_id = staged.entry.sequence_id;

        if let Some(store) = &self.store {
            let survivors =
                CacheState::survivors(&state.entries, &staged.entry, &staged.victims);
            store
                .save(self.config.dimension, sequence_id + 1, survivors)
                .await?;
        }

        let evicted = state.apply(staged)?;
        drop(state);

        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
        if !evicted.is_empty() {
            self.counters
                .evictions
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
            info!("Evicted {} cache entries: {evicted:?}", evicted.len());
        }

        debug!("Cached {query_text:?} as sequence {sequence_id}");
        Ok(sequence_id)
    }

    /// Resolve a query and cache the answer.
    ///
    /// Meant to be called after a [`Lookup::Miss`]. If the resolver fails
    /// nothing is inserted and nothing is written.
    pub async fn resolve_and_insert(&self, query_text: &str) -> Result<String> {
        let embedding = self.embed(query_text).await?;
        let answer = self.resolve(query_text).await?;
        self.commit(query_text, embedding, answer.clone()).await?;
        Ok(answer)
    }

    /// Cache an answer obtained elsewhere.
    pub async fn insert(&self, query_text: &str, answer: impl Into<String>) -> Result<u64> {
        let embedding = self.embed(query_text).await?;
        self.commit(query_text, embedding, answer.into()).await
    }

    /// Answer a query from the cache, resolving and caching on a miss.
    pub async fn ask(&self, query_text: &str) -> Result<String> {
        let started = Instant::now();
        let embedding = self.embed(query_text).await?;

        if let Lookup::Hit(hit) = self.lookup_embedding(query_text, &embedding).await? {
            debug!(
                "Answered {query_text:?} from cache in {:.3}s",
                started.elapsed().as_secs_f64()
            );
            return Ok(hit.answer);
        }

        let answer = self.resolve(query_text).await?;
        self.commit(query_text, embedding, answer.clone()).await?;

        info!(
            "Resolved and cached {query_text:?} in {:.3}s",
            started.elapsed().as_secs_f64()
        );
        Ok(answer)
    }

    /// All entries in sequence order.
    pub async fn entries(&self) -> Vec<CacheEntry> {
        self.state.read().await.entries.clone()
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        CacheStats {
            entries: state.entries.len(),
            capacity: state.ledger.capacity(),
            policy: state.ledger.policy_name().to_string(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            inserts: self.counters.inserts.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry and persist the empty cache.
    ///
    /// Sequence ids keep counting from where they were.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(store) = &self.store {
            store
                .save(
                    self.config.dimension,
                    state.next_sequence_id,
                    std::iter::empty::<&CacheEntry>(),
                )
                .await?;
        }

        state.clear();
        info!("Cleared semantic cache");
        Ok(())
    }

    /// Check that index, ledger and entries agree. Used by tests.
    #[cfg(test)]
    async fn assert_consistent(&self) {
        let state = self.state.read().await;
        let ids: Vec<u64> = state.entries.iter().map(|e| e.sequence_id).collect();
        assert_eq!(state.index.len(), state.entries.len());
        assert_eq!(state.ledger.order(), ids);
        for (row_id, entry) in state.entries.iter().enumerate() {
            assert_eq!(state.index.vector(row_id), Some(entry.embedding.as_slice()));
        }
    }
}

/// Builder for [`SemanticCache`].
pub struct SemanticCacheBuilder {
    config: CacheConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    resolver: Arc<dyn Resolver>,
    policy: Option<Box<dyn EvictionPolicy>>,
}

impl SemanticCacheBuilder {
    /// Create a new builder with the default configuration.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            config: CacheConfig::default(),
            embedder,
            resolver,
            policy: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.config.dimension = dimension;
        self
    }

    /// Set the hit threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Bound the cache with FIFO eviction.
    pub fn with_fifo(mut self, max_responses: usize) -> Self {
        self.config = self.config.with_fifo(max_responses);
        self
    }

    /// Let the cache grow without bound.
    pub fn unbounded(mut self) -> Self {
        self.config = self.config.unbounded();
        self
    }

    /// Persist to the given file.
    pub fn with_store_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.store_path = Some(path.into());
        self
    }

    /// Use a custom eviction ordering, bounded by `max_responses`.
    pub fn with_eviction_policy(mut self, policy: Box<dyn EvictionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the cache.
    pub async fn build(self) -> Result<SemanticCache> {
        SemanticCache::open(self.config, self.embedder, self.resolver, self.policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolver_fn;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use semcache_embeddings::{EmbeddingResponse, HashingProvider};
    use tempfile::TempDir;

    /// Maps "... <n>" to the n-th unit vector, so distinct numbers never collide.
    struct OneHotProvider {
        dimension: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for OneHotProvider {
        fn name(&self) -> &str {
            "one-hot"
        }

        fn default_model(&self) -> &str {
            "one-hot"
        }

        fn default_dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> semcache_embeddings::Result<EmbeddingResponse> {
            let slot: usize = request
                .text
                .rsplit(' ')
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or(EmbeddingError::EmptyInput)?;
            let mut embedding = vec![0.0; self.dimension];
            embedding[slot % self.dimension] = 1.0;
            Ok(EmbeddingResponse {
                embedding,
                model: "one-hot".to_string(),
                dimension: self.dimension,
                tokens_used: None,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn echo_resolver() -> Arc<dyn Resolver> {
        Arc::new(resolver_fn(|query: String| async move {
            anyhow::Ok(format!("answer: {query}"))
        }))
    }

    async fn one_hot_cache(config: CacheConfig) -> SemanticCache {
        let embedder = Arc::new(OneHotProvider {
            dimension: config.dimension,
        });
        SemanticCache::new(config, embedder, echo_resolver())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_identical_query_hits() {
        let config = CacheConfig::new(64);
        let embedder = Arc::new(HashingProvider::new(64));
        let cache = SemanticCache::new(config, embedder, echo_resolver())
            .await
            .unwrap();

        assert_eq!(
            cache.ask("What is the capital of France?").await.unwrap(),
            "answer: What is the capital of France?"
        );
        let lookup = cache.lookup("what is the capital of france").await.unwrap();
        assert!(lookup.is_hit());
        assert_eq!(
            lookup.answer(),
            Some("answer: What is the capital of France?")
        );

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        cache.assert_consistent().await;
    }

    #[tokio::test]
    async fn test_eviction_keeps_state_in_lockstep() {
        let cache = one_hot_cache(CacheConfig::new(16).with_fifo(3)).await;
        for i in 0..7 {
            cache.ask(&format!("question {i}")).await.unwrap();
            cache.assert_consistent().await;
        }

        let ids: Vec<u64> = cache
            .entries()
            .await
            .iter()
            .map(|e| e.sequence_id)
            .collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert_eq!(cache.stats().await.evictions, 4);
    }

    #[tokio::test]
    async fn test_non_finite_embedding_is_rejected() {
        struct NanProvider;

        #[async_trait]
        impl EmbeddingProvider for NanProvider {
            fn name(&self) -> &str {
                "nan"
            }

            fn default_model(&self) -> &str {
                "nan"
            }

            fn default_dimension(&self) -> usize {
                2
            }

            async fn embed(
                &self,
                _request: EmbeddingRequest,
            ) -> semcache_embeddings::Result<EmbeddingResponse> {
                Ok(EmbeddingResponse {
                    embedding: vec![f32::NAN, 0.0],
                    model: "nan".to_string(),
                    dimension: 2,
                    tokens_used: None,
                })
            }

            fn is_available(&self) -> bool {
                true
            }
        }

        let cache = SemanticCache::new(CacheConfig::new(2), Arc::new(NanProvider), echo_resolver())
            .await
            .unwrap();

        let result = cache.ask("anything").await;
        assert!(matches!(result, Err(CacheError::EmbeddingFailure(_))));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_persists_and_keeps_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        let cache = one_hot_cache(CacheConfig::new(8).with_store_path(&path)).await;

        cache.insert("first 1", "first").await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
        cache.assert_consistent().await;

        assert_eq!(cache.insert("second 2", "second").await.unwrap(), 1);

        let snapshot = PersistentStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.next_sequence_id, 2);
    }

    /// Keeps the most recently served entries.
    #[derive(Debug, Clone, Default)]
    struct RecencyPolicy {
        order: Vec<u64>,
    }

    impl EvictionPolicy for RecencyPolicy {
        fn name(&self) -> &'static str {
            "recency"
        }

        fn record(&mut self, sequence_id: u64) {
            self.order.push(sequence_id);
        }

        fn tracks_access(&self) -> bool {
            true
        }

        fn touch(&mut self, sequence_id: u64) {
            if let Some(pos) = self.order.iter().position(|&id| id == sequence_id) {
                let id = self.order.remove(pos);
                self.order.push(id);
            }
        }

        fn evict(&mut self, max_responses: usize) -> Vec<u64> {
            let excess = self.order.len().saturating_sub(max_responses);
            self.order.drain(..excess).collect()
        }

        fn len(&self) -> usize {
            self.order.len()
        }

        fn order(&self) -> Vec<u64> {
            self.order.clone()
        }

        fn clear(&mut self) {
            self.order.clear();
        }

        fn clone_box(&self) -> Box<dyn EvictionPolicy> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_custom_policy_is_used_for_eviction() {
        let embedder = Arc::new(OneHotProvider { dimension: 8 });
        let cache = SemanticCache::builder(embedder, echo_resolver())
            .with_dimension(8)
            .with_fifo(2)
            .with_eviction_policy(Box::new(RecencyPolicy::default()))
            .build()
            .await
            .unwrap();

        cache.ask("alpha 1").await.unwrap();
        cache.ask("bravo 2").await.unwrap();
        assert!(cache.lookup("alpha again 1").await.unwrap().is_hit());
        cache.ask("charlie 3").await.unwrap();

        let queries: Vec<String> = cache
            .entries()
            .await
            .into_iter()
            .map(|e| e.query_text)
            .collect();
        assert_eq!(queries, vec!["alpha 1", "charlie 3"]);
        assert_eq!(cache.stats().await.policy, "recency");
    }

    #[tokio::test]
    async fn test_custom_policy_respects_unbounded_config() {
        let mut config = CacheConfig::new(8).with_fifo(2);
        config.eviction_policy = crate::config::EvictionPolicyKind::None;

        let embedder = Arc::new(OneHotProvider { dimension: 8 });
        let cache = SemanticCache::builder(embedder, echo_resolver())
            .with_config(config)
            .with_eviction_policy(Box::new(RecencyPolicy::default()))
            .build()
            .await
            .unwrap();

        for i in 0..5 {
            cache.ask(&format!("question {i}")).await.unwrap();
        }

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 5);
        assert_eq!(stats.capacity, None);
        assert_eq!(stats.evictions, 0);
    }
}
