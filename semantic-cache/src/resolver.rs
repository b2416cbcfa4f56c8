//! The authoritative answer source consulted on a miss.

use std::future::Future;

use async_trait::async_trait;

/// Produces the answer for a query the cache could not serve.
///
/// Implementations typically query a retrieval database or call a hosted
/// model. An error (or a blank answer) means nothing gets cached.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a query to its answer.
    async fn resolve(&self, query_text: &str) -> anyhow::Result<String>;
}

/// A [`Resolver`] backed by an async closure.
pub struct FnResolver<F> {
    f: F,
}

/// Adapt an async closure into a [`Resolver`].
///
/// ```rust,ignore
/// let resolver = resolver_fn(|query: String| async move {
///     anyhow::Ok(format!("answer for {query}"))
/// });
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    FnResolver { f }
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn resolve(&self, query_text: &str) -> anyhow::Result<String> {
        (self.f)(query_text.to_string()).await
    }
}
