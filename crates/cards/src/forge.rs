use super::*;

/// Card generation collaborator.
///
/// Given a theme, the deck previously cached for it (if any) and the number
/// of cards a full table needs, returns a deck of at least `needed` cards.
/// Implementations may return the cached deck as-is when it is large enough
/// or regenerate. Failures are fatal to the lobby being created and are not
/// retried.
#[async_trait::async_trait]
pub trait Forge: Send + Sync {
    async fn forge(&self, theme: &str, cached: Option<&Deck>, needed: usize) -> anyhow::Result<Deck>;
}
