use super::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use topdeck_core::*;

/// Attribute set of synthetic decks, in enumeration order.
pub const ATTRIBUTES: [&str; 4] = ["power", "speed", "skill", "defense"];
/// Smallest synthetic deck: a full four-seat deal of six plus two for the kitty.
pub const SYNTHETIC_CARDS: usize = 26;
/// Inclusive upper bound on generated stats.
pub const STAT_MAX: Stat = 100;

const TITLES: [&str; 13] = [
    "Captain", "Rookie", "Warlord", "Navigator", "Sniper", "Cook", "Doctor", "Scholar",
    "Shipwright", "Musician", "Swordsman", "Admiral", "Wanderer",
];

/// Offline forge producing deterministic decks from the theme name.
/// Same theme (case-insensitive) and size always yields the same deck.
#[derive(Debug, Clone, Default)]
pub struct Synthetic;

impl Synthetic {
    fn seed(theme: &str) -> u64 {
        // FNV-1a, stable across builds unlike std's hasher
        theme
            .to_lowercase()
            .bytes()
            .fold(0xcbf29ce484222325, |h, b| {
                (h ^ b as u64).wrapping_mul(0x100000001b3)
            })
    }
    fn slug(theme: &str) -> String {
        theme
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
    /// "one PIECE" -> "One Piece"
    fn title(theme: &str) -> String {
        theme
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                let head = chars.next().map(|c| c.to_uppercase().collect::<String>());
                let tail = chars.as_str().to_lowercase();
                head.map(|head| head + &tail).unwrap_or_default()
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
    pub fn generate(theme: &str) -> Deck {
        Self::sized(theme, SYNTHETIC_CARDS)
    }
    /// Deck of `count` cards; a shorter deck for the same theme is a prefix.
    pub fn sized(theme: &str, count: usize) -> Deck {
        let ref mut rng = SmallRng::seed_from_u64(Self::seed(theme));
        let slug = Self::slug(theme);
        let name = Self::title(theme);
        let cards = (0..count)
            .map(|i| {
                let title = TITLES[i % TITLES.len()];
                let rank = i / TITLES.len() + 1;
                Card::new(
                    format!("{} {} {}", name, title, rank),
                    format!("https://picsum.photos/seed/{}-{}/400/600", slug, i),
                    ATTRIBUTES
                        .iter()
                        .map(|a| (a.to_string(), rng.random_range(0..=STAT_MAX))),
                )
            })
            .collect();
        Deck::new(ATTRIBUTES.iter().map(|a| a.to_string()).collect(), cards)
    }
}

#[async_trait::async_trait]
impl Forge for Synthetic {
    async fn forge(&self, theme: &str, cached: Option<&Deck>, needed: usize) -> anyhow::Result<Deck> {
        match cached {
            Some(deck) if deck.len() >= needed && !deck.attributes().is_empty() => Ok(deck.clone()),
            _ => Ok(Self::sized(theme, needed.max(SYNTHETIC_CARDS))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_theme() {
        assert_eq!(Synthetic::generate("One Piece"), Synthetic::generate("one piece"));
        assert_eq!(Synthetic::generate("One Piece"), Synthetic::generate("ONE PIECE"));
        assert_ne!(Synthetic::generate("One Piece"), Synthetic::generate("Naruto"));
        assert_eq!(Synthetic::generate("one piece").cards()[0].name(), "One Piece Captain 1");
    }
    #[test]
    fn stats_are_bounded_and_complete() {
        let deck = Synthetic::generate("Bleach");
        assert_eq!(deck.len(), SYNTHETIC_CARDS);
        assert_eq!(deck.attributes(), ATTRIBUTES);
        for card in deck.cards() {
            assert_eq!(card.stats().len(), ATTRIBUTES.len());
            assert!(card.stats().values().all(|s| (0..=STAT_MAX).contains(s)));
        }
    }
    #[test]
    fn deals_a_full_table() {
        assert!(Synthetic::generate("Bleach").sufficient(MAX_PLAYERS, HAND_SIZE));
    }
    #[test]
    fn larger_decks_extend_smaller_ones() {
        let small = Synthetic::generate("Bleach");
        let large = Synthetic::sized("Bleach", 40);
        assert_eq!(large.len(), 40);
        assert!(large.sufficient(5, 8));
        assert_eq!(&large.cards()[..SYNTHETIC_CARDS], small.cards());
    }
    #[tokio::test]
    async fn cached_deck_is_reused() {
        let cached = Synthetic::sized("Naruto", 30);
        let deck = Synthetic.forge("Bleach", Some(&cached), 24).await.unwrap();
        assert_eq!(deck, cached);
        let fresh = Synthetic.forge("Bleach", None, 24).await.unwrap();
        assert_eq!(fresh, Synthetic::generate("Bleach"));
    }
    #[tokio::test]
    async fn undersized_cache_is_regenerated() {
        let cached = Synthetic::generate("Bleach");
        let deck = Synthetic.forge("Bleach", Some(&cached), 35).await.unwrap();
        assert_eq!(deck, Synthetic::sized("Bleach", 35));
        let empty = Deck::new(vec![], Synthetic::sized("Bleach", 40).cards().to_vec());
        let deck = Synthetic.forge("Bleach", Some(&empty), 24).await.unwrap();
        assert_eq!(deck, Synthetic::generate("Bleach"));
    }
}
