use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use topdeck_core::*;

/// A single themed card. Immutable once dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    name: String,
    image: String,
    stats: BTreeMap<Attribute, Stat>,
}

impl Card {
    pub fn new<I>(name: impl Into<String>, image: impl Into<String>, stats: I) -> Self
    where
        I: IntoIterator<Item = (Attribute, Stat)>,
    {
        Self {
            name: name.into(),
            image: image.into(),
            stats: stats.into_iter().collect(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn image(&self) -> &str {
        &self.image
    }
    pub fn stats(&self) -> &BTreeMap<Attribute, Stat> {
        &self.stats
    }
    /// Stat for an attribute. Attributes the card lacks count as 0.
    pub fn stat(&self, attr: &str) -> Stat {
        self.stats.get(attr).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, (attr, stat)) in self.stats.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", attr, stat)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luffy() -> Card {
        Card::new(
            "Luffy",
            "luffy.png",
            [("power".to_string(), 90), ("speed".to_string(), 70)],
        )
    }

    #[test]
    fn missing_attribute_is_zero() {
        let card = luffy();
        assert_eq!(card.stat("power"), 90);
        assert_eq!(card.stat("charisma"), 0);
    }
    #[test]
    fn display_lists_stats() {
        assert_eq!(luffy().to_string(), "Luffy (power 90, speed 70)");
    }
    #[test]
    fn serializes_stats_as_mapping() {
        let json = serde_json::to_value(luffy()).unwrap();
        assert_eq!(json["stats"]["power"], 90);
        assert_eq!(json["image"], "luffy.png");
    }
}
