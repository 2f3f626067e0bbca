use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question category: {0}")]
pub struct UnknownCategory(pub String);

/// Flavor of a weighted question.
///
/// Weighted quizzes (e.g. the brain-type quiz) tally points per category and
/// report the dominant one at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Analytical,
    Creative,
    Social,
    Practical,
}

/// Icon name per category, as understood by the rendering layer.
const CATEGORY_ICONS: [(Category, &str); 4] = [
    (Category::Analytical, "brain"),
    (Category::Creative, "palette"),
    (Category::Social, "users"),
    (Category::Practical, "wrench"),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Analytical,
        Category::Creative,
        Category::Social,
        Category::Practical,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Analytical => "analytical",
            Category::Creative => "creative",
            Category::Social => "social",
            Category::Practical => "practical",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        CATEGORY_ICONS
            .iter()
            .find(|(category, _)| *category == self)
            .map_or("circle-help", |(_, icon)| *icon)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_an_icon() {
        for category in Category::ALL {
            assert_ne!(category.icon(), "circle-help", "{category} lacks an icon");
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Creative".parse::<Category>().unwrap(), Category::Creative);
        assert!("mystic".parse::<Category>().is_err());
    }

    #[test]
    fn deserializes_lowercase_tag() {
        let category: Category = serde_json::from_str("\"social\"").unwrap();
        assert_eq!(category, Category::Social);
    }
}
