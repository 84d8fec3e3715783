use serde::{Deserialize, Serialize};

/// The keywords rewritten from the platform's vocabulary into the target
/// dialect. Other words of the platform's vocabulary pass through unchanged.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Select,
    As,
    From,
    Where,
    And,
    Or,
}

impl Keyword {
    /// The platform's spelling of the keyword.
    pub fn native(&self) -> &'static str {
        match self {
            Keyword::Select => "ВЫБРАТЬ",
            Keyword::As => "КАК",
            Keyword::From => "ИЗ",
            Keyword::Where => "ГДЕ",
            Keyword::And => "И",
            Keyword::Or => "ИЛИ",
        }
    }

    /// The target dialect's spelling of the keyword.
    pub fn sql(&self) -> &'static str {
        self.into()
    }

    /// Matches a whole word against both spellings, ignoring case.
    pub fn from_word(word: &str) -> Option<Keyword> {
        use strum::IntoEnumIterator;

        let word = word.to_lowercase();
        Keyword::iter().find(|kw| kw.native().to_lowercase() == word || kw.sql() == word)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql())
    }
}
