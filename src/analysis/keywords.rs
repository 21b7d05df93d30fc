/// Self-reference ("I") statement phrases
pub const I_PHRASES: &[&str] = &["I feel", "I think", "I need", "I believe", "I am hurt"];

/// Other-reference ("you") statement phrases
pub const YOU_PHRASES: &[&str] = &[
    "You always",
    "You never",
    "Because you",
    "You should",
    "It's your fault",
];

/// Affirmation phrases
pub const PRAISE_PHRASES: &[&str] = &[
    "I appreciate",
    "Thank you",
    "You are good at",
    "I value",
    "Good job",
    "I love how you",
];

/// Tension phrases
pub const TENSION_PHRASES: &[&str] = &["Hurt", "Angry", "Stop", "Whatever", "Not fair"];

/// Increments produced by analyzing one transcript fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub words: u64,
    pub i_statements: u64,
    pub you_statements: u64,
    pub praise: u64,
    pub tension: u64,
}

impl StatsDelta {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Scans transcript fragments against the four fixed phrase lists
pub struct KeywordAnalyzer {
    i_phrases: Vec<String>,
    you_phrases: Vec<String>,
    praise_phrases: Vec<String>,
    tension_phrases: Vec<String>,
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        let lower = |phrases: &[&str]| phrases.iter().map(|p| p.to_lowercase()).collect();

        Self {
            i_phrases: lower(I_PHRASES),
            you_phrases: lower(YOU_PHRASES),
            praise_phrases: lower(PRAISE_PHRASES),
            tension_phrases: lower(TENSION_PHRASES),
        }
    }
}

impl KeywordAnalyzer {
    /// Analyze one fragment and return the increments to apply.
    ///
    /// Matching is case-insensitive substring membership: each configured
    /// phrase contributes at most 1 per fragment no matter how often it
    /// repeats. Word count is the number of non-empty whitespace-delimited
    /// tokens. Empty input yields the zero delta; never an error.
    pub fn analyze(&self, text: &str) -> StatsDelta {
        let lowered = text.to_lowercase();

        let count = |phrases: &[String]| {
            phrases.iter().filter(|p| lowered.contains(p.as_str())).count() as u64
        };

        StatsDelta {
            words: text.split_whitespace().count() as u64,
            i_statements: count(&self.i_phrases),
            you_statements: count(&self.you_phrases),
            praise: count(&self.praise_phrases),
            tension: count(&self.tension_phrases),
        }
    }
}
