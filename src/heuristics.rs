use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Sentiment, TweetRecord};

/// Category returned when no keyword matches
pub const OTHER_CATEGORY: &str = "Autre";

const NEGATIVE_WORDS: [&str; 8] = ["problème", "erreur", "bug", "panne", "mauvais", "horrible", "nul", "impossible"];
const POSITIVE_WORDS: [&str; 6] = ["merci", "super", "excellent", "parfait", "bon", "bien"];

/// Weight of one keyword hit in the sentiment score
const KEYWORD_WEIGHT: f32 = 0.2;

/// Problem categories and their keywords, in priority order for ties
const CATEGORIES: [(&str, &[&str]); 5] = [
    ("Facturation", &["facture", "prélèvement", "paiement", "tarif", "prix", "augmentation", "euros", "cher"]),
    ("Application/Site", &["application", "site", "connexion", "compte", "mot de passe", "bug", "web", "appli"]),
    ("Chauffage/Eau", &["chauffage", "chaudière", "eau chaude", "radiateur", "température", "froid", "gaz"]),
    ("Service Client", &["service client", "joindre", "appel", "attente", "réponse", "mail", "contact"]),
    ("Installation", &["installation", "technicien", "intervention", "compteur", "rendez-vous", "visite"]),
];

/// Keyword-based classification, no network involved
pub struct KeywordClassifier {
    url_regex: Regex,
    mention_regex: Regex,
    hashtag_regex: Regex,
    special_chars_regex: Regex,
    extra_spaces_regex: Regex,
}

/// Heuristic verdict for one tweet
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordVerdict {
    /// Net keyword score in [-1, 1]
    pub score: f32,
    /// Sentiment band of the score
    pub sentiment: Sentiment,
    /// Best matching problem category
    pub category: &'static str,
}

impl KeywordClassifier {
    /// Create a classifier, compiling its cleaning patterns
    pub fn new() -> Result<Self> {
        // Initialize regular expressions for text cleaning
        let url_regex = Regex::new(r"https?://\S+")
            .map_err(|e| anyhow::anyhow!("Failed to compile URL regex: {e}"))?;
        let mention_regex = Regex::new(r"@\w+")
            .map_err(|e| anyhow::anyhow!("Failed to compile mention regex: {e}"))?;
        let hashtag_regex = Regex::new(r"#\w+")
            .map_err(|e| anyhow::anyhow!("Failed to compile hashtag regex: {e}"))?;
        let special_chars_regex = Regex::new(r"[^\w\s'-]")
            .map_err(|e| anyhow::anyhow!("Failed to compile special chars regex: {e}"))?;
        let extra_spaces_regex = Regex::new(r"\s+")
            .map_err(|e| anyhow::anyhow!("Failed to compile spaces regex: {e}"))?;

        Ok(Self {
            url_regex,
            mention_regex,
            hashtag_regex,
            special_chars_regex,
            extra_spaces_regex,
        })
    }

    /// Strip URLs, mentions, hashtags and punctuation other than `'` and `-`, then collapse whitespace
    #[must_use]
    pub fn clean_tweet_text(&self, text: &str) -> String {
        let normalized: String = text.nfc().collect();
        let no_urls = self.url_regex.replace_all(&normalized, "");
        let no_mentions = self.mention_regex.replace_all(&no_urls, "");
        let no_hashtags = self.hashtag_regex.replace_all(&no_mentions, "");
        let no_special = self.special_chars_regex.replace_all(&no_hashtags, "");
        self.extra_spaces_regex.replace_all(&no_special, " ").trim().to_string()
    }

    /// Net keyword score: -0.2 per negative keyword present, +0.2 per positive one, clamped
    #[must_use]
    pub fn sentiment_score(&self, text: &str) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let score = net_keyword_hits(text) as f32 * KEYWORD_WEIGHT;
        score.clamp(-1.0, 1.0)
    }

    /// Sentiment band: négatif up to -0.2, neutre up to 0.2, positif above
    #[must_use]
    pub fn sentiment(&self, text: &str) -> Sentiment {
        // Banding on hit counts avoids float drift at the 0.2 boundaries.
        match net_keyword_hits(text) {
            n if n <= -1 => Sentiment::Negative,
            0 | 1 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        }
    }

    /// Category with the most keyword hits, first declared wins ties
    #[must_use]
    pub fn categorize(&self, text: &str) -> &'static str {
        let text = normalize(text);
        let mut best = (0usize, OTHER_CATEGORY);
        for (category, keywords) in CATEGORIES {
            let hits = keywords.iter().filter(|keyword| text.contains(*keyword)).count();
            if hits > best.0 {
                best = (hits, category);
            }
        }
        best.1
    }

    /// Score, band and category of one text
    #[must_use]
    pub fn classify(&self, text: &str) -> KeywordVerdict {
        KeywordVerdict {
            score: self.sentiment_score(text),
            sentiment: self.sentiment(text),
            category: self.categorize(text),
        }
    }

    /// Count problem categories over negative and neutral tweets, on cleaned text
    #[must_use]
    pub fn problem_breakdown<'a>(&self, tweets: impl IntoIterator<Item = &'a TweetRecord>) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for tweet in tweets {
            let verdict = self.classify(&self.clean_tweet_text(&tweet.content));
            if verdict.sentiment != Sentiment::Positive {
                *counts.entry(verdict.category).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

fn net_keyword_hits(text: &str) -> i32 {
    let text = normalize(text);
    let count = |words: &[&str]| words.iter().filter(|word| text.contains(*word)).count();
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let net = count(&POSITIVE_WORDS) as i32 - count(&NEGATIVE_WORDS) as i32;
    net
}
