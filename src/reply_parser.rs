//! Best-effort extraction of score, sentiment and category from free-text model replies.
//!
//! The model is asked for a line format but nothing enforces it, so every field has a
//! fallback: no score, `inconnu`, or the reply's last line as an invented category. Field
//! extractions are independent of each other.

use unicode_normalization::UnicodeNormalization;

use crate::models::{ParsedReply, Sentiment};

/// Substring marking the score line
pub const SCORE_MARKER: &str = "Note";

/// Highest accepted score
pub const MAX_SCORE: u8 = 100;

/// Category used when the reply is empty
pub const DEFAULT_CATEGORY: &str = "autre";

/// Fixed category labels the model is asked to choose from
pub const CATEGORY_LABELS: [&str; 6] = [
    "Problème de facturation",
    "Panne et urgences",
    "Service client injoignable",
    "Problème avec l'application",
    "Délai d'intervention",
    "Problème d'âge",
];

/// Turns a raw model reply into structured fields
pub trait ReplyParser: Send + Sync {
    /// Parse `reply`. Never fails: unusable fields degrade to their fallback values.
    fn parse(&self, reply: &str) -> ParsedReply;
}

/// Line-oriented parser matching the marker, sentiment words and category labels
#[derive(Debug, Clone)]
pub struct LineReplyParser {
    category_labels: Vec<String>,
}

impl Default for LineReplyParser {
    fn default() -> Self {
        Self::new(CATEGORY_LABELS.iter().map(ToString::to_string).collect())
    }
}

impl LineReplyParser {
    /// Create a parser recognising `category_labels` as fixed categories
    #[must_use]
    pub fn new(category_labels: Vec<String>) -> Self {
        let category_labels = category_labels.iter().map(|l| l.nfc().collect::<String>()).collect();
        Self { category_labels }
    }

    /// Fixed category labels, NFC-normalized
    #[must_use]
    pub fn category_labels(&self) -> &[String] {
        &self.category_labels
    }

    /// Score from the first line containing [`SCORE_MARKER`]
    #[must_use]
    pub fn extract_score(lines: &[&str]) -> Option<u8> {
        let line = lines.iter().find(|line| line.contains(SCORE_MARKER))?;
        let (_, value) = line.split_once(':')?;
        value.trim().parse::<u8>().ok().filter(|score| *score <= MAX_SCORE)
    }

    /// Sentiment from the first line containing a sentiment word
    #[must_use]
    pub fn extract_sentiment(lines: &[&str]) -> Sentiment {
        let Some(line) = lines
            .iter()
            .find(|line| Sentiment::LABELS.iter().any(|s| line.contains(s.as_str())))
        else {
            return Sentiment::Unknown;
        };

        // Prefer the value side of "Sentiment : négatif" over words in the key.
        let value = line.split_once(':').map_or(*line, |(_, rest)| rest);
        earliest_sentiment(value)
            .or_else(|| earliest_sentiment(line))
            .unwrap_or(Sentiment::Unknown)
    }

    /// Category from the first line naming a fixed label, else the last line verbatim
    #[must_use]
    pub fn extract_category(&self, lines: &[&str]) -> String {
        self.labelled_category(lines)
            .unwrap_or_else(|| Self::fallback_category(lines))
    }

    /// Lowercased category from the first line naming a fixed label
    fn labelled_category(&self, lines: &[&str]) -> Option<String> {
        let has_label = |text: &str| self.category_labels.iter().any(|label| text.contains(label.as_str()));

        let line = lines.iter().find(|line| has_label(**line))?;
        let value = match line.split_once(':') {
            Some((_, rest)) if has_label(rest) => rest,
            _ => *line,
        };
        Some(value.trim().to_lowercase())
    }

    fn fallback_category(lines: &[&str]) -> String {
        lines.last().map_or_else(|| DEFAULT_CATEGORY.to_string(), ToString::to_string)
    }
}

fn earliest_sentiment(text: &str) -> Option<Sentiment> {
    Sentiment::LABELS
        .iter()
        .filter_map(|s| text.find(s.as_str()).map(|pos| (pos, *s)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, s)| s)
}

impl ReplyParser for LineReplyParser {
    fn parse(&self, reply: &str) -> ParsedReply {
        let normalized: String = reply.nfc().collect();
        let lines: Vec<&str> = normalized.lines().collect();

        let labelled = self.labelled_category(&lines);

        ParsedReply {
            score: Self::extract_score(&lines),
            sentiment: Self::extract_sentiment(&lines),
            category_fallback: labelled.is_none(),
            category: labelled.unwrap_or_else(|| Self::fallback_category(&lines)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(reply: &str) -> ParsedReply {
        LineReplyParser::default().parse(reply)
    }

    #[test]
    fn test_full_reply() {
        let parsed = parse("Note : 85\nSentiment : négatif\nProblème de facturation : oui");
        assert_eq!(parsed.score, Some(85));
        assert_eq!(parsed.sentiment, Sentiment::Negative);
        assert_eq!(parsed.category, "problème de facturation : oui");
        assert!(!parsed.category_fallback);
    }

    #[test]
    fn test_category_value_after_colon() {
        let parsed = parse("Note : 40\nSentiment : neutre\nCatégorie : Panne et urgences");
        assert_eq!(parsed.category, "panne et urgences");
    }

    #[test]
    fn test_category_fallback_keeps_case() {
        let parsed = parse("Note : 10\nSentiment : positif\nCompliments Sur Le Service");
        assert_eq!(parsed.category, "Compliments Sur Le Service");
        assert!(parsed.category_fallback);
    }

    #[test]
    fn test_empty_reply() {
        let parsed = parse("");
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.sentiment, Sentiment::Unknown);
        assert_eq!(parsed.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_decomposed_accents_match() {
        // "négatif" and "Problème" written with combining accents
        let reply = "Sentiment : ne\u{301}gatif\nProble\u{300}me de facturation";
        let parsed = parse(reply);
        assert_eq!(parsed.sentiment, Sentiment::Negative);
        assert_eq!(parsed.category, "problème de facturation");
    }
}
