const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "neither", "nor", "without",
];

/// A polarity word flips sign when a negation appears within this many
/// tokens before it.
const NEGATION_WINDOW: usize = 3;

/// Word-list polarity scorer for news headlines.
///
/// Counts positive and negative hits with negation handling, then squashes
/// the raw count into [-1, 1] so stored sentiment values share one scale
/// regardless of headline length.
pub struct HeadlineScorer {
    positive_words: Vec<&'static str>,
    negative_words: Vec<&'static str>,
}

impl HeadlineScorer {
    pub fn new() -> Self {
        Self {
            positive_words: vec![
                "bullish", "rally", "surge", "soar", "gain", "profit", "growth", "beat",
                "upgrade", "outperform", "strong", "positive", "rise", "increase", "breakthrough",
                "success", "exceed", "momentum", "buy", "recommend", "optimistic", "record",
                "advance", "dividend", "buyback", "upside", "recovery", "rebound", "expansion",
                "robust", "raised", "upgraded", "tailwind",
            ],
            negative_words: vec![
                "bearish", "decline", "loss", "fall", "plunge", "crash", "miss", "downgrade",
                "underperform", "weak", "negative", "drop", "decrease", "concern", "risk", "fail",
                "disappoint", "slump", "sell", "warning", "pessimistic", "retreat", "fear",
                "trouble", "headwind", "lawsuit", "litigation", "recall", "investigation",
                "default", "bankruptcy", "layoff", "downside", "overvalued", "lowered",
                "suspended",
            ],
        }
    }

    /// Score one headline into [-1, 1]. A text with no polarity hits scores
    /// exactly 0.0.
    pub fn score(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| NEGATION_WORDS.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut raw: i32 = 0;
        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive_words.contains(word);
            let is_negative = self.negative_words.contains(word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&pos| pos < i && (i - pos) <= NEGATION_WINDOW);

            if is_positive {
                raw += if negated { -1 } else { 1 };
            } else {
                raw += if negated { 1 } else { -1 };
            }
        }

        (raw as f64 / 3.0).tanh()
    }
}

impl Default for HeadlineScorer {
    fn default() -> Self {
        Self::new()
    }
}
