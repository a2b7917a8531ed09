//! Answer quality heuristic
//!
//! A cheap circuit breaker for the cascade: flags answers that are short,
//! hedged, vague or mostly questions. It is not a quality model; false
//! positives cost an extra strong-model call, false negatives let weak
//! answers through.

/// Answers shorter than this many characters are low-confidence
pub const MIN_CONFIDENT_CHARS: usize = 50;
/// Answers with fewer whitespace-separated tokens are low-confidence
pub const MIN_CONFIDENT_TOKENS: usize = 10;

/// Hedging and refusal phrases, matched against the lowercased answer
pub const HEDGING_PHRASES: &[&str] = &[
    "i am not sure",
    "i'm not sure",
    "not sure",
    "cannot help",
    "can't help",
    "don't know",
    "do not know",
    "i don't have",
    "i do not have",
    "unable to",
    "cannot provide",
    "can't provide",
    "insufficient information",
    "unclear",
    "i apologize",
    "sorry, i",
    "i cannot",
    "i can't",
    "no information",
    "not available",
    "doesn't seem",
    "does not seem",
];

/// A triggered quality rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    TooShort { chars: usize },
    Hedging { phrase: &'static str },
    TooFewTokens { tokens: usize },
    TooManyQuestions { questions: usize, tokens: usize },
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityIssue::TooShort { .. } => {
                write!(f, "Answer too short (< {MIN_CONFIDENT_CHARS} chars)")
            }
            QualityIssue::Hedging { phrase } => {
                write!(f, "Contains low-confidence phrase '{phrase}'")
            }
            QualityIssue::TooFewTokens { .. } => f.write_str("Generic/vague answer detected"),
            QualityIssue::TooManyQuestions { .. } => {
                f.write_str("Too many questions, not enough content")
            }
        }
    }
}

fn too_short(answer: &str) -> Option<QualityIssue> {
    let chars = answer.chars().count();
    (chars < MIN_CONFIDENT_CHARS).then_some(QualityIssue::TooShort { chars })
}

fn hedging(answer: &str) -> Option<QualityIssue> {
    let lower = answer.to_lowercase();
    HEDGING_PHRASES
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
        .map(|phrase| QualityIssue::Hedging { phrase })
}

fn too_few_tokens(answer: &str) -> Option<QualityIssue> {
    let tokens = answer.split_whitespace().count();
    (tokens < MIN_CONFIDENT_TOKENS).then_some(QualityIssue::TooFewTokens { tokens })
}

fn too_many_questions(answer: &str) -> Option<QualityIssue> {
    let tokens = answer.split_whitespace().count();
    let questions = answer.matches('?').count();
    // questions > tokens / 10 without integer truncation
    (questions * 10 > tokens).then_some(QualityIssue::TooManyQuestions { questions, tokens })
}

type Rule = fn(&str) -> Option<QualityIssue>;

const RULES: &[Rule] = &[too_short, hedging, too_few_tokens, too_many_questions];

/// True when the answer trips any rule; stops at the first hit
pub fn looks_low_confidence(answer: &str) -> bool {
    RULES.iter().any(|rule| rule(answer).is_some())
}

/// Every triggered rule, in rule order
pub fn diagnose(answer: &str) -> Vec<QualityIssue> {
    RULES.iter().filter_map(|rule| rule(answer)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIDENT: &str = "Tokyo is the capital of Japan and its largest city by far.";

    #[test]
    fn test_confident_answer_passes() {
        assert!(!looks_low_confidence(CONFIDENT));
        assert!(diagnose(CONFIDENT).is_empty());
    }

    #[test]
    fn test_length_boundary_49_and_50() {
        let fifty = "Kyoto has many temples and a good rail link, yes.";
        let fifty = format!("{fifty} ");
        assert_eq!(fifty.chars().count(), 50);
        assert!(fifty.split_whitespace().count() >= 10);
        assert!(!looks_low_confidence(&fifty));

        let forty_nine: String = fifty.chars().take(49).collect();
        assert!(looks_low_confidence(&forty_nine));
        assert_eq!(
            diagnose(&forty_nine)[0],
            QualityIssue::TooShort { chars: 49 }
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 25 two-byte chars is 50 bytes but still too short
        let answer = "é".repeat(25);
        assert!(matches!(
            diagnose(&answer)[0],
            QualityIssue::TooShort { chars: 25 }
        ));
    }

    #[test]
    fn test_hedging_is_case_insensitive() {
        let answer = "I Am Not Sure which ferry runs on Sundays, the schedule changes every season.";
        assert_eq!(
            diagnose(answer),
            vec![QualityIssue::Hedging {
                phrase: "i am not sure"
            }]
        );
    }

    #[test]
    fn test_diagnose_reports_every_rule() {
        let issues = diagnose("I am not sure");
        assert_eq!(
            issues,
            vec![
                QualityIssue::TooShort { chars: 13 },
                QualityIssue::Hedging {
                    phrase: "i am not sure"
                },
                QualityIssue::TooFewTokens { tokens: 4 },
            ]
        );
    }

    #[test]
    fn test_few_long_tokens_are_vague() {
        let answer = "Supercalifragilistic expialidocious antidisestablishmentarianism pneumono";
        assert!(answer.chars().count() >= 50);
        assert_eq!(diagnose(answer), vec![QualityIssue::TooFewTokens { tokens: 4 }]);
    }

    #[test]
    fn test_question_ratio() {
        // 11 tokens, 1 question: not too many
        let one = "Would you like the coastal route through the old harbour town?";
        assert_eq!(one.split_whitespace().count(), 11);
        assert!(!looks_low_confidence(one));

        // 11 tokens, 2 questions: too many
        let two = "Coastal route or mountain pass? Which suits your group and budget?";
        assert!(matches!(
            diagnose(two).as_slice(),
            [QualityIssue::TooManyQuestions { questions: 2, .. }]
        ));

        // exactly tokens / 10 questions is allowed
        let at_ratio = "Would you prefer the coastal route through the harbour town?";
        assert_eq!(at_ratio.split_whitespace().count(), 10);
        assert!(diagnose(at_ratio).is_empty());

        let at_ratio_twice = "Would you prefer the coastal route through the harbour town? \
            Or should we take the mountain pass over the ridge?";
        assert_eq!(at_ratio_twice.split_whitespace().count(), 20);
        assert!(!looks_low_confidence(at_ratio_twice));

        // one more question tips it over
        let over = format!("{at_ratio_twice}?");
        assert!(matches!(
            diagnose(&over).as_slice(),
            [QualityIssue::TooManyQuestions { questions: 3, tokens: 20 }]
        ));
    }

    #[test]
    fn test_issue_messages() {
        assert_eq!(
            QualityIssue::TooShort { chars: 3 }.to_string(),
            "Answer too short (< 50 chars)"
        );
        assert_eq!(
            QualityIssue::Hedging { phrase: "unclear" }.to_string(),
            "Contains low-confidence phrase 'unclear'"
        );
    }
}
