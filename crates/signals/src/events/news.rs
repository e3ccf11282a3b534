//! Keyword sentiment for news headlines.

use market_pulse_core::{Event, EventType, NewsArticle, Severity};

const POSITIVE_KEYWORDS: [&str; 14] = [
    "profit",
    "surge",
    "gain",
    "growth",
    "bullish",
    "upgrade",
    "outperform",
    "beat",
    "strong",
    "positive",
    "record",
    "high",
    "rally",
    "acquisition",
];

const NEGATIVE_KEYWORDS: [&str; 14] = [
    "loss",
    "drop",
    "decline",
    "fall",
    "bearish",
    "downgrade",
    "underperform",
    "miss",
    "weak",
    "negative",
    "low",
    "crash",
    "selloff",
    "bankruptcy",
];

/// Confidence of a keyword-scored headline.
pub const NEWS_CONFIDENCE: f64 = 0.6;

/// Net keyword score of a headline: +1 per positive keyword present, -1 per negative one.
///
/// Matching is a case-insensitive substring test, so "highest" counts as "high".
#[must_use]
pub fn headline_score(title: &str) -> i32 {
    let title_lower = title.to_lowercase();
    let count = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|kw| title_lower.contains(*kw))
            .count() as i32
    };
    count(&POSITIVE_KEYWORDS) - count(&NEGATIVE_KEYWORDS)
}

/// Turns an article into a news event, or `None` for a blank headline.
#[must_use]
pub fn categorize_news(article: &NewsArticle) -> Option<Event> {
    if article.headline.trim().is_empty() {
        return None;
    }

    let score = headline_score(&article.headline);
    let event_type = match score {
        s if s > 0 => EventType::NewsPositive,
        s if s < 0 => EventType::NewsNegative,
        _ => EventType::NewsNeutral,
    };
    let severity = if score.abs() >= 2 {
        Severity::High
    } else {
        Severity::Medium
    };

    let event = Event::new(event_type, severity, article.published_at, &article.headline)
        .with_value(f64::from(score))
        .with_price_impact(f64::from(score) * 0.5)
        .with_confidence(NEWS_CONFIDENCE)
        .with_article(
            &article.headline,
            Some(
                article
                    .source
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
            article.url.clone(),
        );
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    const EPS: f64 = 1e-9;

    fn article(headline: &str) -> NewsArticle {
        NewsArticle {
            headline: headline.to_string(),
            summary: String::new(),
            source: None,
            url: Some("https://news.example/a".to_string()),
            published_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_headline_score() {
        assert_eq!(headline_score("Record profit as shares rally"), 3);
        assert_eq!(headline_score("Analysts DOWNGRADE after earnings miss"), -2);
        assert_eq!(headline_score("Company schedules annual meeting"), 0);
        // one positive and one negative cancel out
        assert_eq!(headline_score("Strong quarter despite currency loss"), 0);
    }

    #[test]
    fn test_positive_headline() {
        let event = categorize_news(&article("Upgrade drives shares to record")).unwrap();
        assert_eq!(event.event_type, EventType::NewsPositive);
        assert_eq!(event.severity, Severity::High);
        assert!((event.price_impact - 1.0).abs() < EPS);
        assert!((event.confidence - NEWS_CONFIDENCE).abs() < EPS);
        assert_eq!(event.source.as_deref(), Some("Unknown"));
        assert_eq!(event.url.as_deref(), Some("https://news.example/a"));
    }

    #[test]
    fn test_single_keyword_is_medium() {
        let event = categorize_news(&article("Shares crash on guidance")).unwrap();
        assert_eq!(event.event_type, EventType::NewsNegative);
        assert_eq!(event.severity, Severity::Medium);
        assert!((event.value + 1.0).abs() < EPS);
    }

    #[test]
    fn test_neutral_and_blank() {
        let event = categorize_news(&article("CEO to speak at conference")).unwrap();
        assert_eq!(event.event_type, EventType::NewsNeutral);
        assert_eq!(event.price_impact, 0.0);
        assert!(categorize_news(&article("   ")).is_none());
    }
}
