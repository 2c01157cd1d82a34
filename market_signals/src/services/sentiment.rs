use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::errors::{AnalysisError, Result};
use crate::models::{
    NewsArticle, PricePoint, PriceSeries, SentimentCorrelation, SentimentJoinRow, SentimentSample,
};
use crate::services::regression::{mean, pearson, simple_ols, LinearFit};

/// Strips markup, links and repeated whitespace from feed text.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    html: Regex,
    url: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self> {
        Ok(TextCleaner {
            html: Regex::new(r"<[^>]+>")?,
            url: Regex::new(r"http\S+|www\.\S+")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let cleaned = self.html.replace_all(text, " ");
        let cleaned = self.url.replace_all(&cleaned, " ");
        let cleaned = self.whitespace.replace_all(&cleaned, " ");
        cleaned.trim().to_string()
    }
}

/// Maps a piece of text to a polarity in [-1, 1].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "positive", "bullish",
    "surge", "surges", "rally", "rallies", "gain", "gains", "profit", "profits", "rise", "rises",
    "soar", "soars", "jump", "jumps", "record", "increase", "growth", "boom", "success",
    "breakthrough", "adoption", "approval", "upgrade", "beat", "beats", "strong", "optimism",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "negative", "bearish", "crash", "crashes", "dump",
    "loss", "losses", "fall", "falls", "decline", "declines", "drop", "drops", "plunge", "plunges",
    "slump", "collapse", "ban", "lawsuit", "scam", "hack", "theft", "fraud", "downgrade", "miss",
    "weak", "fear", "selloff", "sell-off", "recession",
];

const NEGATION_WORDS: &[&str] = &["not", "no", "never", "without", "hardly"];

/// Word-list scorer. A negation directly before a hit flips it; the score is
/// `(positive - negative) / (positive + negative)`, 0 when nothing matched.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    cleaner: TextCleaner,
}

impl LexiconScorer {
    pub fn new() -> Result<Self> {
        Ok(LexiconScorer {
            cleaner: TextCleaner::new()?,
        })
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let text_lower = self.cleaner.clean(text).to_lowercase();
        let words: Vec<&str> = text_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut positive = 0.0;
        let mut negative = 0.0;

        for (i, word) in words.iter().enumerate() {
            let is_negated = i > 0 && NEGATION_WORDS.contains(&words[i - 1]);
            let hit = if POSITIVE_WORDS.contains(word) {
                Some(true)
            } else if NEGATIVE_WORDS.contains(word) {
                Some(false)
            } else {
                None
            };
            match hit.map(|is_positive| is_positive != is_negated) {
                Some(true) => positive += 1.0,
                Some(false) => negative += 1.0,
                None => {}
            }
        }

        if positive + negative == 0.0 {
            0.0
        } else {
            (positive - negative) / (positive + negative)
        }
    }
}

/// Search query for a ticker: `BTC-USD` becomes `BTC`, `^GSPC` becomes `GSPC`.
pub fn news_query_for(ticker: &str) -> String {
    let ticker = ticker.trim().trim_start_matches('^');
    let base = ticker.split(['-', '=']).next().unwrap_or(ticker);
    base.to_uppercase()
}

/// Scores title and description together; undated articles are skipped.
pub fn score_articles(articles: &[NewsArticle], scorer: &dyn PolarityScorer) -> Vec<SentimentSample> {
    articles
        .iter()
        .filter_map(|article| {
            let published = article.published?;
            let text = format!("{} {}", article.title, article.description);
            Some(SentimentSample {
                date: published.date_naive(),
                polarity: scorer.polarity(&text).clamp(-1.0, 1.0),
            })
        })
        .collect()
}

pub fn daily_mean(samples: &[SentimentSample]) -> BTreeMap<NaiveDate, f64> {
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        buckets.entry(sample.date).or_default().push(sample.polarity);
    }
    buckets
        .into_iter()
        .filter_map(|(date, values)| mean(&values).map(|m| (date, m)))
        .collect()
}

/// Left join of price rows onto the sentiment of `lag_days` earlier. Days
/// without news get 0.
///
/// The lag counts calendar days, not rows: with a one-day lag a Monday row
/// reads Sunday's news and Friday's news reaches no exchange-traded row.
pub fn lagged_join(
    series: &PriceSeries,
    daily: &BTreeMap<NaiveDate, f64>,
    lag_days: i64,
) -> Vec<SentimentJoinRow> {
    series
        .points()
        .iter()
        .map(|point| {
            let source_day = if lag_days >= 0 {
                point.date.checked_sub_days(Days::new(lag_days as u64))
            } else {
                point.date.checked_add_days(Days::new(lag_days.unsigned_abs()))
            };
            let lagged_sentiment = source_day
                .and_then(|day| daily.get(&day).copied())
                .unwrap_or(0.0);
            SentimentJoinRow {
                date: point.date,
                close: point.close,
                lagged_sentiment,
            }
        })
        .collect()
}

/// Regresses close on lagged daily sentiment over the same window it was
/// measured on. The result is descriptive only.
pub fn correlate(
    query: &str,
    series: &PriceSeries,
    articles: &[NewsArticle],
    scorer: &dyn PolarityScorer,
    lag_days: i64,
) -> Result<SentimentCorrelation> {
    if series.is_empty() {
        return Err(AnalysisError::DataUnavailable(
            "no prices to join sentiment onto".to_string(),
        ));
    }

    let samples = score_articles(articles, scorer);
    if samples.is_empty() {
        return Err(AnalysisError::DataUnavailable(format!(
            "no dated articles for '{}'",
            query
        )));
    }
    let daily = daily_mean(&samples);
    let rows = lagged_join(series, &daily, lag_days);

    let x: Vec<f64> = rows.iter().map(|r| r.lagged_sentiment).collect();
    let y: Vec<f64> = rows.iter().map(|r| r.close).collect();
    let correlation = pearson(&x, &y);

    let fit = match simple_ols(&x, &y) {
        Ok(fit) => fit,
        Err(AnalysisError::ModelFit(reason)) => {
            tracing::debug!("Sentiment regression degenerate ({}), using mean price", reason);
            LinearFit {
                intercept: mean(&y).unwrap_or(0.0),
                slope: 0.0,
            }
        }
        Err(e) => return Err(e),
    };

    let fitted = rows
        .iter()
        .map(|r| PricePoint {
            date: r.date,
            close: fit.predict(r.lagged_sentiment),
        })
        .collect();

    Ok(SentimentCorrelation {
        query: query.to_string(),
        lag_days,
        articles_scored: samples.len(),
        days_with_news: daily.len(),
        correlation,
        slope: fit.slope,
        intercept: fit.intercept,
        rows,
        fitted,
    })
}
