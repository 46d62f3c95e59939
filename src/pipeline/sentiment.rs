use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::AlphaVantage;
use crate::error::{Error, Result};
use crate::request::Request;

/// The feed has no coverage before this year
pub const FIRST_YEAR: i32 = 2022;

/// A news article with its overall sentiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    /// Publication time
    pub published: NaiveDateTime,
    /// Headline
    pub title: String,
    /// Publisher
    pub source: String,
    /// Overall sentiment score, negative is bearish
    pub overall_sentiment_score: f64,
}

#[derive(Deserialize)]
struct FeedItem {
    time_published: String,
    title: String,
    source: String,
    overall_sentiment_score: f64,
}

/// Parse the `feed` array of a `NEWS_SENTIMENT` document
pub fn parse_feed(doc: &Value) -> Result<Vec<NewsArticle>> {
    let feed = doc.get("feed").ok_or_else(|| Error::missing("feed", doc.to_string()))?;
    let items: Vec<FeedItem> = serde_json::from_value(feed.clone())?;
    items
        .into_iter()
        .map(|item| {
            Ok(NewsArticle {
                published: NaiveDateTime::parse_from_str(&item.time_published, "%Y%m%dT%H%M%S")
                    .map_err(|_| Error::invalid("time_published", &item.time_published))?,
                title: item.title,
                source: item.source,
                overall_sentiment_score: item.overall_sentiment_score,
            })
        })
        .collect()
}

/// Collapse articles sharing publication time, source and title into the one
/// with the most extreme score; result sorted by publication time.
pub fn most_extreme(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut unique: HashMap<(NaiveDateTime, String, String), NewsArticle> = HashMap::new();
    for article in articles {
        let key = (article.published, article.source.clone(), article.title.clone());
        match unique.get(&key) {
            Some(kept) if kept.overall_sentiment_score.abs() >= article.overall_sentiment_score.abs() => {}
            _ => {
                unique.insert(key, article);
            }
        }
    }
    let mut out: Vec<NewsArticle> = unique.into_values().collect();
    out.sort_by(|a, b| {
        (a.published, &a.source, &a.title).cmp(&(b.published, &b.source, &b.title))
    });
    out
}

/// `time_from` / `time_to` pairs splitting a year into halves
fn half_years(year: i32) -> [(String, String); 2] {
    let start = format!("{year}0101T0130");
    let mid = format!("{year}0630T0130");
    let end = format!("{year}1231T0130");
    [(start, mid.clone()), (mid, end)]
}

/// Fetches news sentiment for a ticker
#[derive(Debug, Clone)]
pub struct NewsSentimentFetcher<Client: Request> {
    client: AlphaVantage<Client>,
}

impl<C: Request> NewsSentimentFetcher<C> {
    /// Create a fetcher owning the given client
    pub fn new(client: AlphaVantage<C>) -> Self {
        Self { client }
    }

    /// The client used for requests
    pub fn client(&self) -> &AlphaVantage<C> {
        &self.client
    }

    async fn raw_year(&self, ticker: &str, year: i32) -> Result<Vec<NewsArticle>> {
        let last = Utc::now().year();
        if !(FIRST_YEAR..=last).contains(&year) {
            return Err(Error::InvalidYear {
                year,
                first: FIRST_YEAR,
                last,
            });
        }

        let mut articles = Vec::new();
        for (from, to) in half_years(year) {
            let doc = self
                .client
                .query("NEWS_SENTIMENT")
                .param("tickers", ticker)
                .param("time_from", from)
                .param("time_to", to)
                .param("limit", 1000)
                .param("sort", "RELEVANCE")
                .json()
                .get()
                .await?;
            articles.extend(parse_feed(&doc)?);
        }
        Ok(articles)
    }

    /// Articles published in `year`, two requests (one per half year)
    pub async fn year(&self, ticker: &str, year: i32) -> Result<Vec<NewsArticle>> {
        info!(ticker, year, calls = 2, "fetching news sentiment");
        Ok(most_extreme(self.raw_year(ticker, year).await?))
    }

    /// Articles from every year with feed coverage up to the current one
    pub async fn since_first_year(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let last = Utc::now().year();
        info!(ticker, calls = 2 * (last - FIRST_YEAR + 1), "fetching news sentiment");
        let mut articles = Vec::new();
        for year in FIRST_YEAR..=last {
            articles.extend(self.raw_year(ticker, year).await?);
        }
        Ok(most_extreme(articles))
    }
}
