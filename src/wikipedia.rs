use crate::config::Config;
use crate::error::WikiError;
use crate::snippet;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Characters kept verbatim when building article URLs, matching what
/// browsers do for path segments.
const TITLE_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const SEARCH_TIMEOUT: Duration = Duration::from_secs(4);
const FALLBACK_SEARCH_TIMEOUT: Duration = Duration::from_secs(3);
const LANGLINKS_TIMEOUT: Duration = Duration::from_secs(4);
const CONTENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Synthetic page ids for fallback search results, which the opensearch
/// endpoint does not report.
const FALLBACK_PAGEID_BASE: u64 = 1_000_000;

/// One search hit, with internal scoring fields already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub page_id: u64,
}

/// Maps a base-language article to its counterpart in another edition.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageLink {
    pub lang: String,
    pub title: String,
    pub url: String,
}

/// One language edition's plain-text version of an article.
#[derive(Debug, Clone)]
pub struct Article {
    pub page_id: u64,
    pub title: String,
    pub content: String,
    pub language: String,
    pub content_length: usize,
}

/// Outcome of a multi-language fetch: which editions loaded and which were
/// dropped, so callers can tell the user what is missing from the comparison.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub succeeded: Vec<Article>,
    pub failed: Vec<FetchFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub language: String,
    pub reason: String,
}

// ==================== Wire types ====================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
    pageid: u64,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    wordcount: u64,
    timestamp: Option<String>,
}

/// Opensearch replies with a positional JSON array:
/// [query, titles, descriptions, urls]
#[derive(Debug, Deserialize)]
struct OpenSearchResponse(String, Vec<String>, Vec<String>, Vec<String>);

#[derive(Debug, Deserialize)]
struct PagesResponse {
    query: PagesQuery,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    pages: HashMap<String, RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    pageid: Option<u64>,
    title: Option<String>,
    /// Present (as an empty string) when the page does not exist.
    missing: Option<String>,
    #[serde(default)]
    langlinks: Vec<RawLangLink>,
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLangLink {
    lang: String,
    #[serde(rename = "*")]
    title: String,
}

// ==================== Service ====================

/// Client for the Wikipedia APIs. Explicitly constructed and passed around
/// rather than living in a module-level singleton, so tests can point it at
/// a mock server.
#[derive(Debug, Clone)]
pub struct WikipediaService {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl WikipediaService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.wiki_user_agent.clone())
            .build()
            .context("Failed to build Wikipedia HTTP client")?;
        Ok(Self {
            client,
            endpoint_override: None,
        })
    }

    /// Route every API call to `base` instead of the per-language Wikipedia
    /// hosts. Used by tests with a mock server.
    pub fn with_endpoint(mut self, base: impl Into<String>) -> Self {
        self.endpoint_override = Some(base.into());
        self
    }

    fn api_url(&self, language: &str) -> String {
        match &self.endpoint_override {
            Some(base) => format!("{}/w/api.php", base),
            None => format!("https://{}.wikipedia.org/w/api.php", language),
        }
    }

    /// Search for articles, best matches first. Namespace junk, stubs, and
    /// disambiguation pages are filtered out; if the primary search endpoint
    /// fails, one simpler opensearch fallback is tried before giving up.
    pub async fn search(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, WikiError> {
        match self.search_primary(query, language, limit).await {
            Ok(results) => Ok(results),
            Err(err) => {
                warn!("Wikipedia search failed, trying opensearch fallback: {:#}", err);
                self.search_fallback(query, language, limit)
                    .await
                    .map_err(|fallback_err| {
                        warn!("Wikipedia fallback search failed: {:#}", fallback_err);
                        WikiError::SearchFailed(fallback_err)
                    })
            }
        }
    }

    async fn search_primary(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        // Over-fetch so post-filtering still leaves enough candidates.
        let fetch_count = (limit * 2).min(20);
        let params: Vec<(&str, String)> = vec![
            ("action", "query".into()),
            ("list", "search".into()),
            ("srsearch", query.into()),
            ("srlimit", fetch_count.to_string()),
            ("srnamespace", "0".into()),
            ("format", "json".into()),
            ("srinfo", "snippet|totalhits|suggestion".into()),
            ("srprop", "snippet|size|wordcount|timestamp".into()),
            ("srsort", "relevance".into()),
            ("srqiprofile", "engine_autoselect".into()),
        ];

        let response = self
            .client
            .get(self.api_url(language))
            .query(&params)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .context("Failed to send search request")?
            .error_for_status()
            .context("Search request rejected")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        let hits = body.query.map(|q| q.search).unwrap_or_default();
        debug!("Primary search returned {} raw hits", hits.len());

        let mut scored: Vec<(i64, SearchResult)> = hits
            .into_iter()
            .filter(|hit| {
                hit.title.chars().count() >= 2
                    && hit.size >= 1000
                    && hit.wordcount >= 100
                    && !is_filtered_title(&hit.title)
            })
            .map(|hit| {
                let score =
                    relevance_score(query, &hit.title, hit.wordcount, hit.timestamp.as_deref());
                (
                    score,
                    SearchResult {
                        title: hit.title,
                        snippet: snippet::clean(&hit.snippet),
                        page_id: hit.pageid,
                    },
                )
            })
            .collect();

        // Stable sort keeps the API's relevance order for equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, result)| result).collect())
    }

    async fn search_fallback(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let fetch_count = (limit * 2).min(15);
        let params: Vec<(&str, String)> = vec![
            ("action", "opensearch".into()),
            ("search", query.into()),
            ("limit", fetch_count.to_string()),
            ("namespace", "0".into()),
            ("format", "json".into()),
            ("redirects", "resolve".into()),
        ];

        let response = self
            .client
            .get(self.api_url(language))
            .query(&params)
            .timeout(FALLBACK_SEARCH_TIMEOUT)
            .send()
            .await
            .context("Failed to send opensearch request")?
            .error_for_status()
            .context("Opensearch request rejected")?;

        let OpenSearchResponse(_, titles, descriptions, _urls) = response
            .json()
            .await
            .context("Failed to parse opensearch response")?;

        let results = titles
            .into_iter()
            .enumerate()
            .map(|(index, title)| SearchResult {
                title,
                snippet: snippet::clean(descriptions.get(index).map(String::as_str).unwrap_or("")),
                page_id: FALLBACK_PAGEID_BASE + index as u64,
            })
            .filter(|result| result.title.chars().count() > 2 && !is_filtered_title(&result.title))
            .take(limit)
            .collect();

        Ok(results)
    }

    /// Interlanguage links for an article in the given edition. An article
    /// with no links yields an empty Vec, not an error.
    pub async fn get_language_links(
        &self,
        title: &str,
        language: &str,
    ) -> Result<Vec<LanguageLink>, WikiError> {
        let params: Vec<(&str, String)> = vec![
            ("action", "query".into()),
            ("titles", title.into()),
            ("prop", "langlinks".into()),
            ("lllimit", "500".into()),
            ("format", "json".into()),
        ];

        let result: Result<Vec<LanguageLink>> = async {
            let response = self
                .client
                .get(self.api_url(language))
                .query(&params)
                .timeout(LANGLINKS_TIMEOUT)
                .send()
                .await
                .context("Failed to send langlinks request")?
                .error_for_status()
                .context("Langlinks request rejected")?;

            let body: PagesResponse = response
                .json()
                .await
                .context("Failed to parse langlinks response")?;

            let page = body
                .query
                .pages
                .into_values()
                .next()
                .context("Langlinks response contained no pages")?;

            Ok(page
                .langlinks
                .into_iter()
                .map(|link| {
                    let url = format!(
                        "https://{}.wikipedia.org/wiki/{}",
                        link.lang,
                        utf8_percent_encode(&link.title, TITLE_ENCODE)
                    );
                    LanguageLink {
                        lang: link.lang,
                        title: link.title,
                        url,
                    }
                })
                .collect())
        }
        .await;

        result.map_err(|source| WikiError::LanguageLinksFailed {
            title: title.to_string(),
            source,
        })
    }

    /// Full plain-text extract of one article (all sections, not just the
    /// introduction).
    pub async fn get_article_content(
        &self,
        title: &str,
        language: &str,
    ) -> Result<Article, WikiError> {
        let params: Vec<(&str, String)> = vec![
            ("action", "query".into()),
            ("titles", title.into()),
            ("prop", "extracts".into()),
            ("explaintext", "1".into()),
            ("exsectionformat", "plain".into()),
            ("format", "json".into()),
        ];

        let wrap = |source: anyhow::Error| WikiError::ContentFetchFailed {
            title: title.to_string(),
            language: language.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.api_url(language))
            .query(&params)
            .timeout(CONTENT_TIMEOUT)
            .send()
            .await
            .context("Failed to send content request")
            .map_err(wrap)?
            .error_for_status()
            .context("Content request rejected")
            .map_err(|e| wrap(anyhow!(e)))?;

        let body: PagesResponse = response
            .json()
            .await
            .context("Failed to parse content response")
            .map_err(wrap)?;

        let page = body
            .query
            .pages
            .into_values()
            .next()
            .ok_or_else(|| wrap(anyhow!("Content response contained no pages")))?;

        if page.missing.is_some() {
            return Err(WikiError::ArticleNotFound {
                title: title.to_string(),
                language: language.to_string(),
            });
        }

        let content = page.extract.unwrap_or_default();
        let content_length = content.chars().count();
        Ok(Article {
            page_id: page.pageid.unwrap_or_default(),
            title: page.title.unwrap_or_else(|| title.to_string()),
            content,
            language: language.to_string(),
            content_length,
        })
    }

    /// Fetch one article per requested language, resolving per-language
    /// titles through the base article's language links first.
    ///
    /// All fetches run concurrently and settle independently: a single
    /// language failing never aborts the batch. Failures are logged and
    /// reported in `FetchOutcome::failed` so the caller can warn the user
    /// which languages were dropped.
    pub async fn get_multiple_article_contents(
        &self,
        title: &str,
        languages: &[String],
        base_language: &str,
    ) -> Result<FetchOutcome, WikiError> {
        if languages.is_empty() {
            return Ok(FetchOutcome::default());
        }

        let links = self.get_language_links(title, base_language).await?;

        // The base article is always fetchable under its own title.
        let mut title_map: HashMap<&str, &str> = HashMap::new();
        title_map.insert(base_language, title);
        for link in &links {
            title_map.insert(&link.lang, &link.title);
        }

        let fetches = languages.iter().map(|lang| {
            let article_title = title_map.get(lang.as_str()).copied();
            async move {
                match article_title {
                    None => Err((
                        lang.clone(),
                        format!("No {} version of this article is linked", lang),
                    )),
                    Some(article_title) => self
                        .get_article_content(article_title, lang)
                        .await
                        .map_err(|err| (lang.clone(), err.to_string())),
                }
            }
        });

        let mut outcome = FetchOutcome::default();
        for settled in join_all(fetches).await {
            match settled {
                Ok(article) => {
                    debug!(
                        "Fetched {} article \"{}\" ({} chars)",
                        article.language, article.title, article.content_length
                    );
                    outcome.succeeded.push(article);
                }
                Err((language, reason)) => {
                    warn!("Dropping language {} from comparison: {}", language, reason);
                    outcome.failed.push(FetchFailure { language, reason });
                }
            }
        }

        info!(
            "Fetched {}/{} language versions of \"{}\"",
            outcome.succeeded.len(),
            languages.len(),
            title
        );
        Ok(outcome)
    }
}

/// Namespace and maintenance pages that never belong in search results.
fn is_filtered_title(title: &str) -> bool {
    let title = title.to_lowercase();
    [
        "disambiguation",
        "category:",
        "template:",
        "user:",
        "talk:",
        "file:",
        "wikipedia:",
    ]
    .iter()
    .any(|prefix| title.contains(prefix))
}

/// Relevance score for ordering search hits: exact title match beats prefix
/// match beats substring match, with small boosts for comprehensive and
/// recently-edited articles.
fn relevance_score(query: &str, title: &str, wordcount: u64, timestamp: Option<&str>) -> i64 {
    let title = title.to_lowercase();
    let query = query.to_lowercase();

    let mut score: i64 = 0;
    if title == query {
        score += 100;
    } else if title.starts_with(&query) {
        score += 80;
    } else if title.contains(&query) {
        score += 60;
    }

    if wordcount > 1000 {
        score += 20;
    }
    if wordcount > 5000 {
        score += 10;
    }

    if let Some(ts) = timestamp {
        if let Ok(edited) = DateTime::parse_from_rfc3339(ts) {
            let months_old = (Utc::now() - edited.with_timezone(&Utc)).num_days() / 30;
            if months_old < 12 {
                score += 5;
            }
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Title Filter Tests ====================

    #[test]
    fn test_filtered_namespaces_rejected() {
        assert!(is_filtered_title("Category:Physics"));
        assert!(is_filtered_title("Template:Infobox"));
        assert!(is_filtered_title("User:SomeEditor"));
        assert!(is_filtered_title("Talk:Rust"));
        assert!(is_filtered_title("File:Photo.jpg"));
        assert!(is_filtered_title("Wikipedia:Manual of Style"));
        assert!(is_filtered_title("Mercury (disambiguation)"));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        assert!(is_filtered_title("CATEGORY:Physics"));
        assert!(is_filtered_title("Mercury (Disambiguation)"));
    }

    #[test]
    fn test_regular_titles_pass_filter() {
        assert!(!is_filtered_title("Rust (programming language)"));
        assert!(!is_filtered_title("Napoleon"));
        // "Talk:" requires the colon; "Talkeetna" must pass.
        assert!(!is_filtered_title("Talkeetna, Alaska"));
    }

    // ==================== Scoring Tests ====================

    #[test]
    fn test_exact_beats_prefix_beats_substring() {
        let exact = relevance_score("napoleon", "Napoleon", 500, None);
        let prefix = relevance_score("napoleon", "Napoleon III", 500, None);
        let substring = relevance_score("napoleon", "Age of Napoleon", 500, None);
        let unrelated = relevance_score("napoleon", "Waterloo", 500, None);

        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > unrelated);
    }

    #[test]
    fn test_wordcount_boosts() {
        let short = relevance_score("x", "X Article", 500, None);
        let long = relevance_score("x", "X Article", 2000, None);
        let very_long = relevance_score("x", "X Article", 6000, None);

        assert_eq!(long - short, 20);
        assert_eq!(very_long - short, 30);
    }

    #[test]
    fn test_recent_edit_boost() {
        let recent = Utc::now().to_rfc3339();
        let boosted = relevance_score("q", "Q", 500, Some(&recent));
        let unboosted = relevance_score("q", "Q", 500, Some("2005-01-01T00:00:00Z"));
        assert_eq!(boosted - unboosted, 5);
    }

    #[test]
    fn test_invalid_timestamp_ignored() {
        let score = relevance_score("q", "Q", 500, Some("not-a-date"));
        assert_eq!(score, relevance_score("q", "Q", 500, None));
    }

    #[test]
    fn test_scoring_case_insensitive() {
        assert_eq!(
            relevance_score("NAPOLEON", "napoleon", 500, None),
            relevance_score("napoleon", "NAPOLEON", 500, None)
        );
    }

    // ==================== Wire Type Tests ====================

    #[test]
    fn test_search_response_deserialization() {
        let json = r#"{
            "query": {
                "search": [
                    {
                        "title": "Rust (programming language)",
                        "snippet": "<span class=\"searchmatch\">Rust</span> is a language",
                        "pageid": 29414838,
                        "size": 150000,
                        "wordcount": 12000,
                        "timestamp": "2024-06-01T12:00:00Z"
                    }
                ]
            }
        }"#;

        let response: SearchResponse = serde_json::from_str(json).expect("Should deserialize");
        let hits = response.query.unwrap().search;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pageid, 29414838);
        assert_eq!(hits[0].wordcount, 12000);
    }

    #[test]
    fn test_search_hit_missing_optional_fields() {
        let json = r#"{"title": "Rust", "pageid": 1}"#;
        let hit: RawSearchHit = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(hit.size, 0);
        assert_eq!(hit.wordcount, 0);
        assert!(hit.snippet.is_empty());
        assert!(hit.timestamp.is_none());
    }

    #[test]
    fn test_opensearch_response_deserialization() {
        let json = r#"["rust", ["Rust", "Rust Belt"], ["A metal oxide", "A region"], ["https://en.wikipedia.org/wiki/Rust", "https://en.wikipedia.org/wiki/Rust_Belt"]]"#;
        let OpenSearchResponse(query, titles, descriptions, urls) =
            serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(query, "rust");
        assert_eq!(titles.len(), 2);
        assert_eq!(descriptions[0], "A metal oxide");
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_langlinks_page_deserialization() {
        let json = r#"{
            "query": {
                "pages": {
                    "123": {
                        "pageid": 123,
                        "title": "Napoleon",
                        "langlinks": [
                            {"lang": "fr", "*": "Napoléon Ier"},
                            {"lang": "de", "*": "Napoleon Bonaparte"}
                        ]
                    }
                }
            }
        }"#;

        let response: PagesResponse = serde_json::from_str(json).expect("Should deserialize");
        let page = response.query.pages.into_values().next().unwrap();
        assert_eq!(page.langlinks.len(), 2);
        assert_eq!(page.langlinks[0].lang, "fr");
        assert_eq!(page.langlinks[0].title, "Napoléon Ier");
    }

    #[test]
    fn test_missing_page_deserialization() {
        let json = r#"{
            "query": {
                "pages": {
                    "-1": {"title": "Nonexistent", "missing": ""}
                }
            }
        }"#;

        let response: PagesResponse = serde_json::from_str(json).expect("Should deserialize");
        let page = response.query.pages.into_values().next().unwrap();
        assert!(page.missing.is_some());
        assert!(page.pageid.is_none());
    }

    #[test]
    fn test_page_without_langlinks_field() {
        let json = r#"{"query": {"pages": {"5": {"pageid": 5, "title": "Lonely"}}}}"#;
        let response: PagesResponse = serde_json::from_str(json).expect("Should deserialize");
        let page = response.query.pages.into_values().next().unwrap();
        assert!(page.langlinks.is_empty());
    }

    // ==================== URL Construction Tests ====================

    #[test]
    fn test_language_link_url_encoding() {
        let encoded = utf8_percent_encode("Napoléon Ier", TITLE_ENCODE).to_string();
        assert_eq!(encoded, "Napol%C3%A9on%20Ier");
    }

    #[test]
    fn test_api_url_per_language() {
        let config = Config {
            openai_api_key: None,
            openai_model: "gpt-4o".into(),
            openai_api_base: "https://api.openai.com".into(),
            wiki_user_agent: "WikiCompare/0.1".into(),
            max_output_tokens: 4096,
            temperature: 0.7,
        };
        let service = WikipediaService::new(&config).expect("Should build");
        assert_eq!(service.api_url("de"), "https://de.wikipedia.org/w/api.php");
        assert_eq!(service.api_url("en"), "https://en.wikipedia.org/w/api.php");

        let service = service.with_endpoint("http://localhost:1234");
        assert_eq!(service.api_url("de"), "http://localhost:1234/w/api.php");
    }
}
