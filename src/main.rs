use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use tracing::{info, warn};

use wikicompare::config::Config;
use wikicompare::openai::OpenAiService;
use wikicompare::prompt::{ComparisonOptions, ComparisonRequest};
use wikicompare::wikipedia::WikipediaService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wikicompare=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!(
            "Usage: wikicompare <query> <languages> [output-language]\n\
             Example: wikicompare \"Napoleon\" en,fr,de en\n\
             Options via env: BASE_LANGUAGE, COMPARISON_MODE (academic|biography|funny),\n\
             FORMALITY (academic|formal|casual), OUTPUT_FORMAT (narrative|bullets), FOCUS"
        );
    }

    let query = &args[0];
    let languages: Vec<String> = args[1]
        .split(',')
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect();
    let base_language = std::env::var("BASE_LANGUAGE").unwrap_or_else(|_| "en".to_string());
    let output_language = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| base_language.clone());

    let mut options = ComparisonOptions::new(output_language);
    if let Ok(mode) = std::env::var("COMPARISON_MODE") {
        options.mode = mode.parse()?;
    }
    if let Ok(formality) = std::env::var("FORMALITY") {
        options.formality = formality.parse()?;
    }
    if let Ok(format) = std::env::var("OUTPUT_FORMAT") {
        options.format = format.parse()?;
    }
    options.focus = std::env::var("FOCUS").ok();

    let config = Config::from_env()?;
    let wikipedia = WikipediaService::new(&config)?;
    let openai = OpenAiService::new(reqwest::Client::new(), config.clone());

    // Step 1: Search for the article
    info!("Searching {} Wikipedia for \"{}\"", base_language, query);
    let results = wikipedia.search(query, &base_language, 5).await?;
    let top = match results.first() {
        Some(result) => result,
        None => bail!("No articles found for \"{}\"", query),
    };
    info!("Top match: \"{}\" (page {})", top.title, top.page_id);

    // Step 2: Fetch the requested language versions
    info!("Fetching {} language versions", languages.len());
    let outcome = wikipedia
        .get_multiple_article_contents(&top.title, &languages, &base_language)
        .await?;

    for failure in &outcome.failed {
        warn!(
            "Language {} dropped from comparison: {}",
            failure.language, failure.reason
        );
    }

    // Step 3: Generate the comparison
    let articles: BTreeMap<String, String> = outcome
        .succeeded
        .into_iter()
        .map(|article| (article.language, article.content))
        .collect();
    let request = ComparisonRequest { articles, options };

    info!("Generating comparison");
    let comparison = openai
        .compare_articles(&request)
        .await
        .context("Comparison failed")?;

    println!("{}", comparison);
    Ok(())
}
