use thiserror::Error;

/// Errors from the Wikipedia fetch layer.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("Failed to search Wikipedia articles")]
    SearchFailed(#[source] anyhow::Error),

    #[error("Failed to fetch language links for \"{title}\"")]
    LanguageLinksFailed {
        title: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Article \"{title}\" not found in {language} Wikipedia")]
    ArticleNotFound { title: String, language: String },

    #[error("Failed to fetch article content for \"{title}\" in {language}")]
    ContentFetchFailed {
        title: String,
        language: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from the comparison invoker. Each variant carries a message
/// suitable for showing to the user as-is. None of these are retried
/// automatically; the caller decides whether to re-invoke.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("OpenAI API key not configured")]
    Configuration,

    #[error("No article content available for comparison. All requested language versions failed to load.")]
    InsufficientContent,

    #[error("Articles are too large for analysis. Please try with fewer languages or shorter articles.")]
    ArticlesTooLarge,

    #[error("OpenAI rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("Service temporarily overloaded. Please try again in a moment.")]
    ServiceOverloaded,

    #[error("Authentication error with AI service.")]
    Authentication,

    #[error("Failed to generate article comparison")]
    GenerationFailed(#[source] anyhow::Error),
}
