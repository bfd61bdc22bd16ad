use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_base: String,

    // Wikipedia
    pub wiki_user_agent: String,

    // Generation
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // OpenAI - key is optional here; its absence surfaces as a
            // ConfigurationError when a comparison is actually requested.
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            openai_api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),

            // Wikipedia
            wiki_user_agent: std::env::var("WIKI_USER_AGENT")
                .unwrap_or_else(|_| "WikiCompare/0.1 (+https://github.com/wikicompare)".to_string()),

            // Generation
            max_output_tokens: std::env::var("MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            temperature: std::env::var("TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
        })
    }
}
