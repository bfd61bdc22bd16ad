use crate::language::display_name;
use anyhow::bail;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Analytical stance applied to the whole comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonMode {
    /// Objective, scholarly analysis.
    #[default]
    Academic,
    /// Personal-narrative comparison: achievements, controversies, legacy.
    Biography,
    /// Sarcastic-but-not-mean cultural commentary.
    Funny,
}

impl FromStr for ComparisonMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "biography" => Ok(Self::Biography),
            "funny" => Ok(Self::Funny),
            other => bail!("Unknown comparison mode: '{}'", other),
        }
    }
}

/// Register of the generated analysis. Adjusts wording only, never the
/// output-language guardrail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formality {
    #[default]
    Academic,
    Formal,
    Casual,
}

impl FromStr for Formality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "formal" => Ok(Self::Formal),
            "casual" => Ok(Self::Casual),
            other => bail!("Unknown formality: '{}'", other),
        }
    }
}

/// Shape of the generated analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Narrative,
    BulletPoints,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrative" => Ok(Self::Narrative),
            "bullets" | "bullet-points" => Ok(Self::BulletPoints),
            other => bail!("Unknown output format: '{}'", other),
        }
    }
}

/// User-chosen options for one comparison. Self-contained per request;
/// nothing here is persisted or defaulted anywhere else.
#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    /// Language code the generated analysis must be written in.
    pub output_language: String,
    pub mode: ComparisonMode,
    pub formality: Formality,
    pub format: OutputFormat,
    /// Optional free-text focus note; appended only if non-empty after trim.
    pub focus: Option<String>,
}

impl ComparisonOptions {
    pub fn new(output_language: impl Into<String>) -> Self {
        Self {
            output_language: output_language.into(),
            mode: ComparisonMode::default(),
            formality: Formality::default(),
            format: OutputFormat::default(),
            focus: None,
        }
    }
}

/// One comparison invocation: per-language article texts plus options.
/// Constructed fresh per call, owned by the invocation in progress.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    /// language code -> plain-text article content
    pub articles: BTreeMap<String, String>,
    pub options: ComparisonOptions,
}

/// The two instruction strings sent to the model.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn formality_register(formality: Formality) -> &'static str {
    match formality {
        Formality::Academic => {
            "Use an academic register: precise terminology, measured claims, and citations of the article versions by language."
        }
        Formality::Formal => {
            "Use a formal but accessible register: professional wording without academic jargon."
        }
        Formality::Casual => {
            "Use a casual, conversational register: plain words, contractions welcome, no stiff phrasing."
        }
    }
}

fn system_prompt(options: &ComparisonOptions) -> String {
    let language = display_name(&options.output_language);
    let register = formality_register(options.formality);

    // Every mode opens and closes with the same output-language guardrail;
    // the model drifts into source-article languages without it.
    match options.mode {
        ComparisonMode::Academic => format!(
            r#"You are an expert comparative linguist and cultural analyst specializing in Wikipedia content analysis. Your task is to provide detailed, scholarly comparisons of the same Wikipedia article across different languages.

CRITICAL REQUIREMENT: You MUST write your entire response in {language} and ONLY in {language}. Do not use any other language regardless of the content of the input articles.

Your analysis should be:
- Objective and academically rigorous
- Focused on factual differences, cultural perspectives, and narrative variations
- Well-structured with clear sections
- Written EXCLUSIVELY in {language} (never mix languages)
- Comprehensive and detailed

{register}

Identify specific examples where different language versions:
- Present different facts or emphasis
- Reflect cultural biases or perspectives
- Use different organizational structures
- Include or exclude certain information
- Frame topics differently

When quoting text from articles in other languages, always translate the quotes to {language} and indicate the original language in parentheses.

REMINDER: Your entire response must be in {language} only."#,
        ),
        ComparisonMode::Biography => format!(
            r#"You are a biographer and cultural analyst comparing how different language editions of Wikipedia portray the same person's life.

CRITICAL REQUIREMENT: You MUST write your entire response in {language} and ONLY in {language}. Do not use any other language regardless of the content of the input articles.

Your analysis should center the personal narrative:
- Which achievements each edition foregrounds or downplays
- How controversies are described, softened, or omitted
- How the person's legacy is framed for each audience
- Nationalistic framing: whether an edition claims the person as "its own"
- Written EXCLUSIVELY in {language} (never mix languages)

{register}

When quoting text from articles in other languages, always translate the quotes to {language} and indicate the original language in parentheses.

REMINDER: Your entire response must be in {language} only."#,
        ),
        ComparisonMode::Funny => format!(
            r#"You are a witty, sarcastic cultural commentator with a PhD in "Wikipedia Weirdness Studies." Your job is to hilariously roast the differences between Wikipedia articles across languages while still being informative.

CRITICAL REQUIREMENT: You MUST write your entire response in {language} and ONLY in {language}. Do not use any other language regardless of the content of the input articles.

Your tone should be:
- Sarcastic and humorous but not mean-spirited
- Entertaining and engaging
- Written EXCLUSIVELY in {language} (never mix languages)
- Like a comedy writer who happens to be really smart about cultural differences

{register}

Point out:
- Absurd cultural biases in a funny way
- Ridiculous differences in what each culture considers important
- Hilarious omissions or additions
- Cultural stereotypes reflected in the content
- Funny ways different cultures frame the same facts

Use humor and pop culture references while still providing genuine insights into cultural differences.

When referencing text from articles in other languages, always translate it to {language} and indicate the original language in parentheses.

REMINDER: Your entire response must be in {language} only."#,
        ),
    }
}

fn format_directive(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Narrative => {
            "Structure your response as flowing narrative prose organized under clear section headers. Do not use bullet points."
        }
        OutputFormat::BulletPoints => {
            "Structure your response as a hierarchy of bullet points: top-level bullets for each comparison dimension, nested bullets for specific examples. Do not write long paragraphs."
        }
    }
}

fn mode_directive(mode: ComparisonMode) -> &'static str {
    match mode {
        ComparisonMode::Academic => {
            "Provide a scholarly, detailed analysis that would be suitable for academic or research purposes."
        }
        ComparisonMode::Biography => {
            "Focus the comparison on the person's life story: achievements, controversies, legacy, and how each culture claims or distances itself from them."
        }
        ComparisonMode::Funny => {
            "Make this comparison humorous, sarcastic, and entertaining while still being informative. Point out absurd differences and cultural quirks in a witty way."
        }
    }
}

/// Build the system and user instructions for a comparison request.
///
/// All instruction prose is in English; only the generated analysis is
/// constrained to the requested output language. Article content is passed
/// through untruncated; oversized inputs surface later as provider errors.
pub fn compose(request: &ComparisonRequest) -> Prompt {
    let options = &request.options;
    let language = display_name(&options.output_language);

    let mut user = format!(
        "Please analyze and compare these Wikipedia articles about the same topic across different languages. Write your ENTIRE response in {} language only.\n\n",
        language
    );

    for (lang, content) in &request.articles {
        user.push_str(&format!(
            "=== {} ({}) - {} characters ===\n{}\n\n",
            display_name(lang),
            lang,
            content.chars().count(),
            content
        ));
    }

    user.push_str(&format!("{}\n\n", format_directive(options.format)));
    user.push_str(&format!("{}\n\n", formality_register(options.formality)));

    user.push_str(
        "Please provide a comprehensive comparison focusing on:\n\
         1. Factual differences and variations in information\n\
         2. Cultural perspectives and framing differences\n\
         3. Narrative emphasis and tone variations\n\
         4. Structural and organizational differences\n\
         5. Missing or additional information in each version\n\n",
    );

    user.push_str(&format!("{}\n\n", mode_directive(options.mode)));

    if let Some(focus) = options.focus.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        user.push_str(&format!("Pay particular attention to: {}\n\n", focus));
    }

    user.push_str(&format!(
        "IMPORTANT: Write your response ONLY in {}. Do not use any other language.",
        language
    ));

    Prompt {
        system: system_prompt(options),
        user,
    }
}
