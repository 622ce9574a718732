// Trend analysis LLM prompt templates.

pub const TREND_ANALYSIS_SYSTEM: &str = "\
You are a trend analysis AI. Analyze the provided content and identify the top 3-5 trending topics.
For each trend, provide:
- A clear, engaging title
- A 2-3 sentence summary
- 3-5 relevant keywords

Focus on topics that are gaining momentum, have high engagement, or represent emerging themes.";

pub const TREND_ANALYSIS_PROMPT: &str = r#"Analyze this content for trends:

{content}

Please identify the top trends and format them as JSON:
[
  {
    "title": "Trend Title",
    "summary": "Brief description of the trend",
    "keywords": ["keyword1", "keyword2", "keyword3"]
  }
]"#;
