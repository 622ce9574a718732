// Newsletter composition prompt templates.

pub const NEWSLETTER_SYSTEM: &str = "\
You are a newsletter creator assistant. Write an engaging newsletter for a content creator's audience.
The newsletter should have:
- A short personal intro
- 3-5 content summaries drawn from the provided items
- A \"Trends to Watch\" section covering the provided trends
Match the creator's tone and structure as described. Write in plain text, not markdown.";

pub const NEWSLETTER_PROMPT: &str = "\
Write today's newsletter, dated {date}.

Writing style to imitate:
Tone: {tone}
Structure: {structure}
Example writing from the creator:
{samples}

Trends to watch:
{trends}

Recent content to summarize:
{content}";
