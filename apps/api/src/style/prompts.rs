// Writing-style extraction prompt templates.

pub const STYLE_EXTRACTION_SYSTEM: &str = "\
You are a writing style analyst. Given samples of someone's writing, describe their style.
Respond with exactly two lines:
Tone: <one or two words describing the tone>
Structure: <one or two words describing the structure>";

pub const STYLE_EXTRACTION_PROMPT: &str = "\
Analyze the tone and structure of these writing samples:

{samples}";
