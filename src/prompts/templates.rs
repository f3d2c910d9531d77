/*!
 * Instruction templates for the local-model runtime.
 *
 * A plain chat model has no summarizer or translator API, so each capability
 * becomes a system instruction built from the session options. The wording
 * matches what the remote proxy sends its model.
 */

use crate::builtin::{
    RewriterFormat, RewriterLength, RewriterOptions, RewriterTone, SummarizerOptions, SummaryType,
    TextFormat, TextLength, WriterOptions, WriterTone,
};
use crate::builtin::options::enum_label;

/// A template with `{placeholder}` variables
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Default system prompt of conversational sessions
    pub const ASSISTANT: &'static str = "You are Aisylum, a helpful assistant.";

    pub const TRANSLATOR: &'static str =
        "Translate from {source_language} to {target_language}. Respond only with the translation.";

    pub const LANGUAGE_DETECTOR: &'static str = "Detect the language of the text. Reply with only the ISO 639-1 code of the language, followed by a space and your confidence between 0 and 1.";

    pub const PROOFREADER: &'static str =
        "Proofread grammar, spelling, and punctuation errors. Return only the corrected text.";

    pub const LESSON_TUTOR: &'static str = r#"You are an expert {language} instructor, generate 20 questions for each module. Mix speech questions (the learner answers aloud) and written questions. The modules are:
{modules}
Answer only with a JSON array of objects with the fields "question", "type" ("speech" or "written") and "answer"."#;

    pub const REMOTE_LESSON_CREATOR: &'static str = r#"You are an AI lesson creator. Generate a JSON array of lessons for module {module} in {language}. The module is about {title}: {description}
Each lesson is an object with the fields "question", "type" ("speech" or "written") and "answer".
Return *only* valid JSON, with no commentary."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Replace one placeholder
    pub fn set(mut self, name: &str, value: &str) -> Self {
        self.template = self.template.replace(&format!("{{{}}}", name), value);
        self
    }

    pub fn render(self) -> String {
        self.template
    }
}

/// Instruction of a summarizer session
pub fn summarizer_instruction(options: &SummarizerOptions) -> String {
    let mut instruction = match options.summary_type {
        SummaryType::Tldr => "Provide a TL;DR summary.",
        SummaryType::KeyPoints => "Extract the key points from the text.",
        SummaryType::Teaser => "Create an engaging teaser.",
        SummaryType::Headline => "Generate a headline.",
    }
    .to_string();

    match options.length {
        TextLength::Short => instruction.push_str(" Keep it very brief."),
        TextLength::Medium => {}
        TextLength::Long => instruction.push_str(" Provide a comprehensive summary."),
    }
    if options.format == TextFormat::Markdown {
        instruction.push_str(" Format using markdown.");
    }
    instruction
}

/// Instruction of a writer session
pub fn writer_instruction(options: &WriterOptions) -> String {
    let tone = match options.tone {
        WriterTone::Formal => "formal",
        WriterTone::Neutral => "neutral",
        WriterTone::Casual => "casual",
    };
    let mut instruction = format!("Write with a {} tone.", tone);

    match options.length {
        TextLength::Short => instruction.push_str(" Keep it concise."),
        TextLength::Medium => {}
        TextLength::Long => instruction.push_str(" Write in detail."),
    }
    if options.format == TextFormat::Markdown {
        instruction.push_str(" Format in markdown.");
    }
    if let Some(context) = &options.shared_context {
        instruction.push_str(&format!(" Context: {}", context));
    }
    instruction
}

/// Instruction of a rewriter session
pub fn rewriter_instruction(options: &RewriterOptions) -> String {
    let mut instruction = String::from("Rewrite the text");

    match options.tone {
        RewriterTone::AsIs => {}
        RewriterTone::MoreFormal => instruction.push_str(" in a more formal tone"),
        RewriterTone::MoreCasual => instruction.push_str(" in a more casual tone"),
    }
    match options.length {
        RewriterLength::AsIs => {}
        RewriterLength::Shorter => instruction.push_str(", making it shorter"),
        RewriterLength::Longer => instruction.push_str(", making it longer"),
    }
    if let Some(language) = &options.language {
        instruction.push_str(&format!(", in {}", language));
    }
    instruction.push('.');

    match options.format {
        RewriterFormat::AsIs => {}
        RewriterFormat::PlainText => instruction.push_str(" Use plain text."),
        RewriterFormat::Markdown => instruction.push_str(" Format using markdown."),
    }
    if let Some(context) = &options.shared_context {
        instruction.push_str(&format!(" Context: {}", context));
    }
    instruction.push_str(" Return only the rewritten text.");
    instruction
}

/// Instruction of a translator session
pub fn translator_instruction(source_language: &str, target_language: &str) -> String {
    PromptTemplate::new(PromptTemplate::TRANSLATOR)
        .set("source_language", source_language)
        .set("target_language", target_language)
        .render()
}

/// Short label of the options, for log lines
pub fn summarizer_label(options: &SummarizerOptions) -> String {
    format!("{} ({})", enum_label(&options.summary_type), enum_label(&options.length))
}
