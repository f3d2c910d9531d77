/*!
 * Language-learning lesson catalogue and the lesson wire format.
 */

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language_utils::get_language_name;
use crate::prompts::PromptTemplate;

/// A module of the language course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonModule {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
}

pub const LESSON_MODULES: &[LessonModule] = &[
    LessonModule { id: 1, title: "Introduction to Basics", description: "Learn common greetings, numbers, and basic phrases." },
    LessonModule { id: 2, title: "Pronouns and Simple Sentences", description: "Understand pronouns and how to form simple sentences." },
    LessonModule { id: 3, title: "Common Verbs", description: "Learn frequently used verbs and their conjugations." },
    LessonModule { id: 4, title: "Adjectives and Descriptions", description: "Describe people, places, and things using adjectives." },
    LessonModule { id: 5, title: "Questions and Answers", description: "Form questions and learn how to answer them." },
    LessonModule { id: 6, title: "Time and Dates", description: "Talk about time, days, months, and years." },
    LessonModule { id: 7, title: "Directions and Locations", description: "Learn how to ask for and give directions." },
    LessonModule { id: 8, title: "Food and Dining", description: "Explore vocabulary related to food, restaurants, and dining." },
    LessonModule { id: 9, title: "Shopping and Money", description: "Learn phrases for shopping and handling money." },
    LessonModule { id: 10, title: "Travel and Transportation", description: "Talk about travel plans and transportation methods." },
    LessonModule { id: 11, title: "Health and Emergencies", description: "Learn essential phrases for health and emergency situations." },
    LessonModule { id: 12, title: "Work and Professions", description: "Discuss jobs, professions, and workplace vocabulary." },
    LessonModule { id: 13, title: "Hobbies and Interests", description: "Talk about hobbies, interests, and leisure activities." },
    LessonModule { id: 14, title: "Family and Relationships", description: "Learn vocabulary related to family and relationships." },
    LessonModule { id: 15, title: "Weather and Seasons", description: "Discuss weather conditions and seasonal changes." },
    LessonModule { id: 16, title: "Cultural Expressions", description: "Understand idiomatic expressions and cultural phrases." },
    LessonModule { id: 17, title: "Intermediate Grammar", description: "Dive into intermediate-level grammar concepts." },
    LessonModule { id: 18, title: "Storytelling and Narratives", description: "Learn how to tell stories and describe events." },
    LessonModule { id: 19, title: "Advanced Vocabulary", description: "Expand your vocabulary with advanced words and phrases." },
    LessonModule { id: 20, title: "Conversational Practice", description: "Practice real-life conversations and improve fluency." },
];

/// The module with this id, if it exists
pub fn lesson_module(id: u32) -> Option<&'static LessonModule> {
    LESSON_MODULES.iter().find(|module| module.id == id)
}

impl fmt::Display for LessonModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lesson {} is about {}", self.id, self.title)
    }
}

/// How the learner answers a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Speech,
    Written,
}

/// One generated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonItem {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub answer: String,
}

/// JSON schema of a lesson list, used as the on-device response constraint
pub static LESSON_SCHEMA: Lazy<serde_json::Value> = Lazy::new(|| {
    serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "question": { "type": "string" },
                "type": { "type": "string", "enum": ["speech", "written"] },
                "answer": { "type": "string" }
            },
            "required": ["question", "type", "answer"]
        }
    })
});

fn display_language(language_code: &str) -> String {
    get_language_name(language_code).unwrap_or_else(|_| language_code.to_string())
}

/// System prompt of the on-device tutor session for a language
pub fn tutor_system_prompt(language_code: &str) -> String {
    let modules = LESSON_MODULES
        .iter()
        .map(|module| module.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    PromptTemplate::new(PromptTemplate::LESSON_TUTOR)
        .set("language", &display_language(language_code))
        .set("modules", &modules)
        .render()
}

/// Prompt sent to the on-device tutor for one module
pub fn tutor_prompt(module: &LessonModule) -> String {
    format!("Create lessons for module {}", module.id)
}

/// System prompt of the remote lesson request for one module
pub fn remote_system_prompt(language_code: &str, module: &LessonModule) -> String {
    PromptTemplate::new(PromptTemplate::REMOTE_LESSON_CREATOR)
        .set("module", &module.id.to_string())
        .set("language", &display_language(language_code))
        .set("title", module.title)
        .set("description", module.description)
        .render()
}

/// Prompt of the remote lesson request for one module
pub fn remote_prompt(module: &LessonModule) -> String {
    format!("Generate lessons for module {}", module.id)
}
