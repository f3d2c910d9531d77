/*!
 * Prompt construction for model-backed capabilities.
 *
 * This module provides:
 * - System instructions standing in for each on-device capability API
 * - Lesson generation prompts for both tiers
 */

pub mod templates;

pub use templates::{
    PromptTemplate, rewriter_instruction, summarizer_instruction, summarizer_label,
    translator_instruction, writer_instruction,
};
