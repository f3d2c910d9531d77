/*!
 * # Aisylum - AI backend selection and fallback
 *
 * A Rust library that serves AI text operations from an on-device model when
 * one is ready, and from a remote AI proxy otherwise.
 *
 * ## Features
 *
 * - Availability probing of each on-device capability:
 *   prompt, summarizer, writer, rewriter, translator, language detector, proofreader
 * - Cached on-device sessions keyed by their configuration
 * - Transparent fallback to the remote proxy, one hop, same result type
 * - Structured (JSON) output extraction from model text
 * - Local models served by Ollama
 * - Language-learning lesson generation
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `capability`: Capability identifiers and availability states
 * - `builtin`: On-device session providers:
 *   - `builtin::availability`: Availability prober
 *   - `builtin::local_model`: Providers backed by a local Ollama model
 *   - `builtin::null`: Provider of capabilities the device lacks
 * - `session`: Session keys, registries and the session manager
 * - `dispatch`: The fallback dispatcher and lesson generation
 * - `providers`: Client implementations for remote and local backends:
 *   - `providers::remote`: Remote AI proxy client
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Scripted remote backend for tests
 * - `structured`: JSON extraction from model output
 * - `lessons`: Lesson catalogue and wire format
 * - `prompts`: Prompt templates
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod builtin;
pub mod capability;
pub mod dispatch;
pub mod errors;
pub mod language_utils;
pub mod lessons;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod structured;

// Re-export main types for easier usage
pub use app_config::Config;
pub use builtin::{AvailabilityProber, DeviceRuntime};
pub use capability::{AvailabilityState, Capability};
pub use dispatch::{ChatContext, FallbackDispatcher, Translation};
pub use errors::{AiError, AppError, LocalError, ProviderError, StructuredOutputError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use session::{SessionKey, SessionManager};
pub use structured::{extract_json_string, parse_structured};
