use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Validation and normalization of ISO 639-1 (2-letter) and ISO 639-2
/// (3-letter) codes, the languages the lesson catalogue supports, and
/// conversion of language names (as a model reports them) back to codes.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// A language offered to learners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedLanguage {
    pub code: &'static str,
    pub name: &'static str,
}

/// Languages offered to learners, in display order
pub const SUPPORTED_LANGUAGES: &[SupportedLanguage] = &[
    SupportedLanguage { code: "en", name: "English" },
    SupportedLanguage { code: "es", name: "Spanish" },
    SupportedLanguage { code: "fr", name: "French" },
    SupportedLanguage { code: "de", name: "German" },
    SupportedLanguage { code: "zh", name: "Chinese (Simplified)" },
    SupportedLanguage { code: "ja", name: "Japanese" },
    SupportedLanguage { code: "ko", name: "Korean" },
    SupportedLanguage { code: "pt", name: "Portuguese (Brazil)" },
    SupportedLanguage { code: "ru", name: "Russian" },
    SupportedLanguage { code: "ar", name: "Arabic" },
];

/// ISO 639-2/B codes that differ from their 639-2/T form, with the T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn terminology_code(bibliographic: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == bibliographic)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 && Language::from_639_1(&normalized_code).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if terminology_code(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = terminology_code(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(normalized1), Ok(normalized2)) => normalized1 == normalized2,
        _ => false,
    }
}

/// Get the language name from a code
///
/// Languages offered to learners use their display name.
pub fn get_language_name(code: &str) -> Result<String> {
    if let Some(supported) = supported_language(code) {
        return Ok(supported.name.to_string());
    }

    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// The supported language with this code, if any
pub fn supported_language(code: &str) -> Option<&'static SupportedLanguage> {
    let code = code.trim().to_lowercase();
    SUPPORTED_LANGUAGES.iter().find(|language| language.code == code)
}

/// ISO code of a language given by name, e.g. `"Spanish"` -> `"es"`
///
/// Accepts display names of supported languages, English names, native names
/// and codes. Returns `None` when the name is not recognized.
pub fn language_code_from_name(name: &str) -> Option<String> {
    let trimmed = name.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(supported) = SUPPORTED_LANGUAGES
        .iter()
        .find(|language| language.name.eq_ignore_ascii_case(trimmed))
    {
        return Some(supported.code.to_string());
    }

    if validate_language_code(trimmed).is_ok() {
        return normalize_to_part1_or_part2t(trimmed).ok();
    }

    // "Portuguese (Brazil)" -> "Portuguese"
    let base = trimmed.split('(').next().unwrap_or(trimmed).trim();
    let language = Language::from_name(&title_case(base)).or_else(|| Language::from_autonym(base))?;

    Some(
        language
            .to_639_1()
            .map(str::to_string)
            .unwrap_or_else(|| language.to_639_3().to_string()),
    )
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
