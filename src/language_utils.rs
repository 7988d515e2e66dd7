/*!
 * ISO language code helpers for the translation target.
 *
 * Accepts ISO 639-1 (2-letter), ISO 639-2/T and ISO 639-2/B (3-letter) codes.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Bibliographic codes that differ from their terminology counterpart
const PART2B_TO_PART2T: [(&str, &str); 18] = [
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

fn resolve(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == normalized)
                .map_or(normalized.as_str(), |&(_, t)| t);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate that a code names a known language
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// English name of the language, without qualifiers such as "(macrolanguage)"
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = resolve(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    let name = lang.to_name();
    let name = name.split(" (").next().unwrap_or(name);
    Ok(name.trim().to_string())
}
