//! Locales and text collation.
//!
//! The engine itself is locale-agnostic except in two places: TEXT comparison
//! during sorting (which may delegate to a [`Collator`]) and number
//! formatting symbols. Full Unicode collation is a pluggable service; the
//! implementations here cover the byte-order and case-insensitive cases.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A BCP-47-ish locale tag, e.g. `en-US` or `fr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    tag: String,
}

static DEFAULT_LOCALE: Lazy<Locale> = Lazy::new(|| Locale::new("en-US"));

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into().replace('_', "-");
        Self { tag }
    }

    /// The process-wide default locale. Read-only; callers that need another
    /// locale pass one explicitly.
    pub fn default_locale() -> &'static Locale {
        &DEFAULT_LOCALE
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The language subtag, lowercased.
    pub fn language(&self) -> String {
        self.tag
            .split('-')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    /// Decimal separator used when formatting numbers for this locale.
    pub fn decimal_separator(&self) -> char {
        match self.language().as_str() {
            "de" | "fr" | "es" | "it" | "pt" | "nl" | "da" | "fi" | "sv" | "nb" | "pl" | "ru"
            | "tr" => ',',
            _ => '.',
        }
    }

    /// Grouping separator used when formatting numbers for this locale.
    pub fn grouping_separator(&self) -> char {
        match self.decimal_separator() {
            ',' => '.',
            _ => ',',
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::default_locale().clone()
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Orders two strings. Implementations may be locale-bound.
pub trait Collator {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Byte-lexicographic collation, the engine default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicCollator;

impl Collator for LexicographicCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// ASCII case-insensitive collation; ties break byte-lexicographically so
/// the order stays total.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveCollator;

impl Collator for CaseInsensitiveCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let folded = a
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.chars().map(|c| c.to_ascii_lowercase()));
        folded.then_with(|| a.cmp(b))
    }
}
