//! Value comparison with optional locale-bound text collation.

use std::cmp::Ordering;

use crate::locale::{Collator, LexicographicCollator, Locale};
use crate::value::Value;

/// Compares values of one type, delegating TEXT comparison to a [`Collator`]
/// when one is attached.
///
/// The default comparator uses [`Value::compare`] for everything. A
/// locale-bound comparator swaps in a collator for TEXT only; all other
/// types keep their intrinsic order.
pub struct ValueComparator {
    collator: Option<Box<dyn Collator>>,
}

impl ValueComparator {
    /// Comparator using the intrinsic per-type order.
    pub fn new() -> Self {
        Self { collator: None }
    }

    /// Comparator for a locale. The Unicode collation service is pluggable;
    /// the built-in binding is byte-lexicographic for every locale.
    pub fn for_locale(_locale: &Locale) -> Self {
        Self::with_collator(Box::new(LexicographicCollator))
    }

    /// Comparator with an explicit text collator.
    pub fn with_collator(collator: Box<dyn Collator>) -> Self {
        Self {
            collator: Some(collator),
        }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        if let Some(collator) = &self.collator {
            if let (Value::Text(Some(x)), Value::Text(Some(y))) = (a, b) {
                return collator.compare(x, y);
            }
        }
        a.compare(b)
    }
}

impl Default for ValueComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValueComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueComparator")
            .field("collator", &self.collator.is_some())
            .finish()
    }
}
