//! Integer range validators
//!
//! Numbers arrive from configuration as signed 64-bit integers, so every
//! range is expressed over `i64` and callers narrow the type only after the
//! check passed.

/// Inclusive integer range with optional endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRange {
    lower: Option<i64>,
    upper: Option<i64>,
}

impl IntegerRange {
    pub const fn new(lower: Option<i64>, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }

    pub const fn lower(&self) -> Option<i64> {
        self.lower
    }

    pub const fn upper(&self) -> Option<i64> {
        self.upper
    }

    /// Whether `value` lies inside the range
    pub fn contains(&self, value: i64) -> bool {
        self.lower.map_or(true, |lower| value >= lower)
            && self.upper.map_or(true, |upper| value <= upper)
    }

    /// Predicate form, handy with [`super::or_default`]
    pub fn check(self) -> impl Fn(&i64) -> bool {
        move |value| self.contains(*value)
    }
}

/// Strictly positive integers
pub const POSITIVE_INTEGER: IntegerRange = IntegerRange::new(Some(1), None);

/// Zero or positive integers
pub const NON_NEGATIVE_INTEGER: IntegerRange = IntegerRange::new(Some(0), None);

/// 1..=65535, e.g. TCP ports
pub const POSITIVE_WORD: IntegerRange = IntegerRange::new(Some(1), Some(0xFFFF));

/// 1..=4294967295
pub const POSITIVE_DOUBLE_WORD: IntegerRange = IntegerRange::new(Some(1), Some(0xFFFF_FFFF));

/// 0..=4294967295
pub const NON_NEGATIVE_DOUBLE_WORD: IntegerRange =
    IntegerRange::new(Some(0), Some(0xFFFF_FFFF));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_ranges() {
        assert!(POSITIVE_WORD.contains(1));
        assert!(POSITIVE_WORD.contains(65535));
        assert!(!POSITIVE_WORD.contains(0));
        assert!(!POSITIVE_WORD.contains(65536));
    }

    #[test]
    fn test_double_word_ranges() {
        assert!(NON_NEGATIVE_DOUBLE_WORD.contains(0));
        assert!(NON_NEGATIVE_DOUBLE_WORD.contains(u32::MAX as i64));
        assert!(!NON_NEGATIVE_DOUBLE_WORD.contains(u32::MAX as i64 + 1));
        assert!(!NON_NEGATIVE_DOUBLE_WORD.contains(-1));
        assert!(!POSITIVE_DOUBLE_WORD.contains(0));
    }

    #[test]
    fn test_open_ranges() {
        assert!(POSITIVE_INTEGER.contains(i64::MAX));
        assert!(!POSITIVE_INTEGER.contains(0));
        assert!(NON_NEGATIVE_INTEGER.contains(0));
        assert!(!NON_NEGATIVE_INTEGER.contains(i64::MIN));
    }
}
