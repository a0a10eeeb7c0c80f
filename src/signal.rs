//! Signal values and the per-wire signal set.
//!
//! A [`SignalSet`] maps signal names to saturated 32-bit values. Zero entries
//! never survive: merging two sets that cancel a signal removes the key.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Largest representable signal value.
pub const SIGNAL_MAX: i32 = 2_147_483_647;

/// Smallest representable signal value. `i32::MIN` is excluded so that every
/// value can be negated.
pub const SIGNAL_MIN: i32 = -2_147_483_647;

/// Saturate a wide intermediate result into the signal range.
pub fn clamp(value: i64) -> i32 {
    value.clamp(SIGNAL_MIN as i64, SIGNAL_MAX as i64) as i32
}

/// Signal name to value mapping for one wire during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignalSet(BTreeMap<String, i32>);

impl SignalSet {
    /// Create an empty signal set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Value of a signal, 0 when absent.
    pub fn get(&self, name: &str) -> i32 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Set a signal, saturating the value. Setting 0 removes the signal.
    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        let name = name.into();
        match clamp(value) {
            0 => {
                self.0.remove(&name);
            }
            v => {
                self.0.insert(name, v);
            }
        }
    }

    /// Add every signal of `other` into this set with saturating addition.
    pub fn merge(&mut self, other: &SignalSet) {
        for (name, &value) in &other.0 {
            let sum = self.get(name) as i64 + value as i64;
            self.set(name.as_str(), sum);
        }
    }

    /// A copy of this set with every value negated.
    pub fn negated(&self) -> SignalSet {
        Self(self.0.iter().map(|(k, &v)| (k.clone(), -v)).collect())
    }

    /// Iterate signals in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of present signals.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no signal is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for SignalSet {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut set = SignalSet::new();
        for (name, value) in iter {
            let name = name.into();
            let sum = set.get(&name) as i64 + value;
            set.set(name, sum);
        }
        set
    }
}

impl fmt::Display for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Wire name to signal set mapping for one tick.
pub type State = BTreeMap<String, SignalSet>;

/// Format a value the way a display combinator shows it: floored to the
/// largest of K, M or G.
pub fn humanize(value: i32) -> String {
    let negative = value < 0;
    let mut v = (value as i64).abs();
    let mut suffix = 0;
    while v >= 1000 && suffix < 3 {
        v /= 1000;
        suffix += 1;
    }
    format!(
        "{}{}{}",
        if negative { "-" } else { "" },
        v,
        ["", "K", "M", "G"][suffix]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(pairs: &[(&str, i64)]) -> SignalSet {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_zero_entries_are_dropped() {
        let mut s = set(&[("a", 3), ("b", 0)]);
        assert_eq!(s.len(), 1);
        s.merge(&set(&[("a", -3)]));
        assert!(s.is_empty());
    }

    #[test]
    fn test_merge_saturates() {
        let mut s = set(&[("x", 2_000_000_000)]);
        s.merge(&set(&[("x", 2_000_000_000)]));
        assert_eq!(s.get("x"), SIGNAL_MAX);
        let mut n = set(&[("x", -2_000_000_000)]);
        n.merge(&set(&[("x", -2_000_000_000)]));
        assert_eq!(n.get("x"), SIGNAL_MIN);
    }

    #[test]
    fn test_set_clamps_literals() {
        let s = set(&[("signal", 9_999_999_999_999), ("neg", -9_999_999_999_999)]);
        assert_eq!(s.get("signal"), 2_147_483_647);
        assert_eq!(s.get("neg"), -2_147_483_647);
    }

    #[test]
    fn test_display() {
        assert_eq!(set(&[("b", 2), ("a", 1)]).to_string(), "{a: 1, b: 2}");
        assert_eq!(SignalSet::new().to_string(), "{}");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(0), "0");
        assert_eq!(humanize(999), "999");
        assert_eq!(humanize(1234), "1K");
        assert_eq!(humanize(-2_500_000), "-2M");
        assert_eq!(humanize(SIGNAL_MAX), "2G");
    }

    fn arb_set() -> impl Strategy<Value = SignalSet> {
        prop::collection::vec(("[a-e]", SIGNAL_MIN as i64..=SIGNAL_MAX as i64), 0..8)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    proptest! {
        #[test]
        fn merge_empty_is_identity(s in arb_set()) {
            let mut merged = s.clone();
            merged.merge(&SignalSet::new());
            prop_assert_eq!(merged, s);
        }

        #[test]
        fn merge_with_negation_is_empty(s in arb_set()) {
            let mut merged = s.clone();
            merged.merge(&s.negated());
            prop_assert!(merged.is_empty());
        }

        #[test]
        fn merged_values_stay_in_range(a in arb_set(), b in arb_set()) {
            let mut merged = a.clone();
            merged.merge(&b);
            for (_, v) in merged.iter() {
                prop_assert!(v != 0);
                prop_assert!((SIGNAL_MIN..=SIGNAL_MAX).contains(&v));
            }
        }
    }
}
