//! Rule batches contributed by one CSS load of one component.
//!
//! A [`RuleSet`] is built once per registration and never mutated afterwards.
//! The rule counts it carries are declared by the server alongside each file
//! and are the only unit the allocator uses for capacity accounting.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for one committed (or pending) rule block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl RuleId {
    fn next() -> Self {
        RuleId(NEXT_RULE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The decorated text of one CSS file plus its declared rule count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssRule {
    id: RuleId,
    pub path: String,
    pub rule_count: usize,
    pub content: String,
}

impl CssRule {
    pub fn new(path: impl Into<String>, rule_count: usize, content: impl Into<String>) -> Self {
        Self {
            id: RuleId::next(),
            path: path.into(),
            rule_count,
            content: content.into(),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }
}

/// An immutable, ordered batch of rules accepted or rejected as a whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<CssRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<CssRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Sum of the declared rule counts of every entry.
    pub fn total_rule_count(&self) -> usize {
        self.rules.iter().map(|rule| rule.rule_count).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.path.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(CssRule::id)
    }

    /// Returns a copy without the entries `keep` rejects.
    ///
    /// Rule ids are preserved, so the filtered set still refers to the same
    /// rule blocks.
    pub fn retain<F>(&self, mut keep: F) -> RuleSet
    where
        F: FnMut(&CssRule) -> bool,
    {
        RuleSet {
            rules: self.rules.iter().filter(|rule| keep(rule)).cloned().collect(),
        }
    }
}

impl FromIterator<CssRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = CssRule>>(iter: I) -> Self {
        RuleSet::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_rule_count_sums_entries() {
        let set = RuleSet::new(vec![
            CssRule::new("a.css", 10, ".a{}"),
            CssRule::new("b.css", 5, ".b{}"),
        ]);

        assert_eq!(set.total_rule_count(), 15);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let a = CssRule::new("a.css", 1, "");
        let b = CssRule::new("a.css", 1, "");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_retain_keeps_ids() {
        let set = RuleSet::new(vec![
            CssRule::new("a.css", 1, ""),
            CssRule::new("b.css", 2, ""),
        ]);
        let b_id = set.rules()[1].id();

        let filtered = set.retain(|rule| rule.path != "a.css");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rules()[0].id(), b_id);
        assert_eq!(filtered.total_rule_count(), 2);
    }
}
