//! A single bounded rule container.
//!
//! Mutation is two-phase. [`Stylesheet::add`] and [`Stylesheet::remove`] only
//! queue work; [`Stylesheet::write`] applies the queued transaction to the
//! container text in one pass, so many registrations can share a single
//! flush.

use std::mem;

use crate::rule_set::{RuleId, RuleSet};

/// Historical ceiling on the number of rules one style container may hold.
pub const SHEET_CAPACITY: usize = 4095;

/// Bookkeeping for a rule block that has been written into the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleRecord {
    pub id: RuleId,
    pub path: String,
    pub rule_count: usize,
    /// Byte offset of the block inside the container text.
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Default)]
struct Transaction {
    append: Vec<RuleSet>,
    remove: Vec<RuleId>,
}

impl Transaction {
    fn is_empty(&self) -> bool {
        self.append.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug)]
pub struct Stylesheet {
    id: String,
    capacity: usize,
    /// Rules reserved by `add`, including ones still waiting for `write`.
    rule_count: usize,
    text: String,
    next_index: usize,
    records: Vec<RuleRecord>,
    pending: Transaction,
}

impl Stylesheet {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_capacity(id, SHEET_CAPACITY)
    }

    pub fn with_capacity(id: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            capacity,
            rule_count: 0,
            text: String::new(),
            next_index: 0,
            records: Vec::new(),
            pending: Transaction::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn free_space(&self) -> usize {
        self.capacity - self.rule_count
    }

    /// The committed container text, as the host page sees it.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn records(&self) -> &[RuleRecord] {
        &self.records
    }

    /// Start offset of a committed rule block.
    pub fn start_of(&self, id: RuleId) -> Option<usize> {
        self.records.iter().find(|r| r.id == id).map(|r| r.start)
    }

    /// Whether a transaction is queued and waiting for `write`.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Reserve capacity for `rule_set` and queue it for the next write.
    ///
    /// Returns `false` without touching anything when the whole set does not
    /// fit. A rule set is never partially accepted.
    pub fn add(&mut self, rule_set: &RuleSet) -> bool {
        let needed = rule_set.total_rule_count();
        if self.rule_count + needed > self.capacity {
            return false;
        }
        self.rule_count += needed;
        self.pending.append.push(rule_set.clone());
        true
    }

    /// Queue rule blocks for removal. Capacity is released at `write` time.
    pub fn remove<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RuleId>,
    {
        self.pending.remove.extend(ids);
    }

    /// Flush the pending transaction into the container text.
    ///
    /// Removals run before appends so every recorded offset stays valid for
    /// the duration of the flush.
    pub fn write(&mut self) {
        let Transaction { mut append, remove } = mem::take(&mut self.pending);

        for id in remove {
            if let Some(pos) = self.records.iter().position(|r| r.id == id) {
                let record = self.records.remove(pos);
                self.text
                    .replace_range(record.start..record.start + record.len, "");
                for later in &mut self.records[pos..] {
                    later.start -= record.len;
                }
                self.next_index -= record.len;
                self.rule_count -= record.rule_count;
            } else if let Some(released) = cancel_pending(&mut append, id) {
                self.rule_count -= released;
            } else {
                log::warn!("{}: no rule block {} to remove", self.id, id.raw());
            }
        }

        for set in append {
            for rule in set.rules() {
                let len = rule.content.len();
                self.text.push_str(&rule.content);
                self.records.push(RuleRecord {
                    id: rule.id(),
                    path: rule.path.clone(),
                    rule_count: rule.rule_count,
                    start: self.next_index,
                    len,
                });
                self.next_index += len;
            }
        }
    }
}

/// Drop a rule that was added and removed within the same transaction.
fn cancel_pending(append: &mut [RuleSet], id: RuleId) -> Option<usize> {
    for set in append.iter_mut() {
        if let Some(rule) = set.rules().iter().find(|rule| rule.id() == id) {
            let released = rule.rule_count;
            *set = set.retain(|rule| rule.id() != id);
            return Some(released);
        }
    }
    None
}
