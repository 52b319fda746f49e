//! First-fit packing of component rule sets into a bounded list of sheets.
//!
//! The allocator keeps a single "current" sheet pointer. New rule sets always
//! go to the current sheet first; when it refuses, the pointer moves forward
//! and the next sheet is created on demand. Sheets are never compacted, so
//! rules vacated by an unregistered component leave holes that are only
//! reused by later `add` calls landing on the same sheet.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::AllocError;
use crate::rule_set::{RuleId, RuleSet};
use crate::stylesheet::{SHEET_CAPACITY, Stylesheet};

/// Historical ceiling on the number of style containers one page may hold.
pub const MAX_SHEETS: usize = 31;

/// Default prefix for generated sheet ids (`pagelet-sheet-0`, ...).
pub const DEFAULT_SHEET_PREFIX: &str = "pagelet-sheet";

/// Sizing knobs for an allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorLimits {
    pub sheet_capacity: usize,
    pub max_sheets: usize,
    pub id_prefix: String,
}

impl Default for AllocatorLimits {
    fn default() -> Self {
        Self {
            sheet_capacity: SHEET_CAPACITY,
            max_sheets: MAX_SHEETS,
            id_prefix: DEFAULT_SHEET_PREFIX.to_string(),
        }
    }
}

/// Aggregate occupancy across every sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    pub sheets: usize,
    pub rules: usize,
    pub free_space: usize,
}

/// What the allocator remembers about one component version.
#[derive(Debug, Default)]
struct ComponentCss {
    files: HashMap<String, bool>,
    rules: Vec<(usize, RuleId)>,
}

impl ComponentCss {
    fn is_known(&self, path: &str) -> bool {
        self.files.get(path).copied().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct StylesheetAllocator {
    limits: AllocatorLimits,
    sheets: Vec<Stylesheet>,
    current_sheet_index: usize,
    components: HashMap<String, ComponentCss>,
    unsaved: BTreeSet<usize>,
}

impl StylesheetAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: AllocatorLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &AllocatorLimits {
        &self.limits
    }

    pub fn current_sheet_index(&self) -> usize {
        self.current_sheet_index
    }

    pub fn sheets(&self) -> &[Stylesheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Stylesheet> {
        self.sheets.get(index)
    }

    /// Register a component's rule set, logging instead of failing.
    ///
    /// Returns `false` when the rules could not be placed; the component then
    /// renders without them.
    pub fn register(&mut self, component_id: &str, rule_set: &RuleSet) -> bool {
        match self.try_register(component_id, rule_set) {
            Ok(()) => true,
            Err(err) => {
                log::error!("stylesheet allocation failed: {err}");
                false
            }
        }
    }

    /// Register a component's rule set, reporting why it was refused.
    pub fn try_register(&mut self, component_id: &str, rule_set: &RuleSet) -> Result<(), AllocError> {
        let known = self.components.get(component_id);
        let mut seen = HashSet::new();
        let fresh = rule_set.retain(|rule| {
            !known.is_some_and(|known| known.is_known(&rule.path)) && seen.insert(rule.path.clone())
        });
        if fresh.is_empty() {
            return Ok(());
        }

        let needed = fresh.total_rule_count();
        if needed > self.limits.sheet_capacity {
            return Err(AllocError::TooLarge {
                component: component_id.to_string(),
                rules: needed,
                capacity: self.limits.sheet_capacity,
            });
        }

        if self.limits.max_sheets == 0 {
            return Err(AllocError::Exhausted {
                component: component_id.to_string(),
                rules: needed,
                max_sheets: 0,
            });
        }

        loop {
            let index = self.current_sheet_index;
            if self.sheet_at(index).add(&fresh) {
                break;
            }
            if index + 1 >= self.limits.max_sheets {
                return Err(AllocError::Exhausted {
                    component: component_id.to_string(),
                    rules: needed,
                    max_sheets: self.limits.max_sheets,
                });
            }
            self.current_sheet_index = index + 1;
            log::debug!("sheet {index} full, moving to sheet {}", index + 1);
        }

        let index = self.current_sheet_index;
        let entry = self.components.entry(component_id.to_string()).or_default();
        for rule in fresh.rules() {
            entry.files.insert(rule.path.clone(), true);
            entry.rules.push((index, rule.id()));
        }
        self.unsaved.insert(index);
        log::debug!(
            "{component_id}: {needed} rules in {} file(s) placed on sheet {index}",
            fresh.len()
        );
        Ok(())
    }

    /// Queue removal of every rule the component registered.
    ///
    /// Returns `false` if nothing was known for the component.
    pub fn unregister(&mut self, component_id: &str) -> bool {
        let Some(css) = self.components.remove(component_id) else {
            return false;
        };
        for (index, id) in css.rules {
            if let Some(sheet) = self.sheets.get_mut(index) {
                sheet.remove([id]);
                self.unsaved.insert(index);
            }
        }
        true
    }

    /// Filter `candidates` down to the files not yet loaded for the component.
    ///
    /// A path listed more than once is kept only at its first position.
    pub fn new_files<T>(&self, component_id: &str, candidates: &[T]) -> Vec<T>
    where
        T: AsRef<str> + Clone,
    {
        let known = self.components.get(component_id);
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter(|c| {
                let path = c.as_ref();
                !known.is_some_and(|known| known.is_known(path)) && seen.insert(path.to_string())
            })
            .cloned()
            .collect()
    }

    pub fn is_known(&self, component_id: &str, path: &str) -> bool {
        self.components
            .get(component_id)
            .is_some_and(|css| css.is_known(path))
    }

    /// Write every sheet touched since the last save.
    ///
    /// Returns the number of sheets written.
    pub fn save(&mut self) -> usize {
        let unsaved = std::mem::take(&mut self.unsaved);
        for &index in &unsaved {
            if let Some(sheet) = self.sheets.get_mut(index) {
                sheet.write();
            }
        }
        unsaved.len()
    }

    /// The host-visible style blocks, in page order.
    pub fn style_blocks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sheets.iter().map(|sheet| (sheet.id(), sheet.text()))
    }

    pub fn stats(&self) -> AllocatorStats {
        self.sheets.iter().fold(AllocatorStats::default(), |acc, sheet| AllocatorStats {
            sheets: acc.sheets + 1,
            rules: acc.rules + sheet.rule_count(),
            free_space: acc.free_space + sheet.free_space(),
        })
    }

    fn sheet_at(&mut self, index: usize) -> &mut Stylesheet {
        while self.sheets.len() <= index {
            let id = format!("{}-{}", self.limits.id_prefix, self.sheets.len());
            log::debug!("opening stylesheet {id}");
            self.sheets
                .push(Stylesheet::with_capacity(id, self.limits.sheet_capacity));
        }
        &mut self.sheets[index]
    }
}
