//! Fetching, decorating and packing component CSS.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use stylepack::{CssRule, RuleSet, StylesheetAllocator};

use crate::component::{Component, ComponentDescriptor, CssDependency};
use crate::transport::Transport;

/// Wrap fetched CSS in comments naming its owner, and in an `@media` block
/// when the dependency declares one.
pub fn decorate(full_id: &str, dep: &CssDependency, text: &str) -> String {
    let body = match &dep.media {
        Some(media) => format!("@media {media} {{\n{text}\n}}"),
        None => text.to_string(),
    };
    format!("/* {full_id} {} */\n{body}\n/* end {} */\n", dep.path, dep.path)
}

/// Loads CSS for component versions into a shared allocator.
///
/// CSS is keyed by module version, not by instance: every instance of
/// `header@2.0` shares one set of rules. The renderer counts live instances
/// per version and only releases the rules when the last one unloads.
pub struct CssRenderer {
    allocator: Arc<Mutex<StylesheetAllocator>>,
    transport: Arc<dyn Transport>,
    live: Mutex<HashMap<String, usize>>,
}

impl CssRenderer {
    pub fn new(allocator: Arc<Mutex<StylesheetAllocator>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            allocator,
            transport,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn allocator(&self) -> &Arc<Mutex<StylesheetAllocator>> {
        &self.allocator
    }

    fn lock_allocator(&self) -> MutexGuard<'_, StylesheetAllocator> {
        self.allocator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live instances holding the CSS of `full_id`.
    pub fn live_instances(&self, full_id: &str) -> usize {
        self.live().get(full_id).copied().unwrap_or(0)
    }

    /// Make sure every CSS dependency of `descriptor` is in a stylesheet.
    ///
    /// Returns `false` only when the allocator refused the rules. Missing
    /// files are dropped with a warning and still count as success.
    pub async fn load(&self, descriptor: &ComponentDescriptor) -> bool {
        let full_id = descriptor.full_id();
        *self.live().entry(full_id.clone()).or_insert(0) += 1;

        let new_files = self.lock_allocator().new_files(&full_id, &descriptor.css_deps);
        if new_files.is_empty() {
            // Keep callers on the async path even when there is nothing to do.
            tokio::task::yield_now().await;
            return true;
        }

        let full_id = full_id.as_str();
        let fetches = new_files.iter().map(|dep| async move {
            match self.transport.fetch_css_text(&dep.path).await {
                Some(text) if !text.is_empty() => {
                    Some(CssRule::new(&dep.path, dep.rule_count, decorate(full_id, dep, &text)))
                }
                _ => {
                    log::warn!("{full_id}: css {} not found, skipping", dep.path);
                    None
                }
            }
        });
        let rule_set: RuleSet = join_all(fetches).await.into_iter().flatten().collect();
        if rule_set.is_empty() {
            return true;
        }

        let mut allocator = self.lock_allocator();
        let placed = allocator.register(full_id, &rule_set);
        allocator.save();
        if !placed {
            log::warn!("{full_id}: rendering without {} css file(s)", rule_set.len());
        }
        placed
    }

    /// Release one instance's hold on its version's CSS.
    ///
    /// Returns `true` if this was the last instance and the rules were
    /// removed.
    pub fn unload(&self, component: &Component) -> bool {
        let full_id = component.full_id();
        {
            let mut live = self.live();
            if let Some(count) = live.get_mut(&full_id) {
                *count = count.saturating_sub(1);
            }
        }
        self.reclaim_if_unused(&full_id)
    }

    /// Drop the rules of `full_id` if no live instance holds them.
    pub fn reclaim_if_unused(&self, full_id: &str) -> bool {
        {
            let mut live = self.live();
            match live.get(full_id) {
                Some(&count) if count > 0 => return false,
                Some(_) => {
                    live.remove(full_id);
                }
                None => {}
            }
        }
        let mut allocator = self.lock_allocator();
        let removed = allocator.unregister(full_id);
        allocator.save();
        if removed {
            log::debug!("{full_id}: css released");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorate_plain() {
        let dep = CssDependency::new("a.css", 1);
        assert_eq!(
            decorate("x@1.0", &dep, ".a { color: red }"),
            "/* x@1.0 a.css */\n.a { color: red }\n/* end a.css */\n"
        );
    }

    #[test]
    fn test_decorate_with_media() {
        let dep = CssDependency::new("print.css", 1).with_media("print");
        let text = decorate("x@1.0", &dep, ".a {}");
        assert!(text.starts_with("/* x@1.0 print.css */\n@media print {\n.a {}\n}\n"));
        assert!(text.ends_with("/* end print.css */\n"));
    }
}
