//! Type-tag routing table.

use std::collections::HashMap;

use super::handler::Handler;

/// Maps message type tags to handlers.
///
/// Registering a tag twice replaces the earlier handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handler` under `kind`, returning whether a handler was
    /// replaced.
    pub fn insert(&mut self, kind: impl Into<String>, handler: Box<dyn Handler>) -> bool {
        self.handlers.insert(kind.into(), handler).is_some()
    }

    /// Looks up the handler for `kind`.
    pub fn get_mut(&mut self, kind: &str) -> Option<&mut (dyn Handler + 'static)> {
        self.handlers.get_mut(kind).map(|handler| &mut **handler)
    }

    /// Whether a handler is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no tags are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered tags in sorted order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::NodeContext;
    use crate::dispatch::errors::HandlerError;
    use crate::protocol::Message;

    fn noop() -> Box<dyn Handler> {
        Box::new(|_: &mut NodeContext, _: &Message| -> Result<(), HandlerError> { Ok(()) })
    }

    #[test]
    fn insert_reports_replacement() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.insert("echo", noop()));
        assert!(registry.insert("echo", noop()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookups_are_exact() {
        let mut registry = HandlerRegistry::new();
        registry.insert("echo", noop());
        assert!(registry.contains("echo"));
        assert!(!registry.contains("Echo"));
        assert!(registry.get_mut("read").is_none());
        assert!(registry.get_mut("echo").is_some());
    }

    #[test]
    fn kinds_are_sorted() {
        let mut registry = HandlerRegistry::new();
        registry.insert("topology", noop());
        registry.insert("echo", noop());
        registry.insert("read", noop());
        assert_eq!(registry.kinds(), vec!["echo", "read", "topology"]);
        assert!(!registry.is_empty());
    }
}
