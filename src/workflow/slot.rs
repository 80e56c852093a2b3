//! Single-slot holder for the context of one in-flight popup workflow.

/// Context a view keeps while waiting for a popup to complete.
///
/// Not a queue: a second [`set`](PendingSlot::set) before
/// [`take_and_clear`](PendingSlot::take_and_clear) replaces the first context
/// (last writer wins). Owned and mutated by exactly one view on its own tick.
#[derive(Debug)]
pub struct PendingSlot<T> {
    name: &'static str,
    context: Option<T>,
}

impl<T> PendingSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            context: None,
        }
    }

    /// Record the context of a workflow that was just started, handing back
    /// the one it displaced
    pub fn set(&mut self, context: T) -> Option<T> {
        let previous = self.context.replace(context);
        if previous.is_some() {
            tracing::debug!("Pending {} overwritten by a newer request", self.name);
        }
        previous
    }

    /// Put back a context returned by [`set`](PendingSlot::set).
    /// `None` leaves the slot empty.
    pub fn restore(&mut self, previous: Option<T>) {
        self.context = previous;
    }

    /// Consume the context, leaving the slot empty
    pub fn take_and_clear(&mut self) -> Option<T> {
        self.context.take()
    }

    pub fn peek(&self) -> Option<&T> {
        self.context.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.context.is_some()
    }

    /// Drop any outstanding context. Returns whether something was cleared.
    pub fn clear(&mut self) -> bool {
        self.context.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_and_clear_returns_context_once() {
        let mut slot = PendingSlot::new("launch");
        slot.set("v1".to_string());

        assert_eq!(slot.take_and_clear().as_deref(), Some("v1"));
        assert_eq!(slot.take_and_clear(), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let mut slot = PendingSlot::new("open");
        slot.set("A");
        slot.set("B");

        assert_eq!(slot.take_and_clear(), Some("B"));
        assert!(!slot.is_set());
    }

    #[test]
    fn test_restore_puts_back_displaced_context() {
        let mut slot = PendingSlot::new("launch");
        slot.set("A");

        let previous = slot.set("B");
        assert_eq!(slot.peek(), Some(&"B"));
        slot.restore(previous);
        assert_eq!(slot.take_and_clear(), Some("A"));

        let previous = slot.set("C");
        slot.restore(previous);
        assert!(!slot.is_set());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut slot = PendingSlot::new("download");
        assert!(slot.peek().is_none());

        slot.set(42);
        assert_eq!(slot.peek(), Some(&42));
        assert_eq!(slot.peek(), Some(&42));
        assert!(slot.clear());
        assert!(!slot.clear());
    }
}
