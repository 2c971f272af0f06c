//! Breakpoint bookkeeping, including hidden (one-shot) breakpoints.

use std::sync::Mutex;

use rewind_core::Location;

/// A breakpoint known to this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: String,
    pub location: Location,
    /// Hidden breakpoints back one-shot navigation ("run to line") and
    /// are removed on the first pause observed after they are set.
    pub hidden: bool,
}

impl Breakpoint {
    pub fn new(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            location,
            hidden: false,
        }
    }

    pub fn hidden(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            location,
            hidden: true,
        }
    }
}

/// Session-local breakpoint store.
///
/// At most one hidden breakpoint exists at a time: setting a new one
/// replaces the old, mirroring how one-shot stepping works.
#[derive(Debug, Default)]
pub struct BreakpointStore {
    breakpoints: Mutex<Vec<Breakpoint>>,
}

impl BreakpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, breakpoint: Breakpoint) {
        let mut breakpoints = self.lock();
        if breakpoint.hidden {
            breakpoints.retain(|bp| !bp.hidden);
        }
        breakpoints.retain(|bp| bp.id != breakpoint.id);
        breakpoints.push(breakpoint);
    }

    /// Remove a breakpoint by id; returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut breakpoints = self.lock();
        let before = breakpoints.len();
        breakpoints.retain(|bp| bp.id != id);
        breakpoints.len() != before
    }

    /// The current hidden breakpoint, if any.
    pub fn hidden_breakpoint(&self) -> Option<Breakpoint> {
        self.lock().iter().find(|bp| bp.hidden).cloned()
    }

    pub fn all(&self) -> Vec<Breakpoint> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Breakpoint>> {
        self.breakpoints.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32) -> Location {
        Location::new("1", line, 0)
    }

    #[test]
    fn test_insert_and_remove() {
        let store = BreakpointStore::new();
        store.insert(Breakpoint::new("b1", loc(10)));
        store.insert(Breakpoint::new("b2", loc(20)));
        assert_eq!(store.len(), 2);

        assert!(store.remove("b1"));
        assert!(!store.remove("b1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces_by_id() {
        let store = BreakpointStore::new();
        store.insert(Breakpoint::new("b1", loc(10)));
        store.insert(Breakpoint::new("b1", loc(30)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].location.line, 30);
    }

    #[test]
    fn test_only_one_hidden_breakpoint() {
        let store = BreakpointStore::new();
        store.insert(Breakpoint::hidden("h1", loc(5)));
        store.insert(Breakpoint::hidden("h2", loc(6)));

        let hidden = store.hidden_breakpoint().unwrap();
        assert_eq!(hidden.id, "h2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_hidden_does_not_displace_persistent() {
        let store = BreakpointStore::new();
        store.insert(Breakpoint::new("b1", loc(10)));
        store.insert(Breakpoint::hidden("h1", loc(5)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.hidden_breakpoint().unwrap().id, "h1");
    }
}
