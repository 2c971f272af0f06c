//! Pinned watch expressions and their evaluation state.

use std::sync::Mutex;

use serde_json::Value;

/// Evaluation state of one watch expression.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchState {
    /// Not evaluated yet in the current pause.
    Loading,
    /// Evaluated successfully.
    Value(Value),
    /// Evaluation failed; the error is shown inline in place of a value.
    Error(String),
}

/// One pinned watch expression.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchExpression {
    pub text: String,
    pub state: WatchState,
}

/// Outcome of evaluating one expression during hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchResult {
    pub expression: String,
    pub state: WatchState,
}

/// Store of pinned watch expressions.
#[derive(Debug, Default)]
pub struct WatchStore {
    expressions: Mutex<Vec<WatchExpression>>,
}

impl WatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a new expression; duplicates are ignored.
    pub fn add(&self, text: impl Into<String>) {
        let text = text.into();
        let mut expressions = self.lock();
        if expressions.iter().any(|e| e.text == text) {
            return;
        }
        expressions.push(WatchExpression {
            text,
            state: WatchState::Loading,
        });
    }

    /// Unpin an expression by text; returns whether it existed.
    pub fn remove(&self, text: &str) -> bool {
        let mut expressions = self.lock();
        let before = expressions.len();
        expressions.retain(|e| e.text != text);
        expressions.len() != before
    }

    /// Mark every expression as loading so stale values are not shown
    /// while re-evaluation is pending. Returns `true` if any expression
    /// is pinned.
    pub fn mark_all_loading(&self) -> bool {
        let mut expressions = self.lock();
        for expression in expressions.iter_mut() {
            expression.state = WatchState::Loading;
        }
        !expressions.is_empty()
    }

    /// Texts of all pinned expressions, in pin order.
    pub fn texts(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.text.clone()).collect()
    }

    /// Store evaluation results. Unknown expressions (unpinned while the
    /// evaluation was in flight) are dropped.
    pub fn apply(&self, results: &[WatchResult]) {
        let mut expressions = self.lock();
        for result in results {
            if let Some(expression) = expressions.iter_mut().find(|e| e.text == result.expression)
            {
                expression.state = result.state.clone();
            }
        }
    }

    pub fn all(&self) -> Vec<WatchExpression> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WatchExpression>> {
        self.expressions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_dedupes() {
        let store = WatchStore::new();
        store.add("a + b");
        store.add("a + b");
        assert_eq!(store.texts(), vec!["a + b"]);
    }

    #[test]
    fn test_mark_all_loading() {
        let store = WatchStore::new();
        assert!(!store.mark_all_loading());

        store.add("x");
        store.apply(&[WatchResult {
            expression: "x".into(),
            state: WatchState::Value(json!(1)),
        }]);
        assert!(store.mark_all_loading());
        assert_eq!(store.all()[0].state, WatchState::Loading);
    }

    #[test]
    fn test_apply_isolated_errors() {
        let store = WatchStore::new();
        store.add("good");
        store.add("bad");

        store.apply(&[
            WatchResult {
                expression: "good".into(),
                state: WatchState::Value(json!(42)),
            },
            WatchResult {
                expression: "bad".into(),
                state: WatchState::Error("ReferenceError".into()),
            },
        ]);

        let all = store.all();
        assert_eq!(all[0].state, WatchState::Value(json!(42)));
        assert_eq!(all[1].state, WatchState::Error("ReferenceError".into()));
    }

    #[test]
    fn test_apply_drops_unpinned() {
        let store = WatchStore::new();
        store.add("x");
        store.apply(&[WatchResult {
            expression: "gone".into(),
            state: WatchState::Value(json!(0)),
        }]);
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].state, WatchState::Loading);
    }

    #[test]
    fn test_remove() {
        let store = WatchStore::new();
        store.add("x");
        assert!(store.remove("x"));
        assert!(!store.remove("x"));
        assert!(store.is_empty());
    }
}
