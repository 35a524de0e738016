//! Todo items and the per-session completion delta.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Todo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_completed: false,
        }
    }
}

/// The todo list as it was when the session started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoSnapshot {
    todos: Vec<Todo>,
}

impl TodoSnapshot {
    pub fn capture(todos: Vec<Todo>) -> Self {
        Self { todos }
    }

    fn was_completed(&self, id: &str) -> bool {
        self.todos
            .iter()
            .find(|t| t.id == id)
            .is_some_and(|t| t.is_completed)
    }

    /// Ids of todos that are completed in `latest` but were absent or still
    /// open in the snapshot.
    pub fn newly_completed(&self, latest: &[Todo]) -> Vec<String> {
        latest
            .iter()
            .filter(|todo| todo.is_completed && !self.was_completed(&todo.id))
            .map(|todo| todo.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: &str) -> Todo {
        Todo {
            is_completed: true,
            ..Todo::new(id, id)
        }
    }

    #[test]
    fn counts_todos_completed_since_snapshot() {
        let snapshot = TodoSnapshot::capture(vec![Todo::new("a", "a"), done("b")]);
        let latest = vec![done("a"), done("b"), Todo::new("c", "c")];
        assert_eq!(snapshot.newly_completed(&latest), vec!["a".to_string()]);
    }

    #[test]
    fn todos_added_and_completed_during_session_count() {
        let snapshot = TodoSnapshot::capture(vec![]);
        assert_eq!(snapshot.newly_completed(&[done("new")]).len(), 1);
    }

    #[test]
    fn todo_json_uses_camel_case() {
        let json = serde_json::to_value(done("x")).unwrap();
        assert_eq!(json["isCompleted"], serde_json::Value::Bool(true));
        let parsed: Todo = serde_json::from_str(r#"{"id":"y","title":"t"}"#).unwrap();
        assert!(!parsed.is_completed);
    }
}
