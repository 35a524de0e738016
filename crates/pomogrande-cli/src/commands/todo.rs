use clap::Subcommand;
use pomogrande_core::storage::{read_field, Database, StorageKey, Store};
use pomogrande_core::Todo;
use uuid::Uuid;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TodoAction {
    /// Add a todo
    Add {
        /// Todo title
        title: String,
    },
    /// Mark a todo as completed
    Done {
        /// Todo ID
        id: String,
    },
    /// Mark a todo as not completed
    Undo {
        /// Todo ID
        id: String,
    },
    /// List todos as JSON
    List,
    /// Delete a todo
    Remove {
        /// Todo ID
        id: String,
    },
}

fn load(db: &Database) -> Result<Vec<Todo>, Box<dyn std::error::Error>> {
    Ok(read_field(db, StorageKey::Todos)?.unwrap_or_default())
}

fn save(db: &Database, todos: &[Todo]) -> CliResult {
    db.set(StorageKey::Todos, serde_json::to_value(todos)?)?;
    Ok(())
}

fn set_completed(db: &Database, id: &str, completed: bool) -> CliResult {
    let mut todos = load(db)?;
    let todo = todos
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("todo not found: {id}"))?;
    todo.is_completed = completed;
    let updated = todo.clone();
    save(db, &todos)?;
    print_json(&updated)
}

pub fn run(action: TodoAction) -> CliResult {
    let db = open_store()?;
    match action {
        TodoAction::Add { title } => {
            let mut todos = load(&db)?;
            let todo = Todo::new(Uuid::new_v4().to_string(), title);
            todos.push(todo.clone());
            save(&db, &todos)?;
            print_json(&todo)
        }
        TodoAction::Done { id } => set_completed(&db, &id, true),
        TodoAction::Undo { id } => set_completed(&db, &id, false),
        TodoAction::List => print_json(&load(&db)?),
        TodoAction::Remove { id } => {
            let mut todos = load(&db)?;
            let before = todos.len();
            todos.retain(|t| t.id != id);
            if todos.len() == before {
                return Err(format!("todo not found: {id}").into());
            }
            save(&db, &todos)?;
            println!("removed {id}");
            Ok(())
        }
    }
}
