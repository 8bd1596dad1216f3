//! Todo, visibility and log stores
//!
//! The todo and visibility stores share one store-aware middleware that
//! writes a line into the log store before every action.

use std::time::Duration;

use concise_state::prelude::*;
use concise_state::MiddlewareCreator;
use serde::{Deserialize, Serialize};

// ============================================================================
// Logs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Logs {
    pub lines: Vec<String>,
}

pub fn logs_store() -> (StoreContext<Logs>, StoreProvider<Logs>) {
    create_store_context(
        Logs::default(),
        Some(ActionFactory::new(|r: &ContextReference<Logs>| {
            let set_state = r.set_state.clone();
            Actions::builder()
                .action("write", move |_, args| {
                    let line: String = args.get(0)?;
                    set_state.update(move |prev: &Logs| {
                        let mut lines = prev.lines.clone();
                        lines.push(line);
                        Logs { lines }
                    })?;
                    Ok(())
                })
                .build()
        })),
        StoreOptions::new().meta(Meta::new().with("store", "logs")),
    )
}

/// Middleware writing `Calling '<action>' with <args>` into the log store.
pub fn logging_middleware(logs: &StoreContext<Logs>) -> MiddlewareCreator {
    create_middleware(
        |next, args, meta| {
            let line = if args.is_empty() {
                format!("Calling '{}'", meta.action_name())
            } else {
                format!("Calling '{}' with {}", meta.action_name(), args)
            };
            meta.stores()
                .store::<Logs>("logs")?
                .call("write", concise_state::args![line])?;
            next.run(args)
        },
        Contexts::new().with("logs", logs),
    )
}

// ============================================================================
// Todos
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: usize,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Todos {
    pub todos: Vec<Todo>,
}

pub fn todos_store(
    logs: &StoreContext<Logs>,
    tracer: ActionLoggerMiddleware,
) -> (StoreContext<Todos>, StoreProvider<Todos>) {
    let factory = ActionFactory::new(|r: &ContextReference<Todos>| {
        let (state, set_state) = (r.state.clone(), r.set_state.clone());
        let toggle_state = state.clone();
        let toggle_set = set_state.clone();
        let load_set = set_state.clone();

        Actions::builder()
            .action("addTodo", move |_, args| {
                let mut todos = state.todos.clone();
                let id = todos.len();
                todos.push(Todo {
                    id,
                    text: args.get(0)?,
                    completed: false,
                });
                set_state.set(Todos { todos })?;
                Ok(id)
            })
            .action("toggleTodo", move |_, args| {
                let id: usize = args.get(0)?;
                let todos = toggle_state
                    .todos
                    .iter()
                    .map(|todo| Todo {
                        completed: todo.completed != (todo.id == id),
                        ..todo.clone()
                    })
                    .collect();
                toggle_set.set(Todos { todos })?;
                Ok(())
            })
            .action_async("loadSample", move |_, args| {
                let set_state = load_set.clone();
                async move {
                    let delay: u64 = args.get(0).unwrap_or(10);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    let sample = ["read the docs", "write a store", "add middleware"];
                    set_state.update(move |prev: &Todos| {
                        let mut todos = prev.todos.clone();
                        for text in sample {
                            todos.push(Todo {
                                id: todos.len(),
                                text: text.to_string(),
                                completed: false,
                            });
                        }
                        Todos { todos }
                    })?;
                    Ok::<_, anyhow::Error>(sample.len())
                }
            })
            .build()
    });

    create_store_context(
        Todos::default(),
        Some(factory),
        StoreOptions::new()
            .middleware(tracer)
            .middleware(logging_middleware(logs))
            .meta(Meta::new().with("store", "todos")),
    )
}

// ============================================================================
// Visibility
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum VisibilityFilter {
    #[default]
    All,
    Completed,
    Active,
}

impl VisibilityFilter {
    pub fn shows(self, todo: &Todo) -> bool {
        match self {
            VisibilityFilter::All => true,
            VisibilityFilter::Completed => todo.completed,
            VisibilityFilter::Active => !todo.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Visibility {
    pub filter: VisibilityFilter,
}

pub fn visibility_store(
    logs: &StoreContext<Logs>,
) -> (StoreContext<Visibility>, StoreProvider<Visibility>) {
    create_store_context(
        Visibility::default(),
        Some(ActionFactory::new(|r: &ContextReference<Visibility>| {
            let set_state = r.set_state.clone();
            Actions::builder()
                .action("setFilter", move |_, args| {
                    set_state.set(Visibility {
                        filter: args.get(0)?,
                    })?;
                    Ok(())
                })
                .build()
        })),
        StoreOptions::new().middleware(logging_middleware(logs)),
    )
}
