//! Todo - concise-state example
//!
//! Three stores share one tree:
//! - `logs`: a list of log lines
//! - `todos`: the todo list
//! - `visibility`: which todos to show
//!
//! The todo and visibility stores carry a store-aware middleware that writes
//! every action call into `logs`. An optional `ActionLoggerMiddleware` also
//! traces calls through `tracing`.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p todo-demo -- --add "write docs" --add "ship it" --toggle 0 --filter active
//!
//! # Load sample todos asynchronously and trace every action
//! RUST_LOG=debug cargo run -p todo-demo -- --sample --debug
//! ```

mod stores;

use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use concise_state::host::HostConfig;
use concise_state::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::stores::{
    logs_store, todos_store, visibility_store, Logs, Todos, Visibility, VisibilityFilter,
};

/// Todo list driven by concise-state stores
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(about = "A todo list demonstrating concise-state stores and middleware")]
struct Cli {
    /// Add a todo (repeatable)
    #[arg(long, short)]
    add: Vec<String>,

    /// Toggle a todo by id (repeatable)
    #[arg(long, short)]
    toggle: Vec<usize>,

    /// Filter applied when printing
    #[arg(long, short, value_enum, default_value = "all")]
    filter: VisibilityFilter,

    /// Load sample todos through an async action
    #[arg(long)]
    sample: bool,

    /// Trace every action through an action logger
    #[arg(long)]
    debug: bool,

    /// Comma-separated glob patterns of actions to trace
    #[arg(long)]
    log_include: Option<String>,

    /// Comma-separated glob patterns of actions not to trace
    #[arg(long)]
    log_exclude: Option<String>,

    /// Render passes allowed before giving up on an unsettled tree
    #[arg(long, default_value = "50")]
    max_render_passes: usize,
}

type Slot<S> = Rc<RefCell<Option<Rc<Store<S>>>>>;

fn capture<S: State>(context: &StoreContext<S>) -> (Element, Slot<S>) {
    let slot: Slot<S> = Rc::new(RefCell::new(None));
    let element = {
        let (context, slot) = (context.clone(), slot.clone());
        Element::consumer(move |cx| {
            *slot.borrow_mut() = Some(cx.use_context(&context));
            Ok(())
        })
    };
    (element, slot)
}

fn current<S>(slot: &Slot<S>) -> anyhow::Result<Rc<Store<S>>> {
    slot.borrow()
        .clone()
        .ok_or_else(|| anyhow::anyhow!("store was never rendered"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Traces todo actions through `tracing`; entries are printed at the end.
    let action_logger = ActionLoggerMiddleware::with_log(ActionLogConfig::new(
        100,
        ActionLoggerConfig::new(cli.log_include.as_deref(), cli.log_exclude.as_deref()),
    ))
    .active(cli.debug);
    let action_log = action_logger.log();

    let (logs, logs_provider) = logs_store();
    let (todos, todos_provider) = todos_store(&logs, action_logger);
    let (visibility, visibility_provider) = visibility_store(&logs);

    let (logs_view, logs_slot) = capture(&logs);
    let (todos_view, todos_slot) = capture(&todos);
    let (visibility_view, visibility_slot) = capture(&visibility);

    let tree = logs_provider.wrap([
        todos_provider.wrap([visibility_provider.wrap([todos_view, visibility_view])]),
        logs_view,
    ]);
    let mut root = Root::mount_with_config(
        tree,
        HostConfig {
            max_render_passes: cli.max_render_passes,
        },
    )?;

    for text in &cli.add {
        let id: usize = current(&todos_slot)?.call("addTodo", args![text])?.ready_as()?;
        tracing::info!(id, text = %text, "added todo");
        root.flush()?;
    }
    if cli.sample {
        let loaded: usize = current(&todos_slot)?
            .call("loadSample", args![5])?
            .resolve_as()
            .await?;
        tracing::info!(loaded, "loaded sample todos");
        root.flush()?;
    }
    for id in &cli.toggle {
        current(&todos_slot)?.call("toggleTodo", args![id])?;
        root.flush()?;
    }
    current(&visibility_slot)?.call("setFilter", args![cli.filter])?;
    root.flush()?;

    let todos = current(&todos_slot)?;
    let visibility = current(&visibility_slot)?;
    print_todos(&todos, &visibility);
    let logs = current(&logs_slot)?;
    print_logs(&logs);

    if let Some(log) = action_log.filter(|_| cli.debug) {
        println!("\nTraced actions:");
        for entry in log.borrow().entries() {
            println!(
                "  #{} {} {} -> {:?}",
                entry.sequence,
                entry.name,
                entry.args,
                entry.result
            );
        }
    }

    tracing::debug!(renders = root.render_count(), "done");
    Ok(())
}

fn print_todos(todos: &Todos, visibility: &Visibility) {
    println!("Todos ({:?}):", visibility.filter);
    for todo in todos.todos.iter().filter(|t| visibility.filter.shows(t)) {
        let mark = if todo.completed { "x" } else { " " };
        println!("  [{mark}] {} {}", todo.id, todo.text);
    }
}

fn print_logs(logs: &Logs) {
    println!("\nLog:");
    for line in &logs.lines {
        println!("  {line}");
    }
}
