//! # quickcli - Declarative Command-Line Applications
//!
//! quickcli wires a tree of declared commands into a runnable program:
//!
//! - A clap parser generated from the tree, with program metadata for `--help`/`--version`
//! - Per-level prepare hooks and one leaf action per run
//! - A shared [`ExecutionContext`] that every hook can read and write
//! - Lifecycle hooks around configuration, parsing and execution
//! - Optional `-v` verbosity driving a `tracing` subscriber
//! - Exit-code mapping for results, parser errors, failures and Ctrl-C
//!
//! The resolution engine lives in `quickcli-dispatch` and is re-exported here.
//!
//! ## Quick Start
//!
//! ```rust
//! use clap::Arg;
//! use quickcli::{App, AppInfo, CommandNode};
//!
//! let root = CommandNode::root().child(
//!     CommandNode::new("greet")
//!         .alias("g")
//!         .about("Say hello")
//!         .arg(Arg::new("who").default_value("world"))
//!         .action(|args, ctx| {
//!             let who = args.get_str("who").unwrap_or_default();
//!             ctx.context.set("greeting", format!("hello {}", who));
//!             Ok(None)
//!         }),
//! );
//!
//! let mut app = App::builder(root)
//!     .info(AppInfo::new().name("hello").version("1.0.0"))
//!     .handle_interrupts(false)
//!     .build()?;
//!
//! assert_eq!(app.run(["hello", "g", "there"]), 0);
//! assert_eq!(app.context().get("greeting"), Some(&serde_json::json!("hello there")));
//! # Ok::<(), quickcli::SetupError>(())
//! ```
//!
//! ## Exit Codes
//!
//! | outcome | code |
//! |---------|------|
//! | action returned `Ok(None)` | 0 |
//! | action returned `Ok(Some(n))` | n |
//! | missing or invalid subcommand | 1 |
//! | leaf without action | -1 |
//! | clap usage error | 2 (`--help`/`--version`: 0) |
//! | hook or action error | 2, or the `on_error` result |
//! | Ctrl-C | 0, or the `on_interrupt` result |

mod app;
mod error;
mod info;
mod logging;

pub use app::{
    default_error_report, App, AppBuilder, ErrorFn, InterruptFn, LifecycleFn, PostParsingFn,
    ARGS_KEY, INIT_LOGGING_KEY,
};

pub use error::{exit_status, to_exit_code, AppError, SetupError, UNCAUGHT_ERROR_CODE};

pub use info::{AppInfo, DEFAULT_LICENSE};

pub use logging::{init_logging, level_for_verbosity, verbosity_arg, VERBOSITY_ARG};

pub use quickcli_dispatch::{
    report_invalid_selection, report_missing_selection, ActionResult, CommandContext,
    CommandHandler, CommandNode, CommandWrapper, ContextConfig, ContextError, ExecutionContext,
    Extensions, ParsedArgs, DEFAULT_DESCRIPTION, NO_ACTION, SELECTION_FAILURE,
};

/// The resolution engine, for callers driving clap themselves.
pub use quickcli_dispatch as dispatch;
