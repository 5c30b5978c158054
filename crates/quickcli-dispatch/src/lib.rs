//! Declarative command trees for clap-based CLIs.
//!
//! `quickcli-dispatch` turns a tree of declared commands into a clap
//! subcommand tree, then resolves the parsed arguments back down to exactly
//! one leaf, firing a prepare hook at every level on the way.
//!
//! # Features
//!
//! - **Declaration**: [`CommandNode`] builders or [`CommandHandler`] structs
//! - **Aliases**: resolved by the tree itself, names beating aliases
//! - **Destination keys**: stable, path-derived keys in one flat [`ParsedArgs`] map
//! - **Hooks**: per-level prepare, leaf action, missing/invalid selection
//! - **Context**: an [`ExecutionContext`] shared by every hook of a run
//!
//! # Usage
//!
//! ```rust
//! use clap::{Arg, Command};
//! use quickcli_dispatch::{parse_from, CommandNode, CommandWrapper, ExecutionContext};
//!
//! let root = CommandNode::root().child(
//!     CommandNode::new("remote")
//!         .alias("r")
//!         .child(
//!             CommandNode::new("add")
//!                 .arg(Arg::new("name").required(true))
//!                 .action(|args, ctx| {
//!                     ctx.context.set("added", args.get_str("name").unwrap_or_default());
//!                     Ok(Some(0))
//!                 }),
//!         ),
//! );
//!
//! let tree = CommandWrapper::build(root);
//! let mut command = tree.configure_parser(Command::new("git"));
//! let args = parse_from(&tree, &mut command, ["git", "r", "add", "origin"])?;
//!
//! assert_eq!(args.get_str("action"), Some("remote"));
//! assert_eq!(args.get_str("remote_action"), Some("add"));
//!
//! let mut context = ExecutionContext::new();
//! assert_eq!(tree.execute(&args, &mut context)?, Some(0));
//! assert_eq!(context.get("added"), Some(&serde_json::json!("origin")));
//! # Ok::<(), anyhow::Error>(())
//! ```

// Core modules
mod args;
mod context;
mod hooks;
mod node;
mod parse;
mod tree;

pub use args::ParsedArgs;

pub use context::{ContextConfig, ContextError, ExecutionContext, Extensions};

pub use hooks::{
    report_invalid_selection, report_missing_selection, ActionFn, ActionResult, CommandContext,
    ConfigureFn, InvalidFn, MissingFn, PrepareFn, NO_ACTION, SELECTION_FAILURE,
};

pub use node::{CommandHandler, CommandNode, DEFAULT_DESCRIPTION, DEFAULT_DEST_BASE};

pub use parse::{collect_args, parse_from};

pub use tree::{CommandWrapper, PATH_DELIMITER};
