//! Hook types fired while a command tree is executed.
//!
//! # Pipeline Position
//!
//! ```text
//! flat parsed args
//!   → root PREPARE
//!   → child PREPARE          (one per level on the resolved path)
//!   → ...
//!   → leaf PREPARE
//!   → leaf ACTION            → exit code
//! ```
//!
//! When a level cannot resolve its child, the walk stops there and the
//! node's MISSING or INVALID selection hook produces the exit code instead.

use std::fmt;
use std::rc::Rc;

use crate::args::ParsedArgs;
use crate::context::ExecutionContext;
use crate::tree::CommandWrapper;

/// Returned by a leaf that declares no action.
///
/// Distinct from any success code so callers can tell "did nothing" apart
/// from "succeeded".
pub const NO_ACTION: i32 = -1;

/// Returned by the default missing/invalid selection hooks at any depth.
pub const SELECTION_FAILURE: i32 = 1;

/// What an action produces: `Some(code)`, or `None` for "no opinion".
///
/// Errors propagate out of the tree walk untouched.
pub type ActionResult = anyhow::Result<Option<i32>>;

/// Callback run on every level of the resolved path, root first.
pub type PrepareFn = Rc<dyn Fn(&ParsedArgs, &mut CommandContext<'_>) -> anyhow::Result<()>>;

/// Callback run on the resolved leaf.
pub type ActionFn = Rc<dyn Fn(&ParsedArgs, &mut CommandContext<'_>) -> ActionResult>;

/// Callback run when a level's destination key holds no selection.
pub type MissingFn = Rc<dyn Fn(&CommandWrapper) -> i32>;

/// Callback run when a level's selection matches no child name or alias.
pub type InvalidFn = Rc<dyn Fn(&str, &CommandWrapper) -> i32>;

/// Argument registration for a node's own parser.
pub type ConfigureFn = Rc<dyn Fn(clap::Command) -> clap::Command>;

/// View handed to prepare hooks and actions.
///
/// Gives access to the executing wrapper (and through its parents, the
/// whole resolved path) plus the run's shared [`ExecutionContext`].
///
/// ```rust
/// use quickcli_dispatch::{CommandNode, CommandWrapper, ExecutionContext, ParsedArgs};
///
/// let root = CommandNode::root().child(
///     CommandNode::new("login").action(|_args, ctx| {
///         ctx.context.set("user", "alice");
///         Ok(Some(0))
///     }),
/// );
/// let tree = CommandWrapper::build(root);
/// let args: ParsedArgs = [("action", "login")].into_iter().collect();
/// let mut context = ExecutionContext::new();
///
/// assert_eq!(tree.execute(&args, &mut context)?, Some(0));
/// assert_eq!(context.get("user"), Some(&serde_json::json!("alice")));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct CommandContext<'a> {
    /// The wrapper whose hook is running.
    pub command: &'a Rc<CommandWrapper>,
    /// Shared run state.
    pub context: &'a mut ExecutionContext,
}

impl<'a> CommandContext<'a> {
    /// Creates a view for `command` over `context`.
    pub fn new(command: &'a Rc<CommandWrapper>, context: &'a mut ExecutionContext) -> Self {
        Self { command, context }
    }

    /// Names from the root down to the executing command.
    pub fn command_path(&self) -> Vec<String> {
        self.command.list_path()
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command.list_path())
            .field("context", &self.context)
            .finish()
    }
}

/// Default missing-selection hook: logs and returns [`SELECTION_FAILURE`].
pub fn report_missing_selection(wrapper: &CommandWrapper) -> i32 {
    let path = wrapper.delimited_path(":");
    let choices = wrapper.child_names().join(", ");
    if path.is_empty() {
        tracing::error!(
            "Must specify {}. {}: {}",
            wrapper.group_title(),
            wrapper.group_description(),
            choices
        );
    } else {
        tracing::error!(
            "Must specify {} for action '{}'. {}: {}",
            wrapper.group_title(),
            path,
            wrapper.group_description(),
            choices
        );
    }
    SELECTION_FAILURE
}

/// Default invalid-selection hook: logs and returns [`SELECTION_FAILURE`].
pub fn report_invalid_selection(selection: &str, wrapper: &CommandWrapper) -> i32 {
    let path = wrapper.path();
    if path.is_empty() {
        tracing::error!("Invalid {} '{}'", wrapper.group_title(), selection);
    } else {
        tracing::error!(
            "Invalid {} '{}' for {}",
            wrapper.group_title(),
            selection,
            path
        );
    }
    SELECTION_FAILURE
}
