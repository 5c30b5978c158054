//! User-declared command nodes.
//!
//! A [`CommandNode`] is the immutable description of one command: its name
//! and aliases, its children, its hooks and how it registers arguments.
//! Every node owns its own configuration; nothing is shared between
//! declarations unless the caller shares it explicitly.
//!
//! Commands can be declared two ways, and both produce the same node shape:
//!
//! ```rust
//! use quickcli_dispatch::{ActionResult, CommandContext, CommandHandler, CommandNode, ParsedArgs};
//!
//! // Closure style
//! let status = CommandNode::new("status")
//!     .alias("st")
//!     .about("Show status")
//!     .action(|_args, _ctx| Ok(Some(0)));
//!
//! // Struct style
//! struct Push;
//!
//! impl CommandHandler for Push {
//!     fn run(&self, _args: &ParsedArgs, _ctx: &mut CommandContext<'_>) -> ActionResult {
//!         Ok(None)
//!     }
//! }
//!
//! let root = CommandNode::root()
//!     .child(status)
//!     .child(CommandNode::handler("push", Push).doc("Push changes\n\nLong text."));
//! assert_eq!(root.child_nodes().len(), 2);
//! assert_eq!(root.child_nodes()[1].description(), "Push changes");
//! ```

use clap::Arg;
use std::fmt;
use std::rc::Rc;

use crate::args::ParsedArgs;
use crate::hooks::{
    ActionFn, ActionResult, CommandContext, ConfigureFn, InvalidFn, MissingFn, PrepareFn,
};

/// Description used when a node has neither an explicit one nor doc text.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Default base for derived destination keys.
pub const DEFAULT_DEST_BASE: &str = "action";

const DEFAULT_GROUP_TITLE: &str = "actions";
const DEFAULT_GROUP_DESCRIPTION: &str = "Available Actions";
const DEFAULT_GROUP_METAVAR: &str = "{action}";

/// Struct-based command declaration.
///
/// Implement this for commands that carry their own state or want their
/// argument registration, preparation and action kept together. Wrap it
/// with [`CommandNode::handler`].
pub trait CommandHandler: 'static {
    /// Registers this command's own arguments.
    fn configure(&self, command: clap::Command) -> clap::Command {
        command
    }

    /// Runs before descending past (or acting on) this command.
    fn prepare(&self, _args: &ParsedArgs, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs when this command is the resolved leaf.
    fn run(&self, args: &ParsedArgs, ctx: &mut CommandContext<'_>) -> ActionResult;

    /// Explicit description, if any.
    fn description(&self) -> Option<String> {
        None
    }
}

/// One declared command and its subtree.
#[derive(Clone)]
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    children: Vec<Rc<CommandNode>>,
    about: Option<String>,
    doc: Option<String>,
    action: Option<ActionFn>,
    prepare: Option<PrepareFn>,
    args: Vec<Arg>,
    configure: Option<ConfigureFn>,
    dest: Option<String>,
    dest_base: String,
    group_title: String,
    group_description: String,
    group_metavar: String,
    on_missing: Option<MissingFn>,
    on_invalid: Option<InvalidFn>,
}

impl CommandNode {
    /// Creates a node named `name` with default settings and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            children: Vec::new(),
            about: None,
            doc: None,
            action: None,
            prepare: None,
            args: Vec::new(),
            configure: None,
            dest: None,
            dest_base: DEFAULT_DEST_BASE.to_string(),
            group_title: DEFAULT_GROUP_TITLE.to_string(),
            group_description: DEFAULT_GROUP_DESCRIPTION.to_string(),
            group_metavar: DEFAULT_GROUP_METAVAR.to_string(),
            on_missing: None,
            on_invalid: None,
        }
    }

    /// Creates the nameless root of a command tree.
    pub fn root() -> Self {
        Self::new("")
    }

    /// Creates a node whose hooks and argument registration come from `handler`.
    pub fn handler<H: CommandHandler>(name: impl Into<String>, handler: H) -> Self {
        let handler = Rc::new(handler);
        let about = handler.description();
        let (configuring, preparing) = (Rc::clone(&handler), Rc::clone(&handler));

        let mut node = Self::new(name)
            .configure(move |command| configuring.configure(command))
            .prepare(move |args, ctx| preparing.prepare(args, ctx))
            .action(move |args, ctx| handler.run(args, ctx));
        node.about = about;
        node
    }

    /// Adds one alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds several aliases, in order.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Appends a child command.
    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(Rc::new(child));
        self
    }

    /// Appends several child commands, in order.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = CommandNode>,
    {
        self.children.extend(children.into_iter().map(Rc::new));
        self
    }

    /// Sets an explicit description.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Sets documentation text; its first non-empty line is the fallback description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the action run when this node is the resolved leaf.
    pub fn action<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsedArgs, &mut CommandContext<'_>) -> ActionResult + 'static,
    {
        self.action = Some(Rc::new(f));
        self
    }

    /// Sets the hook run whenever resolution passes through this node.
    pub fn prepare<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsedArgs, &mut CommandContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.prepare = Some(Rc::new(f));
        self
    }

    /// Declares an argument on this node's parser.
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Registers arguments with a function over the node's clap command.
    ///
    /// Runs after the args declared with [`CommandNode::arg`].
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(clap::Command) -> clap::Command + 'static,
    {
        self.configure = Some(Rc::new(f));
        self
    }

    /// Uses `dest` verbatim as this node's destination key.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Sets the base used when deriving the destination key.
    pub fn dest_base(mut self, base: impl Into<String>) -> Self {
        self.dest_base = base.into();
        self
    }

    /// Sets the title of the child-command group.
    pub fn group_title(mut self, title: impl Into<String>) -> Self {
        self.group_title = title.into();
        self
    }

    /// Sets the description of the child-command group.
    pub fn group_description(mut self, description: impl Into<String>) -> Self {
        self.group_description = description.into();
        self
    }

    /// Sets the placeholder shown for the child command in usage lines.
    pub fn group_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.group_metavar = metavar.into();
        self
    }

    /// Replaces the default missing-selection hook.
    pub fn on_missing<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::CommandWrapper) -> i32 + 'static,
    {
        self.on_missing = Some(Rc::new(f));
        self
    }

    /// Replaces the default invalid-selection hook.
    pub fn on_invalid<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &crate::CommandWrapper) -> i32 + 'static,
    {
        self.on_invalid = Some(Rc::new(f));
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The node's name; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliases in declaration order.
    pub fn alias_names(&self) -> &[String] {
        &self.aliases
    }

    /// Children in declaration order.
    pub fn child_nodes(&self) -> &[Rc<CommandNode>] {
        &self.children
    }

    /// Explicit description, else first line of the doc text, else a fallback.
    pub fn description(&self) -> &str {
        if let Some(about) = &self.about {
            return about;
        }
        self.doc
            .as_deref()
            .and_then(|doc| doc.lines().map(str::trim).find(|line| !line.is_empty()))
            .unwrap_or(DEFAULT_DESCRIPTION)
    }

    /// Explicit destination key, if one was set.
    pub fn dest_override(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// Base for the derived destination key.
    pub fn dest_base_name(&self) -> &str {
        &self.dest_base
    }

    /// Title of the child-command group.
    pub fn group_title_text(&self) -> &str {
        &self.group_title
    }

    /// Description of the child-command group.
    pub fn group_description_text(&self) -> &str {
        &self.group_description
    }

    /// Usage placeholder for the child command.
    pub fn group_metavar_text(&self) -> &str {
        &self.group_metavar
    }

    pub(crate) fn prepare_hook(&self) -> Option<&PrepareFn> {
        self.prepare.as_ref()
    }

    pub(crate) fn action_hook(&self) -> Option<&ActionFn> {
        self.action.as_ref()
    }

    pub(crate) fn missing_hook(&self) -> Option<&MissingFn> {
        self.on_missing.as_ref()
    }

    pub(crate) fn invalid_hook(&self) -> Option<&InvalidFn> {
        self.on_invalid.as_ref()
    }

    /// Applies this node's argument declarations to `command`.
    pub fn register_args(&self, command: clap::Command) -> clap::Command {
        let command = self
            .args
            .iter()
            .cloned()
            .fold(command, |command, arg| command.arg(arg));
        match &self.configure {
            Some(configure) => configure(command),
            None => command,
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("children", &self.children)
            .field("description", &self.description())
            .field("has_action", &self.action.is_some())
            .field("has_prepare", &self.prepare.is_some())
            .field("dest", &self.dest)
            .field("dest_base", &self.dest_base)
            .finish_non_exhaustive()
    }
}
