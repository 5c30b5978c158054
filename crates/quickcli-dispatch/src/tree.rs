//! The indexed runtime command tree.
//!
//! [`CommandWrapper::build`] wraps a declared [`CommandNode`] tree once,
//! eagerly. Each wrapper indexes its children by name and alias, derives the
//! destination key its selection is stored under, configures the matching
//! clap subcommand tree, and resolves parsed arguments down to one leaf.
//!
//! # Lookup precedence
//!
//! The child index is built in two passes: every primary name first, then
//! aliases that are not already keys. A primary name therefore always beats
//! an alias, and among equal aliases the first declared child wins.
//!
//! # Destination keys
//!
//! For `root → remote → add` with the default base:
//!
//! | Wrapper | Path | Destination key |
//! |---------|------|-----------------|
//! | root | `` | `action` |
//! | remote | `remote` | `remote_action` |
//! | add | `remote_add` | `remote_add_action` |

use indexmap::IndexMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::args::ParsedArgs;
use crate::context::ExecutionContext;
use crate::hooks::{
    report_invalid_selection, report_missing_selection, ActionResult, CommandContext, NO_ACTION,
};
use crate::node::CommandNode;

/// Delimiter used by [`CommandWrapper::path`] and destination keys.
pub const PATH_DELIMITER: &str = "_";

/// Runtime counterpart of a [`CommandNode`].
pub struct CommandWrapper {
    node: Rc<CommandNode>,
    parent: Weak<CommandWrapper>,
    children: Vec<Rc<CommandWrapper>>,
    index: IndexMap<String, usize>,
}

impl CommandWrapper {
    /// Wraps `root` and its whole subtree.
    pub fn build(root: CommandNode) -> Rc<Self> {
        Self::wrap(Rc::new(root), Weak::new())
    }

    fn wrap(node: Rc<CommandNode>, parent: Weak<CommandWrapper>) -> Rc<Self> {
        Rc::new_cyclic(|me| {
            let children: Vec<Rc<CommandWrapper>> = node
                .child_nodes()
                .iter()
                .map(|child| Self::wrap(Rc::clone(child), me.clone()))
                .collect();

            let mut index = IndexMap::new();
            for (i, child) in children.iter().enumerate() {
                index.entry(child.name().to_string()).or_insert(i);
            }
            for (i, child) in children.iter().enumerate() {
                for alias in child.aliases() {
                    index.entry(alias.clone()).or_insert(i);
                }
            }

            Self {
                node,
                parent,
                children,
                index,
            }
        })
    }

    // =========================================================================
    // Node accessors
    // =========================================================================

    /// The wrapped declaration.
    pub fn node(&self) -> &CommandNode {
        &self.node
    }

    /// The command name; empty for the root.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Aliases in declaration order.
    pub fn aliases(&self) -> &[String] {
        self.node.alias_names()
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        self.node.description()
    }

    /// Title of the child-command group.
    pub fn group_title(&self) -> &str {
        self.node.group_title_text()
    }

    /// Description of the child-command group.
    pub fn group_description(&self) -> &str {
        self.node.group_description_text()
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// The enclosing wrapper, or `None` for the root.
    pub fn parent(&self) -> Option<Rc<CommandWrapper>> {
        self.parent.upgrade()
    }

    /// Returns true if this wrapper has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.upgrade().is_none()
    }

    /// The root of the tree this wrapper belongs to.
    pub fn root(self: &Rc<Self>) -> Rc<CommandWrapper> {
        let mut current = Rc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Child wrappers in declaration order.
    pub fn children(&self) -> &[Rc<CommandWrapper>] {
        &self.children
    }

    /// Returns true if this wrapper selects among children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Primary names of the children, in declaration order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name()).collect()
    }

    /// Every lookup key (names first, then surviving aliases) with the
    /// name of the child it resolves to.
    pub fn lookup_entries(&self) -> Vec<(&str, &str)> {
        self.index
            .iter()
            .map(|(key, &i)| (key.as_str(), self.children[i].name()))
            .collect()
    }

    /// Finds the child selected by `name`, which may be a name or an alias.
    pub fn resolve(&self, name: &str) -> Option<&Rc<CommandWrapper>> {
        self.index.get(name).map(|&i| &self.children[i])
    }

    // =========================================================================
    // Paths and destination keys
    // =========================================================================

    /// Names from the root down to this wrapper, root's empty name excluded.
    pub fn list_path(&self) -> Vec<String> {
        let mut path = match self.parent() {
            Some(parent) => parent.list_path(),
            None => Vec::new(),
        };
        if !self.name().is_empty() {
            path.push(self.name().to_string());
        }
        path
    }

    /// The path joined with `delimiter`.
    pub fn delimited_path(&self, delimiter: &str) -> String {
        self.list_path().join(delimiter)
    }

    /// The path joined with underscores.
    pub fn path(&self) -> String {
        self.delimited_path(PATH_DELIMITER)
    }

    /// Key under which the parser stores this wrapper's child selection.
    pub fn destination_key(&self) -> String {
        if let Some(dest) = self.node.dest_override() {
            return dest.to_string();
        }
        let path = self.path();
        let base = self.node.dest_base_name();
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}{}{}", path, PATH_DELIMITER, base)
        }
    }

    // =========================================================================
    // Parser configuration
    // =========================================================================

    /// Registers this subtree on `command`.
    ///
    /// The node's own arguments are registered first; then, if there are
    /// children, one subcommand per child in declaration order, each
    /// configured recursively. Aliases are passed to clap as visible aliases.
    pub fn configure_parser(&self, command: clap::Command) -> clap::Command {
        let mut command = self.node.register_args(command);
        if !self.has_children() {
            return command;
        }

        command = command
            .subcommand_help_heading(self.group_title().to_string())
            .subcommand_value_name(self.node.group_metavar_text().to_string());

        for (i, child) in self.children.iter().enumerate() {
            let sub = clap::Command::new(child.name().to_string())
                .about(child.description().to_string())
                .visible_aliases(self.parser_aliases(i));
            command = command.subcommand(child.configure_parser(sub));
        }
        command
    }

    /// Aliases of child `i` that the index resolves to that child.
    ///
    /// Aliases shadowed by a sibling's name, claimed by an earlier sibling
    /// or repeating the child's own name are left out, so clap never sees
    /// the same token twice among siblings.
    fn parser_aliases(&self, i: usize) -> Vec<String> {
        let child = &self.children[i];
        let mut kept: Vec<String> = Vec::new();
        for alias in child.aliases() {
            if alias == child.name() || kept.contains(alias) {
                continue;
            }
            if self.index.get(alias.as_str()) == Some(&i) {
                kept.push(alias.clone());
            }
        }
        kept
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Resolves `args` from this wrapper down to one leaf and runs it.
    ///
    /// Prepare hooks fire once per level, root first. At a leaf the action
    /// runs, or [`NO_ACTION`] is returned when none is declared. When a
    /// level has no selection, or one that matches no child, its missing or
    /// invalid hook supplies the result and the walk stops.
    ///
    /// Errors from hooks and actions propagate unchanged.
    pub fn execute(
        self: &Rc<Self>,
        args: &ParsedArgs,
        context: &mut ExecutionContext,
    ) -> ActionResult {
        let node = &self.node;

        tracing::debug!(
            command = %self.display_name(),
            has_prepare = node.prepare_hook().is_some(),
            "prepare"
        );
        if let Some(prepare) = node.prepare_hook() {
            prepare(args, &mut CommandContext::new(self, context))?;
        }

        if !self.has_children() {
            tracing::debug!(
                command = %self.display_name(),
                has_action = node.action_hook().is_some(),
                "action"
            );
            return match node.action_hook() {
                Some(action) => action(args, &mut CommandContext::new(self, context)),
                None => Ok(Some(NO_ACTION)),
            };
        }

        let dest = self.destination_key();
        let Some(selection) = args.selection(&dest) else {
            let code = match node.missing_hook() {
                Some(hook) => hook(self),
                None => report_missing_selection(self),
            };
            return Ok(Some(code));
        };

        match self.resolve(&selection) {
            Some(child) => child.execute(args, context),
            None => {
                let code = match node.invalid_hook() {
                    Some(hook) => hook(&selection, self),
                    None => report_invalid_selection(&selection, self),
                };
                Ok(Some(code))
            }
        }
    }

    fn display_name(&self) -> &str {
        if self.name().is_empty() {
            "<root>"
        } else {
            self.name()
        }
    }
}

impl fmt::Debug for CommandWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandWrapper")
            .field("path", &self.path())
            .field("dest", &self.destination_key())
            .field("children", &self.children)
            .finish()
    }
}
