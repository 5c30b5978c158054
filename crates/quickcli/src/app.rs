//! App struct and builder.
//!
//! [`App`] owns the command tree and the run's [`ExecutionContext`], and
//! drives the whole pipeline:
//!
//! ```text
//! PRE-PARSER-CONFIG → build clap tree → PRE-PARSING → parse argv
//!   → POST-PARSING → store `args` in context → init logging
//!   → PRE-EXECUTE → tree.execute → exit code
//! ```
//!
//! # Single-Threaded Design
//!
//! A run parses once, walks one path down the tree and exits. Hooks are
//! plain `Fn` closures over `Rc` state; only the interrupt handler, which
//! runs on its own thread, has to be `Send + Sync`.

use clap::Command;
use quickcli_dispatch::{
    parse_from, CommandNode, CommandWrapper, ContextConfig, ExecutionContext, ParsedArgs,
};
use serde_json::Value;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{AppError, SetupError, UNCAUGHT_ERROR_CODE};
use crate::info::AppInfo;
use crate::logging::{init_logging, level_for_verbosity, verbosity_arg, VERBOSITY_ARG};

/// Context key holding the parsed arguments as a JSON object.
pub const ARGS_KEY: &str = "args";

/// Context key recording whether the app initializes logging.
pub const INIT_LOGGING_KEY: &str = "init_logging";

/// Hook run at a fixed point of the pipeline.
pub type LifecycleFn = Rc<dyn Fn(&mut ExecutionContext) -> anyhow::Result<()>>;

/// Hook run right after parsing.
pub type PostParsingFn = Rc<dyn Fn(&ParsedArgs, &mut ExecutionContext) -> anyhow::Result<()>>;

/// Reports an uncaught failure and returns the exit code.
pub type ErrorFn = Rc<dyn Fn(&anyhow::Error, &AppInfo) -> i32>;

/// Computes the exit code used when the run is interrupted.
pub type InterruptFn = Arc<dyn Fn() -> i32 + Send + Sync>;

/// Application-level hooks, each phase run in registration order.
#[derive(Clone, Default)]
struct Lifecycle {
    pre_parser_config: Vec<LifecycleFn>,
    pre_parsing: Vec<LifecycleFn>,
    post_parsing: Vec<PostParsingFn>,
    pre_execute: Vec<LifecycleFn>,
}

fn run_phase(hooks: &[LifecycleFn], context: &mut ExecutionContext) -> anyhow::Result<()> {
    for hook in hooks {
        hook(context)?;
    }
    Ok(())
}

/// A command-line application built from a [`CommandNode`] tree.
///
/// ```rust
/// use quickcli::{App, AppInfo, CommandNode};
///
/// let mut app = App::builder(
///     CommandNode::root()
///         .child(CommandNode::new("hello").alias("hi").action(|_args, _ctx| Ok(Some(0)))),
/// )
/// .info(AppInfo::new().name("greeter"))
/// .build()?;
///
/// assert_eq!(app.run(["greeter", "hi"]), 0);
/// # Ok::<(), quickcli::SetupError>(())
/// ```
pub struct App {
    info: AppInfo,
    tree: Rc<CommandWrapper>,
    context: ExecutionContext,
    lifecycle: Lifecycle,
    debug: bool,
    logging: bool,
    handle_interrupts: bool,
    on_error: Option<ErrorFn>,
    on_interrupt: Option<InterruptFn>,
}

impl App {
    /// Creates a builder for an app whose command tree starts at `root`.
    pub fn builder(root: CommandNode) -> AppBuilder {
        AppBuilder::new(root)
    }

    /// Program metadata.
    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// Root of the command tree.
    pub fn command(&self) -> &Rc<CommandWrapper> {
        &self.tree
    }

    /// The run's shared context.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Mutable access to the run's shared context.
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Parsed arguments of the last run, as stored in the context.
    pub fn args(&self) -> Option<&Value> {
        self.context.get(ARGS_KEY)
    }

    /// One parsed argument of the last run.
    pub fn arg_value(&self, key: &str) -> Option<&Value> {
        self.args().and_then(|args| args.get(key))
    }

    /// Builds the complete clap command tree for this app.
    pub fn parser(&self) -> Command {
        let mut command = self.info.command();
        if self.logging {
            command = command.arg(verbosity_arg());
        }
        self.tree.configure_parser(command)
    }

    /// Runs the pipeline on `argv` without mapping failures to exit codes.
    pub fn try_run<I, T>(&mut self, argv: I) -> Result<Option<i32>, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if self.handle_interrupts {
            self.install_interrupt_handler();
        }

        run_phase(&self.lifecycle.pre_parser_config, &mut self.context)?;
        let mut parser = self.parser();

        run_phase(&self.lifecycle.pre_parsing, &mut self.context)?;
        let args = parse_from(&self.tree, &mut parser, argv)?;

        for hook in &self.lifecycle.post_parsing {
            hook(&args, &mut self.context)?;
        }
        self.context.set(ARGS_KEY, args.to_value());

        if self.logging {
            let verbosity = args.get_i64(VERBOSITY_ARG).unwrap_or(0);
            init_logging(level_for_verbosity(verbosity));
        }

        run_phase(&self.lifecycle.pre_execute, &mut self.context)?;

        tracing::info!(args = %args, "running application");
        Ok(self.tree.execute(&args, &mut self.context)?)
    }

    /// Runs the pipeline on `argv` and returns the process exit code.
    ///
    /// - a command's `Some(code)` is returned as is, `None` becomes 0
    /// - parser failures print clap's own message and use clap's code
    /// - hook or action failures go through the error handler (2 by default)
    pub fn run<I, T>(&mut self, argv: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.try_run(argv) {
            Ok(code) => code.unwrap_or(0),
            Err(AppError::Parse(err)) => {
                let code = err.exit_code();
                if let Err(io_err) = err.print() {
                    tracing::debug!(error = %io_err, "failed to print parser message");
                }
                code
            }
            Err(AppError::Command(err)) => self.report_error(&err),
        }
    }

    /// Runs the pipeline on the process arguments.
    pub fn run_env(&mut self) -> i32 {
        self.run(std::env::args_os())
    }

    fn report_error(&self, err: &anyhow::Error) -> i32 {
        tracing::info!("Uncaught error: {:#}", err);
        match &self.on_error {
            Some(handler) => handler(err, &self.info),
            None => default_error_report(err, &self.info, self.debug),
        }
    }

    fn install_interrupt_handler(&self) {
        let handler = self
            .on_interrupt
            .clone()
            .unwrap_or_else(|| Arc::new(|| 0));
        let installed = ctrlc::set_handler(move || {
            tracing::debug!("keyboard interrupt");
            std::process::exit(handler());
        });
        if let Err(err) = installed {
            tracing::debug!(error = %err, "interrupt handler not installed");
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("info", &self.info)
            .field("tree", &self.tree)
            .field("context", &self.context)
            .field("debug", &self.debug)
            .field("logging", &self.logging)
            .finish_non_exhaustive()
    }
}

/// Prints `{prog}: {error}` and a help hint to stderr, returning 2.
///
/// With `debug` on, the full error chain follows the first line.
pub fn default_error_report(err: &anyhow::Error, info: &AppInfo, debug: bool) -> i32 {
    let name = info.program_name();
    let indent = " ".repeat(name.len());
    eprintln!("{}: {}", name, err);
    if debug {
        eprintln!("{:?}", err);
    }
    eprintln!("{}  for help use --help", indent);
    UNCAUGHT_ERROR_CODE
}

/// Builder for [`App`].
pub struct AppBuilder {
    root: CommandNode,
    info: AppInfo,
    context_config: ContextConfig,
    context_values: Vec<(String, Value)>,
    lifecycle: Lifecycle,
    debug: bool,
    logging: bool,
    handle_interrupts: bool,
    on_error: Option<ErrorFn>,
    on_interrupt: Option<InterruptFn>,
}

impl AppBuilder {
    /// Creates a builder with default metadata and settings.
    ///
    /// By default:
    /// - logging is off (no `-v` flag, no subscriber)
    /// - Ctrl-C exits with code 0
    /// - uncaught failures print a short message and exit with 2
    pub fn new(root: CommandNode) -> Self {
        Self {
            root,
            info: AppInfo::new(),
            context_config: ContextConfig::default(),
            context_values: Vec::new(),
            lifecycle: Lifecycle::default(),
            debug: false,
            logging: false,
            handle_interrupts: true,
            on_error: None,
            on_interrupt: None,
        }
    }

    /// Sets the program metadata.
    pub fn info(mut self, info: AppInfo) -> Self {
        self.info = info;
        self
    }

    /// Sets the unset-key policy of the execution context.
    pub fn context_config(mut self, config: ContextConfig) -> Self {
        self.context_config = config;
        self
    }

    /// Seeds the execution context with a value.
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_values.push((key.into(), value.into()));
        self
    }

    /// Prints the full error chain for uncaught failures.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Adds `-v/--verbose` and installs a tracing subscriber after parsing.
    pub fn logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Whether `run` installs a Ctrl-C handler (on by default).
    pub fn handle_interrupts(mut self, handle: bool) -> Self {
        self.handle_interrupts = handle;
        self
    }

    /// Sets the exit code computation for Ctrl-C.
    pub fn on_interrupt<F>(mut self, f: F) -> Self
    where
        F: Fn() -> i32 + Send + Sync + 'static,
    {
        self.on_interrupt = Some(Arc::new(f));
        self
    }

    /// Replaces the default report for uncaught failures.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&anyhow::Error, &AppInfo) -> i32 + 'static,
    {
        self.on_error = Some(Rc::new(f));
        self
    }

    /// Adds a hook run before the clap tree is built.
    pub fn pre_parser_config<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<()> + 'static,
    {
        self.lifecycle.pre_parser_config.push(Rc::new(f));
        self
    }

    /// Adds a hook run before argv is parsed.
    pub fn pre_parsing<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<()> + 'static,
    {
        self.lifecycle.pre_parsing.push(Rc::new(f));
        self
    }

    /// Adds a hook run on the parsed arguments.
    pub fn post_parsing<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsedArgs, &mut ExecutionContext) -> anyhow::Result<()> + 'static,
    {
        self.lifecycle.post_parsing.push(Rc::new(f));
        self
    }

    /// Adds a hook run right before the command tree executes.
    pub fn pre_execute<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<()> + 'static,
    {
        self.lifecycle.pre_execute.push(Rc::new(f));
        self
    }

    /// Wraps the command tree and creates the context.
    ///
    /// # Errors
    ///
    /// Fails if siblings share a name or a non-root command is unnamed.
    pub fn build(self) -> Result<App, SetupError> {
        let tree = CommandWrapper::build(self.root);
        validate_tree(&tree)?;

        let mut context = ExecutionContext::with_config(self.context_config);
        context.set(INIT_LOGGING_KEY, self.logging);
        context.update(self.context_values);

        Ok(App {
            info: self.info,
            tree,
            context,
            lifecycle: self.lifecycle,
            debug: self.debug,
            logging: self.logging,
            handle_interrupts: self.handle_interrupts,
            on_error: self.on_error,
            on_interrupt: self.on_interrupt,
        })
    }
}

fn validate_tree(wrapper: &CommandWrapper) -> Result<(), SetupError> {
    let mut seen = HashSet::new();
    for child in wrapper.children() {
        if child.name().is_empty() {
            return Err(SetupError::UnnamedCommand(wrapper.delimited_path(".")));
        }
        if !seen.insert(child.name()) {
            return Err(SetupError::DuplicateCommand(child.delimited_path(".")));
        }
        validate_tree(child)?;
    }
    Ok(())
}
