use clap::{Arg, ArgAction};
use quickcli::{
    ActionResult, App, AppError, AppInfo, CommandContext, CommandHandler, CommandNode,
    ContextConfig, ParsedArgs, NO_ACTION, SELECTION_FAILURE,
};
use serde_json::json;
use serial_test::serial;
use std::cell::RefCell;
use std::rc::Rc;

fn builder(root: CommandNode) -> quickcli::AppBuilder {
    App::builder(root)
        .info(AppInfo::new().name("git").version("2.0.0"))
        .handle_interrupts(false)
}

fn remote_tree(calls: &Rc<RefCell<Vec<String>>>) -> CommandNode {
    let add_calls = Rc::clone(calls);
    let remove_calls = Rc::clone(calls);
    CommandNode::root().child(
        CommandNode::new("remote")
            .aliases(["r", "rem"])
            .doc("Manage remotes\n\nLonger text that never reaches the listing.")
            .child(
                CommandNode::new("add")
                    .arg(Arg::new("name").required(true))
                    .arg(Arg::new("url").required(true))
                    .action(move |args, ctx| {
                        let name = args.get_str("name").unwrap_or_default().to_string();
                        add_calls.borrow_mut().push(format!("add {}", name));
                        ctx.context.set(format!("remote.{}", name), args.get("url").cloned());
                        Ok(None)
                    }),
            )
            .child(CommandNode::new("remove").alias("rm").action(move |_, _| {
                remove_calls.borrow_mut().push("remove".into());
                Ok(Some(3))
            })),
    )
}

// =============================================================================
// Resolution through the full pipeline
// =============================================================================

#[test]
fn test_alias_resolves_to_leaf() {
    let calls = Rc::default();
    let mut app = builder(remote_tree(&calls)).build().unwrap();

    let code = app.run(["git", "r", "add", "origin", "https://example.com/repo.git"]);

    assert_eq!(code, 0);
    assert_eq!(*calls.borrow(), vec!["add origin"]);
    assert_eq!(app.arg_value("action"), Some(&json!("remote")));
    assert_eq!(app.arg_value("remote_action"), Some(&json!("add")));
    assert_eq!(
        app.context().get("remote.origin"),
        Some(&json!("https://example.com/repo.git"))
    );
}

#[test]
fn test_action_code_is_exit_code() {
    let calls = Rc::default();
    let mut app = builder(remote_tree(&calls)).build().unwrap();

    assert_eq!(app.run(["git", "remote", "rm"]), 3);
}

#[test]
fn test_missing_selection_exits_with_failure() {
    let calls = Rc::default();
    let mut app = builder(remote_tree(&calls)).build().unwrap();

    assert_eq!(app.run(["git"]), SELECTION_FAILURE);
    assert_eq!(app.run(["git", "remote"]), SELECTION_FAILURE);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_custom_missing_hook_code() {
    let mut app = builder(
        CommandNode::root()
            .on_missing(|wrapper| wrapper.children().len() as i32 + 40)
            .child(CommandNode::new("one"))
            .child(CommandNode::new("two")),
    )
    .build()
    .unwrap();

    assert_eq!(app.run(["git"]), 42);
}

#[test]
fn test_leaf_without_action_returns_sentinel() {
    let mut app = builder(CommandNode::root().child(CommandNode::new("noop")))
        .build()
        .unwrap();

    assert_eq!(app.run(["git", "noop"]), NO_ACTION);
}

fn recording(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> CommandNode {
    let log = Rc::clone(log);
    CommandNode::new(name).action(move |_, _| {
        log.borrow_mut().push(name.to_string());
        Ok(None)
    })
}

#[test]
fn test_name_beats_sibling_alias_through_run() {
    let log = Rc::default();
    let mut app = builder(
        CommandNode::root()
            .child(recording("a", &log).alias("x"))
            .child(recording("x", &log)),
    )
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "x"]), 0);
    assert_eq!(app.run(["git", "a"]), 0);
    assert_eq!(*log.borrow(), vec!["x", "a"]);
    assert_eq!(app.arg_value("action"), Some(&json!("a")));
}

#[test]
fn test_first_declared_alias_wins_through_run() {
    let log = Rc::default();
    let mut app = builder(
        CommandNode::root()
            .child(recording("c1", &log).alias("x"))
            .child(recording("c2", &log).aliases(["x", "two"])),
    )
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "x"]), 0);
    assert_eq!(app.run(["git", "two"]), 0);
    assert_eq!(*log.borrow(), vec!["c1", "c2"]);
}

// =============================================================================
// Parser outcomes
// =============================================================================

#[test]
fn test_unknown_command_is_usage_error() {
    let calls = Rc::default();
    let mut app = builder(remote_tree(&calls)).build().unwrap();

    assert!(matches!(
        app.try_run(["git", "fetch"]),
        Err(AppError::Parse(_))
    ));
    assert_eq!(app.run(["git", "fetch"]), 2);
}

#[test]
fn test_help_and_version_exit_zero() {
    let calls = Rc::default();
    let mut app = builder(remote_tree(&calls)).build().unwrap();

    assert_eq!(app.run(["git", "--help"]), 0);
    assert_eq!(app.run(["git", "-V"]), 0);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_parser_lists_children_with_descriptions() {
    let calls = Rc::default();
    let app = builder(remote_tree(&calls)).build().unwrap();
    let parser = app.parser();

    let remote = parser.find_subcommand("remote").unwrap();
    assert_eq!(
        remote.get_about().map(|about| about.to_string()),
        Some("Manage remotes".to_string())
    );
    let aliases: Vec<&str> = remote.get_visible_aliases().collect();
    assert_eq!(aliases, vec!["r", "rem"]);

    let add = remote.find_subcommand("add").unwrap();
    assert_eq!(
        add.get_about().map(|about| about.to_string()),
        Some("No description".to_string())
    );
}

// =============================================================================
// Failures and error handling
// =============================================================================

#[test]
fn test_action_error_default_code() {
    let mut app = builder(
        CommandNode::root()
            .child(CommandNode::new("boom").action(|_, _| Err(anyhow::anyhow!("exploded")))),
    )
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "boom"]), 2);
}

#[test]
fn test_on_error_receives_failure() {
    let seen = Rc::new(RefCell::new(String::new()));
    let seen_clone = Rc::clone(&seen);

    let mut app = builder(
        CommandNode::root()
            .child(CommandNode::new("boom").action(|_, _| Err(anyhow::anyhow!("exploded")))),
    )
    .on_error(move |err, info| {
        *seen_clone.borrow_mut() = format!("{}: {}", info.program_name(), err);
        7
    })
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "boom"]), 7);
    assert_eq!(*seen.borrow(), "git: exploded");
}

#[test]
fn test_lifecycle_hook_failure_stops_run() {
    let ran = Rc::new(RefCell::new(false));
    let ran_clone = Rc::clone(&ran);

    let mut app = builder(CommandNode::root().child(CommandNode::new("go").action(
        move |_, _| {
            *ran_clone.borrow_mut() = true;
            Ok(None)
        },
    )))
    .pre_execute(|_| anyhow::bail!("not configured"))
    .build()
    .unwrap();

    match app.try_run(["git", "go"]) {
        Err(AppError::Command(err)) => assert_eq!(err.to_string(), "not configured"),
        other => panic!("expected command error, got {:?}", other),
    }
    assert!(!*ran.borrow());
}

#[test]
fn test_strict_context_reports_unset_keys() {
    let mut app = builder(CommandNode::root().child(CommandNode::new("read").action(
        |_, ctx| {
            ctx.context.lookup("token")?;
            Ok(None)
        },
    )))
    .context_config(ContextConfig::strict())
    .build()
    .unwrap();

    match app.try_run(["git", "read"]) {
        Err(AppError::Command(err)) => {
            assert_eq!(err.to_string(), "no such context attribute 'token'")
        }
        other => panic!("expected command error, got {:?}", other),
    }
}

#[test]
fn test_lenient_context_returns_unset_default() {
    let mut app = builder(CommandNode::root().child(CommandNode::new("read").action(
        |_, ctx| {
            let token = ctx.context.lookup("token")?.clone();
            ctx.context.set("seen", token);
            Ok(None)
        },
    )))
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "read"]), 0);
    assert_eq!(app.context().get("seen"), Some(&json!("")));
}

// =============================================================================
// Struct handlers and shared state
// =============================================================================

struct Counter {
    step: i64,
}

impl CommandHandler for Counter {
    fn configure(&self, command: clap::Command) -> clap::Command {
        command.arg(Arg::new("times").long("times").value_parser(clap::value_parser!(i64)))
    }

    fn prepare(&self, _args: &ParsedArgs, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        ctx.context.set_default("count", 0);
        Ok(())
    }

    fn run(&self, args: &ParsedArgs, ctx: &mut CommandContext<'_>) -> ActionResult {
        let times: i64 = args
            .get_str("times")
            .map(str::parse)
            .transpose()?
            .unwrap_or(1);
        let count = ctx.context.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
        ctx.context.set("count", count + times * self.step);
        Ok(None)
    }

    fn description(&self) -> Option<String> {
        Some("Bump the counter".into())
    }
}

#[test]
fn test_struct_handler_runs_with_configured_args() {
    let mut app = builder(CommandNode::root().child(CommandNode::handler("bump", Counter { step: 5 })))
        .context_value("count", 10)
        .build()
        .unwrap();

    assert_eq!(app.run(["git", "bump", "--times", "2"]), 0);
    assert_eq!(app.context().get("count"), Some(&json!(20)));

    let parser = app.parser();
    let bump = parser.find_subcommand("bump").unwrap();
    assert_eq!(
        bump.get_about().map(|about| about.to_string()),
        Some("Bump the counter".to_string())
    );
}

#[test]
fn test_post_parsing_sees_arguments() {
    let mut app = builder(
        CommandNode::root()
            .arg(Arg::new("dry-run").long("dry-run").action(ArgAction::SetTrue))
            .child(CommandNode::new("sync").action(|_, ctx| {
                let dry = ctx.context.get("dry").and_then(|v| v.as_bool()) == Some(true);
                Ok(Some(if dry { 10 } else { 0 }))
            })),
    )
    .post_parsing(|args, ctx| {
        ctx.set("dry", args.get_bool("dry-run").unwrap_or(false));
        Ok(())
    })
    .build()
    .unwrap();

    assert_eq!(app.run(["git", "--dry-run", "sync"]), 10);
    assert_eq!(app.run(["git", "sync"]), 0);
}

// =============================================================================
// Logging
// =============================================================================

#[test]
#[serial]
fn test_verbosity_counted_when_logging() {
    let mut app = builder(CommandNode::root().child(CommandNode::new("go").action(|_, _| Ok(None))))
        .logging(true)
        .build()
        .unwrap();

    assert_eq!(app.run(["git", "-vv", "go"]), 0);
    assert_eq!(app.arg_value("verbosity"), Some(&json!(2)));
}

#[test]
#[serial]
fn test_verbose_flag_rejected_without_logging() {
    let mut app = builder(CommandNode::root().child(CommandNode::new("go").action(|_, _| Ok(None))))
        .build()
        .unwrap();

    assert!(matches!(
        app.try_run(["git", "-v", "go"]),
        Err(AppError::Parse(_))
    ));
}
