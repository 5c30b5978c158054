use clap::{Arg, ArgAction, Command};
use quickcli_dispatch::{
    parse_from, CommandContext, CommandNode, CommandWrapper, ExecutionContext, ParsedArgs,
    NO_ACTION, SELECTION_FAILURE,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn prepare_logger(
    log: &Log,
    label: &'static str,
) -> impl Fn(&ParsedArgs, &mut CommandContext<'_>) -> anyhow::Result<()> {
    let log = Rc::clone(log);
    move |_, ctx| {
        log.borrow_mut()
            .push(format!("prepare {} [{}]", label, ctx.command_path().join(" ")));
        Ok(())
    }
}

fn three_level_tree(log: &Log) -> Rc<CommandWrapper> {
    let action_log = Rc::clone(log);
    CommandWrapper::build(
        CommandNode::root()
            .prepare(prepare_logger(log, "root"))
            .arg(Arg::new("verbosity").short('v').action(ArgAction::Count))
            .child(
                CommandNode::new("A")
                    .alias("a")
                    .prepare(prepare_logger(log, "A"))
                    .child(
                        CommandNode::new("B")
                            .prepare(prepare_logger(log, "B"))
                            .arg(Arg::new("target"))
                            .action(move |args, _| {
                                action_log.borrow_mut().push(format!(
                                    "action B target={}",
                                    args.get_str("target").unwrap_or("-")
                                ));
                                Ok(Some(0))
                            }),
                    )
                    .child(CommandNode::new("C").prepare(prepare_logger(log, "C"))),
            ),
    )
}

fn run(tree: &Rc<CommandWrapper>, argv: &[&str]) -> anyhow::Result<Option<i32>> {
    let mut command = tree.configure_parser(Command::new("app"));
    let args = parse_from(tree, &mut command, argv)?;
    let mut context = ExecutionContext::new();
    tree.execute(&args, &mut context)
}

#[test]
fn test_prepare_order_along_resolved_path() {
    let log: Log = Rc::default();
    let tree = three_level_tree(&log);

    let result = run(&tree, &["app", "-v", "a", "B", "prod"]).unwrap();

    assert_eq!(result, Some(0));
    assert_eq!(
        *log.borrow(),
        vec![
            "prepare root []",
            "prepare A [A]",
            "prepare B [A B]",
            "action B target=prod",
        ]
    );
}

#[test]
fn test_missing_nested_selection_stops_at_that_level() {
    let log: Log = Rc::default();
    let tree = three_level_tree(&log);

    let result = run(&tree, &["app", "A"]).unwrap();

    assert_eq!(result, Some(SELECTION_FAILURE));
    assert_eq!(*log.borrow(), vec!["prepare root []", "prepare A [A]"]);
}

#[test]
fn test_missing_root_selection() {
    let log: Log = Rc::default();
    let tree = three_level_tree(&log);

    assert_eq!(run(&tree, &["app"]).unwrap(), Some(SELECTION_FAILURE));
    assert_eq!(*log.borrow(), vec!["prepare root []"]);
}

#[test]
fn test_invalid_selection_from_hand_built_args() {
    let log: Log = Rc::default();
    let tree = three_level_tree(&log);

    let args: ParsedArgs = [("action", json!("A")), ("A_action", json!("nonexistent"))]
        .into_iter()
        .collect();
    let mut context = ExecutionContext::new();

    assert_eq!(
        tree.execute(&args, &mut context).unwrap(),
        Some(SELECTION_FAILURE)
    );
}

#[test]
fn test_leaf_without_action_only_prepares() {
    let log: Log = Rc::default();
    let tree = three_level_tree(&log);

    let result = run(&tree, &["app", "A", "C"]).unwrap();

    assert_eq!(result, Some(NO_ACTION));
    assert_eq!(
        *log.borrow(),
        vec!["prepare root []", "prepare A [A]", "prepare C [A C]"]
    );
}

#[test]
fn test_action_error_propagates() {
    let tree = CommandWrapper::build(
        CommandNode::root().child(
            CommandNode::new("boom").action(|_, _| Err(anyhow::anyhow!("exploded"))),
        ),
    );

    let err = run(&tree, &["app", "boom"]).unwrap_err();
    assert_eq!(err.to_string(), "exploded");
}

#[test]
fn test_prepare_injects_state_for_leaf() {
    struct Session {
        user: String,
    }

    let tree = CommandWrapper::build(
        CommandNode::root()
            .prepare(|_, ctx| {
                ctx.context.extensions.insert(Session {
                    user: "alice".into(),
                });
                Ok(())
            })
            .child(CommandNode::new("whoami").action(|_, ctx| {
                let session = ctx.context.extensions.get_required::<Session>()?;
                Ok(Some(session.user.len() as i32))
            })),
    );

    assert_eq!(run(&tree, &["app", "whoami"]).unwrap(), Some(5));
}

#[test]
fn test_action_reads_root_through_wrapper() {
    let tree = CommandWrapper::build(
        CommandNode::root().child(
            CommandNode::new("outer").child(CommandNode::new("inner").action(|_, ctx| {
                let root = ctx.command.root();
                Ok(Some(root.children().len() as i32 + 10))
            })),
        ),
    );

    assert_eq!(run(&tree, &["app", "outer", "inner"]).unwrap(), Some(11));
}
