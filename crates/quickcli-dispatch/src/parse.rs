//! Flattening clap matches into [`ParsedArgs`].
//!
//! clap nests matches per subcommand and reports the selected subcommand by
//! name. The command tree instead reads one flat map: each level's arguments
//! under their ids, plus the selected child under the level's destination
//! key. [`collect_args`] walks the wrapper tree, the clap command tree and
//! the matches in lock-step to produce that map.

use clap::{ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::ffi::OsString;

use crate::args::ParsedArgs;
use crate::tree::CommandWrapper;

/// Parses `argv` with `command` and flattens the result.
///
/// `command` must have been configured by `tree`
/// ([`CommandWrapper::configure_parser`]). clap errors, including the
/// `--help`/`--version` early exits, are returned untouched.
pub fn parse_from<I, T>(
    tree: &CommandWrapper,
    command: &mut Command,
    argv: I,
) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command.try_get_matches_from_mut(argv)?;
    Ok(collect_args(tree, command, &matches))
}

/// Flattens `matches` for the tree rooted at `tree` into a [`ParsedArgs`].
pub fn collect_args(
    tree: &CommandWrapper,
    command: &Command,
    matches: &ArgMatches,
) -> ParsedArgs {
    let mut args = ParsedArgs::new();
    collect_level(tree, command, matches, &mut args);
    args
}

fn collect_level(
    wrapper: &CommandWrapper,
    command: &Command,
    matches: &ArgMatches,
    out: &mut ParsedArgs,
) {
    for arg in command.get_arguments() {
        let id = arg.get_id().as_str();
        if let Some(value) = arg_value(arg.get_action(), id, matches) {
            out.insert(id, value);
        }
    }

    let Some((name, sub_matches)) = matches.subcommand() else {
        return;
    };
    out.insert(wrapper.destination_key(), name);

    let child = wrapper.resolve(name);
    let sub_command = command.find_subcommand(name);
    if let (Some(child), Some(sub_command)) = (child, sub_command) {
        collect_level(child, sub_command, sub_matches, out);
    }
}

fn arg_value(action: &ArgAction, id: &str, matches: &ArgMatches) -> Option<Value> {
    match action {
        ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version => None,
        ArgAction::SetTrue | ArgAction::SetFalse => match matches.try_get_one::<bool>(id) {
            Ok(Some(flag)) => Some(Value::Bool(*flag)),
            _ => Some(raw_value(id, matches)),
        },
        ArgAction::Count => match matches.try_get_one::<u8>(id) {
            Ok(Some(count)) => Some(Value::from(*count)),
            _ => Some(Value::from(0)),
        },
        ArgAction::Append => Some(match raw_strings(id, matches) {
            Some(values) => Value::Array(values.into_iter().map(Value::String).collect()),
            None => Value::Null,
        }),
        _ => Some(raw_value(id, matches)),
    }
}

fn raw_value(id: &str, matches: &ArgMatches) -> Value {
    match raw_strings(id, matches) {
        Some(mut values) => match values.pop() {
            Some(last) => Value::String(last),
            None => Value::Null,
        },
        None => Value::Null,
    }
}

fn raw_strings(id: &str, matches: &ArgMatches) -> Option<Vec<String>> {
    let raw = matches.try_get_raw(id).ok().flatten()?;
    Some(raw.map(|v| v.to_string_lossy().into_owned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::CommandNode;
    use clap::Arg;
    use serde_json::json;
    use std::rc::Rc;

    fn tree() -> Rc<CommandWrapper> {
        CommandWrapper::build(
            CommandNode::root()
                .arg(Arg::new("verbosity").short('v').action(ArgAction::Count))
                .children([
                    CommandNode::new("one")
                        .aliases(["1", "o"])
                        .arg(Arg::new("config").short('c'))
                        .arg(Arg::new("test").long("test").action(ArgAction::SetTrue))
                        .children([CommandNode::new("uno"), CommandNode::new("dos")]),
                    CommandNode::new("two")
                        .arg(Arg::new("tag").long("tag").action(ArgAction::Append)),
                ]),
        )
    }

    fn parse(argv: &[&str]) -> Result<ParsedArgs, clap::Error> {
        let tree = tree();
        let mut command = tree.configure_parser(Command::new("app"));
        parse_from(&tree, &mut command, argv)
    }

    #[test]
    fn test_nested_selection_is_flat() {
        let args = parse(&["app", "-vv", "one", "-c", "cfg.toml", "--test", "dos"]).unwrap();

        assert_eq!(args.get_i64("verbosity"), Some(2));
        assert_eq!(args.get_str("action"), Some("one"));
        assert_eq!(args.get_str("config"), Some("cfg.toml"));
        assert_eq!(args.get_bool("test"), Some(true));
        assert_eq!(args.get_str("one_action"), Some("dos"));
    }

    #[test]
    fn test_alias_reports_primary_name() {
        let args = parse(&["app", "o", "uno"]).unwrap();
        assert_eq!(args.get_str("action"), Some("one"));
        assert_eq!(args.get_str("one_action"), Some("uno"));
    }

    #[test]
    fn test_absent_values() {
        let args = parse(&["app", "one"]).unwrap();
        assert_eq!(args.get("config"), Some(&Value::Null));
        assert_eq!(args.get_bool("test"), Some(false));
        assert_eq!(args.get_i64("verbosity"), Some(0));
        assert!(!args.contains("one_action"));
    }

    #[test]
    fn test_missing_top_level_selection() {
        let args = parse(&["app"]).unwrap();
        assert!(!args.contains("action"));
        assert!(!args.contains("config"));
    }

    #[test]
    fn test_appended_values() {
        let args = parse(&["app", "two", "--tag", "a", "--tag", "b"]).unwrap();
        assert_eq!(args.get("tag"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_unknown_flag_is_clap_error() {
        let err = parse(&["app", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_is_skipped_and_reported_by_clap() {
        let err = parse(&["app", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
