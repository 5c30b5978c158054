//! `myapp`: a small quickcli application.
//!
//! ```text
//! myapp [-v...] one [-c CONFIG] [--test] {uno,dos}
//! myapp [-v...] two [NAME]
//! myapp [-v...] status
//! ```
//!
//! Try `myapp -vvv 1 --test dos`, `myapp t Ada` or `myapp one` (which
//! reports the missing second-tier action).

use clap::{Arg, ArgAction};
use quickcli::{
    app_info, to_exit_code, ActionResult, App, CommandContext, CommandHandler, CommandNode,
    ParsedArgs,
};
use std::process::ExitCode;

const EPILOG: &str = "
That is all that we can show right now

Have fun!
";

/// Builds an action that prints `msg` along with the configured path.
fn say(msg: &'static str) -> impl Fn(&ParsedArgs, &mut CommandContext<'_>) -> ActionResult {
    move |args, ctx| {
        println!("MSG: {}", msg);
        if let Some(config) = args.get_str("config") {
            println!("  config: {}", config);
        }
        println!("  test: {}", args.get_bool("test").unwrap_or(false));
        println!("  path: {}", ctx.command.path());
        Ok(None)
    }
}

/// Greets someone and counts greetings in the context.
struct Greet;

impl CommandHandler for Greet {
    fn configure(&self, command: clap::Command) -> clap::Command {
        command.arg(
            Arg::new("name")
                .default_value("world")
                .help("Who to greet"),
        )
    }

    fn prepare(&self, _args: &ParsedArgs, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        ctx.context.set_default("greetings", 0);
        Ok(())
    }

    fn run(&self, args: &ParsedArgs, ctx: &mut CommandContext<'_>) -> ActionResult {
        let name = args.get_str("name").unwrap_or("world");
        let greeting = ctx.context.lookup("greeting")?.as_str().unwrap_or("Hello");
        println!("{}, {}!", greeting, name);

        let count = ctx
            .context
            .get("greetings")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        ctx.context.set("greetings", count + 1);
        Ok(None)
    }

    fn description(&self) -> Option<String> {
        Some("Say hello".into())
    }
}

fn commands() -> CommandNode {
    CommandNode::root()
        .group_title("commands")
        .group_description("Available Commands")
        .prepare(|_, _| {
            tracing::debug!("preparing application");
            Ok(())
        })
        .children([
            CommandNode::new("one")
                .aliases(["1", "o"])
                .about("Work with the second tier")
                .group_description("Second Tier Actions")
                .arg(Arg::new("config").short('c').help("Config file"))
                .arg(
                    Arg::new("test")
                        .long("test")
                        .action(ArgAction::SetTrue)
                        .help("test flag"),
                )
                .prepare(|args, _| {
                    tracing::info!(config = ?args.get_str("config"), "preparing one");
                    Ok(())
                })
                .children([
                    CommandNode::new("uno").action(say("uno")),
                    CommandNode::new("dos").action(say("dos")),
                ]),
            CommandNode::handler("two", Greet).aliases(["2", "t"]),
            CommandNode::new("status")
                .doc("Show the parsed arguments\n\nPrints verbosity and the full argument map.")
                .action(|_, ctx| {
                    let args = ctx.context.lookup("args")?;
                    println!(
                        "Verbosity: {}",
                        args.get("verbosity").cloned().unwrap_or_default()
                    );
                    println!("args: {}", args);
                    Ok(None)
                }),
        ])
}

fn main() -> ExitCode {
    let info = app_info!()
        .short_description("My Sample App")
        .organization("Legrig Universal")
        .create_date("2019-08-11")
        .build_date("2019-08-14")
        .epilog(EPILOG);

    let app = App::builder(commands())
        .info(info)
        .logging(true)
        .debug(true)
        .context_value("greeting", "Hello")
        .pre_execute(|ctx| {
            tracing::debug!(context = %ctx, "about to execute");
            Ok(())
        })
        .build();

    match app {
        Ok(mut app) => to_exit_code(app.run_env()),
        Err(err) => {
            eprintln!("myapp: {}", err);
            ExitCode::FAILURE
        }
    }
}
