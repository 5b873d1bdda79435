//! Purpose: `atomite` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs the server or utility commands.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
//! Invariants: All inventory mutations go through `core::bank::Bank`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::json;

use atomite::core::catalog::{Catalog, RecipeRecord};
use atomite::core::error::{Error, ErrorKind, to_exit_code};
use atomite::core::inventory::DEFAULT_CEILING;

mod serve;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(err.to_string().trim_end().to_string()));
            }
        },
    };

    match cli.command {
        Command::Serve(args) => {
            let config = serve_config_from_args(args)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to start async runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
        Command::Recipes(args) => {
            let catalog = load_catalog(args.recipes.as_deref())?;
            if args.json || !io::stdout().is_terminal() {
                emit_recipes_json(&catalog);
            } else {
                emit_recipes_human(&catalog);
            }
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "atomite", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

#[derive(Parser)]
#[command(
    name = "atomite",
    version,
    about = "Concurrent atom bank serving molecule synthesis",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"One shared inventory of carbon, hydrogen, and oxygen units, mutated by
line commands over TCP sessions, UDP datagrams, and the local console.

Mental model:
  - `ADD <KIND> <n>` banks atoms (any channel)
  - `DELIVER <molecule> [n]` spends them (any channel)
  - `GEN <molecule> [n]` spends them and reports what is still producible
    (console only)
"#,
    after_help = r#"EXAMPLES
  $ atomite serve --tcp-bind 0.0.0.0:8080 --udp-bind 0.0.0.0:8081
  $ printf 'ADD CARBON 10\r\n' | nc localhost 8080
  $ printf 'DELIVER CARBON DIOXIDE 3\r\n' | nc -u localhost 8081
  # in the server terminal: GEN WATER 2

LEARN MORE
  $ atomite recipes
  $ atomite <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the atom bank (TCP sessions, UDP datagrams, console)
    Serve(ServeArgs),
    /// Print the active recipe catalog
    Recipes(RecipesArgs),
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(
        long,
        default_value = "0.0.0.0:8080",
        help = "TCP listener address for stream sessions"
    )]
    tcp_bind: String,
    #[arg(
        long,
        default_value = "0.0.0.0:8081",
        help = "UDP socket address for datagram requests"
    )]
    udp_bind: String,
    #[arg(
        long,
        default_value_t = DEFAULT_CEILING,
        help = "Upper bound for each atom counter"
    )]
    ceiling: u64,
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        help = "JSON recipes file replacing the built-in catalog"
    )]
    recipes: Option<PathBuf>,
    #[arg(long, help = "Do not read commands from stdin")]
    no_console: bool,
}

#[derive(Args)]
struct RecipesArgs {
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        help = "JSON recipes file replacing the built-in catalog"
    )]
    recipes: Option<PathBuf>,
    #[arg(long, help = "Emit JSON even on a terminal")]
    json: bool,
}

fn serve_config_from_args(args: ServeArgs) -> Result<serve::ServeConfig, Error> {
    Ok(serve::ServeConfig {
        tcp_bind: parse_bind(&args.tcp_bind, "--tcp-bind")?,
        udp_bind: parse_bind(&args.udp_bind, "--udp-bind")?,
        ceiling: args.ceiling,
        recipes: args.recipes,
        console: !args.no_console,
    })
}

fn parse_bind(value: &str, flag: &str) -> Result<SocketAddr, Error> {
    value.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid {flag} address {value:?}"))
            .with_hint("Use a host:port value like 0.0.0.0:8080.")
    })
}

fn load_catalog(recipes: Option<&std::path::Path>) -> Result<Catalog, Error> {
    match recipes {
        Some(path) => Catalog::from_json_file(path),
        None => Ok(Catalog::builtin()),
    }
}

fn emit_recipes_json(catalog: &Catalog) {
    let records: Vec<RecipeRecord> = catalog
        .iter()
        .map(|(name, recipe)| RecipeRecord {
            name: name.to_string(),
            carbon: recipe.carbon,
            hydrogen: recipe.hydrogen,
            oxygen: recipe.oxygen,
        })
        .collect();
    println!("{}", json!({ "recipes": records }));
}

fn emit_recipes_human(catalog: &Catalog) {
    let width = catalog
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    println!("{:<width$}  CARBON  HYDROGEN  OXYGEN", "NAME");
    for (name, recipe) in catalog.iter() {
        println!(
            "{:<width$}  {:>6}  {:>8}  {:>6}",
            name, recipe.carbon, recipe.hydrogen, recipe.oxygen
        );
    }
}

fn emit_error(err: &Error) {
    let mut body = json!({
        "kind": format!("{:?}", err.kind()),
        "message": err.message().unwrap_or("error"),
    });
    if let Some(hint) = err.hint() {
        body["hint"] = json!(hint);
    }
    if let Some(source) = std::error::Error::source(err) {
        body["cause"] = json!(source.to_string());
    }
    eprintln!("{}", json!({ "error": body }));
}
