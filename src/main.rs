use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bash_ast::dump::{load_tree, snapshot_diff};
use bash_ast::{Config, RedirectInstruction};
use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

#[derive(Parser)]
#[command(name = "bash-ast")]
#[command(about = "Inspect serialized bash command trees")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print the rendered form of a tree (.json, .yaml or .toml)
    Render { tree: PathBuf },
    /// Check the structural invariants of a tree
    Validate { tree: PathBuf },
    /// Compare a tree's rendering against a stored snapshot
    Diff { snapshot: PathBuf, tree: PathBuf },
    /// Print the predicates of a redirect instruction as JSON
    Classify { instruction: String },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // A second init only fails if a logger is already installed.
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn run(cli: Cli) -> Result<ExitCode, bash_ast::Error> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Action::Render { tree } => {
            let tree = load_tree(&tree)?;
            print!("{}", tree.render_with(&config.render));
            Ok(ExitCode::SUCCESS)
        }
        Action::Validate { tree: path } => {
            let tree = load_tree(&path)?;
            let checked = tree.validate().and_then(|()| {
                tree.check_redirects(&config.redirect, |r| {
                    r.redirectee
                        .filename()
                        .is_some_and(|w| Path::new(&w.text).exists())
                })
            });
            match checked {
                Ok(()) => {
                    log::info!("{}: ok", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    Ok(ExitCode::from(1))
                }
            }
        }
        Action::Diff { snapshot, tree } => {
            let expected = std::fs::read_to_string(&snapshot).map_err(|source| {
                bash_ast::Error::Io {
                    path: snapshot.display().to_string(),
                    source,
                }
            })?;
            let actual = load_tree(&tree)?.render_with(&config.render);
            let expected_name = snapshot.display().to_string();
            let actual_name = tree.display().to_string();
            match snapshot_diff(&expected_name, &actual_name, &expected, &actual) {
                None => Ok(ExitCode::SUCCESS),
                Some(diff) => {
                    print!("{}", diff);
                    Ok(ExitCode::from(1))
                }
            }
        }
        Action::Classify { instruction } => match instruction.parse::<RedirectInstruction>() {
            Ok(ri) => {
                println!("{}", serde_json::to_string(&ri.classify())?);
                Ok(ExitCode::SUCCESS)
            }
            Err(msg) => {
                eprintln!("bash-ast: {}", msg);
                Ok(ExitCode::from(2))
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("bash-ast: {}", e);
            ExitCode::from(2)
        }
    }
}
