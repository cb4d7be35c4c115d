use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tiler::command::{Outcome, Session};
use tiler::common::config::Config;
use tiler::common::log;
use tiler::layout_engine::{Resolution, Tree};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tiler")]
#[command(about = "Drive a tiling tree with line-oriented commands read from stdin")]
struct Cli {
    /// Config file to use instead of ~/.tiler.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Screen width, overriding the config.
    #[arg(long)]
    width: Option<u32>,

    /// Screen height, overriding the config.
    #[arg(long)]
    height: Option<u32>,

    /// Validate the tree after every command and log any violation.
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init_logging()?;

    let config = Config::load(cli.config.as_deref())?;
    let screen = &config.settings.screen;
    let resolution = Resolution::new(
        cli.width.unwrap_or(screen.width),
        cli.height.unwrap_or(screen.height),
    );
    let tiling = config.settings.tiling.clone();
    info!(?resolution, "starting");
    let session = Session::new(Tree::with_settings(resolution, tiling), &config.settings.tiling);

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    for line in stdin.lines() {
        let line = line?;
        let outcome = match session.handle_line(&line) {
            Some(outcome) => outcome,
            None => continue,
        };
        if cli.check {
            if let Err(violation) = session.tree().validate() {
                error!(%violation, command = line, "tree invariant violated");
            }
        }
        match outcome {
            Outcome::Reply(reply) => writeln!(stdout, "{reply}")?,
            Outcome::Quit(reply) => {
                writeln!(stdout, "{reply}")?;
                break;
            }
        }
        stdout.flush()?;
    }

    Ok(())
}
