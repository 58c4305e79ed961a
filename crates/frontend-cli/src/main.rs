//! Glottisdale frontend CLI — run the phonetic realization pipeline over a token notation file.

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use glottisdale_frontend::{run_all, PackSet, PassContext, TokenFrame};

#[derive(Parser)]
#[command(
    name = "glottisdale-frontend",
    about = "Realize a phoneme token stream into formant synthesis frames",
    version,
)]
struct Cli {
    /// Token-stream notation file (see tokenbuild grammar); reads stdin if omitted
    input: Option<PathBuf>,

    /// Language/phoneme pack YAML
    #[arg(long)]
    pack: PathBuf,

    /// Global speed factor (1.0 = normal rate)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Base pitch in Hz
    #[arg(long, default_value_t = 120.0)]
    base_pitch: f64,

    /// Sentence-level inflection, -1.0 (falling) to 1.0 (rising)
    #[arg(long, default_value_t = 0.0)]
    inflection: f64,

    /// Clause type: '.', '?', or ','
    #[arg(long, default_value_t = '.')]
    clause_type: char,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let notation = read_input(cli.input.as_deref())?;

    let pack = PackSet::from_yaml_file(&cli.pack)
        .with_context(|| format!("loading pack: {}", cli.pack.display()))?;

    let mut tokens = glottisdale_frontend::tokenbuild::parse(&notation, &pack)
        .context("parsing token notation")?;
    log::info!("Parsed {} token(s)", tokens.len());

    let mut ctx = PassContext::new(
        std::sync::Arc::new(pack),
        cli.speed,
        cli.base_pitch,
        cli.inflection,
        cli.clause_type,
    );
    run_all(&mut ctx, &mut tokens).context("running pipeline")?;

    let frames: Vec<TokenFrame> = tokens.iter().map(TokenFrame::resolve).collect();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&frames)
    } else {
        serde_json::to_string(&frames)
    }
    .context("serializing frames")?;
    println!("{json}");

    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("reading input: {}", p.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            if buf.trim().is_empty() {
                bail!("no input notation given (pass a file or pipe notation via stdin)");
            }
            Ok(buf)
        }
    }
}
