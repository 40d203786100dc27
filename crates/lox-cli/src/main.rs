//! `lox` : binaire principal
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `lox_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};

use lox_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "lox", version, about = "lox : REPL, exécution de scripts et de chunks de bytecode", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Traite l'entrée comme de l'assembleur texte exécuté sur la VM
    #[arg(long)]
    asm: bool,

    /// Écrit l'image binaire (.loxc) du chunk avant exécution
    #[arg(long, value_name = "PATH")]
    emit: Option<PathBuf>,

    /// Affiche le désassemblage de chaque chunk
    #[arg(long)]
    disasm: bool,

    /// Affiche les jetons (texte par défaut, ou json)
    #[arg(long, value_enum, num_args = 0..=1, require_equals = true, default_missing_value = "text")]
    tokens: Option<TokensFormat>,

    /// Trace chaque instruction exécutée (pile + instruction)
    #[arg(long)]
    trace: bool,

    /// Script à exécuter ; sans argument, lance le REPL
    #[arg(value_name = "script")]
    args: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TokensFormat {
    Text,
    Json,
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool, trace: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()));
    cli::init_logger(trace);
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte le TTY ; on force via les variables usuelles.
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        }
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        }
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code(cli::exit::IOERR)
        }
    }
}

fn exit_code(code: i32) -> ExitCode { ExitCode::from(u8::try_from(code).unwrap_or(1)) }

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet, opt.trace);

    let options = cli::Options {
        mode: if opt.asm { cli::Mode::Asm } else { cli::Mode::Source },
        tokens: match opt.tokens {
            None => cli::TokenDump::Off,
            Some(TokensFormat::Text) => cli::TokenDump::Text,
            Some(TokensFormat::Json) => cli::TokenDump::Json,
        },
        disasm: opt.disasm,
        verbose: opt.verbose > 0,
        trace: opt.trace,
        emit: opt.emit,
    };

    cli::execute(cli::Command::from_args(opt.args, options))
}
