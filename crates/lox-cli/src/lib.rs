//! lox-cli: bibliothèque interne du binaire `lox`
//!
//! `main.rs` parse les arguments ; ici on garde tout ce qui est testable :
//! - exécution d'un fichier (source, assembleur texte ou image `.loxc`)
//! - REPL générique sur `BufRead`/`Write`
//! - dumps (jetons texte/JSON, désassemblage), émission atomique d'images
//! - codes de sortie sysexits (`exit::*`)
//! - logger (`feature = "trace"`) et couleurs (`feature = "color"`) optionnels

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs::{self, File},
    io::{self, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};

use lox_core::{
    asm::assemble,
    disasm::{disassemble, disassemble_full},
    helpers::validate_chunk,
    Chunk, OpCode,
};
use lox_lexer::{dump_tokens, tokenize};
use lox_vm::{InterpretResult, Vm, VmConfig};

#[cfg(feature = "color")]
use owo_colors::{OwoColorize, Stream, Style};

// ───────────────────────────── Codes de sortie ─────────────────────────────

/// Codes de sortie (sysexits.h).
pub mod exit {
    /// Succès.
    pub const OK: i32 = 0;
    /// Mauvaise utilisation de la ligne de commande.
    pub const USAGE: i32 = 64;
    /// Erreur de compilation (données d'entrée invalides).
    pub const DATAERR: i32 = 65;
    /// Erreur à l'exécution.
    pub const SOFTWARE: i32 = 70;
    /// Fichier illisible, écriture impossible.
    pub const IOERR: i32 = 74;
}

/// Message d'usage pour un nombre d'arguments invalide.
pub const USAGE: &str = "Usage: lox [script]";

/// Extension des images binaires de chunk.
pub const IMAGE_EXT: &str = "loxc";

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau ; le parsing CLI reste dans main.rs.
#[derive(Clone, Debug)]
pub enum Command {
    /// Boucle interactive.
    Repl(ReplTask),
    /// Exécution d'un fichier.
    Run(RunTask),
    /// Arguments invalides : afficher l'usage.
    Usage,
}

impl Command {
    /// Choisit la commande d'après les arguments positionnels (0 → REPL, 1 → fichier).
    pub fn from_args(mut args: Vec<PathBuf>, options: Options) -> Self {
        match args.len() {
            0 => Self::Repl(ReplTask { prompt: "> ".into(), options }),
            1 => Self::Run(RunTask { path: args.remove(0), options }),
            _ => Self::Usage,
        }
    }
}

/// Exécuter un fichier.
#[derive(Clone, Debug)]
pub struct RunTask {
    /// Chemin du script.
    pub path: PathBuf,
    /// Options communes.
    pub options: Options,
}

/// Lancer le REPL.
#[derive(Clone, Debug)]
pub struct ReplTask {
    /// Invite affichée avant chaque ligne.
    pub prompt: String,
    /// Options communes.
    pub options: Options,
}

/// Interprétation du texte d'entrée.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Source lox (scan seul tant qu'il n'y a pas de compilateur).
    #[default]
    Source,
    /// Assembleur texte (`CONSTANT 1.2`, `ADD`, …) exécuté sur la VM.
    Asm,
}

/// Dump des jetons avant exécution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenDump {
    /// Pas de dump.
    #[default]
    Off,
    /// Format lisible (ligne, genre, lexème).
    Text,
    /// Tableau JSON.
    Json,
}

/// Options partagées par le REPL et l'exécution de fichiers.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Traitement du texte d'entrée.
    pub mode: Mode,
    /// Dump des jetons.
    pub tokens: TokenDump,
    /// Désassembler chaque chunk avant de l'exécuter.
    pub disasm: bool,
    /// Listing détaillé (en-tête + table des constantes) avec `disasm`.
    pub verbose: bool,
    /// Trace d'exécution de la VM.
    pub trace: bool,
    /// Écrire l'image binaire du chunk à ce chemin.
    pub emit: Option<PathBuf>,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace` ; `trace_exec` ouvre la
/// cible `lox_vm::exec` au niveau trace.
pub fn init_logger(trace_exec: bool) {
    #[cfg(feature = "trace")]
    {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        if trace_exec {
            builder.filter_module("lox_vm::exec", log::LevelFilter::Trace);
        }
        let _ = builder.format_timestamp(None).format_target(false).try_init();
    }
    #[cfg(not(feature = "trace"))]
    let _ = trace_exec;
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande sur les flux standards. Retourne un code de sortie.
pub fn execute(cmd: Command) -> Result<i32> {
    match cmd {
        Command::Usage => {
            eprintln!("{USAGE}");
            Ok(exit::USAGE)
        }
        Command::Run(task) => run_file(&task.path, &task.options, io::stdout().lock(), io::stderr().lock()),
        Command::Repl(task) => {
            repl(io::stdin().lock(), io::stdout().lock(), io::stderr().lock(), &task.prompt, &task.options)
        }
    }
}

/// Exécute le fichier `path` ; résultats sur `out`, diagnostics sur `err`.
pub fn run_file<O: Write, E: Write>(path: &Path, options: &Options, out: O, err: E) -> Result<i32> {
    let mut session = Session::new(options, out, err);

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            writeln!(session.err, "Could not read file \"{}\": {e}", display(path))?;
            return Ok(exit::IOERR);
        }
    };
    let name = path.file_stem().map_or_else(|| "script".into(), |s| s.to_string_lossy().into_owned());

    let outcome = if path.extension().is_some_and(|ext| ext == IMAGE_EXT) {
        match load_image(&bytes) {
            Ok(chunk) => {
                status_info(&mut session.err, "load", &format!("{} ({} bytes)", display(path), bytes.len()))?;
                session.run_chunk(&chunk, &name)?
            }
            Err(e) => {
                writeln!(session.err, "{}: {e}", display(path))?;
                InterpretResult::CompileError
            }
        }
    } else {
        let text = String::from_utf8_lossy(&bytes);
        session.run_text(&text, &name)?
    };
    Ok(outcome.exit_code())
}

/// Décode une image `.loxc` et rejette les chunks incohérents avant exécution.
fn load_image(bytes: &[u8]) -> Result<Chunk> {
    let chunk = Chunk::from_bytes(bytes)?;
    validate_chunk(&chunk)?;
    Ok(chunk)
}

/// Boucle interactive : une ligne → un appel. S'arrête en fin d'entrée.
///
/// Les octets sont décodés en UTF-8 avec remplacement, comme pour les fichiers.
/// En mode assembleur, les lignes s'accumulent jusqu'à une instruction `RETURN` ;
/// un reste non terminé est exécuté en fin d'entrée.
pub fn repl<R: BufRead, O: Write, E: Write>(
    mut input: R,
    out: O,
    err: E,
    prompt: &str,
    options: &Options,
) -> Result<i32> {
    let mut session = Session::new(options, out, err);
    let mut buf = Vec::new();
    let mut pending = String::new();

    loop {
        write!(session.out(), "{prompt}")?;
        session.out().flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        match options.mode {
            Mode::Source => {
                session.run_text(&line, "repl")?;
            }
            Mode::Asm => {
                pending.push_str(&line);
                if ends_with_return(&line) {
                    session.run_text(&pending, "repl")?;
                    pending.clear();
                }
            }
        }
    }
    if pending.lines().any(|l| !l.split(';').next().unwrap_or_default().trim().is_empty()) {
        session.run_text(&pending, "repl")?;
    }
    Ok(exit::OK)
}

fn ends_with_return(line: &str) -> bool {
    let code = line.split(';').next().unwrap_or_default();
    code.split_whitespace().next().and_then(OpCode::from_mnemonic) == Some(OpCode::Return)
}

// ───────────────────────────── Session ─────────────────────────────

/// VM + flux d'erreurs + options, pour un fichier ou toute une session REPL.
struct Session<'o, O: Write, E: Write> {
    vm: Vm<O>,
    err: E,
    options: &'o Options,
}

impl<'o, O: Write, E: Write> Session<'o, O, E> {
    fn new(options: &'o Options, out: O, err: E) -> Self {
        let config = VmConfig::default().with_trace(options.trace);
        Self { vm: Vm::with_output(config, out), err, options }
    }

    fn out(&mut self) -> &mut O { self.vm.output_mut() }

    fn run_text(&mut self, text: &str, name: &str) -> Result<InterpretResult> {
        self.dump_tokens(text)?;
        match self.options.mode {
            Mode::Source => {
                if self.options.emit.is_some() {
                    writeln!(self.err, "warning: --emit ignored, lox source produces no chunk yet")?;
                }
                let outcome = self.vm.interpret_source(text);
                self.report()?;
                Ok(outcome)
            }
            Mode::Asm => match assemble(text) {
                Ok(chunk) => self.run_chunk(&chunk, name),
                Err(e) => {
                    writeln!(self.err, "{e}")?;
                    Ok(InterpretResult::CompileError)
                }
            },
        }
    }

    fn run_chunk(&mut self, chunk: &Chunk, name: &str) -> Result<InterpretResult> {
        if let Some(path) = &self.options.emit {
            let image = chunk.to_bytes();
            write_bytes_atomic(path, &image)?;
            status_ok(&mut self.err, "emit", &format!("{} ({} bytes)", display(path), image.len()))?;
        }
        if self.options.disasm {
            let listing =
                if self.options.verbose { disassemble_full(chunk, name) } else { disassemble(chunk, name) };
            self.out().write_all(listing.as_bytes())?;
        }
        let outcome = self.vm.interpret(chunk);
        self.report()?;
        Ok(outcome)
    }

    fn dump_tokens(&mut self, text: &str) -> Result<()> {
        match self.options.tokens {
            TokenDump::Off => {}
            TokenDump::Text => {
                let dump = dump_tokens(text);
                self.out().write_all(dump.as_bytes())?;
            }
            TokenDump::Json => {
                let json = serde_json::to_string_pretty(&tokenize(text))?;
                writeln!(self.out(), "{json}")?;
            }
        }
        Ok(())
    }

    fn report(&mut self) -> Result<()> {
        if let Some(e) = self.vm.last_error() {
            writeln!(self.err, "{e}")?;
        }
        Ok(())
    }
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

/// Écrit `bytes` dans un fichier temporaire voisin puis le renomme sur `path`.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let base = path.file_name().ok_or_else(|| anyhow!("chemin de sortie sans nom: {}", display(path)))?;
    let tmp = unique_tmp_path(parent, base);
    {
        let mut w = BufWriter::new(
            File::create(&tmp).with_context(|| format!("création: {}", display(&tmp)))?,
        );
        w.write_all(bytes)?;
        w.flush()?;
    }
    if path.exists() {
        // Windows : rename sur cible existante peut échouer
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).or_else(|_| {
        fs::copy(&tmp, path).map(|_| ()).and_then(|()| fs::remove_file(&tmp))
    })?;
    Ok(())
}

fn unique_tmp_path(dir: &Path, base: &std::ffi::OsStr) -> PathBuf {
    let mut i = 0u32;
    loop {
        let candidate = dir.join(format!("{}.tmp{i}", base.to_string_lossy()));
        if !candidate.exists() {
            return candidate;
        }
        i = i.wrapping_add(1);
    }
}

fn display(p: &Path) -> String { p.to_string_lossy().into_owned() }

// ───────────────────────────── Sorties jolies ─────────────────────────────

fn status_ok(w: &mut impl Write, tag: &str, msg: &str) -> io::Result<()> {
    #[cfg(feature = "color")]
    {
        writeln!(w, "{} {msg}", tag.if_supports_color(Stream::Stderr, |t| t.style(Style::new().green().bold())))
    }
    #[cfg(not(feature = "color"))]
    {
        writeln!(w, "{tag} {msg}")
    }
}

fn status_info(w: &mut impl Write, tag: &str, msg: &str) -> io::Result<()> {
    #[cfg(feature = "color")]
    {
        writeln!(w, "{} {msg}", tag.if_supports_color(Stream::Stderr, |t| t.style(Style::new().blue().bold())))
    }
    #[cfg(not(feature = "color"))]
    {
        writeln!(w, "{tag} {msg}")
    }
}

// ───────────────────────────── Tests ─────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_repl(input: &str, options: &Options) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = repl(input.as_bytes(), &mut out, &mut err, "> ", options).unwrap();
        (code, String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn argument_count_selects_command() {
        assert!(matches!(Command::from_args(vec![], Options::default()), Command::Repl(t) if t.prompt == "> "));
        assert!(matches!(
            Command::from_args(vec!["a.lox".into()], Options::default()),
            Command::Run(t) if t.path == Path::new("a.lox")
        ));
        assert!(matches!(Command::from_args(vec!["a".into(), "b".into()], Options::default()), Command::Usage));
    }

    #[test]
    fn repl_reports_lex_errors_and_keeps_going() {
        let (code, out, err) = run_repl("var x = 1;\n\"open\nprint x;\n", &Options::default());
        assert_eq!(code, exit::OK);
        assert_eq!(out, "> > > > ");
        assert_eq!(err, "[line 1] Error: Unterminated string.\n");
    }

    #[test]
    fn repl_in_asm_mode_runs_on_return() {
        let options = Options { mode: Mode::Asm, ..Options::default() };
        let (_, out, err) = run_repl("CONSTANT 2\nNEGATE\nreturn ; done\nRETURN\n", &options);
        assert_eq!(out, "> > > -2\n> > ");
        assert_eq!(err, "Stack underflow.\n[line 1] in script\n");
    }

    #[test]
    fn repl_decodes_invalid_utf8_lossily() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = repl(&b"1;\n\xE9\n3;\n"[..], &mut out, &mut err, "> ", &Options::default()).unwrap();
        assert_eq!(code, exit::OK);
        assert_eq!(String::from_utf8(out).unwrap(), "> > > > ");
        assert_eq!(String::from_utf8(err).unwrap(), "[line 1] Error: Unexpected character.\n");
    }

    #[test]
    fn repl_runs_unterminated_asm_at_end_of_input() {
        let options = Options { mode: Mode::Asm, ..Options::default() };
        let (code, out, err) = run_repl("CONSTANT 1\nNEGATE\n", &options);
        assert_eq!(code, exit::OK);
        assert_eq!(out, "> > > ");
        assert_eq!(err, "Unexpected end of bytecode.\n[line 2] in script\n");

        let (_, _, err) = run_repl("CONSTANT 1\nRETURN\n; fin\n", &options);
        assert_eq!(err, "");
    }

    #[test]
    fn return_detection_ignores_comments() {
        assert!(ends_with_return("  OP_RETURN ; bye\n"));
        assert!(!ends_with_return("; RETURN\n"));
        assert!(!ends_with_return("ADD\n"));
    }

    #[test]
    fn token_dump_precedes_scan() {
        let options = Options { tokens: TokenDump::Text, ..Options::default() };
        let (_, out, _) = run_repl("1;\n", &options);
        assert_eq!(out, ">    1 NUMBER        '1'\n   | SEMICOLON     ';'\n   2 EOF           ''\n> ");
    }
}
