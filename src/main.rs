use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::info;
use memmap2::Mmap;

use lox_treewalk as lox;

use lox::ast::Stmt;
use lox::ast_printer::AstPrinter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// With no subcommand, starts the interactive prompt.
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scans a file and prints each token
    Tokenize {
        filename: PathBuf,

        /// Dump the token stream as JSON instead of the text format
        #[arg(long)]
        json: bool,
    },

    /// Parses a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },
}

/// A script's source bytes: memory‑mapped when possible, owned otherwise
/// (zero‑length files cannot be mapped).
enum SourceBuf {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl SourceBuf {
    fn as_bytes(&self) -> &[u8] {
        match self {
            SourceBuf::Mapped(map) => map,
            SourceBuf::Owned(buf) => buf,
        }
    }
}

fn read_source(filename: &Path) -> Result<SourceBuf> {
    info!("Reading source file: {:?}", filename);

    let file: File =
        File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len: u64 = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        return Ok(SourceBuf::Owned(Vec::new()));
    }

    // SAFETY: the map is read-only and the script file is not expected to
    // be mutated while the interpreter runs over it.
    let map: Mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", map.len(), filename);

    Ok(SourceBuf::Mapped(map))
}

fn init_logger() -> Result<()> {
    let log_file: File = File::create("app.log").context("Failed to create app.log")?;

    // Write to file with the crate prefix stripped from module paths.
    Builder::new()
        .format(|buf, record| {
            let module: &str = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("lox_treewalk::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source: SourceBuf = read_source(filename)?;

    let (tokens, errors) = scanner::scan_tokens(source.as_bytes());

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    for e in &errors {
        eprintln!("{}", e);
    }

    if !errors.is_empty() {
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source: SourceBuf = read_source(filename)?;

    let (tokens, errors) = scanner::scan_tokens(source.as_bytes());

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }

        std::process::exit(65);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => println!("{}", AstPrinter::print(&expr)),

        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(65);
        }
    }

    Ok(())
}

fn evaluate(filename: &Path) -> Result<()> {
    let source: SourceBuf = read_source(filename)?;

    let (tokens, errors) = scanner::scan_tokens(source.as_bytes());

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }

        std::process::exit(65);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,

        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(65);
        }
    };

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate_expression(&expr) {
        Ok(value) => println!("{}", value),

        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(70);
        }
    }

    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    let source: SourceBuf = read_source(filename)?;

    let (tokens, lex_errors) = scanner::scan_tokens(source.as_bytes());

    for e in &lex_errors {
        eprintln!("{}", e);
    }

    let (statements, parse_errors) = Parser::new(&tokens).parse();

    for e in &parse_errors {
        eprintln!("{}", e);
    }

    // All lexical and syntax diagnostics are shown; none of the program
    // runs if any were found.
    if !lex_errors.is_empty() || !parse_errors.is_empty() {
        std::process::exit(65);
    }

    info!("Parsed {} statements", statements.len());

    let mut interpreter = Interpreter::new();

    if let Err(e) = interpreter.interpret(&statements) {
        eprintln!("{}", e);
        std::process::exit(70);
    }

    Ok(())
}

/// The interactive prompt.  Interpreter state (globals, closures) persists
/// across lines; error state resets per line.
fn run_prompt() -> Result<()> {
    let mut interpreter: Interpreter<'static> = Interpreter::new();

    let stdin: io::Stdin = io::stdin();
    let mut handle: io::StdinLock<'_> = stdin.lock();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line: String = String::new();

        if handle.read_line(&mut line)? == 0 {
            break; // EOF
        }

        // Promote the line and its tokens to 'static: a closure defined on
        // this line may be called on a later one, and it borrows lexemes
        // from this buffer.
        let src: &'static [u8] = Box::leak(line.into_bytes().into_boxed_slice());

        let (tokens, lex_errors) = scanner::scan_tokens(src);

        for e in &lex_errors {
            eprintln!("{}", e);
        }

        let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());

        let (statements, parse_errors): (Vec<Stmt<'static>>, _) = Parser::new(tokens).parse();

        for e in &parse_errors {
            eprintln!("{}", e);
        }

        if !lex_errors.is_empty() || !parse_errors.is_empty() {
            continue;
        }

        if let Err(e) = interpreter.interpret(&statements) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        // Minimal logger so log macros have a sink.
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json)?,

        Some(Commands::Parse { filename }) => parse(&filename)?,

        Some(Commands::Evaluate { filename }) => evaluate(&filename)?,

        Some(Commands::Run { filename }) => run_file(&filename)?,

        None => run_prompt()?,
    }

    Ok(())
}
