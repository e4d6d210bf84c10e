/// Table Shell — interactive front end for expanding tables and rolling dice.
///
/// Usage: table_shell [--tables <path>]... [--config <file>] [--seed <n>]
///
/// Commands:
///   table <name>         — expand a table (or dice/range/literal)
///   text <template>      — substitute [references] in free text
///   roll <dice>          — roll a dice spec with its breakdown
///   range <spec>         — roll a range spec with its breakdown
///   choose <a, b, c>     — pick one item from a comma-separated list
///   list                 — list top-level tables
///   dice                 — list custom dice
///   load <path>          — load another table file
///   seed <n>             — restart the random sequence
///   help                 — list commands
///   quit                 — exit
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use table_engine::core::engine::{TableEngine, TableEngineBuilder};

#[derive(Debug, Parser)]
#[command(name = "table_shell", about = "Expand random tables interactively")]
struct Args {
    /// Table file or directory of table files (repeatable)
    #[arg(long = "tables", value_name = "PATH")]
    tables: Vec<PathBuf>,

    /// RON settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Leave out the built-in tables
    #[arg(long)]
    no_builtin: bool,

    /// Run one command and exit instead of starting the shell
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut engine = match build_engine(&args) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    if !args.command.is_empty() {
        let line = args.command.join(" ");
        run_command(&mut engine, &line);
        return;
    }

    println!("Loaded {} tables", engine.tables().len());
    match engine.seed() {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: random"),
    }
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("tables> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !run_command(&mut engine, line) {
            println!("Goodbye.");
            break;
        }
    }
}

fn build_engine(args: &Args) -> Result<TableEngine, table_engine::core::engine::EngineError> {
    let mut builder: TableEngineBuilder = TableEngine::builder().builtin_tables(!args.no_builtin);
    for path in &args.tables {
        builder = if path.is_dir() {
            builder.tables_dir(path)
        } else {
            builder.table_file(path)
        };
    }
    if let Some(ref path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    builder.build()
}

/// Run one shell line. Returns `false` when the session should end.
fn run_command(engine: &mut TableEngine, line: &str) -> bool {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd.to_lowercase().as_str() {
        "quit" | "exit" | "q" => return false,
        "help" | "h" | "?" => print_help(),
        "table" | "t" => {
            if rest.is_empty() {
                println!("Usage: table <name>");
                print_tables(engine);
                return true;
            }
            match engine.expand(rest) {
                Ok(text) => println!("{}", text),
                Err(e) => println!("ERROR: {}", e),
            }
        }
        "text" => match engine.expand_text(rest) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("ERROR: {}", e),
        },
        "roll" | "r" => {
            let spec = if rest.is_empty() { "d" } else { rest };
            match engine.roll_dice(spec) {
                Ok(roll) => println!("{}: {}", roll.spec, roll),
                Err(e) => println!("ERROR: {}", e),
            }
        }
        "range" => match engine.roll_range(rest) {
            Ok(roll) => println!("{}", roll),
            Err(e) => println!("ERROR: {}", e),
        },
        "choose" | "c" => match engine.choose_from_list(rest) {
            Some(pick) => println!("{}", pick),
            None => println!("Usage: choose <a, b, c>"),
        },
        "list" | "ls" => print_tables(engine),
        "dice" => {
            for name in engine.dice().names() {
                let faces = engine.dice().get(name).unwrap_or_default();
                let labels: Vec<&str> = faces.iter().map(|f| f.label.as_str()).collect();
                println!("  {}: {}", name, labels.join(" "));
            }
        }
        "load" => {
            if rest.is_empty() {
                println!("Usage: load <path>");
                return true;
            }
            match engine.load_file(Path::new(rest)) {
                Ok(count) => println!("Loaded {} tables from {}", count, rest),
                Err(e) => println!("ERROR: {}", e),
            }
        }
        "seed" => {
            if rest.is_empty() {
                match engine.seed() {
                    Some(seed) => println!("Current seed: {}", seed),
                    None => println!("Current seed: random"),
                }
                return true;
            }
            match rest.parse::<u64>() {
                Ok(seed) => {
                    engine.reseed(seed);
                    println!("Seed set to {}", seed);
                }
                Err(_) => println!("Invalid seed: {}", rest),
            }
        }
        // Anything else is treated as a table name, like `table <name>`.
        _ => match engine.expand(line) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("ERROR: {}", e),
        },
    }
    true
}

fn print_tables(engine: &TableEngine) {
    let names = engine.visible_tables();
    if names.is_empty() {
        println!("  (no tables loaded)");
    }
    for name in names {
        println!("  {}", name);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  table <name>      Expand a table (or dice/range/literal)");
    println!("  text <template>   Substitute [references] in free text");
    println!("  roll <dice>       Roll dice, e.g. 3d6+2, 4dF");
    println!("  range <spec>      Roll a range, e.g. 1-100, 1>>>20");
    println!("  choose <a, b, c>  Pick one item from a list");
    println!("  list              List top-level tables");
    println!("  dice              List custom dice");
    println!("  load <path>       Load another table file");
    println!("  seed <n>          Restart the random sequence");
    println!("  help              Show this help");
    println!("  quit              Exit");
}
