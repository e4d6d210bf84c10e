/// Table Linter — validates references and structure of table files.
///
/// Usage: table_linter <path>... [--config <file>]
use clap::Parser;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::process;
use table_engine::core::config::EngineConfig;
use table_engine::core::dice::DiceSpec;
use table_engine::core::dice_registry::DiceRegistry;
use table_engine::core::expander::{has_unclosed_reference, references, TableExpander};
use table_engine::core::range::RangeSpec;
use table_engine::core::tables::TableStore;
use table_engine::schema::die::FaceSpec;
use table_engine::schema::table_name::top_level;

#[derive(Debug, Parser)]
#[command(name = "table_linter", about = "Check table files for broken references and cycles")]
struct Args {
    /// Table files or directories to check
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// RON settings file (custom dice, default faces)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => match EngineConfig::load_from_ron(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut dice = DiceRegistry::with_builtin();
    if let Err(e) = config.register_dice(&mut dice) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }

    let mut tables = TableStore::new();
    for path in &args.paths {
        load_tables(path, &mut tables);
    }

    let (errors, warnings) = lint_tables(&tables, &dice, &config);
    print!("{}", render_report(tables.len(), &errors, &warnings));

    process::exit(if errors.is_empty() { 0 } else { 1 });
}

/// Problems grouped by severity, then a one-line tally.
fn render_report(checked: usize, errors: &[String], warnings: &[String]) -> String {
    let mut report = format!("\nChecked {} tables\n", checked);
    for (heading, items) in [("errors", errors), ("warnings", warnings)] {
        if items.is_empty() {
            continue;
        }
        report.push_str(&format!("\n{} {}:\n", items.len(), heading));
        for item in items {
            report.push_str(&format!("  - {}\n", item));
        }
    }
    if errors.is_empty() && warnings.is_empty() {
        report.push_str("No problems found.\n");
    } else {
        report.push_str(&format!(
            "\n{} of {} tables clean, {} errors, {} warnings\n",
            checked.saturating_sub(tables_with_problems(errors, warnings)),
            checked,
            errors.len(),
            warnings.len()
        ));
    }
    report
}

/// Distinct table names mentioned as `Table '<name>'` across all problems.
fn tables_with_problems(errors: &[String], warnings: &[String]) -> usize {
    errors
        .iter()
        .chain(warnings)
        .filter_map(|line| line.strip_prefix("Table '")?.split_once('\'').map(|(name, _)| name))
        .collect::<FxHashSet<&str>>()
        .len()
}

fn load_tables(path: &Path, tables: &mut TableStore) {
    let result = if path.is_dir() {
        tables.load_dir(path)
    } else if path.is_file() {
        tables.load_file(path)
    } else {
        eprintln!("ERROR: Path '{}' does not exist", path.display());
        process::exit(1);
    };
    match result {
        Ok(count) => println!("  Loaded: {} ({} tables)", path.display(), count),
        Err(e) => {
            eprintln!("  ERROR loading {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// What a bracketed reference would turn into during expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Table(String),
    Dice(DiceSpec),
    Range,
    Literal,
}

fn classify(expander: &TableExpander<'_>, config: &EngineConfig, name: &str, scope: &str) -> Target {
    if let Some(table) = expander.find_table(name, Some(scope)) {
        return Target::Table(table.name.clone());
    }
    if let Ok(spec) = DiceSpec::parse(name, &config.default_faces()) {
        return Target::Dice(spec);
    }
    if RangeSpec::parse(name).is_ok() {
        return Target::Range;
    }
    Target::Literal
}

fn lint_tables(
    tables: &TableStore,
    dice: &DiceRegistry,
    config: &EngineConfig,
) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let expander = TableExpander::with_config(tables, dice, config);

    // Static reference graph: table → tables its alternatives can reach
    let mut graph: FxHashMap<&str, FxHashSet<String>> = FxHashMap::default();

    for name in tables.names() {
        let Some(table) = tables.get(name) else {
            continue;
        };
        let scope = top_level(name);

        if table.total_weight() == 0 {
            errors.push(format!("Table '{}' has no selectable entries", name));
        }

        let mut self_referencing = 0;
        for alt in &table.alternatives {
            if has_unclosed_reference(alt.text()) {
                warnings.push(format!(
                    "Table '{}' has an unclosed '[' in: {}",
                    name,
                    alt.text()
                ));
            }

            let mut refers_to_self = false;
            for reference in references(alt.text()) {
                match classify(&expander, config, reference, scope) {
                    Target::Table(target) => {
                        refers_to_self |= target == name;
                        graph.entry(name).or_default().insert(target);
                    }
                    Target::Dice(spec) => {
                        if let FaceSpec::Named(die) = &spec.faces {
                            if !dice.contains(die) {
                                warnings.push(format!(
                                    "Table '{}' reference '[{}]' rolls unknown custom die '{}'",
                                    name, reference, die
                                ));
                            }
                        }
                    }
                    Target::Range => {}
                    Target::Literal => {
                        warnings.push(format!(
                            "Table '{}' reference '[{}]' matches no table and is kept as text",
                            name, reference
                        ));
                    }
                }
            }
            if refers_to_self {
                self_referencing += 1;
            }
        }

        if !table.alternatives.is_empty() && self_referencing == table.alternatives.len() {
            errors.push(format!(
                "Table '{}' has no non-recursive entry (infinite recursion)",
                name
            ));
        }
    }

    for cycle in find_cycles(&graph) {
        warnings.push(format!("Reference cycle: {}", cycle.join(" -> ")));
    }

    (errors, warnings)
}

/// Cycles in the reference graph, each reported once from its smallest name.
fn find_cycles(graph: &FxHashMap<&str, FxHashSet<String>>) -> Vec<Vec<String>> {
    let mut starts: Vec<&str> = graph.keys().copied().collect();
    starts.sort_unstable();

    let mut cycles = Vec::new();
    for start in starts {
        let mut path = vec![start.to_string()];
        let mut seen = FxHashSet::default();
        if walk(graph, start, start, &mut path, &mut seen) {
            cycles.push(path);
        }
    }
    cycles
}

fn walk(
    graph: &FxHashMap<&str, FxHashSet<String>>,
    start: &str,
    node: &str,
    path: &mut Vec<String>,
    seen: &mut FxHashSet<String>,
) -> bool {
    let Some(targets) = graph.get(node) else {
        return false;
    };
    let mut targets: Vec<&String> = targets.iter().collect();
    targets.sort_unstable();

    for target in targets {
        if target == start {
            path.push(target.clone());
            return true;
        }
        // Only report a cycle from its smallest member
        if target.as_str() < start || !seen.insert(target.clone()) {
            continue;
        }
        path.push(target.clone());
        if walk(graph, start, target, path, seen) {
            return true;
        }
        path.pop();
    }
    false
}
