//! constable CLI - find repeated string and numeric literals that could be
//! replaced by a constant.
//!
//! Features:
//! - Recursive traversal via the `...` path suffix (`constable src/...`)
//! - Constant matching and duplicate-constant detection
//! - Constant-expression evaluation (`PREFIX + "api"`, `concat!(...)`)
//! - Rayon-powered parallel parsing with a configurable worker count
//! - Human-readable text or JSON output

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};

use constable_core::{
    init_structured_logging, load_config, parse_roles, Analyzer, AnalyzerConfig, ConstantsMap,
    DuplicateConstants, Occurrence, StringsMap,
};

#[derive(Parser, Debug)]
#[command(
    name = "constable",
    author,
    version,
    about = "Find repeated string and numeric literals that could be replaced by a constant",
    after_help = "Examples:\n\n  \
        constable ./...\n  \
        constable --ignore \"generated|\\.pb\\.\" src/...\n  \
        constable --min-occurrences 3 --output json src\n  \
        constable --numbers --min 60 --max 512 .\n  \
        constable --eval-const-expr --match-constant .   # matches PREFIX + \"api\""
)]
pub struct Cli {
    /// Paths to analyze; append `...` for recursive traversal
    #[arg(required = true)]
    paths: Vec<String>,

    /// Exclude files matching the given regular expression
    #[arg(long)]
    ignore: Option<String>,

    /// Exclude strings matching the given regular expressions (comma separated)
    #[arg(long)]
    ignore_strings: Option<String>,

    /// Exclude test files from the search (default: true)
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    ignore_tests: Option<bool>,

    /// Report from how many occurrences
    #[arg(long)]
    min_occurrences: Option<usize>,

    /// Only report strings with the minimum given length
    #[arg(long)]
    min_length: Option<usize>,

    /// Look for existing constants matching the strings
    #[arg(long)]
    match_constant: bool,

    /// Look for constants with identical values
    #[arg(long)]
    find_duplicates: bool,

    /// Evaluate constant expressions like PREFIX + "api"
    #[arg(long)]
    eval_const_expr: bool,

    /// Search also for duplicated numbers
    #[arg(long)]
    numbers: bool,

    /// Minimum value, only works with --numbers
    #[arg(long)]
    min: Option<i64>,

    /// Maximum value, only works with --numbers
    #[arg(long)]
    max: Option<i64>,

    /// Roles to exclude (assignment, binary, case, return, call)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Worker pool size (defaults to the hardware thread count)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Process files in batches of this size (for very large codebases)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Output formatting (text or json)
    #[arg(long, default_value = "text")]
    output: String,

    /// Set exit status to 2 if any issues are found
    #[arg(long)]
    set_exit_status: bool,

    /// Print a single line per literal, only works with --output text
    #[arg(long)]
    grouped: bool,
}

fn main() -> ExitCode {
    // Global panic guard: a crash in the analyzer should never look like a
    // clean "no issues" run.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] constable internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 1.");
    }));

    // Structured JSON logs to stderr, respects RUST_LOG.
    init_structured_logging();

    let cli = Cli::parse();

    let mut any_issues = false;
    for path in &cli.paths {
        match analyze_path(&cli, path) {
            Ok(found) => any_issues |= found,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "analysis failed");
                return ExitCode::from(1);
            }
        }
    }

    if any_issues && cli.set_exit_status {
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}

/// Analyze one path and print its results. Returns whether anything was found.
fn analyze_path(cli: &Cli, path: &str) -> Result<bool> {
    let config = build_config(cli, path)?;

    let mut analyzer = Analyzer::new(path, config);
    if let Some(size) = cli.batch_size {
        analyzer.enable_batching(size);
    }

    let (strings, constants) = analyzer.parse_tree()?;

    // Only first declarations annotate matches; the full duplicate listing
    // is opt-in.
    let duplicates = if cli.find_duplicates {
        analyzer.duplicate_constants()
    } else {
        Vec::new()
    };

    match cli.output.as_str() {
        "json" => print_json(&strings, &constants)?,
        "text" => print_text(&strings, &constants, &duplicates, cli),
        other => anyhow::bail!("unsupported output format: {}", other),
    }

    Ok(!strings.is_empty() || !constants.is_empty())
}

/// Resolve the effective configuration: defaults, then constable.toml from
/// the analyzed root, then explicit flags.
fn build_config(cli: &Cli, path: &str) -> Result<AnalyzerConfig> {
    let mut config = AnalyzerConfig::default();

    let root = Path::new(path.strip_suffix("...").unwrap_or(path));
    let root = if root.as_os_str().is_empty() { Path::new(".") } else { root };
    if root.is_dir() {
        if let Some(file) = load_config(root)? {
            config = config.merge_file(file);
        }
    }

    if let Some(v) = cli.min_occurrences {
        config.min_occurrences = v;
    }
    if let Some(v) = cli.min_length {
        config.min_length = v;
    }
    if let Some(v) = cli.min {
        config.number_min = v;
    }
    if let Some(v) = cli.max {
        config.number_max = v;
    }
    if let Some(v) = cli.concurrency {
        if v > 0 {
            config.max_concurrency = v;
        }
    }
    if cli.numbers {
        config.parse_numbers = true;
    }
    if cli.match_constant {
        config.match_constants = true;
    }
    if cli.find_duplicates {
        config.find_duplicate_constants = true;
    }
    if cli.eval_const_expr {
        config.eval_const_expressions = true;
    }
    if let Some(v) = cli.ignore_tests {
        config.ignore_tests = v;
    }
    if let Some(pattern) = &cli.ignore {
        config.ignore_file_pattern = Some(pattern.clone());
    }
    if let Some(raw) = &cli.ignore_strings {
        config.ignore_patterns = split_comma_separated(raw);
    }
    if !cli.exclude.is_empty() {
        config.exclude_roles = parse_roles(&cli.exclude);
    }

    Ok(config)
}

/// Split the legacy comma-separated ignore-strings form into the canonical
/// pattern list, honoring `\,` escapes inside a pattern.
fn split_comma_separated(input: &str) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }
    if !input.contains("\\,") {
        return input.split(',').map(str::to_string).collect();
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            if c == ',' {
                current.push(',');
            } else {
                current.push('\\');
                current.push(c);
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

fn print_json(strings: &StringsMap, constants: &ConstantsMap) -> Result<()> {
    let payload = serde_json::json!({
        "strings": strings,
        "constants": constants,
    });
    println!("{}", serde_json::to_string(&payload)?);
    Ok(())
}

fn print_text(
    strings: &StringsMap,
    constants: &ConstantsMap,
    duplicates: &[DuplicateConstants],
    cli: &Cli,
) {
    for (value, occurrences) in strings {
        for occurrence in occurrences {
            println!(
                "{}:{}:{}:{} other occurrence(s) of {:?} found in: {}",
                occurrence.pos.file,
                occurrence.pos.line,
                occurrence.pos.column,
                occurrences.len() - 1,
                value,
                sibling_positions(occurrences, occurrence),
            );

            if cli.grouped {
                break;
            }
        }

        if constants.is_empty() {
            continue;
        }
        if let Some(defs) = constants.get(value) {
            if let Some(first) = defs.first() {
                println!("A matching constant has been found for {:?}: {}", value, first.name);
                println!("\t{}", first.pos);
            }
        }
    }

    for dup in duplicates {
        println!("Duplicate constant(s) with value {:?} have been found:", dup.value);
        for def in &dup.declarations {
            println!("\t{}: {}", def.pos, def.name);
        }
    }
}

/// All positions of a literal except the current one, space separated.
fn sibling_positions(occurrences: &[Occurrence], current: &Occurrence) -> String {
    let mut positions = Vec::with_capacity(occurrences.len().saturating_sub(1));
    for occurrence in occurrences {
        if occurrence == current {
            continue;
        }
        positions.push(occurrence.pos.to_string());
    }
    positions.join(" ")
}
