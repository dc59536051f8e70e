use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use ignore::WalkBuilder;
use miette::{miette, IntoDiagnostic, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use gdsort::config::{load_config, Config};
use gdsort::{check_members_preserved, init_tracing, sort_source, SortOptions};

#[derive(Parser)]
#[command(
    name = "gdsort",
    version,
    about = "Reorder GDScript class members following the Godot style guide"
)]
struct Cli {
    /// Files or directories to sort
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Check if files are sorted without modifying them
    #[arg(short, long)]
    check: bool,

    /// Show diff without modifying files
    #[arg(short, long)]
    diff: bool,

    /// Read from stdin, write to stdout
    #[arg(long)]
    stdin: bool,

    /// Write sorted output to stdout instead of modifying files
    #[arg(long)]
    stdout: bool,

    /// Byte offset to track through the reorder (stdin only, repeatable)
    #[arg(long = "offset", requires = "stdin")]
    offsets: Vec<usize>,

    /// Print the sorted source and mapped offsets as JSON (stdin only)
    #[arg(long, requires = "stdin")]
    json: bool,

    /// Order members of the same kind by name
    #[arg(short, long)]
    alphabetize: bool,

    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip safety checks (member preservation and idempotence) - not recommended
    #[arg(long)]
    unsafe_skip_checks: bool,
}

/// What to do with each sorted file.
#[derive(Clone, Copy)]
struct Mode {
    check: bool,
    diff: bool,
    stdout: bool,
    run_safety_checks: bool,
}

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    source: &'a str,
    offsets: &'a [usize],
    unmatched: usize,
    reordered: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(needs_sorting) => {
            if needs_sorting {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "gdsort=error",
        1 => "gdsort=warn",
        2 => "gdsort=info",
        3 => "gdsort=debug",
        _ => "gdsort=trace",
    };
    init_tracing(log_level);

    let config = load_config(cli.config.as_deref())?;
    let options = build_options(&cli, &config);
    let mode = Mode {
        check: cli.check,
        diff: cli.diff,
        stdout: cli.stdout,
        run_safety_checks: !cli.unsafe_skip_checks,
    };

    if cli.stdin {
        return sort_stdin(&options, &cli.offsets, cli.json, mode);
    }

    let mut files = Vec::new();
    for path in &cli.paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            collect_directory(path, &config, &mut files)?;
        } else {
            warn!(path = %path.display(), "no such file or directory");
        }
    }
    debug!(count = files.len(), "collected files");

    let results: Vec<Result<bool>> = files
        .par_iter()
        .map(|path| process_file(path, &options, mode))
        .collect();

    let mut any_changes = false;
    for result in results {
        any_changes |= result?;
    }

    Ok(any_changes)
}

fn build_options(cli: &Cli, config: &Config) -> SortOptions {
    let mut options = config.sort.clone();
    if cli.alphabetize {
        options.alphabetize = true;
    }
    options
}

fn sort_stdin(options: &SortOptions, offsets: &[usize], json: bool, mode: Mode) -> Result<bool> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).into_diagnostic()?;

    let sorted = sort_source(&source, offsets, options)?;

    // Run safety checks - for stdin we fail hard since we can't skip
    if mode.run_safety_checks {
        verify_members_preserved("<stdin>", &source, &sorted.text)?;
        verify_idempotent("<stdin>", &sorted.text, options)?;
    }

    let changed = source != sorted.text;

    if mode.check {
        return Ok(changed);
    }

    if mode.diff {
        print_diff("<stdin>", &source, &sorted.text);
        return Ok(changed);
    }

    if json {
        let output = JsonOutput {
            source: &sorted.text,
            offsets: &sorted.offsets,
            unmatched: sorted.unmatched,
            reordered: sorted.reordered,
        };
        let rendered = serde_json::to_string_pretty(&output).into_diagnostic()?;
        println!("{}", rendered);
        return Ok(false);
    }

    io::stdout()
        .write_all(sorted.text.as_bytes())
        .into_diagnostic()?;
    if !offsets.is_empty() {
        let mapped: Vec<String> = sorted.offsets.iter().map(ToString::to_string).collect();
        eprintln!("offsets: {}", mapped.join(" "));
    }

    Ok(false)
}

fn process_file(path: &Path, options: &SortOptions, mode: Mode) -> Result<bool> {
    let source = std::fs::read_to_string(path).into_diagnostic()?;

    let sorted = match sort_source(&source, &[], options) {
        Ok(sorted) => sorted,
        Err(e) => {
            eprintln!("Error sorting {:?}: {}", path, e);
            return Ok(false);
        }
    };

    // Run safety checks by default - skip file if they fail
    if mode.run_safety_checks && sorted.reordered {
        let filename = path.display().to_string();
        if let Err(e) = verify_members_preserved(&filename, &source, &sorted.text) {
            eprintln!("Warning: skipping {} - {}", filename, e);
            return Ok(false);
        }
        if let Err(e) = verify_idempotent(&filename, &sorted.text, options) {
            eprintln!("Warning: skipping {} - {}", filename, e);
            return Ok(false);
        }
    }

    let changed = source != sorted.text;

    if mode.check {
        if changed {
            println!("Would reorder: {}", path.display());
        }
        return Ok(changed);
    }

    if mode.diff {
        if changed {
            print_diff(&path.display().to_string(), &source, &sorted.text);
        }
        return Ok(changed);
    }

    if mode.stdout {
        io::stdout()
            .write_all(sorted.text.as_bytes())
            .into_diagnostic()?;
        return Ok(changed);
    }

    if changed {
        std::fs::write(path, &sorted.text).into_diagnostic()?;
        println!("Reordered: {}", path.display());
    }

    Ok(changed)
}

fn collect_directory(path: &Path, config: &Config, files: &mut Vec<PathBuf>) -> Result<()> {
    let walker = WalkBuilder::new(path).standard_filters(true).build();

    for entry in walker {
        let entry = entry.into_diagnostic()?;
        let file_path = entry.path();

        if file_path.extension().map(|e| e == "gd").unwrap_or(false)
            && !config.is_excluded(&file_path.to_string_lossy())
        {
            files.push(file_path.to_path_buf());
        }
    }

    Ok(())
}

fn print_diff(filename: &str, original: &str, sorted: &str) {
    use similar::{ChangeTag, TextDiff};

    println!("--- {}", filename);
    println!("+++ {}", filename);

    let diff = TextDiff::from_lines(original, sorted);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("...");
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                print!("{}{}", sign, change);
            }
        }
    }
}

fn verify_members_preserved(filename: &str, original: &str, sorted: &str) -> Result<()> {
    check_members_preserved(original, sorted)
        .map_err(|e| miette!("Members changed while sorting {}!\n{}", filename, e))
}

fn verify_idempotent(filename: &str, sorted: &str, options: &SortOptions) -> Result<()> {
    let sorted_twice = sort_source(sorted, &[], options)?;

    if sorted == sorted_twice.text {
        Ok(())
    } else {
        Err(miette!(
            "Sorting is not idempotent for {}!\nSorting the output again produces different results.",
            filename
        ))
    }
}
