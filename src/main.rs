//! sift: streaming CSV toolkit
//!
//! Usage: sift <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use sift_csv::buffers::DEFAULT_MAX_FIELD_LENGTH;
use sift_csv::commands::{CountCommand, CountStats, GenerateCommand, SelectCommand};
use sift_csv::reader::CsvError;

#[derive(Parser)]
#[command(name = "sift")]
#[command(version)]
#[command(about = "sift: streaming CSV row and field processing", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Use smaller I/O buffers to reduce memory footprint
    #[arg(long, global = true)]
    low_memory: bool,

    /// Maximum length of a single field in bytes; longer fields are
    /// reported and truncated
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_FIELD_LENGTH)]
    max_field_length: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count rows and fields without materializing any data
    Count {
        /// Input CSV files (stdin when none given)
        inputs: Vec<PathBuf>,

        /// Print per-file statistics instead of a single total
        #[arg(long)]
        per_file: bool,
    },

    /// Project a subset of columns to stdout
    Select {
        /// 1-based column indices, in output order
        #[arg(short, long, value_delimiter = ',', required = true)]
        columns: Vec<usize>,

        /// Input CSV file (use - for stdin)
        input: Option<PathBuf>,

        /// Print row statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Generate a synthetic CSV dataset on stdout
    Generate {
        /// Number of rows
        #[arg(short, long, default_value = "1000")]
        rows: u64,

        /// Number of columns per row
        #[arg(short, long, default_value = "8")]
        columns: usize,

        /// RNG seed for reproducible output
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of fields seeded with commas, quotes, and line breaks
        #[arg(long, default_value = "0.1")]
        tricky_fraction: f64,

        /// Print generation statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .expect("Failed to initialize thread pool");
    }

    let low_memory = cli.low_memory;
    let max_field_length = cli.max_field_length;

    let result = match cli.command {
        Commands::Count { inputs, per_file } => {
            run_count(inputs, per_file, low_memory, max_field_length)
        }
        Commands::Select {
            columns,
            input,
            stats,
        } => run_select(columns, input, stats, low_memory, max_field_length),
        Commands::Generate {
            rows,
            columns,
            seed,
            tricky_fraction,
            stats,
        } => run_generate(rows, columns, seed, tricky_fraction, stats, low_memory),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_count(
    inputs: Vec<PathBuf>,
    per_file: bool,
    low_memory: bool,
    max_field_length: usize,
) -> Result<(), CsvError> {
    let cmd = CountCommand {
        low_memory,
        max_field_length,
    };

    if inputs.is_empty() {
        let stdin = io::stdin();
        let stats = cmd.execute_reader(stdin.lock())?;
        println!("{}", stats);
        return Ok(());
    }

    let results = cmd.execute_many(&inputs);
    let mut total = CountStats::default();
    for (path, result) in inputs.iter().zip(results) {
        let stats = result?;
        if per_file {
            println!("{}: {}", path.display(), stats);
        }
        total.merge(&stats);
    }
    if !per_file || inputs.len() > 1 {
        println!("{}", total);
    }
    Ok(())
}

fn run_select(
    columns: Vec<usize>,
    input: Option<PathBuf>,
    stats: bool,
    low_memory: bool,
    max_field_length: usize,
) -> Result<(), CsvError> {
    if columns.iter().any(|&c| c == 0) {
        eprintln!("Error: column indices are 1-based");
        process::exit(1);
    }

    let cmd = SelectCommand {
        columns,
        low_memory,
        max_field_length,
    };

    let stdout = io::stdout();
    let handle = stdout.lock();

    let select_stats = match input {
        Some(ref path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path)?;
            cmd.execute(file, handle)?
        }
        _ => {
            let stdin = io::stdin();
            cmd.execute(stdin.lock(), handle)?
        }
    };

    if stats {
        eprintln!("{}", select_stats);
    }
    Ok(())
}

fn run_generate(
    rows: u64,
    columns: usize,
    seed: u64,
    tricky_fraction: f64,
    stats: bool,
    low_memory: bool,
) -> Result<(), CsvError> {
    let cmd = GenerateCommand {
        rows,
        columns,
        seed,
        tricky_fraction,
        low_memory,
    };

    let stdout = io::stdout();
    let generate_stats = cmd.execute(stdout.lock())?;

    if stats {
        eprintln!("{}", generate_stats);
    }
    Ok(())
}
