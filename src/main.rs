use anyhow::{Context, Result};
use bubble_tutor::demo::{run_demo, write_report, CaseReport, DemoConfig};
use bubble_tutor::{
    bubble_sort, trace_sort, try_bubble_sort, try_trace_sort, SortError, SortEvent, SortStats,
    TraceKind, TraceRecord,
};
use clap::{Parser, Subcommand};
use colored::*;
use dotenv::dotenv;
use std::fmt::Debug;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bubble-tutor")]
#[command(about = "Step-by-step bubble sort for learners")]
#[command(version)]
struct Cli {
    /// Log pass boundaries and demo progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort the given values
    Sort {
        /// Values to sort
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,

        /// Print every comparison and pass
        #[arg(short, long)]
        trace: bool,

        /// Treat values as floating point numbers (NaN cannot be ordered)
        #[arg(long)]
        float: bool,
    },
    /// Run the sample cases from the lesson
    Demo {
        /// JSON file with the cases to run
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Export the results to JSON
        #[arg(long)]
        export: Option<PathBuf>,

        /// Skip the step-by-step walkthrough
        #[arg(long)]
        no_trace: bool,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sort {
            values,
            trace,
            float,
        } => {
            if float {
                sort_floats(&values, trace)?;
            } else {
                sort_integers(&values, trace)?;
            }
        }
        Commands::Demo {
            config,
            export,
            no_trace,
        } => {
            run_demo_command(config, export, no_trace)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "bubble_tutor=debug"
    } else {
        "bubble_tutor=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn sort_integers(values: &[String], trace: bool) -> Result<()> {
    let mut data = values
        .iter()
        .map(|v| {
            v.parse::<i64>()
                .with_context(|| format!("Invalid integer: {}", v))
        })
        .collect::<Result<Vec<_>>>()?;

    let stats = if trace {
        print_trace(&mut data)
    } else {
        println!("{} {:?}", "Input:".bold(), data);
        bubble_sort(&mut data)
    };

    println!("{} {}", "Sorted:".bold().green(), format!("{:?}", data).green());
    print_stats(&stats);
    Ok(())
}

fn sort_floats(values: &[String], trace: bool) -> Result<()> {
    let mut data = values
        .iter()
        .map(|v| {
            v.parse::<f64>()
                .with_context(|| format!("Invalid number: {}", v))
        })
        .collect::<Result<Vec<_>>>()?;

    let stats = if trace {
        try_print_trace(&mut data)
    } else {
        println!("{} {:?}", "Input:".bold(), data);
        try_bubble_sort(&mut data)
    }
    .context("Cannot sort the given values")?;

    println!("{} {}", "Sorted:".bold().green(), format!("{:?}", data).green());
    print_stats(&stats);
    Ok(())
}

fn print_trace<T: Ord + Debug>(data: &mut [T]) -> SortStats {
    let mut trace = trace_sort(data);
    for record in trace.by_ref() {
        print_record(&record);
    }
    trace.stats()
}

fn try_print_trace<T: PartialOrd + Debug>(data: &mut [T]) -> Result<SortStats, SortError> {
    let mut trace = try_trace_sort(data);
    for record in trace.by_ref() {
        print_record(&record?);
    }
    Ok(trace.stats())
}

fn print_record(record: &TraceRecord) {
    match &record.kind {
        TraceKind::Initial => println!("{}", record.message.bold()),
        TraceKind::Step(SortEvent::PassStarted { .. }) => {
            println!("\n{}", record.message.bright_blue().bold())
        }
        TraceKind::Step(SortEvent::Compared { swapped: true, .. }) => {
            println!("{}", record.message.yellow())
        }
        TraceKind::Step(SortEvent::Compared { swapped: false, .. }) => {
            println!("{}", record.message)
        }
        TraceKind::Step(SortEvent::PassFinished { sorted: true, .. }) => {
            println!("{}", record.message.green())
        }
        TraceKind::Step(SortEvent::PassFinished { .. }) => {
            println!("{}", record.message.cyan())
        }
        TraceKind::Final(_) => println!("\n{}", record.message.bold().green()),
    }
}

fn print_stats(stats: &SortStats) {
    println!(
        "  {} {}  {} {}  {} {}",
        "Passes:".bright_blue(),
        stats.passes,
        "Comparisons:".bright_blue(),
        stats.comparisons,
        "Swaps:".bright_blue(),
        stats.swaps
    );
}

fn run_demo_command(
    config: Option<PathBuf>,
    export: Option<PathBuf>,
    no_trace: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => DemoConfig::load(&path)?,
        None => DemoConfig::default(),
    };

    println!("{}", "Bubble Sort Example".bold().blue());
    println!("{}", "=".repeat(20));

    if !no_trace {
        if let Some(case) = config.traced_case() {
            // Walk through a copy so the report below still sees the input.
            let mut demo = case.values.clone();
            print_trace(&mut demo);
            println!("\n{}", "=".repeat(40));
        }
    }

    let report = run_demo(&config);
    println!("{}", "Testing different cases:".bold());
    for case in &report.cases {
        print_case(case);
    }

    if let Some(path) = export {
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create export file: {}", path.display()))?;
        write_report(&report, &mut file)?;
        info!(path = %path.display(), "report exported");
        println!(
            "{}",
            format!("Results exported to: {}", path.display()).green()
        );
    }

    Ok(())
}

fn print_case(case: &CaseReport) {
    println!();
    println!("{} {:?}", format!("{}:", case.name).bright_white().bold(), case.input);
    println!("{} {:?}", "After bubble sort:".green(), case.output);
    print_stats(&case.stats);
}
