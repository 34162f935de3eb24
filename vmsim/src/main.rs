mod trace_source;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{ArgAction, Parser};
use log::LevelFilter;
use vm::{
    config::validate_clock_frequency,
    error::Result,
    page_replacer::ReplacementPolicy,
    simulation::{self, Report},
};

/// Simulador de memória virtual: lê um trace e imprime o número de page faults.
#[derive(Parser)]
#[command(name = "vmsim")]
#[command(version)]
struct Cli {
    /// Política de substituição: fifo, second_chance, nru, aging, mfu, random
    /// (ou `all` para comparar todas)
    algorithm: String,

    /// De quantos em quantos acessos os bits de referência são zerados
    #[arg(allow_negative_numbers = true)]
    clock_freq: i64,

    /// Lê o trace deste arquivo em vez da entrada padrão
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Semente da política random
    #[arg(long)]
    seed: Option<u64>,

    /// Imprime estatísticas da simulação na saída de erro
    #[arg(long)]
    stats: bool,

    /// Mais logs (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug)]
enum Selection {
    One(ReplacementPolicy),
    All,
}

impl Selection {
    fn parse(name: &str) -> Result<Self> {
        if name == "all" {
            return Ok(Selection::All);
        }

        name.parse().map(Selection::One)
    }
}

fn init_logger(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder.init();
}

fn print_stats(report: &Report) {
    let stats = report.stats;

    eprintln!(
        "{}: acessos={} hits={} faults={} despejos={} sujos={} clocks={}",
        report.policy,
        stats.accesses,
        stats.hits,
        stats.faults,
        stats.evictions,
        stats.dirty_evictions,
        stats.clock_sweeps
    );
}

/// Escreve em `out` só o resultado; logs e estatísticas vão para a saída de erro.
fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    // Erros de uso aparecem antes de ler qualquer coisa do trace.
    let selection = Selection::parse(&cli.algorithm)?;
    validate_clock_frequency(cli.clock_freq)?;

    let reader = trace_source::open(cli.trace.as_deref())?;

    match selection {
        Selection::One(policy) => {
            let report = simulation::simulate(reader, policy, cli.clock_freq, cli.seed)?;

            writeln!(out, "{}", report.faults)?;

            if cli.stats {
                print_stats(&report);
            }
        }
        Selection::All => {
            let reports = simulation::compare(
                reader,
                &ReplacementPolicy::ALL,
                cli.clock_freq,
                cli.seed,
            )?;

            for report in &reports {
                writeln!(out, "{} {}", report.policy, report.faults)?;

                if cli.stats {
                    print_stats(report);
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();

            // --help e --version também passam por aqui.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logger(cli.verbose);

    if let Err(e) = run(&cli, &mut io::stdout().lock()) {
        if e.is_usage_error() {
            eprintln!("Usage: vmsim <algorithm> <clock_freq>");
        }
        eprintln!("error: {e}");

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
