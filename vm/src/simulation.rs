//! Replay de um trace inteiro contra uma [`Mmu`].

use std::io::BufRead;

use log::info;

use crate::{
    config::SimConfig,
    error::Result,
    mmu::{Mmu, Stats},
    page_replacer::ReplacementPolicy,
    trace::{TraceEvent, TraceReader},
};

/// O resultado de uma simulação.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub policy: ReplacementPolicy,
    pub faults: u64,
    pub stats: Stats,
}

/// Alimenta a `mmu` com os acessos, um por vez, e devolve quantos deram
/// page fault. Para no primeiro erro.
pub fn replay<I>(mmu: &mut Mmu, events: I) -> Result<u64>
where
    I: IntoIterator<Item = Result<TraceEvent>>,
{
    let mut faults = 0;

    for event in events {
        let event = event?;

        if mmu.access(event.page_number, event.mode)?.is_fault() {
            faults += 1;
        }
    }

    Ok(faults)
}

/// Lê o trace de `reader` e o simula com `policy`.
pub fn simulate<R: BufRead>(
    reader: R,
    policy: ReplacementPolicy,
    clock_frequency: i64,
    seed: Option<u64>,
) -> Result<Report> {
    let trace = TraceReader::new(reader)?;
    let header = trace.header();
    let config = SimConfig::new(header.num_pages, header.num_frames, policy, clock_frequency)?
        .with_seed(seed);

    let mut mmu = Mmu::new(&config);
    let faults = replay(&mut mmu, trace)?;

    Ok(report(&mmu, faults))
}

/// Simula o mesmo trace com várias políticas. Cada uma roda numa `Mmu`
/// própria: nada é compartilhado entre as execuções.
pub fn compare<R: BufRead>(
    reader: R,
    policies: &[ReplacementPolicy],
    clock_frequency: i64,
    seed: Option<u64>,
) -> Result<Vec<Report>> {
    let trace = TraceReader::new(reader)?;
    let header = trace.header();
    let events = trace.collect::<Result<Vec<_>>>()?;

    policies
        .iter()
        .map(|&policy| -> Result<Report> {
            let config =
                SimConfig::new(header.num_pages, header.num_frames, policy, clock_frequency)?
                    .with_seed(seed);

            let mut mmu = Mmu::new(&config);
            let faults = replay(&mut mmu, events.iter().copied().map(Ok))?;

            Ok(report(&mmu, faults))
        })
        .collect()
}

fn report(mmu: &Mmu, faults: u64) -> Report {
    let policy = mmu.replacer().policy();
    let stats = mmu.stats();

    info!(
        "{}: {} acessos, {} hits, {} page faults, {} despejos ({} sujos)",
        policy, stats.accesses, stats.hits, stats.faults, stats.evictions, stats.dirty_evictions
    );

    Report {
        policy,
        faults,
        stats,
    }
}
