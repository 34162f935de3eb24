//! Propriedades que valem para qualquer trace e qualquer política.

use std::collections::VecDeque;

use proptest::prelude::*;
use vm::{
    config::SimConfig,
    mmu::{AccessOutcome, Mmu},
    page_replacer::ReplacementPolicy,
    page_table::AccessMode,
};

fn policy() -> impl Strategy<Value = ReplacementPolicy> {
    prop::sample::select(ReplacementPolicy::ALL.to_vec())
}

/// Tamanho da tabela, número de frames e a lista de acessos.
fn trace() -> impl Strategy<Value = (usize, usize, Vec<(usize, AccessMode)>)> {
    (1usize..16, 1usize..8).prop_flat_map(|(num_pages, num_frames)| {
        let access = (
            0..num_pages,
            prop_oneof![Just(AccessMode::Read), Just(AccessMode::Write)],
        );
        (
            Just(num_pages),
            Just(num_frames),
            prop::collection::vec(access, 0..200),
        )
    })
}

/// FIFO de livro-texto, com uma fila de páginas.
fn queue_fifo_faults(num_frames: usize, pages: impl IntoIterator<Item = usize>) -> u64 {
    let mut queue = VecDeque::new();
    let mut faults = 0;

    for page in pages {
        if queue.contains(&page) {
            continue;
        }

        faults += 1;
        if queue.len() == num_frames {
            queue.pop_front();
        }
        queue.push_back(page);
    }

    faults
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_frames_and_mappings_stay_consistent(
        (num_pages, num_frames, accesses) in trace(),
        policy in policy(),
        clock in 1i64..20,
        seed in any::<u64>(),
    ) {
        let config = SimConfig::new(num_pages, num_frames, policy, clock)
            .unwrap()
            .with_seed(Some(seed));
        let mut mmu = Mmu::new(&config);
        let mut faults = 0u64;

        for &(page, mode) in &accesses {
            if mmu.access(page, mode).unwrap().is_fault() {
                faults += 1;
            }

            let resident = mmu.page_table().resident_count();
            prop_assert_eq!(resident, mmu.frames().occupied_count());
            prop_assert!(resident <= num_frames);
            prop_assert!(mmu.page_table().is_resident(page));

            for (_, entry) in mmu.page_table().resident_pages() {
                let frame = entry.frame_index().unwrap();
                prop_assert!(mmu.frames().is_occupied(frame));
            }
        }

        prop_assert!(faults <= accesses.len() as u64);
        prop_assert_eq!(faults, mmu.stats().faults);
    }

    #[test]
    fn prop_immediate_repeat_is_a_hit(
        (num_pages, num_frames, accesses) in trace(),
        policy in policy(),
        clock in 1i64..20,
    ) {
        let config = SimConfig::new(num_pages, num_frames, policy, clock)
            .unwrap()
            .with_seed(Some(0));
        let mut mmu = Mmu::new(&config);

        for &(page, mode) in &accesses {
            mmu.access(page, mode).unwrap();
            prop_assert_eq!(mmu.access(page, AccessMode::Read).unwrap(), AccessOutcome::Hit);
        }
    }

    #[test]
    fn prop_fifo_matches_queue_model(
        (num_pages, num_frames, accesses) in trace(),
        clock in 1i64..20,
    ) {
        let config = SimConfig::new(num_pages, num_frames, ReplacementPolicy::Fifo, clock).unwrap();
        let mut mmu = Mmu::new(&config);

        for &(page, mode) in &accesses {
            mmu.access(page, mode).unwrap();
        }

        let expected = queue_fifo_faults(num_frames, accesses.iter().map(|&(page, _)| page));
        prop_assert_eq!(mmu.stats().faults, expected);
    }
}
