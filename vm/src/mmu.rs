//! O motor da simulação: trata um acesso por vez, consultando a tabela de
//! páginas, o alocador de frames e, quando a memória acaba, a política de
//! substituição.

use std::num::NonZeroU64;

use log::{debug, trace};

use crate::{
    config::SimConfig,
    error::{Result, VmError},
    frame_allocator::FrameAllocator,
    page_replacer::{PageEvent, PageReplacer},
    page_table::{AccessMode, PageTable},
};

/// Uma página tirada da memória para liberar o frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub page_number: usize,
    pub frame_index: usize,
    /// A página foi escrita e precisaria ser salva antes de sobrescrever.
    pub dirty: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    Fault {
        frame_index: usize,
        /// `None` quando ainda havia frame livre.
        evicted: Option<Eviction>,
    },
}

impl AccessOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, AccessOutcome::Fault { .. })
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Stats {
    pub accesses: u64,
    pub hits: u64,
    pub faults: u64,
    pub evictions: u64,
    pub dirty_evictions: u64,
    pub clock_sweeps: u64,
}

pub struct Mmu {
    page_table: PageTable,
    frames: FrameAllocator,
    replacer: PageReplacer,
    clock_frequency: NonZeroU64,
    last_accessed: Option<usize>,
    stats: Stats,
}

impl Mmu {
    pub fn new(config: &SimConfig) -> Self {
        Mmu {
            page_table: PageTable::new(config.num_pages()),
            frames: FrameAllocator::new(config.num_frames()),
            replacer: PageReplacer::new(
                config.policy(),
                config.num_pages(),
                config.num_frames(),
                config.seed(),
            ),
            clock_frequency: config.clock_frequency(),
            last_accessed: None,
            stats: Stats::default(),
        }
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frames(&self) -> &FrameAllocator {
        &self.frames
    }

    pub fn replacer(&self) -> &PageReplacer {
        &self.replacer
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn last_accessed(&self) -> Option<usize> {
        self.last_accessed
    }

    pub fn resident_pages(&self) -> Vec<usize> {
        self.page_table
            .resident_pages()
            .map(|(page, _)| page)
            .collect()
    }

    /// Simula um acesso à página `page_number`.
    ///
    /// # Errors
    ///
    /// Página fora da tabela, ou a política de substituição não devolveu
    /// uma vítima válida. Em ambos os casos o estado não serve mais para
    /// nada e a simulação deve parar.
    pub fn access(&mut self, page_number: usize, mode: AccessMode) -> Result<AccessOutcome> {
        if page_number >= self.page_table.num_pages() {
            return Err(VmError::PageOutOfRange {
                page: i64::try_from(page_number).unwrap_or(i64::MAX),
                num_pages: self.page_table.num_pages(),
            });
        }

        self.stats.accesses += 1;

        let outcome = if self.page_table.is_resident(page_number) {
            trace!("mmu: acesso {} página {:#06X}: hit", mode, page_number);

            self.page_table.mark_accessed(page_number, mode);
            self.stats.hits += 1;

            AccessOutcome::Hit
        } else {
            trace!("mmu: acesso {} página {:#06X}: page fault! tratando...", mode, page_number);

            let outcome = self.handle_page_fault(page_number, mode)?;
            self.stats.faults += 1;

            outcome
        };

        self.last_accessed = Some(page_number);

        if self.stats.accesses % self.clock_frequency.get() == 0 {
            debug!("mmu: clock no acesso {}, zerando bits de referência", self.stats.accesses);

            self.page_table.clear_all_reference_bits();
            self.stats.clock_sweeps += 1;
        }

        Ok(outcome)
    }

    fn handle_page_fault(&mut self, page_number: usize, mode: AccessMode) -> Result<AccessOutcome> {
        let (frame_index, evicted) = if self.frames.has_free_frame() {
            let frame_index = self.frames.allocate_free_frame()?;
            self.replacer.page_event(PageEvent::Loaded { frame_index });

            (frame_index, None)
        } else {
            let eviction = self.evict()?;

            (eviction.frame_index, Some(eviction))
        };

        self.page_table.mark_resident(page_number, frame_index, mode);

        trace!("mmu: página {:#06X} mapeada para frame físico idx={:#02X}", page_number, frame_index);

        Ok(AccessOutcome::Fault {
            frame_index,
            evicted,
        })
    }

    fn evict(&mut self) -> Result<Eviction> {
        let policy = self.replacer.policy();
        let page_number = self
            .replacer
            .pick_replacement_page(&mut self.page_table, self.last_accessed)?;

        let dirty = match self.page_table.get(page_number) {
            Some(entry) if entry.mapped() => entry.dirty(),
            _ => return Err(VmError::InvalidVictim { policy, page: page_number }),
        };

        self.replacer.page_event(PageEvent::Evicted { page_number });

        let frame_index = self
            .page_table
            .evict(page_number)
            .ok_or(VmError::InvalidVictim { policy, page: page_number })?;

        // O frame sai da vítima e vai direto para a página nova.
        self.frames.release(frame_index)?;
        self.frames.occupy(frame_index)?;

        if dirty {
            debug!("mmu: página {:#06X} suja, salvando antes de sobrescrever", page_number);
            self.stats.dirty_evictions += 1;
        }

        debug!("mmu: página {:#06X} despejada do frame {:#02X}", page_number, frame_index);
        self.stats.evictions += 1;

        Ok(Eviction {
            page_number,
            frame_index,
            dirty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{page_replacer::ReplacementPolicy, page_table::PageTableEntry};

    fn mmu(policy: ReplacementPolicy, num_pages: usize, num_frames: usize, clock: i64) -> Mmu {
        let config = SimConfig::new(num_pages, num_frames, policy, clock)
            .unwrap()
            .with_seed(Some(1));
        Mmu::new(&config)
    }

    #[test]
    fn first_access_faults_into_free_frame() {
        let mut mmu = mmu(ReplacementPolicy::Fifo, 4, 2, 100);

        let outcome = mmu.access(3, AccessMode::Read).unwrap();

        assert_eq!(
            outcome,
            AccessOutcome::Fault {
                frame_index: 0,
                evicted: None
            }
        );
        assert_eq!(mmu.replacer().fifo_frame(), Some(0));
        assert_eq!(mmu.last_accessed(), Some(3));
    }

    #[test]
    fn repeated_access_hits() {
        let mut mmu = mmu(ReplacementPolicy::Fifo, 4, 2, 100);

        assert!(mmu.access(1, AccessMode::Read).unwrap().is_fault());
        assert_eq!(mmu.access(1, AccessMode::Write).unwrap(), AccessOutcome::Hit);

        let entry = mmu.page_table().get(1).unwrap();
        assert!(entry.dirty());
        assert_eq!(entry.last_access_mode(), Some(AccessMode::Write));
        assert_eq!(mmu.stats().hits, 1);
    }

    #[test]
    fn eviction_reuses_victim_frame_and_advances_cursor() {
        let mut mmu = mmu(ReplacementPolicy::Fifo, 3, 2, 100);
        mmu.access(0, AccessMode::Write).unwrap();
        mmu.access(1, AccessMode::Read).unwrap();

        let outcome = mmu.access(2, AccessMode::Read).unwrap();

        assert_eq!(
            outcome,
            AccessOutcome::Fault {
                frame_index: 0,
                evicted: Some(Eviction {
                    page_number: 0,
                    frame_index: 0,
                    dirty: true
                })
            }
        );
        assert_eq!(mmu.replacer().fifo_frame(), Some(1));
        assert_eq!(mmu.resident_pages(), vec![1, 2]);
        assert_eq!(mmu.frames().free_count(), 0);
        assert_eq!(*mmu.page_table().get(0).unwrap(), PageTableEntry::default());

        let stats = mmu.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.dirty_evictions, 1);
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut mmu = mmu(ReplacementPolicy::Fifo, 2, 1, 100);

        assert!(matches!(
            mmu.access(2, AccessMode::Read),
            Err(VmError::PageOutOfRange {
                page: 2,
                num_pages: 2
            })
        ));
        assert_eq!(mmu.stats().accesses, 0);
    }

    #[test]
    fn clock_clears_reference_bits_after_hits_and_faults() {
        let mut mmu = mmu(ReplacementPolicy::Fifo, 4, 4, 2);

        mmu.access(0, AccessMode::Read).unwrap();
        assert!(mmu.page_table().get(0).unwrap().reference());

        // Segundo acesso é um hit e dispara o clock.
        mmu.access(0, AccessMode::Read).unwrap();
        assert!(!mmu.page_table().get(0).unwrap().reference());

        mmu.access(1, AccessMode::Read).unwrap();
        mmu.access(2, AccessMode::Read).unwrap();
        assert!(mmu.page_table().resident_pages().all(|(_, e)| !e.reference()));
        assert_eq!(mmu.stats().clock_sweeps, 2);
    }

    #[test]
    fn smallest_clock_frequency_sweeps_after_every_access() {
        let config = SimConfig::new(4, 2, ReplacementPolicy::Fifo, 1).unwrap();
        assert_eq!(config.clock_frequency().get(), 1);

        let mut mmu = Mmu::new(&config);
        for page in [0, 1, 0, 2, 3] {
            mmu.access(page, AccessMode::Write).unwrap();
            assert!(mmu.page_table().resident_pages().all(|(_, e)| !e.reference()));
        }

        assert_eq!(mmu.stats().clock_sweeps, 5);
        assert_eq!(mmu.stats().accesses, 5);
    }

    #[test]
    fn cursor_advances_for_every_policy() {
        for policy in ReplacementPolicy::ALL {
            let mut mmu = mmu(policy, 5, 2, 100);
            for page in 0..5 {
                mmu.access(page, AccessMode::Read).unwrap();
            }

            // 3 despejos a partir do frame 0, com 2 frames.
            assert_eq!(mmu.replacer().fifo_frame(), Some(1), "{policy}");
            assert_eq!(mmu.stats().faults, 5, "{policy}");
            assert_eq!(mmu.page_table().resident_count(), mmu.frames().occupied_count());
        }
    }

    #[test]
    fn mfu_sees_previous_page() {
        let mut mmu = mmu(ReplacementPolicy::Mfu, 3, 2, 100);
        mmu.access(0, AccessMode::Read).unwrap();
        mmu.access(1, AccessMode::Read).unwrap();

        // A página 1 foi a última acessada, é contada e sai.
        let outcome = mmu.access(2, AccessMode::Read).unwrap();
        assert!(matches!(
            outcome,
            AccessOutcome::Fault {
                evicted: Some(Eviction { page_number: 1, .. }),
                ..
            }
        ));
        assert_eq!(mmu.replacer().usage_count(1), 1);
    }
}
