//! Políticas de substituição de páginas.
//!
//! O [`PageReplacer`] junta a política escolhida e todo o estado auxiliar
//! que ela precisa entre uma chamada e outra (o cursor FIFO, os contadores
//! do MFU, o gerador do Random). Cada simulação tem o seu: nada disso é
//! global.

use std::{fmt, str::FromStr};

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::{Result, VmError},
    page_table::PageTable,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Fifo,
    SecondChance,
    Nru,
    Aging,
    Mfu,
    Random,
}

impl ReplacementPolicy {
    pub const ALL: [ReplacementPolicy; 6] = [
        ReplacementPolicy::Fifo,
        ReplacementPolicy::SecondChance,
        ReplacementPolicy::Nru,
        ReplacementPolicy::Aging,
        ReplacementPolicy::Mfu,
        ReplacementPolicy::Random,
    ];

    /// O nome usado na linha de comando.
    pub fn name(self) -> &'static str {
        match self {
            ReplacementPolicy::Fifo => "fifo",
            ReplacementPolicy::SecondChance => "second_chance",
            ReplacementPolicy::Nru => "nru",
            ReplacementPolicy::Aging => "aging",
            ReplacementPolicy::Mfu => "mfu",
            ReplacementPolicy::Random => "random",
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self> {
        ReplacementPolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| VmError::UnknownPolicy(s.to_owned()))
    }
}

/// Eventos que a [`Mmu`](crate::mmu::Mmu) avisa ao replacer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// Uma página foi carregada num frame que estava livre.
    Loaded { frame_index: usize },
    /// Uma página foi despejada para dar lugar a outra.
    Evicted { page_number: usize },
}

pub struct PageReplacer {
    policy: ReplacementPolicy,
    num_frames: usize,
    /// Frame carregado há mais tempo entre os que ainda estão ocupados.
    fifo_frame: Option<usize>,
    /// Contadores de uso do MFU, um por página. Duram a simulação inteira.
    usage_count: Vec<u64>,
    rng: StdRng,
}

impl PageReplacer {
    /// Cria o replacer. `seed` só importa para [`ReplacementPolicy::Random`];
    /// sem ela o gerador é semeado pela entropia do sistema.
    pub fn new(
        policy: ReplacementPolicy,
        num_pages: usize,
        num_frames: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        PageReplacer {
            policy,
            num_frames,
            fifo_frame: None,
            usage_count: vec![0; num_pages],
            rng,
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn fifo_frame(&self) -> Option<usize> {
        self.fifo_frame
    }

    pub fn usage_count(&self, page_number: usize) -> u64 {
        self.usage_count.get(page_number).copied().unwrap_or(0)
    }

    /// Mantém o cursor FIFO, qualquer que seja a política.
    pub fn page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Loaded { frame_index } => {
                if self.fifo_frame.is_none() {
                    self.fifo_frame = Some(frame_index);
                }
            }
            PageEvent::Evicted { page_number } => {
                let next = self.fifo_frame.map_or(0, |frame| (frame + 1) % self.num_frames);
                trace!("fifo: página {:#06X} saiu, frame mais antigo agora é {}", page_number, next);
                self.fifo_frame = Some(next);
            }
        }
    }

    /// Escolhe a página a ser despejada. Aging e Second Chance alteram a
    /// tabela durante a busca (contadores e bits de referência).
    pub fn pick_replacement_page(
        &mut self,
        page_table: &mut PageTable,
        last_accessed: Option<usize>,
    ) -> Result<usize> {
        let fifo_frame = self.fifo_frame.unwrap_or(0);

        let victim = match self.policy {
            ReplacementPolicy::Fifo => fifo(page_table, fifo_frame),
            ReplacementPolicy::SecondChance => {
                second_chance(page_table, fifo_frame, self.num_frames)
            }
            ReplacementPolicy::Nru => nru(page_table),
            ReplacementPolicy::Aging => aging(page_table),
            ReplacementPolicy::Mfu => mfu(page_table, &mut self.usage_count, last_accessed),
            ReplacementPolicy::Random => random(page_table, &mut self.rng),
        };

        let victim = victim.ok_or(VmError::NoVictim {
            policy: self.policy,
        })?;

        debug!("{}: vítima escolhida página {:#06X}", self.policy, victim);

        Ok(victim)
    }
}

/// A página que ocupa o frame mais antigo. Se nenhuma ocupa (o que não
/// deveria acontecer), a primeira residente.
fn fifo(page_table: &PageTable, fifo_frame: usize) -> Option<usize> {
    page_table
        .page_in_frame(fifo_frame)
        .or_else(|| page_table.resident_pages().map(|(page, _)| page).next())
}

/// Anda pelos frames a partir do cursor FIFO. Página referenciada perde o
/// bit e o ponteiro avança; a primeira não referenciada é a vítima.
fn second_chance(page_table: &mut PageTable, fifo_frame: usize, num_frames: usize) -> Option<usize> {
    let mut current_frame = fifo_frame;

    // 2 * num_pages voltas bastam para terminar mesmo no pior caso.
    for _ in 0..2 * page_table.num_pages() {
        for (page, entry) in page_table.resident_pages_mut() {
            if entry.frame_index != Some(current_frame) {
                continue;
            }

            if entry.reference {
                trace!("second_chance: página {:#06X} ganhou outra chance", page);
                entry.reference = false;
                current_frame = (current_frame + 1) % num_frames;
            } else {
                return Some(page);
            }
        }
    }

    None
}

/// Classe 0 (não referenciada, limpa) até 3 (referenciada, suja); ganha a
/// primeira página da menor classe.
fn nru(page_table: &PageTable) -> Option<usize> {
    let mut candidates = [None; 4];

    for (page, entry) in page_table.resident_pages() {
        let class = (usize::from(entry.reference) << 1) | usize::from(entry.dirty);

        if candidates[class].is_none() {
            candidates[class] = Some(page);

            if class == 0 {
                break;
            }
        }
    }

    candidates.into_iter().flatten().next()
}

/// Envelhece todas as residentes (shift para a direita, bit de referência
/// entra no bit mais alto) e escolhe o menor contador.
fn aging(page_table: &mut PageTable) -> Option<usize> {
    let mut victim: Option<(usize, u8)> = None;

    for (page, entry) in page_table.resident_pages_mut() {
        entry.aging_counter = (entry.aging_counter >> 1) | (u8::from(entry.reference) << 7);

        if victim.map_or(true, |(_, min_age)| entry.aging_counter < min_age) {
            victim = Some((page, entry.aging_counter));
        }
    }

    victim.map(|(page, _)| page)
}

/// Most Frequently Used: sim, a *mais* usada sai.
fn mfu(page_table: &PageTable, usage_count: &mut [u64], prev_page: Option<usize>) -> Option<usize> {
    if let Some(count) = prev_page.and_then(|page| usage_count.get_mut(page)) {
        *count += 1;
    }

    let mut victim: Option<(usize, u64)> = None;

    for (page, _) in page_table.resident_pages() {
        let count = usage_count[page];

        if victim.map_or(true, |(_, max_count)| count > max_count) {
            victim = Some((page, count));
        }
    }

    victim.map(|(page, _)| page)
}

/// Sorteia entre todas as páginas até cair numa residente.
fn random(page_table: &PageTable, rng: &mut StdRng) -> Option<usize> {
    if page_table.resident_count() == 0 {
        return None;
    }

    loop {
        let page = rng.gen_range(0..page_table.num_pages());

        if page_table.is_resident(page) {
            return Some(page);
        }
    }
}
