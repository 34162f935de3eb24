//! Tabela de páginas de um único espaço de endereçamento.
//!
//! Cada página virtual tem uma [`PageTableEntry`], indexada pelo número da
//! página. Só guardamos metadados: o conteúdo das páginas não é modelado.

use std::fmt;

/// O tipo de um acesso à memória.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    /// Converte o caractere usado nos traces (`r` ou `w`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' => Some(AccessMode::Read),
            'w' => Some(AccessMode::Write),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AccessMode::Read => 'r',
            AccessMode::Write => 'w',
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct PageTableEntry {
    /// Frame físico onde a página está. `None` quando não residente, então
    /// "mapeada" é sempre o mesmo que `frame_index.is_some()`.
    pub(crate) frame_index: Option<usize>,
    pub(crate) dirty: bool,
    pub(crate) reference: bool,
    /// Só para diagnóstico.
    pub(crate) last_access_mode: Option<AccessMode>,
    /// Usado apenas pela política Aging.
    pub(crate) aging_counter: u8,
}

impl PageTableEntry {
    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    pub fn mapped(&self) -> bool {
        self.frame_index.is_some()
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn reference(&self) -> bool {
        self.reference
    }

    pub fn last_access_mode(&self) -> Option<AccessMode> {
        self.last_access_mode
    }

    pub fn aging_counter(&self) -> u8 {
        self.aging_counter
    }

    /// Registra um acesso numa página já residente.
    fn touch(&mut self, mode: AccessMode) {
        self.reference = true;
        self.dirty |= mode == AccessMode::Write;
        self.last_access_mode = Some(mode);
    }
}

#[derive(Clone, Debug)]
pub struct PageTable {
    table: Vec<PageTableEntry>,
}

impl PageTable {
    /// Cria uma tabela com `num_pages` entradas, todas não residentes.
    pub fn new(num_pages: usize) -> Self {
        PageTable {
            table: vec![PageTableEntry::default(); num_pages],
        }
    }

    pub fn num_pages(&self) -> usize {
        self.table.len()
    }

    pub fn get(&self, page_number: usize) -> Option<&PageTableEntry> {
        self.table.get(page_number)
    }

    pub fn is_resident(&self, page_number: usize) -> bool {
        self.get(page_number).map_or(false, PageTableEntry::mapped)
    }

    /// Mapeia `page_number` em `frame_index`.
    ///
    /// # Panics
    ///
    /// Se a página estiver fora da tabela ou já residente. A [`Mmu`](crate::mmu::Mmu)
    /// sempre verifica antes de chamar.
    pub fn mark_resident(&mut self, page_number: usize, frame_index: usize, mode: AccessMode) {
        let entry = &mut self.table[page_number];
        assert!(!entry.mapped(), "página {page_number} já está residente");

        entry.frame_index = Some(frame_index);
        entry.touch(mode);
    }

    /// Acesso com hit: liga o bit de referência (e o dirty, se for escrita).
    pub fn mark_accessed(&mut self, page_number: usize, mode: AccessMode) {
        let entry = &mut self.table[page_number];
        debug_assert!(entry.mapped());

        entry.touch(mode);
    }

    /// Remove a página da memória, zerando a entrada, e devolve o frame que
    /// ela ocupava. `None` se a página não estava residente.
    pub fn evict(&mut self, page_number: usize) -> Option<usize> {
        let entry = self.table.get_mut(page_number)?;
        let frame_index = entry.frame_index?;

        *entry = PageTableEntry::default();

        Some(frame_index)
    }

    pub fn clear_all_reference_bits(&mut self) {
        for entry in &mut self.table {
            entry.reference = false;
        }
    }

    /// Páginas residentes, em ordem crescente de número de página.
    pub fn resident_pages(&self) -> impl Iterator<Item = (usize, &PageTableEntry)> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.mapped())
    }

    pub(crate) fn resident_pages_mut(
        &mut self,
    ) -> impl Iterator<Item = (usize, &mut PageTableEntry)> + '_ {
        self.table
            .iter_mut()
            .enumerate()
            .filter(|(_, entry)| entry.mapped())
    }

    pub fn resident_count(&self) -> usize {
        self.resident_pages().count()
    }

    /// Busca reversa frame -> página. É uma varredura linear, já que os
    /// frames não sabem quem os ocupa.
    pub fn page_in_frame(&self, frame_index: usize) -> Option<usize> {
        self.resident_pages()
            .find(|(_, entry)| entry.frame_index == Some(frame_index))
            .map(|(page, _)| page)
    }
}
