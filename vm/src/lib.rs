//! Simulador de memória virtual paginada sob demanda.
//!
//! Um trace de acessos (página virtual + leitura/escrita) é reproduzido
//! contra uma tabela de páginas e um conjunto fixo de frames físicos,
//! contando os page faults. Quando a memória acaba, uma das políticas de
//! [`page_replacer`] escolhe quem sai.

pub mod config;
pub mod error;
pub mod frame_allocator;
pub mod mmu;
pub mod page_replacer;
pub mod page_table;
pub mod simulation;
pub mod trace;
