//! Erros do simulador.
//!
//! Tudo o que pode dar errado durante uma simulação vira um [`VmError`].
//! Nenhum deles é recuperável: quem chama decide encerrar o processo.

use thiserror::Error;

use crate::page_replacer::ReplacementPolicy;

pub type Result<T> = std::result::Result<T, VmError>;

#[derive(Error, Debug)]
pub enum VmError {
    /// Acesso a uma página fora de `[0, num_pages)`.
    #[error("acesso inválido: página {page} fora de [0, {num_pages})")]
    PageOutOfRange { page: i64, num_pages: usize },

    /// A política devolveu uma página que não está residente.
    #[error("política {policy} escolheu a página {page}, que não está residente")]
    InvalidVictim {
        policy: ReplacementPolicy,
        page: usize,
    },

    #[error("política {policy} não encontrou nenhuma página vítima")]
    NoVictim { policy: ReplacementPolicy },

    #[error("não há frame livre para alocar")]
    FramesExhausted,

    #[error("frame {frame} não é um frame ocupado em [0, {num_frames})")]
    InvalidFrame { frame: usize, num_frames: usize },

    #[error("trace sem o header `<num_pages> <num_frames>`")]
    MissingHeader,

    #[error("header do trace mal formado: {line:?}")]
    MalformedHeader { line: String },

    #[error("acesso mal formado na linha {line_number} do trace: {line:?}")]
    MalformedAccess { line_number: usize, line: String },

    #[error("política de substituição desconhecida {0:?} (esperado fifo, second_chance, nru, aging, mfu ou random)")]
    UnknownPolicy(String),

    #[error("a frequência do clock deve ser um inteiro positivo, recebi {0}")]
    InvalidClockFrequency(i64),

    /// Vem do header do trace, não da linha de comando.
    #[error("a simulação precisa de pelo menos um frame físico")]
    NoFrames,

    #[error("erro de I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl VmError {
    /// Erros de uso: argumentos ruins, detectados antes de qualquer estado
    /// da simulação existir.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            VmError::UnknownPolicy(_) | VmError::InvalidClockFrequency(_)
        )
    }
}
