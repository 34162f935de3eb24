//! Ocupação da memória física.
//!
//! A memória física é só uma tabela de flags livre/ocupado por frame; os
//! frames não sabem qual página os ocupa.

use crate::error::{Result, VmError};

#[derive(Clone, Debug)]
pub struct FrameAllocator {
    occupied: Vec<bool>,
    free_count: usize,
    /// Último frame devolvido por `allocate_free_frame`. A próxima busca
    /// começa logo depois dele.
    prev_free: Option<usize>,
}

impl FrameAllocator {
    pub fn new(num_frames: usize) -> Self {
        FrameAllocator {
            occupied: vec![false; num_frames],
            free_count: num_frames,
            prev_free: None,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.occupied.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    pub fn occupied_count(&self) -> usize {
        self.num_frames() - self.free_count
    }

    pub fn has_free_frame(&self) -> bool {
        self.free_count > 0
    }

    pub fn is_occupied(&self, frame_index: usize) -> bool {
        self.occupied.get(frame_index).copied().unwrap_or(false)
    }

    /// Procura um frame livre de forma circular, a partir do frame seguinte
    /// ao último alocado.
    pub fn allocate_free_frame(&mut self) -> Result<usize> {
        if self.free_count == 0 {
            return Err(VmError::FramesExhausted);
        }

        let num_frames = self.num_frames();
        let mut candidate = self.prev_free.map_or(0, |prev| (prev + 1) % num_frames);

        // Termina: free_count > 0 garante que algum frame está livre.
        while self.occupied[candidate] {
            candidate = (candidate + 1) % num_frames;
        }

        self.occupied[candidate] = true;
        self.free_count -= 1;
        self.prev_free = Some(candidate);

        Ok(candidate)
    }

    /// Ocupa um frame específico, que precisa estar livre.
    pub fn occupy(&mut self, frame_index: usize) -> Result<()> {
        let num_frames = self.num_frames();

        match self.occupied.get_mut(frame_index) {
            Some(occupied) if !*occupied => {
                *occupied = true;
                self.free_count -= 1;
                Ok(())
            }
            _ => Err(VmError::InvalidFrame {
                frame: frame_index,
                num_frames,
            }),
        }
    }

    pub fn release(&mut self, frame_index: usize) -> Result<()> {
        let num_frames = self.num_frames();

        match self.occupied.get_mut(frame_index) {
            Some(occupied) if *occupied => {
                *occupied = false;
                self.free_count += 1;
                Ok(())
            }
            _ => Err(VmError::InvalidFrame {
                frame: frame_index,
                num_frames,
            }),
        }
    }
}
