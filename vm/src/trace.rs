//! Leitura dos traces de acesso.
//!
//! O formato é texto puro:
//!
//! ```text
//! <num_pages> <num_frames>
//! <página> <r|w>
//! <página> <r|w>
//! ...
//! ```
//!
//! Linhas em branco são ignoradas. A leitura é preguiçosa: um acesso por
//! vez, na ordem do arquivo.

use std::io::{BufRead, Lines};

use crate::{
    error::{Result, VmError},
    page_table::AccessMode,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceHeader {
    pub num_pages: usize,
    pub num_frames: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    pub page_number: usize,
    pub mode: AccessMode,
}

pub struct TraceReader<R> {
    lines: Lines<R>,
    line_number: usize,
    header: TraceHeader,
}

impl<R: BufRead> TraceReader<R> {
    /// Lê o header e deixa o leitor posicionado no primeiro acesso.
    pub fn new(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let mut line_number = 0;

        let header_line = loop {
            let Some(line) = lines.next() else {
                return Err(VmError::MissingHeader);
            };
            let line = line?;
            line_number += 1;

            if !line.trim().is_empty() {
                break line;
            }
        };

        let header = parse_header(&header_line)
            .ok_or_else(|| VmError::MalformedHeader { line: header_line })?;

        Ok(TraceReader {
            lines,
            line_number,
            header,
        })
    }

    pub fn header(&self) -> TraceHeader {
        self.header
    }

    fn parse_access(&self, line: &str) -> Result<TraceEvent> {
        let malformed = || VmError::MalformedAccess {
            line_number: self.line_number,
            line: line.to_owned(),
        };

        let mut tokens = line.split_whitespace();
        let (Some(page), Some(mode), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(malformed());
        };

        let page: i64 = page.parse().map_err(|_| malformed())?;

        let mut mode_chars = mode.chars();
        let mode = match (mode_chars.next(), mode_chars.next()) {
            (Some(c), None) => AccessMode::from_char(c).ok_or_else(malformed)?,
            _ => return Err(malformed()),
        };

        // Índices negativos são acessos inválidos, não erro de formato.
        let page_number = usize::try_from(page).map_err(|_| VmError::PageOutOfRange {
            page,
            num_pages: self.header.num_pages,
        })?;

        Ok(TraceEvent { page_number, mode })
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(self.parse_access(&line));
        }
    }
}

fn parse_header(line: &str) -> Option<TraceHeader> {
    let mut tokens = line.split_whitespace();

    let num_pages = tokens.next()?.parse().ok()?;
    let num_frames = tokens.next()?.parse().ok()?;

    if tokens.next().is_some() {
        return None;
    }

    Some(TraceHeader {
        num_pages,
        num_frames,
    })
}
