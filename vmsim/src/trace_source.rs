//! De onde vem o trace: um arquivo, se foi passado `--trace`, ou a entrada
//! padrão.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use log::debug;

pub fn open(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            debug!("trace_source: lendo {}", path.display());
            Ok(Box::new(BufReader::new(File::open(path)?)))
        }
        None => {
            debug!("trace_source: lendo da entrada padrão");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}
