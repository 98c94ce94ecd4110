//! Part lists serialized as a JSON array of records

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::network::{Part, PartKind};
use crate::sim::{timer_delay, MAX_TIMER_DELAY};

/// Largest number of incoming connections an exported part may have
pub const MAX_INPUTS: usize = 255;

/// Check that every part has at most [`MAX_INPUTS`] incoming connections, and that timer
/// delays are within [`MAX_TIMER_DELAY`]
pub fn check_limits<P>(parts: &[Part<P>]) -> Result<()> {
    for p in parts {
        if let PartKind::Timer { ticks, seconds } = p.kind {
            timer_delay(p.id, ticks, seconds)?;
        }
        if p.connections_from.len() > MAX_INPUTS {
            return Err(Error::TooManyInputs {
                id: p.id,
                count: p.connections_from.len(),
                max: MAX_INPUTS,
            });
        }
    }
    Ok(())
}

/// Read a part list
pub fn read_parts<P: DeserializeOwned, R: Read>(r: R) -> Result<Vec<Part<P>>> {
    Ok(serde_json::from_reader(r)?)
}

/// Write a part list, after checking the export limits
pub fn write_parts<P: Serialize, W: Write>(w: &mut W, parts: &[Part<P>]) -> Result<()> {
    check_limits(parts)?;
    serde_json::to_writer_pretty(&mut *w, parts)?;
    writeln!(w)?;
    Ok(())
}

/// Read a part list from a file
pub fn read_part_file<P: DeserializeOwned>(path: &Path) -> Result<Vec<Part<P>>> {
    let f = File::open(path)?;
    let parts = read_parts(BufReader::new(f))?;
    info!("Read {} parts from {}", parts.len(), path.display());
    Ok(parts)
}

/// Write a part list to a file
pub fn write_part_file<P: Serialize>(path: &Path, parts: &[Part<P>]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_parts(&mut w, parts)?;
    w.flush()?;
    info!("Wrote {} parts to {}", parts.len(), path.display());
    Ok(())
}
