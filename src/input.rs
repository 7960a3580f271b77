use std::io;
use std::path::Path;

use crate::process::ProcessSpec;
use crate::utils::prelude::*;

/// Read a batch from CSV with an `id,arrival,execution` header
pub fn from_csv(path: &Path) -> Result<Vec<ProcessSpec>> {
    info!(path = %path.display(), "reading processes");
    from_reader(std::fs::File::open(path)?)
}

pub fn from_reader(reader: impl io::Read) -> Result<Vec<ProcessSpec>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let specs = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<ProcessSpec>, _>>()?;
    Ok(specs)
}

/// The front end refuses to bother the engines with tiny batches
pub fn check_batch_size(specs: &[ProcessSpec], min: usize) -> Result<()> {
    if specs.len() < min {
        return Err(Error::BatchTooSmall {
            min,
            got: specs.len(),
        });
    }
    Ok(())
}
