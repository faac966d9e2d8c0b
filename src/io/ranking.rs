//! Persisted ranking: `bacteria,rank,phage_id,similarity`, replaced wholesale on each run.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::rank::RankingRecord;

pub fn write_ranking<W: Write>(records: &[RankingRecord], writer: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    for r in records {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_ranking<R: Read>(reader: R) -> Result<Vec<RankingRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        out.push(rec?);
    }
    Ok(out)
}

/// Written to a sibling temp file first, then renamed over `path`, so readers
/// never see a half-written ranking.
pub fn save_ranking<P: AsRef<Path>>(records: &[RankingRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let fh = std::fs::File::create(&tmp)?;
        write_ranking(records, std::io::BufWriter::new(fh))?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
