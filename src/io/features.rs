//! Feature tables as CSV: `species|phage_id, [fasta_record], genome_length, gc_percent, kmer_*`.
//! Files with the `.fvs` extension are bincode snapshots of the same table.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::{FinderError, Result};
use crate::features::{EntityKind, FeatureRow, FeatureTable};

pub const KMER_PREFIX: &str = "kmer_";

/// Extension of binary feature table snapshots.
pub const SNAPSHOT_EXT: &str = "fvs";

fn is_snapshot(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXT)
}

fn parse_f64(field: &str, column: &str, line: usize) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0.0);
    }
    field.parse::<f64>().map_err(|_| {
        FinderError::Parse(format!("line {}: column '{}' is not a number: '{}'", line, column, field))
    })
}

pub fn write_feature_csv<W: Write>(table: &FeatureTable, writer: W) -> Result<()> {
    let with_record = table.rows.iter().any(|r| r.record.is_some());
    let mut w = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = vec![table.kind.id_column().to_string()];
    if with_record {
        header.push("fasta_record".to_string());
    }
    header.push("genome_length".to_string());
    header.push("gc_percent".to_string());
    header.extend(table.columns.iter().map(|c| format!("{}{}", KMER_PREFIX, c)));
    w.write_record(&header)?;

    for row in &table.rows {
        let mut rec: Vec<String> = Vec::with_capacity(header.len());
        rec.push(row.id.clone());
        if with_record {
            rec.push(row.record.clone().unwrap_or_default());
        }
        rec.push(row.genome_length.to_string());
        rec.push(row.gc_percent.to_string());
        rec.extend(row.values.iter().map(f64::to_string));
        w.write_record(&rec)?;
    }
    w.flush()?;
    Ok(())
}

/// Header names are trimmed and lowercased before matching; k-mer names are kept uppercase.
pub fn read_feature_csv<R: Read>(reader: R) -> Result<FeatureTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let find = |name: &str| header.iter().position(|h| h == name);
    let (kind, id_col) = if let Some(i) = find(EntityKind::Bacteria.id_column()) {
        (EntityKind::Bacteria, i)
    } else if let Some(i) = find(EntityKind::Phage.id_column()) {
        (EntityKind::Phage, i)
    } else {
        return Err(FinderError::DegenerateInput(
            "feature table has neither a 'species' nor a 'phage_id' column".to_string(),
        ));
    };
    let record_col = find("fasta_record");
    let length_col = find("genome_length");
    let gc_col = find("gc_percent");

    let kmer_cols: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.strip_prefix(KMER_PREFIX).map(|k| (i, k.to_ascii_uppercase())))
        .collect();
    let columns: Vec<String> = kmer_cols.iter().map(|(_, k)| k.clone()).collect();

    let mut rows = Vec::new();
    for (n, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let line = n + 2;
        let get = |i: usize| rec.get(i).unwrap_or("");

        let record = record_col
            .map(|i| get(i).trim().to_string())
            .filter(|s| !s.is_empty());
        let genome_length = match length_col {
            Some(i) => parse_f64(get(i), "genome_length", line)? as usize,
            None => 0,
        };
        let gc_percent = match gc_col {
            Some(i) => parse_f64(get(i), "gc_percent", line)?,
            None => 0.0,
        };
        let values = kmer_cols
            .iter()
            .map(|(i, k)| parse_f64(get(*i), k, line))
            .collect::<Result<Vec<f64>>>()?;

        rows.push(FeatureRow {
            id: get(id_col).to_string(),
            record,
            genome_length,
            gc_percent,
            values,
        });
    }

    log::debug!("read {} {:?} feature rows over {} k-mers", rows.len(), kind, columns.len());
    Ok(FeatureTable::new(kind, columns, rows))
}

pub fn load_feature_table<P: AsRef<Path>>(path: P) -> Result<FeatureTable> {
    let path = path.as_ref();
    if is_snapshot(path) {
        let table = FeatureTable::load_from_file(path)?;
        log::debug!("loaded snapshot {} ({:?}, {:?})", path.display(), table.kind, table.meta.build_timestamp);
        return Ok(table);
    }
    let fh = std::fs::File::open(path).map_err(|e| {
        FinderError::Parse(format!("cannot open feature table '{}': {}", path.display(), e))
    })?;
    read_feature_csv(std::io::BufReader::new(fh))
}

pub fn save_feature_table<P: AsRef<Path>>(table: &FeatureTable, path: P) -> Result<()> {
    let path = path.as_ref();
    if is_snapshot(path) {
        return table.save_to_file(path);
    }
    let fh = std::fs::File::create(path)?;
    write_feature_csv(table, std::io::BufWriter::new(fh))
}
