//! Host–virus association table (Virus–Host DB extract).

use std::collections::HashSet;
use std::io::{BufRead, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationRow {
    #[serde(default)]
    pub virus_name: String,
    #[serde(default)]
    pub refseq_id: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub virus_lineage: String,
    #[serde(default)]
    pub evidence: String,
}

/// Read association rows; header names are normalized (trimmed, lowercased, spaces to `_`)
/// so a raw Virus–Host DB export and the filtered CSV both load.
pub fn read_associations<R: Read>(reader: R, delimiter: u8) -> Result<Vec<AssociationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let header: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase().replace(' ', "_"))
        .collect();
    rdr.set_headers(header);

    let mut rows = Vec::new();
    for rec in rdr.deserialize() {
        let row: AssociationRow = rec?;
        rows.push(row);
    }
    log::debug!("read {} host-virus association rows", rows.len());
    Ok(rows)
}

/// `.tsv` files are tab separated, everything else comma separated.
pub fn load_associations<P: AsRef<Path>>(path: P) -> Result<Vec<AssociationRow>> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path).map_err(|e| {
        FinderError::Parse(format!("cannot open association table '{}': {}", path.display(), e))
    })?;
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    };
    read_associations(std::io::BufReader::new(fh), delimiter)
}

/// Host species list, one name per line; names are trimmed and lowercased, blank lines skipped.
pub fn read_host_list<R: BufRead>(reader: R) -> Result<HashSet<String>> {
    let mut hosts = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            hosts.insert(name.to_lowercase());
        }
    }
    Ok(hosts)
}

pub fn load_host_list<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path).map_err(|e| {
        FinderError::Parse(format!("cannot open host list '{}': {}", path.display(), e))
    })?;
    read_host_list(std::io::BufReader::new(fh))
}

/// Keep rows whose lowercased `host_name` is in `hosts`, dropping exact duplicates.
/// The first occurrence of a duplicate keeps its position.
pub fn filter_associations(rows: &[AssociationRow], hosts: &HashSet<String>) -> Vec<AssociationRow> {
    let mut seen: HashSet<&AssociationRow> = HashSet::new();
    rows.iter()
        .filter(|r| hosts.contains(&r.host_name.to_lowercase()))
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect()
}

/// Comma separated, header `virus_name,refseq_id,host_name,virus_lineage,evidence`.
pub fn write_associations<W: Write>(rows: &[AssociationRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(["virus_name", "refseq_id", "host_name", "virus_lineage", "evidence"])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_associations<P: AsRef<Path>>(rows: &[AssociationRow], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let fh = std::fs::File::create(path)?;
    write_associations(rows, std::io::BufWriter::new(fh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_filtered_csv() {
        let data = "virus_name,refseq_id,host_name,virus_lineage,evidence\n\
                    Escherichia phage T4,NC_000866,Escherichia coli,Viruses; Duplodnaviria,Literature\n\
                    ,NC_0,Escherichia coli,,\n";
        let rows = read_associations(Cursor::new(data), b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].virus_name, "Escherichia phage T4");
        assert_eq!(rows[0].host_name, "Escherichia coli");
        assert_eq!(rows[1].virus_name, "");
    }

    #[test]
    fn reads_raw_tsv_with_extra_columns() {
        let data = "virus tax id\tVirus Name\thost name\tevidence\n\
                    10665\tEscherichia phage T4\tEscherichia coli\tRefSeq\n";
        let rows = read_associations(Cursor::new(data), b'\t').unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].virus_name, "Escherichia phage T4");
        assert_eq!(rows[0].refseq_id, "");
        assert_eq!(rows[0].evidence, "RefSeq");
    }

    fn row(virus: &str, host: &str) -> AssociationRow {
        AssociationRow {
            virus_name: virus.to_string(),
            refseq_id: "NC_0".to_string(),
            host_name: host.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn host_list_is_trimmed_and_lowercased() {
        let hosts = read_host_list(Cursor::new("Escherichia coli\n\n  Klebsiella Pneumoniae \n")).unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains("escherichia coli"));
        assert!(hosts.contains("klebsiella pneumoniae"));
    }

    #[test]
    fn filter_matches_hosts_case_insensitively_and_dedups() {
        let hosts = read_host_list(Cursor::new("escherichia coli\nProteus mirabilis\n")).unwrap();
        let rows = vec![
            row("Escherichia phage T4", "Escherichia coli"),
            row("Bacillus phage phi29", "Bacillus subtilis"),
            row("Proteus phage VB_PmiS-Isfahan", "PROTEUS MIRABILIS"),
            row("Escherichia phage T4", "Escherichia coli"),
            row("Escherichia phage lambda", "escherichia coli"),
        ];
        let kept = filter_associations(&rows, &hosts);
        let names: Vec<&str> = kept.iter().map(|r| r.virus_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Escherichia phage T4", "Proteus phage VB_PmiS-Isfahan", "Escherichia phage lambda"]
        );
    }

    #[test]
    fn filtered_table_reloads() {
        let raw = "virus tax id\tvirus name\tvirus lineage\trefseq id\thost name\tevidence\n\
                   10665\tEscherichia phage T4\tViruses; Duplodnaviria\tNC_000866\tEscherichia coli\tRefSeq\n\
                   10665\tEscherichia phage T4\tViruses; Duplodnaviria\tNC_000866\tEscherichia coli\tRefSeq\n\
                   1\tBacillus phage phi29\tViruses\tNC_011048\tBacillus subtilis\tRefSeq\n";
        let rows = read_associations(Cursor::new(raw), b'\t').unwrap();
        let hosts = read_host_list(Cursor::new("Escherichia coli\n")).unwrap();
        let kept = filter_associations(&rows, &hosts);

        let mut buf = Vec::new();
        write_associations(&kept, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("virus_name,refseq_id,host_name,virus_lineage,evidence\n"));

        let back = read_associations(Cursor::new(buf), b',').unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].refseq_id, "NC_000866");
        assert_eq!(back[0].virus_lineage, "Viruses; Duplodnaviria");
    }

    #[test]
    fn empty_result_still_has_header() {
        let mut buf = Vec::new();
        write_associations(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "virus_name,refseq_id,host_name,virus_lineage,evidence\n");
    }
}
