use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::kmer::GenomeFeatureVector;
use super::table::{EntityKind, FeatureTable};
use crate::error::{validate_kmer_size, FinderError, Result};
use crate::io::fasta::FastaReader;

const GENOME_EXT: &str = "fna";

/// 递归收集目录下所有 `.fna` 文件（排序，保证输出稳定）
fn collect_fna_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_fna_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(GENOME_EXT) {
            out.push(path);
        }
    }
    Ok(())
}

fn file_vectors(species: &str, path: &Path, k: usize) -> Result<Vec<GenomeFeatureVector>> {
    let reader = FastaReader::open(path)?;
    let mut out = Vec::new();
    for rec in reader {
        let rec = rec?;
        out.push(GenomeFeatureVector::from_sequence(species, Some(rec.id), &rec.seq, k)?);
    }
    log::debug!("{}: {} records from {}", species, out.len(), path.display());
    Ok(out)
}

/// 细菌特征：`genomes_dir/<species>/**/*.fna`，每条 FASTA 记录一行，id 为物种目录名
pub fn extract_bacteria<P: AsRef<Path>>(genomes_dir: P, k: usize) -> Result<FeatureTable> {
    let k = validate_kmer_size(k)?;
    let base = genomes_dir.as_ref();
    if !base.is_dir() {
        return Err(FinderError::not_found("genomes directory", base.display().to_string()));
    }

    let mut species_dirs: Vec<PathBuf> = std::fs::read_dir(base)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    species_dirs.sort();

    let mut jobs: Vec<(String, PathBuf)> = Vec::new();
    for dir in &species_dirs {
        let species = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut files = Vec::new();
        collect_fna_files(dir, &mut files)?;
        if files.is_empty() {
            log::warn!("species directory {} has no .{} files", dir.display(), GENOME_EXT);
        }
        jobs.extend(files.into_iter().map(|f| (species.clone(), f)));
    }
    log::info!("extracting {}-mer features from {} genome files", k, jobs.len());

    let per_file: Vec<Vec<GenomeFeatureVector>> = jobs
        .par_iter()
        .map(|(species, path)| file_vectors(species, path, k))
        .collect::<Result<_>>()?;
    let vectors: Vec<GenomeFeatureVector> = per_file.into_iter().flatten().collect();

    Ok(FeatureTable::from_vectors(EntityKind::Bacteria, vectors))
}

/// 噬菌体特征：一个多序列 FASTA，每条记录一行，id 为记录 id
pub fn extract_phages<P: AsRef<Path>>(fasta: P, k: usize) -> Result<FeatureTable> {
    let k = validate_kmer_size(k)?;
    let records = FastaReader::open(fasta.as_ref())?.collect::<Result<Vec<_>>>()?;
    log::info!("extracting {}-mer features from {} phage genomes", k, records.len());

    let vectors: Vec<GenomeFeatureVector> = records
        .par_iter()
        .map(|rec| GenomeFeatureVector::from_sequence(rec.id.clone(), None, &rec.seq, k))
        .collect::<Result<_>>()?;

    Ok(FeatureTable::from_vectors(EntityKind::Phage, vectors))
}
