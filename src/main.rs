use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use phage_finder::config::FinderConfig;
use phage_finder::crispr::parse_phage_ids;
use phage_finder::features::{self, FeatureTable, SnapshotMeta};
use phage_finder::io::{features::save_feature_table, spacers};
use phage_finder::pipeline;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "phage-finder",
    author,
    version,
    about = "Rank candidate phages for a bacterial host and verify them with CRISPR spacers",
    arg_required_else_help = true
)]
struct Cli {
    /// JSON config file (paths and defaults); flags below override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Data directory holding feature tables, association table and spacer cache
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract k-mer composition features into a CSV feature table
    Features {
        #[command(subcommand)]
        target: FeatureTarget,
    },
    /// Filter a Virus–Host DB export down to the hosts in a species list
    Associations {
        #[arg(long, default_value = "external_data/virushostdb.tsv")]
        virushostdb: PathBuf,
        /// One host species name per line
        #[arg(long = "bacteria-list", default_value = "bacteria_list.txt")]
        bacteria_list: PathBuf,
        /// Output CSV (defaults to the configured association table)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rank phages for every bacterium; the output CSV is replaced wholesale
    Rank {
        #[arg(short = 'k', long = "top-k", allow_negative_numbers = true)]
        top_k: Option<i64>,
        /// Output CSV (defaults to the configured ranking file)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rank phages for one bacterium and print JSON
    Predict {
        #[arg(short, long)]
        bacteria: String,
        #[arg(short = 'k', long = "top-k", allow_negative_numbers = true)]
        top_k: Option<i64>,
    },
    /// Check phages against the bacterium's cached CRISPR spacers and print JSON
    CrisprCheck {
        #[arg(short, long)]
        bacteria: String,
        /// Comma-separated phage ids
        #[arg(short, long = "phage-ids")]
        phage_ids: String,
        #[arg(short = 'm', long = "max-mismatches", allow_negative_numbers = true)]
        max_mismatches: Option<i64>,
        /// Phage multi-FASTA (defaults to the configured file)
        #[arg(long)]
        fasta: Option<PathBuf>,
    },
    /// Write the effective configuration as JSON, for use with --config
    Config {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Extract spacers from a CRISPRCasFinder result.json into the spacer cache
    Spacers {
        #[arg(long = "result-json")]
        result_json: PathBuf,
        #[arg(short, long)]
        bacteria: String,
        /// Cache directory (defaults to the configured spacer cache)
        #[arg(short, long = "out-dir")]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum FeatureTarget {
    /// One row per FASTA record under <genomes-dir>/<species>/**/*.fna
    Bacteria {
        #[arg(long = "genomes-dir", default_value = "genomes")]
        genomes_dir: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also save a binary snapshot of the table
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// One row per record of a phage multi-FASTA
    Phages {
        #[arg(long)]
        fasta: Option<PathBuf>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn init_log() {
    env_logger::Builder::from_default_env().init();
}

fn load_config(cli: &Cli) -> Result<FinderConfig> {
    let mut cfg = match &cli.config {
        Some(p) => FinderConfig::load(p).with_context(|| format!("loading config '{}'", p.display()))?,
        None => FinderConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        let moved = FinderConfig::with_data_dir(dir);
        cfg = FinderConfig {
            phage_fasta: cfg.phage_fasta,
            top_k: cfg.top_k,
            max_mismatches: cfg.max_mismatches,
            kmer_size: cfg.kmer_size,
            ..moved
        };
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    init_log();
    let cli = Cli::parse();
    let mut cfg = load_config(&cli)?;

    match cli.command {
        Commands::Features { target } => run_features(&cfg, target),
        Commands::Associations { virushostdb, bacteria_list, out } => {
            let out = out.unwrap_or_else(|| cfg.associations.clone());
            let rows = pipeline::filter_host_associations(&virushostdb, &bacteria_list, &out)
                .with_context(|| format!("filtering '{}'", virushostdb.display()))?;
            let phages: BTreeSet<&str> = rows.iter().map(|r| r.virus_name.as_str()).collect();
            let hosts: BTreeSet<&str> = rows.iter().map(|r| r.host_name.as_str()).collect();
            println!("interactions: {}", rows.len());
            println!("unique phages: {}", phages.len());
            println!("unique bacteria: {}", hosts.len());
            println!("saved: {}", out.display());
            Ok(())
        }
        Commands::Rank { top_k, out } => {
            if let Some(out) = out {
                cfg.ranking_out = out;
            }
            let top_k = top_k.unwrap_or(cfg.top_k);
            let records = pipeline::run_ranking(&cfg, top_k)?;
            println!("rows: {}", records.len());
            println!("saved: {}", cfg.ranking_out.display());
            Ok(())
        }
        Commands::Predict { bacteria, top_k } => {
            let list = pipeline::predict(&cfg, &bacteria, top_k.unwrap_or(cfg.top_k))?;
            println!("{}", serde_json::to_string_pretty(&list)?);
            Ok(())
        }
        Commands::CrisprCheck { bacteria, phage_ids, max_mismatches, fasta } => {
            if let Some(fasta) = fasta {
                cfg.phage_fasta = fasta;
            }
            let ids = parse_phage_ids(&phage_ids);
            let report = pipeline::crispr_check(&cfg, &bacteria, &ids, max_mismatches.unwrap_or(cfg.max_mismatches))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Config { out } => {
            cfg.validate()?;
            cfg.dump(&out).with_context(|| format!("writing config '{}'", out.display()))?;
            println!("saved: {}", out.display());
            Ok(())
        }
        Commands::Spacers { result_json, bacteria, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| cfg.crispr_cache_dir.clone());
            let found = spacers::extract_spacers_from_file(&result_json)
                .with_context(|| format!("reading CRISPRCasFinder result '{}'", result_json.display()))?;
            let path = spacers::write_spacers(&out_dir, &bacteria, &found)?;
            println!("{}: spacers={} -> {}", bacteria, found.len(), path.display());
            Ok(())
        }
    }
}

fn run_features(cfg: &FinderConfig, target: FeatureTarget) -> Result<()> {
    cfg.validate()?;
    let (mut table, source, out, snapshot): (FeatureTable, String, PathBuf, Option<PathBuf>) = match target {
        FeatureTarget::Bacteria { genomes_dir, out, snapshot } => {
            let t = features::extract_bacteria(&genomes_dir, cfg.kmer_size)
                .with_context(|| format!("extracting features from '{}'", genomes_dir.display()))?;
            let out = out.unwrap_or_else(|| cfg.bacteria_features.clone());
            (t, genomes_dir.display().to_string(), out, snapshot)
        }
        FeatureTarget::Phages { fasta, out, snapshot } => {
            let fasta = fasta.unwrap_or_else(|| cfg.phage_fasta.clone());
            let t = features::extract_phages(&fasta, cfg.kmer_size)
                .with_context(|| format!("extracting features from '{}'", fasta.display()))?;
            let out = out.unwrap_or_else(|| cfg.phage_features.clone());
            (t, fasta.display().to_string(), out, snapshot)
        }
    };

    if table.is_empty() {
        anyhow::bail!("'{}' contains no sequences", source);
    }

    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    save_feature_table(&table, &out).with_context(|| format!("writing '{}'", out.display()))?;
    println!("rows: {}", table.len());
    println!("k-mers: {}", table.columns.len());
    println!("saved: {}", out.display());

    if let Some(snap) = snapshot {
        table.set_meta(SnapshotMeta {
            source: Some(source),
            build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
            build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        });
        table
            .save_to_file(&snap)
            .with_context(|| format!("writing snapshot '{}'", snap.display()))?;
        println!("snapshot saved: {}", snap.display());
    }
    Ok(())
}
