use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use genome_lib::constants::{
    DEFAULT_GENE_LENGTH, DEFAULT_MIN_NUM_SEGMENTS, DEFAULT_SEED, DEFAULT_SEGMENT_LENGTH,
};
use genome_lib::parse::read_gene;
use genome_lib::{generate_cover, CoverConfig, Gene, Sequencer, SequencerConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "genome")]
#[command(version = "0.1.0")]
#[command(about = "Rebuild a sequence from redundant overlapping segments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sequence a random gene from a generated segment cover
    Run {
        /// Gene length
        #[arg(short, long, default_value_t = DEFAULT_GENE_LENGTH)]
        gene_length: usize,

        /// Segment length
        #[arg(short, long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
        segment_length: usize,

        /// Number of randomly placed segments
        #[arg(short = 'n', long, default_value_t = DEFAULT_MIN_NUM_SEGMENTS)]
        min_num_segments: usize,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Sequence the first gene of a FASTA/FASTQ file from a generated segment cover
    Fasta {
        /// Input FASTA/FASTQ file (may be gzipped)
        input: PathBuf,

        /// Segment length
        #[arg(short, long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
        segment_length: usize,

        /// Number of randomly placed segments
        #[arg(short = 'n', long, default_value_t = DEFAULT_MIN_NUM_SEGMENTS)]
        min_num_segments: usize,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { gene_length, segment_length, min_num_segments, threads, seed, verbose } => {
            let cover = CoverConfig { gene_length, segment_length, min_num_segments, seed };
            run_command(None, cover, threads, verbose)?;
        }
        Commands::Fasta { input, segment_length, min_num_segments, threads, seed, verbose } => {
            let gene = read_gene(&input)?;
            info!("Loaded gene of length {} from {}", gene.len(), input.display());
            let cover =
                CoverConfig { gene_length: gene.len(), segment_length, min_num_segments, seed };
            run_command(Some(gene), cover, threads, verbose)?;
        }
    }

    Ok(())
}

/// Cover a gene with segments, reconstruct it and verify the result
fn run_command(
    gene: Option<Gene>,
    cover: CoverConfig,
    threads: usize,
    verbose: bool,
) -> anyhow::Result<()> {
    cover.validate().context("Invalid cover parameters")?;
    let mut rng = cover.rng();

    let gene = match gene {
        Some(gene) => gene,
        None => {
            info!("Generating random gene of length {}...", cover.gene_length);
            Gene::random(cover.gene_length, &mut rng)
        }
    };

    info!("Generating segment cover...");
    let start = Instant::now();
    let segments = generate_cover(&gene, cover.segment_length, cover.min_num_segments, &mut rng)?;
    info!(
        "  {} segments of length {} in {:.3}s",
        segments.len(),
        segments.segment_length(),
        start.elapsed().as_secs_f64()
    );

    let config = SequencerConfig {
        num_threads: threads,
        verbose,
        ..SequencerConfig::new(gene.len(), cover.segment_length)?
    };
    let sequencer = Sequencer::new(config)?;

    let start = Instant::now();
    let recon = sequencer.run(&segments)?;
    let elapsed = start.elapsed();

    info!("Sequencing finished in {:.3}s", elapsed.as_secs_f64());
    info!("  Segments: {}", recon.num_segments());
    info!("  Unique segments: {}", recon.num_unique_segments());
    info!("  Chains: {}", recon.num_chains());
    info!(
        "  Throughput: {:.2} segments/s",
        recon.num_segments() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if !recon.is_fully_connected() {
        warn!("Segments did not join into a single chain");
    }
    if recon.sequence() != gene.as_bytes() {
        bail!(
            "Reconstructed sequence differs from the source ({} vs {} characters)",
            recon.len(),
            gene.len()
        );
    }

    info!("Reconstruction matches the source gene");
    Ok(())
}
