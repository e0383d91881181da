use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Reference tree in newick format
    #[arg(short, long, value_name = "TREE_FILE")]
    pub(super) tree_file: PathBuf,

    /// Reference sequences, aligned, in fasta format
    #[arg(short, long, value_name = "REF_SEQ_FILE")]
    pub(super) ref_seq_file: PathBuf,

    /// Query sequences to insert, aligned to the reference coordinate system
    #[arg(short, long, value_name = "QUERY_FILE")]
    pub(super) query_file: PathBuf,

    /// Taxonomy file: leaf name, tab, ';'- or '/'-separated rank string
    #[arg(long, value_name = "TAXONOMY_FILE")]
    pub(super) taxonomy_file: Option<PathBuf>,

    /// Mask file selecting which alignment columns contribute to scoring
    #[arg(long, value_name = "MASK_FILE")]
    pub(super) mask_file: Option<PathBuf>,

    /// Output newick tree with insertions grafted
    #[arg(short, long, value_name = "OUTPUT_TREE_FILE", default_value = "placed.tree")]
    pub(super) output_tree_file: PathBuf,

    /// Output results log, one record per query
    #[arg(long, value_name = "RESULTS_FILE", default_value = "placement_results.tsv")]
    pub(super) results_file: PathBuf,

    /// Number of best-matching insertion points to retain per query
    #[arg(short = 'k', long, default_value_t = 10)]
    pub(super) matches: usize,

    /// Minimum match percent required to accept an insertion
    #[arg(short = 's', long, default_value_t = 80)]
    pub(super) score_threshold: u64,

    /// Fast-descent cutoff percentage used by the pruned search
    #[arg(long, default_value_t = 20)]
    pub(super) fast_percent: u64,

    /// Number of decimal digits to round branch lengths to in the output tree
    #[arg(long, default_value_t = 6)]
    pub(super) branch_length_precision: usize,

    /// Use Jukes-Cantor corrected distances for new branch lengths
    #[arg(long, default_value_t = true)]
    pub(super) jukes_cantor: bool,

    /// Run the top-down Fitch refinement pass after bottom-up inference
    #[arg(long, default_value_t = true)]
    pub(super) fitch_refine: bool,

    /// Re-emit node attributes as bracketed comments in the output tree
    #[arg(long, default_value_t = false)]
    pub(super) verbose_comments: bool,
}
