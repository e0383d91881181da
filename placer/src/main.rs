use crate::cli::Cli;
use crate::error::{RunError, GENERIC_EXIT_CODE};
use anyhow::{Context, Error};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use parsimony::{
    ancestor, assign_internal_taxonomy, eval::Evaluation, graft, inherited_taxonomy,
    jukes_cantor_distance, raw_distance, score, BestKCollector, NodeId, ParsimonySet, Placement,
    SearchParams, TaxonomyStore, Tree, VoteTrie,
};
use pretty_env_logger::env_logger::Builder;
use std::collections::HashMap;
use std::io::Write as _;

mod cli;
mod error;
mod io;

type Result<T> = std::result::Result<T, Error>;

struct ResultRow {
    query: String,
    match_percent: i64,
    assigned: String,
    correct: String,
}

fn leaf_sets(tree: &Tree, ref_records: &[io::fasta::SeqRecord]) -> HashMap<NodeId, ParsimonySet> {
    let mut sets = HashMap::new();
    for leaf in tree.leaves() {
        let title = &tree.node(leaf).title;
        if let Some(record) = ref_records.iter().find(|r| &r.name == title) {
            sets.insert(leaf, ParsimonySet::from_sequence(&record.sequence));
        }
    }
    sets
}

fn rank_depth(taxonomy: &str) -> usize {
    parsimony::parse_lineage(taxonomy).len()
}

fn run() -> Result<()> {
    let cli = Cli::try_parse().context("parsing command line arguments")?;
    if cli.matches == 0 {
        return Err(Error::new(RunError::InvalidArguments("--matches must be at least 1".to_string())));
    }
    if cli.score_threshold > 100 {
        return Err(Error::new(RunError::InvalidArguments("--score-threshold must be between 0 and 100".to_string())));
    }
    if cli.fast_percent == 0 || cli.fast_percent > 100 {
        return Err(Error::new(RunError::InvalidArguments("--fast-percent must be between 1 and 100".to_string())));
    }
    info!("placer run started");

    let mut tree = io::newick::read_file(&cli.tree_file).map_err(|e| Error::new(RunError::TreeFileMalformed(e.to_string())))?;
    info!("loaded reference tree with {} nodes", tree.len());

    let ref_records = io::fasta::read_all(&cli.ref_seq_file)
        .map_err(|e| Error::new(RunError::ReferenceSequenceFileUnreadable(e.to_string())))?;
    let alignment_width = ref_records.iter().map(|r| r.sequence.len()).max().unwrap_or(0);
    info!("loaded {} reference sequences, alignment width {}", ref_records.len(), alignment_width);

    let mut missing = Vec::new();
    for leaf in tree.leaves() {
        if !ref_records.iter().any(|r| r.name == tree.node(leaf).title) {
            missing.push(tree.node(leaf).title.clone());
        }
    }
    if !missing.is_empty() {
        return Err(Error::new(RunError::MissingReferenceSequences(missing.join(", "))));
    }

    let mask: parsimony::Mask = match &cli.mask_file {
        Some(path) => io::mask::read_file(path).map_err(|e| Error::new(RunError::MaskFileUnreadable(e.to_string())))?,
        None => vec![1u8; alignment_width],
    };

    let taxonomy_table = match &cli.taxonomy_file {
        Some(path) => io::taxonomy_file::read_file(path).map_err(|e| Error::new(RunError::TaxonomyFileUnreadable(e.to_string())))?,
        None => parsimony::TaxonomyTable::new(),
    };

    let leaves = leaf_sets(&tree, &ref_records);
    let mut store = ancestor::infer(&tree, &leaves);
    info!("bottom-up Fitch pass: {} parsimony steps", store.steps);
    if cli.fitch_refine {
        ancestor::refine(&tree, &mut store);
        debug!("top-down refinement pass complete");
    }

    let taxonomy_by_node = assign_internal_taxonomy(&tree, &taxonomy_table);

    let queries = io::fasta::read_all(&cli.query_file)
        .map_err(|e| Error::new(RunError::ReferenceSequenceFileUnreadable(e.to_string())))?;
    if queries.is_empty() {
        return Err(Error::new(RunError::NoQuerySequences));
    }
    info!("loaded {} query sequences", queries.len());

    let mut evaluation = Evaluation::new();
    let mut results = Vec::new();
    let mut grafts_by_attach_point: HashMap<NodeId, Vec<Placement>> = HashMap::new();

    for query_record in &queries {
        if tree.find_by_name(&query_record.name).is_some() {
            warn!("query {} already present in reference tree, skipping", query_record.name);
            continue;
        }

        let query_set = ParsimonySet::from_sequence(&query_record.sequence);
        let n_sites = (0..query_set.len().min(mask.len()))
            .filter(|&i| mask[i] != 0 && query_set.data()[i] != 0)
            .count() as u64;

        if n_sites == 0 {
            warn!("query {} has no active sites under the mask", query_record.name);
        }

        let params = SearchParams {
            n_sites: n_sites.max(1),
            fast_percent: cli.fast_percent,
            mask: &mask,
            taxonomy: &taxonomy_by_node,
            rank_depth: &rank_depth,
        };
        let mut collector = BestKCollector::new(cli.matches);
        parsimony::pruned_descent(&tree, tree.root(), &query_set, &store, &params, &mut collector);

        let Some(best) = collector.entries().first().cloned() else {
            warn!("no matches found for query {}", query_record.name);
            continue;
        };

        let best_node_set = &store.sets[&best.node];
        let outcome = score(&query_set, best_node_set, &mask, u64::MAX).unwrap_or(parsimony::CostOutcome {
            diffs: n_sites,
            partials: 0,
            indels: 0,
        });
        let match_percent = if n_sites > 0 {
            (n_sites as i64 - outcome.score() as i64) * 100 / n_sites as i64
        } else {
            -1
        };

        let correct = taxonomy_table.lineage(&query_record.name).unwrap_or("").to_string();

        if match_percent < cli.score_threshold as i64 {
            info!("query {} at {}% does not meet threshold ({}%)", query_record.name, match_percent, cli.score_threshold);
            results.push(ResultRow {
                query: query_record.name.clone(),
                match_percent,
                assigned: String::new(),
                correct,
            });
            continue;
        }

        let best_score = best.score;
        let vote_threshold = best_score
            + if best_score >= 100 {
                50
            } else if best_score > 50 {
                20
            } else {
                10
            };

        let mut trie = VoteTrie::new();
        for entry in collector.entries() {
            if entry.score < vote_threshold && vote_threshold > 0 {
                let votes = ((vote_threshold - entry.score) * 100) / vote_threshold;
                trie.add(&entry.taxonomy, votes as u32);
            }
        }
        let consensus = trie.find_best(60);
        let assigned = consensus.first().cloned().unwrap_or_default();

        if !correct.is_empty() {
            evaluation.record(&correct, &assigned);
        }

        results.push(ResultRow {
            query: query_record.name.clone(),
            match_percent,
            assigned: assigned.clone(),
            correct,
        });

        let attach_to = if tree.node(best.node).is_leaf() {
            tree.node(best.node).parent.unwrap_or(best.node)
        } else {
            best.node
        };

        let taxonomy_for_leaf = if !assigned.is_empty() {
            assigned
        } else {
            inherited_taxonomy(&tree, attach_to, &taxonomy_by_node)
        };

        grafts_by_attach_point.entry(attach_to).or_default().push(Placement {
            title: query_record.name.clone(),
            attach_to,
            diffs: outcome.diffs,
            indels: outcome.indels,
            n_sites: n_sites.max(1),
            taxonomy: taxonomy_for_leaf,
        });
    }

    let jukes_cantor = cli.jukes_cantor;
    for (attach_to, placements) in grafts_by_attach_point {
        graft(&mut tree, attach_to, &placements, |p| {
            if jukes_cantor {
                jukes_cantor_distance(p.diffs, p.indels, p.n_sites)
            } else {
                raw_distance(p.diffs, p.indels, p.n_sites)
            }
        });
    }
    tree.rebuild_orders();

    io::newick::write_file(&tree, &cli.output_tree_file, cli.branch_length_precision, cli.verbose_comments)
        .context("writing output tree")?;
    info!("wrote grafted tree to {}", cli.output_tree_file.display());

    write_results_file(&cli.results_file, &results)?;
    info!("wrote results to {}", cli.results_file.display());

    for rank in 0..parsimony::eval::RANK_N {
        let counts = evaluation.overall[rank];
        if counts.seen_precision == 0 && counts.seen_recall == 0 {
            continue;
        }
        info!(
            "rank {}: precision {}/{}, recall {}/{}",
            rank, counts.matched_precision, counts.seen_precision, counts.matched_recall, counts.seen_recall
        );
    }

    info!("placer run complete");
    Ok(())
}

fn write_results_file(path: &std::path::Path, rows: &[ResultRow]) -> Result<()> {
    let mut file = std::fs::File::create(path).with_context(|| format!("creating results file {}", path.display()))?;
    writeln!(file, "query\tmatch_percent\tassigned_taxonomy\tcorrect_taxonomy")?;
    for row in rows {
        writeln!(file, "{}\t{}\t{}\t{}", row.query, row.match_percent, row.assigned, row.correct)?;
    }
    Ok(())
}

fn main() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    if let Err(err) = run() {
        match err.downcast_ref::<RunError>() {
            Some(run_error) => {
                log::error!("{}", run_error);
                std::process::exit(run_error.exit_code());
            }
            None => {
                log::error!("{}", err);
                std::process::exit(GENERIC_EXIT_CODE);
            }
        }
    }
}
