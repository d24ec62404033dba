//! The `paste` subcommand: reads a BLAST-family tabular alignment table,
//! pastes consistent neighbouring alignments together per `(qseqid,
//! sseqid)` batch, and writes the survivors back out.

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, builder::RangedI64ValueParser, error::ErrorKind};
#[cfg(not(feature = "dev_no_rayon"))]
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use crate::args::abort_clap;
use crate::io::reader::BatchReader;
use crate::io::{open_input, open_output, writer::write_batch};
use crate::paste::record::PasteParameters;
use crate::paste::scoring::ScoringSystem;

/// The command line arguments for `paste`.
#[derive(Args, Debug)]
pub struct PasteArgs {
    /// Path to the tab-separated alignment table. Reads from stdin if
    /// omitted or `-`.
    input: Option<PathBuf>,

    /// Path to write pasted alignments to. Writes to stdout if omitted.
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 0, value_parser = RangedI64ValueParser::<i64>::new().range(0..))]
    /// Maximum shift between the query and subject offsets tolerated when
    /// pasting two alignments.
    gap_tolerance: i64,

    #[arg(long, default_value_t = 0.0)]
    /// Minimum percent identity a tentative merge must retain to remain a
    /// candidate.
    intermediate_pident: f64,

    #[arg(long, default_value_t = 0.0)]
    /// Minimum raw score a tentative merge must retain to remain a
    /// candidate.
    intermediate_score: f64,

    #[arg(long, default_value_t = 0.0)]
    /// Minimum percent identity a final, output-bound record must meet.
    final_pident: f64,

    #[arg(long, default_value_t = 0.0)]
    /// Minimum raw score a final, output-bound record must meet.
    final_score: f64,

    #[arg(long, default_value_t = 0.05)]
    /// Tolerance used when comparing floating-point scores and percentages.
    epsilon: f64,

    #[arg(long)]
    /// Skip assembling `qseq`/`sseq` strings; coordinates and counts are
    /// still tracked exactly.
    blind: bool,

    #[arg(long, default_value_t = 1, value_parser = RangedI64ValueParser::<i32>::new().range(0..))]
    /// Per-identity-match reward.
    reward: i32,

    #[arg(long, default_value_t = 5, value_parser = RangedI64ValueParser::<i32>::new().range(0..))]
    /// Per-mismatch penalty, expressed as a non-negative magnitude.
    penalty: i32,

    #[arg(long = "gap-open", default_value_t = 0, value_parser = RangedI64ValueParser::<i32>::new().range(0..))]
    /// Cost of opening a gap. `0` together with `--gap-extend 0` selects the
    /// megablast default, whose real extend cost is derived from (reward,
    /// penalty) instead of being taken literally.
    gap_open: i32,

    #[arg(long = "gap-extend", default_value_t = 0, value_parser = RangedI64ValueParser::<i32>::new().range(0..))]
    /// Cost of extending a gap by one base. See `--gap-open`.
    gap_extend: i32,

    #[arg(long = "db-size", default_value_t = 1.0)]
    /// Effective database size used in the e-value calculation.
    db_size: f64,

    #[arg(long)]
    /// Cap the number of rayon worker threads used across batches.
    threads: Option<usize>,
}

/// Sub-program for pasting BLAST-family tabular alignments.
pub fn paste_process(args: PasteArgs) -> std::io::Result<()> {
    let scoring_system = ScoringSystem::new(args.reward, args.penalty, args.gap_open, args.gap_extend, args.db_size)
        .unwrap_or_else(|e| abort_clap(ErrorKind::InvalidValue, e, Some("paste")));

    let params = PasteParameters {
        gap_tolerance:                 args.gap_tolerance,
        intermediate_pident_threshold: args.intermediate_pident,
        intermediate_score_threshold:  args.intermediate_score,
        final_pident_threshold:        args.final_pident,
        final_score_threshold:         args.final_score,
        float_epsilon:                 args.epsilon,
        blind_mode:                    args.blind,
    };

    #[cfg(not(feature = "dev_no_rayon"))]
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global().unwrap();
    }

    let source = open_input(args.input.as_deref())?;
    let mut sink = open_output(args.output.as_deref())?;

    let reader = BatchReader::new(source, scoring_system, params);
    let mut batches: Vec<_> = reader.collect::<Result<Vec<_>, _>>().map_err(std::io::Error::other)?;

    let batch_count = batches.len();
    let record_count: usize = batches.iter().map(|b| b.alignments.len()).sum();

    for batch in &mut batches {
        batch.reset_alignments(params.float_epsilon);
    }

    #[cfg(not(feature = "dev_no_rayon"))]
    batches
        .par_iter_mut()
        .try_for_each(|batch| batch.paste_alignments(&scoring_system, &params))
        .map_err(std::io::Error::other)?;

    #[cfg(feature = "dev_no_rayon")]
    for batch in &mut batches {
        batch.paste_alignments(&scoring_system, &params).map_err(std::io::Error::other)?;
    }

    let mut emitted_count = 0;
    for batch in &batches {
        emitted_count += write_batch(&mut sink, batch)?;
    }
    sink.flush()?;

    eprintln!("Processed {batch_count} batches ({record_count} alignments).");
    eprintln!("Pasted into {emitted_count} alignments.");

    Ok(())
}
