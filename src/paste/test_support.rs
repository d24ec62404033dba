//! Shared fixture construction for unit tests across the `paste` module tree.

#![cfg(test)]

use crate::paste::record::Alignment;
use crate::paste::scoring::ScoringSystem;

/// Builds an [`Alignment`] directly from its fields, bypassing
/// [`Alignment::from_fields`]'s text parsing, for tests that want precise
/// control over coordinates and counts.
#[allow(clippy::too_many_arguments)]
pub(crate) fn alignment_fixture(
    scoring_system: &ScoringSystem, id: i64, qstart: i64, qend: i64, sstart: i64, send: i64, plus_strand: bool,
    nident: i64, mismatch: i64, gapopen: i64, gaps: i64, length: i64, seq: &str,
) -> Alignment {
    let (sstart, send) = if plus_strand { (sstart, send) } else { (send, sstart) };
    let qlen = qend;
    let slen = send.max(sstart) + 1000;

    let mut alignment = Alignment {
        id,
        pasted_ids: vec![id],
        qstart,
        qend,
        sstart,
        send,
        plus_strand,
        nident,
        mismatch,
        gapopen,
        gaps,
        qlen,
        slen,
        length,
        qseq: seq.to_string(),
        sseq: seq.to_string(),
        pident: 0.0,
        raw_score: 0.0,
        bitscore: 0.0,
        evalue: 0.0,
        ungapped_prefix_end: length,
        ungapped_suffix_begin: 0,
        include_in_output: false,
    };

    let (pident, raw_score, bitscore, evalue) = scoring_system.statistics(&alignment);
    alignment.pident = pident;
    alignment.raw_score = raw_score;
    alignment.bitscore = bitscore;
    alignment.evalue = evalue;
    alignment
}
