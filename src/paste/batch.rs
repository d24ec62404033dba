//! The alignment batch (B): a vector of records sharing (qseqid, sseqid)
//! plus the pasting controller that greedily extends each seed record into
//! a longer composite alignment.

use std::cmp::Ordering;

use crate::paste::config::AlignmentConfiguration;
use crate::paste::error::PastingError;
use crate::paste::record::{Alignment, PasteParameters};
use crate::paste::scoring::ScoringSystem;
use crate::utils::fuzzy_eq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Left,
}

/// All alignments between one (qseqid, sseqid) pair, together with three
/// index permutations used for sorting diagnostics. Candidate lookup during
/// pasting scans `alignments` directly rather than walking these
/// permutations, per the parallel-`consumed`-array design: keeping a
/// permutation self-consistent across in-place merges is not worth the
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct AlignmentBatch {
    pub qseqid: String,
    pub sseqid: String,
    pub alignments: Vec<Alignment>,
    pub score_sorted: Vec<usize>,
    pub qstart_sorted: Vec<usize>,
    pub qend_sorted: Vec<usize>,
}

impl AlignmentBatch {
    pub fn new(qseqid: String, sseqid: String, alignments: Vec<Alignment>) -> Self {
        let mut batch = Self {
            qseqid,
            sseqid,
            alignments,
            score_sorted: Vec::new(),
            qstart_sorted: Vec::new(),
            qend_sorted: Vec::new(),
        };
        batch.reset_alignments(0.05);
        batch
    }

    /// Recomputes `score_sorted`, `qstart_sorted` and `qend_sorted` from the
    /// current contents of `alignments`. `score_sorted` is descending
    /// `(raw_score, pident)` with ε-tolerant ties broken by ascending index;
    /// the other two are plain ascending sorts, also tie-broken by index so
    /// the result is a total order.
    pub fn reset_alignments(&mut self, epsilon: f64) {
        let n = self.alignments.len();

        let mut score_sorted: Vec<usize> = (0..n).collect();
        score_sorted.sort_by(|&a, &b| score_rank_cmp(&self.alignments[a], &self.alignments[b], a, b, epsilon));

        let mut qstart_sorted: Vec<usize> = (0..n).collect();
        qstart_sorted.sort_by_key(|&i| (self.alignments[i].qstart, i));

        let mut qend_sorted: Vec<usize> = (0..n).collect();
        qend_sorted.sort_by_key(|&i| (self.alignments[i].qend, i));

        self.score_sorted = score_sorted;
        self.qstart_sorted = qstart_sorted;
        self.qend_sorted = qend_sorted;
    }

    /// Runs the pasting controller: visits seeds in `score_sorted` order,
    /// extends each unconsumed one rightward then leftward, and marks
    /// survivors that meet the final thresholds for output.
    pub fn paste_alignments(&mut self, scoring_system: &ScoringSystem, params: &PasteParameters) -> Result<(), PastingError> {
        let n = self.alignments.len();
        let mut consumed = vec![false; n];
        let seeds = self.score_sorted.clone();

        for seed_idx in seeds {
            if consumed[seed_idx] {
                continue;
            }
            consumed[seed_idx] = true;

            let mut receiver = self.alignments[seed_idx].clone();
            extend(&mut receiver, Direction::Right, &self.alignments, &mut consumed, scoring_system, params)?;
            extend(&mut receiver, Direction::Left, &self.alignments, &mut consumed, scoring_system, params)?;

            if receiver.satisfies(params.final_pident_threshold, params.final_score_threshold, params.float_epsilon) {
                receiver.include_in_output = true;
            }
            self.alignments[seed_idx] = receiver;
        }

        Ok(())
    }
}

fn score_rank_cmp(a: &Alignment, b: &Alignment, a_idx: usize, b_idx: usize, epsilon: f64) -> Ordering {
    if fuzzy_eq(a.raw_score, b.raw_score, epsilon) {
        if fuzzy_eq(a.pident, b.pident, epsilon) {
            a_idx.cmp(&b_idx)
        } else {
            b.pident.partial_cmp(&a.pident).unwrap_or(Ordering::Equal)
        }
    } else {
        b.raw_score.partial_cmp(&a.raw_score).unwrap_or(Ordering::Equal)
    }
}

/// Whether `candidate` could sit to the right of `receiver`: the exact
/// mirror of `Alignment::paste_right`'s precondition.
fn is_right_neighbour(receiver: &Alignment, candidate: &Alignment) -> bool {
    receiver.plus_strand == candidate.plus_strand
        && receiver.qstart < candidate.qstart
        && receiver.qend < candidate.qend
        && if receiver.plus_strand {
            receiver.sstart < candidate.sstart && receiver.send < candidate.send
        } else {
            receiver.sstart > candidate.sstart && receiver.send > candidate.send
        }
}

/// Whether `candidate` could sit to the left of `receiver`: the exact
/// mirror of `Alignment::paste_left`'s precondition.
fn is_left_neighbour(receiver: &Alignment, candidate: &Alignment) -> bool {
    receiver.plus_strand == candidate.plus_strand
        && receiver.qstart > candidate.qstart
        && receiver.qend > candidate.qend
        && if receiver.plus_strand {
            receiver.sstart > candidate.sstart && receiver.send > candidate.send
        } else {
            receiver.sstart < candidate.sstart && receiver.send < candidate.send
        }
}

/// Where a rightward paste would cut the receiver's retained prefix.
/// `receiver` is `cfg`'s left operand, and occupies pasted positions
/// `[0, cfg.left_length)`, so this pasted-space boundary is already in the
/// receiver's own local coordinates.
fn right_chop_end(cfg: &AlignmentConfiguration) -> i64 {
    cfg.left_length - cfg.query_overlap.max(cfg.subject_overlap)
}

/// Where a leftward paste would cut the receiver's retained suffix, in the
/// receiver's own local coordinates. `receiver` is `cfg`'s right operand;
/// it does not start at pasted position 0, so the pasted-space boundary
/// where its retained portion begins (`right_begin`, mirroring
/// `GetLeftPartition`) has to be converted back via the length of that
/// retained portion (`cfg.pasted_length - right_begin`) before it means
/// anything in `receiver`'s own `[0, receiver.length]` space.
fn left_chop_begin(cfg: &AlignmentConfiguration) -> i64 {
    let right_begin = cfg.left_length + cfg.query_distance.min(cfg.subject_distance) + cfg.shift;
    let retained_length = cfg.pasted_length - right_begin;
    cfg.right_length - retained_length
}

/// A cut at `position` is safe unless it falls strictly between the
/// alignment's known ungapped prefix and its known ungapped suffix, i.e. in
/// the region where a gap might or might not be present. Conservative: an
/// unsafe verdict can be wrong in the safe direction, never the other way.
fn cut_is_safe(position: i64, alignment: &Alignment) -> bool {
    position <= alignment.ungapped_prefix_end || position >= alignment.ungapped_suffix_begin
}

fn rank_is_better(score: f64, pident: f64, idx: usize, best_score: f64, best_pident: f64, best_idx: usize, epsilon: f64) -> bool {
    if fuzzy_eq(score, best_score, epsilon) {
        if fuzzy_eq(pident, best_pident, epsilon) {
            idx < best_idx
        } else {
            pident > best_pident
        }
    } else {
        score > best_score
    }
}

/// Finds the best admissible candidate for extending `receiver` in
/// `direction`, evaluating every not-yet-consumed record that passes the
/// structural checks (strand, monotonicity, gap tolerance, gap-chop safety)
/// and the intermediate-threshold check on a scratch merge, then ranking
/// survivors by post-merge `(raw_score, pident)`.
#[allow(clippy::too_many_arguments)]
fn best_candidate(
    receiver: &Alignment, direction: Direction, alignments: &[Alignment], consumed: &[bool], scoring_system: &ScoringSystem,
    params: &PasteParameters,
) -> Result<Option<(usize, Alignment)>, PastingError> {
    let mut best: Option<(usize, Alignment)> = None;

    for (idx, candidate) in alignments.iter().enumerate() {
        if consumed[idx] {
            continue;
        }

        let structurally_valid = match direction {
            Direction::Right => is_right_neighbour(receiver, candidate),
            Direction::Left => is_left_neighbour(receiver, candidate),
        };
        if !structurally_valid {
            continue;
        }

        let cfg = match direction {
            Direction::Right => AlignmentConfiguration::new(receiver, candidate),
            Direction::Left => AlignmentConfiguration::new(candidate, receiver),
        };
        if cfg.shift > params.gap_tolerance {
            continue;
        }

        let chop_is_safe = match direction {
            Direction::Right => cut_is_safe(right_chop_end(&cfg), receiver),
            Direction::Left => cut_is_safe(left_chop_begin(&cfg), receiver),
        };
        if !chop_is_safe {
            continue;
        }

        let mut scratch = receiver.clone();
        match direction {
            Direction::Right => scratch.paste_right(candidate, &cfg, scoring_system, params)?,
            Direction::Left => scratch.paste_left(candidate, &cfg, scoring_system, params)?,
        }
        if !scratch.satisfies(params.intermediate_pident_threshold, params.intermediate_score_threshold, params.float_epsilon) {
            continue;
        }

        let is_better = match &best {
            None => true,
            Some((best_idx, best_alignment)) => rank_is_better(
                scratch.raw_score,
                scratch.pident,
                idx,
                best_alignment.raw_score,
                best_alignment.pident,
                *best_idx,
                params.float_epsilon,
            ),
        };
        if is_better {
            best = Some((idx, scratch));
        }
    }

    Ok(best)
}

/// Repeatedly pastes the best admissible neighbour onto `receiver` in
/// `direction` until none remains, then rolls back to the last state that
/// satisfied the final thresholds (or leaves `receiver` as it was on entry
/// if it never did).
fn extend(
    receiver: &mut Alignment, direction: Direction, alignments: &[Alignment], consumed: &mut [bool], scoring_system: &ScoringSystem,
    params: &PasteParameters,
) -> Result<(), PastingError> {
    let entry_snapshot = receiver.clone();
    let mut known_good_final = entry_snapshot
        .satisfies(params.final_pident_threshold, params.final_score_threshold, params.float_epsilon)
        .then(|| entry_snapshot.clone());

    while let Some((idx, merged)) = best_candidate(receiver, direction, alignments, consumed, scoring_system, params)? {
        consumed[idx] = true;
        *receiver = merged;
        if receiver.satisfies(params.final_pident_threshold, params.final_score_threshold, params.float_epsilon) {
            known_good_final = Some(receiver.clone());
        }
    }

    *receiver = known_good_final.unwrap_or(entry_snapshot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paste::test_support::alignment_fixture;

    fn scoring() -> ScoringSystem {
        ScoringSystem::new(1, 5, 0, 0, 1.0).unwrap()
    }

    fn plain_params() -> PasteParameters {
        PasteParameters::default()
    }

    #[test]
    fn straightforward_chain_merges_into_one_record() {
        let scoring = scoring();
        let params = plain_params();
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 110, 1001, 1010, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 1, 111, 130, 1011, 1030, true, 20, 0, 0, 0, 20, "CCCCCCCCCCCCCCCCCCCC"),
            alignment_fixture(&scoring, 2, 131, 145, 1031, 1045, true, 15, 0, 0, 0, 15, "GGGGGGGGGGGGGGG"),
            alignment_fixture(&scoring, 3, 146, 160, 1046, 1060, true, 15, 0, 0, 0, 15, "TTTTTTTTTTTTTTT"),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        batch.paste_alignments(&scoring, &params).unwrap();

        let marked: Vec<&Alignment> = batch.alignments.iter().filter(|a| a.include_in_output).collect();
        assert_eq!(marked.len(), 1);
        let merged = marked[0];
        assert_eq!((merged.qstart, merged.qend), (101, 160));
        assert_eq!((merged.sstart, merged.send), (1001, 1060));
        assert_eq!(merged.nident, 60);
        // Record 1 (score 20) is the seed; ids are recorded in merge order
        // (seed first, then each consumed neighbour as it is pasted on, right
        // side before left side), not final geometric left-to-right order.
        assert_eq!(merged.pasted_ids, vec![1, 2, 3, 0]);
    }

    #[test]
    fn opposite_strand_runs_merge_independently() {
        let scoring = scoring();
        let params = plain_params();
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 110, 1001, 1010, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 1, 111, 120, 1011, 1020, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 2, 201, 210, 2011, 2020, false, 10, 0, 0, 0, 10, "CCCCCCCCCC"),
            alignment_fixture(&scoring, 3, 211, 220, 2001, 2010, false, 10, 0, 0, 0, 10, "CCCCCCCCCC"),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        batch.paste_alignments(&scoring, &params).unwrap();

        let marked: Vec<&Alignment> = batch.alignments.iter().filter(|a| a.include_in_output).collect();
        assert_eq!(marked.len(), 2);
        let plus: Vec<_> = marked.iter().filter(|a| a.plus_strand).collect();
        let minus: Vec<_> = marked.iter().filter(|a| !a.plus_strand).collect();
        assert_eq!(plus.len(), 1);
        assert_eq!(minus.len(), 1);
        assert_eq!((plus[0].qstart, plus[0].qend), (101, 120));
        assert_eq!((minus[0].qstart, minus[0].qend), (201, 220));
    }

    #[test]
    fn gap_tolerance_splits_chain_into_independent_pairs() {
        let scoring = scoring();
        let params = PasteParameters {
            gap_tolerance: 4,
            ..PasteParameters::default()
        };
        // (0,1) abut with shift 0; (1,2) separated by a shift of 10 on the query
        // axis only (shift exceeds tolerance); (2,3) abut again.
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 110, 1001, 1010, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 1, 111, 120, 1011, 1020, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 2, 131, 140, 1021, 1030, true, 10, 0, 0, 0, 10, "GGGGGGGGGG"),
            alignment_fixture(&scoring, 3, 141, 150, 1031, 1040, true, 10, 0, 0, 0, 10, "GGGGGGGGGG"),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        batch.paste_alignments(&scoring, &params).unwrap();

        let marked: Vec<&Alignment> = batch.alignments.iter().filter(|a| a.include_in_output).collect();
        assert_eq!(marked.len(), 2);
    }

    #[test]
    fn final_pident_threshold_rolls_back_to_last_good_state() {
        let scoring = scoring();
        let params = PasteParameters {
            final_pident_threshold: 90.0,
            ..PasteParameters::default()
        };
        // Seed is 100% identity; neighbour 1 keeps it at/above 90%; neighbour 2
        // keeps the raw score non-negative (so it still commits) but drags the
        // cumulative identity below 90%, forcing a rollback to the 0+1 state.
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 200, 1001, 1100, true, 100, 0, 0, 0, 100, &"A".repeat(100)),
            alignment_fixture(&scoring, 1, 201, 300, 1101, 1200, true, 95, 5, 0, 0, 100, &"A".repeat(100)),
            alignment_fixture(&scoring, 2, 301, 400, 1201, 1300, true, 70, 30, 0, 0, 100, &"A".repeat(100)),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        batch.paste_alignments(&scoring, &params).unwrap();

        let marked: Vec<&Alignment> = batch.alignments.iter().filter(|a| a.include_in_output).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].pasted_ids, vec![0, 1]);
        assert!(marked[0].pident >= 90.0);
    }

    #[test]
    fn intermediate_threshold_lets_flanks_paste_through_a_bad_middle_neighbour() {
        let scoring = scoring();
        let params = PasteParameters {
            intermediate_pident_threshold: 90.0,
            ..PasteParameters::default()
        };
        // 0 and 2 are long, clean flanks; 1 is a short, fully-mismatched middle
        // record that occupies the same span it would leave behind if skipped.
        // Merging 0+1 alone drops identity to 83.3% (below threshold, so 1 is
        // skipped as a candidate), but merging 0 directly with 2 dilutes that
        // same mismatched span across both flanks' length and lands at 90.9%.
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 1100, 1001, 2000, true, 1000, 0, 0, 0, 1000, &"A".repeat(1000)),
            alignment_fixture(&scoring, 1, 1101, 1300, 2001, 2200, true, 0, 200, 0, 0, 200, &"A".repeat(200)),
            alignment_fixture(&scoring, 2, 1301, 2300, 2201, 3200, true, 1000, 0, 0, 0, 1000, &"A".repeat(1000)),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        batch.paste_alignments(&scoring, &params).unwrap();

        let marked: Vec<&Alignment> = batch.alignments.iter().filter(|a| a.include_in_output).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].pasted_ids, vec![0, 2]);
        assert!(!batch.alignments[1].include_in_output);
        assert_eq!(batch.alignments[1].pasted_ids, vec![1]);
    }

    #[test]
    fn reset_alignments_is_idempotent() {
        let scoring = scoring();
        let alignments = vec![
            alignment_fixture(&scoring, 0, 101, 110, 1001, 1010, true, 10, 0, 0, 0, 10, "AAAAAAAAAA"),
            alignment_fixture(&scoring, 1, 111, 120, 1011, 1020, true, 9, 1, 0, 0, 10, "AAAAAAAAAC"),
        ];
        let mut batch = AlignmentBatch::new("q1".to_string(), "s1".to_string(), alignments);
        let first = batch.score_sorted.clone();
        batch.reset_alignments(0.05);
        assert_eq!(first, batch.score_sorted);
    }

    #[test]
    fn tie_break_prefers_higher_percent_identity() {
        let scoring = scoring();
        let params = plain_params();
        // Both candidates abut the receiver and merge to the same raw score
        // (170), but the 100%-identity candidate is shorter, so its merged
        // pident (100%) beats the ~95%-identity candidate's merged pident
        // (97.5%).
        let receiver = alignment_fixture(&scoring, 0, 101, 200, 1001, 1100, true, 100, 0, 0, 0, 100, &"A".repeat(100));
        let ninety_five_pct = alignment_fixture(&scoring, 1, 201, 300, 1101, 1200, true, 95, 5, 0, 0, 100, &"A".repeat(100));
        let hundred_pct = alignment_fixture(&scoring, 2, 201, 270, 1101, 1170, true, 70, 0, 0, 0, 70, &"A".repeat(70));
        let alignments = vec![receiver.clone(), ninety_five_pct, hundred_pct];
        let consumed = [true, false, false];

        let (idx, merged) = best_candidate(&receiver, Direction::Right, &alignments, &consumed, &scoring, &params)
            .unwrap()
            .unwrap();

        assert_eq!(idx, 2);
        assert!((merged.raw_score - 170.0).abs() < 1e-9);
        assert!((merged.pident - 100.0).abs() < 1e-9);
    }

    #[test]
    fn gap_chop_safety_refuses_a_cut_into_a_known_gap_but_allows_one_past_it() {
        let scoring = scoring();
        let params = plain_params();
        // The receiver carries an unresolved gap spanning its own local
        // positions [40, 60), left over from an earlier merge.
        let mut receiver = alignment_fixture(&scoring, 0, 301, 400, 2001, 2100, true, 100, 0, 0, 0, 100, &"A".repeat(100));
        receiver.ungapped_prefix_end = 40;
        receiver.ungapped_suffix_begin = 60;

        // Overlaps the receiver by 50 on both axes: the retained portion of
        // the receiver would start at local position 50, squarely inside the
        // gap.
        let chops_into_gap =
            alignment_fixture(&scoring, 1, 250, 350, 1950, 2050, true, 101, 0, 0, 0, 101, &"A".repeat(101));
        // Overlaps the receiver by 70 on both axes: the retained portion
        // starts at local position 70, past the whole gap.
        let chops_off_the_gap =
            alignment_fixture(&scoring, 2, 250, 370, 1950, 2070, true, 121, 0, 0, 0, 121, &"A".repeat(121));

        let alignments = vec![receiver.clone(), chops_into_gap, chops_off_the_gap];

        let refused = best_candidate(&receiver, Direction::Left, &alignments, &[true, false, true], &scoring, &params)
            .unwrap();
        assert!(refused.is_none());

        let (idx, _) = best_candidate(&receiver, Direction::Left, &alignments, &[true, true, false], &scoring, &params)
            .unwrap()
            .unwrap();
        assert_eq!(idx, 2);
    }
}
