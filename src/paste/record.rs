//! The alignment record (A): the unit of work, owning its fields and the two
//! merge operations `paste_right`/`paste_left`.

use crate::paste::config::AlignmentConfiguration;
use crate::paste::error::{ParsingError, PastingError};
use crate::paste::scoring::ScoringSystem;
use crate::utils::fuzzy_eq;

/// Tunable knobs shared by merging and the batch controller. See
/// `SPEC_FULL.md` §6 for the corresponding CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct PasteParameters {
    pub gap_tolerance:                  i64,
    pub intermediate_pident_threshold:  f64,
    pub intermediate_score_threshold:   f64,
    pub final_pident_threshold:         f64,
    pub final_score_threshold:          f64,
    pub float_epsilon:                  f64,
    pub blind_mode:                     bool,
}

impl Default for PasteParameters {
    fn default() -> Self {
        Self {
            gap_tolerance:                 0,
            intermediate_pident_threshold: 0.0,
            intermediate_score_threshold:  0.0,
            final_pident_threshold:        0.0,
            final_score_threshold:         0.0,
            float_epsilon:                 0.05,
            blind_mode:                    false,
        }
    }
}

/// A single sequence alignment, possibly itself the fusion of several source
/// rows via [`Alignment::paste_right`]/[`Alignment::paste_left`].
///
/// Subject coordinates are always stored normalised so `sstart <= send`; the
/// original orientation is preserved in `plus_strand` and restored on
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub id:          i64,
    pub pasted_ids:  Vec<i64>,
    pub qstart:      i64,
    pub qend:        i64,
    pub sstart:      i64,
    pub send:        i64,
    pub plus_strand: bool,
    pub nident:      i64,
    pub mismatch:    i64,
    pub gapopen:     i64,
    pub gaps:        i64,
    pub qlen:        i64,
    pub slen:        i64,
    pub length:      i64,
    pub qseq:        String,
    pub sseq:        String,
    pub pident:      f64,
    pub raw_score:   f64,
    pub bitscore:    f64,
    pub evalue:      f64,
    pub ungapped_prefix_end:   i64,
    pub ungapped_suffix_begin: i64,
    pub include_in_output: bool,
}

impl Alignment {
    /// Builds an [`Alignment`] from an id and the ordered tuple of
    /// tab-separated fields following `qseqid`/`sseqid`: `qstart, qend,
    /// sstart, send, nident, mismatch, gapopen, gaps, qlen, slen, length`,
    /// plus `qseq, sseq` unless `paste_parameters.blind_mode` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError`] (tagged with `id`) if there are too few
    /// fields, a field fails to parse as an integer, or any of the
    /// constraints in the data model (§3) are violated.
    pub fn from_fields(
        id: i64, fields: &[&str], scoring_system: &ScoringSystem, paste_parameters: &PasteParameters,
    ) -> Result<Self, ParsingError> {
        let required = if paste_parameters.blind_mode { 11 } else { 13 };
        if fields.len() < required {
            return Err(ParsingError::new(
                id,
                format!(
                    "not enough fields to create an alignment: need {required}, got {}",
                    fields.len()
                ),
            ));
        }

        let int_field = |index: usize, name: &str| -> Result<i64, ParsingError> {
            fields[index]
                .parse::<i64>()
                .map_err(|_| ParsingError::new(id, format!("field '{name}' is not an integer: '{}'", fields[index])))
        };

        let qstart = int_field(0, "qstart")?;
        let qend = int_field(1, "qend")?;
        if qstart > qend || qstart < 0 || qend < 0 {
            return Err(ParsingError::new(
                id,
                format!("invalid query coordinates: (qstart: {qstart}, qend: {qend})"),
            ));
        }

        let mut sstart = int_field(2, "sstart")?;
        let mut send = int_field(3, "send")?;
        if sstart < 0 || send < 0 {
            return Err(ParsingError::new(
                id,
                format!("invalid subject coordinates: (sstart: {sstart}, send: {send})"),
            ));
        }

        let nident = int_field(4, "nident")?;
        let mismatch = int_field(5, "mismatch")?;
        let gapopen = int_field(6, "gapopen")?;
        let gaps = int_field(7, "gaps")?;
        if nident < 0 || mismatch < 0 || gapopen < 0 || gaps < 0 {
            return Err(ParsingError::new(
                id,
                format!("count fields must not be negative: (nident: {nident}, mismatch: {mismatch}, gapopen: {gapopen}, gaps: {gaps})"),
            ));
        }

        let qlen = int_field(8, "qlen")?;
        let slen = int_field(9, "slen")?;
        let length = int_field(10, "length")?;
        if qlen <= 0 || slen <= 0 || length <= 0 {
            return Err(ParsingError::new(
                id,
                format!("sequence lengths must be positive: (qlen: {qlen}, slen: {slen}, length: {length})"),
            ));
        }

        let (qseq, sseq) = if paste_parameters.blind_mode {
            (String::new(), String::new())
        } else {
            let qseq = fields[11].to_string();
            let sseq = fields[12].to_string();
            if qseq.is_empty() || sseq.is_empty() {
                return Err(ParsingError::new(id, "aligned sequences must be non-empty"));
            } else if qseq.len() != sseq.len() {
                return Err(ParsingError::new(id, "qseq and sseq must have the same length"));
            } else if qseq.len() as i64 != length {
                return Err(ParsingError::new(id, "alignment length must match the length of qseq/sseq"));
            }
            (qseq, sseq)
        };

        let plus_strand = if sstart <= send {
            true
        } else {
            std::mem::swap(&mut sstart, &mut send);
            false
        };

        let mut alignment = Self {
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
            qseq,
            sseq,
            pident: 0.0,
            raw_score: 0.0,
            bitscore: 0.0,
            evalue: 0.0,
            ungapped_prefix_end: length,
            ungapped_suffix_begin: 0,
            include_in_output: false,
        };
        alignment.update_similarity_measures(scoring_system);
        Ok(alignment)
    }

    fn update_similarity_measures(&mut self, scoring_system: &ScoringSystem) {
        let (pident, raw_score, bitscore, evalue) = scoring_system.statistics(self);
        self.pident = pident;
        self.raw_score = raw_score;
        self.bitscore = bitscore;
        self.evalue = evalue;
    }

    /// `pident >= pident_min && raw_score >= score_min`, tolerant to
    /// `epsilon`.
    pub fn satisfies(&self, pident_min: f64, score_min: f64, epsilon: f64) -> bool {
        (self.pident >= pident_min || fuzzy_eq(self.pident, pident_min, epsilon))
            && (self.raw_score >= score_min || fuzzy_eq(self.raw_score, score_min, epsilon))
    }

    /// Fuses `other`, which must lie strictly to the right of `self` on both
    /// axes, onto the right end of `self` in place.
    ///
    /// # Errors
    ///
    /// Returns [`PastingError`] if the monotonicity preconditions are
    /// violated.
    pub fn paste_right(
        &mut self, other: &Alignment, config: &AlignmentConfiguration, scoring_system: &ScoringSystem,
        paste_parameters: &PasteParameters,
    ) -> Result<(), PastingError> {
        if self.plus_strand != other.plus_strand
            || self.qstart >= other.qstart
            || self.qend >= other.qend
            || (self.plus_strand && (self.sstart >= other.sstart || self.send >= other.send))
            || (!self.plus_strand && (self.sstart <= other.sstart || self.send <= other.send))
        {
            return Err(PastingError::new(format!(
                "cannot paste alignment {} onto the right of alignment {}",
                other.id, self.id
            )));
        }

        let partition = right_partition(config);
        let new_prefix_end = prefix_end(self, other, &partition, config);
        let new_suffix_begin = suffix_begin(self, other, &partition, config);

        if !paste_parameters.blind_mode {
            let (qgap, sgap) = gap_chars(config);
            self.qseq = combine_right(&self.qseq, &other.qseq, &partition, qgap);
            self.sseq = combine_right(&self.sseq, &other.sseq, &partition, sgap);
        }

        self.pasted_ids.extend(other.pasted_ids.iter().copied());
        self.length = config.pasted_length;
        self.qend = other.qend;
        if self.plus_strand {
            self.send = other.send;
        } else {
            self.sstart = other.sstart;
        }
        self.ungapped_prefix_end = new_prefix_end;
        self.ungapped_suffix_begin = new_suffix_begin;

        adjust_counts(self, other, config);
        self.update_similarity_measures(scoring_system);
        Ok(())
    }

    /// Fuses `other`, which must lie strictly to the left of `self` on both
    /// axes, onto the left end of `self` in place.
    ///
    /// # Errors
    ///
    /// Returns [`PastingError`] if strands differ or the monotonicity
    /// preconditions are violated.
    pub fn paste_left(
        &mut self, other: &Alignment, config: &AlignmentConfiguration, scoring_system: &ScoringSystem,
        paste_parameters: &PasteParameters,
    ) -> Result<(), PastingError> {
        if self.plus_strand != other.plus_strand
            || self.qstart <= other.qstart
            || self.qend <= other.qend
            || (self.plus_strand && (self.sstart <= other.sstart || self.send <= other.send))
            || (!self.plus_strand && (self.sstart >= other.sstart || self.send >= other.send))
        {
            return Err(PastingError::new(format!(
                "cannot paste alignment {} onto the left of alignment {}",
                other.id, self.id
            )));
        }

        let partition = left_partition(config);
        let new_prefix_end = prefix_end(other, self, &partition, config);
        let new_suffix_begin = suffix_begin(other, self, &partition, config);

        if !paste_parameters.blind_mode {
            let (qgap, sgap) = gap_chars(config);
            self.qseq = combine_left(&other.qseq, &self.qseq, &partition, qgap);
            self.sseq = combine_left(&other.sseq, &self.sseq, &partition, sgap);
        }

        self.pasted_ids.extend(other.pasted_ids.iter().copied());
        self.length = config.pasted_length;
        self.qstart = other.qstart;
        if self.plus_strand {
            self.sstart = other.sstart;
        } else {
            self.send = other.send;
        }
        self.ungapped_prefix_end = new_prefix_end;
        self.ungapped_suffix_begin = new_suffix_begin;

        adjust_counts(self, other, config);
        self.update_similarity_measures(scoring_system);
        Ok(())
    }
}

/// How the fused aligned strings are assembled: a gap region, an unknown
/// region, and the retained portions of the left/right source strings.
#[derive(Debug, Clone, Copy)]
struct PastedPartition {
    gap_begin:      i64,
    gap_length:     i64,
    unknown_begin:  i64,
    unknown_length: i64,
    right_begin:    i64,
    right_length:   i64,
}

/// Right-maximising partition: `left-prefix + gap + unknown + right-whole`.
fn right_partition(config: &AlignmentConfiguration) -> PastedPartition {
    let gap_begin = config.left_length - config.query_overlap.max(config.subject_overlap);
    let gap_length = config.shift;
    let unknown_begin = gap_begin + gap_length;
    let unknown_length = config.query_distance.min(config.subject_distance);
    let right_begin = unknown_begin + unknown_length;
    let right_length = config.right_length;
    PastedPartition {
        gap_begin,
        gap_length,
        unknown_begin,
        unknown_length,
        right_begin,
        right_length,
    }
}

/// Left-maximising partition: `left-whole + unknown + gap + right-suffix`.
fn left_partition(config: &AlignmentConfiguration) -> PastedPartition {
    let unknown_begin = config.left_length;
    let unknown_length = config.query_distance.min(config.subject_distance);
    let gap_begin = unknown_begin + unknown_length;
    let gap_length = config.shift;
    let right_begin = gap_begin + gap_length;
    let right_length = config.pasted_length - right_begin;
    PastedPartition {
        gap_begin,
        gap_length,
        unknown_begin,
        unknown_length,
        right_begin,
        right_length,
    }
}

/// The gap region is filled with `-` on the side with the smaller offset
/// (the side that lags), and `N` on the other side (the side with extra
/// advance).
fn gap_chars(config: &AlignmentConfiguration) -> (char, char) {
    if config.query_offset > config.subject_offset {
        ('N', '-')
    } else {
        ('-', 'N')
    }
}

fn combine_right(left: &str, right: &str, partition: &PastedPartition, gap_char: char) -> String {
    let mut result = String::with_capacity((partition.gap_begin + partition.gap_length + partition.unknown_length + partition.right_length) as usize);
    result.push_str(&left[..partition.gap_begin as usize]);
    result.extend(std::iter::repeat_n(gap_char, partition.gap_length as usize));
    result.extend(std::iter::repeat_n('N', partition.unknown_length as usize));
    result.push_str(right);
    result
}

fn combine_left(left: &str, right: &str, partition: &PastedPartition, gap_char: char) -> String {
    let mut result = String::with_capacity((left.len() as i64 + partition.unknown_length + partition.gap_length + partition.right_length) as usize);
    result.push_str(left);
    result.extend(std::iter::repeat_n('N', partition.unknown_length as usize));
    result.extend(std::iter::repeat_n(gap_char, partition.gap_length as usize));
    result.push_str(&right[right.len() - partition.right_length as usize..]);
    result
}

/// `nident += other.nident - max(overlap)`, `mismatch += other.mismatch +
/// min(distance)`, `gapopen += other.gapopen (+1 if shift > 0)`, `gaps +=
/// other.gaps + shift`.
fn adjust_counts(receiver: &mut Alignment, other: &Alignment, config: &AlignmentConfiguration) {
    receiver.nident += other.nident - config.query_overlap.max(config.subject_overlap);
    receiver.mismatch += other.mismatch + config.query_distance.min(config.subject_distance);
    receiver.gapopen += other.gapopen + if config.shift > 0 { 1 } else { 0 };
    receiver.gaps += other.gaps + config.shift;
}

/// Where the `left` alignment's retained prefix ends within the partition,
/// regardless of whether that position falls in the gap, unknown, or right
/// region.
fn left_chop_end(partition: &PastedPartition) -> i64 {
    if partition.unknown_length > 0 && partition.gap_length > 0 {
        partition.unknown_begin.min(partition.gap_begin)
    } else if partition.unknown_length > 0 {
        partition.unknown_begin
    } else if partition.gap_length > 0 {
        partition.gap_begin
    } else {
        partition.right_begin
    }
}

/// Conservative (never-overstating) end of the pasted alignment's maximal
/// ungapped prefix. See `original_source/src/alignment.cc`'s `GetPrefixEnd`.
fn prefix_end(left: &Alignment, right: &Alignment, partition: &PastedPartition, config: &AlignmentConfiguration) -> i64 {
    let right_prefix_end_after = config.pasted_length - right.length + right.ungapped_prefix_end;
    let right_suffix_begin_after = config.pasted_length - right.length + right.ungapped_suffix_begin;
    let left_end = left_chop_end(partition);

    if left_end > left.ungapped_prefix_end {
        left.ungapped_prefix_end
    } else if config.shift != 0 {
        partition.gap_begin
    } else if right_suffix_begin_after <= partition.right_begin {
        config.pasted_length
    } else if partition.right_begin < right_prefix_end_after {
        right_prefix_end_after
    } else {
        partition.right_begin
    }
}

/// Conservative (never-overstating) begin of the pasted alignment's maximal
/// ungapped suffix. See `original_source/src/alignment.cc`'s `GetSuffixBegin`.
fn suffix_begin(left: &Alignment, right: &Alignment, partition: &PastedPartition, config: &AlignmentConfiguration) -> i64 {
    let right_suffix_begin_after = config.pasted_length - right.length + right.ungapped_suffix_begin;
    let left_end = left_chop_end(partition);

    if partition.right_begin < right_suffix_begin_after {
        right_suffix_begin_after
    } else if config.shift != 0 {
        partition.gap_begin + partition.gap_length
    } else if left_end <= left.ungapped_prefix_end {
        0
    } else if left.ungapped_suffix_begin < left_end {
        left.ungapped_suffix_begin
    } else {
        left_end
    }
}
