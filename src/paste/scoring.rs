//! The scoring system (S): a stateless evaluator of raw score, bitscore,
//! e-value and percent identity for an [`Alignment`](crate::paste::record::Alignment).

use crate::paste::error::{OutOfRange, ScoringError};
use crate::paste::record::Alignment;

/// One entry in the supported parameter table: a (reward, penalty, open,
/// extend) quadruple together with its matching Karlin-Altschul statistical
/// parameters and whether the raw score must be rounded down to the nearest
/// even integer before computing bitscore/e-value.
///
/// `penalty` is a non-negative magnitude: `raw_score` subtracts
/// `penalty * mismatch` directly, it is not a signed reward.
///
/// `extend` of `0` together with `open` of `0` is the megablast sentinel: the
/// real extend cost is derived from (reward, penalty) rather than being a
/// literal zero.
#[derive(Debug, Clone, Copy)]
struct ParameterSetEntry {
    reward:           i32,
    penalty:          i32,
    open:             i32,
    extend:           i32,
    lambda:           f64,
    k:                f64,
    round_down_score: bool,
}

/// The fixed table of supported (reward, penalty, open_cost, extend_cost)
/// quadruples, each carrying its matching (lambda, K).
const PARAMETER_TABLE: &[ParameterSetEntry] = &[
    ParameterSetEntry {
        reward:           1,
        penalty:          5,
        open:             0,
        extend:           0,
        lambda:           1.39,
        k:                0.747,
        round_down_score: false,
    },
    ParameterSetEntry {
        reward:           1,
        penalty:          5,
        open:             3,
        extend:           3,
        lambda:           1.39,
        k:                0.747,
        round_down_score: false,
    },
    ParameterSetEntry {
        reward:           4,
        penalty:          5,
        open:             0,
        extend:           0,
        lambda:           0.22,
        k:                0.061,
        round_down_score: false,
    },
    ParameterSetEntry {
        reward:           4,
        penalty:          5,
        open:             4,
        extend:           5,
        lambda:           0.25,
        k:                0.1,
        round_down_score: false,
    },
    ParameterSetEntry {
        reward:           2,
        penalty:          3,
        open:             0,
        extend:           4,
        lambda:           0.55,
        k:                0.21,
        round_down_score: true,
    },
    ParameterSetEntry {
        reward:           2,
        penalty:          5,
        open:             2,
        extend:           4,
        lambda:           0.67,
        k:                0.59,
        round_down_score: true,
    },
];

/// Derives the megablast extend cost from (reward, penalty) for the `(open,
/// extend) = (0, 0)` sentinel: half the reward, rounded up, plus the
/// penalty.
fn megablast_extend_cost(reward: i32, penalty: i32) -> i32 {
    (reward + 1) / 2 + penalty
}

/// A stateless evaluator of similarity statistics, parameterised by the
/// scoring quadruple, its matching (lambda, K), and the effective database
/// size.
#[derive(Debug, Clone, Copy)]
pub struct ScoringSystem {
    reward:           i32,
    penalty:          i32,
    open_cost:        i32,
    extend_cost:      i32,
    lambda:           f64,
    k:                f64,
    round_down_score: bool,
    database_size:    f64,
}

impl ScoringSystem {
    /// Builds a scoring system from a (reward, penalty, open, extend)
    /// quadruple and an effective database size, looking up (lambda, K) and
    /// the rounding flag in [`PARAMETER_TABLE`].
    ///
    /// The `(open, extend) = (0, 0)` sentinel means "megablast defaults":
    /// the real extend cost is derived from (reward, penalty).
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] if no table entry matches `(reward, penalty,
    /// open, extend)`, and [`OutOfRange`] if `database_size` is not positive.
    pub fn new(reward: i32, penalty: i32, open: i32, extend: i32, database_size: f64) -> Result<Self, ScoringErrorOrRange> {
        if database_size <= 0.0 {
            return Err(OutOfRange::new(format!("database_size must be positive, got {database_size}")).into());
        }

        let entry = PARAMETER_TABLE
            .iter()
            .find(|e| e.reward == reward && e.penalty == penalty && e.open == open && e.extend == extend)
            .copied()
            .ok_or(ScoringError {
                reward,
                penalty,
                open,
                extend,
            })?;

        let extend_cost = if entry.open == 0 && entry.extend == 0 {
            megablast_extend_cost(reward, penalty)
        } else {
            entry.extend
        };

        Ok(Self {
            reward,
            penalty,
            open_cost: entry.open,
            extend_cost,
            lambda: entry.lambda,
            k: entry.k,
            round_down_score: entry.round_down_score,
            database_size,
        })
    }

    /// `reward·nident − penalty·mismatch − open_cost·gapopen − extend_cost·gaps`,
    /// with `penalty`/`open_cost`/`extend_cost` all non-negative magnitudes.
    #[inline]
    pub fn raw_score(&self, nident: i64, mismatch: i64, gapopen: i64, gaps: i64) -> i64 {
        self.reward as i64 * nident - self.penalty as i64 * mismatch - self.open_cost as i64 * gapopen
            - self.extend_cost as i64 * gaps
    }

    /// The score used for bitscore/e-value, rounded down to the nearest even
    /// integer when the parameter-table entry requires it.
    fn normalized_score(&self, raw_score: i64) -> f64 {
        if self.round_down_score {
            let floored_even = if raw_score % 2 == 0 { raw_score } else { raw_score - 1 };
            floored_even as f64
        } else {
            raw_score as f64
        }
    }

    /// `(lambda·score − ln K) / ln 2`
    #[inline]
    pub fn bitscore(&self, raw_score: i64) -> f64 {
        let score = self.normalized_score(raw_score);
        (self.lambda * score - self.k.ln()) / std::f64::consts::LN_2
    }

    /// `K · qlen · database_size · exp(−lambda · score)`
    #[inline]
    pub fn evalue(&self, raw_score: i64, qlen: i64) -> f64 {
        let score = self.normalized_score(raw_score);
        self.k * qlen as f64 * self.database_size * (-self.lambda * score).exp()
    }

    /// `100 · nident / length`
    #[inline]
    pub fn pident(&self, nident: i64, length: i64) -> f64 {
        100.0 * nident as f64 / length as f64
    }

    /// Recomputes and returns `(pident, raw_score, bitscore, evalue)` for an
    /// alignment's current count fields.
    pub(crate) fn statistics(&self, alignment: &Alignment) -> (f64, f64, f64, f64) {
        let raw_score = self.raw_score(alignment.nident, alignment.mismatch, alignment.gapopen, alignment.gaps);
        let pident = self.pident(alignment.nident, alignment.length);
        let bitscore = self.bitscore(raw_score);
        let evalue = self.evalue(raw_score, alignment.qlen);
        (pident, raw_score as f64, bitscore, evalue)
    }
}

/// Either kind of configuration-time error [`ScoringSystem::new`] can return.
#[derive(Debug, Clone)]
pub enum ScoringErrorOrRange {
    Scoring(ScoringError),
    OutOfRange(OutOfRange),
}

impl std::fmt::Display for ScoringErrorOrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringErrorOrRange::Scoring(e) => write!(f, "{e}"),
            ScoringErrorOrRange::OutOfRange(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScoringErrorOrRange {}

impl From<ScoringError> for ScoringErrorOrRange {
    fn from(e: ScoringError) -> Self {
        ScoringErrorOrRange::Scoring(e)
    }
}

impl From<OutOfRange> for ScoringErrorOrRange {
    fn from(e: OutOfRange) -> Self {
        ScoringErrorOrRange::OutOfRange(e)
    }
}

impl From<ScoringErrorOrRange> for crate::paste::error::Error {
    fn from(e: ScoringErrorOrRange) -> Self {
        match e {
            ScoringErrorOrRange::Scoring(e) => e.into(),
            ScoringErrorOrRange::OutOfRange(e) => e.into(),
        }
    }
}
