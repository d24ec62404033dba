//! Groups the tab-separated alignment table into [`AlignmentBatch`]es
//! sharing `(qseqid, sseqid)`, in the order rows appear in the input.

use std::io::{BufRead, Read};

use crate::paste::error::{Error, ReadError, UnexpectedEmptyString};
use crate::paste::record::PasteParameters;
use crate::paste::scoring::ScoringSystem;
use crate::paste::{Alignment, AlignmentBatch};

struct PendingRow {
    qseqid: String,
    sseqid: String,
    fields: Vec<String>,
    id:     i64,
}

/// An iterator over `AlignmentBatch`es read from a tab-separated alignment
/// table. Lines sharing a `(qseqid, sseqid)` run do not need to be contiguous
/// with anything else in the file; they only need to be contiguous with each
/// other, per the input contract ("lines within a batch share columns 1-2").
pub struct BatchReader<R> {
    lines:          std::io::Lines<std::io::BufReader<R>>,
    scoring_system: ScoringSystem,
    params:         PasteParameters,
    next_id:        i64,
    pending:        Option<PendingRow>,
    exhausted:      bool,
}

impl<R: Read> BatchReader<R> {
    pub fn new(source: std::io::BufReader<R>, scoring_system: ScoringSystem, params: PasteParameters) -> Self {
        Self {
            lines: source.lines(),
            scoring_system,
            params,
            next_id: 0,
            pending: None,
            exhausted: false,
        }
    }

    fn build_alignment(&self, id: i64, fields: &[String]) -> Result<Alignment, Error> {
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        Alignment::from_fields(id, &refs, &self.scoring_system, &self.params).map_err(Error::from)
    }

    fn take_row(&mut self) -> Option<Result<PendingRow, Error>> {
        loop {
            let line = match self.lines.next() {
                None => {
                    self.exhausted = true;
                    return None;
                }
                Some(Err(e)) => return Some(Err(ReadError::new(e.to_string()).into())),
                Some(Ok(line)) => line,
            };
            if line.is_empty() {
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Some(Err(ReadError::new(format!("row {id} ended before a qseqid/sseqid pair could be read")).into()));
            }
            if fields[0].is_empty() {
                return Some(Err(UnexpectedEmptyString { field: "qseqid" }.into()));
            }
            if fields[1].is_empty() {
                return Some(Err(UnexpectedEmptyString { field: "sseqid" }.into()));
            }

            return Some(Ok(PendingRow {
                qseqid: fields[0].to_string(),
                sseqid: fields[1].to_string(),
                fields: fields[2..].iter().map(|s| s.to_string()).collect(),
                id,
            }));
        }
    }
}

impl<R: Read> Iterator for BatchReader<R> {
    type Item = Result<AlignmentBatch, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.pending.take().map(Ok).or_else(|| {
            if self.exhausted {
                None
            } else {
                self.take_row()
            }
        })?;

        let first = match first {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };

        let qseqid = first.qseqid;
        let sseqid = first.sseqid;
        let mut alignments = Vec::new();
        match self.build_alignment(first.id, &first.fields) {
            Ok(a) => alignments.push(a),
            Err(e) => return Some(Err(e)),
        }

        loop {
            let row = match self.take_row() {
                None => break,
                Some(Ok(row)) => row,
                Some(Err(e)) => return Some(Err(e)),
            };

            if row.qseqid != qseqid || row.sseqid != sseqid {
                self.pending = Some(row);
                break;
            }

            match self.build_alignment(row.id, &row.fields) {
                Ok(a) => alignments.push(a),
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Ok(AlignmentBatch::new(qseqid, sseqid, alignments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> BatchReader<&[u8]> {
        let scoring = ScoringSystem::new(1, 5, 0, 0, 1.0).unwrap();
        BatchReader::new(std::io::BufReader::new(text.as_bytes()), scoring, PasteParameters::default())
    }

    #[test]
    fn groups_contiguous_rows_into_one_batch() {
        let text = "q1\ts1\t101\t110\t1001\t1010\t10\t0\t0\t0\t10\t2000\t10\tAAAAAAAAAA\tAAAAAAAAAA\n\
                     q1\ts1\t111\t120\t1011\t1020\t10\t0\t0\t0\t10\t2000\t10\tCCCCCCCCCC\tCCCCCCCCCC\n";
        let batches: Vec<_> = reader(text).collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].alignments.len(), 2);
        assert_eq!(batches[0].qseqid, "q1");
        assert_eq!(batches[0].sseqid, "s1");
    }

    #[test]
    fn starts_a_new_batch_when_qseqid_or_sseqid_changes() {
        let text = "q1\ts1\t101\t110\t1001\t1010\t10\t0\t0\t0\t10\t2000\t10\tAAAAAAAAAA\tAAAAAAAAAA\n\
                     q2\ts1\t101\t110\t1001\t1010\t10\t0\t0\t0\t10\t2000\t10\tAAAAAAAAAA\tAAAAAAAAAA\n";
        let batches: Vec<_> = reader(text).collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].qseqid, "q2");
    }

    #[test]
    fn rejects_empty_qseqid() {
        let text = "\ts1\t101\t110\t1001\t1010\t10\t0\t0\t0\t10\t2000\t10\tAAAAAAAAAA\tAAAAAAAAAA\n";
        let err = reader(text).collect::<Result<Vec<_>, _>>().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEmptyString(_)));
    }

    #[test]
    fn rejects_a_row_with_no_sseqid_column() {
        let text = "q1\n";
        let err = reader(text).collect::<Result<Vec<_>, _>>().unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let batches: Vec<_> = reader("").collect::<Result<Vec<_>, _>>().unwrap();
        assert!(batches.is_empty());
    }
}
