//! Opening the alignment table for reading and the pasted results for
//! writing, with transparent gzip support chosen by file extension.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::utils::define_whichever;

pub mod reader;
pub mod writer;

define_whichever! {
    /// Where the alignment table is read from: stdin, a plain file, or a
    /// gzip-compressed file (chosen by a `.gz` extension).
    pub enum InputSource {
        Stdin(io::Stdin),
        Plain(File),
        Gzipped(MultiGzDecoder<File>),
    }
    impl Read for InputSource {}
}

define_whichever! {
    /// Where pasted alignments are written to: stdout, a plain file, or a
    /// gzip-compressed file (chosen by a `.gz` extension).
    pub enum OutputSink {
        Stdout(io::Stdout),
        Plain(File),
        Gzipped(GzEncoder<File>),
    }
    impl Write for OutputSink {}
}

fn has_gz_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Opens `path` for reading, or stdin when `path` is `None` or `-`.
/// Transparently gzip-decodes when the path ends in `.gz`.
pub fn open_input(path: Option<&Path>) -> io::Result<BufReader<InputSource>> {
    let source = match path {
        None => InputSource::Stdin(io::stdin()),
        Some(p) if p.as_os_str() == "-" => InputSource::Stdin(io::stdin()),
        Some(p) if has_gz_extension(p) => InputSource::Gzipped(MultiGzDecoder::new(File::open(p)?)),
        Some(p) => InputSource::Plain(File::open(p)?),
    };
    Ok(BufReader::new(source))
}

/// Opens `path` for writing, or stdout when `path` is `None` or `-`.
/// Transparently gzip-encodes when the path ends in `.gz`.
pub fn open_output(path: Option<&Path>) -> io::Result<BufWriter<OutputSink>> {
    let sink = match path {
        None => OutputSink::Stdout(io::stdout()),
        Some(p) if p.as_os_str() == "-" => OutputSink::Stdout(io::stdout()),
        Some(p) if has_gz_extension(p) => OutputSink::Gzipped(GzEncoder::new(File::create(p)?, Compression::default())),
        Some(p) => OutputSink::Plain(File::create(p)?),
    };
    Ok(BufWriter::new(sink))
}
