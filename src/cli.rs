//! The `ringtail` command: keeps the last lines of its input in a ring buffer.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::PoisonError;

use clap::Parser;

use crate::alloc::Heap;
use crate::config::{Policy, CONFIG};
use crate::error::RingtailError;
use crate::policy::{Reassign, Reconstruct, ReplacePolicy};
use crate::ringbuffer::RingBuffer;

#[derive(Parser, Debug)]
#[command(name = "ringtail")]
#[command(about = "Print the last lines of a file through a fixed-capacity ring buffer")]
#[command(version)]
pub struct Cli {
    /// Number of lines to keep
    #[arg(short = 'n', long, value_name = "LINES")]
    pub lines: Option<usize>,

    /// How a full window makes room for a new line
    #[arg(long, value_enum)]
    pub policy: Option<Policy>,

    /// Log level for the log file (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Report read and evicted line counts on stderr
    #[arg(long)]
    pub stats: bool,

    /// Store the given options as defaults
    #[arg(long)]
    pub save: bool,

    /// File to read; stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub read: usize,
    pub evicted: usize,
}

/// Pushes every line of `input` through a window of `lines` slots and
/// writes what is left, oldest first.
pub fn tail<R, I, W>(input: I, lines: usize, out: &mut W) -> Result<Summary, RingtailError>
where
    R: ReplacePolicy,
    I: BufRead,
    W: Write,
{
    let mut window: RingBuffer<String, Heap, R> = RingBuffer::with_allocator(lines, Heap)?;
    let mut summary = Summary::default();

    for line in input.lines() {
        let line = line?;
        if window.is_full() {
            summary.evicted += 1;
        }
        window.push_back(line);
        summary.read += 1;
    }

    for line in &window {
        writeln!(out, "{line}")?;
    }
    Ok(summary)
}

pub fn run(cli: Cli) -> Result<(), RingtailError> {
    let (lines, policy, level) = {
        let mut config = CONFIG.lock().unwrap_or_else(PoisonError::into_inner);
        if cli.lines.is_some() {
            config.lines = cli.lines;
        }
        if cli.policy.is_some() {
            config.policy = cli.policy;
        }
        if cli.log_level.is_some() {
            config.log_level = cli.log_level.clone();
        }
        if cli.save {
            config.save()?;
        }
        (
            config.lines(),
            config.policy.unwrap_or_default(),
            config.log_level.clone().unwrap_or_else(|| "info".to_string()),
        )
    };

    crate::log::init(crate::log::parse_level(&level)?)?;
    log::info!("keeping {lines} lines with the {policy:?} policy");

    let input: Box<dyn BufRead> = match &cli.file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match policy {
        Policy::Reconstruct => tail::<Reconstruct, _, _>(input, lines, &mut out)?,
        Policy::Reassign => tail::<Reassign, _, _>(input, lines, &mut out)?,
    };
    out.flush()?;

    log::info!("read {} lines, evicted {}", summary.read, summary.evicted);
    if cli.stats {
        eprintln!("read {} lines, evicted {}", summary.read, summary.evicted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RingBufferError;

    fn run_tail<R: ReplacePolicy>(input: &str, lines: usize) -> (String, Summary) {
        let mut out = Vec::new();
        let summary = tail::<R, _, _>(input.as_bytes(), lines, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn keeps_the_last_lines() {
        let (out, summary) = run_tail::<Reconstruct>("a\nb\nc\nd\ne\n", 2);
        assert_eq!(out, "d\ne\n");
        assert_eq!(summary, Summary { read: 5, evicted: 3 });
    }

    #[test]
    fn short_input_is_printed_whole() {
        let (out, summary) = run_tail::<Reassign>("one\ntwo\n", 10);
        assert_eq!(out, "one\ntwo\n");
        assert_eq!(summary.evicted, 0);
    }

    #[test]
    fn policies_agree() {
        let input = (0..50).map(|i| format!("line {i}\n")).collect::<String>();
        assert_eq!(run_tail::<Reconstruct>(&input, 7), run_tail::<Reassign>(&input, 7));
    }

    #[test]
    fn zero_lines_is_an_error() {
        let mut out = Vec::new();
        let err = tail::<Reconstruct, _, _>("x\n".as_bytes(), 0, &mut out).unwrap_err();
        assert!(matches!(err, RingtailError::Buffer(RingBufferError::ZeroCapacity)));
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "ringtail", "-n", "3", "--policy", "reassign", "--stats", "log.txt",
        ]);
        assert_eq!(cli.lines, Some(3));
        assert_eq!(cli.policy, Some(Policy::Reassign));
        assert!(cli.stats);
        assert!(!cli.save);
        assert_eq!(cli.file, Some(PathBuf::from("log.txt")));
    }
}
