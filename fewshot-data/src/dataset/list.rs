use super::SampleRecord;
use crate::common::*;
use std::{
    fs::File,
    io::{BufRead, BufReader},
};

/// Load a record list file with one JSON object per line.
///
/// Blank lines are ignored. If `max_samples` is set, only the first records
/// are kept.
pub fn load_record_list(
    path: impl AsRef<Path>,
    max_samples: Option<NonZeroUsize>,
) -> Result<Vec<SampleRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path)
            .with_context(|| format!("failed to open record list '{}'", path.display()))?,
    );
    let limit = max_samples.map(NonZeroUsize::get).unwrap_or(usize::MAX);

    let records: Vec<SampleRecord> = reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_record(&line).with_context(|| {
                format!("invalid record at '{}' line {}", path.display(), index + 1)
            })),
            Err(err) => Some(Err(err.into())),
        })
        .take(limit)
        .try_collect()?;

    let num_empty = records
        .iter()
        .filter(|record| record.anchors.is_empty())
        .count();
    if num_empty > 0 {
        warn!(
            "{} out of {} records in '{}' have no anchors and will be skipped",
            num_empty,
            records.len(),
            path.display()
        );
    }
    info!("loaded {} records from '{}'", records.len(), path.display());

    Ok(records)
}

fn parse_record(line: &str) -> Result<SampleRecord> {
    let record: SampleRecord = serde_json::from_str(line)?;
    ensure!(
        record.height > 0 && record.width > 0,
        "image height and width must be positive"
    );
    Ok(record)
}
