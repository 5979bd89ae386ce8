use super::{SamplePool, SampleRecord};
use crate::common::*;

/// The orientation class of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// height > width
    Tall,
    /// height <= width
    Wide,
}

impl Orientation {
    pub fn of(record: &SampleRecord) -> Self {
        if record.size().is_tall() {
            Self::Tall
        } else {
            Self::Wide
        }
    }
}

/// Groups records by orientation so that every batch is either all tall or
/// all wide.
#[derive(Debug)]
pub struct AspectBucketer {
    batch_size: usize,
    tall: Vec<Arc<SampleRecord>>,
    wide: Vec<Arc<SampleRecord>>,
}

impl AspectBucketer {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        let batch_size = batch_size.get();
        Self {
            batch_size,
            tall: Vec::with_capacity(batch_size),
            wide: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The number of pending records in the tall and wide buckets.
    pub fn pending(&self) -> (usize, usize) {
        (self.tall.len(), self.wide.len())
    }

    /// Put a record into its bucket. If the bucket becomes full, it is
    /// drained and its records are returned in arrival order.
    ///
    /// Records without anchors are dropped.
    pub fn push(&mut self, record: Arc<SampleRecord>) -> Option<Vec<Arc<SampleRecord>>> {
        if record.anchors.is_empty() {
            return None;
        }

        let batch_size = self.batch_size;
        let bucket = match Orientation::of(&record) {
            Orientation::Tall => &mut self.tall,
            Orientation::Wide => &mut self.wide,
        };
        bucket.push(record);

        (bucket.len() == batch_size).then(|| mem::replace(bucket, Vec::with_capacity(batch_size)))
    }

    /// Pull records from the pool until one bucket is complete.
    ///
    /// The pool must contain at least one record with anchors, otherwise
    /// this never returns.
    pub fn next_bucket(&mut self, pool: &mut SamplePool) -> Vec<Arc<SampleRecord>> {
        loop {
            let record = pool.next_record();
            if let Some(batch) = self.push(record) {
                return batch;
            }
        }
    }
}
