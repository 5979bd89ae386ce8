use super::SampleRecord;
use crate::common::*;

/// A shuffled, endlessly cycled sequence of records.
///
/// The records are shuffled once before the first access and again every
/// time the cursor wraps around.
#[derive(Debug)]
pub struct SamplePool {
    records: Vec<Arc<SampleRecord>>,
    cursor: usize,
    last_index: Option<usize>,
    shuffled: bool,
    rng: StdRng,
}

impl SamplePool {
    pub fn new(records: Vec<Arc<SampleRecord>>, rng: StdRng) -> Result<Self> {
        ensure!(!records.is_empty(), "the sample pool cannot be empty");
        Ok(Self {
            records,
            cursor: 0,
            last_index: None,
            shuffled: false,
            rng,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The position of the next record to be visited.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The position of the most recently visited record in the current order.
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Visit the record at the cursor and advance the cursor.
    pub fn next_record(&mut self) -> Arc<SampleRecord> {
        if !self.shuffled {
            self.records.shuffle(&mut self.rng);
            self.shuffled = true;
        }

        let index = self.cursor;
        let record = self.records[index].clone();
        self.last_index = Some(index);

        self.cursor += 1;
        if self.cursor >= self.records.len() {
            self.cursor = 0;
            self.records.shuffle(&mut self.rng);
            trace!(
                "sample pool wrapped around, reshuffled {} records",
                self.records.len()
            );
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_record;
    use std::collections::HashSet;

    #[test]
    fn empty_pool_is_rejected() {
        assert!(SamplePool::new(vec![], StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn every_pass_visits_each_record_once() {
        let records: Vec<_> = (0..7)
            .map(|index| make_record(&format!("{}.jpg", index), 10, 10, 1))
            .collect();
        let mut pool = SamplePool::new(records, StdRng::seed_from_u64(3)).unwrap();

        for _ in 0..3 {
            let names: HashSet<_> = (0..7)
                .map(|_| pool.next_record().fpath_img.clone())
                .collect();
            assert_eq!(names.len(), 7);
            assert_eq!(pool.cursor(), 0);
        }
    }

    #[test]
    fn cursor_wraps_modulo_pool_size() {
        let records: Vec<_> = (0..3)
            .map(|index| make_record(&format!("{}.jpg", index), 10, 10, 1))
            .collect();
        let mut pool = SamplePool::new(records, StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(pool.last_index(), None);

        pool.next_record();
        assert_eq!((pool.cursor(), pool.last_index()), (1, Some(0)));
        pool.next_record();
        pool.next_record();
        assert_eq!((pool.cursor(), pool.last_index()), (0, Some(2)));
    }

    #[test]
    fn shuffle_before_first_pass_and_on_wraparound() {
        let names: Vec<_> = (0..32).map(|index| format!("{}.jpg", index)).collect();
        let records: Vec<_> = names
            .iter()
            .map(|name| make_record(name, 10, 10, 1))
            .collect();
        let mut pool = SamplePool::new(records, StdRng::seed_from_u64(5)).unwrap();

        let mut next_pass = || -> Vec<String> {
            (0..32)
                .map(|_| pool.next_record().fpath_img.display().to_string())
                .collect()
        };
        let pass1 = next_pass();
        let pass2 = next_pass();

        assert_ne!(pass1, names);
        assert_ne!(pass2, pass1);
    }

    #[test]
    fn identical_seeds_give_identical_order() {
        let records: Vec<_> = (0..16)
            .map(|index| make_record(&format!("{}.jpg", index), 10, 10, 1))
            .collect();
        let mut lhs = SamplePool::new(records.clone(), StdRng::seed_from_u64(42)).unwrap();
        let mut rhs = SamplePool::new(records, StdRng::seed_from_u64(42)).unwrap();

        for _ in 0..40 {
            assert_eq!(lhs.next_record(), rhs.next_record());
        }
    }
}
