//! Multi-threaded batch loading.

use crate::{
    common::*,
    config::DatasetConfig,
    dataset::{BaseDataset, Batch, SampleRecord},
};

/// Produces batches from several worker threads.
///
/// Every worker owns an independent dataset over its own shuffled copy of
/// the records, seeded with `seed + worker_index`. Batches of different
/// workers are interleaved in no particular order.
#[derive(Debug)]
pub struct ParallelLoader {
    receiver: Option<flume::Receiver<Result<Batch>>>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ParallelLoader {
    pub fn spawn(
        config: Arc<DatasetConfig>,
        records: Vec<Arc<SampleRecord>>,
        num_workers: NonZeroUsize,
        prefetch: NonZeroUsize,
    ) -> Result<Self> {
        let datasets: Vec<_> = (0..num_workers.get())
            .map(|worker_index| {
                let seed = config.seed.wrapping_add(worker_index as u64);
                BaseDataset::new(config.clone(), records.clone(), seed)
            })
            .try_collect()?;

        let (sender, receiver) = flume::bounded(prefetch.get());
        let stop = Arc::new(AtomicBool::new(false));

        let workers: Vec<_> = datasets
            .into_iter()
            .enumerate()
            .map(|(worker_index, mut dataset)| {
                let sender = sender.clone();
                let stop = stop.clone();

                thread::Builder::new()
                    .name(format!("data-worker-{}", worker_index))
                    .spawn(move || {
                        while !stop.load(atomic::Ordering::SeqCst) {
                            let result = dataset.next_batch();
                            let failed = result.is_err();
                            if sender.send(result).is_err() {
                                break;
                            }
                            if failed {
                                warn!("data worker {} stopped on error", worker_index);
                                break;
                            }
                        }
                        debug!("data worker {} finished", worker_index);
                    })
            })
            .try_collect()?;

        info!(
            "started {} data workers with prefetch {}",
            workers.len(),
            prefetch
        );

        Ok(Self {
            receiver: Some(receiver),
            stop,
            workers,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Iterator for ParallelLoader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.as_ref()?.recv().ok()
    }
}

impl Drop for ParallelLoader {
    fn drop(&mut self) {
        self.stop.store(true, atomic::Ordering::SeqCst);
        // unblock workers waiting on a full channel
        self.receiver = None;
        self.workers.drain(..).for_each(|worker| {
            if worker.join().is_err() {
                warn!("a data worker panicked");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_record, write_image};

    fn test_config(root: &Path) -> Arc<DatasetConfig> {
        let config: DatasetConfig = json5::from_str(&format!(
            r#"{{
                root_dataset: "{}",
                list_file: "list.odgt",
                img_short_size: 16,
                img_max_size: 32,
                padding_constant: 8,
                down_sampling_rate: 8,
                batch_size_per_gpu: 2,
                max_anchor_per_img: 2,
            }}"#,
            root.display()
        ))
        .unwrap();
        Arc::new(config)
    }

    #[test]
    fn batches_from_all_workers() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let records: Vec<_> = (0..4)
            .map(|index| -> Result<_> {
                let name = format!("{}.png", index);
                write_image(dir.path(), &name, 20, 30, 50)?;
                Ok(make_record(&name, 20, 30, 1))
            })
            .try_collect()?;

        let loader = ParallelLoader::spawn(
            test_config(dir.path()),
            records,
            NonZeroUsize::new(3).unwrap(),
            NonZeroUsize::new(2).unwrap(),
        )?;
        assert_eq!(loader.num_workers(), 3);

        for batch in loader.take(8) {
            let batch = batch?;
            assert_eq!(batch.img_data.size(), vec![2, 3, 16, 24]);
        }
        Ok(())
    }

    #[test]
    fn worker_errors_are_delivered() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let records = vec![make_record("missing.png", 20, 30, 1)];
        let mut loader = ParallelLoader::spawn(
            test_config(dir.path()),
            records,
            NonZeroUsize::new(2).unwrap(),
            NonZeroUsize::new(1).unwrap(),
        )?;

        // each worker reports its failure once, then the stream ends
        assert!(loader.next().unwrap().is_err());
        assert!(loader.next().unwrap().is_err());
        assert!(loader.next().is_none());
        Ok(())
    }
}
