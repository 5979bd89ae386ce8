use super::{load_record_list, AspectBucketer, Batch, SamplePool, SampleRecord};
use crate::{
    common::*,
    config::{DatasetConfig, DatasetMode},
    processor::BatchAssembler,
    supervision::SupervisionSet,
};

/// The endless batch producer.
///
/// Records are pulled from a shuffled pool, grouped by orientation, packed
/// into batch tensors and, in train mode, decorated with supervision
/// tensors.
#[derive(Debug)]
pub struct BaseDataset {
    config: Arc<DatasetConfig>,
    pool: SamplePool,
    bucketer: AspectBucketer,
    assembler: BatchAssembler,
    supervisions: SupervisionSet,
    rng: StdRng,
}

impl BaseDataset {
    /// Load the record list named by the configuration and build a dataset
    /// seeded with the configured seed.
    pub fn open(config: Arc<DatasetConfig>) -> Result<Self> {
        let list_path = config.list_path();
        let records: Vec<_> = load_record_list(&list_path, config.max_samples)?
            .into_iter()
            .map(Arc::new)
            .collect();
        let seed = config.seed;
        Self::new(config, records, seed)
    }

    pub fn new(
        config: Arc<DatasetConfig>,
        records: Vec<Arc<SampleRecord>>,
        seed: u64,
    ) -> Result<Self> {
        ensure!(
            records.iter().any(|record| !record.anchors.is_empty()),
            "none of the {} records has anchors",
            records.len()
        );
        if let Some(record) = records
            .iter()
            .find(|record| record.height == 0 || record.width == 0)
        {
            bail!(
                "the record for '{}' has zero size {}x{}",
                record.fpath_img.display(),
                record.height,
                record.width
            );
        }

        let assembler = BatchAssembler::new(&config)?;
        let supervisions = SupervisionSet::new(&config.supervision, &assembler)?;
        let bucketer = AspectBucketer::new(config.batch_size_per_gpu);

        let mut rng = StdRng::seed_from_u64(seed);
        let pool = SamplePool::new(records, StdRng::from_rng(&mut rng)?)?;

        info!(
            "dataset ready with {} records, batch size {}, {:?} mode",
            pool.len(),
            bucketer.batch_size(),
            config.mode
        );
        if !supervisions.is_empty() && config.mode == DatasetMode::Val {
            info!("supervision is not attached in val mode");
        }

        Ok(Self {
            config,
            pool,
            bucketer,
            assembler,
            supervisions,
            rng,
        })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn num_records(&self) -> usize {
        self.pool.len()
    }

    /// The names of the tensors every produced batch carries.
    pub fn output_keys(&self) -> Vec<String> {
        let core = super::CORE_KEYS.iter().map(|key| key.to_string());
        match self.config.mode {
            DatasetMode::Train => core.chain(self.supervisions.output_keys()).collect(),
            DatasetMode::Val => core.collect(),
        }
    }

    /// Produce the next batch.
    pub fn next_batch(&mut self) -> Result<Batch> {
        let records = self.bucketer.next_bucket(&mut self.pool);
        let id = self
            .pool
            .last_index()
            .ok_or_else(|| format_err!("the pool has not been visited"))?;

        let assembled = self.assembler.assemble(&records)?;
        let supervision = match self.config.mode {
            DatasetMode::Train => {
                self.supervisions
                    .attach(&records, &assembled.size, &mut self.rng)?
            }
            DatasetMode::Val => IndexMap::new(),
        };

        Ok(Batch {
            img_data: assembled.img_data,
            scales: assembled.scales,
            label: assembled.label,
            anchors: assembled.anchors,
            anchor_num: assembled.anchor_num,
            id: Tensor::of_slice(&[id as i64]),
            supervision,
        })
    }
}

impl Iterator for BaseDataset {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_record, write_image};

    fn test_config(root: &Path, mode: &str, supervision: &str) -> Arc<DatasetConfig> {
        let config: DatasetConfig = json5::from_str(&format!(
            r#"{{
                root_dataset: "{}",
                list_file: "list.odgt",
                mode: "{}",
                img_short_size: 32,
                img_max_size: 64,
                padding_constant: 8,
                down_sampling_rate: 4,
                batch_size_per_gpu: 2,
                max_anchor_per_img: 4,
                supervision: {},
            }}"#,
            root.display(),
            mode,
            supervision
        ))
        .unwrap();
        Arc::new(config)
    }

    fn test_records(dir: &Path) -> Result<Vec<Arc<SampleRecord>>> {
        let mut records = vec![];
        for index in 0..3 {
            let tall = format!("tall{}.png", index);
            let wide = format!("wide{}.png", index);
            write_image(dir, &tall, 40, 20 + index as i64, 100)?;
            write_image(dir, &wide, 20, 40 + index as i64, 200)?;
            records.push(make_record(&tall, 40, 20 + index, 2));
            records.push(make_record(&wide, 20, 40 + index, 1));
        }
        records.push(make_record("empty.png", 20, 20, 0));
        Ok(records)
    }

    #[test]
    fn reject_pool_without_anchors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path(), "train", "[]");
        let records = vec![make_record("a.png", 10, 10, 0)];
        assert!(BaseDataset::new(config, records, 0).is_err());
        Ok(())
    }

    #[test]
    fn reject_records_of_zero_size() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path(), "train", "[]");
        let records = vec![
            make_record("a.png", 10, 10, 1),
            make_record("b.png", 0, 10, 1),
        ];
        assert!(BaseDataset::new(config.clone(), records, 0).is_err());

        let records = vec![make_record("a.png", 10, 0, 1)];
        assert!(BaseDataset::new(config, records, 0).is_err());
        Ok(())
    }

    #[test]
    fn produce_homogeneous_batches() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path(), "val", "[]");
        let records = test_records(dir.path())?;
        let num_records = records.len() as i64;
        let dataset = BaseDataset::new(config, records, 7)?;

        for batch in dataset.take(10) {
            let batch = batch?;
            assert_eq!(batch.batch_size(), 2);
            let [_, _, height, width] = <[i64; 4]>::try_from(batch.img_data.size()).unwrap();
            assert!(height % 8 == 0 && width % 8 == 0);
            assert_ne!(height, width);

            // anchor counts identify the orientation
            let count0 = batch.anchor_num.int64_value(&[0]);
            let count1 = batch.anchor_num.int64_value(&[1]);
            assert_eq!(count0, count1);
            assert_eq!(count0 == 2, height > width);

            let id = batch.id.int64_value(&[0]);
            assert!((0..num_records).contains(&id));
            assert_eq!(batch.supervision.len(), 0);
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_batches() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let records = test_records(dir.path())?;
        let ids = |seed| -> Result<Vec<i64>> {
            let config = test_config(dir.path(), "val", "[]");
            BaseDataset::new(config, records.clone(), seed)?
                .take(6)
                .map(|batch| -> Result<i64> { Ok(batch?.id.int64_value(&[0])) })
                .collect()
        };
        assert_eq!(ids(11)?, ids(11)?);
        Ok(())
    }

    #[test]
    fn train_mode_attaches_supervision() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let supervision = r#"[{ name: "rotation", type: "self" }]"#;
        let records = test_records(dir.path())?;

        let mut train = BaseDataset::new(
            test_config(dir.path(), "train", supervision),
            records.clone(),
            0,
        )?;
        assert_eq!(
            train.output_keys(),
            [
                "img_data",
                "scales",
                "label",
                "anchors",
                "anchor_num",
                "id",
                "rotation_img",
                "rotation_label"
            ]
        );
        let batch = train.next_batch()?;
        assert_eq!(batch.get("rotation_img").unwrap().size(), vec![2, 3, 600, 600]);

        let mut val = BaseDataset::new(test_config(dir.path(), "val", supervision), records, 0)?;
        assert_eq!(val.output_keys().len(), 6);
        assert!(val.next_batch()?.get("rotation_img").is_none());
        Ok(())
    }
}
