//! Batch pipeline configuration format.

use crate::{common::*, supervision::SupervisionSpec};

pub use dataset::*;
pub use loader::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&text)?;
        config.dataset.normalize.validate()?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Dataset and batching options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The directory that image and mask paths are relative to.
        pub root_dataset: PathBuf,
        /// The record list file, one JSON object per line. Relative paths
        /// are resolved against `root_dataset`.
        pub list_file: PathBuf,
        #[serde(default)]
        pub mode: DatasetMode,
        /// The target size of the shorter image side.
        pub img_short_size: NonZeroUsize,
        /// The cap of the longer image side.
        pub img_max_size: NonZeroUsize,
        /// Every batch dimension is rounded up to a multiple of this value.
        pub padding_constant: NonZeroUsize,
        /// The down sampling rate of the feature map. It must not exceed
        /// `padding_constant`.
        pub down_sampling_rate: NonZeroUsize,
        pub batch_size_per_gpu: NonZeroUsize,
        /// Longer anchor lists are truncated silently.
        pub max_anchor_per_img: NonZeroUsize,
        /// If set, keep only the first records of the list.
        #[serde(default)]
        pub max_samples: Option<NonZeroUsize>,
        #[serde(default = "default_seed")]
        pub seed: u64,
        #[serde(default)]
        pub normalize: NormalizeConfig,
        #[serde(default)]
        pub supervision: Vec<SupervisionSpec>,
    }

    impl DatasetConfig {
        pub fn list_path(&self) -> PathBuf {
            self.root_dataset.join(&self.list_file)
        }
    }

    /// Selects whether supervision tensors are attached to batches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum DatasetMode {
        Train,
        Val,
    }

    impl Default for DatasetMode {
        fn default() -> Self {
            Self::Train
        }
    }

    /// Per-channel image normalization in RGB order.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NormalizeConfig {
        pub mean: [R64; 3],
        pub std: [R64; 3],
    }

    impl NormalizeConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.std.iter().all(|std| *std > 0.0),
                "normalize.std values must be positive"
            );
            Ok(())
        }

        pub fn mean(&self) -> [f64; 3] {
            self.mean.map(R64::raw)
        }

        pub fn std(&self) -> [f64; 3] {
            self.std.map(R64::raw)
        }
    }

    impl Default for NormalizeConfig {
        fn default() -> Self {
            Self {
                mean: [r64(0.485), r64(0.456), r64(0.406)],
                std: [r64(0.229), r64(0.224), r64(0.225)],
            }
        }
    }

    fn default_seed() -> u64 {
        73
    }
}

mod loader {
    use super::*;

    /// Parallel loading options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoaderConfig {
        /// The number of worker threads, each owning an independent dataset.
        pub num_workers: NonZeroUsize,
        /// The maximum number of finished batches waiting to be consumed.
        pub prefetch: NonZeroUsize,
    }

    impl Default for LoaderConfig {
        fn default() -> Self {
            Self {
                num_workers: NonZeroUsize::new(1).unwrap(),
                prefetch: NonZeroUsize::new(2).unwrap(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() -> Result<()> {
        let text = r#"{
            dataset: {
                root_dataset: "data",
                list_file: "train.odgt",
                img_short_size: 600,
                img_max_size: 1000,
                padding_constant: 32,
                down_sampling_rate: 8,
                batch_size_per_gpu: 2,
                max_anchor_per_img: 100,
            },
        }"#;
        let config: Config = json5::from_str(text)?;
        let dataset = &config.dataset;
        assert_eq!(dataset.mode, DatasetMode::Train);
        assert_eq!(dataset.seed, 73);
        assert_eq!(dataset.list_path(), Path::new("data/train.odgt"));
        assert!(dataset.supervision.is_empty());
        assert_eq!(dataset.normalize, NormalizeConfig::default());
        assert_eq!(config.loader.num_workers.get(), 1);
        Ok(())
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let text = r#"{
            dataset: {
                root_dataset: "data",
                list_file: "train.odgt",
                img_short_size: 0,
                img_max_size: 1000,
                padding_constant: 32,
                down_sampling_rate: 8,
                batch_size_per_gpu: 2,
                max_anchor_per_img: 100,
            },
        }"#;
        assert!(json5::from_str::<Config>(text).is_err());
    }
}
