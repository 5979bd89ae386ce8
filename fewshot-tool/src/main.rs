use anyhow::{Context, Result};
use clap::Parser;
use fewshot_data::{
    dataset::{load_record_list, Orientation},
    BaseDataset, Config, ParallelLoader,
};
use prettytable::{cell, row, Table};
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone, Parser)]
/// Inspect few-shot training data
enum Opts {
    /// Validate the configuration and summarize the record list
    Check {
        /// configuration file
        config_file: PathBuf,
    },
    /// Produce batches and print their tensor shapes
    Inspect {
        /// configuration file
        config_file: PathBuf,
        /// number of batches to produce
        #[clap(long, default_value = "4")]
        num_batches: usize,
    },
}

fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        pretty_env_logger::init();
    }

    match Opts::parse() {
        Opts::Check { config_file } => {
            check(config_file)?;
        }
        Opts::Inspect {
            config_file,
            num_batches,
        } => {
            inspect(config_file, num_batches)?;
        }
    }

    Ok(())
}

fn open_config(config_file: &Path) -> Result<Config> {
    Config::open(config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))
}

fn check(config_file: impl AsRef<Path>) -> Result<()> {
    let config = open_config(config_file.as_ref())?;
    let dataset_config = Arc::new(config.dataset);

    let records: Vec<_> = load_record_list(dataset_config.list_path(), dataset_config.max_samples)?
        .into_iter()
        .map(Arc::new)
        .collect();
    let num_empty = records.iter().filter(|record| record.anchors.is_empty()).count();
    let num_tall = records
        .iter()
        .filter(|record| !record.anchors.is_empty())
        .filter(|record| Orientation::of(record) == Orientation::Tall)
        .count();
    let num_wide = records.len() - num_empty - num_tall;
    let num_anchors: usize = records.iter().map(|record| record.anchors.len()).sum();

    let dataset = BaseDataset::new(dataset_config.clone(), records, dataset_config.seed)?;

    // print record summary
    {
        let mut table = Table::new();
        table.add_row(row!["item", "value"]);
        table.add_row(row!["records", dataset.num_records()]);
        table.add_row(row!["tall records", num_tall]);
        table.add_row(row!["wide records", num_wide]);
        table.add_row(row!["records without anchors", num_empty]);
        table.add_row(row!["anchors", num_anchors]);
        table.add_row(row!["mode", format!("{:?}", dataset_config.mode)]);
        table.add_row(row!["batch size", dataset_config.batch_size_per_gpu]);
        table.printstd();
    }

    // print output keys
    {
        let mut table = Table::new();
        table.add_row(row!["output key"]);
        dataset.output_keys().into_iter().for_each(|key| {
            table.add_row(row![key]);
        });
        table.printstd();
    }

    Ok(())
}

fn inspect(config_file: impl AsRef<Path>, num_batches: usize) -> Result<()> {
    let config = open_config(config_file.as_ref())?;
    let Config {
        dataset: dataset_config,
        loader: loader_config,
    } = config;
    let dataset_config = Arc::new(dataset_config);

    let records: Vec<_> = load_record_list(dataset_config.list_path(), dataset_config.max_samples)?
        .into_iter()
        .map(Arc::new)
        .collect();
    let loader = ParallelLoader::spawn(
        dataset_config,
        records,
        loader_config.num_workers,
        loader_config.prefetch,
    )?;

    let mut table = Table::new();
    table.add_row(row!["batch", "key", "shape", "kind"]);

    for (index, batch) in loader.take(num_batches).enumerate() {
        let batch = batch.with_context(|| format!("failed to produce batch {}", index))?;
        batch.iter().for_each(|(key, tensor)| {
            table.add_row(row![
                index,
                key,
                format!("{:?}", tensor.size()),
                format!("{:?}", tensor.kind()),
            ]);
        });
    }

    table.printstd();
    Ok(())
}
