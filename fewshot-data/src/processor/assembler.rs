//! Batch assembly from a group of records.

use super::{batch_resize_size, ImageLoader};
use crate::{
    common::*,
    config::DatasetConfig,
    dataset::{AnchorAnnotation, SampleRecord},
    profiling::Timing,
};

/// The core tensors of a batch, before supervision is attached.
#[derive(Debug)]
pub struct AssembledBatch {
    /// The padded size shared by every image in the batch.
    pub size: HW<usize>,
    pub img_data: Tensor,
    pub scales: Tensor,
    pub label: Tensor,
    pub anchors: Tensor,
    pub anchor_num: Tensor,
}

/// Resizes, normalizes and packs a group of images and their anchors.
#[derive(Debug, Clone)]
pub struct BatchAssembler {
    loader: ImageLoader,
    img_short_size: usize,
    img_max_size: usize,
    padding_constant: NonZeroUsize,
    down_sampling_rate: NonZeroUsize,
    max_anchor_per_img: usize,
}

impl BatchAssembler {
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        let DatasetConfig {
            ref root_dataset,
            ref normalize,
            img_short_size,
            img_max_size,
            padding_constant,
            down_sampling_rate,
            max_anchor_per_img,
            ..
        } = *config;

        Ok(Self {
            loader: ImageLoader::new(root_dataset, normalize)?,
            img_short_size: img_short_size.get(),
            img_max_size: img_max_size.get(),
            padding_constant,
            down_sampling_rate,
            max_anchor_per_img: max_anchor_per_img.get(),
        })
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn img_max_size(&self) -> usize {
        self.img_max_size
    }

    pub fn max_anchor_per_img(&self) -> usize {
        self.max_anchor_per_img
    }

    /// The number of anchors of a record that make it into the batch.
    pub fn anchor_count(&self, record: &SampleRecord) -> usize {
        record.anchors.len().min(self.max_anchor_per_img)
    }

    /// The padded size shared by a group of records.
    pub fn batch_size_of(&self, records: &[Arc<SampleRecord>]) -> Result<HW<usize>> {
        let sizes: Vec<_> = records.iter().map(|record| record.size()).collect();
        batch_resize_size(
            &sizes,
            self.img_short_size,
            self.img_max_size,
            self.padding_constant,
        )
    }

    pub fn assemble(&self, records: &[Arc<SampleRecord>]) -> Result<AssembledBatch> {
        ensure!(
            self.padding_constant >= self.down_sampling_rate,
            "padding constant ({}) must be equal or larger than the down sampling rate ({})",
            self.padding_constant,
            self.down_sampling_rate
        );
        ensure!(!records.is_empty(), "cannot assemble an empty batch");
        let mut timing = Timing::new("batch_assembler");

        let batch_size = records.len() as i64;
        let size = self.batch_size_of(records)?;
        let [batch_h, batch_w] = size.hw();

        // the recorded scale is the padding ratio rather than the resize ratio
        let scales: Vec<f64> = records
            .iter()
            .flat_map(|record| {
                [
                    batch_h as f64 / record.height as f64,
                    batch_w as f64 / record.width as f64,
                ]
            })
            .collect();
        let scales = Tensor::of_slice(&scales).view([batch_size, 2]);
        timing.add_event("compute size");

        let img_data = Tensor::zeros(
            &[batch_size, 3, batch_h as i64, batch_w as i64],
            (Kind::Float, Device::Cpu),
        );
        records
            .iter()
            .enumerate()
            .try_for_each(|(index, record)| -> Result<_> {
                let image = self
                    .loader
                    .load_resized(&record.fpath_img, &size)
                    .with_context(|| {
                        format!("failed to load image '{}'", record.fpath_img.display())
                    })?;
                img_data.i(index as i64).f_paste_top_left_(&image)?;
                Ok(())
            })?;
        timing.add_event("load images");

        let (label, anchors, anchor_num) = self.anchor_tensors(records);
        timing.add_event("pack anchors");
        timing.report();

        debug!("assembled {} images into {}x{}", batch_size, batch_h, batch_w);

        Ok(AssembledBatch {
            size,
            img_data,
            scales,
            label,
            anchors,
            anchor_num,
        })
    }

    /// Pack labels and raw coordinates into zero padded tensors.
    fn anchor_tensors(&self, records: &[Arc<SampleRecord>]) -> (Tensor, Tensor, Tensor) {
        let batch_size = records.len();
        let max_anchors = self.max_anchor_per_img;
        let mut labels = vec![0i64; batch_size * max_anchors];
        let mut coords = vec![0f64; batch_size * max_anchors * 4];
        let mut counts = vec![0i64; batch_size];

        for (index, record) in records.iter().enumerate() {
            let num = self.anchor_count(record);
            counts[index] = num as i64;

            for (slot, annotation) in record.anchors[..num].iter().enumerate() {
                let AnchorAnnotation { anchor, label, .. } = annotation;
                let offset = index * max_anchors + slot;
                labels[offset] = *label;
                coords[(offset * 4)..(offset * 4 + 4)].copy_from_slice(&anchor.coords());
            }
        }

        let batch_size = batch_size as i64;
        let max_anchors = max_anchors as i64;
        (
            Tensor::of_slice(&labels).view([batch_size, max_anchors]),
            Tensor::of_slice(&coords).view([batch_size, max_anchors, 4]),
            Tensor::of_slice(&counts),
        )
    }
}
