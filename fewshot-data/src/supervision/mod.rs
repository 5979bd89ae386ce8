//! Supervision tensors attached on top of the core batch.

mod lazy;
pub mod patch_location;
pub mod rotation;
mod spec;

pub use lazy::*;
pub use patch_location::PatchLocationTask;
pub use rotation::RotationTask;
pub use spec::*;

use crate::{
    common::*,
    dataset::SampleRecord,
    processor::BatchAssembler,
    profiling::Timing,
    transform::Transform,
};

/// A supervision task resolved from its declaration.
#[derive(Debug, Clone)]
pub enum Supervision {
    PatchLocation(PatchLocationTask),
    Rotation(RotationTask),
    /// One item per anchor, of rank 1 or 2.
    Instance { name: String, transform: Transform },
    /// One dense map per image, of rank 2 or 3.
    ImageMap { name: String, transform: Transform },
    /// One scalar per image.
    ImageScene { name: String, transform: Transform },
}

impl Supervision {
    pub fn resolve(spec: &SupervisionSpec, assembler: &BatchAssembler) -> Result<Self> {
        let SupervisionSpec {
            ref name,
            kind,
            content,
            ref other,
        } = *spec;
        let root_dataset = assembler.loader().root_dataset();

        let supervision = match (kind, content) {
            (SupervisionKind::SelfSupervised, _) => match name.as_str() {
                "patch_location" => Self::PatchLocation(PatchLocationTask::new(
                    assembler.loader().clone(),
                    assembler.img_max_size(),
                )),
                "rotation" => Self::Rotation(RotationTask::new(assembler.loader().clone())),
                _ => bail!("unknown self supervision '{}'", name),
            },
            (SupervisionKind::Instance, _) => Self::Instance {
                name: name.clone(),
                transform: Transform::resolve(name, other.as_ref(), root_dataset)?,
            },
            (SupervisionKind::Image, Some(ImageContent::Map)) => Self::ImageMap {
                name: name.clone(),
                transform: Transform::resolve(name, other.as_ref(), root_dataset)?,
            },
            (SupervisionKind::Image, Some(ImageContent::Scene)) => Self::ImageScene {
                name: name.clone(),
                transform: Transform::resolve(name, other.as_ref(), root_dataset)?,
            },
            (SupervisionKind::Image, None) => {
                bail!("image supervision '{}' must specify its content", name)
            }
        };

        Ok(supervision)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PatchLocation(_) => "patch_location",
            Self::Rotation(_) => "rotation",
            Self::Instance { name, .. }
            | Self::ImageMap { name, .. }
            | Self::ImageScene { name, .. } => name,
        }
    }

    pub fn is_self_supervised(&self) -> bool {
        matches!(self, Self::PatchLocation(_) | Self::Rotation(_))
    }

    /// The names of the tensors this supervision produces.
    pub fn output_keys(&self) -> Vec<String> {
        match self {
            Self::PatchLocation(_) | Self::Rotation(_) => {
                vec![format!("{}_img", self.name()), format!("{}_label", self.name())]
            }
            _ => vec![self.name().to_owned()],
        }
    }
}

/// The ordered set of supervisions of a dataset.
#[derive(Debug, Clone)]
pub struct SupervisionSet {
    supervisions: Vec<Supervision>,
    max_anchor_per_img: usize,
}

impl SupervisionSet {
    pub fn new(specs: &[SupervisionSpec], assembler: &BatchAssembler) -> Result<Self> {
        let supervisions: Vec<_> = specs
            .iter()
            .map(|spec| {
                Supervision::resolve(spec, assembler)
                    .with_context(|| format!("invalid supervision '{}'", spec.name))
            })
            .try_collect()?;

        let duplicated: Vec<_> = supervisions
            .iter()
            .flat_map(|supervision| supervision.output_keys())
            .duplicates()
            .collect();
        ensure!(
            duplicated.is_empty(),
            "supervision outputs are declared more than once: {}",
            duplicated.join(", ")
        );

        Ok(Self {
            supervisions,
            max_anchor_per_img: assembler.max_anchor_per_img(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.supervisions.is_empty()
    }

    /// Output names in the order they appear in a batch. Pretext task
    /// outputs come first.
    pub fn output_keys(&self) -> Vec<String> {
        let (pretext, others): (Vec<_>, Vec<_>) = self
            .supervisions
            .iter()
            .partition(|supervision| supervision.is_self_supervised());
        pretext
            .into_iter()
            .chain(others)
            .flat_map(|supervision| supervision.output_keys())
            .collect()
    }

    /// Compute every supervision tensor of a batch.
    ///
    /// `size` is the padded size of the core batch that dense maps are
    /// resized to.
    pub fn attach(
        &self,
        records: &[Arc<SampleRecord>],
        size: &HW<usize>,
        rng: &mut StdRng,
    ) -> Result<IndexMap<String, Tensor>> {
        let mut timing = Timing::new("supervision");
        let batch_size = records.len() as i64;
        let mut output = IndexMap::new();

        // pretext tasks
        for supervision in &self.supervisions {
            let (images, labels) = match supervision {
                Supervision::PatchLocation(task) => task.generate(records, rng)?,
                Supervision::Rotation(task) => task.generate(records, rng)?,
                _ => continue,
            };
            let name = supervision.name();
            output.insert(format!("{}_img", name), images);
            output.insert(format!("{}_label", name), labels);
        }
        timing.add_event("pretext tasks");

        // per-name slots, allocated on the first write
        let mut slots: Vec<(&Supervision, LazyTensor)> = self
            .supervisions
            .iter()
            .filter_map(|supervision| {
                let leading = match supervision {
                    Supervision::Instance { .. } => {
                        vec![batch_size, self.max_anchor_per_img as i64]
                    }
                    Supervision::ImageMap { .. } | Supervision::ImageScene { .. } => {
                        vec![batch_size]
                    }
                    Supervision::PatchLocation(_) | Supervision::Rotation(_) => return None,
                };
                Some((supervision, LazyTensor::new(leading)))
            })
            .collect();

        for (index, record) in records.iter().enumerate() {
            let index = index as i64;

            for (supervision, slot) in &mut slots {
                let supervision = *supervision;
                let name = supervision.name();
                match supervision {
                    Supervision::Instance { transform, .. } => {
                        let num_anchors = record.anchors.len().min(self.max_anchor_per_img);
                        for (slot_index, annotation) in
                            record.anchors[..num_anchors].iter().enumerate()
                        {
                            let item = transform.apply(annotation.field(name)?)?;
                            ensure!(
                                matches!(item.dim(), 1 | 2),
                                "instance supervision '{}' must produce a vector or a matrix, but get shape {:?}",
                                name,
                                item.size()
                            );
                            slot.write(&[index, slot_index as i64], &item)?;
                        }
                    }
                    Supervision::ImageMap { transform, .. } => {
                        let map = transform.apply(record.field(name)?)?;
                        ensure!(
                            matches!(map.dim(), 2 | 3),
                            "map supervision '{}' must produce a 2D or 3D map, but get shape {:?}",
                            name,
                            map.size()
                        );
                        let [h, w] = size.hw();
                        let map = map.f_resize2d_nearest(h as i64, w as i64)?;
                        slot.write(&[index], &map)?;
                    }
                    Supervision::ImageScene { transform, .. } => {
                        let scene = transform.apply(record.field(name)?)?;
                        ensure!(
                            scene.dim() == 0,
                            "scene supervision '{}' must produce a scalar, but get shape {:?}",
                            name,
                            scene.size()
                        );
                        slot.write(&[index], &scene)?;
                    }
                    Supervision::PatchLocation(_) | Supervision::Rotation(_) => unreachable!(),
                }
            }
        }
        timing.add_event("record supervisions");

        for (supervision, slot) in slots {
            let name = supervision.name();
            let tensor = slot
                .into_inner()
                .ok_or_else(|| format_err!("supervision '{}' produced no data", name))?;
            trace!("supervision '{}' has shape {:?}", name, tensor.size());
            output.insert(name.to_owned(), tensor);
        }
        timing.report();

        Ok(output)
    }
}
