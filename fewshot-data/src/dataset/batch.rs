use crate::common::*;

/// The names of the tensors every batch carries.
pub const CORE_KEYS: [&str; 6] = ["img_data", "scales", "label", "anchors", "anchor_num", "id"];

/// The batch produced by the dataset.
#[derive(Debug)]
pub struct Batch {
    /// Images of shape `[batch, 3, height, width]`.
    pub img_data: Tensor,
    /// Per-sample `[height_scale, width_scale]` of shape `[batch, 2]`,
    /// the ratio of the padded batch size to the original image size.
    pub scales: Tensor,
    /// Anchor labels of shape `[batch, max_anchors]`.
    pub label: Tensor,
    /// Raw anchor coordinates of shape `[batch, max_anchors, 4]`.
    pub anchors: Tensor,
    /// The number of valid anchors per sample, of shape `[batch]`.
    pub anchor_num: Tensor,
    /// The pool position of the last visited record, of shape `[1]`.
    pub id: Tensor,
    /// Supervision tensors by output name.
    pub supervision: IndexMap<String, Tensor>,
}

impl Batch {
    pub fn batch_size(&self) -> i64 {
        self.img_data.size()[0]
    }

    pub fn get(&self, key: &str) -> Option<&Tensor> {
        let tensor = match key {
            "img_data" => &self.img_data,
            "scales" => &self.scales,
            "label" => &self.label,
            "anchors" => &self.anchors,
            "anchor_num" => &self.anchor_num,
            "id" => &self.id,
            _ => return self.supervision.get(key),
        };
        Some(tensor)
    }

    /// Iterate over all tensors by output name, core tensors first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        let core = [
            &self.img_data,
            &self.scales,
            &self.label,
            &self.anchors,
            &self.anchor_num,
            &self.id,
        ];
        CORE_KEYS.into_iter().zip(core).chain(
            self.supervision
                .iter()
                .map(|(key, tensor)| (key.as_str(), tensor)),
        )
    }

    pub fn to_device(&self, device: Device) -> Self {
        Self {
            img_data: self.img_data.to_device(device),
            scales: self.scales.to_device(device),
            label: self.label.to_device(device),
            anchors: self.anchors.to_device(device),
            anchor_num: self.anchor_num.to_device(device),
            id: self.id.to_device(device),
            supervision: self
                .supervision
                .iter()
                .map(|(key, tensor)| (key.clone(), tensor.to_device(device)))
                .collect(),
        }
    }

    /// Convert into a mapping from output names to tensors.
    pub fn into_map(self) -> IndexMap<String, Tensor> {
        let Self {
            img_data,
            scales,
            label,
            anchors,
            anchor_num,
            id,
            supervision,
        } = self;

        CORE_KEYS
            .into_iter()
            .map(ToOwned::to_owned)
            .zip([img_data, scales, label, anchors, anchor_num, id])
            .chain(supervision)
            .collect()
    }
}
