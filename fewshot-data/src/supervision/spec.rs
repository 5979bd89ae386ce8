use crate::{common::*, transform::TransformParams};

/// A declared supervision task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionSpec {
    /// The task name. It selects the transform and names the output tensor.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SupervisionKind,
    /// Required by image level tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ImageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<TransformParams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupervisionKind {
    /// Pretext tasks derived from the image itself.
    #[serde(rename = "self")]
    SelfSupervised,
    /// Per-anchor targets read from anchor annotations.
    #[serde(rename = "inst")]
    Instance,
    /// Per-image targets read from the record.
    #[serde(rename = "img")]
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageContent {
    /// A dense map resized to the batch size.
    Map,
    /// A single value per image.
    Scene,
}
