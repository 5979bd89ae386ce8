//! Conversions from raw record fields into supervision tensors.

use crate::common::*;

/// Extra parameters of a transform, given by the `other` field of a
/// supervision entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformParams {
    /// The number of attribute classes.
    #[serde(default)]
    pub num_attr: Option<NonZeroUsize>,
}

/// The registered transforms, resolved by supervision name.
#[derive(Debug, Clone)]
pub enum Transform {
    Attr(AttrTransform),
    Seg(SegTransform),
    Scene(SceneTransform),
}

impl Transform {
    pub fn resolve(
        name: &str,
        params: Option<&TransformParams>,
        root_dataset: impl AsRef<Path>,
    ) -> Result<Self> {
        let transform = match name {
            "attr" => Self::Attr(AttrTransform::new(params)?),
            "seg" => Self::Seg(SegTransform::new(root_dataset)),
            "scene" => Self::Scene(SceneTransform),
            _ => bail!("no transform is registered for supervision '{}'", name),
        };
        Ok(transform)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Attr(_) => "attr",
            Self::Seg(_) => "seg",
            Self::Scene(_) => "scene",
        }
    }

    pub fn apply(&self, value: &Value) -> Result<Tensor> {
        match self {
            Self::Attr(transform) => transform.apply(value),
            Self::Seg(transform) => transform.apply(value),
            Self::Scene(transform) => transform.apply(value),
        }
        .with_context(|| format!("'{}' transform failed on {}", self.name(), value))
    }
}

/// Turns a list of active attribute indices into a multi-hot vector.
#[derive(Debug, Clone)]
pub struct AttrTransform {
    num_attr: usize,
}

impl AttrTransform {
    pub fn new(params: Option<&TransformParams>) -> Result<Self> {
        let num_attr = params
            .and_then(|params| params.num_attr)
            .ok_or_else(|| format_err!("no attribute num for attribute supervision"))?;
        Ok(Self {
            num_attr: num_attr.get(),
        })
    }

    pub fn apply(&self, value: &Value) -> Result<Tensor> {
        let indices: Vec<usize> = serde_json::from_value(value.clone())?;
        let mut hot = vec![0i64; self.num_attr];
        for index in indices {
            ensure!(
                index < self.num_attr,
                "attribute index {} exceeds the number of attributes {}",
                index,
                self.num_attr
            );
            hot[index] = 1;
        }
        Ok(Tensor::of_slice(&hot))
    }
}

/// Decodes a color coded mask image into a class index map.
///
/// The class index of a pixel is `G + 256 * floor(R / 10)`.
#[derive(Debug, Clone)]
pub struct SegTransform {
    root_dataset: PathBuf,
}

impl SegTransform {
    pub fn new(root_dataset: impl AsRef<Path>) -> Self {
        Self {
            root_dataset: root_dataset.as_ref().to_owned(),
        }
    }

    pub fn apply(&self, value: &Value) -> Result<Tensor> {
        let path = value
            .as_str()
            .ok_or_else(|| format_err!("expect a mask path"))?;
        let mask = load_rgb_image(self.root_dataset.join(path))?;
        Ok(decode_class_map(&mask))
    }
}

/// Reads an integer scene class.
#[derive(Debug, Clone)]
pub struct SceneTransform;

impl SceneTransform {
    pub fn apply(&self, value: &Value) -> Result<Tensor> {
        let class = value
            .as_i64()
            .ok_or_else(|| format_err!("expect an integer scene class"))?;
        Ok(Tensor::of_slice(&[class]).squeeze_dim(0))
    }
}

/// Compute `G + 256 * floor(R / 10)` on a `[3, height, width]` RGB mask.
pub fn decode_class_map(mask: &Tensor) -> Tensor {
    let red = mask.select(0, 0).to_kind(Kind::Float);
    let green = mask.select(0, 1).to_kind(Kind::Int64);
    green + (red / 10.0).floor().to_kind(Kind::Int64) * 256
}
