use crate::{
    common::*,
    dataset::{AnchorAnnotation, SampleRecord},
};

pub fn make_record(
    name: &str,
    height: usize,
    width: usize,
    num_anchors: usize,
) -> Arc<SampleRecord> {
    let anchors = (0..num_anchors)
        .map(|index| AnchorAnnotation {
            anchor: AnchorBox::new([index as f64, 1.0, index as f64 + 5.0, 6.0]),
            label: index as i64 + 1,
            extra: HashMap::new(),
        })
        .collect();

    Arc::new(SampleRecord {
        fpath_img: PathBuf::from(name),
        height,
        width,
        anchors,
        extra: HashMap::new(),
    })
}

/// Write a constant color PNG image.
pub fn write_image(dir: &Path, name: &str, height: i64, width: i64, value: i64) -> Result<PathBuf> {
    let image = Tensor::full(&[3, height, width], value, (Kind::Uint8, Device::Cpu));
    save_image(dir, name, &image)
}

/// Write a PNG image whose pixels vary along both axes.
pub fn write_gradient_image(dir: &Path, name: &str, height: i64, width: i64) -> Result<PathBuf> {
    let rows = Tensor::arange(height, (Kind::Int64, Device::Cpu)).view([1, height, 1]);
    let cols = Tensor::arange(width, (Kind::Int64, Device::Cpu)).view([1, 1, width]);
    let image = (rows * 7 + cols * 3)
        .remainder(256i64)
        .expand(&[3, height, width], false)
        .contiguous()
        .to_kind(Kind::Uint8);
    save_image(dir, name, &image)
}

pub fn save_image(dir: &Path, name: &str, image: &Tensor) -> Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tch::vision::image::save(image, &path)?;
    Ok(path)
}
