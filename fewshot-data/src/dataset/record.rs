use crate::common::*;

/// The per-image annotation record, without image pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleRecord {
    /// The image path relative to the dataset root.
    pub fpath_img: PathBuf,
    pub height: usize,
    pub width: usize,
    #[serde(default)]
    pub anchors: Vec<AnchorAnnotation>,
    /// Per-image supervision fields, looked up by supervision name.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl SampleRecord {
    pub fn size(&self) -> HW<usize> {
        HW::from_hw([self.height, self.width])
    }

    /// Get the per-image field for a supervision.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.extra.get(name).ok_or_else(|| {
            format_err!(
                "the record for '{}' has no '{}' field",
                self.fpath_img.display(),
                name
            )
        })
    }
}

/// A labeled box within an image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnchorAnnotation {
    pub anchor: AnchorBox<f64>,
    pub label: i64,
    /// Per-object supervision fields, looked up by supervision name.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl AnchorAnnotation {
    /// Get the per-object field for a supervision.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.extra
            .get(name)
            .ok_or_else(|| format_err!("the anchor has no '{}' field", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_record_with_extra_fields() -> Result<()> {
        let line = r#"{"fpath_img": "a/b.jpg", "height": 480, "width": 640,
            "anchors": [{"anchor": [1, 2, 30, 40], "label": 7, "attr": [0, 3]}],
            "seg": "a/b_seg.png", "scene": 2}"#;
        let record: SampleRecord = serde_json::from_str(line)?;

        assert_eq!(record.size().hw(), [480, 640]);
        assert_eq!(record.anchors.len(), 1);
        assert_eq!(record.anchors[0].label, 7);
        assert_eq!(record.anchors[0].anchor.coords(), [1.0, 2.0, 30.0, 40.0]);
        assert_eq!(record.anchors[0].field("attr")?, &serde_json::json!([0, 3]));
        assert_eq!(record.field("scene")?, &serde_json::json!(2));
        assert!(record.field("missing").is_err());
        Ok(())
    }

    #[test]
    fn anchors_default_to_empty() -> Result<()> {
        let record: SampleRecord =
            serde_json::from_str(r#"{"fpath_img": "x.jpg", "height": 4, "width": 5}"#)?;
        assert!(record.anchors.is_empty());
        Ok(())
    }
}
