use crate::common::*;

/// A batched tensor whose trailing shape is taken from the first written
/// value.
///
/// The leading dimensions are fixed at construction. The backing tensor is
/// zero filled and allocated on the first write.
#[derive(Debug)]
pub struct LazyTensor {
    leading: Vec<i64>,
    tensor: Option<Tensor>,
}

impl LazyTensor {
    pub fn new(leading: impl Into<Vec<i64>>) -> Self {
        Self {
            leading: leading.into(),
            tensor: None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.tensor.is_some()
    }

    /// The shape of one item, known after the first write.
    pub fn item_size(&self) -> Option<Vec<i64>> {
        let tensor = self.tensor.as_ref()?;
        Some(tensor.size()[self.leading.len()..].to_vec())
    }

    /// Write `value` at position `index` of the leading dimensions.
    pub fn write(&mut self, index: &[i64], value: &Tensor) -> Result<()> {
        ensure!(
            index.len() == self.leading.len(),
            "expect an index of {} dimensions, but get {:?}",
            self.leading.len(),
            index
        );
        ensure!(
            index
                .iter()
                .zip(&self.leading)
                .all(|(&index, &bound)| (0..bound).contains(&index)),
            "index {:?} is out of bound {:?}",
            index,
            self.leading
        );

        let leading = &self.leading;
        let tensor = self.tensor.get_or_insert_with(|| {
            let size: Vec<_> = leading.iter().copied().chain(value.size()).collect();
            Tensor::zeros(&size, (value.kind(), value.device()))
        });

        let mut dst = index
            .iter()
            .fold(tensor.shallow_clone(), |dst, &index| dst.select(0, index));
        ensure!(
            dst.size() == value.size(),
            "item shape changed from {:?} to {:?}",
            dst.size(),
            value.size()
        );
        tch::no_grad(|| dst.f_copy_(value))?;
        Ok(())
    }

    pub fn into_inner(self) -> Option<Tensor> {
        self.tensor
    }
}
