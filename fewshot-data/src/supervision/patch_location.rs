//! The patch location pretext task.
//!
//! Every image is cut into a 3x3 grid. The task pairs the center tile with
//! one of the eight surrounding tiles and asks for the position of the
//! latter.

use crate::{
    common::*,
    dataset::SampleRecord,
    processor::{batch_resize_size, ImageLoader},
};

/// The target of the shorter side before the image is cut.
pub const PATCH_SHORT_SIZE: usize = 600;
/// The number of tiles along each side.
pub const GRID_SIZE: usize = 3;
/// The number of tiles surrounding the center.
pub const NUM_NEIGHBORS: i64 = 8;

#[derive(Debug, Clone)]
pub struct PatchLocationTask {
    loader: ImageLoader,
    img_max_size: usize,
}

impl PatchLocationTask {
    pub fn new(loader: ImageLoader, img_max_size: usize) -> Self {
        Self {
            loader,
            img_max_size,
        }
    }

    /// The shared image size of the task, a multiple of the grid size.
    pub fn batch_size_of(&self, records: &[Arc<SampleRecord>]) -> Result<HW<usize>> {
        let sizes: Vec<_> = records.iter().map(|record| record.size()).collect();
        batch_resize_size(
            &sizes,
            PATCH_SHORT_SIZE,
            self.img_max_size,
            NonZeroUsize::new(GRID_SIZE).unwrap(),
        )
    }

    /// Produce the `[batch, 2, 3, height / 3, width / 3]` tile pairs and
    /// the `[batch]` neighbor positions.
    pub fn generate(
        &self,
        records: &[Arc<SampleRecord>],
        rng: &mut StdRng,
    ) -> Result<(Tensor, Tensor)> {
        let size = self.batch_size_of(records)?;
        let tile_h = (size.h() / GRID_SIZE) as i64;
        let tile_w = (size.w() / GRID_SIZE) as i64;
        let batch_size = records.len() as i64;

        let pairs = Tensor::zeros(
            &[batch_size, 2, 3, tile_h, tile_w],
            (Kind::Float, Device::Cpu),
        );
        let labels: Vec<i64> = records
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<_> {
                let image = self.loader.load_resized(&record.fpath_img, &size)?;
                let (center, neighbors) = split_patches(&image)?;
                let label = rng.gen_range(0..NUM_NEIGHBORS);

                let pair = pairs.select(0, index as i64);
                tch::no_grad(|| -> Result<_> {
                    pair.select(0, 0).f_copy_(&center)?;
                    pair.select(0, 1).f_copy_(&neighbors[label as usize])?;
                    Ok(())
                })?;
                Ok(label)
            })
            .try_collect()?;

        Ok((pairs, Tensor::of_slice(&labels)))
    }
}

/// Cut a `[channels, height, width]` image into a 3x3 grid.
///
/// Returns the center tile and the eight surrounding tiles. The surrounding
/// tiles are ordered column by column, top to bottom within a column.
pub fn split_patches(image: &Tensor) -> Result<(Tensor, Vec<Tensor>)> {
    let (_channels, height, width) = image.size3()?;
    let grid = GRID_SIZE as i64;
    let tile_h = height / grid;
    let tile_w = width / grid;
    ensure!(
        tile_h > 0 && tile_w > 0,
        "image of size {}x{} is too small to be cut into {}x{} tiles",
        height,
        width,
        grid,
        grid
    );
    let tile = |row: i64, col: i64| image.f_crop(row * tile_h, col * tile_w, tile_h, tile_w);

    let center = tile(1, 1)?;
    let neighbors: Vec<_> = (0..grid)
        .flat_map(|col| (0..grid).map(move |row| (row, col)))
        .filter(|&(row, col)| (row, col) != (1, 1))
        .map(|(row, col)| tile(row, col))
        .try_collect()?;

    Ok((center, neighbors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::NormalizeConfig,
        test_utils::{make_record, write_gradient_image},
    };

    #[test]
    fn split_into_equal_tiles() -> Result<()> {
        let image = Tensor::arange(3 * 600 * 600i64, (Kind::Int64, Device::Cpu))
            .view([3, 600, 600]);
        let (center, neighbors) = split_patches(&image)?;

        assert_eq!(center.size(), vec![3, 200, 200]);
        assert!(center.equal(&image.crop(200, 200, 200, 200)));
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.iter().all(|tile| tile.size() == vec![3, 200, 200]));
        assert!(neighbors.iter().all(|tile| !tile.equal(&center)));

        // column major order around the center
        let origins = [
            (0, 0),
            (200, 0),
            (400, 0),
            (0, 200),
            (400, 200),
            (0, 400),
            (200, 400),
            (400, 400),
        ];
        for (tile, (top, left)) in neighbors.iter().zip(origins) {
            assert!(tile.equal(&image.crop(top, left, 200, 200)));
        }
        Ok(())
    }

    #[test]
    fn tiny_image_cannot_be_split() {
        let image = Tensor::zeros(&[3, 2, 9], (Kind::Float, Device::Cpu));
        assert!(split_patches(&image).is_err());
    }

    #[test]
    fn generate_pairs_per_sample() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_gradient_image(dir.path(), "a.png", 60, 40)?;
        write_gradient_image(dir.path(), "b.png", 45, 30)?;
        let records = vec![
            make_record("a.png", 60, 40, 1),
            make_record("b.png", 45, 30, 1),
        ];

        let loader = ImageLoader::new(dir.path(), &NormalizeConfig::default())?;
        let task = PatchLocationTask::new(loader, 1000);

        // scale min(600 / 40, 1000 / 60) = 15 -> 900x600
        let size = task.batch_size_of(&records)?;
        assert_eq!(size.hw(), [900, 600]);

        let mut rng = StdRng::seed_from_u64(1);
        let (pairs, labels) = task.generate(&records, &mut rng)?;
        assert_eq!(pairs.size(), vec![2, 2, 3, 300, 200]);
        assert_eq!(labels.size(), vec![2]);
        assert_eq!(labels.kind(), Kind::Int64);

        for index in 0..2 {
            let label = labels.int64_value(&[index]);
            assert!((0..NUM_NEIGHBORS).contains(&label));
        }
        assert!(!pairs.select(0, 0).equal(&pairs.select(0, 1)));
        Ok(())
    }

    #[test]
    fn pairs_hold_center_then_chosen_neighbor() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_gradient_image(dir.path(), "a.png", 30, 45)?;
        write_gradient_image(dir.path(), "b.png", 40, 60)?;
        write_gradient_image(dir.path(), "c.png", 36, 50)?;
        let records = vec![
            make_record("a.png", 30, 45, 1),
            make_record("b.png", 40, 60, 1),
            make_record("c.png", 36, 50, 1),
        ];

        let identity = NormalizeConfig {
            mean: [r64(0.0); 3],
            std: [r64(1.0); 3],
        };
        let loader = ImageLoader::new(dir.path(), &identity)?;
        let task = PatchLocationTask::new(loader.clone(), 1000);
        let size = task.batch_size_of(&records)?;

        let mut rng = StdRng::seed_from_u64(9);
        let (pairs, labels) = task.generate(&records, &mut rng)?;

        for (index, record) in records.iter().enumerate() {
            let index = index as i64;
            let image = loader.load_resized(&record.fpath_img, &size)?;
            let (center, neighbors) = split_patches(&image)?;
            let label = labels.int64_value(&[index]) as usize;

            let pair = pairs.select(0, index);
            assert!(pair.select(0, 0).equal(&center));
            assert!(pair.select(0, 1).equal(&neighbors[label]));
            assert!(!center.equal(&neighbors[label]));
        }
        Ok(())
    }
}
