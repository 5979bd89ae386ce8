use crate::common::*;

/// Height and width pair, in pixels unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "height and width parameters must be non-negative"
        );
        Ok(Self { h, w })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    pub fn hw(&self) -> [T; 2] {
        [self.h, self.w]
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    pub fn min_side(&self) -> T {
        if self.h <= self.w {
            self.h
        } else {
            self.w
        }
    }

    pub fn max_side(&self) -> T {
        if self.h >= self.w {
            self.h
        } else {
            self.w
        }
    }

    /// Returns true if the height is strictly larger than the width.
    pub fn is_tall(&self) -> bool {
        self.h > self.w
    }

    /// Component-wise maximum of two sizes.
    pub fn max_with(&self, other: &Self) -> Self {
        let h = if other.h > self.h { other.h } else { self.h };
        let w = if other.w > self.w { other.w } else { self.w };
        Self { h, w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_sides() {
        let tall = HW::from_hw([100usize, 50]);
        assert_eq!(tall.min_side(), 50);
        assert_eq!(tall.max_side(), 100);
        assert!(tall.is_tall());

        let square = HW::from_hw([64usize, 64]);
        assert!(!square.is_tall());

        let merged = tall.max_with(&HW::from_hw([80, 70]));
        assert_eq!(merged.hw(), [100, 70]);
    }

    #[test]
    fn negative_size_is_rejected() {
        assert!(HW::try_from_hw([-1i64, 3]).is_err());
    }
}
