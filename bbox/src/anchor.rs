use crate::common::*;

/// Box annotation kept in the coordinate order it was written in.
///
/// Record lists store either a flat `[a, b, c, d]` array or the nested
/// `[[a, b], [c, d]]` form. Both decode to the same four coordinates in
/// row-major order. No unit conversion or reordering happens here, the
/// consumer of the batch decides how to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "RawCoords<T>")]
pub struct AnchorBox<T> {
    coords: [T; 4],
}

impl<T> AnchorBox<T>
where
    T: Copy,
{
    pub fn new(coords: [T; 4]) -> Self {
        Self { coords }
    }

    pub fn coords(&self) -> [T; 4] {
        self.coords
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoords<T> {
    Flat([T; 4]),
    Nested([[T; 2]; 2]),
}

impl<T> From<RawCoords<T>> for AnchorBox<T> {
    fn from(from: RawCoords<T>) -> Self {
        let coords = match from {
            RawCoords::Flat(coords) => coords,
            RawCoords::Nested([[a, b], [c, d]]) => [a, b, c, d],
        };
        Self { coords }
    }
}
