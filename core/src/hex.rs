//! Cube coordinates for the hexagonal board.
//!
//! A [`HexCoord`] stores three axes `x`, `y` and `z`, where the `y` axis is
//! the sum of the other two. Several triples therefore describe the same hex;
//! [`HexCoord::reduce`] projects any of them onto the canonical two-axis form
//! with `y == 0`, and [`HexCoord::to_vector`] recovers the shortest three-axis
//! path to the same hex.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Location or offset on the hex grid expressed in cube coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    x: i32,
    #[serde(default)]
    y: i32,
    z: i32,
}

impl HexCoord {
    /// Centre of the board.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Creates a coordinate from its three raw components.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component along the `x` axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Component along the `y` axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Component along the `z` axis.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Folds the `y` component into `x` and `z`, leaving `y == 0`.
    ///
    /// The projection forgets which triple the caller started from.
    pub fn reduce(&mut self) {
        self.x += self.y;
        self.z += self.y;
        self.y = 0;
    }

    /// Rewrites the coordinate into its shortest three-axis form.
    ///
    /// When the reduced `x` and `z` share a strict sign the common part moves
    /// onto the `y` axis: the less negative value for negative pairs, the
    /// smaller value for positive pairs. Mixed or zero signs are already
    /// minimal and stay reduced.
    pub fn to_vector(&mut self) {
        self.reduce();
        if self.x < 0 && self.z < 0 {
            self.y = self.x.max(self.z);
        } else if self.x > 0 && self.z > 0 {
            self.y = self.x.min(self.z);
        } else {
            return;
        }
        self.x -= self.y;
        self.z -= self.y;
    }

    /// Reduces both coordinates in place and compares them.
    ///
    /// Both receivers are left in reduced form afterwards. Use
    /// [`HexCoord::same_hex`] when the operands must stay untouched.
    pub fn is_same_as(&mut self, other: &mut HexCoord) -> bool {
        self.reduce();
        other.reduce();
        self == other
    }

    /// Copy of the coordinate in reduced form.
    #[must_use]
    pub fn reduced(self) -> Self {
        let mut copy = self;
        copy.reduce();
        copy
    }

    /// Copy of the coordinate in its shortest three-axis form.
    #[must_use]
    pub fn vector(self) -> Self {
        let mut copy = self;
        copy.to_vector();
        copy
    }

    /// Reports whether both coordinates address the same hex.
    #[must_use]
    pub fn same_hex(&self, other: &HexCoord) -> bool {
        self.reduced() == other.reduced()
    }

    /// Number of single-hex steps between the two coordinates.
    #[must_use]
    pub fn distance(&self, other: &HexCoord) -> u32 {
        let delta = (*other - *self).vector();
        delta.x.unsigned_abs() + delta.y.unsigned_abs() + delta.z.unsigned_abs()
    }

    /// Adjacent hex in the provided direction.
    #[must_use]
    pub fn neighbor(self, direction: HexDirection) -> Self {
        self + direction.unit()
    }

    /// Hex reached by walking `steps` hexes in the provided direction.
    #[must_use]
    pub fn offset(self, direction: HexDirection, steps: i32) -> Self {
        let unit = direction.unit();
        Self::new(
            self.x + unit.x * steps,
            self.y + unit.y * steps,
            self.z + unit.z * steps,
        )
    }
}

impl Add for HexCoord {
    type Output = HexCoord;

    fn add(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// One of the six directions leading to an adjacent hex.
///
/// Directions are listed counter-clockwise, so adding one to the index turns
/// by sixty degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    /// Unit step along the positive `x` axis.
    PositiveX,
    /// Unit step along the positive `y` axis.
    PositiveY,
    /// Unit step along the positive `z` axis.
    PositiveZ,
    /// Unit step along the negative `x` axis.
    NegativeX,
    /// Unit step along the negative `y` axis.
    NegativeY,
    /// Unit step along the negative `z` axis.
    NegativeZ,
}

impl HexDirection {
    /// All directions in counter-clockwise order starting at `PositiveX`.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::PositiveX,
        HexDirection::PositiveY,
        HexDirection::PositiveZ,
        HexDirection::NegativeX,
        HexDirection::NegativeY,
        HexDirection::NegativeZ,
    ];

    /// Maps any integer onto a direction, wrapping modulo six.
    #[must_use]
    pub fn from_index(index: i64) -> Self {
        let wrapped = index.rem_euclid(6) as usize;
        Self::ALL[wrapped]
    }

    /// Position of the direction within [`HexDirection::ALL`].
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::PositiveX => 0,
            Self::PositiveY => 1,
            Self::PositiveZ => 2,
            Self::NegativeX => 3,
            Self::NegativeY => 4,
            Self::NegativeZ => 5,
        }
    }

    /// Direction obtained by turning `steps` sixths of a full circle.
    #[must_use]
    pub fn rotated(self, steps: i64) -> Self {
        Self::from_index(i64::from(self.index()) + steps.rem_euclid(6))
    }

    /// Offset of the adjacent hex in this direction.
    #[must_use]
    pub const fn unit(self) -> HexCoord {
        match self {
            Self::PositiveX => HexCoord::new(1, 0, 0),
            Self::PositiveY => HexCoord::new(0, 1, 0),
            Self::PositiveZ => HexCoord::new(0, 0, 1),
            Self::NegativeX => HexCoord::new(-1, 0, 0),
            Self::NegativeY => HexCoord::new(0, -1, 0),
            Self::NegativeZ => HexCoord::new(0, 0, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce_then_vector(start: (i32, i32, i32)) -> (HexCoord, HexCoord) {
        let mut coord = HexCoord::new(start.0, start.1, start.2);
        coord.reduce();
        let reduced = coord;
        coord.to_vector();
        (reduced, coord)
    }

    #[test]
    fn reduction_and_vector_literal_cases() {
        let cases = [
            ((4, 5, 0), (9, 0, 5), (4, 5, 0)),
            ((1, 0, 0), (1, 0, 0), (1, 0, 0)),
            ((-4, 5, 0), (1, 0, 5), (0, 1, 4)),
            ((-5, 5, -6), (0, 0, -1), (0, 0, -1)),
            ((-4, 0, 4), (-4, 0, 4), (-4, 0, 4)),
        ];

        for (start, reduced, vector) in cases {
            let (actual_reduced, actual_vector) = reduce_then_vector(start);
            assert_eq!(
                actual_reduced,
                HexCoord::new(reduced.0, reduced.1, reduced.2),
                "reduce {start:?}"
            );
            assert_eq!(
                actual_vector,
                HexCoord::new(vector.0, vector.1, vector.2),
                "to_vector {start:?}"
            );
        }
    }

    #[test]
    fn negative_pairs_move_the_less_negative_value_onto_y() {
        let mut coord = HexCoord::new(-3, 0, -5);
        coord.to_vector();
        assert_eq!(coord, HexCoord::new(0, -3, -2));
    }

    #[test]
    fn is_same_as_reduces_both_operands() {
        let mut left = HexCoord::new(4, 5, 0);
        let mut right = HexCoord::new(9, 0, 5);

        assert!(left.is_same_as(&mut right));
        assert_eq!(left, HexCoord::new(9, 0, 5));
        assert_eq!(right, HexCoord::new(9, 0, 5));
    }

    #[test]
    fn is_same_as_is_reflexive_and_symmetric() {
        let mut a = HexCoord::new(-4, 5, 0);
        let mut a_again = a;
        assert!(a.is_same_as(&mut a_again));

        let mut b = HexCoord::new(0, 1, 4);
        let mut c = HexCoord::new(-4, 5, 0);
        let forward = b.is_same_as(&mut c);
        let backward = c.is_same_as(&mut b);
        assert!(forward);
        assert_eq!(forward, backward);

        let mut d = HexCoord::new(1, 0, 0);
        let mut e = HexCoord::new(0, 0, 1);
        assert!(!d.is_same_as(&mut e));
        assert!(!e.is_same_as(&mut d));
    }

    #[test]
    fn same_hex_leaves_operands_untouched() {
        let left = HexCoord::new(4, 5, 0);
        let right = HexCoord::new(9, 0, 5);
        assert!(left.same_hex(&right));
        assert_eq!(left, HexCoord::new(4, 5, 0));
    }

    #[test]
    fn distance_counts_minimal_steps() {
        let origin = HexCoord::ORIGIN;
        assert_eq!(origin.distance(&HexCoord::new(4, 5, 0)), 9);
        assert_eq!(origin.distance(&HexCoord::new(9, 0, 5)), 9);
        assert_eq!(origin.distance(&HexCoord::new(-4, 0, 4)), 8);
        assert_eq!(origin.distance(&HexCoord::new(1, 0, 1)), 1);
        assert_eq!(HexCoord::new(2, 0, 0).distance(&HexCoord::new(-1, 0, 0)), 3);
    }

    #[test]
    fn every_direction_is_one_step_away() {
        for direction in HexDirection::ALL {
            assert_eq!(HexCoord::ORIGIN.distance(&direction.unit()), 1);
            let opposite = direction.rotated(3);
            let back = HexCoord::ORIGIN.neighbor(direction).neighbor(opposite);
            assert!(back.same_hex(&HexCoord::ORIGIN));
        }
    }

    #[test]
    fn neighbouring_directions_are_adjacent() {
        for direction in HexDirection::ALL {
            let here = direction.unit();
            let next = direction.rotated(1).unit();
            assert_eq!(here.distance(&next), 1, "{direction:?}");
        }
    }

    #[test]
    fn direction_indices_wrap() {
        assert_eq!(HexDirection::from_index(6), HexDirection::PositiveX);
        assert_eq!(HexDirection::from_index(-1), HexDirection::NegativeZ);
        assert_eq!(HexDirection::PositiveZ.rotated(-4), HexDirection::NegativeY);
    }

    #[test]
    fn offset_scales_the_unit_step() {
        let start = HexCoord::new(1, 0, 0);
        let end = start.offset(HexDirection::NegativeY, 3);
        assert_eq!(end, HexCoord::new(1, -3, 0));
        assert_eq!(start.distance(&end), 3);
    }
}
