//! Flat-top hex geometry expressed in axial coordinates.
//!
//! World space uses `x` to the right and `y` upwards. The hex `size` passed to
//! the conversions is the circumradius of a single cell and must be strictly
//! positive; anything else is a configuration bug and panics.

use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Identity of a single hex cell in axial `(q, r)` coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxialCoord {
    q: i32,
    r: i32,
}

impl AxialCoord {
    /// Creates a new axial coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Column-like axis of the coordinate.
    #[must_use]
    pub const fn q(&self) -> i32 {
        self.q
    }

    /// Row-like axis of the coordinate.
    #[must_use]
    pub const fn r(&self) -> i32 {
        self.r
    }

    /// Derives the equivalent cube coordinate.
    #[must_use]
    pub const fn cube(self) -> CubeCoord {
        CubeCoord {
            x: self.q,
            y: -self.q - self.r,
            z: self.r,
        }
    }

    /// Number of single-hex steps separating two cells.
    #[must_use]
    pub fn distance(self, other: AxialCoord) -> u32 {
        cube_distance(self, other)
    }

    /// Direction of travel towards an adjacent cell, if `other` is adjacent.
    #[must_use]
    pub fn direction_to(self, other: AxialCoord) -> Option<HexDirection> {
        let dq = other.q.checked_sub(self.q)?;
        let dr = other.r.checked_sub(self.r)?;
        HexDirection::from_delta(dq, dr)
    }

    /// Neighbouring cell one step away in the provided direction.
    #[must_use]
    pub const fn neighbor(self, direction: HexDirection) -> Self {
        let (dq, dr) = direction.delta();
        Self::new(self.q + dq, self.r + dr)
    }

    /// Centre of the cell in world space.
    #[must_use]
    pub fn to_world(self, size: f32) -> WorldPoint {
        axial_to_world(self, size)
    }

    /// Cell whose area contains the provided world position.
    #[must_use]
    pub fn from_world(point: WorldPoint, size: f32) -> Self {
        axial_round(world_to_axial(point, size))
    }
}

/// Cube representation of a hex cell where `x + y + z == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl CubeCoord {
    /// Cube `x` component, equal to axial `q`.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Cube `y` component, always `-x - z`.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cube `z` component, equal to axial `r`.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }
}

/// Continuous position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axial coordinate that has not yet been snapped to a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalAxial {
    /// Fractional `q` component.
    pub q: f32,
    /// Fractional `r` component.
    pub r: f32,
}

/// The six directions an agent can face on a flat-top grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    /// Axial delta `(0, +1)`.
    Up,
    /// Axial delta `(+1, 0)`.
    UpRight,
    /// Axial delta `(+1, -1)`.
    DownRight,
    /// Axial delta `(0, -1)`.
    Down,
    /// Axial delta `(-1, 0)`.
    DownLeft,
    /// Axial delta `(-1, +1)`.
    UpLeft,
}

impl HexDirection {
    /// All directions ordered clockwise from [`HexDirection::Up`].
    pub const ALL: [HexDirection; 6] = [
        Self::Up,
        Self::UpRight,
        Self::DownRight,
        Self::Down,
        Self::DownLeft,
        Self::UpLeft,
    ];

    /// Axial `(dq, dr)` offset of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::UpRight => (1, 0),
            Self::DownRight => (1, -1),
            Self::Down => (0, -1),
            Self::DownLeft => (-1, 0),
            Self::UpLeft => (-1, 1),
        }
    }

    /// Resolves an axial offset into a direction when it spans one step.
    #[must_use]
    pub fn from_delta(dq: i32, dr: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.delta() == (dq, dr))
    }


    /// Heading of a step in this direction, in degrees counter-clockwise from `+x`.
    #[must_use]
    pub const fn heading_degrees(self) -> f32 {
        match self {
            Self::Up => 90.0,
            Self::UpRight => 30.0,
            Self::DownRight => -30.0,
            Self::Down => -90.0,
            Self::DownLeft => -150.0,
            Self::UpLeft => 150.0,
        }
    }
}

/// Converts an axial cell into the world-space position of its centre.
///
/// # Panics
///
/// Panics when `size` is not strictly positive.
#[must_use]
pub fn axial_to_world(coord: AxialCoord, size: f32) -> WorldPoint {
    assert_positive_size(size);
    let q = coord.q() as f32;
    let r = coord.r() as f32;
    WorldPoint {
        x: size * (1.5 * q),
        y: size * (SQRT_3 / 2.0 * q + SQRT_3 * r),
    }
}

/// Converts a world-space position into fractional axial coordinates.
///
/// # Panics
///
/// Panics when `size` is not strictly positive.
#[must_use]
pub fn world_to_axial(point: WorldPoint, size: f32) -> FractionalAxial {
    assert_positive_size(size);
    FractionalAxial {
        q: (2.0 / 3.0 * point.x) / size,
        r: (-1.0 / 3.0 * point.x + SQRT_3 / 3.0 * point.y) / size,
    }
}

/// Snaps a fractional axial coordinate to the cell containing it.
///
/// Each cube component is rounded independently and the one that moved the
/// most is recomputed from the other two, so the result always satisfies
/// `x + y + z == 0`. Exact ties fall through to correcting `y`, then `z`.
#[must_use]
pub fn axial_round(fractional: FractionalAxial) -> AxialCoord {
    let x = fractional.q;
    let z = fractional.r;
    let y = -x - z;

    let mut rx = x.round();
    let ry = y.round();
    let mut rz = z.round();

    let x_diff = (rx - x).abs();
    let y_diff = (ry - y).abs();
    let z_diff = (rz - z).abs();

    if x_diff > y_diff && x_diff > z_diff {
        rx = -ry - rz;
    } else if y_diff > z_diff {
        // y is implied by q and r, which are already rounded.
    } else {
        rz = -rx - ry;
    }

    AxialCoord::new(rx as i32, rz as i32)
}

/// Hex distance between two cells.
#[must_use]
pub fn cube_distance(a: AxialCoord, b: AxialCoord) -> u32 {
    let a = a.cube();
    let b = b.cube();
    let dx = a.x().abs_diff(b.x());
    let dy = a.y().abs_diff(b.y());
    let dz = a.z().abs_diff(b.z());
    (dx + dy + dz) / 2
}

fn assert_positive_size(size: f32) {
    assert!(size > 0.0, "hex size must be strictly positive, got {size}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn origin_maps_to_world_origin() {
        assert_eq!(axial_to_world(AxialCoord::new(0, 0), 2.0), WorldPoint::new(0.0, 0.0));
    }

    #[test]
    fn neighbors_lie_one_step_away() {
        let origin = AxialCoord::new(3, -2);
        for direction in HexDirection::ALL {
            let neighbor = origin.neighbor(direction);
            assert_eq!(origin.distance(neighbor), 1);
            assert_eq!(origin.direction_to(neighbor), Some(direction));
        }
    }

    #[test]
    fn direction_requires_adjacency() {
        let origin = AxialCoord::new(0, 0);
        assert_eq!(origin.direction_to(AxialCoord::new(2, 0)), None);
        assert_eq!(origin.direction_to(AxialCoord::new(1, 1)), None);
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn distance_counts_hex_steps() {
        assert_eq!(cube_distance(AxialCoord::new(0, 0), AxialCoord::new(2, 0)), 2);
        assert_eq!(cube_distance(AxialCoord::new(0, 0), AxialCoord::new(2, -1)), 2);
        assert_eq!(cube_distance(AxialCoord::new(-1, 3), AxialCoord::new(2, -1)), 4);
    }

    #[test]
    fn rounding_snaps_points_near_a_centre() {
        let centre = axial_to_world(AxialCoord::new(2, -1), 1.0);
        let nudged = WorldPoint::new(centre.x + 0.3, centre.y - 0.2);
        assert_eq!(AxialCoord::from_world(nudged, 1.0), AxialCoord::new(2, -1));
    }

    #[test]
    fn headings_agree_with_world_geometry() {
        let origin = AxialCoord::new(0, 0);
        for direction in HexDirection::ALL {
            let target = axial_to_world(origin.neighbor(direction), 1.0);
            let heading = target.y.atan2(target.x).to_degrees();
            assert!(
                (heading - direction.heading_degrees()).abs() < 1e-3,
                "{direction:?}: {heading} vs {}",
                direction.heading_degrees()
            );
        }
    }

    #[test]
    #[should_panic(expected = "hex size must be strictly positive")]
    fn zero_size_is_rejected() {
        let _ = axial_to_world(AxialCoord::new(1, 1), 0.0);
    }

    #[test]
    #[should_panic(expected = "hex size must be strictly positive")]
    fn negative_size_is_rejected_when_converting_back() {
        let _ = world_to_axial(WorldPoint::new(1.0, 1.0), -1.0);
    }

    proptest! {
        #[test]
        fn world_round_trip_recovers_cell(
            q in -500i32..500,
            r in -500i32..500,
            size in 0.25f32..64.0,
        ) {
            let coord = AxialCoord::new(q, r);
            let world = axial_to_world(coord, size);
            prop_assert_eq!(axial_round(world_to_axial(world, size)), coord);
        }

        #[test]
        fn distance_is_symmetric_and_zero_on_self(
            aq in -1000i32..1000, ar in -1000i32..1000,
            bq in -1000i32..1000, br in -1000i32..1000,
        ) {
            let a = AxialCoord::new(aq, ar);
            let b = AxialCoord::new(bq, br);
            prop_assert_eq!(cube_distance(a, b), cube_distance(b, a));
            prop_assert_eq!(cube_distance(a, a), 0);
        }

        #[test]
        fn rounded_cells_form_valid_cubes(qf in -200.0f32..200.0, rf in -200.0f32..200.0) {
            let cube = axial_round(FractionalAxial { q: qf, r: rf }).cube();
            prop_assert_eq!(cube.x() + cube.y() + cube.z(), 0);
        }

        #[test]
        fn rounding_picks_the_nearest_centre(x in -50.0f32..50.0, y in -50.0f32..50.0) {
            let point = WorldPoint::new(x, y);
            let chosen = AxialCoord::from_world(point, 1.0);
            let chosen_distance = point.distance(chosen.to_world(1.0));
            for direction in HexDirection::ALL {
                let neighbor = chosen.neighbor(direction).to_world(1.0);
                prop_assert!(chosen_distance <= point.distance(neighbor) + 1e-3);
            }
        }
    }
}
