use std::ops::RangeInclusive;

use crate::sim::room::{NUM_WALLS, ReflectionOrder, RoomGeometry};
use crate::{Point, Vector};

/// A mirrored copy of the sound source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSource {
    /// Mirrored source position (usually outside the room).
    pub position: Point,
    /// Vector from the receiver to the image, i.e. the direction sound arrives from.
    pub arrival: Vector,
    /// Distance between the image and the receiver (meters).
    pub distance: f64,
    /// Number of reflections on each wall face, in `WallReflection` order.
    pub reflections: [u32; NUM_WALLS],
}

impl ImageSource {
    /// Total number of wall reflections (0 for the direct path).
    pub fn order(&self) -> u32 {
        self.reflections.iter().sum()
    }
}

/// The lattice of image sources of a rectangular room.
///
/// Each image is addressed by a cell index `(p, q, r)` and a parity bit per
/// axis. Along x the image sits at `2·p·Lx ± sx` (minus when the parity bit
/// is set), and hits the wall at `x = 0` `|p - bit|` times and the wall at
/// `x = Lx` `|p|` times.
#[derive(Debug, Clone)]
pub struct ImageLattice {
    room: RoomGeometry,
    source: Point,
    receiver: Point,
    order: ReflectionOrder,
    max_distance: f64,
    cells: [i64; 3],
}

impl ImageLattice {
    /// Creates the lattice for one source/receiver pair.
    ///
    /// `max_distance` bounds the cell range on each axis to
    /// `ceil(max_distance / (2·L))`. With a bounded order the range is
    /// further limited to the cells that can hold images of that order.
    pub fn new(
        room: RoomGeometry,
        source: Point,
        receiver: Point,
        order: ReflectionOrder,
        max_distance: f64,
    ) -> Self {
        let cells = room.dims().map(|len| {
            let by_distance = (max_distance / (2.0 * len)).ceil() as i64;
            match order {
                // |2p - bit| <= k  =>  |p| <= (k + 1) / 2
                ReflectionOrder::Bounded(k) => by_distance.min((i64::from(k) + 1) / 2),
                ReflectionOrder::Unbounded => by_distance,
            }
        });
        Self {
            room,
            source,
            receiver,
            order,
            max_distance,
            cells,
        }
    }

    /// Cell indices visited along the x axis.
    pub fn x_cells(&self) -> RangeInclusive<i64> {
        -self.cells[0]..=self.cells[0]
    }

    /// Number of candidate images visited (before order/distance filtering).
    ///
    /// Saturates at `usize::MAX` for huge lattices.
    pub fn num_candidates(&self) -> usize {
        self.cells
            .iter()
            .map(|&n| {
                let side = n.saturating_mul(2).saturating_add(1);
                usize::try_from(side).unwrap_or(usize::MAX)
            })
            .fold(8_usize, usize::saturating_mul)
    }

    /// Iterates over all kept image sources.
    pub fn iter(&self) -> impl Iterator<Item = ImageSource> + '_ {
        self.x_cells().flat_map(move |p| self.iter_x_cell(p))
    }

    /// Iterates over the kept image sources of one x cell.
    ///
    /// Used to split the enumeration between workers.
    pub fn iter_x_cell(&self, p: i64) -> impl Iterator<Item = ImageSource> + '_ {
        let ny = self.cells[1];
        let nz = self.cells[2];
        (-ny..=ny)
            .flat_map(move |q| (-nz..=nz).map(move |r| [p, q, r]))
            .flat_map(|cell| (0..8u8).map(move |parity| (cell, parity)))
            .filter_map(move |(cell, parity)| self.image(cell, parity))
    }

    fn image(&self, cell: [i64; 3], parity: u8) -> Option<ImageSource> {
        let dims = self.room.dims();
        let src = self.source.coords();
        let mut coords = [0.0; 3];
        let mut reflections = [0u32; NUM_WALLS];

        for axis in 0..3 {
            let bit = i64::from((parity >> axis) & 1);
            let p = cell[axis];
            let mirrored = if bit == 1 { -src[axis] } else { src[axis] };
            coords[axis] = 2.0 * p as f64 * dims[axis] + mirrored;
            reflections[2 * axis] = (p - bit).unsigned_abs() as u32;
            reflections[2 * axis + 1] = p.unsigned_abs() as u32;
        }

        let order: u32 = reflections.iter().sum();
        if !self.order.admits(order) {
            return None;
        }

        let position = Point::from(coords);
        let arrival = Vector::from_points(self.receiver, position);
        let distance = arrival.length();
        if self.order == ReflectionOrder::Unbounded && distance > self.max_distance {
            return None;
        }

        Some(ImageSource {
            position,
            arrival,
            distance,
            reflections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(order: ReflectionOrder, max_distance: f64) -> ImageLattice {
        ImageLattice::new(
            RoomGeometry::new(4.0, 4.0, 3.0),
            Point::new(2.0, 2.0, 1.5),
            Point::new(2.0, 3.0, 1.5),
            order,
            max_distance,
        )
    }

    #[test]
    fn test_order_zero_is_direct_path() {
        let lat = lattice(ReflectionOrder::Bounded(0), 100.0);
        let images: Vec<ImageSource> = lat.iter().collect();
        assert_eq!(images.len(), 1);
        let direct = images[0];
        assert!(direct.position.is_close(&Point::new(2.0, 2.0, 1.5)));
        assert_eq!(direct.reflections, [0; NUM_WALLS]);
        assert_eq!(direct.order(), 0);
        assert!((direct.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_order_mirrors() {
        let lat = lattice(ReflectionOrder::Bounded(1), 100.0);
        let images: Vec<ImageSource> = lat.iter().collect();
        assert_eq!(images.len(), 7);

        let find = |face: usize| {
            images
                .iter()
                .find(|img| img.order() == 1 && img.reflections[face] == 1)
                .copied()
                .unwrap()
        };
        // Wall at x = 0 and x = Lx
        assert!(find(0).position.is_close(&Point::new(-2.0, 2.0, 1.5)));
        assert!(find(1).position.is_close(&Point::new(6.0, 2.0, 1.5)));
        // Wall at y = 0 and y = Ly
        assert!(find(2).position.is_close(&Point::new(2.0, -2.0, 1.5)));
        assert!(find(3).position.is_close(&Point::new(2.0, 6.0, 1.5)));
        // Floor and ceiling
        assert!(find(4).position.is_close(&Point::new(2.0, 2.0, -1.5)));
        assert!(find(5).position.is_close(&Point::new(2.0, 2.0, 4.5)));

        // Receiver at y = 3: the mirror behind y = Ly is 3 m away
        assert!((find(3).distance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_image_count_by_order() {
        // A 3D lattice has 4n^2 + 2 images of order n >= 1.
        let lat = lattice(ReflectionOrder::Bounded(3), 1000.0);
        let mut per_order = [0usize; 4];
        for img in lat.iter() {
            per_order[img.order() as usize] += 1;
        }
        assert_eq!(per_order, [1, 6, 18, 38]);
    }

    #[test]
    fn test_per_face_counts_sum_to_order() {
        let lat = lattice(ReflectionOrder::Bounded(4), 1000.0);
        for img in lat.iter() {
            let x = img.reflections[0] + img.reflections[1];
            let y = img.reflections[2] + img.reflections[3];
            let z = img.reflections[4] + img.reflections[5];
            assert_eq!(x + y + z, img.order());
            // Reflections alternate between opposite walls
            assert!(img.reflections[0].abs_diff(img.reflections[1]) <= 1);
            assert!(img.reflections[2].abs_diff(img.reflections[3]) <= 1);
            assert!(img.reflections[4].abs_diff(img.reflections[5]) <= 1);
        }
    }

    #[test]
    fn test_unbounded_respects_max_distance() {
        let lat = lattice(ReflectionOrder::Unbounded, 1.5);
        let images: Vec<ImageSource> = lat.iter().collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].order(), 0);

        let lat = lattice(ReflectionOrder::Unbounded, 20.0);
        let mut n = 0;
        for img in lat.iter() {
            assert!(img.distance <= 20.0);
            n += 1;
        }
        // Roughly one image per room volume inside the sphere
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 20.0_f64.powi(3) / 48.0;
        assert!((n as f64) > 0.7 * expected && (n as f64) < 1.3 * expected, "n={n}");
    }

    #[test]
    fn test_bounded_ignores_distance() {
        // Even with a tiny distance budget the cell range keeps order-1 images
        // as long as at least one cell is visited on each axis.
        let lat = lattice(ReflectionOrder::Bounded(1), 1.0);
        assert_eq!(lat.iter().count(), 7);
    }

    #[test]
    fn test_x_cells_partition() {
        let lat = lattice(ReflectionOrder::Unbounded, 15.0);
        let total = lat.iter().count();
        let split: usize = lat.x_cells().map(|p| lat.iter_x_cell(p).count()).sum();
        assert_eq!(total, split);
        assert!(lat.num_candidates() >= total);
    }

    #[test]
    fn test_num_candidates() {
        assert_eq!(lattice(ReflectionOrder::Bounded(0), 100.0).num_candidates(), 8);
        // 3 x 3 x 3 cells, 8 parities each
        assert_eq!(lattice(ReflectionOrder::Bounded(1), 100.0).num_candidates(), 216);

        // Tiny room with a huge window saturates instead of overflowing
        let huge = ImageLattice::new(
            RoomGeometry::new(1e-3, 1e-3, 1e-3),
            Point::new(5e-4, 5e-4, 5e-4),
            Point::new(2e-4, 5e-4, 5e-4),
            ReflectionOrder::Unbounded,
            1e9,
        );
        assert_eq!(huge.num_candidates(), usize::MAX);
    }
}
