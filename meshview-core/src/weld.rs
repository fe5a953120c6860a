/// Spatial welding of near-duplicate vertex positions
use std::collections::HashMap;

use nalgebra::Point3;

/// Default weld distance per axis, in model units.
pub const DEFAULT_WELD_TOLERANCE: f32 = 1e-4;

type CellKey = (i64, i64, i64);

/// Raw vertex index to welded vertex index mapping.
///
/// Built in one left-to-right pass: a position joins the first canonical
/// vertex that is closer than the tolerance on every axis, otherwise it
/// becomes canonical itself. Candidates are looked up in the position's grid
/// cell and its 26 neighbours, so the first-seen position always wins and the
/// result does not depend on which side of a cell boundary a point falls.
#[derive(Debug, Clone)]
pub struct WeldMap {
    remap: Vec<u32>,
    positions: Vec<Point3<f32>>,
}

impl WeldMap {
    pub fn build(raw: &[Point3<f32>], tolerance: f32) -> Self {
        let tolerance = sanitize_tolerance(tolerance);
        let mut cells: HashMap<CellKey, Vec<u32>> = HashMap::new();
        let mut positions: Vec<Point3<f32>> = Vec::new();
        let mut remap = Vec::with_capacity(raw.len());

        for point in raw {
            let key = cell_key(point, tolerance);
            let existing = neighbours(key).find_map(|cell| {
                cells.get(&cell)?.iter().copied().find(|&candidate| {
                    within(&positions[candidate as usize], point, tolerance)
                })
            });

            let index = match existing {
                Some(index) => index,
                None => {
                    let index = positions.len() as u32;
                    positions.push(*point);
                    cells.entry(key).or_default().push(index);
                    index
                }
            };
            remap.push(index);
        }

        Self { remap, positions }
    }

    /// Welded index for a raw (0-based) vertex index.
    pub fn welded_index(&self, raw: u32) -> u32 {
        self.remap[raw as usize]
    }

    /// Canonical positions in welded order.
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Point3<f32>> {
        self.positions
    }

    /// Number of welded vertices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of raw vertices the map was built from.
    pub fn raw_len(&self) -> usize {
        self.remap.len()
    }
}

pub(crate) fn sanitize_tolerance(tolerance: f32) -> f32 {
    if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_WELD_TOLERANCE
    }
}

fn cell_key(point: &Point3<f32>, tolerance: f32) -> CellKey {
    let quantize = |v: f32| (f64::from(v) / f64::from(tolerance)).floor() as i64;
    (quantize(point.x), quantize(point.y), quantize(point.z))
}

/// The cell and its 26 neighbours. Keys of huge coordinates saturate at the
/// `i64` range, so offsets saturate too and may repeat the own cell.
fn neighbours((x, y, z): CellKey) -> impl Iterator<Item = CellKey> {
    // Own cell first so the common exact-duplicate case exits early.
    std::iter::once((x, y, z)).chain((-1..=1).flat_map(move |dx| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dz| {
                if dx == 0 && dy == 0 && dz == 0 {
                    None
                } else {
                    Some((x.saturating_add(dx), y.saturating_add(dy), z.saturating_add(dz)))
                }
            })
        })
    }))
}

fn within(a: &Point3<f32>, b: &Point3<f32>, tolerance: f32) -> bool {
    (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance && (a.z - b.z).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_duplicates_collapse() {
        let raw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let weld = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        assert_eq!(weld.len(), 2);
        assert_eq!(weld.raw_len(), 4);
        assert_eq!(
            (0..4).map(|i| weld.welded_index(i)).collect::<Vec<_>>(),
            vec![0, 1, 0, 1]
        );
    }

    #[test]
    fn test_near_positions_collapse_first_seen_wins() {
        let raw = [Point3::new(1.0, 2.0, 3.0), Point3::new(1.00005, 1.99996, 3.00002)];
        let weld = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        assert_eq!(weld.len(), 1);
        assert_eq!(weld.positions()[0], raw[0]);
    }

    #[test]
    fn test_collapse_across_cell_boundary() {
        // 0.99995e-4 and 1.00004e-4 quantize into different cells.
        let raw = [Point3::new(0.99995e-4, 0.0, 0.0), Point3::new(1.00004e-4, 0.0, 0.0)];
        let weld = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        assert_eq!(weld.len(), 1);
    }

    #[test]
    fn test_separated_positions_stay_distinct() {
        let raw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 2e-4),
            Point3::new(0.0, -2e-4, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let weld = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        assert_eq!(weld.len(), raw.len());
        for (i, p) in raw.iter().enumerate() {
            assert_eq!(weld.welded_index(i as u32), i as u32);
            assert_eq!(&weld.positions()[i], p);
        }
    }

    #[test]
    fn test_welding_is_idempotent() {
        let raw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.00001, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, 1.00002, 1.0),
            Point3::new(-3.0, 0.5, 2.0),
        ];
        let once = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        let twice = WeldMap::build(once.positions(), DEFAULT_WELD_TOLERANCE);
        assert_eq!(once.len(), 3);
        assert_eq!(twice.positions(), once.positions());
        for i in 0..twice.raw_len() as u32 {
            assert_eq!(twice.welded_index(i), i);
        }
    }

    #[test]
    fn test_invalid_tolerance_uses_default() {
        assert_eq!(sanitize_tolerance(0.0), DEFAULT_WELD_TOLERANCE);
        assert_eq!(sanitize_tolerance(-1.0), DEFAULT_WELD_TOLERANCE);
        assert_eq!(sanitize_tolerance(f32::NAN), DEFAULT_WELD_TOLERANCE);
        assert_eq!(sanitize_tolerance(0.5), 0.5);
    }

    #[test]
    fn test_empty_input() {
        let weld = WeldMap::build(&[], DEFAULT_WELD_TOLERANCE);
        assert!(weld.is_empty());
        assert_eq!(weld.raw_len(), 0);
    }

    #[test]
    fn test_huge_coordinates_do_not_overflow_cell_keys() {
        let raw = [
            Point3::new(1e15, 0.0, 0.0),
            Point3::new(-1e15, 0.0, 0.0),
            Point3::new(3e38, -3e38, 0.0),
            Point3::new(-3e38, 3e38, f32::MAX),
            Point3::new(1e15, 0.0, 0.0),
            Point3::new(-3e38, 3e38, f32::MAX),
        ];
        let weld = WeldMap::build(&raw, DEFAULT_WELD_TOLERANCE);
        assert_eq!(weld.len(), 4);
        assert_eq!(weld.welded_index(4), 0);
        assert_eq!(weld.welded_index(5), 3);

        let key = cell_key(&Point3::new(3e38, -3e38, 0.0), DEFAULT_WELD_TOLERANCE);
        assert_eq!(key, (i64::MAX, i64::MIN, 0));
        assert_eq!(neighbours(key).count(), 27);
    }
}
