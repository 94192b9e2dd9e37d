//! Map Layout
//! County and background shapes projected into frame pixels, with pointer
//! hit testing.

use super::projection::{AlbersConic, ProjectionConfig};
use crate::data::Region;
use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};

/// One projected shape.
#[derive(Debug, Clone)]
pub struct ScreenShape {
    pub shape: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl ScreenShape {
    fn new(shape: MultiPolygon<f64>) -> Self {
        let bounds = shape.bounding_rect();
        Self { shape, bounds }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        let (min, max) = (bounds.min(), bounds.max());
        if x < min.x || x > max.x || y < min.y || y > max.y {
            return false;
        }
        self.shape.contains(&Point::new(x, y))
    }

    /// Rings as pixel paths: exteriors and interiors alike.
    pub fn rings(&self) -> impl Iterator<Item = Vec<[f64; 2]>> + '_ {
        self.shape.iter().flat_map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        })
    }

    /// Exterior rings only (the fillable outline of each part).
    pub fn exteriors(&self) -> impl Iterator<Item = Vec<[f64; 2]>> + '_ {
        self.shape
            .iter()
            .map(|polygon| polygon.exterior().coords().map(|c| [c.x, c.y]).collect())
    }
}

/// Both boundary layers projected for a frame of fixed size.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub width: u32,
    pub height: u32,
    pub background: Vec<ScreenShape>,
    /// Same order as the county regions.
    pub counties: Vec<ScreenShape>,
}

impl MapLayout {
    pub fn new(
        counties: &[Region],
        background: &[Region],
        projection: &ProjectionConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let albers = AlbersConic::new(projection, f64::from(width), f64::from(height));
        let project = |regions: &[Region]| {
            regions
                .iter()
                .map(|r| ScreenShape::new(albers.project_multi_polygon(&r.geometry)))
                .collect()
        };
        Self {
            width,
            height,
            background: project(background),
            counties: project(counties),
        }
    }

    /// Index of the county under a frame pixel position.
    pub fn county_at(&self, x: f64, y: f64) -> Option<usize> {
        self.counties.iter().position(|shape| shape.contains(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(lon: f64, lat: f64, size: f64) -> Region {
        let ring = LineString::from(vec![
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
            (lon, lat),
        ]);
        Region::new(
            "1",
            None,
            MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        )
    }

    #[test]
    fn hit_test_finds_county_under_pointer() {
        let counties = vec![square(-108.0, 33.0, 1.0), square(-105.0, 35.0, 1.0)];
        let projection = ProjectionConfig::default();
        let layout = MapLayout::new(&counties, &[], &projection, 700, 460);
        let albers = AlbersConic::new(&projection, 700.0, 460.0);

        let [x, y] = albers.project(-107.5, 33.5);
        assert_eq!(layout.county_at(x, y), Some(0));
        let [x, y] = albers.project(-104.5, 35.5);
        assert_eq!(layout.county_at(x, y), Some(1));
        let [x, y] = albers.project(-106.5, 34.5);
        assert_eq!(layout.county_at(x, y), None);
    }

    #[test]
    fn empty_geometry_never_hits() {
        let counties = vec![Region::new("1", None, MultiPolygon::new(vec![]))];
        let layout = MapLayout::new(&counties, &[], &ProjectionConfig::default(), 700, 460);
        assert_eq!(layout.county_at(350.0, 230.0), None);
        assert_eq!(layout.counties[0].rings().count(), 0);
    }
}
