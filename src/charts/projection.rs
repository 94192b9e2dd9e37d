//! Map Projection
//! Albers conic equal-area projection with d3-style rotate/center/scale/translate.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// Projection parameters in degrees, as they would be passed to d3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub center: [f64; 2],
    pub rotate: [f64; 3],
    pub parallels: [f64; 2],
    pub scale: f64,
}

impl Default for ProjectionConfig {
    /// Framing of New Mexico.
    fn default() -> Self {
        Self {
            center: [2.0, 34.25],
            rotate: [108.27, 0.0, 0.0],
            parallels: [45.0, 60.0],
            scale: 4400.0,
        }
    }
}

/// Conic equal-area projection translated to the middle of a frame.
/// Screen y grows downwards.
#[derive(Debug, Clone, Copy)]
pub struct AlbersConic {
    rotate: [f64; 3],
    n: f64,
    c: f64,
    r0: f64,
    cylindrical_cos: Option<f64>,
    scale: f64,
    center: [f64; 2],
    translate: [f64; 2],
}

impl AlbersConic {
    pub fn new(config: &ProjectionConfig, width: f64, height: f64) -> Self {
        let [phi0, phi1] = config.parallels.map(f64::to_radians);
        let sy0 = phi0.sin();
        let n = (sy0 + phi1.sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);

        let mut projection = Self {
            rotate: config.rotate.map(f64::to_radians),
            n,
            c,
            r0: c.sqrt() / n,
            // Parallels symmetric about the equator degenerate to a cylinder.
            cylindrical_cos: (n.abs() < 1e-6).then(|| phi0.cos()),
            scale: config.scale,
            center: [0.0, 0.0],
            translate: [width / 2.0, height / 2.0],
        };
        projection.center = projection.raw(
            config.center[0].to_radians(),
            config.center[1].to_radians(),
        );
        projection
    }

    /// Project a longitude/latitude in degrees to screen pixels.
    pub fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let (lambda, phi) = self.rotate(lon.to_radians(), lat.to_radians());
        let [x, y] = self.raw(lambda, phi);
        [
            self.translate[0] + self.scale * (x - self.center[0]),
            self.translate[1] - self.scale * (y - self.center[1]),
        ]
    }

    pub fn project_multi_polygon(&self, shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(
            shape
                .iter()
                .map(|polygon| {
                    Polygon::new(
                        self.project_ring(polygon.exterior()),
                        polygon
                            .interiors()
                            .iter()
                            .map(|ring| self.project_ring(ring))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    fn project_ring(&self, ring: &LineString<f64>) -> LineString<f64> {
        ring.coords()
            .map(|c| {
                let [x, y] = self.project(c.x, c.y);
                Coord { x, y }
            })
            .collect()
    }

    fn rotate(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let [d_lambda, d_phi, d_gamma] = self.rotate;

        let mut lambda = lambda + d_lambda;
        if lambda > std::f64::consts::PI {
            lambda -= std::f64::consts::TAU;
        } else if lambda < -std::f64::consts::PI {
            lambda += std::f64::consts::TAU;
        }
        if d_phi == 0.0 && d_gamma == 0.0 {
            return (lambda, phi);
        }

        let (sin_dp, cos_dp) = d_phi.sin_cos();
        let (sin_dg, cos_dg) = d_gamma.sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_dp + x * sin_dp;
        (
            (y * cos_dg - k * sin_dg).atan2(x * cos_dp - z * sin_dp),
            (k * cos_dg + y * sin_dg).clamp(-1.0, 1.0).asin(),
        )
    }

    fn raw(&self, lambda: f64, phi: f64) -> [f64; 2] {
        if let Some(cos_phi0) = self.cylindrical_cos {
            return [lambda * cos_phi0, phi.sin() / cos_phi0];
        }
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let angle = lambda * self.n;
        [r * angle.sin(), self.r0 - r * angle.cos()]
    }
}
