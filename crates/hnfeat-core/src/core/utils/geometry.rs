use nalgebra::{Matrix3, Point3, Vector3};

/// Below this norm an axis candidate is treated as degenerate.
const AXIS_EPSILON: f64 = 1e-10;

/// An orthonormal right-handed frame anchored at an amide hydrogen.
///
/// Rows of `axes` are the frame axes X, Y and Z, so `axes * v` expresses a
/// global displacement `v` in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub origin: Point3<f64>,
    pub axes: Matrix3<f64>,
}

/// Which step of frame construction collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDegeneracy {
    /// The H and N positions coincide.
    CoincidentAxis,
    /// The H->C direction is parallel to the H->N direction.
    CollinearPlane,
}

impl LocalFrame {
    /// Builds the frame from the amide hydrogen `h`, its nitrogen `n` and the
    /// reference carbon `c`.
    ///
    /// X points from H to N, Y is the component of H->C orthogonal to X, and Z
    /// completes the right-handed basis.
    pub fn from_points(
        h: &Point3<f64>,
        n: &Point3<f64>,
        c: &Point3<f64>,
    ) -> Result<Self, FrameDegeneracy> {
        let x_raw = n - h;
        let x_norm = x_raw.norm();
        if x_norm < AXIS_EPSILON {
            return Err(FrameDegeneracy::CoincidentAxis);
        }
        let x = x_raw / x_norm;

        let hc = c - h;
        let y_raw = hc - x * hc.dot(&x);
        let y_norm = y_raw.norm();
        if y_norm < AXIS_EPSILON {
            return Err(FrameDegeneracy::CollinearPlane);
        }
        let y = y_raw / y_norm;
        let z = x.cross(&y);

        Ok(Self {
            origin: *h,
            axes: Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]),
        })
    }

    pub fn axis(&self, i: usize) -> Vector3<f64> {
        self.axes.row(i).transpose()
    }

    /// Expresses a global displacement in frame coordinates.
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.axes * v
    }

    /// Expresses a global point relative to the frame origin, in frame coordinates.
    pub fn to_local(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.rotate(&(p - self.origin))
    }
}
