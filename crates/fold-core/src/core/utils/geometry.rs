use nalgebra::{Point3, Rotation3, Unit, Vector3};

pub const HN_BOND_LENGTH: f64 = 1.01;
pub const CO_BOND_LENGTH: f64 = 1.23;

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Rotates `point` about the line through `origin` with direction `axis`.
///
/// Returns `None` when the axis has zero length.
pub fn rotate_about_axis(
    point: &Point3<f64>,
    origin: &Point3<f64>,
    axis: &Vector3<f64>,
    angle_degrees: f64,
) -> Option<Point3<f64>> {
    if axis.norm_squared() < 1e-12 {
        return None;
    }
    let rotation = rotation_from_axis_angle(axis, angle_degrees);
    Some(origin + rotation * (point - origin))
}

/// Signed dihedral angle in degrees for the four points `p0-p1-p2-p3`, in (-180, 180].
///
/// Follows the IUPAC convention: rotating `p3` right-handed about `p1 -> p2`
/// increases the angle.
pub fn dihedral_angle(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> Option<f64> {
    let b0 = p0 - p1;
    let b1 = p2 - p1;
    let b2 = p3 - p2;

    let b1_norm = b1.norm();
    if b1_norm < 1e-12 {
        return None;
    }
    let b1n = b1 / b1_norm;

    let v = b0 - b1n * b0.dot(&b1n);
    let w = b2 - b1n * b2.dot(&b1n);
    if v.norm_squared() < 1e-12 || w.norm_squared() < 1e-12 {
        return None;
    }

    let x = v.dot(&w);
    let y = b1n.cross(&v).dot(&w);
    Some(y.atan2(x).to_degrees())
}

/// Angle in degrees at `vertex` between the rays towards `a` and `b`.
///
/// Degenerate rays give `0.0`.
pub fn bond_angle(a: &Point3<f64>, vertex: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let va = a - vertex;
    let vb = b - vertex;
    let norms = va.norm() * vb.norm();
    if norms == 0.0 {
        return 0.0;
    }
    (va.dot(&vb) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn calculate_hn_position(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    prev_c_pos: &Point3<f64>,
    bond_length: f64,
) -> Option<Point3<f64>> {
    let n_ca = (ca_pos - n_pos).try_normalize(1e-12)?;
    let n_c_prev = (prev_c_pos - n_pos).try_normalize(1e-12)?;

    let hn_dir = -(n_ca + n_c_prev).try_normalize(1e-12)?;

    Some(n_pos + hn_dir * bond_length)
}

/// Places the carbonyl oxygen on the bisector opposite CA and the next residue's N.
pub fn calculate_carbonyl_o_position(
    ca_pos: &Point3<f64>,
    c_pos: &Point3<f64>,
    next_n_pos: &Point3<f64>,
    bond_length: f64,
) -> Option<Point3<f64>> {
    let c_ca = (ca_pos - c_pos).try_normalize(1e-12)?;
    let c_n_next = (next_n_pos - c_pos).try_normalize(1e-12)?;

    let o_dir = -(c_ca + c_n_next).try_normalize(1e-12)?;

    Some(c_pos + o_dir * bond_length)
}

pub fn centroid<'a, I>(points: I) -> Option<Point3<f64>>
where
    I: IntoIterator<Item = &'a Point3<f64>>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    (count > 0).then(|| Point3::from(sum / count as f64))
}
