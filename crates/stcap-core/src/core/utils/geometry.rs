use nalgebra::{Point3, Vector3};

const DEGENERATE_LENGTH: f64 = 1e-8;

fn unit(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    (norm > DEGENERATE_LENGTH).then(|| v / norm)
}

pub fn distance(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p2).norm()
}

/// Angle in degrees at the vertex `p2`; `None` when either arm has zero length.
pub fn angle_degrees(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> Option<f64> {
    let v1 = unit(p1 - p2)?;
    let v2 = unit(p3 - p2)?;
    Some(v1.dot(&v2).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Signed torsion in degrees, in (-180, 180]; `None` for collinear inputs.
pub fn dihedral_degrees(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> Option<f64> {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let b3 = p4 - p3;

    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    if n1.norm() < DEGENERATE_LENGTH || n2.norm() < DEGENERATE_LENGTH {
        return None;
    }
    let m1 = n1.cross(&unit(b2)?);

    let x = n1.dot(&n2);
    let y = m1.dot(&n2);
    Some((-y).atan2(x).to_degrees())
}

/// Places the amide hydrogen on the external bisector of the C(i-1)-N-CA angle.
pub fn calculate_hn_position(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    prev_c_pos: &Point3<f64>,
    bond_length: f64,
) -> Option<Point3<f64>> {
    let n_ca = unit(ca_pos - n_pos)?;
    let n_c_prev = unit(prev_c_pos - n_pos)?;

    let hn_dir = unit(-(n_ca + n_c_prev))?;

    Some(n_pos + hn_dir * bond_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert!(approx_eq(distance(&a, &b), 5.0));
    }

    #[test]
    fn angle_degrees_returns_right_and_straight_angles() {
        let origin = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let neg_x = Point3::new(-1.0, 0.0, 0.0);
        assert!(approx_eq(angle_degrees(&x, &origin, &y).unwrap(), 90.0));
        assert!(approx_eq(angle_degrees(&x, &origin, &neg_x).unwrap(), 180.0));
    }

    #[test]
    fn angle_degrees_is_none_for_coincident_points() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(angle_degrees(&p, &p, &Point3::origin()).is_none());
    }

    #[test]
    fn dihedral_degrees_gives_trans_and_cis() {
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 0.0, 0.0);
        let p3 = Point3::new(0.0, 1.0, 0.0);
        let trans = Point3::new(-1.0, 1.0, 0.0);
        let cis = Point3::new(1.0, 1.0, 0.0);
        assert!(approx_eq(dihedral_degrees(&p1, &p2, &p3, &trans).unwrap().abs(), 180.0));
        assert!(approx_eq(dihedral_degrees(&p1, &p2, &p3, &cis).unwrap(), 0.0));
    }

    #[test]
    fn dihedral_degrees_sign_follows_handedness() {
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 0.0, 0.0);
        let p3 = Point3::new(0.0, 1.0, 0.0);
        let up = Point3::new(0.0, 1.0, 1.0);
        let down = Point3::new(0.0, 1.0, -1.0);
        let a = dihedral_degrees(&p1, &p2, &p3, &up).unwrap();
        let b = dihedral_degrees(&p1, &p2, &p3, &down).unwrap();
        assert!(approx_eq(a.abs(), 90.0));
        assert!(approx_eq(a, -b));
    }

    #[test]
    fn dihedral_degrees_is_none_for_collinear_points() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 0.0, 0.0);
        let p3 = Point3::new(2.0, 0.0, 0.0);
        let p4 = Point3::new(3.0, 1.0, 0.0);
        assert!(dihedral_degrees(&p1, &p2, &p3, &p4).is_none());
    }

    #[test]
    fn calculate_hn_position_bisects_external_angle() {
        let n = Point3::new(0.0, 0.0, 0.0);
        let ca = Point3::new(1.0, 1.0, 0.0);
        let c_prev = Point3::new(-1.0, 1.0, 0.0);
        let h = calculate_hn_position(&n, &ca, &c_prev, 1.01).unwrap();
        assert!(approx_eq(h.x, 0.0));
        assert!(approx_eq(h.y, -1.01));
        assert!(approx_eq(distance(&n, &h), 1.01));
    }

    #[test]
    fn calculate_hn_position_is_none_for_antiparallel_neighbours() {
        let n = Point3::new(0.0, 0.0, 0.0);
        let ca = Point3::new(1.0, 0.0, 0.0);
        let c_prev = Point3::new(-1.0, 0.0, 0.0);
        assert!(calculate_hn_position(&n, &ca, &c_prev, 1.01).is_none());
    }
}
