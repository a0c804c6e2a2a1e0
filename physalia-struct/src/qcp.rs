//! Minimal RMSD via the quaternion characteristic polynomial (QCP) method.
//!
//! Computes the least-squares superposition RMSD of two equal-length
//! coordinate sets without building the rotation matrix, following
//! Theobald (2005) and Liu, Agrafiotis & Theobald (2009). The largest
//! eigenvalue of the quaternion key matrix is found by Newton iteration on
//! its characteristic polynomial; the RMSD then falls out of the inner
//! products alone.
//!
//! This is the hot kernel of fragment assignment: a bag-of-fragments build
//! calls it once per (window, fragment) pair.

use alloc::vec;
use alloc::vec::Vec;

use crate::types::Point3D;

/// Convergence threshold for the eigenvalue Newton iteration.
const EVAL_PREC: f64 = 1e-11;

/// Iteration bound for the eigenvalue Newton iteration.
const MAX_NEWTON_ITER: usize = 50;

/// Reusable working memory for [`qcp_rmsd`].
///
/// Holds two transposed 3×K coordinate buffers. One scratch instance may be
/// reused across any number of calls, but never shared between threads;
/// give each worker its own.
#[derive(Debug, Clone)]
pub struct QcpScratch {
    a: [Vec<f64>; 3],
    b: [Vec<f64>; 3],
}

impl QcpScratch {
    /// Create scratch buffers sized for windows of `window_size` points.
    pub fn new(window_size: usize) -> Self {
        Self {
            a: [
                vec![0.0; window_size],
                vec![0.0; window_size],
                vec![0.0; window_size],
            ],
            b: [
                vec![0.0; window_size],
                vec![0.0; window_size],
                vec![0.0; window_size],
            ],
        }
    }

    fn fit(&mut self, n: usize) {
        if self.a[0].len() != n {
            for axis in self.a.iter_mut().chain(self.b.iter_mut()) {
                axis.resize(n, 0.0);
            }
        }
    }
}

/// Minimal superposition RMSD between two equal-length coordinate sets.
///
/// Both sets are centered into the scratch buffers, so callers pass raw
/// coordinates.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths or are empty; callers are
/// expected to slice equal-size windows.
pub fn qcp_rmsd(a: &[Point3D], b: &[Point3D], scratch: &mut QcpScratch) -> f64 {
    rmsd_impl(a, b, scratch, true)
}

/// Like [`qcp_rmsd`], but `b` must already be centered on its centroid.
///
/// Only `a` is centered into the scratch; the reference side is used as
/// stored. Fragment libraries center their fragments once at load and
/// compare every window against them through this entry point.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths or are empty.
pub fn qcp_rmsd_precentered(a: &[Point3D], b: &[Point3D], scratch: &mut QcpScratch) -> f64 {
    rmsd_impl(a, b, scratch, false)
}

fn rmsd_impl(a: &[Point3D], b: &[Point3D], scratch: &mut QcpScratch, center_b: bool) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "RMSD requires equal-length coordinate sets ({} vs {})",
        a.len(),
        b.len()
    );
    assert!(!a.is_empty(), "RMSD of empty coordinate sets");

    let n = a.len();
    scratch.fit(n);
    load_transposed(a, &mut scratch.a);
    load_transposed(b, &mut scratch.b);
    center_coords(&mut scratch.a);
    if center_b {
        center_coords(&mut scratch.b);
    }

    let (e0, m) = inner_product(&scratch.a, &scratch.b);
    let max_eigen = newton_largest_eigenvalue(e0, &m);

    (2.0 * (e0 - max_eigen) / n as f64).abs().sqrt()
}

fn load_transposed(points: &[Point3D], out: &mut [Vec<f64>; 3]) {
    for (i, p) in points.iter().enumerate() {
        out[0][i] = p.x;
        out[1][i] = p.y;
        out[2][i] = p.z;
    }
}

fn center_coords(coords: &mut [Vec<f64>; 3]) {
    let n = coords[0].len() as f64;
    for axis in coords.iter_mut() {
        let mean: f64 = axis.iter().sum::<f64>() / n;
        for v in axis.iter_mut() {
            *v -= mean;
        }
    }
}

/// Inner products of the centered coordinate sets: the combined
/// self-product `E0 = (G1 + G2) / 2` and the 3×3 correlation matrix
/// (row-major).
fn inner_product(a: &[Vec<f64>; 3], b: &[Vec<f64>; 3]) -> (f64, [f64; 9]) {
    let n = a[0].len();
    let mut g1 = 0.0;
    let mut g2 = 0.0;
    let mut m = [0.0f64; 9];

    for i in 0..n {
        let (x1, y1, z1) = (a[0][i], a[1][i], a[2][i]);
        let (x2, y2, z2) = (b[0][i], b[1][i], b[2][i]);

        g1 += x1 * x1 + y1 * y1 + z1 * z1;
        g2 += x2 * x2 + y2 * y2 + z2 * z2;

        m[0] += x1 * x2;
        m[1] += x1 * y2;
        m[2] += x1 * z2;

        m[3] += y1 * x2;
        m[4] += y1 * y2;
        m[5] += y1 * z2;

        m[6] += z1 * x2;
        m[7] += z1 * y2;
        m[8] += z1 * z2;
    }

    (0.5 * (g1 + g2), m)
}

/// Largest eigenvalue of the 4×4 quaternion key matrix, via Newton
/// iteration on the quartic characteristic polynomial
/// `λ⁴ + c2·λ² + c1·λ + c0`, seeded at `E0`.
fn newton_largest_eigenvalue(e0: f64, m: &[f64; 9]) -> f64 {
    let (sxx, sxy, sxz) = (m[0], m[1], m[2]);
    let (syx, syy, syz) = (m[3], m[4], m[5]);
    let (szx, szy, szz) = (m[6], m[7], m[8]);

    let sxx2 = sxx * sxx;
    let syy2 = syy * syy;
    let szz2 = szz * szz;

    let sxy2 = sxy * sxy;
    let syz2 = syz * syz;
    let sxz2 = sxz * sxz;

    let syx2 = syx * syx;
    let szy2 = szy * szy;
    let szx2 = szx * szx;

    let syz_szy_m_syy_szz2 = 2.0 * (syz * szy - syy * szz);
    let sxx2_syy2_szz2_syz2_szy2 = syy2 + szz2 - sxx2 + syz2 + szy2;

    let c2 = -2.0 * (sxx2 + syy2 + szz2 + sxy2 + syx2 + sxz2 + szx2 + syz2 + szy2);
    let c1 = 8.0
        * (sxx * syz * szy + syy * szx * sxz + szz * sxy * syx
            - sxx * syy * szz
            - syz * szx * sxy
            - szy * syx * sxz);

    let sxz_p_szx = sxz + szx;
    let syz_p_szy = syz + szy;
    let sxy_p_syx = sxy + syx;
    let syz_m_szy = syz - szy;
    let sxz_m_szx = sxz - szx;
    let sxy_m_syx = sxy - syx;
    let sxx_p_syy = sxx + syy;
    let sxx_m_syy = sxx - syy;
    let sxy2_sxz2_syx2_szx2 = sxy2 + sxz2 - syx2 - szx2;

    let c0 = sxy2_sxz2_syx2_szx2 * sxy2_sxz2_syx2_szx2
        + (sxx2_syy2_szz2_syz2_szy2 + syz_szy_m_syy_szz2)
            * (sxx2_syy2_szz2_syz2_szy2 - syz_szy_m_syy_szz2)
        + (-sxz_p_szx * syz_m_szy + sxy_m_syx * (sxx_m_syy - szz))
            * (-sxz_m_szx * syz_p_szy + sxy_m_syx * (sxx_m_syy + szz))
        + (-sxz_p_szx * syz_p_szy - sxy_p_syx * (sxx_p_syy - szz))
            * (-sxz_m_szx * syz_m_szy - sxy_p_syx * (sxx_p_syy + szz))
        + (sxy_p_syx * syz_p_szy + sxz_p_szx * (sxx_m_syy + szz))
            * (-sxy_m_syx * syz_m_szy + sxz_p_szx * (sxx_p_syy + szz))
        + (sxy_p_syx * syz_m_szy + sxz_m_szx * (sxx_m_syy - szz))
            * (-sxy_m_syx * syz_p_szy + sxz_m_szx * (sxx_p_syy - szz));

    let mut eigen = e0;
    for _ in 0..MAX_NEWTON_ITER {
        let old = eigen;
        let x2 = eigen * eigen;
        let b = (x2 + c2) * eigen;
        let a = b + c1;
        let den = 2.0 * x2 * eigen + b + a;
        // At a double root the update degenerates to 0/0; the current
        // iterate already is the eigenvalue.
        if den == 0.0 {
            break;
        }
        eigen -= (a * eigen + c0) / den;
        if (eigen - old).abs() < (EVAL_PREC * eigen).abs() {
            break;
        }
    }
    eigen
}
