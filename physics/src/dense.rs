//! Dense linear algebra, exposed as a thin typed wrapper over `nalgebra`.
//!
//! Matrices are passed as flat row-major `f32` slices with explicit
//! dimensions; the batched variants additionally take a start-offset array
//! so a caller can pack many small systems into one buffer. Neither
//! integrator in this crate calls into this module directly today — it is
//! kept as the documented external contract for a future dense-implicit
//! solve path, and is exercised by its own tests.

use nalgebra::DMatrix;

fn to_dmatrix(data: &[f32], rows: usize, cols: usize) -> DMatrix<f32> {
    DMatrix::from_row_slice(rows, cols, data)
}

fn write_back(m: &DMatrix<f32>, out: &mut [f32]) {
    for (i, v) in m.transpose().iter().enumerate() {
        out[i] = *v;
    }
}

/// `out = a(m,n) * b(n,p)`, row-major.
pub fn dense_gemm(a: &[f32], b: &[f32], m: usize, n: usize, p: usize, out: &mut [f32]) {
    let a = to_dmatrix(a, m, n);
    let b = to_dmatrix(b, n, p);
    write_back(&(a * b), out);
}

/// Batched `dense_gemm` over matrices packed end-to-end, described by
/// `offsets_a`/`offsets_b`/`offsets_out` (start index of each batch element
/// within its flat buffer) and shared dimensions `m, n, p`.
pub fn dense_gemm_batched(
    a: &[f32],
    b: &[f32],
    m: usize,
    n: usize,
    p: usize,
    offsets_a: &[usize],
    offsets_b: &[usize],
    offsets_out: &[usize],
    out: &mut [f32],
) {
    for i in 0..offsets_a.len() {
        let a_slice = &a[offsets_a[i]..offsets_a[i] + m * n];
        let b_slice = &b[offsets_b[i]..offsets_b[i] + n * p];
        let out_slice = &mut out[offsets_out[i]..offsets_out[i] + m * p];
        dense_gemm(a_slice, b_slice, m, n, p, out_slice);
    }
}

/// Lower-triangular Cholesky factor `L` of symmetric positive-definite `a(n,n)`,
/// such that `a == L * L^T`. Returns `None` if `a` is not positive-definite.
pub fn dense_chol(a: &[f32], n: usize, out: &mut [f32]) -> Option<()> {
    let a = to_dmatrix(a, n, n);
    let chol = nalgebra::Cholesky::new(a)?;
    write_back(&chol.l(), out);
    Some(())
}

pub fn dense_chol_batched(a: &[f32], n: usize, offsets: &[usize], out: &mut [f32]) -> bool {
    let mut ok = true;
    for &off in offsets {
        let a_slice = &a[off..off + n * n];
        let out_slice = &mut out[off..off + n * n];
        if dense_chol(a_slice, n, out_slice).is_none() {
            ok = false;
        }
    }
    ok
}

/// Forward/back substitution against a Cholesky factor `l(n,n)` (lower
/// triangular) to solve `l * l^T * x = b`.
pub fn dense_subs(l: &[f32], b: &[f32], n: usize, out: &mut [f32]) {
    let l = to_dmatrix(l, n, n);
    let b = nalgebra::DVector::from_row_slice(b);
    let y = l
        .solve_lower_triangular(&b)
        .expect("dense_subs: singular lower-triangular factor");
    let x = l
        .transpose()
        .solve_upper_triangular(&y)
        .expect("dense_subs: singular upper-triangular factor");
    out.copy_from_slice(x.as_slice());
}

/// Batched `dense_subs` over systems packed end-to-end.
pub fn dense_subs_batched(
    l: &[f32],
    b: &[f32],
    n: usize,
    offsets_l: &[usize],
    offsets_b: &[usize],
    out: &mut [f32],
) {
    for i in 0..offsets_l.len() {
        let l_slice = &l[offsets_l[i]..offsets_l[i] + n * n];
        let b_slice = &b[offsets_b[i]..offsets_b[i] + n];
        let out_slice = &mut out[offsets_b[i]..offsets_b[i] + n];
        dense_subs(l_slice, b_slice, n, out_slice);
    }
}

/// Solves the symmetric positive-definite system `a(n,n) * x = b` directly,
/// composing [`dense_chol`] and [`dense_subs`].
pub fn dense_solve(a: &[f32], b: &[f32], n: usize, out: &mut [f32]) -> Option<()> {
    let mut l = vec![0.0f32; n * n];
    dense_chol(a, n, &mut l)?;
    dense_subs(&l, b, n, out);
    Some(())
}

pub fn dense_solve_batched(
    a: &[f32],
    b: &[f32],
    n: usize,
    offsets_a: &[usize],
    offsets_b: &[usize],
    out: &mut [f32],
) -> bool {
    let mut ok = true;
    for i in 0..offsets_a.len() {
        let a_slice = &a[offsets_a[i]..offsets_a[i] + n * n];
        let b_slice = &b[offsets_b[i]..offsets_b[i] + n];
        let out_slice = &mut out[offsets_b[i]..offsets_b[i] + n];
        if dense_solve(a_slice, b_slice, n, out_slice).is_none() {
            ok = false;
        }
    }
    ok
}
