use num_traits::Float;

use alloc::vec::Vec;

/// Solves the linear least-squares problem `min ||A x - b||`.
///
/// `A` is a dense row-major `rows x cols` matrix. Columns are scaled to unit
/// norm and factorised with Householder QR using column pivoting, which reveals
/// the numerical rank of `A`. Columns beyond that rank are treated as linearly
/// dependent on the others and get a zero coefficient, so rank-deficient and
/// underdetermined systems still produce a finite solution that fits the data
/// as well as the full-rank part of `A` allows.
///
/// # Arguments
///
/// * `design` - Row-major matrix `A`
/// * `rows` - Number of rows of `A`
/// * `cols` - Number of columns of `A`
/// * `target` - Right-hand side `b`, one entry per row
///
/// # Returns
///
/// * `Option<Vec<T>>` - The `cols` coefficients, or `None` if the dimensions do not match
pub fn lstsq<T: Float>(design: &[T], rows: usize, cols: usize, target: &[T]) -> Option<Vec<T>> {
    if design.len() != rows * cols || target.len() != rows {
        return None;
    }

    let idx = |i: usize, j: usize| i * cols + j;
    let mut a = design.to_vec();
    let mut b = target.to_vec();

    let mut scale = vec![T::one(); cols];
    for (j, s) in scale.iter_mut().enumerate() {
        let norm = tail_norm_sq(&a, cols, 0, j).sqrt();
        if norm > T::zero() {
            *s = norm;
            for i in 0..rows {
                a[idx(i, j)] = a[idx(i, j)] / norm;
            }
        }
    }

    let two = T::one() + T::one();
    let mut perm: Vec<usize> = (0..cols).collect();
    let steps = rows.min(cols);

    for k in 0..steps {
        let (pivot, norm_sq) = (k..cols)
            .map(|j| (j, tail_norm_sq(&a, cols, k, j)))
            .fold((k, T::neg_infinity()), |best, cur| {
                if cur.1 > best.1 { cur } else { best }
            });

        if pivot != k {
            for i in 0..rows {
                a.swap(idx(i, k), idx(i, pivot));
            }
            perm.swap(k, pivot);
        }

        let norm = norm_sq.sqrt();
        if norm.is_zero() {
            break;
        }

        // Householder vector v = x - alpha * e1
        let alpha = if a[idx(k, k)] >= T::zero() { -norm } else { norm };
        let mut v: Vec<T> = (k..rows).map(|i| a[idx(i, k)]).collect();
        v[0] = v[0] - alpha;
        let v_sq = v.iter().fold(T::zero(), |acc, &x| acc + x * x);
        if v_sq.is_zero() {
            continue;
        }

        for j in k..cols {
            let dot = v
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (r, &vr)| acc + vr * a[idx(k + r, j)]);
            let f = two * dot / v_sq;
            for (r, &vr) in v.iter().enumerate() {
                a[idx(k + r, j)] = a[idx(k + r, j)] - f * vr;
            }
        }

        let dot = v
            .iter()
            .enumerate()
            .fold(T::zero(), |acc, (r, &vr)| acc + vr * b[k + r]);
        let f = two * dot / v_sq;
        for (r, &vr) in v.iter().enumerate() {
            b[k + r] = b[k + r] - f * vr;
        }
    }

    let largest = if steps > 0 { a[idx(0, 0)].abs() } else { T::zero() };
    let tol = largest * T::epsilon() * T::from(10 * rows.max(cols))?;
    let rank = (0..steps)
        .take_while(|&k| a[idx(k, k)].abs() > tol)
        .count();

    let mut z = vec![T::zero(); cols];
    for k in (0..rank).rev() {
        let acc = ((k + 1)..rank).fold(b[k], |acc, j| acc - a[idx(k, j)] * z[j]);
        z[k] = acc / a[idx(k, k)];
    }

    let mut coefficients = vec![T::zero(); cols];
    for (k, &col) in perm.iter().enumerate() {
        coefficients[col] = z[k] / scale[col];
    }
    Some(coefficients)
}

/// Squared norm of column `j` restricted to rows `from..`
#[inline]
fn tail_norm_sq<T: Float>(a: &[T], cols: usize, from: usize, j: usize) -> T {
    a.chunks_exact(cols)
        .skip(from)
        .fold(T::zero(), |acc, row| acc + row[j] * row[j])
}
