//! Dense integer matrices, Smith normal form and finitely generated
//! abelian groups.

use core::fmt::{Display, Formatter};

use crate::maths::integer::Integer;
use crate::tri_error::TriError;

/// Dense row-major matrix over [`Integer`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct MatrixInt {
    rows: usize,
    cols: usize,
    data: Vec<Integer>,
}

impl MatrixInt {
    /// Zero matrix of the given shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Integer::ZERO; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.data[i * n + i] = Integer::ONE;
        }
        m
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Integer>>) -> Result<Self, TriError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(TriError::InvalidArgument("ragged matrix rows".into()));
        }
        let n = rows.len();
        Ok(Self {
            rows: n,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn entry(&self, r: usize, c: usize) -> &Integer {
        &self.data[r * self.cols + c]
    }

    #[inline]
    pub fn entry_mut(&mut self, r: usize, c: usize) -> &mut Integer {
        &mut self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: impl Into<Integer>) {
        self.data[r * self.cols + c] = v.into();
    }

    /// Row `r` as a slice.
    #[inline]
    pub fn row(&self, r: usize) -> &[Integer] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Append a row; its length must equal the column count.
    pub fn push_row(&mut self, row: &[Integer]) -> Result<(), TriError> {
        if self.rows == 0 && self.cols == 0 {
            self.cols = row.len();
        }
        if row.len() != self.cols {
            return Err(TriError::InvalidArgument(format!(
                "row of length {} in a matrix with {} columns",
                row.len(),
                self.cols
            )));
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for r in 0..self.rows {
            self.data.swap(r * self.cols + a, r * self.cols + b);
        }
    }

    /// `row[dest] += mult * row[src]`.
    pub fn add_row(&mut self, src: usize, dest: usize, mult: &Integer) {
        if mult.is_zero() {
            return;
        }
        for c in 0..self.cols {
            let add = self.entry(src, c) * mult;
            *self.entry_mut(dest, c) += add;
        }
    }

    /// `col[dest] += mult * col[src]`.
    pub fn add_col(&mut self, src: usize, dest: usize, mult: &Integer) {
        if mult.is_zero() {
            return;
        }
        for r in 0..self.rows {
            let add = self.entry(r, src) * mult;
            *self.entry_mut(r, dest) += add;
        }
    }

    pub fn mult_row(&mut self, r: usize, mult: &Integer) {
        for c in 0..self.cols {
            *self.entry_mut(r, c) *= mult;
        }
    }

    pub fn negate_row(&mut self, r: usize) {
        for c in 0..self.cols {
            let v = -self.entry(r, c);
            *self.entry_mut(r, c) = v;
        }
    }

    pub fn negate_col(&mut self, c: usize) {
        for r in 0..self.rows {
            let v = -self.entry(r, c);
            *self.entry_mut(r, c) = v;
        }
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &MatrixInt) -> Result<MatrixInt, TriError> {
        if self.cols != other.rows {
            return Err(TriError::InvalidArgument(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = MatrixInt::new(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self.entry(r, k);
                if a.is_zero() {
                    continue;
                }
                for c in 0..other.cols {
                    let add = a * other.entry(k, c);
                    *out.entry_mut(r, c) += add;
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product.
    pub fn apply(&self, v: &[Integer]) -> Result<Vec<Integer>, TriError> {
        if v.len() != self.cols {
            return Err(TriError::InvalidArgument(format!(
                "vector of length {} against {} columns",
                v.len(),
                self.cols
            )));
        }
        Ok((0..self.rows)
            .map(|r| {
                self.row(r)
                    .iter()
                    .zip(v)
                    .filter(|(a, _)| !a.is_zero())
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect())
    }

    pub fn transpose(&self) -> MatrixInt {
        let mut out = MatrixInt::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.entry(r, c).clone();
            }
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(Integer::is_zero)
    }

    /// Rank over the rationals, by fraction-free row echelon reduction of a
    /// copy.
    pub fn rank(&self) -> usize {
        let mut m = self.clone();
        m.row_echelon()
    }

    /// Reduce in place to an integer row echelon form; returns the rank.
    pub fn row_echelon(&mut self) -> usize {
        let mut rank = 0;
        for c in 0..self.cols {
            if rank == self.rows {
                break;
            }
            // Euclid down the column until one nonzero entry remains.
            loop {
                let pivot = (rank..self.rows)
                    .filter(|&r| !self.entry(r, c).is_zero())
                    .min_by(|&a, &b| self.entry(a, c).abs().cmp(&self.entry(b, c).abs()));
                let Some(p) = pivot else { break };
                self.swap_rows(rank, p);
                let mut done = true;
                for r in (rank + 1)..self.rows {
                    if self.entry(r, c).is_zero() {
                        continue;
                    }
                    let q = self.entry(r, c) / self.entry(rank, c);
                    self.add_row(rank, r, &-q);
                    if !self.entry(r, c).is_zero() {
                        done = false;
                    }
                }
                if done {
                    rank += 1;
                    break;
                }
            }
        }
        rank
    }

    /// Reduce in place to Smith normal form: a diagonal matrix whose
    /// non-negative diagonal entries satisfy `d[i] | d[i+1]`, with all zero
    /// entries last.
    pub fn smith_normal_form(&mut self) {
        let n = self.rows.min(self.cols);
        let mut k = 0;
        while k < n {
            // Smallest nonzero entry of the trailing block becomes the pivot.
            let mut best: Option<(usize, usize)> = None;
            for r in k..self.rows {
                for c in k..self.cols {
                    let v = self.entry(r, c);
                    if v.is_zero() {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((br, bc)) => v.abs() < self.entry(br, bc).abs(),
                    };
                    if better {
                        best = Some((r, c));
                    }
                }
            }
            let Some((pr, pc)) = best else { break };
            self.swap_rows(k, pr);
            self.swap_cols(k, pc);

            let mut clean = true;
            for r in (k + 1)..self.rows {
                if self.entry(r, k).is_zero() {
                    continue;
                }
                let q = self.entry(r, k) / self.entry(k, k);
                self.add_row(k, r, &-q);
                if !self.entry(r, k).is_zero() {
                    clean = false;
                }
            }
            for c in (k + 1)..self.cols {
                if self.entry(k, c).is_zero() {
                    continue;
                }
                let q = self.entry(k, c) / self.entry(k, k);
                self.add_col(k, c, &-q);
                if !self.entry(k, c).is_zero() {
                    clean = false;
                }
            }
            if !clean {
                continue;
            }

            // Divisibility: fold an offending row into row k and retry.
            let d = self.entry(k, k).clone();
            let offender = ((k + 1)..self.rows).find(|&r| {
                ((k + 1)..self.cols).any(|c| !(self.entry(r, c) % &d).is_zero())
            });
            if let Some(r) = offender {
                self.add_row(r, k, &Integer::ONE);
                continue;
            }
            if d.sign() < 0 {
                self.negate_row(k);
            }
            k += 1;
        }
    }

    /// Diagonal of the matrix (length `min(rows, cols)`).
    pub fn diagonal(&self) -> Vec<Integer> {
        (0..self.rows.min(self.cols))
            .map(|i| self.entry(i, i).clone())
            .collect()
    }
}

impl Display for MatrixInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for r in 0..self.rows {
            let cells: Vec<String> = self.row(r).iter().map(ToString::to_string).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Abelian groups
// ---------------------------------------------------------------------------

/// Finitely generated abelian group `Z^rank + Z_t1 + Z_t2 + ...` with
/// `t1 | t2 | ...` and every `ti > 1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct AbelianGroup {
    rank: usize,
    torsion: Vec<Integer>,
}

impl AbelianGroup {
    pub fn trivial() -> Self {
        Self::default()
    }

    /// Group presented by `relations` (one row per relation, one column per
    /// generator).
    pub fn from_presentation(mut relations: MatrixInt) -> Self {
        let gens = relations.columns();
        relations.smith_normal_form();
        let mut rank = gens;
        let mut torsion = Vec::new();
        for d in relations.diagonal() {
            if d.is_zero() {
                continue;
            }
            rank -= 1;
            if d != 1 {
                torsion.push(d);
            }
        }
        torsion.sort();
        Self { rank, torsion }
    }

    /// Group `Z^rank + ⊕ Z_t` given directly by invariants. Coefficients
    /// are normalised through a diagonal Smith normal form.
    pub fn from_invariants(rank: usize, coeffs: &[Integer]) -> Self {
        let mut m = MatrixInt::new(coeffs.len(), coeffs.len());
        for (i, c) in coeffs.iter().enumerate() {
            *m.entry_mut(i, i) = c.clone();
        }
        let mut g = Self::from_presentation(m);
        g.rank += rank;
        g
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Invariant factors, each dividing the next.
    #[inline]
    pub fn torsion(&self) -> &[Integer] {
        &self.torsion
    }

    pub fn add_rank(&mut self, extra: usize) {
        self.rank += extra;
    }

    pub fn is_trivial(&self) -> bool {
        self.rank == 0 && self.torsion.is_empty()
    }

    /// True for the infinite cyclic group.
    pub fn is_z(&self) -> bool {
        self.rank == 1 && self.torsion.is_empty()
    }

    /// Order of the group, or `None` if it is infinite.
    pub fn order(&self) -> Option<Integer> {
        if self.rank > 0 {
            return None;
        }
        Some(self.torsion.iter().fold(Integer::ONE, |acc, t| acc * t))
    }
}

impl Display for AbelianGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut parts = Vec::new();
        match self.rank {
            0 => {}
            1 => parts.push("Z".to_string()),
            r => parts.push(format!("{r} Z")),
        }
        let mut i = 0;
        while i < self.torsion.len() {
            let t = &self.torsion[i];
            let run = self.torsion[i..].iter().take_while(|x| *x == t).count();
            if run == 1 {
                parts.push(format!("Z_{t}"));
            } else {
                parts.push(format!("{run} Z_{t}"));
            }
            i += run;
        }
        if parts.is_empty() {
            write!(f, "0")
        } else {
            write!(f, "{}", parts.join(" + "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat(rows: &[&[i64]]) -> MatrixInt {
        MatrixInt::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&x| Integer::new(x)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn smith_form_divisibility_chain() {
        let mut m = mat(&[&[2, 4, 4], &[-6, 6, 12], &[10, -4, -16]]);
        m.smith_normal_form();
        assert_eq!(
            m.diagonal(),
            vec![Integer::new(2), Integer::new(6), Integer::new(12)]
        );
        for r in 0..3 {
            for c in 0..3 {
                if r != c {
                    assert!(m.entry(r, c).is_zero());
                }
            }
        }
    }

    #[test]
    fn coprime_torsion_merges() {
        let g = AbelianGroup::from_invariants(1, &[Integer::new(2), Integer::new(3)]);
        assert_eq!(g.to_string(), "Z + Z_6");
        let h = AbelianGroup::from_presentation(mat(&[&[3]]));
        assert_eq!(h.torsion(), &[Integer::new(3)]);
        assert!(AbelianGroup::from_presentation(mat(&[&[1, 0], &[0, 1]])).is_trivial());
        assert_eq!(AbelianGroup::from_invariants(2, &[]).to_string(), "2 Z");
    }

    #[test]
    fn echelon_rank_and_products() {
        let m = mat(&[&[1, 2, 3], &[2, 4, 6], &[1, 0, 1]]);
        assert_eq!(m.rank(), 2);
        let id = MatrixInt::identity(3);
        assert_eq!(m.multiply(&id).unwrap(), m);
        assert_eq!(m.transpose().transpose(), m);
        let v = m
            .apply(&[Integer::new(1), Integer::new(1), Integer::new(1)])
            .unwrap();
        assert_eq!(v, vec![Integer::new(6), Integer::new(12), Integer::new(2)]);
    }
}
