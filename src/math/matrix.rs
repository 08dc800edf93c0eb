use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul};

/// Dense row-major matrix.
///
/// Sequence samples use one row per time step and one column per feature;
/// layer weights use one row per input and one column per output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![value; cols]; rows]
        }
    }

    /// Uniform samples on [-1, 1).
    pub fn uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>() * 2.0 - 1.0;
            }
        }

        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Both uniforms on (0, 1] so ln() never sees zero.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, 2 / (fan_in + fan_out)).
    ///
    /// Shape: (rows, cols) where `rows` is the fan-in and `cols` the fan-out.
    pub fn xavier<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / (rows + cols) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    pub fn row_vector(values: Vec<f64>) -> Matrix {
        Matrix::from_data(vec![values])
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        )
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.assert_same_shape(other);
        let data = self.data.iter().zip(other.data.iter())
            .map(|(row_a, row_b)| {
                row_a.iter().zip(row_b.iter()).map(|(x, y)| x * y).collect()
            })
            .collect();
        Matrix::from_data(data)
    }

    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes: {}x{} * {}x{}", self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }

    /// Row vector times matrix: `v · self`, with `v.len() == self.rows`.
    pub fn vec_mul(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.rows, "vector length does not match matrix rows");
        let mut out = vec![0.0; self.cols];
        for (k, &a) in v.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (o, w) in out.iter_mut().zip(self.data[k].iter()) {
                *o += a * w;
            }
        }
        out
    }

    /// Matrix times column vector: `self · v`, with `v.len() == self.cols`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.cols, "vector length does not match matrix cols");
        self.data.iter()
            .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Accumulates the outer product `a^T · b` into `self`.
    pub fn add_outer(&mut self, a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), self.rows);
        assert_eq!(b.len(), self.cols);
        for (row, &x) in self.data.iter_mut().zip(a.iter()) {
            if x == 0.0 {
                continue;
            }
            for (cell, &y) in row.iter_mut().zip(b.iter()) {
                *cell += x * y;
            }
        }
    }

    /// Adds `v` to row `i` element-wise.
    pub fn add_to_row(&mut self, i: usize, v: &[f64]) {
        assert_eq!(v.len(), self.cols);
        for (cell, &x) in self.data[i].iter_mut().zip(v.iter()) {
            *cell += x;
        }
    }

    pub fn add_assign(&mut self, other: &Matrix) {
        self.assert_same_shape(other);
        for (row, other_row) in self.data.iter_mut().zip(other.data.iter()) {
            for (a, b) in row.iter_mut().zip(other_row.iter()) {
                *a += b;
            }
        }
    }

    /// Column sums as a 1 x cols matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = vec![0.0; self.cols];
        for row in &self.data {
            for (acc, x) in res.iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        Matrix { rows: 1, cols: self.cols, data: vec![res] }
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    /// Horizontal concatenation: rows of `self` followed by rows of `other`.
    pub fn hstack(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.rows, other.rows, "hstack requires equal row counts");
        let data = self.data.iter().zip(other.data.iter())
            .map(|(a, b)| a.iter().chain(b.iter()).copied().collect())
            .collect();
        Matrix { rows: self.rows, cols: self.cols + other.cols, data }
    }

    /// Columns `start..end` as a new matrix.
    pub fn columns(&self, start: usize, end: usize) -> Matrix {
        assert!(start <= end && end <= self.cols, "column range out of bounds");
        let data = self.data.iter().map(|row| row[start..end].to_vec()).collect();
        Matrix { rows: self.rows, cols: end - start, data }
    }

    /// Same rows in reverse order (time reversal for sequence samples).
    pub fn reversed_rows(&self) -> Matrix {
        let mut data = self.data.clone();
        data.reverse();
        Matrix { rows: self.rows, cols: self.cols, data }
    }

    pub fn fill(&mut self, value: f64) {
        for row in &mut self.data {
            row.iter_mut().for_each(|x| *x = value);
        }
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    fn assert_same_shape(&self, other: &Matrix) {
        if !self.same_shape(other) {
            panic!("Matrices are of incorrect sizes: {}x{} vs {}x{}", self.rows, self.cols, other.rows, other.cols)
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.add_assign(&rhs);
        self
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self.assert_same_shape(&rhs);
        for (row, other_row) in self.data.iter_mut().zip(rhs.data.iter()) {
            for (a, b) in row.iter_mut().zip(other_row.iter()) {
                *a -= b;
            }
        }
        self
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.matmul(&rhs)
    }
}
