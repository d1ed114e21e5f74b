/// Password-hash vector codec
///
/// Expands a password hash into a 128x128 grid, compresses it with
/// `ln(1 + x)`, reduces it with a two-stage finite difference and binarizes
/// the result into a digest string. The transform is pure: the same hash
/// always yields the same [`Digest`].
///
/// ## Digest Format
///
/// One character per cell of the reduced 127x127 grid, `'1'` for a
/// non-negative value and `'0'` otherwise. Every row is terminated by `';'`,
/// giving a fixed length of `127 * 128` bytes.
use crate::{CryptoError, Result};
use ndarray::{s, Array2};
use zeroize::Zeroize;

/// Side length of the expanded grid
pub const GRID_SIZE: usize = 128;

/// Side length of the grid after finite-difference reduction
pub const REDUCED_SIZE: usize = GRID_SIZE - 1;

/// Byte length of a digest derived from a full-size grid
pub const DIGEST_LEN: usize = REDUCED_SIZE * (REDUCED_SIZE + 1);

const ROW_DELIMITER: char = ';';

/// Numeric grid derived from a password hash. Cleared on drop.
#[derive(Clone, PartialEq)]
pub struct Vector(Array2<f64>);

impl Vector {
    pub fn from_array(grid: Array2<f64>) -> Self {
        Self(grid)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.0
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.0.dim()
    }
}

impl std::fmt::Debug for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("shape", &self.shape())
            .finish()
    }
}

impl Drop for Vector {
    fn drop(&mut self) {
        self.0.fill(0.0);
    }
}

/// Binarized digest over the alphabet `{0, 1, ;}`
#[derive(Clone, PartialEq, Eq)]
pub struct Digest(String);

impl Digest {
    /// Accept a digest recovered from storage, rejecting foreign characters
    pub fn parse(raw: String) -> Result<Self> {
        if raw.is_empty() {
            return Err(CryptoError::InvalidInput("digest is empty".to_string()));
        }
        if !raw.bytes().all(|b| matches!(b, b'0' | b'1' | b';')) {
            return Err(CryptoError::InvalidInput(
                "digest contains characters outside {0,1,;}".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the `;`-terminated rows
    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.0.split_terminator(ROW_DELIMITER)
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digest")
            .field("len", &self.0.len())
            .finish()
    }
}

impl Drop for Digest {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Expand a hash into a `GRID_SIZE` x `GRID_SIZE` grid
///
/// Cell `(i, j)` takes byte `(i * 128 + j) mod len` of the hash, scaled to
/// `[0, 1]`. Short hashes wrap around.
///
/// ## Errors
///
/// `CryptoError::InvalidInput` for an empty hash.
pub fn build_grid(hash: &str) -> Result<Vector> {
    let bytes = hash.as_bytes();
    if bytes.is_empty() {
        return Err(CryptoError::InvalidInput(
            "password hash must not be empty".to_string(),
        ));
    }

    let grid = Array2::from_shape_fn((GRID_SIZE, GRID_SIZE), |(i, j)| {
        let index = (i * GRID_SIZE + j) % bytes.len();
        f64::from(bytes[index]) / 255.0
    });

    Ok(Vector(grid))
}

/// Elementwise `ln(1 + x)`
pub fn smooth(grid: &Vector) -> Vector {
    Vector(grid.0.mapv(|value| (1.0 + value).ln()))
}

/// Row-wise then column-wise first difference
///
/// Output shape is exactly `(rows - 1, cols - 1)`.
///
/// ## Errors
///
/// `CryptoError::InvalidInput` when either dimension is below 2.
pub fn reduce(grid: &Vector) -> Result<Vector> {
    let (rows, cols) = grid.shape();
    if rows < 2 || cols < 2 {
        return Err(CryptoError::InvalidInput(format!(
            "grid of shape {}x{} cannot be reduced",
            rows, cols
        )));
    }

    let g = &grid.0;
    let row_diff = &g.slice(s![1.., ..]) - &g.slice(s![..-1, ..]);
    let col_diff = &row_diff.slice(s![.., 1..]) - &row_diff.slice(s![.., ..-1]);

    Ok(Vector(col_diff))
}

/// `'1'` for every non-negative cell, `'0'` otherwise, `';'` after each row
pub fn binarize(grid: &Vector) -> Digest {
    let (rows, cols) = grid.shape();
    let mut out = String::with_capacity(rows * (cols + 1));

    for row in grid.0.rows() {
        for &value in row {
            out.push(if value >= 0.0 { '1' } else { '0' });
        }
        out.push(ROW_DELIMITER);
    }

    Digest(out)
}

/// Full pipeline: grid, smoothing, reduction, binarization
pub fn derive_digest(hash: &str) -> Result<Digest> {
    let grid = build_grid(hash)?;
    let smoothed = smooth(&grid);
    let reduced = reduce(&smoothed)?;
    Ok(binarize(&reduced))
}
