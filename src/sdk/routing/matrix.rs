use super::error::RoutingError;

/// Unknown or unroutable durations are stored as `+inf`, never NaN.
pub const UNREACHABLE: f64 = f64::INFINITY;

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds < 0.0 {
        UNREACHABLE
    } else {
        seconds
    }
}

/// Travel times in seconds, people (rows) x candidates (columns), row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DurationMatrix {
    /// A matrix with every cell unreachable.
    pub fn unreachable(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![UNREACHABLE; rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, RoutingError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(RoutingError::MalformedResponse(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row.into_iter().map(sanitize));
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, seconds: f64) {
        self.data[row * self.cols + col] = sanitize(seconds);
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |r| self.get(r, col))
    }

    /// Number of finite cells.
    pub fn reachable_cells(&self) -> usize {
        self.data.iter().filter(|d| d.is_finite()).count()
    }

    /// Copies a sub-batch result into place. Block row `i` lands on global
    /// row `row_map[i]`; block column `j` on global column `col_offset + j`.
    pub fn place_block(&mut self, block: &DurationMatrix, row_map: &[usize], col_offset: usize) {
        debug_assert_eq!(block.rows, row_map.len());
        for (i, &global_row) in row_map.iter().enumerate() {
            for j in 0..block.cols {
                self.set(global_row, col_offset + j, block.get(i, j));
            }
        }
    }
}

/// Candidate -> destination travel times, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationVector(Vec<f64>);

impl DurationVector {
    pub fn unreachable(len: usize) -> Self {
        Self(vec![UNREACHABLE; len])
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values.into_iter().map(sanitize).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, seconds: f64) {
        self.0[index] = sanitize(seconds);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
