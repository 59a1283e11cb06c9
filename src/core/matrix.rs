//! The pairwise distance matrix consumed by the cost engine.

use std::io::BufRead;

/// A symmetric `n x n` matrix of pairwise dissimilarities.
///
/// Immutable for the duration of a run; shared read-only by every tree in
/// the search population. The diagonal is carried but never read.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds a matrix from parsed rows.
    ///
    /// # Errors
    ///
    /// * If there are no rows, or any row's length differs from the number
    ///   of rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, String> {
        let n = rows.len();
        if n == 0 {
            return Err("empty distance matrix".to_string());
        }

        let mut values = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(format!(
                    "row {i} has {} fields, expected {n}",
                    row.len()
                ));
            }
            values.extend(row);
        }

        Ok(Self { n, values })
    }

    /// Reads a whitespace-separated matrix from a (possibly un-seekable)
    /// text stream.
    ///
    /// The number of fields on the first line fixes `n`; exactly `n` lines
    /// are consumed. Trailing whitespace before a newline does not
    /// introduce a spurious column.
    ///
    /// # Errors
    ///
    /// * If the stream ends before `n` rows are read, a field fails to
    ///   parse as a float, or a row has the wrong number of fields.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, String> {
        let mut lines = reader.lines();

        let first = match lines.next() {
            Some(line) => parse_row(&line.map_err(|e| e.to_string())?, 0)?,
            None => return Err("empty input: no matrix rows".to_string()),
        };

        let n = first.len();
        if n == 0 {
            return Err("blank first line: cannot size the matrix".to_string());
        }

        let mut rows = Vec::with_capacity(n);
        rows.push(first);

        for i in 1..n {
            let line = lines
                .next()
                .ok_or_else(|| format!("expected {n} rows, stream ended after {i}"))?
                .map_err(|e| e.to_string())?;
            let row = parse_row(&line, i)?;
            if row.len() != n {
                return Err(format!("row {i} has {} fields, expected {n}", row.len()));
            }
            rows.push(row);
        }

        Self::from_rows(rows)
    }

    /// The number of items (rows).
    pub fn n(&self) -> usize {
        self.n
    }

    /// The dissimilarity between items `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

fn parse_row(line: &str, index: usize) -> Result<Vec<f64>, String> {
    line.split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| format!("row {index}: unparseable value {field:?}"))
        })
        .collect()
}
