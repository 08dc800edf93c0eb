//! Sliding-window segmentation of per-entity sequences.
//!
//! An entity with `N` rows and window length `W` yields exactly `N - W`
//! overlapping windows starting at rows `0, 1, ..., N - W - 1`; a window
//! ending on the final row is never emitted. `W >= N` and `W == 0` yield no
//! windows.

/// Number of windows `sliding_windows` produces for `len` rows.
pub fn window_count(len: usize, window: usize) -> usize {
    if window == 0 {
        0
    } else {
        len.saturating_sub(window)
    }
}

/// Every stride-1 window of length `window` over `rows`.
pub fn sliding_windows<T>(rows: &[T], window: usize) -> impl Iterator<Item = &[T]> {
    (0..window_count(rows.len(), window)).map(move |start| &rows[start..start + window])
}

/// Windows of every sequence, flattened into one list of owned samples.
pub fn window_sequences<T: Clone>(sequences: &[Vec<T>], window: usize) -> Vec<Vec<T>> {
    sequences.iter()
        .flat_map(|rows| sliding_windows(rows, window).map(|w| w.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_n_minus_w_windows_with_stride_one() {
        let rows: Vec<usize> = (0..192).collect();
        let windows: Vec<&[usize]> = sliding_windows(&rows, 30).collect();
        assert_eq!(windows.len(), 162);
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.len(), 30);
            assert_eq!(w[0], i);
        }
        assert_eq!(windows.last().unwrap()[29], 190);
    }

    #[test]
    fn short_entities_contribute_nothing() {
        let rows = vec![1, 2, 3];
        assert_eq!(sliding_windows(&rows, 4).count(), 0);
        assert_eq!(sliding_windows(&rows, 3).count(), 0);
        assert_eq!(sliding_windows(&rows, 0).count(), 0);
        assert_eq!(sliding_windows(&rows, 2).collect::<Vec<_>>(), vec![&[1, 2][..]]);
    }

    #[test]
    fn flattens_windows_across_entities() {
        let sequences = vec![vec![1, 2, 3, 4], vec![9], vec![5, 6, 7]];
        let windows = window_sequences(&sequences, 2);
        assert_eq!(windows, vec![vec![1, 2], vec![2, 3], vec![5, 6]]);
    }
}
