//! Feature/target splitting for pre-split train/test matrices

use crate::error::{RegforgeError, Result};
use ndarray::{s, Array1, Array2};

/// Check a train/test matrix pair before any fitting happens.
///
/// Both matrices must carry at least one feature column plus the target
/// column, at least one row, and agree on width.
pub fn validate_matrix_pair(train: &Array2<f64>, test: &Array2<f64>) -> Result<()> {
    for (name, matrix) in [("train", train), ("test", test)] {
        if matrix.nrows() == 0 {
            return Err(RegforgeError::InvalidInput(format!(
                "{} matrix has no rows",
                name
            )));
        }
        if matrix.ncols() < 2 {
            return Err(RegforgeError::InvalidInput(format!(
                "{} matrix needs at least one feature column plus the target column, got {} column(s)",
                name,
                matrix.ncols()
            )));
        }
    }

    if train.ncols() != test.ncols() {
        return Err(RegforgeError::InvalidInput(format!(
            "train and test matrices disagree on width: {} vs {} columns",
            train.ncols(),
            test.ncols()
        )));
    }

    Ok(())
}

/// Split a matrix whose last column is the target into (features, target).
pub fn split_features_target(matrix: &Array2<f64>) -> (Array2<f64>, Array1<f64>) {
    let target_col = matrix.ncols() - 1;
    let x = matrix.slice(s![.., ..target_col]).to_owned();
    let y = matrix.column(target_col).to_owned();
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_features_target() {
        let m = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let (x, y) = split_features_target(&m);

        assert_eq!(x, array![[1.0, 2.0], [4.0, 5.0]]);
        assert_eq!(y, array![3.0, 6.0]);
    }

    #[test]
    fn test_validate_accepts_well_formed_pair() {
        let train = array![[1.0, 2.0], [3.0, 4.0]];
        let test = array![[5.0, 6.0]];
        assert!(validate_matrix_pair(&train, &test).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_matrix() {
        let train = Array2::<f64>::zeros((0, 3));
        let test = array![[1.0, 2.0, 3.0]];
        let result = validate_matrix_pair(&train, &test);
        assert!(matches!(result, Err(RegforgeError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_single_column() {
        let train = array![[1.0], [2.0]];
        let test = array![[3.0]];
        let result = validate_matrix_pair(&train, &test);
        assert!(matches!(result, Err(RegforgeError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_width_mismatch() {
        let train = array![[1.0, 2.0, 3.0]];
        let test = array![[1.0, 2.0]];
        let result = validate_matrix_pair(&train, &test);
        assert!(matches!(result, Err(RegforgeError::InvalidInput(_))));
    }
}
