use gradnet_core::{GradNetError, Matrix, Real, Tape};
use std::fmt::Debug;

/// Bidirectional label ↔ integer-code mapping.
///
/// Codes are indices into the sorted list of distinct labels observed
/// at fit time, so `code` and `label` are inverses for every observed
/// class. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCodec<L: Ord + Clone> {
    classes: Vec<L>,
}

impl<L: Ord + Clone + Debug> LabelCodec<L> {
    /// Collects the sorted distinct labels of `y`.
    pub fn fit(y: &[L]) -> Self {
        let mut classes = y.to_vec();
        classes.sort();
        classes.dedup();
        LabelCodec { classes }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn code(&self, label: &L) -> Option<usize> {
        self.classes.binary_search(label).ok()
    }

    pub fn label(&self, code: usize) -> Option<&L> {
        self.classes.get(code)
    }

    /// One-hot encodes `y` into an `n × k` matrix of constant nodes:
    /// a single one at each label's code index.
    pub fn one_hot<T: Real>(&self, tape: &Tape<T>, y: &[L]) -> Result<Matrix<T>, GradNetError> {
        let k = self.num_classes();
        if y.is_empty() || k == 0 {
            return Err(GradNetError::EmptyInput {
                operation: "LabelCodec::one_hot".to_string(),
            });
        }
        let mut data = Vec::with_capacity(y.len() * k);
        for label in y {
            let code = self.code(label).ok_or_else(|| {
                GradNetError::InternalError(format!("label {label:?} missing from codec"))
            })?;
            for j in 0..k {
                data.push(tape.var(if j == code { T::one() } else { T::zero() }));
            }
        }
        Matrix::from_vars(data, y.len(), k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_unique_order() {
        let codec = LabelCodec::fit(&["dog", "cat", "bird", "dog", "cat"]);
        assert_eq!(codec.num_classes(), 3);
        assert_eq!(codec.classes(), &["bird", "cat", "dog"]);
        assert_eq!(codec.code(&"bird"), Some(0));
        assert_eq!(codec.code(&"dog"), Some(2));
        assert_eq!(codec.code(&"fish"), None);
    }

    #[test]
    fn code_and_label_are_inverses() {
        let codec = LabelCodec::fit(&[3, 1, 2, 1]);
        for class in codec.classes() {
            let code = codec.code(class).unwrap();
            assert_eq!(codec.label(code), Some(class));
        }
        for code in 0..codec.num_classes() {
            let label = codec.label(code).unwrap();
            assert_eq!(codec.code(label), Some(code));
        }
    }

    #[test]
    fn one_hot_places_a_single_one_per_row() {
        let tape = Tape::<f64>::new();
        let codec = LabelCodec::fit(&["a", "b", "c"]);
        let encoded = codec.one_hot(&tape, &["b", "a", "c", "b"]).unwrap();
        assert_eq!(
            encoded.values(),
            vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 1.0, 0.0],
            ]
        );
    }
}
