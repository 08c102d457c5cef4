use crate::tape::Tape;
use crate::var::Var;
use approx::relative_eq;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}: analytical grad {analytical} != numerical grad {numerical}. Difference: {difference}")]
    GradientMismatch {
        input_index: usize,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },

    #[error("Function value is NaN or infinite while perturbing input {input_index}")]
    NonFiniteValue { input_index: usize },
}

/// Checks analytical gradients against central finite differences.
///
/// `func` rebuilds the computation under test from scratch on the tape
/// it is given, returning the scalar output. The analytical gradient
/// comes from one `backward()` pass; the numerical one from evaluating
/// `func` at `x ± epsilon` on throwaway tapes.
///
/// Comparison uses a relative tolerance (falling back to absolute near
/// zero), so `tolerance` around `1e-4` pairs well with `epsilon`
/// around `1e-6` for `f64`.
pub fn check_grad<F>(
    func: F,
    inputs: &[f64],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&Tape<f64>, &[Var<f64>]) -> Var<f64>,
{
    let tape = Tape::new();
    let vars: Vec<Var<f64>> = inputs.iter().map(|&v| tape.var(v)).collect();
    let output = func(&tape, &vars);
    output.backward();
    let analytical: Vec<f64> = vars.iter().map(|v| v.grad()).collect();

    let eval = |xs: &[f64]| -> f64 {
        let scratch = Tape::new();
        let vs: Vec<Var<f64>> = xs.iter().map(|&v| scratch.var(v)).collect();
        func(&scratch, &vs).value()
    };

    for (i, &grad) in analytical.iter().enumerate() {
        let mut plus = inputs.to_vec();
        plus[i] += epsilon;
        let mut minus = inputs.to_vec();
        minus[i] -= epsilon;

        let (loss_plus, loss_minus) = (eval(&plus), eval(&minus));
        if !loss_plus.is_finite() || !loss_minus.is_finite() {
            return Err(GradCheckError::NonFiniteValue { input_index: i });
        }

        let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
        if !relative_eq!(grad, numerical, epsilon = tolerance, max_relative = tolerance) {
            return Err(GradCheckError::GradientMismatch {
                input_index: i,
                analytical: grad,
                numerical,
                difference: (grad - numerical).abs(),
            });
        }
    }
    Ok(())
}
