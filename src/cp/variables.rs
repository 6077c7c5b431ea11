//! CP variable and expression types.

/// Handle to a boolean decision variable.
///
/// Handles are created by [`crate::cp::CpModel::new_bool_var`] and are only
/// meaningful for the model that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    /// Position of this variable in its model.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear combination of boolean variables with integer coefficients.
///
/// # Examples
///
/// ```
/// use u_roster::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("example");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
///
/// let expr = LinearExpr::sum([a, b]).with_term(a, 2);
/// assert_eq!(expr.coefficient(a), 3);
/// assert_eq!(expr.coefficient(b), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    /// (variable, coefficient) pairs.
    pub terms: Vec<(BoolVar, i64)>,
}

impl LinearExpr {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Unit-coefficient sum of the given variables.
    pub fn sum(vars: impl IntoIterator<Item = BoolVar>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
        }
    }

    /// Weighted sum from (variable, coefficient) pairs.
    pub fn weighted(terms: impl IntoIterator<Item = (BoolVar, i64)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    /// Appends a term.
    pub fn add_term(&mut self, var: BoolVar, coefficient: i64) {
        self.terms.push((var, coefficient));
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: BoolVar, coefficient: i64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    /// Total coefficient of `var` (repeated terms are summed).
    pub fn coefficient(&self, var: BoolVar) -> i64 {
        self.terms
            .iter()
            .filter(|&&(v, _)| v == var)
            .map(|&(_, c)| c)
            .sum()
    }

    /// Evaluates the expression under `value`.
    pub fn evaluate(&self, value: impl Fn(BoolVar) -> bool) -> i64 {
        self.terms
            .iter()
            .filter(|&&(v, _)| value(v))
            .map(|&(_, c)| c)
            .sum()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Merges repeated variables and drops zero coefficients.
    ///
    /// The result is ordered by variable index.
    pub fn normalized(&self) -> Self {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|&(v, _)| v);
        let mut merged: Vec<(BoolVar, i64)> = Vec::with_capacity(terms.len());
        for (var, coefficient) in terms {
            match merged.last_mut() {
                Some((last, total)) if *last == var => *total += coefficient,
                _ => merged.push((var, coefficient)),
            }
        }
        merged.retain(|&(_, c)| c != 0);
        Self { terms: merged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_has_unit_coefficients() {
        let expr = LinearExpr::sum([BoolVar(0), BoolVar(3)]);
        assert_eq!(expr.len(), 2);
        assert!(expr.terms.iter().all(|&(_, c)| c == 1));
    }

    #[test]
    fn test_evaluate() {
        let expr = LinearExpr::weighted([(BoolVar(0), 2), (BoolVar(1), 5), (BoolVar(2), -1)]);
        assert_eq!(expr.evaluate(|v| v.index() != 1), 1);
        assert_eq!(expr.evaluate(|_| true), 6);
        assert_eq!(expr.evaluate(|_| false), 0);
    }

    #[test]
    fn test_normalized_merges_and_drops_zero() {
        let expr = LinearExpr::weighted([
            (BoolVar(2), 1),
            (BoolVar(0), 4),
            (BoolVar(2), 2),
            (BoolVar(1), 3),
            (BoolVar(1), -3),
        ]);
        let normalized = expr.normalized();
        assert_eq!(normalized.terms, vec![(BoolVar(0), 4), (BoolVar(2), 3)]);
    }
}
