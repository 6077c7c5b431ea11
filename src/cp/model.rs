//! CP model definition.

use super::variables::{BoolVar, LinearExpr};
use crate::error::ModelError;
use std::collections::HashSet;

/// A constraint over boolean variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exactly one of the variables is true.
    ExactlyOne {
        /// Variables in the group.
        vars: Vec<BoolVar>,
    },

    /// At most one of the variables is true.
    AtMostOne {
        /// Variables in the group.
        vars: Vec<BoolVar>,
    },

    /// `min <= expr <= max`.
    Linear {
        /// Constrained expression.
        expr: LinearExpr,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
}

/// Objective function for the CP model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    /// Minimize a linear expression.
    Minimize(LinearExpr),
    /// Maximize a linear expression.
    Maximize(LinearExpr),
}

impl Objective {
    /// The underlying expression.
    pub fn expr(&self) -> &LinearExpr {
        match self {
            Objective::Minimize(expr) | Objective::Maximize(expr) => expr,
        }
    }
}

/// A constraint programming model over boolean variables.
///
/// # Examples
///
/// ```
/// use u_roster::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("example");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_exactly_one(vec![a, b]);
/// model.maximize(LinearExpr::sum([a]));
/// assert!(model.validate().is_ok());
/// assert_eq!(model.var_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    var_names: Vec<String>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_names: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Creates a boolean variable and returns its handle.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.var_names.push(name.into());
        BoolVar(self.var_names.len() - 1)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: exactly one of `vars` is true.
    pub fn add_exactly_one(&mut self, vars: Vec<BoolVar>) {
        self.constraints.push(Constraint::ExactlyOne { vars });
    }

    /// Convenience: at most one of `vars` is true.
    pub fn add_at_most_one(&mut self, vars: Vec<BoolVar>) {
        self.constraints.push(Constraint::AtMostOne { vars });
    }

    /// Convenience: `min <= expr <= max`.
    pub fn add_linear(&mut self, expr: LinearExpr, min: i64, max: i64) {
        self.constraints.push(Constraint::Linear { expr, min, max });
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Convenience: maximize `expr`.
    pub fn maximize(&mut self, expr: LinearExpr) {
        self.set_objective(Objective::Maximize(expr));
    }

    /// Convenience: minimize `expr`.
    pub fn minimize(&mut self, expr: LinearExpr) {
        self.set_objective(Objective::Minimize(expr));
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every referenced variable exists and that no
    /// exactly-one / at-most-one group repeats a variable. Unsatisfiable
    /// bounds (`min > max`) are left for the solver to report as infeasible.
    pub fn validate(&self) -> Result<(), ModelError> {
        let count = self.var_count();
        let check = |var: BoolVar| {
            if var.index() < count {
                Ok(())
            } else {
                Err(ModelError::UndefinedVariable {
                    index: var.index(),
                    count,
                })
            }
        };

        for (position, constraint) in self.constraints.iter().enumerate() {
            match constraint {
                Constraint::ExactlyOne { vars } | Constraint::AtMostOne { vars } => {
                    let mut seen = HashSet::with_capacity(vars.len());
                    for &var in vars {
                        check(var)?;
                        if !seen.insert(var) {
                            return Err(ModelError::DuplicateVariable {
                                index: var.index(),
                                constraint: position,
                            });
                        }
                    }
                }
                Constraint::Linear { expr, .. } => {
                    for &(var, _) in &expr.terms {
                        check(var)?;
                    }
                }
            }
        }

        if let Some(objective) = &self.objective {
            for &(var, _) in &objective.expr().terms {
                check(var)?;
            }
        }
        Ok(())
    }

    /// Name given to `var` at creation.
    pub fn var_name(&self, var: BoolVar) -> Option<&str> {
        self.var_names.get(var.index()).map(String::as_str)
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective, if one was set.
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Returns the number of variables.
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_creation() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        let c = model.new_bool_var("c");
        model.add_exactly_one(vec![a, b]);
        model.add_at_most_one(vec![b, c]);
        model.add_linear(LinearExpr::sum([a, b, c]), 1, 2);
        model.maximize(LinearExpr::sum([a, c]));

        assert_eq!(model.var_count(), 3);
        assert_eq!(model.constraint_count(), 3);
        assert_eq!(model.var_name(b), Some("b"));
        assert!(model.objective().is_some());
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        model.add_exactly_one(vec![a, BoolVar(7)]);

        assert_eq!(
            model.validate(),
            Err(ModelError::UndefinedVariable { index: 7, count: 1 })
        );
    }

    #[test]
    fn test_undefined_variable_in_objective() {
        let mut model = CpModel::new("test");
        model.new_bool_var("a");
        model.minimize(LinearExpr::sum([BoolVar(3)]));

        assert!(model.validate().is_err());
    }

    #[test]
    fn test_duplicate_in_group() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_at_most_one(vec![a]);
        model.add_at_most_one(vec![a, b, a]);

        assert_eq!(
            model.validate(),
            Err(ModelError::DuplicateVariable {
                index: 0,
                constraint: 1
            })
        );
    }

    #[test]
    fn test_empty_bounds_are_not_a_model_error() {
        let mut model = CpModel::new("test");
        let a = model.new_bool_var("a");
        model.add_linear(LinearExpr::sum([a]), 2, 1);

        assert!(model.validate().is_ok());
    }
}
