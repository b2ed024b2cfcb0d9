//! Backend-neutral (mixed-)integer linear programs.
//!
//! Detectors and optimizers describe their problems with [`LpModel`] and hand
//! them to an [`LpSolver`]. A backend reports one of three outcomes and
//! nothing else: an optimal assignment, proven infeasibility, or an
//! inconclusive stop (time limit, numerical trouble, unboundedness).
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

mod microlp;

pub use microlp::MicroLpSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    Equal,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: VariableType,
    pub lower: f64,
    pub upper: f64,
}

/// `constant + Σ coefficient·variable`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    pub constant: f64,
    pub terms: Vec<(f64, VariableId)>,
}

impl LinearExpression {
    pub fn new(constant: f64) -> Self {
        Self {
            constant,
            terms: Vec::new(),
        }
    }

    pub fn from_variable(var: VariableId) -> Self {
        let mut expr = Self::new(0.0);
        expr.add_term(1.0, var);
        expr
    }

    pub fn add_term(&mut self, coefficient: f64, var: VariableId) {
        if coefficient != 0.0 {
            self.terms.push((coefficient, var));
        }
    }

    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, (coef, var)| acc + coef * values[var.0])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpression,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub struct LpModel {
    pub name: String,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: LinearExpression,
    pub sense: OptimizationSense,
}

impl LpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpression::new(0.0),
            sense: OptimizationSense::Minimize,
        }
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        ty: VariableType,
        lower: f64,
        upper: f64,
    ) -> VariableId {
        let (lower, upper) = match ty {
            VariableType::Binary => (lower.max(0.0), upper.min(1.0)),
            _ => (lower, upper),
        };
        self.variables.push(Variable {
            name: name.into(),
            ty,
            lower,
            upper,
        });
        VariableId(self.variables.len() - 1)
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VariableId {
        self.add_variable(name, VariableType::Binary, 0.0, 1.0)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpression,
        sense: ConstraintSense,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinearExpression, sense: OptimizationSense) {
        self.objective = objective;
        self.sense = sense;
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
}

/// Values of every model variable at an optimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
    pub objective: f64,
}

impl Assignment {
    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }

    pub fn value(&self, var: VariableId) -> f64 {
        self.values[var.0]
    }

    /// Rounded 0/1 reading of a binary variable.
    pub fn is_set(&self, var: VariableId) -> bool {
        self.value(var) > 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Assignment),
    Infeasible,
    Inconclusive(String),
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::Optimal(assignment) => write!(f, "optimal ({})", assignment.objective),
            SolveOutcome::Infeasible => write!(f, "infeasible"),
            SolveOutcome::Inconclusive(reason) => write!(f, "inconclusive: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Per-solve limit handed to the backend.
    pub time_limit_secs: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: Some(60),
        }
    }
}

impl SolverConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }
}

/// The optimization oracle.
pub trait LpSolver {
    fn solve(&self, model: &LpModel) -> SolveOutcome;
}

impl<S: LpSolver + ?Sized> LpSolver for &S {
    fn solve(&self, model: &LpModel) -> SolveOutcome {
        (**self).solve(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_bounds_are_clamped() {
        let mut model = LpModel::new("clamp");
        let x = model.add_variable("x", VariableType::Binary, -3.0, 7.0);
        assert_eq!(model.variables[x.index()].lower, 0.0);
        assert_eq!(model.variables[x.index()].upper, 1.0);
    }

    #[test]
    fn expression_evaluates_against_values() {
        let mut model = LpModel::new("eval");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        let mut expr = LinearExpression::new(2.0);
        expr.add_term(3.0, x);
        expr.add_term(-1.0, y);
        expr.add_term(0.0, y);
        assert_eq!(expr.terms.len(), 2);
        assert_eq!(expr.evaluate(&[1.0, 1.0]), 4.0);
    }
}
