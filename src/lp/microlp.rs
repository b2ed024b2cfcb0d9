//! `good_lp` backend running the bundled pure-Rust microlp solver.
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{
    Expression, IntoAffineExpression, ProblemVariables, ResolutionError, Solution, SolverModel,
    constraint, microlp, variable,
};

use super::{
    Assignment, ConstraintSense, LinearExpression, LpModel, LpSolver, OptimizationSense,
    SolveOutcome, SolverConfig, VariableType,
};

#[derive(Debug, Clone, Default)]
pub struct MicroLpSolver {
    config: SolverConfig,
}

impl MicroLpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

fn to_expression(expr: &LinearExpression, vars: &[good_lp::Variable]) -> Expression {
    let mut out = expr.constant.into_expression();
    for (coefficient, var) in &expr.terms {
        out += *coefficient * vars[var.index()];
    }
    out
}

impl LpSolver for MicroLpSolver {
    fn solve(&self, model: &LpModel) -> SolveOutcome {
        let mut problem = ProblemVariables::new();
        let vars: Vec<good_lp::Variable> = model
            .variables
            .iter()
            .map(|v| {
                let definition = match v.ty {
                    VariableType::Binary => variable().binary(),
                    VariableType::Integer => variable().integer(),
                    VariableType::Continuous => variable(),
                };
                let definition = if v.lower.is_finite() {
                    definition.min(v.lower)
                } else {
                    definition
                };
                let definition = if v.upper.is_finite() {
                    definition.max(v.upper)
                } else {
                    definition
                };
                problem.add(definition.name(v.name.clone()))
            })
            .collect();

        let objective = to_expression(&model.objective, &vars);
        let unsolved = match model.sense {
            OptimizationSense::Maximize => problem.maximise(objective),
            OptimizationSense::Minimize => problem.minimise(objective),
        };
        let mut solver = unsolved.using(microlp);
        for c in &model.constraints {
            let lhs = to_expression(&c.expr, &vars);
            let rhs = c.rhs.into_expression();
            let constraint = match c.sense {
                ConstraintSense::LessEqual => constraint::leq(lhs, rhs),
                ConstraintSense::Equal => constraint::eq(lhs, rhs),
                ConstraintSense::GreaterEqual => constraint::geq(lhs, rhs),
            };
            solver = solver.with(constraint);
        }
        if let Some(limit) = self.config.time_limit() {
            solver = solver.with_time_limit(limit.as_secs_f64());
        }

        match solver.solve() {
            Ok(solution) if !matches!(solution.status(), SolutionStatus::Optimal) => {
                let status = solution.status();
                log::debug!("{}: stopped with status {:?}", model.name, status);
                SolveOutcome::Inconclusive(format!("solver stopped early: {:?}", status))
            }
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|&var| solution.value(var)).collect();
                let objective = model.objective.evaluate(&values);
                log::debug!("{}: optimal, objective {}", model.name, objective);
                SolveOutcome::Optimal(Assignment::new(values, objective))
            }
            Err(ResolutionError::Infeasible) => {
                log::debug!("{}: infeasible", model.name);
                SolveOutcome::Infeasible
            }
            Err(ResolutionError::Unbounded) => {
                SolveOutcome::Inconclusive("objective is unbounded".to_string())
            }
            Err(other) => SolveOutcome::Inconclusive(other.to_string()),
        }
    }
}
