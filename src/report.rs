//! 分析报告.
//!
//! Markings are rendered as sorted lists of place names so the JSON output
//! does not depend on internal indices.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::analysis::symbolic::ImageStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitSummary {
    pub state_count: usize,
    pub edge_count: usize,
    pub deadlocks: Vec<Vec<String>>,
    pub truncated: bool,
    pub analysis_time: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolicSummary {
    pub image: ImageStrategy,
    pub iterations: usize,
    /// Exact count, kept as a string because it may exceed `u64`.
    pub cardinality: String,
    pub node_count: usize,
    /// Whether individual markings were extracted (count within the ceiling).
    pub extracted: bool,
    pub analysis_time: Duration,
}

/// Explicit versus symbolic agreement; `None` when a side was unavailable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comparison {
    pub counts_match: Option<bool>,
    pub sets_match: Option<bool>,
    pub deadlocks_match: Option<bool>,
}

impl Comparison {
    /// No check that was performed disagreed.
    pub fn consistent(&self) -> bool {
        [self.counts_match, self.sets_match, self.deadlocks_match]
            .iter()
            .all(|check| check.unwrap_or(true))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlockSummary {
    /// `symbolic` or `explicit`: where the candidate markings came from.
    pub candidate_source: String,
    pub candidates: usize,
    pub solver_invoked: bool,
    pub found: bool,
    pub witness: Option<Vec<String>>,
    pub inconclusive: Option<String>,
    /// Witness is an explicit deadlock, or nothing was found and the explicit
    /// deadlock set is empty.
    pub matches_explicit: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub objective: Vec<(String, f64)>,
    pub witness: Option<Vec<String>>,
    pub value: Option<f64>,
    pub iterations: usize,
    pub cuts_added: usize,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub model: String,
    pub place_count: usize,
    pub transition_count: usize,
    pub arc_count: usize,
    pub explicit: ExplicitSummary,
    pub symbolic: Option<SymbolicSummary>,
    pub symbolic_error: Option<String>,
    pub comparison: Comparison,
    pub deadlock: DeadlockSummary,
    pub optimization: OptimizationSummary,
    pub analysis_time: Duration,
}

fn braces(marking: &[String]) -> String {
    format!("{{{}}}", marking.join(", "))
}

fn check(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "一致",
        Some(false) => "不一致",
        None => "未比较",
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "可达性分析报告: {}", self.model)?;
        writeln!(
            f,
            "库所 {} / 迁移 {} / 弧 {}",
            self.place_count, self.transition_count, self.arc_count
        )?;
        writeln!(f, "分析时间: {:?}", self.analysis_time)?;

        writeln!(f, "\n显式枚举:")?;
        writeln!(f, "  状态数: {}", self.explicit.state_count)?;
        writeln!(f, "  边数: {}", self.explicit.edge_count)?;
        if self.explicit.truncated {
            writeln!(f, "  (达到状态上限, 结果不完整)")?;
        }
        writeln!(f, "  死锁数: {}", self.explicit.deadlocks.len())?;
        for marking in &self.explicit.deadlocks {
            writeln!(f, "    {}", braces(marking))?;
        }

        writeln!(f, "\n符号计算:")?;
        match (&self.symbolic, &self.symbolic_error) {
            (Some(symbolic), _) => {
                writeln!(f, "  像计算: {:?}", symbolic.image)?;
                writeln!(f, "  迭代次数: {}", symbolic.iterations)?;
                writeln!(f, "  可达标识数: {}", symbolic.cardinality)?;
                writeln!(f, "  BDD 节点数: {}", symbolic.node_count)?;
            }
            (None, Some(error)) => writeln!(f, "  错误: {}", error)?,
            (None, None) => writeln!(f, "  未执行")?,
        }
        writeln!(f, "  数量: {}", check(self.comparison.counts_match))?;
        writeln!(f, "  可达集: {}", check(self.comparison.sets_match))?;
        writeln!(f, "  死锁集: {}", check(self.comparison.deadlocks_match))?;

        writeln!(
            f,
            "\nILP 死锁检测 ({} 个候选, 来源 {}):",
            self.deadlock.candidates, self.deadlock.candidate_source
        )?;
        match (&self.deadlock.witness, &self.deadlock.inconclusive) {
            (Some(witness), _) => writeln!(f, "  发现死锁: {}", braces(witness))?,
            (None, Some(reason)) => writeln!(f, "  无结论: {}", reason)?,
            (None, None) => writeln!(f, "  无死锁")?,
        }
        writeln!(f, "  与显式结果: {}", check(self.deadlock.matches_explicit))?;

        writeln!(f, "\nILP 优化:")?;
        match (&self.optimization.witness, self.optimization.value) {
            (Some(witness), Some(value)) => {
                writeln!(f, "  最优标识: {}", braces(witness))?;
                writeln!(f, "  目标值: {}", value)?;
            }
            _ => {
                if let Some(failure) = &self.optimization.failure {
                    writeln!(f, "  失败: {}", failure)?;
                }
            }
        }
        writeln!(
            f,
            "  求解次数: {}, 割平面: {}",
            self.optimization.iterations, self.optimization.cuts_added
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_comparisons_are_consistent() {
        let mut comparison = Comparison::default();
        assert!(comparison.consistent());
        comparison.counts_match = Some(true);
        comparison.sets_match = Some(false);
        assert!(!comparison.consistent());
    }
}
