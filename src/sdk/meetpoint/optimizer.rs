use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sdk::routing::error::MeetpointError;
use crate::sdk::routing::matrix::{DurationMatrix, DurationVector};

/// Objective used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Minimise the total travel time of the group.
    #[default]
    Minisum,
    /// Minimise the longest individual travel time.
    Minimax,
}

impl FromStr for Criterion {
    type Err = MeetpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minisum" => Ok(Criterion::Minisum),
            "minimax" => Ok(Criterion::Minimax),
            _ => Err(MeetpointError::InvalidCriterion(s.to_string())),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Minisum => f.write_str("minisum"),
            Criterion::Minimax => f.write_str("minimax"),
        }
    }
}

/// The winning candidate column and its objective value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub cost: f64,
}

impl Selection {
    /// Every candidate was unreachable for someone; the index is only a
    /// deterministic placeholder.
    pub fn all_unreachable(&self) -> bool {
        self.cost.is_infinite()
    }
}

/// Objective value of every candidate column.
///
/// With a destination, minisum charges the destination leg once per person
/// (`sum + people * dest`) and minimax charges it once (`max + dest`).
pub fn candidate_costs(
    matrix: &DurationMatrix,
    destination: Option<&DurationVector>,
    criterion: Criterion,
) -> Vec<f64> {
    let people = matrix.rows() as f64;
    (0..matrix.cols())
        .map(|c| {
            let column = matrix.column(c);
            let base = match criterion {
                Criterion::Minisum => column.sum::<f64>(),
                Criterion::Minimax => column.fold(f64::NEG_INFINITY, f64::max),
            };
            match (destination, criterion) {
                (None, _) => base,
                (Some(v), Criterion::Minisum) => base + people * v.get(c),
                (Some(v), Criterion::Minimax) => base + v.get(c),
            }
        })
        .collect()
}

/// Picks the cheapest candidate; ties go to the lowest index.
pub fn select_best(
    matrix: &DurationMatrix,
    destination: Option<&DurationVector>,
    criterion: Criterion,
) -> Result<Selection, MeetpointError> {
    if matrix.rows() == 0 || matrix.cols() == 0 {
        return Err(MeetpointError::InvalidInput(format!(
            "cannot optimise over a {}x{} duration matrix",
            matrix.rows(),
            matrix.cols()
        )));
    }
    if let Some(v) = destination {
        if v.len() != matrix.cols() {
            return Err(MeetpointError::InvalidInput(format!(
                "destination vector has {} entries for {} candidates",
                v.len(),
                matrix.cols()
            )));
        }
    }

    let costs = candidate_costs(matrix, destination, criterion);
    let mut best = Selection {
        index: 0,
        cost: costs[0],
    };
    for (index, &cost) in costs.iter().enumerate().skip(1) {
        if cost < best.cost {
            best = Selection { index, cost };
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routing::matrix::UNREACHABLE;

    fn m(rows: Vec<Vec<f64>>) -> DurationMatrix {
        DurationMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_criterion_parsing() {
        assert_eq!("MiniSum".parse::<Criterion>().unwrap(), Criterion::Minisum);
        assert_eq!(" minimax ".parse::<Criterion>().unwrap(), Criterion::Minimax);
        assert!(matches!(
            "median".parse::<Criterion>(),
            Err(MeetpointError::InvalidCriterion(_))
        ));
    }

    #[test]
    fn test_minisum_and_minimax_disagree() {
        // column 0: sum 20, max 19; column 1: sum 22, max 12
        let matrix = m(vec![vec![1.0, 10.0], vec![19.0, 12.0]]);
        assert_eq!(select_best(&matrix, None, Criterion::Minisum).unwrap().index, 0);
        assert_eq!(select_best(&matrix, None, Criterion::Minimax).unwrap().index, 1);
    }

    #[test]
    fn test_single_finite_column_wins_under_both_criteria() {
        let matrix = m(vec![
            vec![UNREACHABLE, 900.0, UNREACHABLE],
            vec![1.0, 800.0, UNREACHABLE],
            vec![UNREACHABLE, 700.0, 2.0],
        ]);
        for criterion in [Criterion::Minisum, Criterion::Minimax] {
            let s = select_best(&matrix, None, criterion).unwrap();
            assert_eq!(s.index, 1, "{}", criterion);
            assert!(!s.all_unreachable());
        }
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let matrix = m(vec![vec![5.0, 3.0, 3.0], vec![5.0, 3.0, 3.0]]);
        for criterion in [Criterion::Minisum, Criterion::Minimax] {
            assert_eq!(select_best(&matrix, None, criterion).unwrap().index, 1);
        }
    }

    #[test]
    fn test_destination_weighting() {
        // two people; column 0 is close to people but far from destination
        let matrix = m(vec![vec![10.0, 30.0], vec![10.0, 30.0]]);
        let dest = DurationVector::from_values(vec![40.0, 15.0]);
        // minisum: 20 + 2*40 = 100 vs 60 + 2*15 = 90
        let s = select_best(&matrix, Some(&dest), Criterion::Minisum).unwrap();
        assert_eq!((s.index, s.cost), (1, 90.0));
        // minimax: 10 + 40 = 50 vs 30 + 15 = 45
        let s = select_best(&matrix, Some(&dest), Criterion::Minimax).unwrap();
        assert_eq!((s.index, s.cost), (1, 45.0));

        let costs = candidate_costs(&matrix, Some(&dest), Criterion::Minisum);
        assert_eq!(costs, vec![100.0, 90.0]);
    }

    #[test]
    fn test_all_unreachable_still_selects_first_column() {
        let matrix = DurationMatrix::unreachable(3, 4);
        let s = select_best(&matrix, None, Criterion::Minisum).unwrap();
        assert_eq!(s.index, 0);
        assert!(s.all_unreachable());
    }

    #[test]
    fn test_mismatched_destination_vector_is_rejected() {
        let matrix = m(vec![vec![1.0, 2.0]]);
        let dest = DurationVector::from_values(vec![1.0]);
        assert!(select_best(&matrix, Some(&dest), Criterion::Minimax).is_err());
    }
}
