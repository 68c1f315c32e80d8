//! Candidate parameter grids, sized by search effort.

use forecast_model::{
    description::SwarmSize,
    field::FieldSpec,
    params::ModelParams,
    seasonal::SeasonalLevelModel,
};

/// One hyperparameter combination to score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Smoothing factor for the running level.
    pub alpha: f64,
    /// Season length in records; 0 disables the seasonal profile.
    pub seasonal_period: usize,
    /// Weight of the seasonal profile against the level.
    pub season_blend: f64,
}

impl Candidate {
    /// Realizes this candidate as saveable model params over `fields`.
    pub fn to_params(&self, fields: &[FieldSpec]) -> ModelParams {
        ModelParams {
            model_type: SeasonalLevelModel::MODEL_TYPE.to_string(),
            steps: vec![1],
            alpha: self.alpha,
            seasonal_period: self.seasonal_period,
            season_blend: self.season_blend,
            fields: fields.to_vec(),
        }
    }
}

/// The combinations a search of the given size walks, in a fixed order.
///
/// The order matters: score ties resolve toward the earlier entry, so
/// repeated searches over the same data pick the same winner. Periods are
/// in records; with hourly data, 24 is a day and 168 a week.
pub fn candidate_grid(size: SwarmSize) -> Vec<Candidate> {
    let (alphas, periods, blends): (&[f64], &[usize], &[f64]) = match size {
        SwarmSize::Small => (&[0.3, 0.7], &[0, 24], &[0.5]),
        SwarmSize::Medium => (
            &[0.1, 0.3, 0.5, 0.7, 0.9],
            &[0, 12, 24, 168],
            &[0.3, 0.5, 0.7],
        ),
        SwarmSize::Large => (
            &[0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
            &[0, 4, 6, 8, 12, 24, 48, 168],
            &[0.1, 0.3, 0.5, 0.7, 0.9],
        ),
    };

    let mut grid = Vec::with_capacity(alphas.len() * periods.len() * blends.len());
    for &alpha in alphas {
        for &seasonal_period in periods {
            // A non-seasonal candidate has no blend axis to explore.
            if seasonal_period == 0 {
                grid.push(Candidate {
                    alpha,
                    seasonal_period,
                    season_blend: 0.0,
                });
                continue;
            }
            for &season_blend in blends {
                grid.push(Candidate {
                    alpha,
                    seasonal_period,
                    season_blend,
                });
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use forecast_model::{field::FieldKind, params::validate_params};

    use super::*;

    #[test]
    fn sizes_scale_the_grid() {
        let small = candidate_grid(SwarmSize::Small).len();
        let medium = candidate_grid(SwarmSize::Medium).len();
        let large = candidate_grid(SwarmSize::Large).len();
        assert_eq!(small, 4);
        assert_eq!(medium, 50);
        assert_eq!(large, 360);
    }

    #[test]
    fn grid_order_is_stable() {
        let grid = candidate_grid(SwarmSize::Small);
        assert_eq!(
            grid[0],
            Candidate {
                alpha: 0.3,
                seasonal_period: 0,
                season_blend: 0.0,
            }
        );
        assert_eq!(grid, candidate_grid(SwarmSize::Small));
    }

    #[test]
    fn non_seasonal_candidates_collapse_the_blend_axis() {
        let grid = candidate_grid(SwarmSize::Medium);
        let non_seasonal: Vec<_> = grid.iter().filter(|c| c.seasonal_period == 0).collect();
        // One per alpha value, not one per blend value.
        assert_eq!(non_seasonal.len(), 5);
        assert!(non_seasonal.iter().all(|c| c.season_blend == 0.0));
    }

    #[test]
    fn every_candidate_yields_valid_params() {
        let fields = vec![
            FieldSpec::new("timestamp", FieldKind::Datetime),
            FieldSpec::new("kw_energy_consumption", FieldKind::Float),
        ];
        for size in [SwarmSize::Small, SwarmSize::Medium, SwarmSize::Large] {
            for candidate in candidate_grid(size) {
                validate_params(&candidate.to_params(&fields)).unwrap();
            }
        }
    }
}
