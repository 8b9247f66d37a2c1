//! Identification: which model entries are free parameters and which are
//! pinned, and where each block sits in the flat parameter vector.
//!
//! A factor and its loadings can be rescaled jointly without changing the
//! implied observations, so one loading per factor (the largest in absolute
//! value) is held at its template value. The largest measurement variance is
//! held fixed as well. Both choices are made once, from the template.

use std::ops::Range;

use tracing::{debug, warn};

use crate::model::DynamicFactorModel;

/// Which blocks of the model are held fixed instead of estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedBlocks {
    /// Loadings and measurement variances are fixed.
    pub measurements: bool,
    /// VAR coefficients and innovation covariance are fixed.
    pub transition: bool,
}

impl FixedBlocks {
    /// Everything is estimated.
    pub const NONE: Self = Self {
        measurements: false,
        transition: false,
    };
}

/// Position of the four parameter segments. Absent segments are empty ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLayout {
    /// Free loadings, measurement-major then factor index.
    pub loadings: Range<usize>,
    /// Square roots of the non-anchor measurement variances.
    pub measurement_scale: Range<usize>,
    /// VAR coefficients, row-major over the `nb x (nb·nl)` matrix.
    pub var_coefficients: Range<usize>,
    /// Lower Cholesky factor of the innovation covariance, packed by rows.
    pub covariance_factor: Range<usize>,
}

impl SegmentLayout {
    /// Total number of parameters.
    pub fn dim(&self) -> usize {
        self.covariance_factor.end
    }
}

/// A loading held fixed to pin the scale of one factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadingAnchor {
    /// Measurement carrying the anchor.
    pub measurement: usize,
    /// Pinned value.
    pub value: f64,
}

/// The measurement whose variance is held fixed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VarianceAnchor {
    /// Measurement index.
    pub measurement: usize,
    /// Pinned variance.
    pub value: f64,
}

/// Frozen identification scheme of a mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    layout: SegmentLayout,
    loading_anchors: Vec<LoadingAnchor>,
    variance_anchor: Option<VarianceAnchor>,
    free_loadings: Vec<(usize, usize)>,
    free_scales: Vec<usize>,
}

impl Identification {
    /// Derives the segment layout and anchors from a template model.
    ///
    /// Loading anchors exist only when both the measurements and the
    /// transition are estimated: with fixed factor dynamics the factor
    /// scale is already pinned by the innovation covariance.
    pub fn new(template: &DynamicFactorModel, fixed: FixedBlocks) -> Self {
        let nb = template.nfactors();
        let nl = template.nlags();

        let (loading_anchors, variance_anchor) = if fixed.measurements {
            (Vec::new(), None)
        } else if fixed.transition {
            (Vec::new(), variance_anchor(template))
        } else {
            (loading_anchors(template), variance_anchor(template))
        };

        let mut free_loadings = Vec::new();
        let mut free_scales = Vec::new();
        if !fixed.measurements {
            for (i, m) in template.measurements().iter().enumerate() {
                for j in (0..nb).filter(|&j| m.is_loaded(j)) {
                    if loading_anchors.get(j).is_none_or(|a| a.measurement != i) {
                        free_loadings.push((i, j));
                    }
                }
                if variance_anchor.is_none_or(|a| a.measurement != i) {
                    free_scales.push(i);
                }
            }
        }
        let n_loadings = free_loadings.len();
        let n_scales = free_scales.len();

        let (n_var, n_cov) = if fixed.transition {
            (0, 0)
        } else {
            (nb * nb * nl, nb * (nb + 1) / 2)
        };

        let mut start = 0;
        let mut segment = |len: usize| {
            let range = start..start + len;
            start += len;
            range
        };
        let layout = SegmentLayout {
            loadings: segment(n_loadings),
            measurement_scale: segment(n_scales),
            var_coefficients: segment(n_var),
            covariance_factor: segment(n_cov),
        };

        debug!(
            dim = layout.dim(),
            loadings = n_loadings,
            scales = n_scales,
            var = n_var,
            covariance = n_cov,
            anchors = ?loading_anchors,
            variance_anchor = ?variance_anchor,
            "identification frozen"
        );

        Self {
            layout,
            loading_anchors,
            variance_anchor,
            free_loadings,
            free_scales,
        }
    }

    /// Segment positions.
    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// One anchor per factor, or empty when loadings are not anchored.
    pub fn loading_anchors(&self) -> &[LoadingAnchor] {
        &self.loading_anchors
    }

    /// The pinned measurement variance, when measurements are estimated.
    pub fn variance_anchor(&self) -> Option<VarianceAnchor> {
        self.variance_anchor
    }

    /// Pinned value of `(measurement, factor)` if it is the factor's anchor.
    pub fn loading_anchor(&self, measurement: usize, factor: usize) -> Option<f64> {
        self.loading_anchors
            .get(factor)
            .filter(|a| a.measurement == measurement)
            .map(|a| a.value)
    }

    /// `(measurement, factor)` of each entry of the loadings segment, in order.
    pub fn free_loadings(&self) -> &[(usize, usize)] {
        &self.free_loadings
    }

    /// Measurement of each entry of the scale segment, in order.
    pub fn free_scales(&self) -> &[usize] {
        &self.free_scales
    }

    /// `true` when `measurement` carries the pinned variance.
    pub fn is_variance_anchor(&self, measurement: usize) -> bool {
        self.variance_anchor
            .is_some_and(|a| a.measurement == measurement)
    }
}

/// Largest |loading| per factor, earliest measurement on ties. A zero anchor
/// is pinned to 1.
fn loading_anchors(template: &DynamicFactorModel) -> Vec<LoadingAnchor> {
    (0..template.nfactors())
        .map(|j| {
            let mut best: Option<LoadingAnchor> = None;
            for (i, m) in template.measurements().iter().enumerate() {
                if let Some(c) = m.coefficient(j) {
                    if best.is_none_or(|b| c.abs() > b.value.abs()) {
                        best = Some(LoadingAnchor {
                            measurement: i,
                            value: c,
                        });
                    }
                }
            }
            // the model guarantees every factor is loaded
            let mut anchor = best.unwrap_or(LoadingAnchor {
                measurement: 0,
                value: 1.0,
            });
            if anchor.value == 0.0 {
                warn!(factor = j, "all loadings are zero, pinning the anchor to 1");
                anchor.value = 1.0;
            }
            anchor
        })
        .collect()
}

/// Largest variance, earliest measurement on ties.
fn variance_anchor(template: &DynamicFactorModel) -> Option<VarianceAnchor> {
    let mut best: Option<VarianceAnchor> = None;
    for (i, m) in template.measurements().iter().enumerate() {
        if best.is_none_or(|b| m.variance() > b.value) {
            best = Some(VarianceAnchor {
                measurement: i,
                value: m.variance(),
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MeasurementDescriptor;
    use ndarray::Array2;
    use nowcast_var::VarDescriptor;

    fn model(measurements: Vec<MeasurementDescriptor>, nb: usize, nl: usize) -> DynamicFactorModel {
        let var = VarDescriptor::new(Array2::zeros((nb, nb * nl)), Array2::eye(nb)).unwrap();
        DynamicFactorModel::new(measurements, var).unwrap()
    }

    fn pair() -> DynamicFactorModel {
        model(
            vec![
                MeasurementDescriptor::level(vec![Some(0.8)], 2.0),
                MeasurementDescriptor::level(vec![Some(0.3)], 0.5),
            ],
            1,
            1,
        )
    }

    #[test]
    fn two_measurement_example() {
        let id = Identification::new(&pair(), FixedBlocks::NONE);
        assert_eq!(
            id.loading_anchors(),
            &[LoadingAnchor {
                measurement: 0,
                value: 0.8
            }]
        );
        assert_eq!(
            id.variance_anchor(),
            Some(VarianceAnchor {
                measurement: 0,
                value: 2.0
            })
        );
        let layout = id.layout();
        assert_eq!(layout.loadings, 0..1);
        assert_eq!(layout.measurement_scale, 1..2);
        assert_eq!(layout.var_coefficients, 2..3);
        assert_eq!(layout.covariance_factor, 3..4);
        assert_eq!(layout.dim(), 4);
    }

    #[test]
    fn anchor_uses_absolute_value() {
        let m = model(
            vec![
                MeasurementDescriptor::level(vec![Some(0.5)], 1.0),
                MeasurementDescriptor::level(vec![Some(-0.9)], 1.0),
            ],
            1,
            1,
        );
        let id = Identification::new(&m, FixedBlocks::NONE);
        assert_eq!(id.loading_anchor(1, 0), Some(-0.9));
        assert_eq!(id.loading_anchor(0, 0), None);
    }

    #[test]
    fn ties_pick_earliest() {
        let m = model(
            vec![
                MeasurementDescriptor::level(vec![Some(0.5)], 1.0),
                MeasurementDescriptor::level(vec![Some(-0.5)], 1.0),
            ],
            1,
            1,
        );
        let id = Identification::new(&m, FixedBlocks::NONE);
        assert_eq!(id.loading_anchors()[0].measurement, 0);
        assert!(id.is_variance_anchor(0));
        assert!(!id.is_variance_anchor(1));
    }

    #[test]
    fn zero_anchor_is_pinned_to_one() {
        let m = model(
            vec![
                MeasurementDescriptor::level(vec![Some(0.0)], 1.0),
                MeasurementDescriptor::level(vec![Some(0.0)], 1.0),
            ],
            1,
            1,
        );
        let id = Identification::new(&m, FixedBlocks::NONE);
        assert_eq!(id.loading_anchor(0, 0), Some(1.0));
    }

    #[test]
    fn anchors_per_factor() {
        let m = model(
            vec![
                MeasurementDescriptor::level(vec![Some(0.2), None], 1.0),
                MeasurementDescriptor::level(vec![Some(0.7), Some(0.1)], 3.0),
                MeasurementDescriptor::level(vec![None, Some(-0.4)], 2.0),
            ],
            2,
            2,
        );
        let id = Identification::new(&m, FixedBlocks::NONE);
        assert_eq!(id.loading_anchor(1, 0), Some(0.7));
        assert_eq!(id.loading_anchor(2, 1), Some(-0.4));
        assert!(id.is_variance_anchor(1));

        assert_eq!(id.free_loadings(), &[(0, 0), (1, 1)]);
        assert_eq!(id.free_scales(), &[0, 2]);

        let layout = id.layout();
        // 4 loaded coefficients - 2 anchors
        assert_eq!(layout.loadings.len(), 2);
        assert_eq!(layout.measurement_scale.len(), 2);
        assert_eq!(layout.var_coefficients.len(), 8);
        assert_eq!(layout.covariance_factor.len(), 3);
        assert_eq!(layout.dim(), 15);
    }

    #[test]
    fn measurements_fixed() {
        let fixed = FixedBlocks {
            measurements: true,
            transition: false,
        };
        let id = Identification::new(&pair(), fixed);
        assert!(id.loading_anchors().is_empty());
        assert_eq!(id.variance_anchor(), None);
        assert_eq!(id.layout().loadings, 0..0);
        assert_eq!(id.layout().measurement_scale, 0..0);
        assert_eq!(id.layout().var_coefficients, 0..1);
        assert_eq!(id.layout().dim(), 2);
    }

    #[test]
    fn transition_fixed_frees_all_loadings() {
        let fixed = FixedBlocks {
            measurements: false,
            transition: true,
        };
        let id = Identification::new(&pair(), fixed);
        assert!(id.loading_anchors().is_empty());
        assert!(id.is_variance_anchor(0));
        assert_eq!(id.free_loadings(), &[(0, 0), (1, 0)]);
        assert_eq!(id.free_scales(), &[1]);
        assert_eq!(id.layout().loadings, 0..2);
        assert_eq!(id.layout().measurement_scale, 2..3);
        assert!(id.layout().var_coefficients.is_empty());
        assert!(id.layout().covariance_factor.is_empty());
        assert_eq!(id.layout().dim(), 3);
    }

    #[test]
    fn everything_fixed() {
        let fixed = FixedBlocks {
            measurements: true,
            transition: true,
        };
        assert_eq!(Identification::new(&pair(), fixed).layout().dim(), 0);
    }
}
