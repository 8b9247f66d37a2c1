//! # nowcast-dfm
//!
//! Dynamic factor models: observed series load on a few latent factors that
//! follow a VAR. This crate holds the model structure, the bijection between
//! a model and the flat parameter vector an optimiser works on, and the
//! state-space form handed to a Kalman filter.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["DynamicFactorModel::new(measurements, var)?"] --> B["DfmMapping::new(model)"]
//!     B --> C[".default_parameters()?"]
//!     C --> D["minimize(&mapping, objective, &start, iters)?"]
//!     D --> E[".to_model(&best)?"]
//!     E --> F[".ssf_representation()?"]
//! ```
//!
//! ## Identification
//!
//! Each factor is scaled by one pinned loading (its largest in absolute
//! value) and the largest measurement variance is pinned too, unless the
//! corresponding blocks are fixed. See [`Identification`].
//!
//! ## Glossary
//!
//! | Term | Type | Meaning |
//! |------|------|---------|
//! | loading | [`MeasurementDescriptor::coefficient()`] | weight of a factor in a series |
//! | anchor | [`LoadingAnchor`], [`VarianceAnchor`] | entry held fixed for identification |
//! | block length | [`DynamicFactorModel::block_length()`] | lagged factor blocks in the state |
//! | Z | [`StateSpace::loadings()`] | measurement matrix |
//! | P0 | [`StateSpace::initial_covariance()`] | initial state covariance |

mod boundary;
mod cost;
mod error;
mod identification;
mod mapping;
mod measurement;
mod model;
mod ssf;

pub use boundary::{EPSILON, ParamValidation, ParameterMapping};
pub use cost::{DEFAULT_MAX_ITERS, MappedCost, Minimum, minimize};
pub use error::DfmError;
pub use identification::{
    FixedBlocks, Identification, LoadingAnchor, SegmentLayout, VarianceAnchor,
};
pub use mapping::DfmMapping;
pub use measurement::{MeasurementDescriptor, MeasurementType};
pub use model::DynamicFactorModel;
pub use ssf::{Initialization, StateSpace};
