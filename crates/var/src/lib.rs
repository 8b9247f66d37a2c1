//! # nowcast-var
//!
//! Vector autoregressions used as the transition block of a dynamic factor
//! model: the VAR descriptor, its companion form, the stationarity check
//! and the unconditional (steady-state) covariance of the stacked state.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["VarDescriptor::new(coefficients, sigma)?"] --> B[".companion()"]
//!     A --> C[".is_stable()"]
//!     A --> D["unconditional_covariance(&var)?"]
//! ```
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | A_l | [`VarDescriptor::lag()`] | lag-`l` coefficient block |
//! | Σ | [`VarDescriptor::innovations_variance()`] | innovation covariance |
//! | T | [`VarDescriptor::companion()`] | companion (transition) matrix |
//! | ρ(T) | [`VarDescriptor::spectral_radius()`] | largest eigenvalue modulus |
//! | V | [`unconditional_covariance()`] | solution of `V = T V Tᵗ + Q` |

mod descriptor;
mod error;
mod stability;
mod steady_state;

pub mod linalg;

pub use descriptor::{VarDescriptor, companion_matrix};
pub use error::VarError;
pub use stability::{SpectralRadius, UNIT_ROOT_TOL, spectral_radius};
pub use steady_state::{unconditional_covariance, unconditional_covariance_with_lags};
