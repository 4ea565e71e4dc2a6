//! Spectral mesh processing.
//!
//! The modules follow the data flow of a typical session:
//!
//! - **Laplacian**: graph and cotangent operators, fixities
//! - **Spectrum**: eigendecomposition into vibration modes
//! - **Synthesis**: weighted mode sums applied as displacements
//! - **Analysis**: recovering weights from a target shape
//! - **Calibrate**: tuning a modal state to a target surface area
//! - **Morph**: blending two modal shapes mode by mode
//! - **Features**: peak and trough counts per mode
//!
//! [`geometry`] and [`normals`] hold the shared measures and the default
//! displacement directions.

pub mod analysis;
pub mod calibrate;
pub mod features;
pub mod geometry;
pub mod laplacian;
pub mod morph;
pub mod normals;
pub mod spectrum;
pub mod synthesis;
