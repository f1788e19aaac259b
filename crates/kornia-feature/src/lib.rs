#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera model registry and camera parameter validation.
///
/// See [`camera::verify_camera_params`].
pub mod camera;

/// Image reader and strategy options.
pub mod config;

/// Dispatcher entry points, one per pipeline operation.
///
/// See [`dispatch::Dispatcher`].
pub mod dispatch;

/// A strategy factory that logs the plan of each strategy.
pub mod dry_run;

/// Error types for the pipeline dispatch.
pub mod error;

/// Rendering context ownership and the GPU context runner.
pub mod gpu;

/// Reading of image and match list files.
pub mod io;

/// The pipeline strategies and the factory building their tasks.
pub mod strategy;

/// The `start` / `wait` task contract.
pub mod task;

pub use error::PipelineError;
