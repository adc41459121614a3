//! `beatmix` groups geolocated records into spatial clusters.
//!
//! Every record carries a `latitude`, a `longitude` and a beat code, the category of the patrol
//! area it was reported in. The number of clusters is derived from the data: one per distinct
//! beat code, or, when a minimum and a maximum cluster size are given, a count that keeps the
//! average cluster within those sizes. The positions are then fitted with a
//! [Gaussian mixture](gaussian_mixture::GaussianMixtureModel) and each record is assigned to its
//! most likely component.
//!
//! ## The pipeline
//!
//! A request goes through five stages, each in its own module:
//!
//! * [`schema`] checks the required columns and lower-cases the column names,
//! * [`beat_code`] finds the beat code column and normalizes its values,
//! * [`cluster_count`] derives the number of clusters,
//! * [`clustering`] fits the mixture and writes the `cluster` column,
//! * [`materialize`] turns the table back into records.
//!
//! [`cluster_records`] runs all of them with the default settings; [`PipelineParams`] exposes
//! the seed, the resource limits and the convergence settings, and also reports what each
//! cluster holds.
//!
//! ```
//! use beatmix::prelude::*;
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"latitude": 41.88, "longitude": -87.63, "beatcode": "0111"}),
//!     json!({"latitude": 41.89, "longitude": -87.62, "beatcode": "0111"}),
//!     json!({"latitude": 41.75, "longitude": -87.55, "beatcode": "0421"}),
//!     json!({"latitude": 41.76, "longitude": -87.56, "beatcode": "0421"}),
//! ];
//! let records = records
//!     .into_iter()
//!     .filter_map(|record| record.as_object().cloned())
//!     .collect();
//!
//! let report = PipelineParams::new()
//!     .run(RecordTable::from_records(records))
//!     .unwrap();
//! assert_eq!(report.n_clusters, 2);
//! assert_eq!(report.records[0]["cluster"], report.records[1]["cluster"]);
//! ```
//!
//! The building blocks are usable on their own: the mixture model and its k-means
//! initialization follow the usual checked-hyperparameters pattern (see [`param_guard`]) and
//! the [`Fit`](traits::Fit)/[`Predict`](traits::Predict) traits.

pub mod beat_code;
pub mod cluster_count;
pub mod clustering;
pub mod error;
mod float;
pub mod gaussian_mixture;
pub mod generate;
pub mod k_means;
pub mod materialize;
pub mod param_guard;
pub mod pipeline;
pub mod prelude;
pub mod schema;
pub mod table;
pub mod traits;

pub use error::{Error, Result};
pub use float::Float;
pub use pipeline::{cluster_records, ClusteringReport, PipelineParams};
pub use table::{Record, RecordTable};
