//! Beatmix prelude.
//!
//! This module contains the most used types, traits and functions that you can import easily as
//! a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::pipeline::{cluster_records, ClusteringReport, PipelineParams};

#[doc(no_inline)]
pub use crate::table::{Record, RecordTable};

#[doc(no_inline)]
pub use crate::Float;
