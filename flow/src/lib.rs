// flow/src/lib.rs

//! A small asynchronous step-pipeline engine.
//!
//! A workflow is a [`Pipeline`] of named steps over one shared context type. Each step may carry
//! `before`, `on` and `after` handlers, can be marked optional, and can be skipped by a condition
//! evaluated against the context at run time. Any handler may halt the run early with
//! [`PipelineControl::Stop`].
//!
//! Pipelines are registered in a [`Flow`] registry keyed by their context type, so callers only
//! need to build a context and hand it to [`Flow::run`].

pub mod context_data;
pub mod control;
pub mod error;
pub mod execution;
pub mod pipeline;
pub mod registry;

pub use crate::context_data::ContextData;
pub use crate::control::{PipelineControl, PipelineResult};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::{Handler, Pipeline, SkipCondition, StepDef};
pub use crate::registry::Flow;
