// flow/src/execution.rs

//! `Pipeline::run()`: walks the steps in order and drives each step's handler phases.

use crate::context_data::ContextData;
use crate::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::{Phase, Pipeline, StepDef};
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks to stop, and the handler's error as soon as one
  /// fails. Later steps never observe a failed step.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let span = info_span!(
        "pipeline_step",
        step_name = %step_def.name,
        step_index,
        optional = step_def.optional
      );
      let control = self.run_step(step_def, ctx_data.clone()).instrument(span).await?;
      if control == PipelineControl::Stop {
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: ContextData<TData>) -> Result<PipelineControl, Err> {
    if let Some(skip_if) = &step_def.skip_if {
      if skip_if(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped by its skip condition.");
        return Ok(PipelineControl::Continue);
      }
    }

    let handlers = match self.handlers.get(&step_def.name).filter(|h| !h.is_empty()) {
      Some(handlers) => handlers,
      None if step_def.optional => {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      None => {
        event!(Level::ERROR, "Required step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }
    };

    for phase in Phase::ORDER {
      for (handler_index, handler_fn) in handlers.phase(phase).iter().enumerate() {
        match handler_fn(ctx_data.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            event!(Level::INFO, phase = phase.label(), handler_index, "Pipeline stopped by handler.");
            return Ok(PipelineControl::Stop);
          }
          Err(e) => {
            event!(Level::ERROR, phase = phase.label(), handler_index, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Step finished.");
    Ok(PipelineControl::Continue)
  }
}
