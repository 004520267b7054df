use crate::envelope::StageResult;
use async_trait::async_trait;

/// A unit of work in the pipeline.
///
/// Stages never return `Err`; every failure is folded into
/// [`StageResult::Failure`] at the stage boundary.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Returns the name of the stage, used as a log field.
    fn name(&self) -> &str;

    async fn execute(&self, input: Self::Input) -> StageResult<Self::Output>;
}
