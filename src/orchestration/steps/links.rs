use super::{StepContext, StepExecutor};
use crate::orchestration::assembler::rfc3339;
use crate::orchestration::checklist::StepKind;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::records::{LinkCheck, LinkReport, LinkStatus};
use crate::orchestration::state::{StepOutput, TaskState};

/// Probes every source url once. Broken links are reported, not raised.
pub struct LinkVerificationStep;

impl StepExecutor for LinkVerificationStep {
    fn kind(&self) -> StepKind {
        StepKind::Links
    }

    fn run(&self, ctx: &StepContext<'_>, state: &TaskState) -> Result<StepOutput, OrchestratorError> {
        let checked_at = rfc3339(ctx.now);
        let checks = state
            .source_urls()
            .into_iter()
            .map(|url| {
                let probe = ctx.link_verifier.check(&url);
                LinkCheck {
                    status: if probe.reachable {
                        LinkStatus::Active
                    } else {
                        LinkStatus::Broken
                    },
                    http_status: probe.http_status,
                    checked_at: checked_at.clone(),
                    url,
                }
            })
            .collect();
        Ok(StepOutput::Links(LinkReport::from_checks(checks)))
    }
}
