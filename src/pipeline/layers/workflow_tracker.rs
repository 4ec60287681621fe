//! Workflow tracker (§2's "Workflow tracker" row, §4.3): records the tool
//! call to detect discovery-before-query patterns. Never refuses a call;
//! at most it increments the session's warning counter.

use std::sync::Arc;

use tracing::info;

use crate::context::RequestContext;
use crate::pipeline::{Layer, LayerOutcome, Next, RequestEnvelope};
use crate::session::WorkflowTracker;

pub struct WorkflowTrackerLayer {
    tracker: Arc<WorkflowTracker>,
}

impl WorkflowTrackerLayer {
    pub fn new(tracker: Arc<WorkflowTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait::async_trait]
impl Layer for WorkflowTrackerLayer {
    async fn handle(&self, req: &mut RequestEnvelope, ctx: &mut RequestContext, next: Next<'_>) -> LayerOutcome {
        let tool = req.params.name.clone();
        if self.tracker.is_query(&tool) {
            let status = self.tracker.status(&ctx.session_id);
            if !status.discovered {
                let count = self.tracker.increment_warning(&ctx.session_id);
                info!(session_id = %ctx.session_id, tool = %tool, warning_count = count, "query tool called before any discovery tool");
            }
        }
        self.tracker.record(&ctx.session_id, &tool);
        next.call(req, ctx).await
    }
}
