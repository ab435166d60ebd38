//! Celery entrypoints: task decorators and signal hooks.

use super::{first_decorator_match, EntrypointRule, RuleCtx};
use crate::Symbol;

const DECORATORS: &[&str] = &[
    "*.task",
    "shared_task",
    "*.on_after_configure.connect",
    // Signal receivers; the authoritative signal list is configuration, this
    // is the default set.
    "task_prerun.connect",
    "task_postrun.connect",
    "task_success.connect",
    "task_failure.connect",
    "task_retry.connect",
    "task_revoked.connect",
    "task_received.connect",
    "worker_init.connect",
    "worker_ready.connect",
    "worker_shutdown.connect",
    "worker_process_init.connect",
    "beat_init.connect",
    "celeryd_init.connect",
    "setup_logging.connect",
    "after_setup_logger.connect",
    "after_setup_task_logger.connect",
];

pub struct CeleryRule;

impl EntrypointRule for CeleryRule {
    fn name(&self) -> &'static str {
        "celery"
    }

    fn decorator_patterns(&self) -> &'static [&'static str] {
        DECORATORS
    }

    fn inspect(&self, symbol: &Symbol, _ctx: &RuleCtx<'_>) -> Option<String> {
        first_decorator_match(DECORATORS, &symbol.decorators)
            .map(|pattern| format!("celery:{pattern}"))
    }
}
