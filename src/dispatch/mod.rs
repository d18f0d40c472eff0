//! Concurrent rule validation: tier selection, chunk planning, evaluator
//! calls, and per-rule outcome assembly.

mod dispatcher;
mod responses;
mod structural;
mod types;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use responses::{parse_reply, EvaluationRequest, Evaluator, EvaluatorReply};
pub use structural::run_structural_check;
pub use types::{Confidence, ValidationOutcome, Verdict};
