// ============================================================================
// Resolution - trusted sources settle a question exactly once
// ============================================================================
//
// Open --resolve(outcome)--> Resolved
//
// The first resolution by any trusted source is final. There is no dispute
// window, no re-open path and no cancellation; a second call fails with
// `AlreadyResolved` even when it comes from the original resolver.
//
// ============================================================================

use crate::access::AccessRegistry;
use crate::errors::MarketResult;
use crate::questions::{Question, QuestionLedger};
use crate::types::{Identity, QuestionId, Side};

/// Authorize `caller` and apply `outcome` to the question.
///
/// Checks run in order: trusted source, question exists, still open.
pub fn resolve_question<'q>(
    access: &AccessRegistry,
    questions: &'q mut QuestionLedger,
    caller: &Identity,
    question_id: QuestionId,
    outcome: Side,
) -> MarketResult<&'q Question> {
    access.require_trusted_source(caller, "resolve a question")?;
    questions.mark_resolved(question_id, outcome)
}
