use core_types::config::LeadingEdge;

/// Snapshot of the widget taken right after its text or focus changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeContext {
    pub is_open: bool,
    pub has_text: bool,
    /// A trailing fire is still pending from an earlier change.
    pub armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPlan {
    /// Cancel any pending fire; issue nothing.
    Disarm,
    /// (Re)arm the trailing fire, optionally searching right away as well.
    Search { immediate: bool },
}

/// Decide what a text/focus change should trigger.
pub fn plan_change(ctx: ChangeContext, leading: LeadingEdge) -> TriggerPlan {
    if !ctx.is_open || !ctx.has_text {
        return TriggerPlan::Disarm;
    }
    let immediate = match leading {
        LeadingEdge::EveryChange => true,
        LeadingEdge::FirstOfBurst => !ctx.armed,
    };
    TriggerPlan::Search { immediate }
}
