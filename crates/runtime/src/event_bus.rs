/// One recorded recomputation.
///
/// `step` is the index of the reducer step that produced the event, so a test can
/// ask "what did this one event cause" without caring about earlier history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub step: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only trace of what the orchestrator recomputed and why.
#[derive(Debug, Default)]
pub struct EventBus {
    step: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step index.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Starts a new step; later events are tagged with it.
    pub fn advance(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            step: self.step,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events recorded during the current step.
    pub fn current(&self) -> impl Iterator<Item = &Event> + '_ {
        let step = self.step;
        self.events.iter().filter(move |e| e.step == step)
    }

    /// Kinds recorded during the current step, in emission order.
    pub fn current_kinds(&self) -> Vec<&'static str> {
        self.current().map(|e| e.kind).collect()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
