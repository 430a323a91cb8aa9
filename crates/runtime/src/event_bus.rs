/// One entry in the engine's transition trail.
///
/// `seq` is assigned by the bus, starting at 0, so a recorded trail can be
/// compared across runs without wall-clock noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
    capacity: Option<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` of the most recent events.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            seq,
            kind,
            message: message.into(),
        });
        if let Some(cap) = self.capacity {
            if self.events.len() > cap {
                let excess = self.events.len() - cap;
                self.events.drain(0..excess);
            }
        }
        seq
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Events of one kind, in emission order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
