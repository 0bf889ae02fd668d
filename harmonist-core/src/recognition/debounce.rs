/// A cancellable deferred action on logical time.
///
/// Every deadline remembers the generation it was issued under. Both
/// `schedule` and `cancel` bump the generation, so an issued deadline fires
/// only while nothing newer has replaced or cancelled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Debounce {
    delay_ms: u64,
    generation: u64,
    /// (generation at issue, deadline)
    issued: Option<(u64, u64)>,
}

impl Debounce {
    pub fn new(delay_ms: u64) -> Self {
        Debounce {
            delay_ms,
            ..Default::default()
        }
    }

    /// Issue a deadline at `now + delay`, superseding any earlier one; returns its generation
    pub fn schedule(&mut self, now: u64) -> u64 {
        self.generation += 1;
        self.issued = Some((self.generation, now.saturating_add(self.delay_ms)));
        self.generation
    }

    /// Invalidate whatever deadline is outstanding
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    /// Whether a deadline issued under `generation` may still fire
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Take the pending deadline if it has been reached by `now`.
    /// Stale deadlines are discarded without firing.
    pub fn due(&mut self, now: u64) -> Option<u64> {
        let (generation, at) = self.issued?;
        if !self.is_current(generation) {
            self.issued = None;
            return None;
        }
        if at > now {
            return None;
        }
        self.issued = None;
        Some(at)
    }

    /// Time of the pending deadline, if it is still current
    pub fn pending(&self) -> Option<u64> {
        self.issued
            .filter(|&(generation, _)| self.is_current(generation))
            .map(|(_, at)| at)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }
}
