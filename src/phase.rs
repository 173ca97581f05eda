use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Countdown {
    pub from: f32,
    pub to: f32,
    pub lead: u32,
}

impl Countdown {
    pub const fn constant(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            lead: 0,
        }
    }

    pub const fn linear(from: f32, to: f32) -> Self {
        Self { from, to, lead: 0 }
    }

    pub const fn with_lead(mut self, lead: u32) -> Self {
        self.lead = lead;
        self
    }

    pub fn value(&self, offset: u32, len: u32) -> f32 {
        if len == 0 {
            return self.to.max(0.0);
        }
        let progress = (offset + self.lead) as f32 / len as f32;
        (self.from - progress * (self.from - self.to)).trunc().max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseSpec<P> {
    pub phase: P,
    pub frames: u32,
    pub countdown: Countdown,
}

impl<P> PhaseSpec<P> {
    pub fn new(phase: P, frames: u32) -> Self {
        Self {
            phase,
            frames,
            countdown: Countdown::constant(0.0),
        }
    }

    pub fn counting(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseCursor<P> {
    pub phase: P,
    pub index: usize,
    pub offset: u32,
    pub len: u32,
}

impl<P> PhaseCursor<P> {
    pub fn is_first_frame(&self) -> bool {
        self.offset == 0
    }

    pub fn progress(&self) -> f32 {
        if self.len == 0 {
            return 1.0;
        }
        self.offset as f32 / self.len as f32
    }
}

#[derive(Clone, Debug)]
pub struct PhaseTable<P> {
    specs: Vec<PhaseSpec<P>>,
    starts: Vec<u32>,
    total: u32,
}

impl<P: Copy> PhaseTable<P> {
    pub fn new(specs: Vec<PhaseSpec<P>>) -> Self {
        let mut starts = Vec::with_capacity(specs.len());
        let mut total = 0u32;
        for spec in &specs {
            starts.push(total);
            total += spec.frames;
        }
        Self {
            specs,
            starts,
            total,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.total
    }

    pub fn resolve(&self, frame: u32) -> Option<PhaseCursor<P>> {
        if frame >= self.total {
            return None;
        }
        // Zero-length phases share their start with the next phase; pick the last
        // phase whose start is <= frame and that actually covers it.
        let index = self
            .starts
            .iter()
            .zip(&self.specs)
            .rposition(|(start, spec)| *start <= frame && frame < start + spec.frames)?;
        let spec = &self.specs[index];
        Some(PhaseCursor {
            phase: spec.phase,
            index,
            offset: frame - self.starts[index],
            len: spec.frames,
        })
    }

    pub fn time_left(&self, frame: u32) -> Option<f32> {
        let cursor = self.resolve(frame)?;
        Some(self.specs[cursor.index].countdown.value(cursor.offset, cursor.len))
    }
}
