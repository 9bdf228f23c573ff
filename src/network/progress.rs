use log::info;

/// Receives per-item progress from long passes over packets.
pub trait ProgressObserver {
    fn on_start(&mut self, _total: usize) {}
    fn on_item(&mut self, _done: usize, _total: usize) {}
    fn on_finish(&mut self, _total: usize) {}
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Logs a line every `step_percent` percent of the pass.
pub struct LogProgress {
    label: String,
    step_percent: usize,
    next_percent: usize,
}

impl LogProgress {
    pub fn new(label: &str, step_percent: usize) -> Self {
        let step_percent = step_percent.clamp(1, 100);
        Self {
            label: label.to_string(),
            step_percent,
            next_percent: step_percent,
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_start(&mut self, total: usize) {
        self.next_percent = self.step_percent;
        info!("{}: {} packets", self.label, total);
    }

    fn on_item(&mut self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = done * 100 / total;
        if percent >= self.next_percent {
            info!("{}: {}% ({}/{})", self.label, percent, done, total);
            while self.next_percent <= percent {
                self.next_percent += self.step_percent;
            }
        }
    }

    fn on_finish(&mut self, total: usize) {
        info!("{}: complete ({} packets)", self.label, total);
    }
}
