use std::time::Instant;
use tokio::sync::watch;

use crate::render::Bar;

pub struct Countdown {
    total_secs: u64,
}

impl Countdown {
    pub fn new(total_secs: u64) -> Self {
        Countdown { total_secs }
    }

    /// Ticks every 100ms, redrawing the bar from wall-clock elapsed time.
    /// Returns true exactly once, when the full duration has passed; false
    /// when the cancel flag flips first. A cancelled countdown draws
    /// nothing further.
    pub async fn run(&self, bar: &Bar, cancel: watch::Receiver<bool>) -> bool {
        let start = Instant::now();
        loop {
            if *cancel.borrow() {
                return false;
            }

            let elapsed = start.elapsed().as_secs().min(self.total_secs);
            let _ = bar.draw(elapsed);

            if elapsed >= self.total_secs {
                return true;
            }

            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}
