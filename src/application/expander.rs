//! Expand-to-fixpoint driver for the classification-tree widget
//!
//! Sweeps the rendered tree activating every visible expand control until
//! none remain or the iteration ceiling is hit. The ceiling is a runtime
//! bound, not an error: reconstruction still runs on whatever is rendered.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::error::HarvestResult;
use crate::infrastructure::access::DocumentAccess;
use crate::infrastructure::config::HarvestConfig;

pub struct TreeExpander {
    config: HarvestConfig,
}

impl TreeExpander {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Expand the rendered tree until no expand control is discoverable.
    ///
    /// Returns the number of sweeps performed; callers interested only in
    /// the side effect can ignore it.
    pub async fn expand_all(&self, access: &dyn DocumentAccess) -> HarvestResult<u32> {
        let selector = &self.config.selectors.taxonomy.expand_control;
        let settle = Duration::from_millis(self.config.expansion.settle_ms);
        let ceiling = self.config.expansion.max_iterations;

        for sweep in 0..ceiling {
            let controls = access.query(selector).await?;
            if controls.is_empty() {
                info!("🌲 tree fully expanded after {} sweep(s)", sweep);
                return Ok(sweep);
            }

            debug!("sweep {}: {} expand control(s)", sweep + 1, controls.len());
            for control in &controls {
                // a control can vanish between query and activation when an
                // earlier click re-rendered its branch; re-check right before
                match access.is_visible(control).await {
                    Ok(true) => {
                        if let Err(error) = access.click(control).await {
                            debug!("expand control vanished mid-sweep: {}", error);
                        }
                    }
                    Ok(false) => debug!("skipping invisible expand control"),
                    Err(error) => debug!("expand control unreadable: {}", error),
                }
            }
            access.pause(settle).await;
        }

        warn!(
            "⚠ expansion ceiling of {} sweeps reached, continuing with partial tree",
            ceiling
        );
        Ok(ceiling)
    }
}
