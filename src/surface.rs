//! Display surfaces a camera stream is bound to
//!
//! A surface publishes its "camera on/off" indicator through a watch channel so
//! hosts can mirror it in their UI.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Visual state of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceIndicator {
    /// No stream bound
    Off,
    /// Stream is being acquired
    Waiting,
    /// Stream bound and playing
    Live,
}

impl SurfaceIndicator {
    pub fn is_off(&self) -> bool {
        matches!(self, SurfaceIndicator::Off)
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    id: Arc<str>,
    indicator: Arc<watch::Sender<SurfaceIndicator>>,
}

impl Surface {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        let (tx, _rx) = watch::channel(SurfaceIndicator::Off);
        Self {
            id: id.into(),
            indicator: Arc::new(tx),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn indicator(&self) -> SurfaceIndicator {
        *self.indicator.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceIndicator> {
        self.indicator.subscribe()
    }

    pub(crate) fn set_indicator(&self, indicator: SurfaceIndicator) {
        let previous = self.indicator.send_replace(indicator);
        if previous != indicator {
            log::debug!("Surface {} indicator {:?} -> {:?}", self.id, previous, indicator);
        }
    }
}
