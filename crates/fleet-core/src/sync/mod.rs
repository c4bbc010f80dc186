use parking_lot::Mutex;
use tracing::debug;

use crate::events::{ListenerId, Listeners};

/// Discrete loading transitions consumed by spinners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingSignal {
    Loading,
    DoneLoading,
}

/// Shared loading state for the search container.
///
/// Several components may hold the indicator at once (a running search and
/// a save in progress). `Loading` is emitted when the first hold is taken and
/// `DoneLoading` when the last one is released, so the two signals always
/// alternate.
pub struct LoadingIndicator {
    holds: Mutex<usize>,
    listeners: Listeners<LoadingSignal>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self {
            holds: Mutex::new(0),
            listeners: Listeners::new(),
        }
    }

    /// Take a hold on the indicator
    pub fn start(&self) {
        let first = {
            let mut holds = self.holds.lock();
            *holds += 1;
            *holds == 1
        };
        if first {
            debug!("Loading started");
            self.listeners.emit(&LoadingSignal::Loading);
        }
    }

    /// Release a hold; releasing an idle indicator does nothing
    pub fn done(&self) {
        let last = {
            let mut holds = self.holds.lock();
            if *holds == 0 {
                return;
            }
            *holds -= 1;
            *holds == 0
        };
        if last {
            debug!("Loading finished");
            self.listeners.emit(&LoadingSignal::DoneLoading);
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.holds.lock() > 0
    }

    pub fn on_signal(&self, callback: impl Fn(&LoadingSignal) + Send + Sync + 'static) -> ListenerId {
        self.listeners.on(callback)
    }

    pub fn off(&self, id: ListenerId) {
        self.listeners.off(id);
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorded(indicator: &LoadingIndicator) -> Arc<Mutex<Vec<LoadingSignal>>> {
        let signals = Arc::new(Mutex::new(Vec::new()));
        let sink = signals.clone();
        indicator.on_signal(move |signal| sink.lock().push(*signal));
        signals
    }

    #[test]
    fn test_signals_alternate_across_overlapping_holds() {
        let indicator = LoadingIndicator::new();
        let signals = recorded(&indicator);

        indicator.start();
        indicator.start();
        assert!(indicator.is_loading());
        indicator.done();
        assert!(indicator.is_loading());
        indicator.done();

        assert!(!indicator.is_loading());
        assert_eq!(
            *signals.lock(),
            vec![LoadingSignal::Loading, LoadingSignal::DoneLoading]
        );
    }

    #[test]
    fn test_done_on_idle_indicator_is_ignored() {
        let indicator = LoadingIndicator::new();
        let signals = recorded(&indicator);

        indicator.done();
        indicator.start();
        indicator.done();
        indicator.done();

        assert_eq!(
            *signals.lock(),
            vec![LoadingSignal::Loading, LoadingSignal::DoneLoading]
        );
    }
}
