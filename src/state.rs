//! Shared application state for request handlers.

use std::sync::Arc;

use crate::aggregator::HealthAggregator;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds only immutable wiring; every status request builds its report from
/// scratch.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<HealthAggregator>,
}

impl AppState {
    pub fn new(aggregator: HealthAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}
