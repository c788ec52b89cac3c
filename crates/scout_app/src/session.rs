use std::time::{Duration, Instant};

use engine_logging::{engine_debug, engine_warn};
use scout_core::{RowId, RowTable};
use scout_engine::{EngineEvent, EngineHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Submits every address as its own row and collects status updates until
/// all rows are terminal, or until the engine stays silent for `quiet_limit`.
pub fn run_session(engine: &EngineHandle, addresses: &[String], quiet_limit: Duration) -> RowTable {
    let mut table = RowTable::new();
    for (index, address) in addresses.iter().enumerate() {
        let row_id = index as RowId + 1;
        if table.request(row_id, address.clone()) {
            engine.enqueue(row_id, address.clone());
        }
    }

    let mut last_event = Instant::now();
    while !table.is_settled() {
        match engine.recv_timeout(POLL_INTERVAL) {
            Some(EngineEvent::StatusChanged { row_id, status }) => {
                last_event = Instant::now();
                if !table.apply(row_id, status) {
                    engine_debug!("Ignored late status {} for row {}", status, row_id);
                }
            }
            None if last_event.elapsed() >= quiet_limit => {
                engine_warn!("Engine silent for {:?}; giving up on unsettled rows", quiet_limit);
                break;
            }
            None => {}
        }
    }
    table
}

/// One output line per row: its symbol, then its address.
pub fn render_rows(table: &RowTable) -> Vec<String> {
    table
        .view()
        .into_iter()
        .map(|row| format!("{}\t{}", row.symbol, row.url))
        .collect()
}
