use chrono::{DateTime, FixedOffset};

use crate::error::HistoryError;
use crate::parser::EventReader;
use crate::store::SessionStore;
use crate::title::parse_timestamp;
use crate::types::{DateRange, EventData, SessionStats};

impl SessionStore {
    /// Aggregate counts over every event of every session log.
    pub fn stats(&self) -> Result<SessionStats, HistoryError> {
        if !self.exists() {
            return Err(HistoryError::StoreAbsent(self.sessions_dir().to_path_buf()));
        }

        let files = self.files();
        let mut stats = SessionStats {
            total_sessions: files.len(),
            ..Default::default()
        };
        let mut earliest: Option<(DateTime<FixedOffset>, String)> = None;
        let mut latest: Option<(DateTime<FixedOffset>, String)> = None;

        for file in &files {
            let events = match EventReader::open(&file.path) {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("Skipping session {}: {:#}", file.session_id, e);
                    continue;
                }
            };

            for event in events {
                stats.total_entries += 1;
                *stats
                    .event_types
                    .entry(event.kind.as_str().to_string())
                    .or_insert(0) += 1;

                if let EventData::SessionStart(ref data) = event.data {
                    if let Some(ref model) = data.selected_model {
                        stats.models_used.insert(model.clone());
                    }
                }

                let Some(ts) = parse_timestamp(&event.timestamp) else {
                    continue;
                };
                if earliest.as_ref().map_or(true, |(e, _)| ts < *e) {
                    earliest = Some((ts, event.timestamp.clone()));
                }
                if latest.as_ref().map_or(true, |(l, _)| ts > *l) {
                    latest = Some((ts, event.timestamp.clone()));
                }
            }
        }

        stats.date_range = DateRange {
            earliest: earliest.map(|(_, raw)| raw),
            latest: latest.map(|(_, raw)| raw),
        };

        Ok(stats)
    }
}
