//! Deletion pass for previously created bot entries.

use chrono::{DateTime, Utc};

use crate::ports::{PortError, TimeTrackingSink};

/// Deletes every entry in the window whose tags include `bot_tag_id`.
///
/// Entries without the tag are left untouched whatever their
/// description or interval. In simulate mode the intended deletions are
/// only logged; no delete call is made.
///
/// Returns the number of entries deleted (or, when simulating, the
/// number that would have been). A failed delete is logged and the pass
/// continues with the remaining entries.
pub async fn purge_day<T: TimeTrackingSink + Send>(
    sink: &mut T,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bot_tag_id: &str,
    simulate: bool,
) -> Result<usize, PortError> {
    let entries = sink.list_entries(start, end).await?;
    let mut deleted = 0;

    for entry in entries {
        if !entry.tag_ids.iter().any(|id| id == bot_tag_id) {
            continue;
        }
        if simulate {
            tracing::info!(
                entry = %entry.id,
                description = %entry.description,
                "simulate: would delete entry"
            );
            deleted += 1;
            continue;
        }
        match sink.delete_entry(&entry.id).await {
            Ok(()) => {
                tracing::info!(
                    entry = %entry.id,
                    description = %entry.description,
                    "deleted entry"
                );
                deleted += 1;
            }
            Err(err) => {
                tracing::error!(
                    entry = %entry.id,
                    error = %err,
                    "failed to delete entry, continuing"
                );
            }
        }
    }

    Ok(deleted)
}
