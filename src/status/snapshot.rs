//! Typed replica status record.
//!
//! The server returns dozens of loosely typed columns whose names changed
//! between MySQL releases. [`StatusSnapshot::from_columns`] picks out the
//! fields the monitor cares about so nothing downstream deals in column names.

use serde::{Deserialize, Serialize};

/// Column names shown in reports, in display order.
pub const KEY_FIELDS: [&str; 10] = [
    "Replica_IO_State",
    "Source_Host",
    "Source_Port",
    "Replica_IO_Running",
    "Replica_SQL_Running",
    "Replicate_Do_DB",
    "Replicate_Ignore_DB",
    "Last_IO_Error",
    "Last_SQL_Error",
    "Seconds_Behind_Source",
];

/// One snapshot of replica status, immutable for the cycle that fetched it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub io_state: Option<String>,
    pub source_host: Option<String>,
    pub source_port: Option<String>,
    pub io_running: Option<String>,
    pub sql_running: Option<String>,
    pub do_db: Option<String>,
    pub ignore_db: Option<String>,
    pub last_io_error: Option<String>,
    pub last_sql_error: Option<String>,
    /// Replication lag in seconds; `None` when the server reports NULL or
    /// something that is not a whole number of seconds.
    pub seconds_behind: Option<u64>,
    /// The lag column exactly as the server sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_behind_raw: Option<String>,
}

impl StatusSnapshot {
    /// Build a snapshot from `(column name, value)` pairs.
    ///
    /// Accepts both the current `SHOW REPLICA STATUS` names and the legacy
    /// `SHOW SLAVE STATUS` names. Unknown columns are ignored.
    pub fn from_columns<I, K>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        let mut snapshot = Self::default();
        for (name, value) in columns {
            match name.as_ref() {
                "Replica_IO_State" | "Slave_IO_State" => snapshot.io_state = value,
                "Source_Host" | "Master_Host" => snapshot.source_host = value,
                "Source_Port" | "Master_Port" => snapshot.source_port = value,
                "Replica_IO_Running" | "Slave_IO_Running" => snapshot.io_running = value,
                "Replica_SQL_Running" | "Slave_SQL_Running" => snapshot.sql_running = value,
                "Replicate_Do_DB" => snapshot.do_db = value,
                "Replicate_Ignore_DB" => snapshot.ignore_db = value,
                "Last_IO_Error" => snapshot.last_io_error = value,
                "Last_SQL_Error" => snapshot.last_sql_error = value,
                "Seconds_Behind_Source" | "Seconds_Behind_Master" => {
                    snapshot.seconds_behind = value.as_deref().and_then(parse_lag);
                    snapshot.seconds_behind_raw = value;
                }
                _ => {}
            }
        }
        snapshot
    }

    /// The key fields paired with their display names, in [`KEY_FIELDS`] order.
    ///
    /// The lag is rendered as its number of seconds. A value the server sent
    /// that is not a number of seconds is shown as received, and NULL as `None`.
    pub fn fields(&self) -> [(&'static str, Option<String>); 10] {
        [
            (KEY_FIELDS[0], self.io_state.clone()),
            (KEY_FIELDS[1], self.source_host.clone()),
            (KEY_FIELDS[2], self.source_port.clone()),
            (KEY_FIELDS[3], self.io_running.clone()),
            (KEY_FIELDS[4], self.sql_running.clone()),
            (KEY_FIELDS[5], self.do_db.clone()),
            (KEY_FIELDS[6], self.ignore_db.clone()),
            (KEY_FIELDS[7], self.last_io_error.clone()),
            (KEY_FIELDS[8], self.last_sql_error.clone()),
            (KEY_FIELDS[9], self.lag_display()),
        ]
    }

    fn lag_display(&self) -> Option<String> {
        match self.seconds_behind {
            Some(secs) => Some(secs.to_string()),
            None => self
                .seconds_behind_raw
                .as_deref()
                .map(str::trim)
                .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("NULL"))
                .map(str::to_string),
        }
    }

    /// True when the IO thread reports `Yes`.
    pub fn io_thread_running(&self) -> bool {
        is_yes(self.io_running.as_deref())
    }

    /// True when the SQL thread reports `Yes`.
    pub fn sql_thread_running(&self) -> bool {
        is_yes(self.sql_running.as_deref())
    }

    /// The last SQL error, if the server reports a non-empty one.
    pub fn sql_error(&self) -> Option<&str> {
        non_empty(self.last_sql_error.as_deref())
    }

    /// The last IO error, if the server reports a non-empty one.
    pub fn io_error(&self) -> Option<&str> {
        non_empty(self.last_io_error.as_deref())
    }
}

fn parse_lag(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NULL") {
        return None;
    }
    raw.parse().ok()
}

fn is_yes(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("yes"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, value: &str) -> (String, Option<String>) {
        (name.to_string(), Some(value.to_string()))
    }

    #[test]
    fn test_from_current_columns() {
        let snapshot = StatusSnapshot::from_columns(vec![
            col("Replica_IO_State", "Waiting for source to send event"),
            col("Source_Host", "primary.internal"),
            col("Source_Port", "3306"),
            col("Replica_IO_Running", "Yes"),
            col("Replica_SQL_Running", "No"),
            col("Last_SQL_Error", "Coordinator stopped because there were error(s)"),
            col("Seconds_Behind_Source", "42"),
            col("Relay_Log_Space", "12345"),
        ]);

        assert_eq!(snapshot.source_host.as_deref(), Some("primary.internal"));
        assert_eq!(snapshot.seconds_behind, Some(42));
        assert!(snapshot.io_thread_running());
        assert!(!snapshot.sql_thread_running());
        assert!(snapshot.sql_error().is_some());
        assert!(snapshot.io_error().is_none());
    }

    #[test]
    fn test_from_legacy_columns() {
        let snapshot = StatusSnapshot::from_columns(vec![
            col("Slave_IO_State", "Waiting for master to send event"),
            col("Master_Host", "old-primary"),
            col("Slave_SQL_Running", "Yes"),
            col("Seconds_Behind_Master", "7"),
        ]);

        assert_eq!(snapshot.io_state.as_deref(), Some("Waiting for master to send event"));
        assert_eq!(snapshot.source_host.as_deref(), Some("old-primary"));
        assert!(snapshot.sql_thread_running());
        assert_eq!(snapshot.seconds_behind, Some(7));
    }

    #[test]
    fn test_unusable_lag_values_are_unknown() {
        for raw in ["NULL", "", "  ", "-3", "soon"] {
            let snapshot = StatusSnapshot::from_columns(vec![col("Seconds_Behind_Source", raw)]);
            assert_eq!(snapshot.seconds_behind, None, "raw value {:?}", raw);
        }

        let snapshot =
            StatusSnapshot::from_columns(vec![("Seconds_Behind_Source".to_string(), None)]);
        assert_eq!(snapshot.seconds_behind, None);
    }

    #[test]
    fn test_unparsed_lag_keeps_server_text() {
        let snapshot = StatusSnapshot::from_columns(vec![col("Seconds_Behind_Source", "soon")]);
        assert_eq!(snapshot.seconds_behind, None);
        assert_eq!(snapshot.seconds_behind_raw.as_deref(), Some("soon"));
        assert_eq!(snapshot.fields()[9].1.as_deref(), Some("soon"));

        let snapshot = StatusSnapshot::from_columns(vec![col("Seconds_Behind_Source", "-3")]);
        assert_eq!(snapshot.fields()[9].1.as_deref(), Some("-3"));

        let snapshot = StatusSnapshot::from_columns(vec![col("Seconds_Behind_Source", "NULL")]);
        assert_eq!(snapshot.seconds_behind_raw.as_deref(), Some("NULL"));
        assert_eq!(snapshot.fields()[9].1, None);

        let snapshot = StatusSnapshot::from_columns(vec![col("Seconds_Behind_Source", "42")]);
        assert_eq!(snapshot.fields()[9].1.as_deref(), Some("42"));
    }

    #[test]
    fn test_fields_follow_display_order() {
        let snapshot = StatusSnapshot {
            seconds_behind: Some(5),
            ..Default::default()
        };
        let fields = snapshot.fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, KEY_FIELDS.to_vec());
        assert_eq!(fields[9].1.as_deref(), Some("5"));
        assert!(fields[0].1.is_none());
    }
}
