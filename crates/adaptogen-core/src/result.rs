use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Outcome of a single command run.
///
/// Built once by the runner, then either returned to a caller or written to
/// the result cache. Serialized with camelCase keys (`exitCode`, `ranAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub ok: bool,
    pub command: String,
    pub keys: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    #[serde(serialize_with = "serialize_millis")]
    pub ran_at: DateTime<Utc>,
}

/// Current time at the millisecond precision `ranAt` is stored with, so a
/// result read back from the cache compares equal to the one written.
#[must_use]
pub fn completion_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn serialize_millis<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
