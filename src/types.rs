use std::str::FromStr;
use serde::Deserialize;

/// Behaviour when a watch binding fires again while its previous run is
/// still in flight.
///
/// - `Queue`: remember the trigger and run the binding once more after the
///   current run finishes. Any number of triggers collapse into one rerun
///   (default behaviour).
/// - `Ignore`: drop triggers that arrive while the binding is running.
/// - `Overlap`: start another run immediately, concurrently with the one in
///   flight. Outputs of the two runs may interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Ignore,
    Overlap,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "ignore" => Ok(TriggerWhileRunningBehaviour::Ignore),
            "overlap" => Ok(TriggerWhileRunningBehaviour::Overlap),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\", \"ignore\" or \"overlap\")"
            )),
        }
    }
}

/// What a task does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Select files, run them through transforms, write them under the build root.
    #[default]
    Stage,
    /// Remove the build root.
    Clean,
    /// Ask every connected dev client to reload the page.
    Reload,
}

/// Lifecycle of a dev session. There is no way back to `Idle` short of
/// process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevState {
    Idle,
    Serving,
    Watching,
}
