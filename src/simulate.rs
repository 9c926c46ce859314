//! Scripted timelines for driving a tracker by hand.
//!
//! One step per line, `#` starts a comment:
//!
//! ```text
//! event checkout     # ordinary event, name optional
//! marker             # caller-held session-start marker
//! pause
//! wait 30000         # advance both clocks
//! resume
//! late 1700000000000 # event with a reference timestamp
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use pulse_core::clock::ManualClock;
use pulse_core::events::{EventLog, Log, StartSessionLog};
use pulse_engine::{EnqueueListener, RecordingSink, SessionTracker};

pub const DEFAULT_EVENT_NAME: &str = "event";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Event(String),
    Marker,
    Pause,
    Resume,
    Wait(u64),
    Late(i64),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            bail!("empty step");
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("too many arguments in step: {line}");
        }

        let step = match (command, arg) {
            ("event", name) => Step::Event(name.unwrap_or(DEFAULT_EVENT_NAME).to_string()),
            ("marker", None) => Step::Marker,
            ("pause", None) => Step::Pause,
            ("resume", None) => Step::Resume,
            ("wait", Some(ms)) => Step::Wait(ms.parse().with_context(|| format!("bad wait: {ms}"))?),
            ("late", Some(ms)) => Step::Late(ms.parse().with_context(|| format!("bad late: {ms}"))?),
            ("wait" | "late", None) => bail!("{command} needs milliseconds"),
            ("marker" | "pause" | "resume", Some(_)) => bail!("{command} takes no argument"),
            (other, _) => bail!("unknown step: {other}"),
        };
        Ok(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Event(name) => write!(f, "event {name}"),
            Step::Marker => f.write_str("marker"),
            Step::Pause => f.write_str("pause"),
            Step::Resume => f.write_str("resume"),
            Step::Wait(ms) => write!(f, "wait {ms}"),
            Step::Late(ms) => write!(f, "late {ms}"),
        }
    }
}

/// Parse a script, skipping blank lines and comments.
pub fn parse_script(script: &str) -> Result<Vec<Step>> {
    script
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.split('#').next().unwrap_or_default().trim();
            (!line.is_empty()).then_some((index + 1, line))
        })
        .map(|(number, line)| line.parse().with_context(|| format!("line {number}")))
        .collect()
}

/// Drive `tracker` through `steps`, returning every log in delivery order:
/// markers emitted to `sink` first, then the decorated log that caused them.
pub fn run(
    steps: &[Step],
    tracker: &SessionTracker,
    clock: &Arc<ManualClock>,
    sink: &RecordingSink,
    group: &str,
) -> Result<Vec<Log>> {
    let listener: &dyn EnqueueListener = tracker;
    let mut delivered = Vec::new();

    for step in steps {
        let mut log: Log = match step {
            Step::Event(name) => EventLog::new(name.as_str()).into(),
            Step::Late(toffset) => EventLog::new(DEFAULT_EVENT_NAME).with_toffset(*toffset).into(),
            Step::Marker => StartSessionLog::new().into(),
            Step::Pause => {
                tracker.on_activity_paused();
                continue;
            }
            Step::Resume => {
                tracker.on_activity_resumed();
                continue;
            }
            Step::Wait(ms) => {
                clock.advance(*ms);
                continue;
            }
        };

        listener
            .on_enqueuing_log(&mut log, group)
            .with_context(|| format!("step `{step}`"))?;
        delivered.extend(sink.take().into_iter().map(|(_, marker)| marker));
        delivered.push(log);
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pulse_engine::TrackerConfig;
    use pulse_store::MemoryStore;

    #[test]
    fn parses_steps_and_comments() {
        let steps = parse_script(
            "# warm up\nevent open\n\nmarker\npause # background\nwait 30\nresume\nlate 5\nevent\n",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Event("open".into()),
                Step::Marker,
                Step::Pause,
                Step::Wait(30),
                Step::Resume,
                Step::Late(5),
                Step::Event(DEFAULT_EVENT_NAME.into()),
            ]
        );
    }

    #[test]
    fn rejects_bad_steps() {
        assert!("wait".parse::<Step>().is_err());
        assert!("wait soon".parse::<Step>().is_err());
        assert!("pause now".parse::<Step>().is_err());
        assert!("event a b".parse::<Step>().is_err());
        assert!("jump".parse::<Step>().is_err());

        let err = parse_script("event\nfly\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for step in [Step::Event("x".into()), Step::Wait(3), Step::Late(-1), Step::Pause] {
            assert_eq!(step.to_string().parse::<Step>().unwrap(), step);
        }
    }

    #[test]
    fn run_places_markers_before_their_event() {
        let clock = Arc::new(ManualClock::new(0));
        let sink = Arc::new(RecordingSink::new());
        let tracker = SessionTracker::open(
            TrackerConfig::default().with_session_timeout(Duration::from_millis(20)),
            clock.clone(),
            sink.clone(),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        let steps = parse_script("event a\nwait 30\nevent b\nlate 0\nmarker").unwrap();
        let logs = run(&steps, &tracker, &clock, &sink, "sim").unwrap();

        let types: Vec<&str> = logs.iter().map(Log::log_type).collect();
        assert_eq!(
            types,
            ["start_session", "event", "start_session", "event", "event", "start_session"]
        );
        assert_eq!(logs[0].sid(), logs[1].sid());
        assert_eq!(logs[2].sid(), logs[3].sid());
        assert_ne!(logs[1].sid(), logs[3].sid());
        assert_eq!(logs[4].sid(), logs[1].sid());
        assert_eq!(logs[5].sid(), logs[3].sid());
    }
}
