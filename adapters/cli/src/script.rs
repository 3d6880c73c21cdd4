//! Scripted semantic events supplied on the command line.

use std::{collections::VecDeque, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use living_city_core::CityEvent;
use serde_json::{Map, Value};

/// One `TYPE[:ARG]@MS` entry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptedEvent {
    pub(crate) at_ms: u64,
    pub(crate) event: CityEvent,
}

impl FromStr for ScriptedEvent {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (body, at) = raw
            .rsplit_once('@')
            .ok_or_else(|| anyhow!("expected TYPE[:ARG]@MS, got `{raw}`"))?;
        let at_ms: u64 = at
            .trim()
            .parse()
            .with_context(|| format!("invalid event time `{at}`"))?;
        let (event_type, argument) = match body.split_once(':') {
            Some((event_type, argument)) => (event_type.trim(), Some(argument)),
            None => (body.trim(), None),
        };

        let field = match event_type {
            "search" => "query",
            "command_palette_open" => "origin",
            "publish" | "upload" | "alert" => "kind",
            "login" => "method",
            other => bail!("unknown event type `{other}`"),
        };
        let argument = match (event_type, argument) {
            ("alert", None) => Some("ambulance"),
            (_, argument) => argument,
        };

        let mut payload = Map::new();
        let _ = payload.insert("type".to_owned(), Value::from(event_type));
        if let Some(argument) = argument {
            let _ = payload.insert(field.to_owned(), Value::from(argument));
        }
        let _ = payload.insert("ts".to_owned(), Value::from(at_ms));

        let event = CityEvent::from_json(&Value::Object(payload))
            .with_context(|| format!("invalid event `{raw}`"))?;
        Ok(Self { at_ms, event })
    }
}

/// Events waiting for their simulated time, earliest first.
#[derive(Debug, Default)]
pub(crate) struct EventScript {
    pending: VecDeque<ScriptedEvent>,
}

impl EventScript {
    pub(crate) fn new(mut events: Vec<ScriptedEvent>) -> Self {
        events.sort_by_key(|scripted| scripted.at_ms);
        Self {
            pending: events.into(),
        }
    }

    /// Pops every event scheduled at or before `now_ms`.
    pub(crate) fn due(&mut self, now_ms: u64) -> Vec<CityEvent> {
        let mut due = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|scripted| scripted.at_ms <= now_ms)
        {
            if let Some(scripted) = self.pending.pop_front() {
                due.push(scripted.event);
            }
        }
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use living_city_core::{AlertKind, CityEventKind, ContentKind, EventType};

    #[test]
    fn parses_arguments_into_payload_fields() {
        let search: ScriptedEvent = "search:night owls@1200".parse().expect("parses");
        assert_eq!(search.at_ms, 1_200);
        assert_eq!(
            search.event.kind,
            CityEventKind::Search {
                query: "night owls".to_owned()
            }
        );
        assert_eq!(search.event.ts, Some(1_200));

        let upload: ScriptedEvent = "upload:file@0".parse().expect("parses");
        assert_eq!(
            upload.event.kind,
            CityEventKind::Upload {
                kind: Some(ContentKind::File)
            }
        );

        let login: ScriptedEvent = "login@40".parse().expect("parses");
        assert_eq!(login.event.event_type(), EventType::Login);
    }

    #[test]
    fn alerts_default_to_an_ambulance() {
        let alert: ScriptedEvent = "alert@500".parse().expect("parses");
        assert_eq!(
            alert.event.kind,
            CityEventKind::Alert {
                kind: AlertKind::Ambulance
            }
        );
    }

    #[test]
    fn rejects_bad_entries() {
        for raw in ["search@10", "search:x", "fireworks@10", "publish:video@1", "login@soon"] {
            assert!(raw.parse::<ScriptedEvent>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn releases_events_in_time_order() {
        let events = ["alert@900", "search:a@100", "login@100"]
            .into_iter()
            .map(|raw| raw.parse().expect("parses"))
            .collect();
        let mut script = EventScript::new(events);

        assert!(script.due(50).is_empty());
        let first = script.due(100);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].event_type(), EventType::Search);
        assert_eq!(script.len(), 1);
        assert_eq!(script.due(10_000).len(), 1);
        assert_eq!(script.len(), 0);
    }
}
