//! Scripted stand-in for the cutscenes and scripts subscribed to arrival actions.

use std::{collections::BTreeMap, time::Duration};

use rail_shooter_core::{seconds, ArrivalAction, Command, Event};

use crate::level::Cue;

/// Plays a timed cue for every triggered arrival action and signals completion
/// once the last cue of a node has finished.
///
/// Only the most recently reached node can be waiting, so cues of earlier
/// nodes that outlast it finish silently.
#[derive(Debug)]
pub(crate) struct CutscenePlayer {
    durations: BTreeMap<ArrivalAction, Duration>,
    default_duration: Duration,
    playing: BTreeMap<usize, Vec<(ArrivalAction, Duration)>>,
    latest: Option<usize>,
    played: usize,
}

impl CutscenePlayer {
    pub(crate) fn new(cues: &[Cue], default_seconds: f32) -> Self {
        Self {
            durations: cues
                .iter()
                .map(|cue| (cue.action.clone(), seconds(cue.seconds)))
                .collect(),
            default_duration: seconds(default_seconds),
            playing: BTreeMap::new(),
            latest: None,
            played: 0,
        }
    }

    /// Number of cues started so far.
    pub(crate) fn played(&self) -> usize {
        self.played
    }

    pub(crate) fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::ArrivalActionTriggered { node, action } => {
                    let duration = self
                        .durations
                        .get(action)
                        .copied()
                        .unwrap_or(self.default_duration);
                    log::info!(
                        "playing '{}' for node {node} ({:.1}s)",
                        action.name(),
                        duration.as_secs_f32()
                    );
                    self.playing
                        .entry(*node)
                        .or_default()
                        .push((action.clone(), duration));
                    self.latest = Some(*node);
                    self.played += 1;
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, out),
                _ => {}
            }
        }
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let mut finished = Vec::new();
        for (node, cues) in &mut self.playing {
            for (action, remaining) in cues.iter_mut() {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    log::debug!("'{}' finished", action.name());
                }
            }
            cues.retain(|(_, remaining)| !remaining.is_zero());
            if cues.is_empty() {
                finished.push(*node);
            }
        }

        for node in finished {
            let _ = self.playing.remove(&node);
            if self.latest == Some(node) {
                out.push(Command::SignalEventComplete);
            } else {
                log::debug!("cues of node {node} ended after the route moved on");
            }
        }
    }
}
