//! `arpin replay`: run a scenario through the simulated pipeline

use crate::scenario::Scenario;
use anyhow::{Context, Result};
use arpin_core::ar::{PlacementPipeline, TapEvent, TickOutcome};
use arpin_core::config::ArConfig;
use arpin_core::sim::{
    DrawCall, HostEvent, RecordingBackend, RecordingHost, SessionEvent, SimSession, SimSessionFactory,
};
use colored::*;
use std::path::Path;

/// What one replayed tick did
#[derive(Debug)]
pub struct TickSummary {
    /// Zero-based tick index
    pub index: usize,
    /// Pipeline result
    pub outcome: TickOutcome,
    /// Backend calls made during the tick
    pub calls: Vec<DrawCall>,
    /// Host calls made during the tick
    pub host_events: Vec<HostEvent>,
    /// Session calls made during the tick
    pub session_events: Vec<SessionEvent>,
}

/// Replay every tick of `scenario`
pub fn run(config: &ArConfig, scenario: &Scenario) -> Result<Vec<TickSummary>> {
    let mut pipeline = PlacementPipeline::<SimSession>::new(config)?;
    let mut factory = SimSessionFactory::new(scenario.world.clone());
    let mut backend = RecordingBackend::default();
    let mut host = RecordingHost::default();

    pipeline
        .on_surface_created(&mut backend)
        .context("Failed to create render surface")?;
    pipeline.on_surface_changed(scenario.screen[0], scenario.screen[1]);
    pipeline
        .on_resume(&mut factory, &mut host)
        .context("Failed to start tracking session")?;
    let taps = pipeline.tap_sender();

    let mut summaries = Vec::with_capacity(scenario.ticks.len());
    for (index, tick) in scenario.ticks.iter().enumerate() {
        if let Some(rotation) = tick.rotation {
            pipeline.set_display_rotation(rotation);
        }
        if let Some(session) = pipeline.session_mut() {
            tick.apply(session.world_mut());
        }
        if let Some(position) = tick.tap {
            if !taps.offer(TapEvent::new(position)) {
                log::debug!("Tick {}: tap at {:?} dropped", index, position);
            }
        }

        backend.take_calls();
        if let Some(session) = pipeline.session() {
            session.take_events();
        }
        let outcome = pipeline.on_draw_frame(&mut backend, &mut host);
        let session_events = pipeline.session().map(SimSession::take_events).unwrap_or_default();
        summaries.push(TickSummary {
            index,
            outcome,
            calls: backend.take_calls(),
            host_events: host.take_events(),
            session_events,
        });
    }
    Ok(summaries)
}

/// Load, replay and print a scenario
pub fn execute(config: &ArConfig, path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    log::info!("Replaying {} ({} ticks)", path.display(), scenario.ticks.len());
    let summaries = run(config, &scenario)?;
    for summary in &summaries {
        println!("{}", format_summary(summary));
        for event in &summary.host_events {
            match event {
                HostEvent::ShowMessage(message) | HostEvent::Notify(message) => {
                    println!("        {} {}", "message:".dimmed(), message)
                }
                HostEvent::HideMessage => println!("        {}", "message cleared".dimmed()),
                HostEvent::KeepScreenOn(on) => println!("        {} {}", "keep screen on:".dimmed(), on),
            }
        }
    }

    let rendered = summaries.iter().filter(|s| s.outcome.is_rendered()).count();
    println!();
    println!(
        "{} {} of {} ticks rendered",
        "Done:".green().bold(),
        rendered,
        summaries.len()
    );
    Ok(())
}

fn format_summary(summary: &TickSummary) -> String {
    let label = format!("tick {:>3}", summary.index);
    match &summary.outcome {
        TickOutcome::NoSession => format!("{} {}", label, "no session".yellow()),
        TickOutcome::NoFrame(err) => format!("{} {} {}", label, "no frame".yellow(), err),
        TickOutcome::Paused => format!("{} {}", label, "paused".yellow()),
        TickOutcome::Abandoned(err) => format!("{} {} {}", label, "abandoned".red(), err),
        TickOutcome::Rendered(report) => {
            let objects: Vec<_> = report.objects_drawn.iter().map(|slot| slot.name()).collect();
            let mut line = format!(
                "{} {} planes={} objects=[{}] calls={}",
                label,
                "rendered".green(),
                report.planes_drawn,
                objects.join(", "),
                summary.calls.len()
            );
            if let Some(slot) = report.placed {
                line.push_str(&format!(" {} {}", "placed".cyan(), slot));
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpin_core::ar::ObjectSlot;

    const TAP_ON_PLANE: &str = include_str!("../../scenarios/tap_on_plane.json");

    #[test]
    fn test_bundled_scenario_replays() {
        let scenario = Scenario::parse(TAP_ON_PLANE).unwrap();
        let summaries = run(&ArConfig::default(), &scenario).unwrap();
        assert_eq!(summaries.len(), 8);

        assert!(summaries[0].outcome.report().unwrap().objects_drawn.is_empty());
        assert_eq!(summaries[1].outcome.report().unwrap().placed, Some(ObjectSlot::Viking));
        assert_eq!(summaries[2].outcome.report().unwrap().objects_drawn, vec![ObjectSlot::Viking]);
        assert_eq!(summaries[3].outcome, TickOutcome::Paused);
        assert!(summaries[3]
            .host_events
            .contains(&HostEvent::ShowMessage("Too dark. Try moving to a well-lit area.".to_string())));
        assert_eq!(summaries[4].outcome.report().unwrap().objects_drawn, vec![ObjectSlot::Viking]);
        assert_eq!(summaries[5].outcome.report().unwrap().placed, Some(ObjectSlot::Viking));
        assert!(summaries[7].outcome.is_rendered());
    }

    #[test]
    fn test_session_events_are_per_tick() {
        let scenario = Scenario::parse(TAP_ON_PLANE).unwrap();
        let summaries = run(&ArConfig::default(), &scenario).unwrap();

        let creates = |summary: &TickSummary| {
            summary
                .session_events
                .iter()
                .filter(|e| matches!(e, SessionEvent::CreateAnchor(_)))
                .count()
        };
        assert_eq!(creates(&summaries[1]), 1);
        assert_eq!(creates(&summaries[2]), 0);
        assert!(summaries[1].session_events.contains(&SessionEvent::HitTest(glam::Vec2::new(240.0, 480.0))));
        assert!(summaries
            .iter()
            .all(|s| s.session_events.iter().filter(|e| matches!(e, SessionEvent::Update(_))).count() == 1));
    }

    #[test]
    fn test_summary_line_names_placed_slot() {
        colored::control::set_override(false);
        let scenario = Scenario::parse(TAP_ON_PLANE).unwrap();
        let summaries = run(&ArConfig::default(), &scenario).unwrap();
        let line = format_summary(&summaries[1]);
        assert!(line.starts_with("tick   1 rendered planes=1 objects=[viking]"), "{line}");
        assert!(line.ends_with("placed viking"), "{line}");
    }
}
