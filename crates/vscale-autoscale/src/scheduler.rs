//! Drives the orchestrator from the rules interval loop and cron entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use vscale_core::{RulesFile, ScaleRule, ScaleSchedule, ShutdownSignal};

use crate::decision::DecisionEngine;
use crate::error::ScaleError;
use crate::orchestrator::{ScaleOutcome, ScalingOrchestrator};

#[derive(Clone)]
pub struct Scheduler {
    orchestrator: Arc<ScalingOrchestrator>,
    engine: Arc<DecisionEngine>,
    rules: Arc<[ScaleRule]>,
    schedule: Arc<[ScaleSchedule]>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<ScalingOrchestrator>,
        engine: Arc<DecisionEngine>,
        rules: RulesFile,
        interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            engine,
            rules: rules.rules.into(),
            schedule: rules.schedule.into(),
            interval,
        }
    }

    /// Run until `shutdown` fires. The first rule cycle runs immediately.
    pub async fn run(self, shutdown: ShutdownSignal) {
        let mut crons = JoinSet::new();
        for entry in self.schedule.iter() {
            match entry.schedule() {
                Ok(schedule) => {
                    debug!(cron = %entry.cron, action = entry.action, "loaded schedule entry");
                    crons.spawn(self.clone().run_cron(entry.clone(), schedule, shutdown.clone()));
                }
                // Validated at load; only reachable for hand-built rules.
                Err(e) => error!(cron = %entry.cron, error = %e, "skipping schedule entry"),
            }
        }

        info!(
            interval_secs = self.interval.as_secs(),
            rules = self.rules.len(),
            schedules = crons.len(),
            "scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    report("rules", self.run_cycle(&shutdown).await);
                }
                _ = shutdown.cancelled() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }

        while crons.join_next().await.is_some() {}
    }

    /// One pass over the rules. Skipped while a scale is running or the
    /// cooldown is active.
    pub async fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<Option<ScaleOutcome>, ScaleError> {
        if self.orchestrator.is_busy() {
            info!("scaling in progress, skipping cycle");
            return Ok(None);
        }
        if let Some(remaining) = self.orchestrator.cooldown_remaining() {
            info!(?remaining, "waiting before scaling again");
            return Ok(None);
        }

        let Some(matched) = self.engine.evaluate_rules(&self.rules).await? else {
            info!("no scaling action needed");
            return Ok(None);
        };
        info!(query = %matched.query, action = matched.action, "rule met");

        if !self.orchestrator.can_scale(matched.action).await? {
            return Ok(None);
        }
        self.orchestrator.execute(matched.action, shutdown).await.map(Some)
    }

    /// Evaluate a fired schedule entry: guard, then the usual gate.
    pub async fn run_schedule_entry(
        &self,
        entry: &ScaleSchedule,
        shutdown: &ShutdownSignal,
    ) -> Result<Option<ScaleOutcome>, ScaleError> {
        info!(cron = %entry.cron, action = entry.action, "considering scheduled scale");

        let (current, ladder) = self
            .orchestrator
            .resize_coordinator()
            .current_and_available()
            .await?;
        if !DecisionEngine::evaluate_schedule(entry, current) {
            info!(
                current = ?ladder.get(current),
                index = current,
                guard = ?entry.if_size.map(|g| g.to_string()),
                "size guard not met, not scaling"
            );
            return Ok(None);
        }

        if !self.orchestrator.can_scale(entry.action).await? {
            return Ok(None);
        }
        self.orchestrator.execute(entry.action, shutdown).await.map(Some)
    }

    async fn run_cron(self, entry: ScaleSchedule, schedule: Schedule, shutdown: ShutdownSignal) {
        let mut after = Local::now();
        loop {
            let Some(next) = schedule.after(&after).next() else {
                warn!(cron = %entry.cron, "schedule has no upcoming fire time");
                return;
            };
            debug!(cron = %entry.cron, %next, "next scheduled fire");
            if shutdown.sleep(until(&next, &Local::now())).await.is_err() {
                return;
            }

            report("schedule", self.run_schedule_entry(&entry, &shutdown).await);
            // Never refire the same slot, and skip slots missed while scaling.
            after = std::cmp::max(next, Local::now());
        }
    }
}

/// Time from `now` until `at`; zero if `at` already passed.
fn until<Tz: TimeZone>(at: &DateTime<Tz>, now: &DateTime<Tz>) -> Duration {
    (at.clone() - now.clone()).to_std().unwrap_or_default()
}

fn report(trigger: &'static str, result: Result<Option<ScaleOutcome>, ScaleError>) {
    match result {
        Ok(Some(outcome)) => info!(trigger, from = %outcome.from, to = %outcome.to, "scaled"),
        Ok(None) => {}
        Err(ScaleError::Cancelled) => info!(trigger, "scale attempt cancelled by shutdown"),
        Err(e) if e.is_informational() => info!(trigger, reason = %e, "not scaling"),
        Err(e) => error!(trigger, error = %e, "scaling attempt failed"),
    }
}
