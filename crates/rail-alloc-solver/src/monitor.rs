// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    clock::{Clock, SystemClock},
    readiness::ReadinessMonitor,
    realloc::ReallocationEngine,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rail_alloc_model::prelude::*;
use rayon::prelude::*;
use std::{
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Supplies the readiness records a reallocation tick works from.
pub trait ReadinessSource: Send + Sync {
    fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness>;
}

impl<C: Clock> ReadinessSource for ReadinessMonitor<C> {
    fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
        results
            .par_iter()
            .map(|r| self.assess(r.train(), None))
            .collect()
    }
}

impl<R: ReadinessSource + ?Sized> ReadinessSource for Arc<R> {
    fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
        (**self).readiness(results)
    }
}

/// The current plan, shared between the monitor and its readers.
///
/// Writers replace the whole plan at once, so a reader holding the lock sees
/// either the plan before a tick or the plan after it.
#[derive(Debug, Clone)]
pub struct SharedPlan {
    inner: Arc<RwLock<AllocationPlan>>,
}

impl SharedPlan {
    pub fn new(plan: AllocationPlan) -> Self {
        Self {
            inner: Arc::new(RwLock::new(plan)),
        }
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, AllocationPlan> {
        self.inner.read()
    }

    pub fn snapshot(&self) -> AllocationPlan {
        self.inner.read().clone()
    }

    /// Installs `plan` and returns the one it replaced.
    pub fn publish(&self, plan: AllocationPlan) -> AllocationPlan {
        std::mem::replace(&mut *self.inner.write(), plan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    AlreadyRunning,
    /// `start` was called outside a Tokio runtime.
    NoRuntime,
}

impl Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::AlreadyRunning => write!(f, "The real-time monitor is already running"),
            MonitorError::NoRuntime => {
                write!(f, "The real-time monitor needs a Tokio runtime to start")
            }
        }
    }
}

impl std::error::Error for MonitorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

struct TickContext<C, R> {
    engine: ReallocationEngine<C>,
    source: R,
    results: Vec<ScheduleResult>,
    plan: SharedPlan,
    ticks: AtomicU64,
    /// Held from snapshot to publish so ticks never interleave.
    guard: Mutex<()>,
}

impl<C: Clock, R: ReadinessSource> TickContext<C, R> {
    /// Computes the next plan from a snapshot and publishes it unless `cancel`
    /// fired in the meantime.
    fn tick(&self, cancel: &CancellationToken) -> bool {
        let _guard = self.guard.lock();
        if cancel.is_cancelled() {
            return false;
        }
        let current = self.plan.snapshot();
        let readiness = self.source.readiness(&self.results);
        let next = self
            .engine
            .update_real_time_allocation(&current, &readiness, &self.results);
        if cancel.is_cancelled() {
            debug!("Tick cancelled before publishing");
            return false;
        }
        self.plan.publish(next);
        let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tick = n, "Tick published");
        true
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs reallocation ticks on a fixed interval until stopped.
///
/// Ticks never overlap. A tick that is still computing when the monitor is
/// stopped publishes nothing.
pub struct RealTimeMonitor<C = SystemClock, R = ReadinessMonitor<SystemClock>> {
    ctx: Arc<TickContext<C, R>>,
    config: MonitorConfig,
    task: Mutex<Option<RunningTask>>,
}

impl<C, R> RealTimeMonitor<C, R>
where
    C: Clock + 'static,
    R: ReadinessSource + 'static,
{
    pub fn new(
        engine: ReallocationEngine<C>,
        source: R,
        plan: SharedPlan,
        results: Vec<ScheduleResult>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                engine,
                source,
                results,
                plan,
                ticks: AtomicU64::new(0),
                guard: Mutex::new(()),
            }),
            config,
            task: Mutex::new(None),
        }
    }

    #[inline]
    pub fn plan(&self) -> &SharedPlan {
        &self.ctx.plan
    }

    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Number of ticks that published a plan so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ctx.ticks.load(Ordering::Relaxed)
    }

    /// Runs a single tick on the calling thread, waiting for any tick already
    /// in progress to publish first.
    pub fn tick_now(&self) -> bool {
        self.ctx.tick(&CancellationToken::new())
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.cancel.is_cancelled() && !t.handle.is_finished())
    }

    /// Spawns the tick loop on the current Tokio runtime. The first tick fires
    /// one interval after the start.
    #[instrument(
        level = "info",
        skip_all,
        fields(interval_ms = self.config.interval.as_millis() as u64)
    )]
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut task = self.task.lock();
        if task
            .as_ref()
            .is_some_and(|t| !t.cancel.is_cancelled() && !t.handle.is_finished())
        {
            return Err(MonitorError::AlreadyRunning);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let cancel = CancellationToken::new();
        let ctx = Arc::clone(&self.ctx);
        let token = cancel.clone();
        let period = self.config.interval;
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        ctx.tick(&token);
                    }
                }
            }
            debug!("Monitor loop exited");
        });
        *task = Some(RunningTask { cancel, handle });
        info!("Real-time monitor started");
        Ok(())
    }

    /// Cancels the loop. Returns `false` when it was not running.
    pub fn stop(&self) -> bool {
        match self.task.lock().as_ref() {
            Some(t) if !t.cancel.is_cancelled() => {
                t.cancel.cancel();
                info!(ticks = self.ticks(), "Real-time monitor stopped");
                true
            }
            _ => false,
        }
    }

    /// Stops the loop and waits for its task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(t) = task {
            let _ = t.handle.await;
        }
    }
}

impl<C, R> Drop for RealTimeMonitor<C, R> {
    fn drop(&mut self) {
        if let Some(t) = self.task.get_mut().as_ref() {
            t.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, forecast::BayPlanner};
    use chrono::{TimeZone, Utc};
    use rail_alloc_core::position::ShuntingSteps;

    /// Every train fully ready except `bad`.
    fn all_ready_but(results: &[ScheduleResult], bad: &str) -> Vec<TrainReadiness> {
        results
            .iter()
            .map(|r| TrainReadiness {
                id: r.id().clone(),
                is_ready: r.id().as_str() != bad,
                readiness_score: if r.id().as_str() == bad { 20.0 } else { 90.0 },
                cleaning_status: CleaningStatus::Clean,
                branding_hours: 8.0,
                runtime_balance: 250_000.0,
                job_card_status: JobCardStatus::Closed,
                last_updated: Utc.with_ymd_and_hms(2025, 3, 1, 22, 0, 0).unwrap(),
                issues: Vec::new(),
            })
            .collect()
    }

    /// Reports T01 unready and every other train fully ready.
    struct OneBadTrain {
        calls: AtomicU64,
    }

    impl ReadinessSource for OneBadTrain {
        fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            all_ready_but(results, "T01")
        }
    }

    /// Flags T01 on odd calls and T02 on even ones.
    struct Alternating {
        calls: AtomicU64,
    }

    impl ReadinessSource for Alternating {
        fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
            let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            all_ready_but(results, if n % 2 == 1 { "T01" } else { "T02" })
        }
    }

    fn monitor(interval: Duration) -> RealTimeMonitor<FixedClock, OneBadTrain> {
        monitor_with(
            OneBadTrain {
                calls: AtomicU64::new(0),
            },
            interval,
        )
    }

    fn monitor_with<R: ReadinessSource + 'static>(
        source: R,
        interval: Duration,
    ) -> RealTimeMonitor<FixedClock, R> {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 22, 0, 0).unwrap());
        let t1 = Train::builder("T01").build();
        let t2 = Train::builder("T02").build();
        let results = vec![
            ScheduleResult::scored(&t1, Assignment::InService, "s", -1.0, Some(1)),
            ScheduleResult::scored(&t2, Assignment::Standby, "r", -2.0, None),
        ];
        let plan = BayPlanner::new(
            BayConfiguration::default(),
            ForecastParameters::default(),
            clock.clone(),
        )
        .generate_daily_forecast(&results);
        let engine = ReallocationEngine::new(
            BayConfiguration::default(),
            ReadinessMonitor::new(ForecastParameters::default(), clock),
        );
        RealTimeMonitor::new(
            engine,
            source,
            SharedPlan::new(plan),
            results,
            MonitorConfig { interval },
        )
    }

    #[test]
    fn test_tick_now_publishes_next_plan() {
        let m = monitor(Duration::from_secs(5));
        let before = m.plan().snapshot();
        assert!(m.tick_now());
        let after = m.plan().read();
        assert_eq!(after.mode(), PlanMode::RealTime);
        assert_eq!(
            after.bay(&"A1".into()).and_then(BayAssignment::train_id),
            Some(&TrainId::from("T02"))
        );
        assert_eq!(after.changes().len(), before.changes().len() + 1);
        assert_eq!(m.ticks(), 1);
    }

    #[test]
    fn test_cancelled_tick_publishes_nothing() {
        let m = monitor(Duration::from_secs(5));
        let before = m.plan().snapshot();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!m.ctx.tick(&cancel));
        assert_eq!(*m.plan().read(), before);
        assert_eq!(m.ticks(), 0);
    }

    #[test]
    fn test_concurrent_ticks_do_not_lose_changes() {
        let m = monitor_with(
            Alternating {
                calls: AtomicU64::new(0),
            },
            Duration::from_secs(5),
        );
        let before = m.plan().snapshot().changes().len();
        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    barrier.wait();
                    assert!(m.tick_now());
                });
            }
        });

        assert_eq!(m.ticks(), 2);
        let plan = m.plan().read();
        let replacements = plan
            .changes()
            .iter()
            .skip(before)
            .filter(|c| c.kind() == ChangeKind::Replacement)
            .count();
        // T01 leaves A1 on the first tick and comes back on the second.
        assert_eq!(replacements, 2);
        assert_eq!(plan.summary().total_shunting_steps(), ShuntingSteps::new(2));
        assert_eq!(
            plan.bay(&"A1".into()).and_then(BayAssignment::train_id),
            Some(&TrainId::from("T01"))
        );
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let m = monitor(Duration::from_secs(5));
        assert_eq!(m.start(), Err(MonitorError::NoRuntime));
        assert!(!m.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let m = monitor(Duration::from_secs(5));
        m.start().unwrap();
        assert!(m.is_running());
        assert_eq!(m.start(), Err(MonitorError::AlreadyRunning));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(m.ticks(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(m.ticks(), 1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(m.ticks(), 3);

        m.shutdown().await;
        assert!(!m.is_running());
        let plan = m.plan().read();
        assert_eq!(plan.mode(), PlanMode::RealTime);
        assert!(plan.validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_tick() {
        let m = monitor(Duration::from_secs(5));
        m.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(m.stop());
        assert!(!m.stop());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(m.ticks(), 0);
        assert_eq!(m.ctx.source.calls.load(Ordering::Relaxed), 0);
        assert_eq!(m.plan().read().mode(), PlanMode::DailyForecast);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_shutdown() {
        let m = monitor(Duration::from_secs(1));
        m.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        m.shutdown().await;
        let ticks = m.ticks();
        assert_eq!(ticks, 1);

        m.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(m.ticks(), ticks + 1);
        m.shutdown().await;
        // Only the first tick moves a train; T02 stays in A1 afterwards.
        assert_eq!(
            m.plan().read().summary().total_shunting_steps(),
            ShuntingSteps::new(1)
        );
    }
}
