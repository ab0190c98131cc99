use crate::entity::Entity;
use oxwatch_alert::engine::{alerts_for, evaluate_rules};
use oxwatch_alert::rule::Rule;
use oxwatch_alert::{Alert, EntityKind};
use oxwatch_init::registry::InitRegistry;
use oxwatch_notify::manager::Dispatcher;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Outcome of one sampling cycle across all entities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Entities whose samples were committed and evaluated.
    pub committed: usize,
    /// Entities with a lookup or capture abandoned at the cycle deadline.
    pub timed_out: usize,
    /// Rules that tripped or recovered.
    pub alerts: usize,
}

/// Snapshot of the rules one entity tripped or recovered in a cycle.
struct Notice {
    entity: String,
    kind: EntityKind,
    rules: Vec<Rule>,
}

/// Queue feeding the delivery task. Notices are delivered one at a time in
/// the order they were queued.
struct Outbox {
    tx: mpsc::UnboundedSender<Notice>,
    task: JoinHandle<()>,
}

impl Outbox {
    fn spawn(dispatcher: Arc<Dispatcher>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notice>();
        let task = tokio::spawn(async move {
            while let Some(notice) = rx.recv().await {
                let alerts: Vec<Alert<'_>> = notice
                    .rules
                    .iter()
                    .map(|rule| Alert::new(&notice.entity, notice.kind, rule))
                    .collect();
                dispatcher.dispatch(&alerts).await;
            }
        });
        Self { tx, task }
    }
}

struct EntityOutcome {
    overran: bool,
    notice: Option<Notice>,
}

/// Drives the fixed-period sample, commit, evaluate loop. Alert delivery
/// runs on a separate task so slow actions never hold up sampling.
pub struct Scheduler {
    period: Duration,
    entities: Vec<Entity>,
    inits: InitRegistry,
    dispatcher: Arc<Dispatcher>,
    outbox: Option<Outbox>,
    cycle: u64,
}

impl Scheduler {
    pub fn new(period: Duration, inits: InitRegistry, dispatcher: Dispatcher) -> Self {
        Self {
            period,
            entities: Vec::new(),
            inits,
            dispatcher: Arc::new(dispatcher),
            outbox: None,
            cycle: 0,
        }
    }

    pub fn add(&mut self, entity: impl Into<Entity>) {
        self.entities.push(entity.into());
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Prepares every entity's sources and drops entities whose sources
    /// cannot be prepared.
    pub async fn prepare(&mut self) {
        let mut ready = Vec::with_capacity(self.entities.len());
        for mut entity in std::mem::take(&mut self.entities) {
            match entity.prepare().await {
                Ok(()) => ready.push(entity),
                Err(e) => tracing::error!(
                    entity = entity.name(),
                    error = %e,
                    "Source preparation failed, not monitoring"
                ),
            }
        }
        self.entities = ready;
    }

    /// Runs one cycle. Entities are sampled concurrently and every entity
    /// commits within one period; lookups and captures still pending at the
    /// deadline are abandoned and their metrics left missing. Alerts are
    /// queued for delivery, not awaited.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let deadline = Instant::now() + self.period;
        let inits = &self.inits;
        let outcomes = futures::future::join_all(
            self.entities
                .iter_mut()
                .map(|entity| cycle_entity(entity, inits, deadline)),
        )
        .await;

        let mut report = CycleReport::default();
        for outcome in outcomes {
            report.committed += 1;
            report.timed_out += usize::from(outcome.overran);
            if let Some(notice) = outcome.notice {
                report.alerts += notice.rules.len();
                self.deliver(notice);
            }
        }

        tracing::debug!(
            cycle = self.cycle,
            committed = report.committed,
            timed_out = report.timed_out,
            alerts = report.alerts,
            "Cycle complete"
        );
        self.cycle += 1;
        report
    }

    fn deliver(&mut self, notice: Notice) {
        let dispatcher = &self.dispatcher;
        let outbox = self
            .outbox
            .get_or_insert_with(|| Outbox::spawn(dispatcher.clone()));
        if let Err(mpsc::error::SendError(notice)) = outbox.tx.send(notice) {
            tracing::error!(entity = %notice.entity, "Alert delivery task stopped, dropping alerts");
            self.outbox = None;
        }
    }

    /// Waits up to `limit` for queued alerts to be delivered. Delivery
    /// resumes on a fresh task at the next alert.
    pub async fn flush(&mut self, limit: Duration) -> bool {
        let Some(Outbox { tx, mut task }) = self.outbox.take() else {
            return true;
        };
        drop(tx);
        match tokio::time::timeout(limit, &mut task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Alert delivery task failed");
                false
            }
            Err(_) => {
                tracing::warn!("Alert delivery still pending, abandoning");
                task.abort();
                false
            }
        }
    }

    /// Samples every period until `shutdown` resolves. A cycle in flight at
    /// shutdown is abandoned; alerts already queued get one more period to
    /// be delivered.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            period_secs = self.period.as_secs_f64(),
            entities = self.entities.len(),
            inits = self.inits.systems().len(),
            "Starting sampling loop"
        );

        let mut tick = interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down gracefully");
                    break;
                }
                _ = async {
                    tick.tick().await;
                    self.run_cycle().await
                } => {}
            }
        }

        let period = self.period;
        self.flush(period).await;
    }
}

async fn cycle_entity(entity: &mut Entity, inits: &InitRegistry, deadline: Instant) -> EntityOutcome {
    let sample = entity.sample(inits, deadline).await;
    let kind = entity.kind();
    let (name, rules, history) = entity.evaluation_parts();
    history.commit(sample.batch);
    let notable = evaluate_rules(name, rules, history);

    let alerts = alerts_for(name, kind, rules, &notable);
    let notice = (!alerts.is_empty()).then(|| Notice {
        entity: name.to_string(),
        kind,
        rules: alerts.iter().map(|alert| alert.rule.clone()).collect(),
    });
    EntityOutcome {
        overran: sample.overran > 0,
        notice,
    }
}
