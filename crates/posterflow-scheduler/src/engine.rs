use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use posterflow_core::config::DeliveryConfig;
use posterflow_store::{CustomerStore, ScheduleRecord, ScheduleStatus, ScheduleStore, StoreError};
use posterflow_whatsapp::MediaSender;

use crate::{media::MediaLocator, window::TickWindow};

/// Outcome counters for one reconciliation tick; consumed by logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Records matched by the due query.
    pub due: usize,
    /// Records transitioned to `Sent`.
    pub sent: usize,
    /// Records transitioned to `Failed`.
    pub failed: usize,
}

/// The dispatch reconciliation loop.
///
/// Every tick queries the schedule store for `Pending` records whose
/// `scheduled_at` falls in the current calendar-minute window and drives each
/// through the delivery state machine, persisting every transition
/// immediately. Records are processed independently — one record's failure
/// never aborts its siblings, and nothing on the dispatch path can crash the
/// host process.
///
/// # Delivery guarantee
///
/// With `delivery.catch_up_minutes = 0` a record is due during exactly one
/// calendar minute. If the process crashes after the adapter accepted the
/// send but before the status write committed — or is simply down for that
/// whole minute — the record is never re-selected: **at most one send per
/// window**, not at-least-once. Setting `catch_up_minutes = N` widens the
/// window start backwards by N minutes, which re-selects such records on
/// later ticks (at-least-once within the N-minute horizon, with the horizon
/// itself bounding how old a missed schedule can be and still send). Ticks
/// are independent; there is no other retry mechanism.
///
/// Running two engines against one store duplicates sends — the loop assumes
/// it is the only writer.
pub struct DispatchEngine {
    schedules: ScheduleStore,
    customers: CustomerStore,
    sender: Arc<dyn MediaSender>,
    window: TickWindow,
    media: MediaLocator,
    tick_interval: std::time::Duration,
    catch_up: chrono::Duration,
}

impl DispatchEngine {
    pub fn new(
        schedules: ScheduleStore,
        customers: CustomerStore,
        sender: Arc<dyn MediaSender>,
        window: TickWindow,
        media: MediaLocator,
        delivery: &DeliveryConfig,
    ) -> Self {
        Self {
            schedules,
            customers,
            sender,
            window,
            media,
            tick_interval: std::time::Duration::from_secs(delivery.tick_secs),
            catch_up: chrono::Duration::minutes(delivery.catch_up_minutes as i64),
        }
    }

    /// Main loop. Ticks on the configured cadence until `shutdown`
    /// broadcasts `true`. Each tick is independent — a failed tick is logged
    /// and the next one fires on schedule.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            tick_secs = self.tick_interval.as_secs(),
            catch_up_minutes = self.catch_up.num_minutes(),
            "dispatch engine started"
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(report) if report.due > 0 => {
                            info!(
                                due = report.due,
                                sent = report.sent,
                                failed = report.failed,
                                "dispatch tick complete"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!("dispatch tick error: {e}"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("dispatch engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One reconciliation pass for the minute containing `now`.
    ///
    /// Public so tests (and operational tooling) can drive the engine with
    /// an explicit reference instant instead of a real timer.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        let (start, end) = self.window.current_tick(now);
        let start = start - self.catch_up;

        let due = self
            .schedules
            .find_due(start, end, &[ScheduleStatus::Pending])?;
        if due.is_empty() {
            debug!("no pending deliveries in this window");
            return Ok(TickReport::default());
        }

        info!(count = due.len(), "processing due deliveries");
        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for record in &due {
            // None means the record could not be resolved against the store
            // at all this tick; it stays Pending and the next tick's query
            // is the only retry.
            let Some(outcome) = self.dispatch_record(record).await else {
                continue;
            };
            match self.schedules.update_status(&record.id, outcome) {
                Ok(()) => match outcome {
                    ScheduleStatus::Sent => report.sent += 1,
                    ScheduleStatus::Failed => report.failed += 1,
                    ScheduleStatus::Pending => {}
                },
                Err(e) => {
                    error!(schedule_id = %record.id, "status write failed: {e}");
                }
            }
        }

        Ok(report)
    }

    /// Drive one record through the state machine. Returns the terminal
    /// status to persist, or `None` when a store error prevented resolution.
    ///
    /// The status is decided only after the adapter call resolves — never
    /// written ahead of it.
    async fn dispatch_record(&self, record: &ScheduleRecord) -> Option<ScheduleStatus> {
        let customer = match self.customers.get(&record.customer_id) {
            Ok(customer) => customer,
            Err(e) => {
                error!(
                    schedule_id = %record.id,
                    customer_id = %record.customer_id,
                    "customer lookup failed, leaving record pending: {e}"
                );
                return None;
            }
        };

        let phone = customer
            .and_then(|c| c.whatsapp)
            .filter(|p| !p.trim().is_empty());
        let Some(phone) = phone else {
            warn!(
                schedule_id = %record.id,
                customer_id = %record.customer_id,
                "customer WhatsApp number not found"
            );
            return Some(ScheduleStatus::Failed);
        };

        let media_url = self.media.poster_url(&record.poster_id);
        match self.sender.send(&phone, &media_url).await {
            Ok(receipt) => {
                info!(
                    schedule_id = %record.id,
                    message_id = %receipt.message_id,
                    "poster sent"
                );
                Some(ScheduleStatus::Sent)
            }
            Err(e) => {
                warn!(schedule_id = %record.id, "poster delivery failed: {e}");
                Some(ScheduleStatus::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use posterflow_store::{NewCustomer, NewScheduleRecord};
    use posterflow_whatsapp::{DeliveryError, MessageReceipt};

    /// Scripted sender: records every call, fails for listed phone numbers.
    struct MockSender {
        calls: Mutex<Vec<(String, String)>>,
        fail_phones: Vec<String>,
    }

    impl MockSender {
        fn new(fail_phones: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_phones: fail_phones.iter().map(|s| s.to_string()).collect(),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl MediaSender for MockSender {
        async fn send(
            &self,
            phone: &str,
            media_url: &str,
        ) -> Result<MessageReceipt, DeliveryError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((phone.to_string(), media_url.to_string()));
            if self.fail_phones.iter().any(|p| p == phone) {
                return Err(DeliveryError::Transport("scripted failure".into()));
            }
            Ok(MessageReceipt {
                message_id: format!("wamid.{}", calls.len()),
            })
        }
    }

    struct Fixture {
        schedules: ScheduleStore,
        customers: CustomerStore,
        sender: Arc<MockSender>,
        engine: DispatchEngine,
    }

    fn fixture(fail_phones: &[&str], delivery: DeliveryConfig) -> Fixture {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let schedules = ScheduleStore::new(Arc::clone(&conn)).unwrap();
        let customers = CustomerStore::new(Arc::clone(&conn)).unwrap();
        let sender = MockSender::new(fail_phones);
        let window = TickWindow::from_config(&delivery).unwrap();
        let engine = DispatchEngine::new(
            schedules.clone(),
            customers.clone(),
            sender.clone(),
            window,
            MediaLocator::new(&delivery.media_base_url),
            &delivery,
        );
        Fixture {
            schedules,
            customers,
            sender,
            engine,
        }
    }

    fn delivery_config() -> DeliveryConfig {
        DeliveryConfig {
            timezone: "+05:30".into(),
            media_base_url: "https://example.com/uploads".into(),
            ..DeliveryConfig::default()
        }
    }

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn add_customer(f: &Fixture, whatsapp: Option<&str>) -> String {
        f.customers
            .insert(&NewCustomer {
                company_name: "Acme Traders".into(),
                whatsapp: whatsapp.map(|s| s.to_string()),
            })
            .unwrap()
            .id
    }

    fn add_schedule(f: &Fixture, customer_id: &str, at: DateTime<Utc>) -> String {
        f.schedules
            .insert_many(&[NewScheduleRecord {
                customer_id: customer_id.into(),
                poster_id: "poster-1".into(),
                category: "Offers".into(),
                scheduled_at: at,
            }])
            .unwrap()
            .remove(0)
            .id
    }

    fn status_of(f: &Fixture, id: &str) -> ScheduleStatus {
        f.schedules
            .find_all()
            .unwrap()
            .into_iter()
            .find(|r| r.id == id)
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn due_record_is_sent_end_to_end() {
        let f = fixture(&[], delivery_config());
        let customer_id = add_customer(&f, Some("9876543210"));
        let schedule_id = add_schedule(&f, &customer_id, instant("2025-01-01T10:00:00+05:30"));

        let report = f
            .engine
            .tick(instant("2025-01-01T10:00:30+05:30"))
            .await
            .unwrap();

        assert_eq!(report, TickReport { due: 1, sent: 1, failed: 0 });
        assert_eq!(status_of(&f, &schedule_id), ScheduleStatus::Sent);

        let calls = f.sender.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "9876543210");
        assert_eq!(calls[0].1, "https://example.com/uploads/posters/poster-1.jpg");
    }

    #[tokio::test]
    async fn record_outside_the_minute_is_not_selected() {
        let f = fixture(&[], delivery_config());
        let customer_id = add_customer(&f, Some("9876543210"));
        add_schedule(&f, &customer_id, instant("2025-01-01T10:00:00+05:30"));

        let report = f
            .engine
            .tick(instant("2025-01-01T10:01:05+05:30"))
            .await
            .unwrap();

        assert_eq!(report, TickReport::default());
        assert!(f.sender.calls().is_empty());
    }

    #[tokio::test]
    async fn sibling_failures_are_isolated() {
        let f = fixture(&["111-fails"], delivery_config());
        let failing = add_customer(&f, Some("111-fails"));
        let healthy = add_customer(&f, Some("2222222222"));
        let at = instant("2025-01-01T10:00:00+05:30");
        let id_a = add_schedule(&f, &failing, at);
        let id_b = add_schedule(&f, &healthy, at);

        let report = f
            .engine
            .tick(instant("2025-01-01T10:00:10+05:30"))
            .await
            .unwrap();

        assert_eq!(report, TickReport { due: 2, sent: 1, failed: 1 });
        assert_eq!(status_of(&f, &id_a), ScheduleStatus::Failed);
        assert_eq!(status_of(&f, &id_b), ScheduleStatus::Sent);
        // Both records got their adapter call despite A's failure.
        assert_eq!(f.sender.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_phone_fails_without_adapter_call() {
        let f = fixture(&[], delivery_config());
        let customer_id = add_customer(&f, None);
        let schedule_id = add_schedule(&f, &customer_id, instant("2025-01-01T10:00:00+05:30"));

        let report = f
            .engine
            .tick(instant("2025-01-01T10:00:30+05:30"))
            .await
            .unwrap();

        assert_eq!(report, TickReport { due: 1, sent: 0, failed: 1 });
        assert_eq!(status_of(&f, &schedule_id), ScheduleStatus::Failed);
        assert!(f.sender.calls().is_empty());
    }

    #[tokio::test]
    async fn dangling_customer_reference_fails_without_adapter_call() {
        let f = fixture(&[], delivery_config());
        let schedule_id = add_schedule(&f, "no-such-customer", instant("2025-01-01T10:00:00+05:30"));

        f.engine
            .tick(instant("2025-01-01T10:00:30+05:30"))
            .await
            .unwrap();

        assert_eq!(status_of(&f, &schedule_id), ScheduleStatus::Failed);
        assert!(f.sender.calls().is_empty());
    }

    #[tokio::test]
    async fn terminal_records_are_never_reselected() {
        let f = fixture(&[], delivery_config());
        let customer_id = add_customer(&f, Some("9876543210"));
        add_schedule(&f, &customer_id, instant("2025-01-01T10:00:00+05:30"));

        let reference = instant("2025-01-01T10:00:30+05:30");
        f.engine.tick(reference).await.unwrap();
        let replay = f.engine.tick(reference).await.unwrap();

        assert_eq!(replay, TickReport::default());
        // Exactly one adapter invocation across both ticks.
        assert_eq!(f.sender.calls().len(), 1);
    }

    #[tokio::test]
    async fn catch_up_window_recovers_missed_minutes() {
        let mut delivery = delivery_config();
        delivery.catch_up_minutes = 10;
        let f = fixture(&[], delivery);
        let customer_id = add_customer(&f, Some("9876543210"));
        // Scheduled 5 minutes before the reference tick — missed under
        // exact-minute matching, recovered with catch_up.
        let schedule_id = add_schedule(&f, &customer_id, instant("2025-01-01T09:55:00+05:30"));

        let report = f
            .engine
            .tick(instant("2025-01-01T10:00:30+05:30"))
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(status_of(&f, &schedule_id), ScheduleStatus::Sent);
    }

    #[tokio::test]
    async fn without_catch_up_a_missed_minute_is_skipped() {
        let f = fixture(&[], delivery_config());
        let customer_id = add_customer(&f, Some("9876543210"));
        let schedule_id = add_schedule(&f, &customer_id, instant("2025-01-01T09:55:00+05:30"));

        let report = f
            .engine
            .tick(instant("2025-01-01T10:00:30+05:30"))
            .await
            .unwrap();

        assert_eq!(report, TickReport::default());
        assert_eq!(status_of(&f, &schedule_id), ScheduleStatus::Pending);
    }
}
