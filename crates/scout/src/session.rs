//! Device list session
//!
//! The session actor is the single logical owner of the visible snapshot, the
//! refresh pacing, and the permission state machine. Everything that mutates
//! them (user commands, scan completions, host decisions, the periodic
//! ticker) is funnelled through one `tokio::select!` loop, so `select` and
//! `decision` handling can never race.
//!
//! The actor itself never blocks: the enumeration passes it triggers run on
//! the scan thread, and permission checks run on the blocking pool.

use crate::coordinator::PermissionCoordinator;
use crate::permission::PermissionDecision;
use crate::publisher::ResultPublisher;
use crate::scheduler::RefreshScheduler;
use common::{ScanBridge, ScanCommand, ScanEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Inputs accepted by the session actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// The consumer became visible: refresh now and keep refreshing.
    Activate,
    /// The consumer went away: stop scheduling and release the pending
    /// authorization.
    Deactivate,
    /// User asked for an immediate refresh.
    Refresh,
    /// User selected the entry at `index` in the visible list.
    Select { index: usize },
    /// Stop the session.
    Shutdown,
}

/// Cheap cloneable handle for feeding commands to the session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn activate(&self) {
        self.send(SessionCommand::Activate);
    }

    pub fn deactivate(&self) {
        self.send(SessionCommand::Deactivate);
    }

    pub fn refresh(&self) {
        self.send(SessionCommand::Refresh);
    }

    pub fn select(&self, index: usize) {
        self.send(SessionCommand::Select { index });
    }

    pub fn shutdown(&self) {
        self.send(SessionCommand::Shutdown);
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!("session is gone, dropping {command:?}");
        }
    }
}

/// What woke the actor up.
enum Wake {
    Command(Option<SessionCommand>),
    Scan(common::Result<ScanEvent>),
    Decision(PermissionDecision),
    Tick,
}

pub struct DeviceListSession {
    bridge: ScanBridge,
    publisher: ResultPublisher,
    coordinator: PermissionCoordinator,
    scheduler: RefreshScheduler,
    decisions: mpsc::UnboundedReceiver<PermissionDecision>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    refresh_interval: Duration,
}

/// Spawn the session actor onto the current runtime.
pub fn spawn_session(
    bridge: ScanBridge,
    publisher: ResultPublisher,
    coordinator: PermissionCoordinator,
    decisions: mpsc::UnboundedReceiver<PermissionDecision>,
    refresh_interval: Duration,
) -> (SessionHandle, tokio::task::JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let session = DeviceListSession {
        bridge,
        publisher,
        coordinator,
        scheduler: RefreshScheduler::new(),
        decisions,
        commands: command_rx,
        refresh_interval,
    };

    let task = tokio::spawn(session.run());

    (
        SessionHandle {
            commands: command_tx,
        },
        task,
    )
}

impl DeviceListSession {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                event = self.bridge.recv_event() => Wake::Scan(event),
                Some(decision) = self.decisions.recv() => Wake::Decision(decision),
                _ = ticker.tick(), if self.scheduler.is_active() => Wake::Tick,
            };

            match wake {
                Wake::Command(None) | Wake::Command(Some(SessionCommand::Shutdown)) => break,
                Wake::Command(Some(SessionCommand::Activate)) => {
                    // Immediate pass now, periodic passes one full interval
                    // from here.
                    ticker.reset();
                    let slot = self.scheduler.activate();
                    self.start_scan(slot).await;
                }
                Wake::Command(Some(SessionCommand::Deactivate)) => {
                    self.scheduler.deactivate();
                    self.coordinator.cancel_pending();
                }
                Wake::Command(Some(SessionCommand::Refresh)) => {
                    let slot = self.scheduler.request();
                    self.start_scan(slot).await;
                }
                Wake::Command(Some(SessionCommand::Select { index })) => {
                    self.select_entry(index);
                }
                Wake::Scan(Ok(ScanEvent::Completed { snapshot })) => {
                    self.scheduler.completed();
                    self.publisher.publish(snapshot);
                }
                Wake::Scan(Err(e)) => {
                    warn!("scan thread unreachable, stopping session: {e}");
                    break;
                }
                Wake::Decision(decision) => {
                    self.coordinator.on_decision(decision);
                }
                Wake::Tick => {
                    let slot = self.scheduler.tick();
                    self.start_scan(slot).await;
                }
            }
        }

        debug!("session stopped");
    }

    async fn start_scan(&mut self, slot: Option<u64>) {
        let Some(seq) = slot else {
            return;
        };

        if let Err(e) = self.bridge.send_command(ScanCommand::Scan { seq }).await {
            warn!("failed to reach the scan thread: {e}");
            self.scheduler.completed();
        }
    }

    fn select_entry(&mut self, index: usize) {
        let Some(entry) = self.publisher.current().get(index).cloned() else {
            warn!("selection index {index} is out of range");
            return;
        };

        self.coordinator.select(&entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::permission::{CorrelationToken, PermissionService};
    use crate::publisher::SnapshotListener;
    use common::{ScanWorker, create_scan_bridge};
    use probe::{
        DeviceDescriptor, DeviceEntry, DriverBinding, DriverKind, EntrySnapshot, expand_device,
    };
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);
    // Long enough that the periodic ticker never fires during a test.
    const SLOW_INTERVAL: Duration = Duration::from_secs(3600);

    struct ChannelListener {
        tx: mpsc::UnboundedSender<(u64, usize)>,
    }

    impl SnapshotListener for ChannelListener {
        fn on_snapshot_changed(&self, snapshot: &EntrySnapshot, count: usize) {
            let _ = self.tx.send((snapshot.seq(), count));
        }
    }

    struct ChannelPermissions {
        tx: mpsc::UnboundedSender<DeviceDescriptor>,
    }

    impl PermissionService for ChannelPermissions {
        fn request_permission(&self, descriptor: &DeviceDescriptor, _token: CorrelationToken) {
            let _ = self.tx.send(descriptor.clone());
        }
    }

    struct ChannelConsole {
        tx: mpsc::UnboundedSender<(DeviceDescriptor, DriverKind)>,
    }

    impl Console for ChannelConsole {
        fn open(&self, descriptor: &DeviceDescriptor, binding: DriverBinding) {
            let _ = self.tx.send((descriptor.clone(), binding.kind));
        }
    }

    /// Serves canned entries from a plain thread, standing in for the real
    /// scan thread. Every served pass is recorded.
    fn fake_scan_thread(
        worker: ScanWorker,
        entries: Vec<DeviceEntry>,
        served: mpsc::UnboundedSender<u64>,
    ) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            while let Ok(command) = worker.recv_command() {
                match command {
                    ScanCommand::Scan { seq } => {
                        let snapshot = EntrySnapshot::new(seq, entries.clone());
                        let _ = served.send(seq);
                        if worker.send_event(ScanEvent::Completed { snapshot }).is_err() {
                            break;
                        }
                    }
                    ScanCommand::Shutdown => break,
                }
            }
        })
    }

    fn descriptor(address: u8) -> DeviceDescriptor {
        DeviceDescriptor {
            vendor_id: 0x0403,
            product_id: 0x6001,
            bus_number: 1,
            address,
            product: None,
        }
    }

    /// The registry scenario used throughout: entry 0 and 1 are bound,
    /// entry 2 has no driver.
    fn canned_entries() -> Vec<DeviceEntry> {
        let mut entries = expand_device(
            descriptor(1),
            vec![DriverBinding::new(DriverKind::Ftdi)],
        );
        entries.extend(expand_device(
            descriptor(2),
            vec![DriverBinding::new(DriverKind::Cp210x)],
        ));
        entries.extend(expand_device(descriptor(3), vec![]));
        entries
    }

    struct Fixture {
        handle: SessionHandle,
        task: tokio::task::JoinHandle<()>,
        published: mpsc::UnboundedReceiver<(u64, usize)>,
        requests: mpsc::UnboundedReceiver<DeviceDescriptor>,
        opens: mpsc::UnboundedReceiver<(DeviceDescriptor, DriverKind)>,
        decision_tx: mpsc::UnboundedSender<PermissionDecision>,
    }

    fn fixture() -> Fixture {
        let (bridge, worker) = create_scan_bridge();
        let (served_tx, _served_rx) = mpsc::unbounded_channel();
        let _ = fake_scan_thread(worker, canned_entries(), served_tx);

        let (published_tx, published) = mpsc::unbounded_channel();
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (opens_tx, opens) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = mpsc::unbounded_channel();

        let publisher = ResultPublisher::new(Box::new(ChannelListener { tx: published_tx }));
        let coordinator = PermissionCoordinator::new(
            Box::new(ChannelPermissions { tx: requests_tx }),
            Box::new(ChannelConsole { tx: opens_tx }),
        );

        let (handle, task) =
            spawn_session(bridge, publisher, coordinator, decision_rx, SLOW_INTERVAL);

        Fixture {
            handle,
            task,
            published,
            requests,
            opens,
            decision_tx,
        }
    }

    fn grant(address: u8) -> PermissionDecision {
        PermissionDecision {
            descriptor: descriptor(address),
            granted: true,
            token: CorrelationToken::fresh(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn test_activation_publishes_a_snapshot_with_count() {
        let mut f = fixture();

        f.handle.activate();

        let (seq, count) = timeout(WAIT, f.published.recv()).await.unwrap().unwrap();
        assert_eq!(seq, 1);
        assert_eq!(count, 3);

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_select_grant_hand_off_round_trip() {
        let mut f = fixture();
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(0);
        let requested = timeout(WAIT, f.requests.recv()).await.unwrap().unwrap();
        assert_eq!(requested, descriptor(1));

        f.decision_tx.send(grant(1)).unwrap();
        let (opened, kind) = timeout(WAIT, f.opens.recv()).await.unwrap().unwrap();
        assert_eq!(opened, descriptor(1));
        assert_eq!(kind, DriverKind::Ftdi);

        // The grant was consumed; a duplicate is stale and must not re-open.
        f.decision_tx.send(grant(1)).unwrap();
        settle().await;
        assert!(f.opens.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_selecting_driverless_entry_requests_nothing() {
        let mut f = fixture();
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(2);
        settle().await;
        assert!(f.requests.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_range_selection_is_ignored() {
        let mut f = fixture();
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(17);
        settle().await;
        assert!(f.requests.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reselection_discards_the_first_devices_decision() {
        let mut f = fixture();
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(0);
        timeout(WAIT, f.requests.recv()).await.unwrap().unwrap();
        f.handle.select(1);
        let second = timeout(WAIT, f.requests.recv()).await.unwrap().unwrap();
        assert_eq!(second, descriptor(2));

        // Decisions are drained in order: the stale grant for entry 0 first,
        // then the live one for entry 1. Only the latter may open.
        f.decision_tx.send(grant(1)).unwrap();
        f.decision_tx.send(grant(2)).unwrap();

        let (opened, kind) = timeout(WAIT, f.opens.recv()).await.unwrap().unwrap();
        assert_eq!(opened, descriptor(2));
        assert_eq!(kind, DriverKind::Cp210x);
        assert!(f.opens.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_denial_does_not_hand_off() {
        let mut f = fixture();
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(0);
        timeout(WAIT, f.requests.recv()).await.unwrap().unwrap();

        f.decision_tx
            .send(PermissionDecision {
                descriptor: descriptor(1),
                granted: false,
                token: CorrelationToken::fresh(),
            })
            .unwrap();
        settle().await;
        assert!(f.opens.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivation_releases_the_pending_authorization() {
        let mut f = fixture();
        f.handle.activate();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.handle.select(0);
        timeout(WAIT, f.requests.recv()).await.unwrap().unwrap();

        f.handle.deactivate();
        // Commands are processed in order, so once the refresh behind the
        // deactivation has published, the pending slot is already released.
        f.handle.refresh();
        timeout(WAIT, f.published.recv()).await.unwrap().unwrap();

        f.decision_tx.send(grant(1)).unwrap();
        settle().await;
        assert!(f.opens.try_recv().is_err());

        f.handle.shutdown();
        f.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_rapid_refreshes_run_at_most_one_pass() {
        // A bridge whose worker replies only when released, so passes can be
        // held in flight deliberately.
        let (bridge, worker) = create_scan_bridge();
        let (served_tx, mut served) = mpsc::unbounded_channel::<u64>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let _ = std::thread::spawn(move || {
            while let Ok(command) = worker.recv_command() {
                match command {
                    ScanCommand::Scan { seq } => {
                        let _ = served_tx.send(seq);
                        if release_rx.recv().is_err() {
                            break;
                        }
                        let snapshot = EntrySnapshot::new(seq, canned_entries());
                        if worker.send_event(ScanEvent::Completed { snapshot }).is_err() {
                            break;
                        }
                    }
                    ScanCommand::Shutdown => break,
                }
            }
        });

        let (published_tx, mut published) = mpsc::unbounded_channel();
        let (requests_tx, _requests) = mpsc::unbounded_channel();
        let (opens_tx, _opens) = mpsc::unbounded_channel();
        let (_decision_tx, decision_rx) = mpsc::unbounded_channel();

        let publisher = ResultPublisher::new(Box::new(ChannelListener { tx: published_tx }));
        let coordinator = PermissionCoordinator::new(
            Box::new(ChannelPermissions { tx: requests_tx }),
            Box::new(ChannelConsole { tx: opens_tx }),
        );
        let (handle, task) =
            spawn_session(bridge, publisher, coordinator, decision_rx, SLOW_INTERVAL);

        handle.refresh();
        handle.refresh();
        handle.refresh();

        // Exactly one pass reached the worker while it was held in flight.
        let first = timeout(WAIT, served.recv()).await.unwrap().unwrap();
        assert_eq!(first, 1);
        settle().await;
        assert!(served.try_recv().is_err());

        // Once it completes, a new refresh starts the next pass.
        release_tx.send(()).unwrap();
        timeout(WAIT, published.recv()).await.unwrap().unwrap();
        handle.refresh();
        let second = timeout(WAIT, served.recv()).await.unwrap().unwrap();
        assert_eq!(second, 2);

        release_tx.send(()).unwrap();
        handle.shutdown();
        task.await.unwrap();
    }
}
