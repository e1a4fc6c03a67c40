use std::time::{Duration, Instant};

use log::{debug, error, info};

use super::backoff::{BackoffConfig, FibonacciBackoff};
use super::cancel::{CANCEL_POLL, CancellationToken};
use super::client::{StateVersion, StateVersionApi};
use crate::error::{Result, Tf2d2Error};

/// Time source for the poll loop
pub trait Clock {
    fn now(&self) -> Instant;

    /// Wait for `duration`, returning early with `Cancelled` if the token fires
    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        let deadline = Instant::now() + duration;
        loop {
            cancel.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(CANCEL_POLL));
        }
    }
}

/// Fetches a workspace's current state once Terraform has processed it
pub struct StateVersionPoller<'a> {
    api: &'a dyn StateVersionApi,
    clock: &'a dyn Clock,
    cancel: CancellationToken,
    backoff: BackoffConfig,
}

impl<'a> StateVersionPoller<'a> {
    pub fn new(
        api: &'a dyn StateVersionApi,
        clock: &'a dyn Clock,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            clock,
            cancel,
            backoff: BackoffConfig::default(),
        }
    }

    /// Download the current state JSON for `organization/workspace`
    pub fn get_state(&self, organization: &str, workspace: &str) -> Result<Vec<u8>> {
        self.cancel.check()?;
        let workspace_id = self
            .guard(self.api.read_workspace(organization, workspace))
            .inspect_err(|e| {
                error!(
                    organization = organization,
                    workspace = workspace,
                    error:% = e;
                    "error reading workspace"
                )
            })?;

        self.cancel.check()?;
        let mut current = self
            .guard(self.api.read_current_state_version(&workspace_id))
            .inspect_err(|e| error!(error:% = e; "error reading current state version"))?;

        if !current.resources_processed {
            current = self
                .wait_until_processed(&workspace_id)
                .inspect_err(|e| {
                    error!(error:% = e; "error waiting for current state version to finish processing")
                })?;
        }

        let url = current.download_url.as_deref().ok_or_else(|| {
            Tf2d2Error::Upstream(format!(
                "state version {} has no download url",
                current.id
            ))
        })?;

        self.cancel.check()?;
        let state = self.guard(self.api.download(url))?;

        info!(
            organization = organization,
            workspace = workspace,
            state_version = current.id.as_str();
            "loaded remote terraform state"
        );
        Ok(state)
    }

    /// A call that fails once the token has fired reports the cancellation
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            if self.cancel.is_cancelled() {
                Tf2d2Error::Cancelled
            } else {
                e
            }
        })
    }

    /// Re-read the descriptor until processed, waiting one backoff step before each read
    fn wait_until_processed(&self, workspace_id: &str) -> Result<StateVersion> {
        let mut backoff = FibonacciBackoff::new(self.backoff, self.clock.now());

        loop {
            let wait = backoff
                .next_interval(self.clock.now())
                .ok_or_else(|| Tf2d2Error::Timeout(self.backoff.max_elapsed))?;

            debug!(wait:? = wait; "state version resources not processed yet");
            self.clock.sleep(wait, &self.cancel)?;
            self.cancel.check()?;

            let current = self.guard(self.api.read_current_state_version(workspace_id))?;
            if current.resources_processed {
                return Ok(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfcloud::client::TfeClient;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use url::Url;

    /// Clock that advances only when slept on
    struct FakeClock {
        start: Instant,
        elapsed: Cell<Duration>,
        sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
                sleeps: RefCell::new(Vec::new()),
            }
        }

        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed.get()
        }

        fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
            cancel.check()?;
            self.sleeps.borrow_mut().push(duration);
            self.elapsed.set(self.elapsed.get() + duration);
            Ok(())
        }
    }

    /// Scripted API: each descriptor read pops the next `processed` flag
    struct FakeApi {
        workspace: Result<String>,
        reads: RefCell<VecDeque<Result<bool>>>,
        read_calls: Cell<usize>,
        downloads: RefCell<Vec<String>>,
        cancel_on_read: Option<(usize, CancellationToken)>,
    }

    impl FakeApi {
        fn new(reads: Vec<Result<bool>>) -> Self {
            Self {
                workspace: Ok("ws-1".to_string()),
                reads: RefCell::new(reads.into()),
                read_calls: Cell::new(0),
                downloads: RefCell::new(Vec::new()),
                cancel_on_read: None,
            }
        }

        fn always_unprocessed() -> Self {
            Self::new(Vec::new())
        }
    }

    impl StateVersionApi for FakeApi {
        fn read_workspace(&self, _organization: &str, _workspace: &str) -> Result<String> {
            match &self.workspace {
                Ok(id) => Ok(id.clone()),
                Err(_) => Err(Tf2d2Error::Upstream("workspace not found".to_string())),
            }
        }

        fn read_current_state_version(&self, workspace_id: &str) -> Result<StateVersion> {
            assert_eq!(workspace_id, "ws-1");
            self.read_calls.set(self.read_calls.get() + 1);

            if let Some((at, token)) = &self.cancel_on_read
                && self.read_calls.get() == *at
            {
                token.cancel();
            }

            let processed = self.reads.borrow_mut().pop_front().unwrap_or(Ok(false))?;
            Ok(StateVersion {
                id: "sv-1".to_string(),
                resources_processed: processed,
                download_url: processed.then(|| "https://archivist/sv-1".to_string()),
            })
        }

        fn download(&self, url: &str) -> Result<Vec<u8>> {
            self.downloads.borrow_mut().push(url.to_string());
            Ok(b"{\"version\":4}".to_vec())
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_processed_on_first_read() {
        let api = FakeApi::new(vec![Ok(true)]);
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, CancellationToken::new());

        let state = poller.get_state("acme", "prod").unwrap();

        assert_eq!(state, b"{\"version\":4}");
        assert_eq!(api.read_calls.get(), 1);
        assert!(clock.sleeps().is_empty());
        assert_eq!(*api.downloads.borrow(), vec!["https://archivist/sv-1"]);
    }

    #[test]
    fn test_retries_follow_backoff() {
        let api = FakeApi::new(vec![Ok(false), Ok(false), Ok(false), Ok(false), Ok(true)]);
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, CancellationToken::new());

        poller.get_state("acme", "prod").unwrap();

        assert_eq!(api.read_calls.get(), 5);
        assert_eq!(clock.sleeps(), vec![secs(2), secs(4), secs(6), secs(7)]);
        assert_eq!(api.downloads.borrow().len(), 1);
    }

    #[test]
    fn test_timeout_without_download() {
        let api = FakeApi::always_unprocessed();
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, CancellationToken::new());

        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Timeout(d) if d == secs(300)));
        assert!(api.downloads.borrow().is_empty());

        let total: Duration = clock.sleeps().iter().sum();
        assert_eq!(total, secs(300));
        // 2 + 4 + 6 + 41 * 7 = 299, then a final 1s wait cut to the budget
        assert_eq!(clock.sleeps().last(), Some(&secs(1)));
        assert_eq!(api.read_calls.get(), clock.sleeps().len() + 1);
    }

    #[test]
    fn test_workspace_error_is_fatal() {
        let mut api = FakeApi::new(vec![Ok(true)]);
        api.workspace = Err(Tf2d2Error::Upstream(String::new()));
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, CancellationToken::new());

        let err = poller.get_state("acme", "missing").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Upstream(_)));
        assert_eq!(api.read_calls.get(), 0);
    }

    #[test]
    fn test_read_error_during_retry_is_fatal() {
        let api = FakeApi::new(vec![
            Ok(false),
            Ok(false),
            Err(Tf2d2Error::Upstream("503".to_string())),
            Ok(true),
        ]);
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, CancellationToken::new());

        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Upstream(_)));
        assert_eq!(api.read_calls.get(), 3);
        assert_eq!(clock.sleeps().len(), 2);
        assert!(api.downloads.borrow().is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let api = FakeApi::new(vec![Ok(true)]);
        let clock = FakeClock::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let poller = StateVersionPoller::new(&api, &clock, cancel);

        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Cancelled));
        assert_eq!(api.read_calls.get(), 0);
    }

    #[test]
    fn test_cancelled_mid_backoff() {
        let cancel = CancellationToken::new();
        let mut api = FakeApi::always_unprocessed();
        api.cancel_on_read = Some((2, cancel.clone()));
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, cancel);

        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Cancelled));
        assert_eq!(api.read_calls.get(), 2);
        assert_eq!(clock.sleeps(), vec![secs(2)]);
    }

    #[test]
    fn test_system_clock_sleep_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        let err = SystemClock.sleep(secs(60), &cancel).unwrap_err();

        assert!(matches!(err, Tf2d2Error::Cancelled));
        assert!(started.elapsed() < secs(1));
    }

    #[test]
    fn test_failed_read_after_cancel_reports_cancelled() {
        let cancel = CancellationToken::new();
        let mut api = FakeApi::new(vec![Err(Tf2d2Error::Upstream("connection reset".to_string()))]);
        api.cancel_on_read = Some((1, cancel.clone()));
        let clock = FakeClock::new();
        let poller = StateVersionPoller::new(&api, &clock, cancel);

        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Cancelled));
        assert!(clock.sleeps().is_empty());
    }

    /// Consume a request head and hand back the stream
    fn read_head(stream: TcpStream) -> TcpStream {
        let mut reader = BufReader::new(stream);
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
        }
        reader.into_inner()
    }

    /// Answer the workspace read, then accept the next request and never reply
    fn serve_workspace_then_hang() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut stream = read_head(stream);
            let body = r#"{"data":{"id":"ws-1"}}"#;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            drop(stream);

            let (stuck, _) = listener.accept().unwrap();
            std::thread::sleep(secs(10));
            drop(stuck);
        });

        Url::parse(&format!("http://{}", address)).unwrap()
    }

    #[test]
    fn test_cancel_interrupts_in_flight_request() {
        let cancel = CancellationToken::new();
        let client = TfeClient::with_base_url(serve_workspace_then_hang(), "secret-token")
            .unwrap()
            .with_cancellation(cancel.clone());
        let poller = StateVersionPoller::new(&client, &SystemClock, cancel.clone());

        let canceller = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            canceller.cancel();
        });

        let started = Instant::now();
        let err = poller.get_state("acme", "prod").unwrap_err();

        assert!(matches!(err, Tf2d2Error::Cancelled), "unexpected error: {}", err);
        assert!(started.elapsed() < secs(5));
    }
}
