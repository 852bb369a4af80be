//! Recording server call.

use aegis_core::MetadataMap;
use aegis_interceptor::{CallError, MethodDescriptor, ServerCall};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tonic::{Code, Status};

/// A close delivered to a [`MockServerCall`].
#[derive(Debug, Clone)]
pub struct RecordedClose {
    /// The status the call was closed with.
    pub status: Status,
    /// The trailers the call was closed with.
    pub trailers: MetadataMap,
}

impl RecordedClose {
    /// Returns the status code.
    #[must_use]
    pub fn code(&self) -> Code {
        self.status.code()
    }

    /// Returns the status message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.status.message()
    }

    /// Returns an ASCII trailer value, if present and valid.
    #[must_use]
    pub fn trailer(&self, key: &str) -> Option<String> {
        self.trailers
            .get(key)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }
}

/// An in-memory [`ServerCall`] recording everything sent through it.
///
/// Like a real transport, it accepts one close; later closes fail with
/// [`CallError::AlreadyClosed`]. It can be told to fail closes to
/// simulate a broken transport.
///
/// # Example
///
/// ```
/// use aegis_core::MetadataMap;
/// use aegis_interceptor::ServerCall;
/// use aegis_test::MockServerCall;
/// use tonic::{Code, Status};
///
/// let call = MockServerCall::<(), String>::unary("echo.Echo/Say");
/// call.send_message("hi".to_string()).unwrap();
/// call.close(Status::ok(""), MetadataMap::new()).unwrap();
///
/// assert_eq!(call.messages(), vec!["hi".to_string()]);
/// assert_eq!(call.last_close().unwrap().code(), Code::Ok);
/// ```
#[derive(Debug)]
pub struct MockServerCall<Req, Resp> {
    descriptor: MethodDescriptor,
    headers: Mutex<Vec<MetadataMap>>,
    messages: Mutex<Vec<Resp>>,
    closes: Mutex<Vec<RecordedClose>>,
    close_attempts: AtomicUsize,
    close_failure: Mutex<Option<CallError>>,
    cancelled: AtomicBool,
    _request: std::marker::PhantomData<fn(Req)>,
}

impl<Req, Resp> MockServerCall<Req, Resp> {
    /// Creates a call for the given method.
    #[must_use]
    pub fn new(descriptor: MethodDescriptor) -> Self {
        Self {
            descriptor,
            headers: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            close_attempts: AtomicUsize::new(0),
            close_failure: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            _request: std::marker::PhantomData,
        }
    }

    /// Creates a shared call for a unary method.
    #[must_use]
    pub fn unary(full_name: &str) -> Arc<Self> {
        Arc::new(Self::new(MethodDescriptor::unary(full_name)))
    }

    /// Makes every following close fail with `error`.
    pub fn fail_close_with(&self, error: CallError) {
        *self.close_failure.lock() = Some(error);
    }

    /// Marks the call as cancelled by the peer.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns the successful closes, in order.
    #[must_use]
    pub fn closes(&self) -> Vec<RecordedClose> {
        self.closes.lock().clone()
    }

    /// Returns the last successful close.
    #[must_use]
    pub fn last_close(&self) -> Option<RecordedClose> {
        self.closes.lock().last().cloned()
    }

    /// Returns the number of close attempts, including failed ones.
    #[must_use]
    pub fn close_attempts(&self) -> usize {
        self.close_attempts.load(Ordering::SeqCst)
    }

    /// Returns the headers sent.
    #[must_use]
    pub fn headers(&self) -> Vec<MetadataMap> {
        self.headers.lock().clone()
    }
}

impl<Req, Resp: Clone> MockServerCall<Req, Resp> {
    /// Returns the messages sent.
    #[must_use]
    pub fn messages(&self) -> Vec<Resp> {
        self.messages.lock().clone()
    }
}

impl<Req, Resp> ServerCall<Req, Resp> for MockServerCall<Req, Resp>
where
    Resp: Send,
{
    fn method_descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    fn send_headers(&self, headers: MetadataMap) -> Result<(), CallError> {
        self.headers.lock().push(headers);
        Ok(())
    }

    fn send_message(&self, message: Resp) -> Result<(), CallError> {
        if !self.closes.lock().is_empty() {
            return Err(CallError::AlreadyClosed);
        }
        self.messages.lock().push(message);
        Ok(())
    }

    fn close(&self, status: Status, trailers: MetadataMap) -> Result<(), CallError> {
        self.close_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.close_failure.lock().clone() {
            return Err(error);
        }
        let mut closes = self.closes.lock();
        if !closes.is_empty() {
            return Err(CallError::AlreadyClosed);
        }
        closes.push(RecordedClose { status, trailers });
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
