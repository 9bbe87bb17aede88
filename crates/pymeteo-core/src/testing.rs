//! Scripted test doubles for the unit tests

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::bot::WeatherBot;
use crate::chime::{Chime, Note};
use crate::climate;
use crate::dispatcher::CommandDispatcher;
use crate::indicator::Indicator;
use crate::network::{Network, NetworkError};
use crate::sensors::{HumidityReadings, PressureReadings, Sensor, SensorError, SensorReadings};
use crate::telegram::{HttpClient, HttpResponse};
use crate::transport::{ChatMessage, Incoming, MessageTransport, OutboundMessage, TransportError};

struct EnvironmentInner {
    temperature_c: f32,
    relative_humidity_pct: f32,
    pressure_hpa: f32,
    fail: bool,
    humidity_reads: usize,
}

/// Shared weather the fake sensors report.
#[derive(Clone)]
pub(crate) struct Environment(Rc<RefCell<EnvironmentInner>>);

impl Environment {
    pub(crate) fn new(temperature_c: f32, relative_humidity_pct: f32, pressure_hpa: f32) -> Self {
        Self(Rc::new(RefCell::new(EnvironmentInner {
            temperature_c,
            relative_humidity_pct,
            pressure_hpa,
            fail: false,
            humidity_reads: 0,
        })))
    }

    pub(crate) fn set_temperature(&self, value: f32) {
        self.0.borrow_mut().temperature_c = value;
    }

    pub(crate) fn set_humidity(&self, value: f32) {
        self.0.borrow_mut().relative_humidity_pct = value;
    }

    pub(crate) fn set_pressure(&self, value: f32) {
        self.0.borrow_mut().pressure_hpa = value;
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }

    pub(crate) fn humidity_reads(&self) -> usize {
        self.0.borrow().humidity_reads
    }
}

fn scripted_failure(sensor: &'static str) -> SensorError {
    SensorError::ReadFailed {
        sensor,
        operation: "measure",
        details: "scripted failure",
    }
}

pub(crate) struct FakeHumiditySensor {
    env: Environment,
}

impl FakeHumiditySensor {
    pub(crate) fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl Sensor for FakeHumiditySensor {
    type Readings = HumidityReadings;

    async fn read(&mut self) -> Result<HumidityReadings, SensorError> {
        let mut env = self.env.0.borrow_mut();
        env.humidity_reads += 1;
        if env.fail {
            return Err(scripted_failure("fake humidity"));
        }
        Ok(HumidityReadings {
            temperature_c: env.temperature_c,
            relative_humidity_pct: env.relative_humidity_pct,
        })
    }
}

pub(crate) struct FakePressureSensor {
    env: Environment,
}

impl FakePressureSensor {
    pub(crate) fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl Sensor for FakePressureSensor {
    type Readings = PressureReadings;

    async fn read(&mut self) -> Result<PressureReadings, SensorError> {
        let env = self.env.0.borrow();
        if env.fail {
            return Err(scripted_failure("fake pressure"));
        }
        Ok(PressureReadings {
            pressure_hpa: env.pressure_hpa,
            altitude_m: climate::altitude_m(env.pressure_hpa),
        })
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakePin(Rc<Cell<bool>>);

impl FakePin {
    pub(crate) fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

/// Queue-backed chat API following the `getUpdates` offset rules: an
/// update stays pending until a later request passes an offset beyond it.
pub(crate) struct FakeTransport {
    queue: VecDeque<Incoming>,
    arrivals: Vec<(usize, Incoming)>,
    fetch_failures: Vec<(usize, TransportError)>,
    fetch_calls: usize,
    pub(crate) bot_status: Result<bool, TransportError>,
    pub(crate) offsets: Vec<Option<i64>>,
    pub(crate) sent: Vec<OutboundMessage>,
    pub(crate) fail_sends: bool,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            arrivals: Vec::new(),
            fetch_failures: Vec::new(),
            fetch_calls: 0,
            bot_status: Ok(true),
            offsets: Vec::new(),
            sent: Vec::new(),
            fail_sends: false,
        }
    }

    fn text(update_id: i64, chat_id: i64, text: &str) -> Incoming {
        Incoming::Message(ChatMessage {
            update_id,
            chat_id,
            text: String::from(text),
        })
    }

    pub(crate) fn push_text(&mut self, update_id: i64, chat_id: i64, text: &str) {
        self.queue.push_back(Self::text(update_id, chat_id, text));
    }

    pub(crate) fn push_unsupported(&mut self, update_id: i64) {
        self.queue.push_back(Incoming::Unsupported { update_id });
    }

    /// Make a message visible from the `call`-th fetch on (1-based).
    pub(crate) fn push_text_at(&mut self, call: usize, update_id: i64, chat_id: i64, text: &str) {
        self.arrivals.push((call, Self::text(update_id, chat_id, text)));
    }

    pub(crate) fn push_unsupported_at(&mut self, call: usize, update_id: i64) {
        self.arrivals.push((call, Incoming::Unsupported { update_id }));
    }

    /// Fail the `call`-th fetch (1-based).
    pub(crate) fn fail_fetch_at(&mut self, call: usize, error: TransportError) {
        self.fetch_failures.push((call, error));
    }

    pub(crate) fn fail_next_fetch(&mut self, error: TransportError) {
        self.fail_fetch_at(self.fetch_calls + 1, error);
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls
    }
}

impl MessageTransport for FakeTransport {
    async fn check_bot(&mut self) -> Result<bool, TransportError> {
        self.bot_status.clone()
    }

    async fn fetch_latest_update(
        &mut self,
        offset: Option<i64>,
    ) -> Result<Option<Incoming>, TransportError> {
        self.fetch_calls += 1;
        self.offsets.push(offset);

        let call = self.fetch_calls;
        let (arrived, later): (Vec<_>, Vec<_>) =
            core::mem::take(&mut self.arrivals).into_iter().partition(|(at, _)| *at <= call);
        self.arrivals = later;
        self.queue.extend(arrived.into_iter().map(|(_, incoming)| incoming));

        if let Some(index) = self.fetch_failures.iter().position(|(at, _)| *at == call) {
            return Err(self.fetch_failures.remove(index).1);
        }

        if let Some(offset) = offset {
            while self.queue.front().is_some_and(|i| i.update_id() < offset) {
                self.queue.pop_front();
            }
        }
        Ok(self.queue.front().cloned())
    }

    async fn send(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Status(500));
        }
        self.sent.push(OutboundMessage::query(chat_id, text));
        Ok(())
    }

    async fn send_private(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::io("connection reset"));
        }
        self.sent.push(OutboundMessage::form(chat_id, text));
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct FakeNetwork {
    link: Rc<Cell<bool>>,
    failures_left: Rc<Cell<u32>>,
    hollow_left: Rc<Cell<u32>>,
    connects: Rc<Cell<u32>>,
}

impl FakeNetwork {
    /// Starts disconnected; the first `failures` connection attempts fail.
    pub(crate) fn new(failures: u32) -> Self {
        Self {
            link: Rc::new(Cell::new(false)),
            failures_left: Rc::new(Cell::new(failures)),
            hollow_left: Rc::new(Cell::new(0)),
            connects: Rc::new(Cell::new(0)),
        }
    }

    /// The next `count` successful connects report `Ok` without an address.
    pub(crate) fn hollow_connects(&self, count: u32) {
        self.hollow_left.set(count);
    }

    pub(crate) fn drop_link(&self, failures: u32) {
        self.link.set(false);
        self.failures_left.set(failures);
    }

    pub(crate) fn connect_attempts(&self) -> u32 {
        self.connects.get()
    }
}

impl Network for FakeNetwork {
    fn is_connected(&self) -> bool {
        self.link.get()
    }

    async fn connect(&mut self) -> Result<(), NetworkError> {
        self.connects.set(self.connects.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(NetworkError::association("auth timeout"));
        }
        if self.hollow_left.get() > 0 {
            self.hollow_left.set(self.hollow_left.get() - 1);
            return Ok(());
        }
        self.link.set(true);
        Ok(())
    }
}

/// Returns immediately; clones share the elapsed total.
#[derive(Clone, Default)]
pub(crate) struct NoopDelay {
    total_ns: Rc<Cell<u64>>,
}

impl NoopDelay {
    pub(crate) fn total_us(&self) -> u64 {
        self.total_ns.get() / 1_000
    }

    pub(crate) fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for NoopDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

/// Records every note played; clones share the record.
#[derive(Clone, Default)]
pub(crate) struct RecordingChime(Rc<RefCell<Vec<Note>>>);

impl RecordingChime {
    pub(crate) fn notes(&self) -> Vec<Note> {
        self.0.borrow().clone()
    }
}

impl Chime for RecordingChime {
    async fn tone(&mut self, note: Note, _duration_ms: u32) {
        self.0.borrow_mut().push(note);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HttpRequest {
    Get(String),
    Post { url: String, body: String },
}

impl HttpRequest {
    pub(crate) fn url(&self) -> &str {
        match self {
            HttpRequest::Get(url) => url,
            HttpRequest::Post { url, .. } => url,
        }
    }
}

pub(crate) struct FakeHttp {
    responses: VecDeque<Result<HttpResponse, TransportError>>,
    pub(crate) requests: Vec<HttpRequest>,
}

impl FakeHttp {
    pub(crate) fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            requests: Vec::new(),
        }
    }

    pub(crate) fn respond(&mut self, status: u16, body: &str) {
        self.responses.push_back(Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn fail(&mut self, error: TransportError) {
        self.responses.push_back(Err(error));
    }

    fn next(&mut self) -> Result<HttpResponse, TransportError> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::io("no scripted response")))
    }
}

impl HttpClient for FakeHttp {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.push(HttpRequest::Get(url.into()));
        self.next()
    }

    async fn post_form(&mut self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        self.requests.push(HttpRequest::Post {
            url: url.into(),
            body: body.into(),
        });
        self.next()
    }
}

pub(crate) type FakeDispatcher = CommandDispatcher<FakeHumiditySensor, FakePressureSensor, FakePin>;

pub(crate) fn dispatcher(env: &Environment, pin: &FakePin) -> FakeDispatcher {
    CommandDispatcher::new(
        SensorReadings::new(
            FakeHumiditySensor::new(env.clone()),
            FakePressureSensor::new(env.clone()),
        ),
        Indicator::new(pin.clone()),
    )
}

pub(crate) type FakeBot = WeatherBot<
    FakeTransport,
    FakeNetwork,
    FakeHumiditySensor,
    FakePressureSensor,
    FakePin,
    NoopDelay,
    RecordingChime,
>;

pub(crate) fn bot(transport: FakeTransport, network: &FakeNetwork, env: &Environment) -> FakeBot {
    bot_with(
        transport,
        network,
        env,
        &NoopDelay::default(),
        &RecordingChime::default(),
    )
}

/// Like [`bot`], keeping handles on the delay and the buzzer.
pub(crate) fn bot_with(
    transport: FakeTransport,
    network: &FakeNetwork,
    env: &Environment,
    delay: &NoopDelay,
    chime: &RecordingChime,
) -> FakeBot {
    WeatherBot::new(
        transport,
        network.clone(),
        dispatcher(env, &FakePin::default()),
        delay.clone(),
        chime.clone(),
        1000,
    )
}
