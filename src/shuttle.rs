//! Contour ShuttlePRO v2 input device
//!
//! Opens the controller over USB HID and runs the blocking read loop on a
//! dedicated thread that feeds decoded edge events into a tokio channel.

pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hidapi::{HidApi, HidDevice, HidError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub use report::{DeviceSnapshot, DialDirection, ReportDecoder, ShuttleEvent};

/// USB vendor id of Contour Design
pub const SHUTTLE_VENDOR_ID: u16 = 0x0b33;
/// USB product id of the ShuttlePRO v2
pub const SHUTTLE_PRODUCT_ID: u16 = 0x0030;

const REPORT_BUFFER_LEN: usize = 48;
const READ_TIMEOUT_MS: i32 = 100;

/// Errors raised by the ShuttlePRO device
#[derive(Debug, Error)]
pub enum ShuttleError {
    #[error("no ShuttlePRO v2 found")]
    DeviceNotFound,

    #[error("ShuttlePRO v2 could not be opened: {0}")]
    DeviceNotOpened(#[source] HidError),

    #[error("HID backend initialisation failed: {0}")]
    Init(#[source] HidError),

    #[error("reading from ShuttlePRO v2 failed: {0}")]
    Read(#[source] HidError),

    #[error("ShuttlePRO reader thread could not be started: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ShuttlePRO reader thread panicked")]
    ReaderPanicked,
}

/// An opened ShuttlePRO v2
pub struct ShuttleDevice {
    device: HidDevice,
    product: String,
}

impl ShuttleDevice {
    /// Open the first ShuttlePRO v2 connected to this computer
    pub fn open() -> Result<Self, ShuttleError> {
        let api = HidApi::new().map_err(ShuttleError::Init)?;

        let info = api
            .device_list()
            .find(|d| d.vendor_id() == SHUTTLE_VENDOR_ID && d.product_id() == SHUTTLE_PRODUCT_ID)
            .ok_or(ShuttleError::DeviceNotFound)?;

        let product = info
            .product_string()
            .unwrap_or("ShuttlePRO v2")
            .to_string();

        let device = info
            .open_device(&api)
            .map_err(ShuttleError::DeviceNotOpened)?;
        device
            .set_blocking_mode(true)
            .map_err(ShuttleError::DeviceNotOpened)?;

        info!("Opened {} ({:?})", product, info.path());
        Ok(Self { device, product })
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

/// Information about a connected ShuttlePRO
#[derive(Debug, Clone)]
pub struct DeviceListing {
    pub product: String,
    pub serial: Option<String>,
    pub path: String,
}

/// List every connected ShuttlePRO v2
pub fn list_devices() -> Result<Vec<DeviceListing>, ShuttleError> {
    let api = HidApi::new().map_err(ShuttleError::Init)?;

    Ok(api
        .device_list()
        .filter(|d| d.vendor_id() == SHUTTLE_VENDOR_ID && d.product_id() == SHUTTLE_PRODUCT_ID)
        .map(|d| DeviceListing {
            product: d.product_string().unwrap_or("ShuttlePRO v2").to_string(),
            serial: d.serial_number().map(str::to_string),
            path: d.path().to_string_lossy().into_owned(),
        })
        .collect())
}

/// Anything the read loop can pull raw input reports from
pub trait ReportSource: Send + 'static {
    /// Read one report into `buf`, waiting at most `timeout_ms`.
    /// Returns 0 when nothing arrived in time.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError>;
}

impl ReportSource for ShuttleDevice {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, HidError> {
        self.device.read_timeout(buf, timeout_ms)
    }
}

/// Handle to the read loop thread
pub struct ShuttleReader {
    running: Arc<AtomicBool>,
    thread: JoinHandle<Result<(), ShuttleError>>,
}

impl ShuttleReader {
    /// Start reading `source` on its own thread. Events are pushed into `tx`
    /// in report order; the thread exits when the device fails, the receiver
    /// is dropped, or `stop` is called.
    pub fn spawn<S: ReportSource>(
        source: S,
        tx: mpsc::Sender<ShuttleEvent>,
    ) -> Result<Self, ShuttleError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let thread = thread::Builder::new()
            .name("shuttle-reader".to_string())
            .spawn(move || read_loop(source, tx, flag))
            .map_err(ShuttleError::Spawn)?;

        Ok(Self { running, thread })
    }

    /// Ask the read loop to finish after its current read
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Wait for the read loop and return how it ended
    pub fn join(self) -> Result<(), ShuttleError> {
        self.thread
            .join()
            .map_err(|_| ShuttleError::ReaderPanicked)?
    }
}

fn read_loop<S: ReportSource>(
    mut source: S,
    tx: mpsc::Sender<ShuttleEvent>,
    running: Arc<AtomicBool>,
) -> Result<(), ShuttleError> {
    let mut decoder = ReportDecoder::new();
    let mut buf = [0u8; REPORT_BUFFER_LEN];

    debug!("ShuttlePRO read loop started");

    while running.load(Ordering::Relaxed) {
        let len = source
            .read_report(&mut buf, READ_TIMEOUT_MS)
            .map_err(ShuttleError::Read)?;
        if len == 0 {
            continue;
        }

        for event in decoder.decode(&buf[..len]) {
            if tx.blocking_send(event).is_err() {
                debug!("Event receiver dropped, stopping read loop");
                return Ok(());
            }
        }
    }

    debug!("ShuttlePRO read loop stopped");
    Ok(())
}
