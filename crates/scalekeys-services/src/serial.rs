//! Serial link to the external synthesizer
//!
//! Frames are queued to a writer thread that owns the port and paces every
//! byte, so callers never block on the device.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use scalekeys_core::Frame;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("No serial ports found")]
    NoPorts,
    #[error("Failed to list serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

/// Link settings applied when a port is opened.
#[derive(Debug, Clone, Copy)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub write_timeout: Duration,
    pub pacing: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            write_timeout: Duration::from_millis(100),
            pacing: Duration::from_millis(5),
        }
    }
}

pub struct SerialLink {
    port_name: Option<String>,
    tx: Option<Sender<Frame>>,
    open: Arc<AtomicBool>,
    writer: Option<JoinHandle<()>>,
}

impl SerialLink {
    /// A link with no port; every send is a no-op.
    pub fn closed() -> Self {
        Self {
            port_name: None,
            tx: None,
            open: Arc::new(AtomicBool::new(false)),
            writer: None,
        }
    }

    /// System port names. An empty list is reported as [`SerialError::NoPorts`].
    pub fn available_ports() -> Result<Vec<String>, SerialError> {
        let ports = serialport::available_ports().map_err(SerialError::Enumerate)?;
        if ports.is_empty() {
            return Err(SerialError::NoPorts);
        }
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    pub fn open(port: &str, settings: SerialSettings) -> Result<Self, SerialError> {
        let handle = serialport::new(port, settings.baud_rate)
            .timeout(settings.write_timeout)
            .open()
            .map_err(|source| SerialError::Open { port: port.to_string(), source })?;
        info!(port, baud = settings.baud_rate, "Serial port opened");
        Ok(Self::attach(port, handle, settings.pacing))
    }

    /// Drives any writer as if it were a port.
    pub fn attach<W: Write + Send + 'static>(name: &str, writer: W, pacing: Duration) -> Self {
        let (tx, rx) = unbounded::<Frame>();
        let open = Arc::new(AtomicBool::new(true));
        let flag = open.clone();
        let port_name = name.to_string();

        let handle = thread::spawn(move || {
            Self::write_loop(writer, rx, flag, pacing, &port_name);
        });

        Self {
            port_name: Some(name.to_string()),
            tx: Some(tx),
            open,
            writer: Some(handle),
        }
    }

    pub fn is_open(&self) -> bool {
        self.tx.is_some() && self.open.load(Ordering::SeqCst)
    }

    /// Queues a frame. Dropped silently when the link is closed.
    pub fn send(&self, frame: Frame) {
        if !self.is_open() {
            return;
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(frame);
        }
    }

    /// Closes the link after the writer drains the queued frames.
    pub fn close(&mut self) {
        self.tx.take();
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        if self.open.swap(false, Ordering::SeqCst) {
            info!(port = ?self.port_name, "Serial link closed");
        }
    }

    fn write_loop<W: Write>(mut writer: W, rx: Receiver<Frame>, open: Arc<AtomicBool>, pacing: Duration, port: &str) {
        while let Ok(frame) = rx.recv() {
            if !open.load(Ordering::SeqCst) {
                continue;
            }
            debug!(port, ?frame, "Serial frame");
            if let Err(e) = Self::write_paced(&mut writer, &frame.encode(), pacing) {
                warn!(port, error = %e, "Serial write failed, link closed");
                open.store(false, Ordering::SeqCst);
            }
        }
    }

    /// One byte per write, each followed by the pacing delay.
    fn write_paced<W: Write>(writer: &mut W, bytes: &[u8], pacing: Duration) -> std::io::Result<()> {
        for byte in bytes {
            writer.write_all(std::slice::from_ref(byte))?;
            writer.flush()?;
            if !pacing.is_zero() {
                thread::sleep(pacing);
            }
        }
        Ok(())
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::closed()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}
