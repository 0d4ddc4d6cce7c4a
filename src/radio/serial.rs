//! # Serial LoRa Receiver
//!
//! Adapter for UART LoRa modules (RYLR998 and compatibles) that report each
//! received packet as a text line:
//!
//! ```text
//! +RCV=<address>,<length>,<data>,<rssi>,<snr>\r\n
//! ```
//!
//! The module must already be configured (band, network id, spreading
//! factor) to match the vehicle transmitter.
//!
//! A background task reads lines from the port and queues parsed packets.
//! [`SerialRadio::poll_reception`] only drains that queue, so the monitor's
//! poll cycle never waits on the serial port.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use super::Radio;
use crate::config::RadioConfig;
use crate::error::{PitstopError, Result};
use crate::telemetry::frame::Reception;

/// Line prefix for a received packet
const RCV_PREFIX: &[u8] = b"+RCV=";

/// One packet as reported by the LoRa module
#[derive(Debug, Clone, PartialEq)]
pub struct RadioPacket {
    /// Sender address
    pub address: u16,
    /// Raw payload bytes
    pub payload: Bytes,
    /// RSSI in dBm
    pub rssi_dbm: f64,
    /// SNR in dB
    pub snr_db: f64,
}

#[derive(Debug)]
enum ReaderMessage {
    Packet(RadioPacket),
    Closed(String),
}

/// Parse one line from the LoRa module
///
/// The data field may itself contain commas (JSON does), so address and
/// length are split from the front and RSSI and SNR from the back.
///
/// # Arguments
///
/// * `line` - Raw line, with or without the trailing `\r\n`
///
/// # Returns
///
/// * `Result<Option<RadioPacket>>` - `None` for lines that are not packet reports
///   (`+OK`, `+READY`, banners)
///
/// # Errors
///
/// Returns error if a `+RCV=` line is missing fields or has non-numeric
/// address, RSSI, or SNR
pub fn parse_rcv_line(line: &[u8]) -> Result<Option<RadioPacket>> {
    let line = trim_line_end(line);
    let Some(rest) = line.strip_prefix(RCV_PREFIX) else {
        return Ok(None);
    };

    let malformed = || {
        PitstopError::Serial(format!("Malformed +RCV line: {}", String::from_utf8_lossy(line)))
    };

    let mut head = rest.splitn(3, |&b| b == b',');
    let address = head.next().and_then(parse_field::<u16>).ok_or_else(malformed)?;
    let declared_len = head.next().and_then(parse_field::<usize>).ok_or_else(malformed)?;
    let tail = head.next().ok_or_else(malformed)?;

    let mut back = tail.rsplitn(3, |&b| b == b',');
    let snr_db = back.next().and_then(parse_field::<f64>).ok_or_else(malformed)?;
    let rssi_dbm = back.next().and_then(parse_field::<f64>).ok_or_else(malformed)?;
    let data = back.next().ok_or_else(malformed)?;

    if data.len() != declared_len {
        // Still a reception; the decoder decides whether the data is usable
        debug!("+RCV length mismatch: declared {}, got {}", declared_len, data.len());
    }

    Ok(Some(RadioPacket {
        address,
        payload: Bytes::copy_from_slice(data),
        rssi_dbm,
        snr_db,
    }))
}

fn parse_field<T: std::str::FromStr>(bytes: &[u8]) -> Option<T> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// LoRa receiver module on a serial port
pub struct SerialRadio {
    rx: mpsc::UnboundedReceiver<ReaderMessage>,
    reader: JoinHandle<()>,
    device_path: String,
    last_rssi_dbm: f64,
    last_snr_db: f64,
}

impl std::fmt::Debug for SerialRadio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadio")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialRadio {
    /// Open the LoRa module, retrying a bounded number of times
    ///
    /// This is the only blocking step; it runs once at startup.
    ///
    /// # Arguments
    ///
    /// * `config` - Port, baud rate, and retry policy
    ///
    /// # Returns
    ///
    /// * `Result<SerialRadio>` - Radio with its reader task running
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if every attempt fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pitstop_telemetry::config::RadioConfig;
    /// use pitstop_telemetry::radio::serial::SerialRadio;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let radio = SerialRadio::open(&RadioConfig::default()).await?;
    ///     println!("Listening on {}", radio.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(config: &RadioConfig) -> Result<Self> {
        let retry_interval = Duration::from_millis(config.retry_interval_ms);

        for attempt in 1..=config.open_attempts {
            debug!("Opening LoRa receiver at {} (attempt {})", config.port, attempt);

            match Self::open_port(&config.port, config.baud_rate) {
                Ok(port) => {
                    info!("LoRa receiver ready at {} ({} baud)", config.port, config.baud_rate);
                    return Ok(Self::from_reader(port, config.port.clone()));
                }
                Err(e) => {
                    warn!(
                        "LoRa init failed (attempt {}/{}): {}",
                        attempt, config.open_attempts, e
                    );
                    if attempt < config.open_attempts {
                        tokio::time::sleep(retry_interval).await;
                    }
                }
            }
        }

        Err(PitstopError::SerialPortNotFound(config.port.clone()))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PitstopError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Start reading module output from any byte stream
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_reader<R>(reader: R, device_path: impl Into<String>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_lines(reader, tx));

        Self {
            rx,
            reader,
            device_path: device_path.into(),
            last_rssi_dbm: 0.0,
            last_snr_db: 0.0,
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl Drop for SerialRadio {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl Radio for SerialRadio {
    fn poll_reception(&mut self) -> Result<Option<Reception>> {
        match self.rx.try_recv() {
            Ok(ReaderMessage::Packet(packet)) => {
                self.last_rssi_dbm = packet.rssi_dbm;
                self.last_snr_db = packet.snr_db;
                Ok(Some(Reception::new(packet.payload)))
            }
            Ok(ReaderMessage::Closed(reason)) => Err(PitstopError::RadioFault(reason)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(PitstopError::RadioFault("serial reader stopped".to_string()))
            }
        }
    }

    fn last_rssi_dbm(&self) -> f64 {
        self.last_rssi_dbm
    }

    fn last_snr_db(&self) -> f64 {
        self.last_snr_db
    }
}

async fn read_lines<R>(reader: R, tx: mpsc::UnboundedSender<ReaderMessage>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();
        let message = match reader.read_until(b'\n', &mut line).await {
            Ok(0) => ReaderMessage::Closed("serial port closed".to_string()),
            Ok(_) => match parse_rcv_line(&line) {
                Ok(Some(packet)) => ReaderMessage::Packet(packet),
                Ok(None) => {
                    debug!("Ignoring module output: {}", String::from_utf8_lossy(trim_line_end(&line)));
                    continue;
                }
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            },
            Err(e) => ReaderMessage::Closed(format!("serial read failed: {}", e)),
        };

        let closed = matches!(message, ReaderMessage::Closed(_));
        if tx.send(message).is_err() || closed {
            return;
        }
    }
}
