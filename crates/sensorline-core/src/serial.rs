//! Serial port handling
//!
//! Enumerates, opens and configures serial ports for sensor boards.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashSet;
use std::fmt;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::SourceError;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,

    /// Serial number (if available)
    pub serial_number: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }

    /// Human readable description, "n/a" when the OS reports nothing
    pub fn description(&self) -> String {
        match (&self.manufacturer, &self.product) {
            (Some(m), Some(p)) => format!("{} {}", m, p),
            (Some(s), None) | (None, Some(s)) => s.clone(),
            (None, None) => "n/a".to_string(),
        }
    }

    /// Hardware identifier in the usual `USB VID:PID=xxxx:xxxx SNR=...` form
    pub fn hardware_id(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => {
                let mut id = format!("USB VID:PID={:04x}:{:04x}", vid, pid);
                if let Some(sn) = &self.serial_number {
                    id.push_str(&format!(" SNR={}", sn));
                }
                id
            }
            _ => "n/a".to_string(),
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.name,
            self.description(),
            self.hardware_id()
        )
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb_info) => Self {
                name: info.port_name,
                vid: Some(usb_info.vid),
                pid: Some(usb_info.pid),
                manufacturer: usb_info.manufacturer,
                product: usb_info.product,
                serial_number: usb_info.serial_number,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Device-name prefixes of USB CDC and USB-serial adapters, in listing order
const USB_TTY_PREFIXES: [&str; 2] = ["ttyACM", "ttyUSB"];

/// Ordering rank for a port: known USB adapters first, by prefix then unit
/// number, everything else by name
fn port_rank(name: &str) -> (usize, u64, &str) {
    let base = name.rsplit('/').next().unwrap_or(name);
    USB_TTY_PREFIXES
        .iter()
        .enumerate()
        .find_map(|(rank, prefix)| {
            let unit = base.strip_prefix(prefix)?;
            Some((rank, unit.parse().unwrap_or(u64::MAX), base))
        })
        .unwrap_or((USB_TTY_PREFIXES.len(), 0, base))
}

/// Whether a `/dev` entry looks like a USB serial adapter
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn is_usb_tty(file_name: &str) -> bool {
    USB_TTY_PREFIXES
        .iter()
        .any(|prefix| file_name.starts_with(prefix))
}

/// USB serial nodes present in `/dev`
///
/// Freshly plugged boards can appear here before the enumerator reports them.
#[cfg(target_os = "linux")]
fn dev_usb_ttys() -> Vec<PortInfo> {
    let Ok(entries) = fs::read_dir("/dev") else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_usb_tty(name))
        .map(|name| PortInfo::bare(format!("/dev/{}", name)))
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn dev_usb_ttys() -> Vec<PortInfo> {
    Vec::new()
}

/// List serial ports, USB adapters first, without duplicates
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = match serialport::available_ports() {
        Ok(found) => found.into_iter().map(PortInfo::from).collect(),
        Err(e) => {
            warn!("Port enumeration failed: {}", e);
            Vec::new()
        }
    };

    let known: HashSet<String> = ports.iter().map(|p| p.name.clone()).collect();
    ports.extend(
        dev_usb_ttys()
            .into_iter()
            .filter(|p| !known.contains(&p.name)),
    );

    ports.sort_by(|a, b| port_rank(&a.name).cmp(&port_rank(&b.name)));
    ports.dedup_by(|a, b| a.name == b.name);
    debug!("Found {} serial ports", ports.len());
    ports
}

/// Open and configure a serial port (8N1, no flow control)
pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>, SourceError> {
    let mut port = serialport::new(&config.port, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()?;

    // Boards that reset on DTR toggle stay running while it is held high
    if config.assert_dtr {
        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to set DTR high on {}: {} (continuing)", config.port, e);
        }
    }

    clear_buffers(port.as_mut())?;
    info!("Opened {} at {} baud", config.port, config.baud_rate);
    Ok(port)
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), SourceError> {
    port.clear(serialport::ClearBuffer::All)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Must not panic with or without hardware attached
        let ports = list_ports();
        for port in &ports {
            println!("Found port: {}", port);
        }
    }

    #[test]
    fn test_port_sorting() {
        let names = vec![
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
        ];
        let mut ports: Vec<PortInfo> = names
            .into_iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect();

        ports.sort_by(|a, b| port_rank(&a.name).cmp(&port_rank(&b.name)));
        let ordered: Vec<String> = ports.into_iter().map(|p| p.name).collect();

        assert_eq!(
            ordered,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_usb_tty_filter() {
        assert!(is_usb_tty("ttyACM0"));
        assert!(is_usb_tty("ttyUSB3"));
        assert!(!is_usb_tty("ttyS0"));
        assert!(!is_usb_tty("tty"));
        assert!(!is_usb_tty("cu.usbmodem1101"));
    }

    #[test]
    fn test_port_display() {
        let port = PortInfo {
            name: "/dev/ttyACM0".to_string(),
            vid: Some(0x2341),
            pid: Some(0x0043),
            manufacturer: Some("Arduino".to_string()),
            product: Some("Uno".to_string()),
            serial_number: Some("8573".to_string()),
        };
        assert_eq!(
            port.to_string(),
            "(/dev/ttyACM0, Arduino Uno, USB VID:PID=2341:0043 SNR=8573)"
        );
        assert_eq!(
            PortInfo::bare("COM3".to_string()).to_string(),
            "(COM3, n/a, n/a)"
        );
    }

    #[test]
    fn test_open_missing_port_fails() {
        let config = SerialConfig::new("/dev/does-not-exist-sensorline", 9600);
        assert!(open_port(&config).is_err());
    }
}
