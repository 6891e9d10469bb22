use anyhow::{Context, Result};
use log::info;
use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialPortInfo, SerialPortType,
    SerialStream, StopBits,
};

use crate::settings::SerialSettings;

pub fn create_serial(settings: &SerialSettings) -> Result<SerialStream> {
    let serial = tokio_serial::new(&settings.port, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(settings.timeout)
        .open_native_async()
        .with_context(|| format!("Failed to open serial port {}", settings.port))?;
    info!(
        "Opened {} at {} baud, {:?} read timeout",
        settings.port, settings.baud_rate, settings.timeout
    );
    Ok(serial)
}

pub fn available_ports() -> Result<Vec<SerialPortInfo>> {
    tokio_serial::available_ports().context("Failed to enumerate serial ports")
}

pub fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => format!(
            "{} (USB {:04x}:{:04x}{}{})",
            port.port_name,
            usb.vid,
            usb.pid,
            usb.manufacturer
                .as_ref()
                .map_or(String::new(), |m| format!(", {}", m)),
            usb.product
                .as_ref()
                .map_or(String::new(), |p| format!(", {}", p)),
        ),
        SerialPortType::PciPort => format!("{} (PCI)", port.port_name),
        SerialPortType::BluetoothPort => format!("{} (Bluetooth)", port.port_name),
        SerialPortType::Unknown => port.port_name.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio_serial::UsbPortInfo;

    #[test]
    fn describes_usb_port() {
        let port = SerialPortInfo {
            port_name: "/dev/ttyACM0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x1366,
                pid: 0x0105,
                serial_number: Some("000760084123".to_string()),
                manufacturer: Some("SEGGER".to_string()),
                product: Some("J-Link".to_string()),
            }),
        };
        assert_eq!(
            describe_port(&port),
            "/dev/ttyACM0 (USB 1366:0105, SEGGER, J-Link)"
        );
    }

    #[test]
    fn describes_unknown_port() {
        let port = SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        };
        assert_eq!(describe_port(&port), "/dev/ttyS0");
    }
}
