//! Modbus TCP register transport for the TCW241 I/O module
//!
//! The transport is deliberately thin: it opens one connection per
//! acquisition cycle, issues read-holding-registers requests one after the
//! other and hands back exactly the words the device answered. Interpreting
//! those words is the job of [`decode_32bit_float`] and the channel scaling.

use crate::config::DeviceConfig;
use crate::error::{Result, SerreError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::tcp;
use tokio_modbus::prelude::*;

/// Number of 16-bit registers holding one 32-bit reading
pub const REGISTER_COUNT: u16 = 2;

/// Opens connections to a field device
#[async_trait::async_trait]
pub trait RegisterTransport: Send + Sync {
    /// Establish a connection to `host:port`
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn RegisterConnection>>;
}

/// One open connection to a field device.
///
/// A connection serves a single cycle and is never shared: the protocol does
/// not multiplex request/response pairs. Implementations must release the
/// underlying socket when dropped, so an abandoned cycle cannot leak it.
#[async_trait::async_trait]
pub trait RegisterConnection: Send {
    /// Read `count` holding registers starting at `address`
    async fn read_holding_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>>;

    /// Close the connection gracefully
    async fn disconnect(&mut self) -> Result<()>;
}

/// Modbus TCP transport built on `tokio-modbus`
#[derive(Debug, Clone)]
pub struct ModbusTransport {
    unit_id: u8,
    connection_timeout: Duration,
    operation_timeout: Duration,
}

impl ModbusTransport {
    /// Create a transport using the unit id and timeouts of `config`
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            unit_id: config.unit_id,
            connection_timeout: Duration::from_millis(config.connect_timeout_ms),
            operation_timeout: Duration::from_millis(config.read_timeout_ms),
        }
    }

    /// Override both timeouts
    pub fn with_timeouts(mut self, connection: Duration, operation: Duration) -> Self {
        self.connection_timeout = connection;
        self.operation_timeout = operation;
        self
    }

    async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| SerreError::transport(format!("Cannot resolve {}:{}: {}", host, port, e)))?;
        addrs
            .next()
            .ok_or_else(|| SerreError::transport(format!("No address found for {}:{}", host, port)))
    }
}

impl Default for ModbusTransport {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}

#[async_trait::async_trait]
impl RegisterTransport for ModbusTransport {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn RegisterConnection>> {
        let socket_addr = timeout(self.connection_timeout, Self::resolve(host, port))
            .await
            .map_err(|_| SerreError::transport(format!("Resolving {} timed out", host)))??;

        match timeout(
            self.connection_timeout,
            tcp::connect_slave(socket_addr, Slave(self.unit_id)),
        )
        .await
        {
            Ok(Ok(ctx)) => Ok(Box::new(ModbusConnection {
                ctx: Some(ctx),
                operation_timeout: self.operation_timeout,
            })),
            Ok(Err(e)) => Err(SerreError::transport(format!(
                "Failed to connect to {}: {}",
                socket_addr, e
            ))),
            Err(_) => Err(SerreError::transport(format!(
                "Connection to {} timed out",
                socket_addr
            ))),
        }
    }
}

/// An open Modbus TCP client context.
///
/// Dropping the context closes the TCP stream.
pub struct ModbusConnection {
    ctx: Option<tokio_modbus::client::Context>,
    operation_timeout: Duration,
}

impl ModbusConnection {
    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    fn get_client(&mut self) -> Result<&mut tokio_modbus::client::Context> {
        self.ctx
            .as_mut()
            .ok_or_else(|| SerreError::transport("Not connected to Modbus server"))
    }
}

#[async_trait::async_trait]
impl RegisterConnection for ModbusConnection {
    async fn read_holding_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let timeout_duration = self.operation_timeout;
        let client = self.get_client()?;

        match timeout(timeout_duration, client.read_holding_registers(address, count)).await {
            Ok(Ok(Ok(words))) => Ok(words),
            Ok(Ok(Err(exception))) => Err(SerreError::transport(format!(
                "Device rejected read of {} registers at {}: {}",
                count, address, exception
            ))),
            Ok(Err(e)) => {
                // The stream is unusable after an I/O failure
                self.ctx = None;
                Err(SerreError::transport(format!(
                    "Failed to read holding registers at {}: {}",
                    address, e
                )))
            }
            Err(_) => {
                self.ctx = None;
                Err(SerreError::transport(format!(
                    "Read of register {} timed out",
                    address
                )))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.disconnect()
                .await
                .map_err(|e| SerreError::transport(format!("Disconnect failed: {}", e)))?;
        }
        Ok(())
    }
}

/// Decode 32-bit float from two 16-bit registers (big-endian)
///
/// Words beyond the first two are ignored. NaN and infinities are returned
/// as-is.
pub fn decode_32bit_float(registers: &[u16]) -> Result<f32> {
    let [hi, lo] = match registers {
        [hi, lo, ..] => [*hi, *lo],
        _ => {
            return Err(SerreError::decode(format!(
                "Expected {} registers for a 32-bit float, got {}",
                REGISTER_COUNT,
                registers.len()
            )));
        }
    };

    let bytes = [
        (hi >> 8) as u8,
        (hi & 0xFF) as u8,
        (lo >> 8) as u8,
        (lo & 0xFF) as u8,
    ];

    Ok(f32::from_be_bytes(bytes))
}

/// Encode 32-bit float to two 16-bit registers (big-endian)
pub fn encode_32bit_float(value: f32) -> [u16; 2] {
    let bytes = value.to_be_bytes();
    [
        ((bytes[0] as u16) << 8) | (bytes[1] as u16),
        ((bytes[2] as u16) << 8) | (bytes[3] as u16),
    ]
}
