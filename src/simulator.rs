//! Modbus TCP simulator of a TCW241 I/O module
//!
//! Serves the four monitored channels as big-endian 32-bit floats so the API
//! can be exercised without hardware. In Modbus terms the simulator is the
//! server (slave) and the acquisition transport is the client (master).

use crate::channels::{ChannelKind, ChannelMap, HUMIDITY_FULL_SCALE_VOLTS};
use crate::error::{Result, SerreError};
use crate::logging::get_logger;
use crate::modbus::encode_32bit_float;
use std::collections::HashMap;
use std::future;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_modbus::prelude::*;
use tokio_modbus::server::tcp::{Server, accept_tcp_connection};

/// Values exposed by the simulated module, in engineering units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedReadings {
    pub temperature: f32,
    /// Humidity channels in percent; stored on the device as 0-5 V
    pub humidity: [f32; 3],
}

impl Default for SimulatedReadings {
    fn default() -> Self {
        Self {
            temperature: 21.5,
            humidity: [42.0, 55.0, 61.0],
        }
    }
}

/// Shared holding-register bank of the simulated module
#[derive(Debug, Clone, Default)]
pub struct RegisterBank {
    registers: Arc<RwLock<HashMap<u16, u16>>>,
}

impl RegisterBank {
    /// Bank with `readings` laid out according to `channels`
    pub fn with_readings(channels: &ChannelMap, readings: SimulatedReadings) -> Self {
        let bank = Self::default();
        bank.set_readings(channels, readings);
        bank
    }

    /// Overwrite the channel registers with new readings
    pub fn set_readings(&self, channels: &ChannelMap, readings: SimulatedReadings) {
        let values = [
            readings.temperature,
            readings.humidity[0],
            readings.humidity[1],
            readings.humidity[2],
        ];
        for (channel, value) in channels.in_read_order().iter().zip(values) {
            let raw = match channel.kind {
                ChannelKind::Temperature => value,
                ChannelKind::Humidity => {
                    (f64::from(value) / 100.0 * HUMIDITY_FULL_SCALE_VOLTS) as f32
                }
            };
            self.set_float(channel.address, raw);
        }
    }

    /// Store a raw float at `address` and `address + 1`
    pub fn set_float(&self, address: u16, value: f32) {
        let [hi, lo] = encode_32bit_float(value);
        if let Ok(mut regs) = self.registers.write() {
            regs.insert(address, hi);
            regs.insert(address.wrapping_add(1), lo);
        }
    }

    /// Remove a register so reads touching it fail
    pub fn clear(&self, address: u16) {
        if let Ok(mut regs) = self.registers.write() {
            regs.remove(&address);
        }
    }

    fn read(&self, address: u16, count: u16) -> std::result::Result<Vec<u16>, ExceptionCode> {
        let regs = self
            .registers
            .read()
            .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
        (0..count)
            .map(|i| {
                regs.get(&address.wrapping_add(i))
                    .copied()
                    .ok_or(ExceptionCode::IllegalDataAddress)
            })
            .collect()
    }
}

/// One accepted client connection
struct SimulatorService {
    bank: RegisterBank,
}

impl tokio_modbus::server::Service for SimulatorService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<std::result::Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => self
                .bank
                .read(addr, cnt)
                .map(Response::ReadHoldingRegisters),
            _ => Err(ExceptionCode::IllegalFunction),
        };
        future::ready(res)
    }
}

/// Handle to a running simulator task
pub struct DeviceSimulator {
    addr: SocketAddr,
    bank: RegisterBank,
    task: JoinHandle<()>,
}

impl DeviceSimulator {
    /// Bind `addr` (port 0 picks a free port) and start serving `bank`
    pub async fn start(addr: SocketAddr, bank: RegisterBank) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SerreError::io(format!("Simulator cannot bind {}: {}", addr, e)))?;
        let addr = listener.local_addr()?;
        let logger = get_logger("simulator");
        logger.info(&format!("TCW241 simulator listening on {}", addr));

        let server = Server::new(listener);
        let served = bank.clone();
        let task = tokio::spawn(async move {
            let on_connected = move |stream, socket_addr| {
                let bank = served.clone();
                async move {
                    accept_tcp_connection(stream, socket_addr, move |_socket_addr| {
                        Ok(Some(SimulatorService { bank: bank.clone() }))
                    })
                }
            };
            let error_logger = logger.clone();
            let on_process_error = move |err| {
                error_logger.warn(&format!("Simulator connection error: {}", err));
            };
            if let Err(e) = server.serve(&on_connected, on_process_error).await {
                logger.error(&format!("Simulator stopped: {}", e));
            }
        });

        Ok(Self { addr, bank, task })
    }

    /// Address the simulator is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register bank served to clients
    pub fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    /// Stop accepting connections
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for DeviceSimulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}
