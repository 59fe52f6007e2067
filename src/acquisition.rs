//! Acquisition cycle: read every channel of the I/O module into a Snapshot
//!
//! One call to [`Acquirer::acquire`] opens a connection, reads the
//! temperature and the three humidity inputs in that order, scales them and
//! closes the connection again. The first failing channel aborts the cycle;
//! there is no retry and no partially filled snapshot.

use crate::channels::{Channel, ChannelMap};
use crate::error::Result;
use crate::modbus::{REGISTER_COUNT, RegisterConnection, RegisterTransport, decode_32bit_float};
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// Runs acquisition cycles against a field device
#[derive(Clone)]
pub struct Acquirer {
    transport: Arc<dyn RegisterTransport>,
    channels: ChannelMap,
}

impl Acquirer {
    /// Create an acquirer reading the factory TCW241 channel map
    pub fn new(transport: Arc<dyn RegisterTransport>) -> Self {
        Self::with_channels(transport, ChannelMap::tcw241())
    }

    /// Create an acquirer reading a custom channel map
    pub fn with_channels(transport: Arc<dyn RegisterTransport>, channels: ChannelMap) -> Self {
        Self {
            transport,
            channels,
        }
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    /// Run one acquisition cycle against `host:port`.
    ///
    /// The connection is closed on every path. If the returned future is
    /// dropped mid-cycle, dropping the connection releases it.
    pub async fn acquire(&self, host: &str, port: u16) -> Result<Snapshot> {
        let mut connection = self.transport.connect(host, port).await?;

        let outcome = self.read_all(connection.as_mut()).await;
        let closed = connection.disconnect().await;
        drop(connection);

        let snapshot = outcome?;
        // Readings are complete; a failed graceful close does not invalidate
        // them and the socket was released on drop.
        let _ = closed;
        Ok(snapshot)
    }

    async fn read_all(&self, connection: &mut dyn RegisterConnection) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();

        let temperature = read_channel(connection, &self.channels.temperature).await?;
        let [c1, c2, c3] = &self.channels.humidity;
        let h1 = read_channel(connection, c1).await?;
        let h2 = read_channel(connection, c2).await?;
        let h3 = read_channel(connection, c3).await?;

        snapshot.set_temperature(temperature);
        snapshot.set_humidities(h1, h2, h3);
        Ok(snapshot)
    }
}

impl std::fmt::Debug for Acquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquirer")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Read, decode and scale one channel
async fn read_channel(connection: &mut dyn RegisterConnection, channel: &Channel) -> Result<f64> {
    let words = connection
        .read_holding_registers(channel.address, REGISTER_COUNT)
        .await?;
    let raw = decode_32bit_float(&words)?;
    Ok(channel.kind.scale(raw))
}
