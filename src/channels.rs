//! Channel map and engineering-unit scaling of the TCW241 inputs

use crate::config::RegistersConfig;
use serde::{Deserialize, Serialize};

/// Full-scale voltage of the analog humidity inputs
pub const HUMIDITY_FULL_SCALE_VOLTS: f64 = 5.0;

/// How a decoded register value maps to a physical quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Value is already in degrees Celsius
    Temperature,
    /// Value is a 0-5 V sensor voltage, reported as percent
    Humidity,
}

impl ChannelKind {
    /// Convert a decoded value to engineering units.
    ///
    /// No clamping: a humidity sensor fault shows up as a value outside
    /// 0-100 % instead of being hidden.
    pub fn scale(self, raw: f32) -> f64 {
        let value = f64::from(raw);
        match self {
            ChannelKind::Temperature => value,
            ChannelKind::Humidity => (value / HUMIDITY_FULL_SCALE_VOLTS) * 100.0,
        }
    }

    /// Unit symbol of the scaled value
    pub fn unit(self) -> &'static str {
        match self {
            ChannelKind::Temperature => "°C",
            ChannelKind::Humidity => "%",
        }
    }
}

/// One sensor input: a register address and its scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub name: &'static str,
    pub address: u16,
    pub kind: ChannelKind,
}

/// The four channels read during an acquisition cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    pub temperature: Channel,
    pub humidity: [Channel; 3],
}

impl ChannelMap {
    /// Factory memory map of the TCW241
    pub fn tcw241() -> Self {
        Self::from(&RegistersConfig::default())
    }

    /// Channels in read order: temperature, then humidity 1 to 3
    pub fn in_read_order(&self) -> [Channel; 4] {
        [
            self.temperature,
            self.humidity[0],
            self.humidity[1],
            self.humidity[2],
        ]
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::tcw241()
    }
}

impl From<&RegistersConfig> for ChannelMap {
    fn from(registers: &RegistersConfig) -> Self {
        let humidity = |name: &'static str, address: u16| Channel {
            name,
            address,
            kind: ChannelKind::Humidity,
        };
        Self {
            temperature: Channel {
                name: "temperature",
                address: registers.temperature,
                kind: ChannelKind::Temperature,
            },
            humidity: [
                humidity("humidite1", registers.humidity[0]),
                humidity("humidite2", registers.humidity[1]),
                humidity("humidite3", registers.humidity[2]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humidity_scaling_boundaries() {
        assert_eq!(ChannelKind::Humidity.scale(0.0), 0.0);
        assert_eq!(ChannelKind::Humidity.scale(2.5), 50.0);
        assert_eq!(ChannelKind::Humidity.scale(5.0), 100.0);
    }

    #[test]
    fn humidity_is_not_clamped() {
        assert_eq!(ChannelKind::Humidity.scale(-0.5), -10.0);
        assert_eq!(ChannelKind::Humidity.scale(6.0), 120.0);
    }

    #[test]
    fn temperature_passes_through() {
        assert_eq!(ChannelKind::Temperature.scale(21.5), 21.5);
        assert_eq!(ChannelKind::Temperature.scale(-4.25), -4.25);
        assert!(ChannelKind::Temperature.scale(f32::NAN).is_nan());
    }

    #[test]
    fn tcw241_map_order() {
        let map = ChannelMap::tcw241();
        let addresses: Vec<u16> = map.in_read_order().iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![19800, 17500, 17502, 17504]);
        assert_eq!(map.temperature.kind, ChannelKind::Temperature);
        assert!(map.humidity.iter().all(|c| c.kind == ChannelKind::Humidity));
        assert_eq!(map.humidity[2].kind.unit(), "%");
    }
}
