use serre::channels::{ChannelKind, ChannelMap, HUMIDITY_FULL_SCALE_VOLTS};
use serre::config::RegistersConfig;

#[test]
fn humidity_is_linear_over_the_sensor_range() {
    assert_eq!(ChannelKind::Humidity.scale(0.0), 0.0);
    assert_eq!(ChannelKind::Humidity.scale(2.5), 50.0);
    assert_eq!(ChannelKind::Humidity.scale(HUMIDITY_FULL_SCALE_VOLTS as f32), 100.0);

    // Equal voltage steps give equal percentage steps
    let a = ChannelKind::Humidity.scale(1.0);
    let b = ChannelKind::Humidity.scale(2.0);
    let c = ChannelKind::Humidity.scale(3.0);
    assert!(((b - a) - (c - b)).abs() < 1e-9);
}

#[test]
fn out_of_range_voltages_are_reported_as_is() {
    assert!(ChannelKind::Humidity.scale(-1.0) < 0.0);
    assert!(ChannelKind::Humidity.scale(7.5) > 100.0);
}

#[test]
fn temperature_is_identity() {
    for raw in [-40.0f32, 0.0, 23.5, 85.25] {
        assert_eq!(ChannelKind::Temperature.scale(raw), f64::from(raw));
    }
    assert!(ChannelKind::Temperature.scale(f32::NAN).is_nan());
}

#[test]
fn tcw241_memory_map() {
    let map = ChannelMap::tcw241();
    let addresses: Vec<u16> = map.in_read_order().iter().map(|c| c.address).collect();
    assert_eq!(addresses, vec![19800, 17500, 17502, 17504]);

    let kinds: Vec<ChannelKind> = map.in_read_order().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChannelKind::Temperature,
            ChannelKind::Humidity,
            ChannelKind::Humidity,
            ChannelKind::Humidity
        ]
    );
}

#[test]
fn map_follows_register_config() {
    let registers = RegistersConfig {
        temperature: 100,
        humidity: [200, 202, 204],
    };
    let map = ChannelMap::from(&registers);
    assert_eq!(map.temperature.address, 100);
    assert_eq!(map.humidity[2].address, 204);
    assert_eq!(map.humidity[0].name, "humidite1");
}
