use serre::acquisition::Acquirer;
use serre::channels::ChannelMap;
use serre::config::DeviceConfig;
use serre::error::SerreError;
use serre::modbus::{ModbusTransport, RegisterTransport};
use serre::simulator::{DeviceSimulator, RegisterBank, SimulatedReadings};
use std::sync::Arc;
use std::time::Duration;

async fn start_simulator(readings: SimulatedReadings) -> DeviceSimulator {
    let bank = RegisterBank::with_readings(&ChannelMap::tcw241(), readings);
    DeviceSimulator::start(([127, 0, 0, 1], 0).into(), bank)
        .await
        .unwrap()
}

fn fast_transport() -> ModbusTransport {
    ModbusTransport::new(&DeviceConfig::default())
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
}

#[tokio::test]
async fn acquires_from_simulated_module() {
    let simulator = start_simulator(SimulatedReadings {
        temperature: 18.25,
        humidity: [20.0, 50.0, 80.0],
    })
    .await;
    let addr = simulator.local_addr();
    let acquirer = Acquirer::new(Arc::new(fast_transport()));

    let snapshot = acquirer
        .acquire(&addr.ip().to_string(), addr.port())
        .await
        .unwrap();

    assert_eq!(snapshot.temperature(), Some(18.25));
    let [h1, h2, h3] = snapshot.humidities();
    assert!((h1.unwrap() - 20.0).abs() < 1e-4);
    assert!((h2.unwrap() - 50.0).abs() < 1e-4);
    assert!((h3.unwrap() - 80.0).abs() < 1e-4);
    assert!((snapshot.average_humidity().unwrap() - 50.0).abs() < 1e-4);
}

#[tokio::test]
async fn updated_registers_show_up_in_next_cycle() {
    let simulator = start_simulator(SimulatedReadings::default()).await;
    let addr = simulator.local_addr();
    let acquirer = Acquirer::new(Arc::new(fast_transport()));
    let host = addr.ip().to_string();

    let before = acquirer.acquire(&host, addr.port()).await.unwrap();
    simulator.bank().set_float(19800, 30.5);
    let after = acquirer.acquire(&host, addr.port()).await.unwrap();

    assert_eq!(before.temperature(), Some(21.5));
    assert_eq!(after.temperature(), Some(30.5));
}

#[tokio::test]
async fn device_exception_is_transport_error() {
    let simulator = start_simulator(SimulatedReadings::default()).await;
    simulator.bank().clear(17503);
    let addr = simulator.local_addr();
    let acquirer = Acquirer::new(Arc::new(fast_transport()));

    let err = acquirer
        .acquire(&addr.ip().to_string(), addr.port())
        .await
        .unwrap_err();
    assert!(matches!(err, SerreError::Transport { .. }));
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    // Reserve a port, then free it so nothing listens there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let transport = fast_transport();
    let err = match transport.connect("127.0.0.1", port).await {
        Ok(_) => panic!("connection to a closed port succeeded"),
        Err(e) => e,
    };
    assert!(matches!(err, SerreError::Transport { .. }));

    let acquirer = Acquirer::new(Arc::new(transport));
    assert!(acquirer.acquire("127.0.0.1", port).await.is_err());
}

#[tokio::test]
async fn unresolvable_host_is_transport_error() {
    let err = match fast_transport().connect("host.invalid", 502).await {
        Ok(_) => panic!("resolved an invalid host"),
        Err(e) => e,
    };
    assert!(matches!(err, SerreError::Transport { .. }));
}
