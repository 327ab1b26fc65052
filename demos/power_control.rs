use std::{thread, time::Duration};

use sony_sdcp_rust::Projector;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut projector = Projector::from_ip("10.0.0.139".parse().unwrap());

    projector.set_power(true).expect("Failed to set power ON");
    println!("Powered on");

    thread::sleep(Duration::from_secs(10));

    println!("Power state: {:?}", projector.get_power_state().expect("Failed to get power state"));

    projector.set_power(false).expect("Failed to set power OFF");
    println!("Powered off");
}
