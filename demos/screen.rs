use sony_sdcp_rust::Projector;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut projector = Projector::new();
    if !projector.find(None, None, None).expect("Failed to listen for projectors") {
        println!("No projector found");
        return;
    }
    println!("Found {:?} at {:?}", projector.info(), projector.address());

    projector.set_hdmi_input(1).expect("Failed to select HDMI1");
    projector.set_screen("ASPECT_RATIO", "ZOOM_2_35").expect("Failed to set aspect ratio");
    projector.set_screen("PICTURE_POSITION", "2_35").expect("Failed to set picture position");

    println!("Lamp timer: {}", projector.get_lamp_timer().expect("Failed to get lamp timer"));
}
