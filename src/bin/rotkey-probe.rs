use rotkey::backends::randr::RandrBackend;
use rotkey::backends::DisplayApi;
use rotkey::orientation::Orientation;
use rotkey::transform;
use rotkey::x11::XSession;

use std::thread::sleep;
use std::time::Duration;

/// Walk every display through all four orientations and back to where it
/// started, printing what the server reports after each step.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let session = XSession::connect()?;
    let mut backend = RandrBackend::new(session)?;
    let displays = backend.displays()?;
    println!("{} display(s)", displays.len());

    for (index, device) in displays.iter().enumerate() {
        let start = backend.current_mode(device)?;
        println!(
            "{}: {} {}x{}",
            device, start.orientation, start.width, start.height
        );

        let steps = [
            Orientation::RightUp,
            Orientation::Flipped,
            Orientation::LeftUp,
            Orientation::Normal,
            start.orientation,
        ];
        for target in steps.iter().copied() {
            match transform::apply(&mut backend, index, target) {
                Ok(_) => {
                    let now = backend.current_mode(device)?;
                    println!(
                        "current orientation of {}: {} {}x{}",
                        device, now.orientation, now.width, now.height
                    );
                }
                Err(e) => println!("{}: {} failed: {}", device, target, e),
            }
            sleep(Duration::from_secs(1));
        }
    }
    Ok(())
}
