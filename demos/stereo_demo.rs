//! Interactive stereo viewer.
//!
//! Usage: `cargo run --example stereo_demo [options.json] [texture.png]`
//!
//! A simulated device-orientation sensor slowly rocks the surface so the
//! sensor overlay path is exercised without real hardware.

use std::time::Duration;

use hornview::*;

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let mut options = match args.next() {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(texture) = args.next() {
        options.texture_path = Some(texture);
    }

    let viewer = Viewer::new(options)?;
    let handle = viewer.handle();

    std::thread::spawn(move || {
        let mut t = 0.0f32;
        loop {
            std::thread::sleep(Duration::from_millis(50));
            t += 0.05;
            let gamma = 10.0 * t.sin();
            if !handle.set_sensor_euler(0.0, 0.0, gamma) {
                break;
            }
        }
    });

    viewer.run()
}
