//! Renders one frame of every mode to PNG files without a window.
//!
//! Usage: `cargo run --example anaglyph_screenshot [output_dir]`

use std::path::PathBuf;

use hornview::*;

fn main() -> Result<()> {
    init_logging();

    let out_dir = std::env::args()
        .nth(1)
        .map_or_else(std::env::temp_dir, PathBuf::from);

    for mode in [RenderMode::Mono, RenderMode::SideBySide, RenderMode::Anaglyph] {
        let options = Options {
            mode,
            ..Options::default()
        };
        let path = out_dir.join(format!("hornview_{}.png", mode.name()));
        render_to_file(&path, &options, 800, 600)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
