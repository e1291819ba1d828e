use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "gesture_config.json")]
    pub config: PathBuf,

    /// Stream URL, overrides the configuration
    #[arg(long)]
    pub url: Option<String>,

    /// Directory holding gesture_data.csv and gesture_names.csv
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,

    /// Classification tolerance, overrides the configuration
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Check that every trained sample is recognized as itself, then exit
    #[arg(long, default_value_t = false)]
    pub verify: bool,

    /// List loaded gesture templates and exit
    #[arg(long)]
    pub list: bool,

    /// Read a recorded MJPEG dump instead of connecting to the camera
    #[arg(long)]
    pub replay: Option<PathBuf>,
}
