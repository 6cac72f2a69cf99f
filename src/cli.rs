use crate::filter::BandmapConfig;
use crate::persist::DEFAULT_STATE_FILE;
use crate::store::DEFAULT_LIFETIME;
use argparse::{ArgumentParser, Store, StoreFalse, StoreOption, StoreTrue};
use std::path::PathBuf;

pub struct CliArgs {
    pub cluster: Option<PathBuf>,
    pub state: PathBuf,
    pub lifetime: u32,
    pub rows: usize,
    pub columns: usize,
    pub freq: Option<u32>,
    pub band: u16,
    pub mode: String,
    pub node: String,
    pub contest: bool,
    pub all_bands: bool,
    pub all_modes: bool,
    pub show_dupes: bool,
    pub only_mults: bool,
    pub save_secs: u64,
    pub csv: Option<PathBuf>,
    pub json: bool,
    pub log_level: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            cluster: None,
            state: PathBuf::from(DEFAULT_STATE_FILE),
            lifetime: DEFAULT_LIFETIME,
            rows: 8,
            columns: 3,
            freq: None,
            band: 20,
            mode: "cw".into(),
            node: "A".into(),
            contest: false,
            all_bands: true,
            all_modes: true,
            show_dupes: true,
            only_mults: false,
            save_secs: 60,
            csv: None,
            json: false,
            log_level: "essential".into(),
        }
    }
}

impl CliArgs {
    pub fn bandmap_config(&self) -> BandmapConfig {
        BandmapConfig {
            all_bands: self.all_bands,
            all_modes: self.all_modes,
            show_dupes: self.show_dupes,
            only_multipliers: self.only_mults,
            lifetime: self.lifetime,
            ..BandmapConfig::default()
        }
    }

    pub fn own_node(&self) -> char {
        self.node.chars().next().unwrap_or(' ')
    }
}

pub fn parse_cli() -> CliArgs {
    let mut args = CliArgs::default();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("DX cluster bandmap");
        ap.refer(&mut args.cluster)
            .add_option(&["-c", "--cluster"], StoreOption, "Cluster log to replay (default: stdin)");
        ap.refer(&mut args.state)
            .add_option(&["--state"], Store, "Bandmap state file");
        ap.refer(&mut args.lifetime)
            .add_option(&["--lifetime"], Store, "Spot lifetime in seconds");
        ap.refer(&mut args.rows)
            .add_option(&["--rows"], Store, "Bandmap rows");
        ap.refer(&mut args.columns)
            .add_option(&["--columns"], Store, "Bandmap columns");
        ap.refer(&mut args.freq)
            .add_option(&["-f", "--freq"], StoreOption, "Rig frequency in Hz");
        ap.refer(&mut args.band)
            .add_option(&["-b", "--band"], Store, "Own band in meters (without rig)");
        ap.refer(&mut args.mode)
            .add_option(&["-m", "--mode"], Store, "Own mode: cw|ssb|digi (without rig)");
        ap.refer(&mut args.node)
            .add_option(&["--node"], Store, "Own node id");
        ap.refer(&mut args.contest)
            .add_option(&["--contest"], StoreTrue, "Contest mode (hide WARC spots)");
        ap.refer(&mut args.all_bands)
            .add_option(&["--own-band"], StoreFalse, "Show own band only");
        ap.refer(&mut args.all_modes)
            .add_option(&["--own-mode"], StoreFalse, "Show own mode only");
        ap.refer(&mut args.show_dupes)
            .add_option(&["--hide-dupes"], StoreFalse, "Hide dupes");
        ap.refer(&mut args.only_mults)
            .add_option(&["--only-mults"], StoreTrue, "Show multipliers only");
        ap.refer(&mut args.save_secs)
            .add_option(&["--save-every"], Store, "Seconds between state saves (0 = on exit only)");
        ap.refer(&mut args.csv)
            .add_option(&["--csv"], StoreOption, "Write the filtered view as CSV");
        ap.refer(&mut args.json)
            .add_option(&["--json"], StoreTrue, "Print the window as JSON");
        ap.refer(&mut args.log_level)
            .add_option(&["--log"], Store, "Log level (essential|debug|trace|warn|error)");
        ap.parse_args_or_exit();
    }
    args
}
