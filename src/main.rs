use anyhow::{Context, anyhow};
use bandmap::bands::{BandPlan, IaruBandPlan};
use bandmap::cli::{self, CliArgs};
use bandmap::cluster::{self, SpotParser};
use bandmap::contest::Contest;
use bandmap::display::{self, Age};
use bandmap::errors::BandmapError;
use bandmap::{csv_out, filter, persist};
use bandmap::{Band, Mode, Row, SpotStore, Tuning, WindowSelector};
use env_logger::Env;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

const AGING_PERIOD: Duration = Duration::from_secs(1);

fn setup_logging(level: &str) {
    let env = Env::default().filter_or("RUST_LOG", match level {
        "essential" => "info",
        "debug" => "debug",
        "trace" => "trace",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    });
    env_logger::Builder::from_env(env).init();
}

fn resolve_tuning(args: &CliArgs, plan: &dyn BandPlan) -> anyhow::Result<Tuning> {
    if let Some(freq) = args.freq {
        return Tuning::from_rig(plan, freq).ok_or_else(|| anyhow!("{} Hz is not in an HF band", freq));
    }
    let band = Band::from_meters(args.band).ok_or_else(|| anyhow!("unknown band {}m", args.band))?;
    let mode = Mode::parse(&args.mode).ok_or_else(|| anyhow!("unknown mode {:?}", args.mode))?;
    Ok(Tuning::manual(band, mode))
}

#[derive(Serialize)]
struct JsonRow {
    frequency: u32,
    call: Option<String>,
    on_center: bool,
    marker: bool,
    dupe: bool,
    multiplier: bool,
    age: Option<Age>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse_cli();
    setup_logging(&args.log_level);

    let plan = Arc::new(IaruBandPlan::new());
    let contest = Arc::new(Contest::casual().in_contest(args.contest));
    let cfg = args.bandmap_config();
    let tuning = resolve_tuning(&args, plan.as_ref())?;

    let store = Arc::new(SpotStore::new(cfg.lifetime, plan.clone(), contest.clone()));
    let restored = persist::load(&store, &args.state);
    info!("Starting: {} spot(s) restored from {}", restored, args.state.display());

    let parser = Arc::new(SpotParser::new().context("building cluster parser")?);

    // 1) Ingest
    let i_store = Arc::clone(&store);
    let i_parser = Arc::clone(&parser);
    let i_path = args.cluster.clone();
    let mut ingest = tokio::spawn(async move {
        match i_path {
            Some(p) => cluster::feed_file(&p, &i_parser, &i_store).await,
            None => cluster::feed(BufReader::new(tokio::io::stdin()), &i_parser, &i_store).await,
        }
    });

    // 2) Aging
    let aging = tokio::spawn(run_aging(Arc::clone(&store)));

    // 3) Periodic save
    let saver = (args.save_secs > 0).then(|| {
        let s_store = Arc::clone(&store);
        let s_path = args.state.clone();
        let period = Duration::from_secs(args.save_secs);
        tokio::spawn(run_saves(s_store, s_path, period))
    });

    tokio::select! {
        res = &mut ingest => {
            let res = res.unwrap_or_else(|e| Err(BandmapError::Other(format!("ingest join: {e}"))));
            match res {
                Ok(n) => info!("Cluster feed done: {} spot(s)", n),
                Err(e) => warn!("cluster feed failed: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            ingest.abort();
        }
    }
    aging.abort();
    if let Some(s) = saver {
        s.abort();
    }

    if let Err(e) = persist::save(&store, &args.state) {
        warn!("bandmap state not saved: {}", e);
    }

    let view = filter::build(&store, &cfg, &tuning);
    let center = tuning.center(plan.as_ref());
    let window = WindowSelector::for_grid(args.rows, args.columns).select(&view, center, tuning.has_rig());
    let rows = window.rows(view.spots());

    if args.json {
        let out: Vec<JsonRow> = rows
            .iter()
            .map(|row| match row {
                Row::Spot(s) | Row::OnCenter(s) => JsonRow {
                    frequency: s.frequency,
                    call: Some(display::call_label(s, &cfg, &contest)),
                    on_center: matches!(row, Row::OnCenter(_)),
                    marker: false,
                    dupe: s.dupe,
                    multiplier: contest.is_multiplier(s),
                    age: Some(display::age_of(s.ttl, cfg.lifetime)),
                },
                Row::Marker(f) => JsonRow {
                    frequency: *f,
                    call: None,
                    on_center: true,
                    marker: true,
                    dupe: false,
                    multiplier: false,
                    age: None,
                },
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let own_node = args.own_node();
        for row in &rows {
            println!("{}", display::format_row(row, &cfg, &contest, own_node));
        }
    }

    if let Some(path) = &args.csv {
        csv_out::write_view(&view, path).with_context(|| format!("writing {}", path.display()))?;
        info!("CSV wrote {} rows to {}", view.len(), path.display());
    }

    info!("Done.");
    Ok(())
}

async fn run_aging(store: Arc<SpotStore>) {
    let mut tick = tokio::time::interval(AGING_PERIOD);
    tick.tick().await;
    loop {
        tick.tick().await;
        store.age_tick();
    }
}

async fn run_saves(store: Arc<SpotStore>, path: PathBuf, period: Duration) {
    let mut tick = tokio::time::interval(period);
    tick.tick().await;
    loop {
        tick.tick().await;
        let (store, path) = (Arc::clone(&store), path.clone());
        let res = tokio::task::spawn_blocking(move || persist::save(&store, &path)).await;
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("periodic save failed: {}", e),
            Err(e) => warn!("periodic save join: {}", e),
        }
    }
}
