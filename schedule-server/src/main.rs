use std::{collections::HashSet, env, io, sync::Arc};

use chrono::{DateTime, Utc};
use env_logger::Env;
use log::{debug, error, info, warn};
use tokio::{
    net::TcpListener,
    signal,
    time::{self, Duration, MissedTickBehavior},
};

use schedule_core::{
    malformed_timestamps, overlapping_pairs, Event, FileStorage, Schedule, ScheduleStore, Storage,
    BACKUP_KEY,
};

mod cli;
mod routes;

use routes::AppState;

#[tokio::main]
async fn main() -> io::Result<()> {
    setup_logging();
    let args = cli::parse(env::args().skip(1).collect());

    let storage = FileStorage::open(&args.data_dir).map_err(io::Error::other)?;
    info!("Storing schedule in {}", storage.dir().display());

    let mut store = ScheduleStore::new(storage);
    let schedule = load_schedule(&mut store, args.seed, Utc::now()).map_err(io::Error::other)?;
    let state = AppState::new(schedule, store);

    tokio::spawn(refresh_statuses(Arc::clone(&state), args.tick_interval));

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn setup_logging() {
    env_logger::Builder::from_env(
        Env::new().filter_or("LOG", "schedule_server=info,schedule_core=info"),
    )
    .init();
}

/// Falls back to the sample (or an empty) schedule when nothing usable is
/// stored. Unreadable data is copied to [`BACKUP_KEY`] before the first save
/// can replace it.
fn load_schedule<S: Storage>(
    store: &mut ScheduleStore<S>,
    seed: bool,
    now: DateTime<Utc>,
) -> schedule_core::Result<Schedule> {
    let fallback = || {
        if seed {
            Schedule::seeded(now)
        } else {
            Schedule::new(Vec::new(), now)
        }
    };

    let document = match store.load() {
        Ok(document) => document,
        Err(err) => {
            error!("Failed to load schedule data: {err}");
            if store.backup()? {
                warn!("Kept the unreadable schedule data under `{BACKUP_KEY}`");
            }
            return Ok(fallback());
        }
    };

    let Some(document) = document else {
        let schedule = fallback();
        if seed {
            match store.save(schedule.events(), now) {
                Ok(()) => info!("Seeded {} sample events", schedule.events().len()),
                Err(err) => error!("Failed to save sample schedule: {err}"),
            }
        }
        return Ok(schedule);
    };

    if !document.skipped.is_empty() {
        store.backup()?;
        warn!(
            "Dropped {} unreadable events, the full document is kept under `{BACKUP_KEY}`",
            document.skipped.len()
        );
    }

    for issue in malformed_timestamps(&document.classes) {
        warn!("{issue}; treating it as past");
    }

    info!("Loaded {} events", document.classes.len());
    Ok(Schedule::new(document.classes, now))
}

/// Remembers which live events overlapped on the previous refresh.
#[derive(Debug, Default)]
struct OverlapTracker {
    reported: HashSet<(String, String)>,
}

impl OverlapTracker {
    /// Pairs of live events that overlap now but did not last time.
    fn update(&mut self, events: &[Event]) -> Vec<(String, String)> {
        let live = events
            .iter()
            .filter(|event| event.is_live)
            .cloned()
            .collect::<Vec<Event>>();

        let overlaps = overlapping_pairs(&live).into_iter().collect::<HashSet<_>>();
        let mut fresh = overlaps
            .difference(&self.reported)
            .cloned()
            .collect::<Vec<_>>();
        fresh.sort();

        self.reported = overlaps;
        fresh
    }
}

async fn refresh_statuses<S: Storage>(state: Arc<AppState<S>>, period: Duration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    let mut overlaps = OverlapTracker::default();

    loop {
        interval.tick().await;

        let mut schedule = state.schedule.write().await;
        schedule.tick(Utc::now());
        debug!(
            "Refreshed statuses, {} live",
            schedule.events().iter().filter(|event| event.is_live).count()
        );

        for (first, second) in overlaps.update(schedule.events()) {
            warn!("Events {first} and {second} are live at the same time");
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }

    info!("Shutting down");
}
