use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::Options;
use tokio::time::Duration;

pub struct Args {
    pub address: SocketAddr,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub seed: bool,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "d",
        "data-dir",
        "Directory the schedule is stored in [Default: ./data]",
        "PATH",
    );
    opts.optopt(
        "t",
        "tick-interval",
        "Seconds between event status refreshes [Default: 60]",
        "SECONDS",
    );
    opts.optflag(
        "",
        "no-seed",
        "Start with an empty schedule instead of sample classes when nothing is stored",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Provided value for option 'address' is invalid: {err}");
            process::exit(1);
        }
    };

    let data_dir = matches
        .opt_str("data-dir")
        .map_or_else(|| PathBuf::from("data"), PathBuf::from);

    let tick_interval = match matches.opt_get_default("tick-interval", 60) {
        Ok(0) => {
            eprintln!("Provided value for option 'tick-interval' must be at least 1");
            process::exit(1);
        }
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => {
            eprintln!("Provided value for option 'tick-interval' is invalid: {err}");
            process::exit(1);
        }
    };

    let seed = !matches.opt_present("no-seed");

    Args {
        address,
        data_dir,
        tick_interval,
        seed,
    }
}
