extern crate visor_core;

use std::process::exit;

use visor_core::{error, info};
use visord_lib::{
    args::parse_args,
    daemon::{Daemon, init_logger},
};

pub fn main() {
    let args = parse_args();

    if let Err(err) = init_logger(&args) {
        println!("{err}");
        exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Unable to start the async runtime: {err}");
            exit(1);
        }
    };

    let result = Daemon::create(args).and_then(|daemon| runtime.block_on(daemon.run()));
    if let Err(err) = result {
        error!("{err}");
        exit(1);
    }
    info!("Visord has stopped...");
}
