use std::{
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use sandbox::{config::Config, run};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so they stay out of the raw-mode prompt on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Invalid configuration.");
            eprintln!("Details: {}.", e);
            process::exit(1);
        }
    };

    if let Err(e) = run::run(config, running) {
        eprintln!("Error: Sandbox stopped unexpectedly.");
        eprintln!("Details: {}.", e);
        process::exit(1);
    }
}
