use std::process;

mod datepath;
mod error;
mod options;
mod task;
mod transfer;

use options::args_to_opts;
use task::TransferTask;
use transfer::detect_delta_tool;

fn main() {
    let opts = match args_to_opts() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let delta = detect_delta_tool(opts.verbosity.verbose());
    let task = TransferTask::new(opts, delta);

    // The summary prints whenever the walk started, fatal error or not.
    let (stats, result) = task.run();
    println!("{}", stats);
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
