mod buffer;
mod compare;
mod options;
mod progress;
mod project;
mod run;
mod tracks;

use anyhow::Result;
use clap::Parser;
use options::Cli;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli {
        Cli::Project(project) => project.run(),
        Cli::Buffer(buffer) => buffer.run(),
        Cli::Tracks(tracks) => tracks.run(),
        Cli::Run(run) => run.run(),
        Cli::Compare(compare) => compare.run(),
    }
}
