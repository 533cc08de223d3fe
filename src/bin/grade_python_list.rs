#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grades the list-processing exercise.

use anyhow::Result;
use dotenvy::dotenv;
use scorecard::{ExerciseKind, cli};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let opts = cli::options(ExerciseKind::PythonList).run();
    cli::run(ExerciseKind::PythonList, opts).await?;

    Ok(())
}
