use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use stackdriver_log_format::env::env_or;
use stackdriver_log_format::init::{init_tracing_with_config, LayerConfig};
use stackdriver_log_format::noop_sink::NoopSink;
use stackdriver_log_format::sink::{LineSink, StdoutSink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n: u64 = env_or("LOG_STRESS_COUNT", "10000").parse()?;

    // LOG_STRESS_SINK=noop measures formatting alone.
    let sink: Arc<dyn LineSink> = match env_or("LOG_STRESS_SINK", "stdout").as_str() {
        "noop" => Arc::new(NoopSink),
        _ => Arc::new(StdoutSink),
    };

    init_tracing_with_config(sink, LayerConfig::from_env()?)?;

    let start = Instant::now();
    for i in 0..n {
        info!(iteration = i, total = n, "Stress test entry {{iteration}} of {{total}}");
    }

    let elapsed = start.elapsed();
    eprintln!(
        "wrote {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
