use std::time::Duration;

use proxy_audit::runtime::{boot, logging, serve};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = logging::init_logging(&logging::LogSettings::from_env())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        let (ctx, sink) = boot::boot().await?;
        serve::serve(ctx, sink).await.map(|_| ())
    });

    // A pending stdin read sits on a blocking thread; don't wait for it.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}
