use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    // .env first so RUST_LOG, CONFIG_PATH and POSTS_API_URL take effect
    dotenv().ok();

    let config = configs::AppConfig::load_or_default();
    let format = config.as_ref().map(|c| c.logging.format.as_str()).unwrap_or("compact");
    common::utils::logging::init_logging(format);
    info!(service = "post_search", event = "logger_init", "tracing subscriber initialized");

    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "post_search", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "post_search",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "post_search", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "post_search",
        event = "start",
        %service_id,
        pid,
        version,
        config_path = %configs::config_path(),
        "post search starting"
    );

    let code = match rt.block_on(search::bootstrap::run(config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "post_search", event = "run_failed", error = %e, "search loop returned error");
            std::process::ExitCode::FAILURE
        }
    };
    // stdin reads park a blocking thread; don't wait on it
    rt.shutdown_background();

    info!(service = "post_search", event = "stop", %service_id, pid, "post search stopped");
    code
}
