use super::cli::{use_color, Args};
use super::demo;
use crate::config::Settings;
use crate::core::error_handling::{fatal_message, log_error_with_context};
use crate::core::logging::init_logging;
use clap::Parser;

/// Initialize application startup
pub fn startup() {
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: unable to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(run(args));
}

async fn run(args: Args) {
    // Configuration comes first so the logger can honour it
    let mut settings = match Settings::load(args.config_file.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", fatal_message(&e, "Loading configuration"));
            std::process::exit(1);
        }
    };
    args.apply_to(&mut settings);
    if let Err(e) = settings.validate() {
        eprintln!("Error: {}", fatal_message(&e, "Validating configuration"));
        std::process::exit(1);
    }

    let color = use_color(&settings);
    if let Err(e) = init_logging(
        &settings.logging.level,
        settings.logging.format,
        settings.logging.file.as_deref(),
        color,
    ) {
        eprintln!("Error: unable to initialise logging: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "reactive {} starting (protocol revision {}, git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        crate::PROTOCOL_REVISION,
        crate::GIT_HASH,
        crate::BUILD_TIME
    );
    log::debug!("Effective settings: {:?}", settings);

    let report = match demo::run(&settings, args.reject).await {
        Ok(report) => report,
        Err(e) => {
            log_error_with_context(&e, "Running the broadcast demonstration");
            std::process::exit(1);
        }
    };
    print!("{}", report.render(color));

    if let Err(e) = report.verify() {
        log_error_with_context(&e, "Verifying subscriber outcomes");
        std::process::exit(1);
    }
    log::info!("All admitted subscribers completed");
}
