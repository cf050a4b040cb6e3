use chatport::backend::new_backend;
use chatport::cli::Command;
use chatport::config::{Configuration, init_logger, verbose};
use chatport::service::ChatService;
use chatport::storage::new_storage;
use eyre::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    Configuration::init(config.clone())?;
    init_logger(&config.log)?;
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend);
    if !backend.has_api_key() {
        verbose!("[!] API key is not configured");
    }

    verbose!("[+] Initializing storage...");
    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");

    let service = ChatService::new(storage, backend);
    cmd.action().run(service, &config).await
}
