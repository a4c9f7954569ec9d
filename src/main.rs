use pmorph::{MorphConfig, ShapeLibrary};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional JSON config path as the only argument.
    let config = match std::env::args().nth(1) {
        Some(path) => match MorphConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => MorphConfig::default(),
    };

    if let Err(e) = pmorph::run(config, ShapeLibrary::procedural()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
