use goofx::GooDemo;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(error) = GooDemo::new().run() {
        eprintln!("goofx failed to start: {}", error);
        std::process::exit(1);
    }
}
