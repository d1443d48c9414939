mod platform;

fn main() -> anyhow::Result<()> {
    let settings = platform::AppSettings::from_env()?;
    platform::init_logging(&settings);
    platform::run_app(settings)
}
