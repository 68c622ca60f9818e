use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = sortdir::cli::parse();
    app::run(args)
}
