use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    let args = factuur_import::args::parse();
    factuur_import::cli::main(args)
}
