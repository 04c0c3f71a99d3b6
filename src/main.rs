use gact::cli::Cli;
use gact::error::GactError;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.execute() {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<GactError>()
            .map(GactError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
